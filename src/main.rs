//! Card Swipe Kit - terminal host for the swipe detector
//!
//! `run` opens a terminal UI where every key press goes through the
//! detector; `decode` and `luhn` work on data given on the command line.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;
use std::time::Instant;

use cardswipe_kit::{
    config::{self, Config},
    decoder::luhn_check,
    ui::{App, AppState, InputField, KeyHints, ResultsPanel, StatusBar},
    SwipeDetector,
};

#[derive(Parser)]
#[command(name = "cardswipe-kit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Interdigit timeout in milliseconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Character the reader sends before the start sentinel
    #[arg(long, global = true)]
    prefix: Option<String>,

    /// Decode as soon as track 1 ends and discard the rest
    #[arg(long, global = true)]
    first_line_only: bool,

    /// Parsers to try, in order (generic, visa, mastercard, amex)
    #[arg(long, global = true, value_delimiter = ',')]
    parsers: Option<Vec<String>>,

    /// Verbose tracing (written to cardswipe-kit.log while the UI runs)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture swipes in a terminal UI (default)
    Run,

    /// Decode raw stripe data and print the record as JSON
    Decode {
        /// Raw data, e.g. '%B4111111111111111^DOE/JOHN^2512?'
        raw: String,
    },

    /// Check a number against the Luhn checksum
    Luhn {
        digits: String,
    },

    /// Write the effective configuration to the config file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Config::load().context("Failed to load config")?,
        };

        if let Some(timeout) = self.timeout {
            config.swipe.interdigit_timeout_ms = timeout;
        }
        if let Some(prefix) = &self.prefix {
            config.swipe.prefix_character = Some(prefix.clone());
        }
        if let Some(parsers) = &self.parsers {
            config.swipe.parsers = parsers.clone();
        }
        config.swipe.first_line_only |= self.first_line_only;
        config.swipe.debug |= self.debug;

        Ok(config)
    }
}

fn init_logging(debug: bool, to_file: bool) -> Result<()> {
    let default_filter = match (debug, to_file) {
        (true, _) => "debug",
        // The UI owns the terminal; stay quiet unless asked
        (false, true) => "off",
        (false, false) => "warn",
    };

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter));
    if to_file && debug {
        let file = File::create("cardswipe-kit.log").context("Failed to create log file")?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    match &cli.command {
        None | Some(Commands::Run) => {
            init_logging(config.swipe.debug, true)?;
            run_ui(config)
        }
        Some(Commands::Decode { raw }) => {
            init_logging(config.swipe.debug, false)?;
            decode(config, raw)
        }
        Some(Commands::Luhn { digits }) => {
            if luhn_check(digits) {
                println!("{}: valid", digits.trim());
                Ok(())
            } else {
                println!("{}: invalid", digits.trim());
                std::process::exit(1);
            }
        }
        Some(Commands::InitConfig { force }) => {
            let path = match &cli.config {
                Some(path) => path.clone(),
                None => config::config_path()?,
            };
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            config.save_to(&path)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

/// Run the direct decode entry point on command-line data
fn decode(config: Config, raw: &str) -> Result<()> {
    let mut detector = SwipeDetector::builder(config.swipe)
        .on_complete(|_| {})
        .build()?;

    match detector.decode(raw) {
        Some(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        None => {
            eprintln!("No parser matched the data");
            std::process::exit(1);
        }
    }
}

fn run_ui(config: Config) -> Result<()> {
    // Validate before touching the terminal so errors print normally
    let mut app = App::new(config.clone())?;

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app, &config);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;

    let stats = app.detector.stats();
    println!("\nCard Swipe Kit session complete.");
    println!("Scans decoded: {} (failed: {})", stats.decoded, stats.failed);
    println!("Session duration: {}", app.elapsed_formatted());

    Ok(())
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    config: &Config,
) -> Result<()> {
    let frame_interval = config.refresh_interval();

    loop {
        app.tick(Instant::now());
        terminal.draw(|frame| draw(frame, app))?;

        let timeout = app.poll_timeout(Instant::now(), frame_interval);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Esc => app.quit(),
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        app.quit()
                    }
                    KeyCode::F(2) => app.toggle_enabled(),
                    KeyCode::F(5) => app.reset_all(),
                    KeyCode::F(10) => {
                        let filename = format!(
                            "swipe_session_{}.json",
                            chrono::Utc::now().format("%Y%m%d_%H%M%S")
                        );
                        if let Err(e) = app.export_report(&filename) {
                            app.set_status(format!("Export failed: {}", e));
                        }
                    }
                    code => app.process_key(code),
                }
            }
        }

        if app.state == AppState::Quitting {
            return Ok(());
        }
    }
}

fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Key hints
            Constraint::Length(3), // Input field
            Constraint::Min(8),    // Panels
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    frame.render_widget(KeyHints, chunks[0]);
    frame.render_widget(InputField::new(&app.typed, app.input_focused), chunks[1]);

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(25),
            Constraint::Percentage(35),
        ])
        .split(chunks[2]);

    let outcome = app.outcome_entries();
    frame.render_widget(ResultsPanel::new(&outcome, " Last Scan "), panels[0]);
    let summary = app.summary_entries();
    frame.render_widget(ResultsPanel::new(&summary, " Session "), panels[1]);
    let log = app.log_entries();
    frame.render_widget(ResultsPanel::new(&log, " Notifications "), panels[2]);

    let elapsed = app.elapsed_formatted();
    let status = StatusBar::new(
        app.detector.state().name(),
        app.detector.is_enabled(),
        &elapsed,
        app.detector.stats().keystrokes,
    )
    .message(app.get_status());
    frame.render_widget(status, chunks[3]);
}
