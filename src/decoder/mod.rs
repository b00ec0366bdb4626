//! Stripe decoding: turns raw swipe text into card records
//!
//! A [`Decoder`] holds an ordered list of parsers. Each parser is either a
//! [`BuiltinParser`] addressed by name or a caller-supplied
//! [`CustomParser`]; both are resolved once, when the decoder is built,
//! into the same callable form. Decoding tries the parsers in order and
//! returns the first record produced.

pub mod luhn;
mod parsers;
mod record;

pub use luhn::luhn_check;
pub use parsers::{parse_generic, BuiltinParser};
pub use record::{AccountRecord, CardRecord, Issuer};

use crate::error::SwipeError;
use std::fmt;
use std::sync::Arc;

/// Uniform parser signature: `None` means "not mine, try the next one"
pub type ParseFn = Arc<dyn Fn(&str) -> Option<CardRecord> + Send + Sync>;

/// A caller-supplied parser with the name it is registered under
#[derive(Clone)]
pub struct CustomParser {
    name: String,
    func: ParseFn,
}

impl CustomParser {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> Option<CardRecord> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for CustomParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomParser")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Entry of the parser list
#[derive(Debug, Clone)]
pub enum ParserRef {
    Builtin(BuiltinParser),
    Custom(CustomParser),
}

impl ParserRef {
    pub fn custom<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> Option<CardRecord> + Send + Sync + 'static,
    {
        Self::Custom(CustomParser::new(name, func))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Builtin(parser) => parser.name(),
            Self::Custom(parser) => parser.name(),
        }
    }

    fn resolve(&self) -> ParseFn {
        match self {
            Self::Builtin(parser) => {
                let parser = *parser;
                Arc::new(move |raw| parser.parse(raw))
            }
            Self::Custom(parser) => Arc::clone(&parser.func),
        }
    }
}

impl From<BuiltinParser> for ParserRef {
    fn from(parser: BuiltinParser) -> Self {
        Self::Builtin(parser)
    }
}

/// Resolves configured parser names against the built-ins and `custom`.
///
/// Custom parsers shadow built-ins of the same name. Unknown names are a
/// configuration error.
pub fn resolve_names(names: &[String], custom: &[CustomParser]) -> Result<Vec<ParserRef>, SwipeError> {
    names
        .iter()
        .map(|name| {
            if let Some(parser) = custom.iter().find(|p| p.name() == name) {
                Ok(ParserRef::Custom(parser.clone()))
            } else {
                name.parse::<BuiltinParser>()
                    .map(ParserRef::Builtin)
                    .map_err(|_| SwipeError::UnknownParser(name.clone()))
            }
        })
        .collect()
}

/// Ordered, first-match-wins parser pipeline
#[derive(Clone)]
pub struct Decoder {
    parsers: Vec<(String, ParseFn)>,
}

impl Decoder {
    pub fn new(parsers: &[ParserRef]) -> Self {
        Self {
            parsers: parsers
                .iter()
                .map(|p| (p.name().to_string(), p.resolve()))
                .collect(),
        }
    }

    /// Names of the parsers, in the order they are tried
    pub fn parser_names(&self) -> impl Iterator<Item = &str> {
        self.parsers.iter().map(|(name, _)| name.as_str())
    }

    /// Runs the parsers in order and returns the first record produced
    pub fn decode(&self, raw: &str) -> Option<CardRecord> {
        self.parsers.iter().find_map(|(name, parse)| {
            let record = parse(raw);
            if record.is_some() {
                log::debug!("parser '{}' matched", name);
            }
            record
        })
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(&[ParserRef::Builtin(BuiltinParser::Generic)])
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.parser_names()).finish()
    }
}
