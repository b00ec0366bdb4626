//! Built-in stripe parsers
//!
//! The issuer parsers are deliberately simple: they recognise the network
//! from the leading digits and length of the account number, then require
//! a valid Luhn checksum. They are not a complete BIN table.

use super::luhn::luhn_check;
use super::record::{AccountRecord, CardRecord, Issuer};
use regex::{Captures, Regex};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// `%line1?`, then optional `;line2?`, then optional `+line3?` or `;line3?`
static GENERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^%([^%;?]*)\?(?:;([0-9:<>=]*)\?)?(?:[+;]([0-9:<>=]*)\?)?")
        .expect("generic stripe pattern should be valid regex")
});

/// Visa: 4, then 12 to 18 more digits
static VISA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^%B(4[0-9]{12,18})\^([A-Z ]+)/([A-Z ]+)\^([0-9]{2})([0-9]{2})")
        .expect("visa pattern should be valid regex")
});

/// MasterCard: 51 to 55, 16 digits in all
static MASTERCARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^%B(5[1-5][0-9]{14})\^([A-Z ]+)/([A-Z ]+)\^([0-9]{2})([0-9]{2})")
        .expect("mastercard pattern should be valid regex")
});

/// American Express: 34 or 37, 15 digits in all
static AMEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^%B(3[47][0-9]{13})\^([A-Z ]+)/([A-Z ]+)\^([0-9]{2})([0-9]{2})")
        .expect("amex pattern should be valid regex")
});

/// Parsers shipped with the crate, addressable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinParser {
    Generic,
    Visa,
    MasterCard,
    Amex,
}

impl BuiltinParser {
    pub fn all() -> &'static [BuiltinParser] {
        &[Self::Generic, Self::Visa, Self::MasterCard, Self::Amex]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Visa => "visa",
            Self::MasterCard => "mastercard",
            Self::Amex => "amex",
        }
    }

    /// Runs the parser against raw stripe data
    pub fn parse(&self, raw: &str) -> Option<CardRecord> {
        match self {
            Self::Generic => parse_generic(raw),
            Self::Visa => parse_issuer(&VISA, Issuer::Visa, raw),
            Self::MasterCard => parse_issuer(&MASTERCARD, Issuer::MasterCard, raw),
            Self::Amex => parse_issuer(&AMEX, Issuer::Amex, raw),
        }
    }
}

impl fmt::Display for BuiltinParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BuiltinParser {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|parser| parser.name() == s)
            .ok_or(())
    }
}

fn group(caps: &Captures<'_>, index: usize) -> String {
    caps.get(index)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Splits raw data into up to three stripe lines
pub fn parse_generic(raw: &str) -> Option<CardRecord> {
    let caps = GENERIC.captures(raw)?;
    Some(CardRecord::Generic {
        line1: group(&caps, 1),
        line2: group(&caps, 2),
        line3: group(&caps, 3),
    })
}

fn parse_issuer(pattern: &Regex, issuer: Issuer, raw: &str) -> Option<CardRecord> {
    let caps = pattern.captures(raw)?;

    let account = group(&caps, 1);
    if !luhn_check(&account) {
        log::debug!("{} pattern matched but account failed the Luhn check", issuer);
        return None;
    }

    Some(CardRecord::issued(
        issuer,
        AccountRecord {
            account,
            last_name: group(&caps, 2).trim().to_string(),
            first_name: group(&caps, 3).trim().to_string(),
            exp_year: group(&caps, 4),
            exp_month: group(&caps, 5),
        },
    ))
}
