//! Decoded card records

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Card network recognised from the account number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Issuer {
    Visa,
    MasterCard,
    Amex,
}

impl Issuer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visa => "visa",
            Self::MasterCard => "mastercard",
            Self::Amex => "amex",
        }
    }
}

impl fmt::Display for Issuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Track 1 fields shared by all issuer records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    /// Primary account number; always passes the Luhn check
    pub account: String,
    pub last_name: String,
    pub first_name: String,
    /// Two-digit expiration year
    pub exp_year: String,
    /// Two-digit expiration month
    pub exp_month: String,
}

/// Result of decoding a swipe, tagged by the parser that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CardRecord {
    /// Up to three raw stripe lines, empty when absent
    Generic {
        line1: String,
        line2: String,
        line3: String,
    },
    Visa(AccountRecord),
    MasterCard(AccountRecord),
    Amex(AccountRecord),
    /// Produced by a caller-supplied parser
    Custom {
        parser: String,
        fields: BTreeMap<String, String>,
    },
}

impl CardRecord {
    /// Builds the issuer-specific variant for `issuer`
    pub fn issued(issuer: Issuer, account: AccountRecord) -> Self {
        match issuer {
            Issuer::Visa => Self::Visa(account),
            Issuer::MasterCard => Self::MasterCard(account),
            Issuer::Amex => Self::Amex(account),
        }
    }

    /// Name of the record type, matching the serialized `type` tag
    pub fn kind(&self) -> &str {
        match self {
            Self::Generic { .. } => "generic",
            Self::Visa(_) => Issuer::Visa.as_str(),
            Self::MasterCard(_) => Issuer::MasterCard.as_str(),
            Self::Amex(_) => Issuer::Amex.as_str(),
            Self::Custom { parser, .. } => parser,
        }
    }

    pub fn issuer(&self) -> Option<Issuer> {
        match self {
            Self::Visa(_) => Some(Issuer::Visa),
            Self::MasterCard(_) => Some(Issuer::MasterCard),
            Self::Amex(_) => Some(Issuer::Amex),
            _ => None,
        }
    }

    /// Account fields, for issuer records only
    pub fn account(&self) -> Option<&AccountRecord> {
        match self {
            Self::Visa(a) | Self::MasterCard(a) | Self::Amex(a) => Some(a),
            _ => None,
        }
    }

    /// Label/value pairs for display
    pub fn display_lines(&self) -> Vec<(String, String)> {
        match self {
            Self::Generic { line1, line2, line3 } => vec![
                ("Line 1".to_string(), line1.clone()),
                ("Line 2".to_string(), line2.clone()),
                ("Line 3".to_string(), line3.clone()),
            ],
            Self::Visa(a) | Self::MasterCard(a) | Self::Amex(a) => vec![
                ("Type".to_string(), self.kind().to_string()),
                ("Account".to_string(), a.account.clone()),
                ("Name".to_string(), format!("{} {}", a.first_name, a.last_name)),
                ("Expires".to_string(), format!("{}/{}", a.exp_month, a.exp_year)),
            ],
            Self::Custom { parser, fields } => {
                let mut lines = vec![("Type".to_string(), parser.clone())];
                lines.extend(fields.iter().map(|(k, v)| (k.clone(), v.clone())));
                lines
            }
        }
    }
}
