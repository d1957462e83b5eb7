// ── Counter identifiers ──
//
// Dotted-decimal object identifiers addressing one cumulative counter on
// a device (e.g. `1.3.6.1.2.1.31.1.1.1.6.1`, ifHCInOctets for ifIndex 1).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A validated counter identifier.
///
/// At least two arcs, every arc an unsigned integer. A single leading dot
/// is accepted and stripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CounterId(String);

impl CounterId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CounterId {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = |message: String| CoreError::Validation {
            entity: format!("counter identifier '{raw}'"),
            message,
        };

        let trimmed = raw.trim();
        let body = trimmed.strip_prefix('.').unwrap_or(trimmed);
        if body.is_empty() {
            return Err(invalid("identifier is empty".into()));
        }

        let mut arcs = 0usize;
        for arc in body.split('.') {
            if arc.is_empty() {
                return Err(invalid("empty arc".into()));
            }
            if arc.parse::<u64>().is_err() {
                return Err(invalid(format!("arc '{arc}' is not an unsigned integer")));
            }
            arcs += 1;
        }
        if arcs < 2 {
            return Err(invalid("at least two arcs are required".into()));
        }

        Ok(Self(body.to_owned()))
    }
}

impl TryFrom<String> for CounterId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CounterId> for String {
    fn from(id: CounterId) -> Self {
        id.0
    }
}

impl fmt::Display for CounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
