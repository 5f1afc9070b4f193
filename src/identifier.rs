//! Identifier format checks.
//!
//! Customer, point-of-sale and item identifiers are two letters followed by
//! seven digits, e.g. `CU0000001`. They are checked once, when the entity is
//! created; lookups and updates take identifiers as given.

use crate::error::{LoyaltyError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static STRICT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]{2}[0-9]{7}$").expect("constant regex pattern is valid")
});

// `[A-z]` also spans the six ASCII symbols between `Z` and `a`, and the
// pattern is not anchored at the end.
static LEGACY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-z][A-z][0-9]{7}").expect("constant regex pattern is valid"));

/// Identifier matching rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdPolicy {
    /// Exactly two ASCII letters and seven digits.
    #[default]
    Strict,

    /// The historical pattern: two ASCII characters in the range `A`..=`z`,
    /// seven digits, then anything.
    Legacy,
}

impl IdPolicy {
    /// Returns `true` if `id` is an acceptable identifier.
    pub fn validate(self, id: &str) -> bool {
        if id.is_empty() {
            return false;
        }

        match self {
            IdPolicy::Strict => STRICT_PATTERN.is_match(id),
            IdPolicy::Legacy => LEGACY_PATTERN.is_match(id),
        }
    }

    /// Like [`IdPolicy::validate`], but as a `Result`.
    pub fn check(self, id: &str) -> Result<()> {
        if self.validate(id) {
            Ok(())
        } else {
            Err(LoyaltyError::InvalidIdentifier(id.to_string()))
        }
    }
}

impl FromStr for IdPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(IdPolicy::Strict),
            "legacy" => Ok(IdPolicy::Legacy),
            other => Err(format!("unknown identifier policy '{}'", other)),
        }
    }
}

impl fmt::Display for IdPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdPolicy::Strict => f.write_str("strict"),
            IdPolicy::Legacy => f.write_str("legacy"),
        }
    }
}
