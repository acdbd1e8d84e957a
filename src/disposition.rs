// 🏷️ Disposition Normalizer - Source vetting labels → three canonical values
// Aliases as data, matched case-insensitively

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disposition {
    Confirmed,
    Candidate,
    FalsePositive,
}

/// Full words and short codes (TFOPWG `CP`/`KP`) meaning "confirmed planet"
const CONFIRMED_ALIASES: &[&str] = &["CONFIRMED", "CP", "KP"];

/// Full phrases and short codes (`FP`, TFOPWG false alarm `FA`)
const FALSE_POSITIVE_ALIASES: &[&str] = &["FALSE POSITIVE", "FALSE_POSITIVE", "FP", "FA"];

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Confirmed => "CONFIRMED",
            Disposition::Candidate => "CANDIDATE",
            Disposition::FalsePositive => "FALSE_POSITIVE",
        }
    }

    /// Map any raw token to a canonical disposition. Never fails: blank and
    /// unrecognized tokens fall back to `Candidate`.
    pub fn normalize(raw: Option<&str>) -> Disposition {
        let token = match raw.map(str::trim) {
            Some(token) if !token.is_empty() => token,
            _ => return Disposition::Candidate,
        };

        if CONFIRMED_ALIASES.iter().any(|a| a.eq_ignore_ascii_case(token)) {
            Disposition::Confirmed
        } else if FALSE_POSITIVE_ALIASES.iter().any(|a| a.eq_ignore_ascii_case(token)) {
            Disposition::FalsePositive
        } else {
            Disposition::Candidate
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
