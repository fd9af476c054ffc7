use crate::types::Action;
use serde::Serialize;
use std::fmt;

pub const ENDORSE_AT_OR_ABOVE: u8 = 7;
pub const SUPPRESS_AT_OR_BELOW: u8 = 4;

/// Map a score to the action taken on the item.
pub fn decide(score: u8) -> Action {
    if score >= ENDORSE_AT_OR_ABOVE {
        Action::Endorse
    } else if score <= SUPPRESS_AT_OR_BELOW {
        Action::Suppress
    } else {
        Action::Neutral
    }
}

/// Named score band, for reporting only. Elite and Professional both endorse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Elite,
    Professional,
    Moderate,
    Low,
}

impl Tier {
    pub fn from_score(score: u8) -> Self {
        match score {
            9.. => Tier::Elite,
            7..=8 => Tier::Professional,
            5..=6 => Tier::Moderate,
            _ => Tier::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Elite => "elite",
            Tier::Professional => "professional",
            Tier::Moderate => "moderate",
            Tier::Low => "low",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
