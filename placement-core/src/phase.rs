//! Assessment phases.

use serde::{Deserialize, Serialize};

/// A named stage of an assessment.
///
/// Phases are tags compared for equality only. Their declaration order
/// carries no meaning for branch matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// First batch of questions, built from the config's initial spec
    Initial,
    /// Intermediate batch chosen by a continuing branch
    Followup,
    /// Last batch before a terminal branch is expected
    Final,
}

impl Phase {
    /// Convert to wire string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Followup => "followup",
            Self::Final => "final",
        }
    }

    /// Parse from wire string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "initial" => Some(Self::Initial),
            "followup" => Some(Self::Followup),
            "final" => Some(Self::Final),
            _ => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown phase: {s}"))
    }
}
