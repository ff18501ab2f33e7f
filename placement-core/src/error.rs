//! Error types for the placement engine.

use thiserror::Error;

use crate::phase::Phase;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, PlacementError>;

/// Errors that can occur while starting or advancing a placement test.
#[derive(Debug, Error)]
pub enum PlacementError {
    /// The assessment config is malformed.
    #[error("bad assessment config: {0}")]
    Configuration(#[from] ConfigError),

    /// No assessment config is currently active.
    #[error("no active assessment config")]
    NoActiveConfig,

    /// The account cannot pay the test cost.
    #[error("insufficient funds: {required} required, {available} available")]
    InsufficientFunds {
        /// Cost of the test.
        required: u64,
        /// Balance at the time of the attempt.
        available: u64,
    },

    /// The branch tree has no node covering this phase and score.
    #[error("no matching branch for current results (phase {phase}, {correct_count} correct)")]
    NoMatchingBranch {
        /// Phase that was submitted.
        phase: Phase,
        /// Correct answers in the submitted batch.
        correct_count: u32,
    },

    /// A referenced entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Entity kind (config, question, account).
        kind: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The session token was missing, forged, expired, or does not
    /// describe this submission.
    #[error("invalid session: {0}")]
    InvalidSession(String),

    /// An external collaborator failed.
    #[error("backend error: {0}")]
    Backend(String),
}

impl PlacementError {
    /// Shorthand for a [`PlacementError::NotFound`].
    pub fn not_found(kind: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Whether repeating the same call could succeed.
    ///
    /// Every engine operation is a pure function of caller state plus
    /// external reads, so only collaborator failures are transient.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_))
    }

    /// HTTP-equivalent class for a web layer to map onto status codes.
    #[must_use]
    pub fn status_hint(&self) -> &'static str {
        match self {
            Self::Configuration(_) | Self::NoActiveConfig => "service_unavailable",
            Self::InsufficientFunds { .. } => "payment_required",
            Self::NoMatchingBranch { .. } => "unprocessable",
            Self::NotFound { .. } => "not_found",
            Self::InvalidSession(_) => "unauthorized",
            Self::Backend(_) => "bad_gateway",
        }
    }
}

/// Save-time validation failures for an assessment config.
///
/// Paths use the authored field names, e.g. `branches[1].subBranches[0]`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `correctRange` has `min > max`.
    #[error("{path}: correctRange [{min}, {max}] has min greater than max")]
    InvertedRange {
        /// Location of the offending branch.
        path: String,
        /// Lower bound as authored.
        min: u32,
        /// Upper bound as authored.
        max: u32,
    },

    /// Branch carries neither `resultLevel` nor `nextPhase`.
    #[error("{path}: branch must set either resultLevel or nextPhase")]
    MissingOutcome {
        /// Location of the offending branch.
        path: String,
    },

    /// Branch carries both `resultLevel` and `nextPhase`.
    #[error("{path}: branch sets both resultLevel and nextPhase")]
    AmbiguousOutcome {
        /// Location of the offending branch.
        path: String,
    },

    /// Continuing branch has an empty `nextSpec`.
    #[error("{path}: continuing branch has an empty nextSpec")]
    EmptyNextSpec {
        /// Location of the offending branch.
        path: String,
    },

    /// A question spec entry asks for zero questions.
    #[error("{path}: question count must be at least 1")]
    ZeroCount {
        /// Location of the offending spec entry.
        path: String,
    },

    /// A batch asks for more questions than one phase may hold.
    #[error("{path}: asks for {total} questions, at most {max} allowed per phase")]
    TooManyQuestions {
        /// Location of the offending spec list.
        path: String,
        /// Requested total, saturated at `u32::MAX`.
        total: u32,
        /// Allowed maximum.
        max: u32,
    },

    /// The config has no initial questions.
    #[error("initialSpec must contain at least one entry")]
    EmptyInitialSpec,
}

impl ConfigError {
    /// Prefix the error location with an enclosing path segment.
    #[must_use]
    pub fn nested(self, parent: &str) -> Self {
        let join = |path: String| {
            if path.is_empty() {
                parent.to_string()
            } else {
                format!("{parent}.{path}")
            }
        };
        match self {
            Self::InvertedRange { path, min, max } => Self::InvertedRange {
                path: join(path),
                min,
                max,
            },
            Self::MissingOutcome { path } => Self::MissingOutcome { path: join(path) },
            Self::AmbiguousOutcome { path } => Self::AmbiguousOutcome { path: join(path) },
            Self::EmptyNextSpec { path } => Self::EmptyNextSpec { path: join(path) },
            Self::ZeroCount { path } => Self::ZeroCount { path: join(path) },
            Self::TooManyQuestions { path, total, max } => Self::TooManyQuestions {
                path: join(path),
                total,
                max,
            },
            Self::EmptyInitialSpec => Self::EmptyInitialSpec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_matching_branch_display_includes_phase_and_score() {
        let err = PlacementError::NoMatchingBranch {
            phase: Phase::Followup,
            correct_count: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("followup"));
        assert!(msg.contains("3 correct"));
    }

    #[test]
    fn only_backend_errors_are_retryable() {
        assert!(PlacementError::Backend("timeout".into()).is_retryable());
        assert!(!PlacementError::NoActiveConfig.is_retryable());
        assert!(
            !PlacementError::InsufficientFunds {
                required: 10,
                available: 5
            }
            .is_retryable()
        );
    }

    #[test]
    fn status_hint_maps_taxonomy() {
        assert_eq!(
            PlacementError::not_found("question", "q-1").status_hint(),
            "not_found"
        );
        assert_eq!(PlacementError::NoActiveConfig.status_hint(), "service_unavailable");
        assert_eq!(
            PlacementError::InvalidSession("expired".into()).status_hint(),
            "unauthorized"
        );
    }

    #[test]
    fn nested_prefixes_path() {
        let err = ConfigError::MissingOutcome {
            path: "subBranches[0]".to_string(),
        }
        .nested("branches[2]");
        assert_eq!(
            err,
            ConfigError::MissingOutcome {
                path: "branches[2].subBranches[0]".to_string()
            }
        );

        let root = ConfigError::ZeroCount {
            path: String::new(),
        }
        .nested("initialSpec[0]");
        assert_eq!(root.to_string(), "initialSpec[0]: question count must be at least 1");
    }
}
