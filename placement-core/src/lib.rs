//! Adaptive placement-test engine.
//!
//! A test taker pays to start a multi-phase assessment. After each phase
//! the engine scores the batch, looks up the first branch in the admin's
//! decision tree that covers `(phase, correct answers)`, and either hands
//! out another batch or ends the test with a placement level.
//!
//! # Architecture
//!
//! - **Checking** ([`is_correct`]) - pure per-type answer comparison
//! - **Matching** ([`find_match`]) - depth-first, first-match search over the branch tree
//! - **Config** ([`AssessmentConfig`]) - branch tree plus initial questions and cost
//! - **Engine** ([`PlacementEngine`]) - start and submit, no stored session state
//!
//! The engine talks to the outside world only through [`QuestionSource`],
//! [`AccountLedger`] and [`ConfigStore`]. In-memory implementations are
//! in [`memory`].

mod branch;
mod checker;
mod config;
pub mod error;
mod matcher;
pub mod memory;
mod phase;
mod question;
mod session;
mod token;
mod traits;
mod types;

// Branch tree
pub use branch::{
    Branch, Condition, CorrectRange, MAX_BATCH_QUESTIONS, Outcome, QuestionSpec, batch_size,
};

// Answer checking
pub use checker::is_correct;

// Config types
pub use config::{AssessmentConfig, AssessmentDraft, ConfigSummary};

// Errors
pub use error::{ConfigError, PlacementError, Result};

// Matching
pub use matcher::{describe_path, find_match, find_match_path};

// Phase
pub use phase::Phase;

// Question types
pub use question::{AnswerKey, Question, QuestionKind, QuestionView};

// Engine
pub use session::{
    COINS_PER_CORRECT, EXPERIENCE_PER_CORRECT, NextPhase, PhaseQuestions, PlacementEngine,
    PlacementResult, QuestionResult, SubmitOutcome, SubmittedAnswer, Submission, rewards_for,
};

// Session tokens
pub use token::{SessionClaims, SessionSigner};

// Collaborator traits
pub use traits::{AccountLedger, AccountSnapshot, ConfigStore, QuestionSource, Rewards};

// ID types
pub use types::{AccountId, ConfigId, QuestionId};
