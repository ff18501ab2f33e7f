//! Interfaces to the collaborators the engine does not own.
//!
//! - [`QuestionSource`] - the question bank
//! - [`AccountLedger`] - account level, experience and coin bookkeeping
//! - [`ConfigStore`] - persisted assessment configs and the active flag
//!
//! In-memory implementations live in [`crate::memory`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::AssessmentConfig;
use crate::error::Result;
use crate::question::Question;
use crate::types::{AccountId, ConfigId, QuestionId};

/// Question bank lookups.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Return at most `count` questions at `level`, in no particular order.
    async fn fetch(&self, level: u32, count: u32) -> Result<Vec<Question>>;

    /// Resolve questions by ID. Unknown IDs are omitted from the result.
    async fn get_many(&self, ids: &[QuestionId]) -> Result<Vec<Question>>;
}

/// Point-in-time view of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSnapshot {
    pub id: AccountId,
    pub level: u32,
    pub experience: u64,
    pub coins: u64,
}

/// Experience and coins credited at the end of a test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewards {
    pub experience: u64,
    pub coins: u64,
}

/// Account bookkeeping.
///
/// `debit` must check and subtract atomically with respect to concurrent
/// calls for the same account, so two simultaneous starts cannot both
/// spend the same balance.
#[async_trait]
pub trait AccountLedger: Send + Sync {
    /// Current account state, if the account exists.
    async fn snapshot(&self, account: &AccountId) -> Result<Option<AccountSnapshot>>;

    /// Subtract `amount` coins, failing with
    /// [`PlacementError::InsufficientFunds`](crate::PlacementError::InsufficientFunds)
    /// and leaving the balance untouched when it is too low.
    async fn debit(&self, account: &AccountId, amount: u64) -> Result<()>;

    /// Add experience and coins.
    async fn credit(&self, account: &AccountId, rewards: Rewards) -> Result<()>;

    /// Set the stored level to `level` if it is higher. Never lowers it.
    async fn raise_level_if_higher(&self, account: &AccountId, level: u32) -> Result<()>;

    /// Apply every terminal effect of a finished test.
    ///
    /// Implementations that can do so should apply both effects as one
    /// unit; the default runs them in sequence.
    async fn settle(&self, account: &AccountId, level: u32, rewards: Rewards) -> Result<()> {
        self.raise_level_if_higher(account, level).await?;
        self.credit(account, rewards).await
    }
}

/// Persisted assessment configs.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// The active config, if any.
    async fn get_active(&self) -> Result<Option<AssessmentConfig>>;

    /// A config by ID, active or not.
    async fn get_by_id(&self, id: ConfigId) -> Result<Option<AssessmentConfig>>;

    /// Store a new config. Its `active` flag is ignored; use
    /// [`set_active_exclusive`](Self::set_active_exclusive).
    async fn insert(&self, config: AssessmentConfig) -> Result<()>;

    /// Activate `id` and deactivate every other config as one operation.
    ///
    /// There must be no observable moment with zero or several active
    /// configs.
    async fn set_active_exclusive(&self, id: ConfigId) -> Result<()>;

    /// All stored configs, newest first.
    async fn list(&self) -> Result<Vec<AssessmentConfig>>;
}
