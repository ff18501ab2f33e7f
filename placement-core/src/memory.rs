//! In-memory collaborator implementations.
//!
//! These keep everything in process memory without persistence. They are
//! used by tests and by the local `placement take` command.

use std::collections::HashMap;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::AssessmentConfig;
use crate::error::{PlacementError, Result};
use crate::question::Question;
use crate::traits::{AccountLedger, AccountSnapshot, ConfigStore, QuestionSource, Rewards};
use crate::types::{AccountId, ConfigId, QuestionId};

/// In-memory question bank with random selection per level.
pub struct InMemoryQuestionBank {
    questions: Vec<Question>,
    by_id: HashMap<QuestionId, usize>,
}

impl InMemoryQuestionBank {
    /// Create a bank from a list of questions.
    ///
    /// Later duplicates of an ID shadow earlier ones for lookups.
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        let by_id = questions
            .iter()
            .enumerate()
            .map(|(i, q)| (q.id.clone(), i))
            .collect();
        Self { questions, by_id }
    }

    /// Parse a bank from a JSON array of questions.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let questions: Vec<Question> = serde_json::from_str(json)?;
        Ok(Self::new(questions))
    }

    /// Number of questions in the bank.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Check if the bank is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    fn pick(&self, level: u32, count: u32) -> Vec<Question> {
        let candidates: Vec<&Question> =
            self.questions.iter().filter(|q| q.level == level).collect();
        let mut rng = rand::thread_rng();
        candidates
            .choose_multiple(&mut rng, count as usize)
            .map(|q| (*q).clone())
            .collect()
    }
}

#[async_trait]
impl QuestionSource for InMemoryQuestionBank {
    async fn fetch(&self, level: u32, count: u32) -> Result<Vec<Question>> {
        let picked = self.pick(level, count);
        debug!(level, requested = count, returned = picked.len(), "fetched questions");
        Ok(picked)
    }

    async fn get_many(&self, ids: &[QuestionId]) -> Result<Vec<Question>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.by_id.get(id))
            .map(|&i| self.questions[i].clone())
            .collect())
    }
}

/// In-memory account ledger.
///
/// Every operation holds the write lock for its whole read-modify-write,
/// which makes `debit` and `settle` atomic per process.
#[derive(Default)]
pub struct InMemoryLedger {
    accounts: RwLock<HashMap<AccountId, AccountSnapshot>>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger holding the given accounts.
    #[must_use]
    pub fn with_accounts(accounts: impl IntoIterator<Item = AccountSnapshot>) -> Self {
        Self {
            accounts: RwLock::new(accounts.into_iter().map(|a| (a.id.clone(), a)).collect()),
        }
    }

    /// Add or replace an account.
    pub async fn upsert(&self, account: AccountSnapshot) {
        self.accounts.write().await.insert(account.id.clone(), account);
    }
}

fn account_mut<'a>(
    accounts: &'a mut HashMap<AccountId, AccountSnapshot>,
    id: &AccountId,
) -> Result<&'a mut AccountSnapshot> {
    accounts
        .get_mut(id)
        .ok_or_else(|| PlacementError::not_found("account", id))
}

#[async_trait]
impl AccountLedger for InMemoryLedger {
    async fn snapshot(&self, account: &AccountId) -> Result<Option<AccountSnapshot>> {
        Ok(self.accounts.read().await.get(account).cloned())
    }

    async fn debit(&self, account: &AccountId, amount: u64) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        let entry = account_mut(&mut accounts, account)?;
        if entry.coins < amount {
            return Err(PlacementError::InsufficientFunds {
                required: amount,
                available: entry.coins,
            });
        }
        entry.coins -= amount;
        Ok(())
    }

    async fn credit(&self, account: &AccountId, rewards: Rewards) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        let entry = account_mut(&mut accounts, account)?;
        entry.experience = entry.experience.saturating_add(rewards.experience);
        entry.coins = entry.coins.saturating_add(rewards.coins);
        Ok(())
    }

    async fn raise_level_if_higher(&self, account: &AccountId, level: u32) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        let entry = account_mut(&mut accounts, account)?;
        entry.level = entry.level.max(level);
        Ok(())
    }

    async fn settle(&self, account: &AccountId, level: u32, rewards: Rewards) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        let entry = account_mut(&mut accounts, account)?;
        entry.level = entry.level.max(level);
        entry.experience = entry.experience.saturating_add(rewards.experience);
        entry.coins = entry.coins.saturating_add(rewards.coins);
        Ok(())
    }
}

/// In-memory config store.
#[derive(Default)]
pub struct InMemoryConfigStore {
    configs: RwLock<Vec<AssessmentConfig>>,
}

impl InMemoryConfigStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn get_active(&self) -> Result<Option<AssessmentConfig>> {
        Ok(self
            .configs
            .read()
            .await
            .iter()
            .find(|c| c.active)
            .cloned())
    }

    async fn get_by_id(&self, id: ConfigId) -> Result<Option<AssessmentConfig>> {
        Ok(self
            .configs
            .read()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn insert(&self, mut config: AssessmentConfig) -> Result<()> {
        config.active = false;
        self.configs.write().await.push(config);
        Ok(())
    }

    async fn set_active_exclusive(&self, id: ConfigId) -> Result<()> {
        let mut configs = self.configs.write().await;
        if !configs.iter().any(|c| c.id == id) {
            return Err(PlacementError::not_found("config", id));
        }
        for config in configs.iter_mut() {
            config.active = config.id == id;
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<AssessmentConfig>> {
        let mut configs = self.configs.read().await.clone();
        configs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(configs)
    }
}
