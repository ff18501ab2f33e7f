use std::path::PathBuf;

use chrono::Duration;
use placement_core::{AccountId, AccountSnapshot, SessionSigner};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Settings as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPlacementConfig {
    #[serde(default)]
    pub data: RawDataConfig,

    #[serde(default)]
    pub account: RawAccountConfig,

    #[serde(default)]
    pub session: RawSessionConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawDataConfig {
    pub config_file: Option<PathBuf>,
    pub question_bank: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAccountConfig {
    pub id: Option<String>,
    pub coins: Option<u64>,
    pub level: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSessionConfig {
    pub sign_tokens: Option<bool>,
    pub secret: Option<String>,
    pub token_ttl_minutes: Option<u32>,
}

/// Final settings with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PlacementConfig {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub account: AccountConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

impl PlacementConfig {
    /// Copy safe to print, with the signing secret masked.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.session.secret.is_some() {
            config.session.secret = Some(REDACTED.to_string());
        }
        config
    }
}

/// Where the assessment and question bank are read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Assessment config JSON
    pub config_file: PathBuf,

    /// Question bank JSON (array of questions)
    pub question_bank: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        let data_dir = placement_paths::data_dir();
        Self {
            config_file: data_dir.join(DEFAULT_CONFIG_FILE),
            question_bank: data_dir.join(DEFAULT_QUESTION_BANK),
        }
    }
}

/// Local account used by `placement take`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub id: String,
    pub coins: u64,
    pub level: u32,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            id: DEFAULT_ACCOUNT_ID.to_string(),
            coins: DEFAULT_COINS,
            level: DEFAULT_LEVEL,
        }
    }
}

impl AccountConfig {
    pub fn account_id(&self) -> AccountId {
        AccountId::new(self.id.as_str())
    }

    /// Starting ledger entry for a fresh session.
    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            id: self.account_id(),
            level: self.level,
            experience: 0,
            coins: self.coins,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Require signed session tokens between phases
    pub sign_tokens: bool,

    /// HMAC secret; a random one is used per run when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    pub token_ttl_minutes: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            sign_tokens: false,
            secret: None,
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
        }
    }
}

impl SessionConfig {
    /// Signer for the engine, if token signing is enabled.
    pub fn signer(&self) -> Option<SessionSigner> {
        if !self.sign_tokens {
            return None;
        }
        let secret = self
            .secret
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Some(SessionSigner::new(
            secret.as_bytes(),
            Duration::minutes(i64::from(self.token_ttl_minutes)),
        ))
    }
}

/// Default assessment file name inside the data directory
pub const DEFAULT_CONFIG_FILE: &str = "assessment.json";

/// Default question bank file name inside the data directory
pub const DEFAULT_QUESTION_BANK: &str = "questions.json";

pub const DEFAULT_ACCOUNT_ID: &str = "local";

/// Starting balance, enough for a few paid attempts
pub const DEFAULT_COINS: u64 = 500;

pub const DEFAULT_LEVEL: u32 = 1;

pub const DEFAULT_TOKEN_TTL_MINUTES: u32 = 60;

const REDACTED: &str = "<redacted>";
