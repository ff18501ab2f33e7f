use super::types::{
    AccountConfig, DEFAULT_TOKEN_TTL_MINUTES, DataConfig, PlacementConfig, RawAccountConfig,
    RawDataConfig, RawPlacementConfig, RawSessionConfig, SessionConfig,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged settings (user + project)
    pub fn load() -> Result<PlacementConfig> {
        Self::load_layers(&Self::user_config_path(), &Self::project_config_path())
    }

    /// Load settings from an explicit user file and project file.
    ///
    /// Missing files are skipped; later layers win field by field.
    pub fn load_layers(user_path: &Path, project_path: &Path) -> Result<PlacementConfig> {
        let mut raw = RawPlacementConfig::default();

        // Layer 1: User config
        if let Some(user_config) = Self::read_raw(user_path)? {
            raw = Self::merge_raw(raw, user_config);
        }

        // Layer 2: Project config
        if let Some(project_config) = Self::read_raw(project_path)? {
            raw = Self::merge_raw(raw, project_config);
        }

        Ok(Self::finalize(raw))
    }

    /// Get user config path
    pub fn user_config_path() -> PathBuf {
        placement_paths::config_dir().join("config.toml")
    }

    /// Get project config path
    /// Can be overridden with PLACEMENT_PROJECT_CONFIG_DIR env var (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("PLACEMENT_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".placement/config.toml")
        }
    }

    fn read_raw(path: &Path) -> Result<Option<RawPlacementConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        debug!(path = %path.display(), "loading settings layer");
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let raw = toml::from_str(&contents)
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        Ok(Some(raw))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawPlacementConfig, overlay: RawPlacementConfig) -> RawPlacementConfig {
        RawPlacementConfig {
            data: RawDataConfig {
                config_file: overlay.data.config_file.or(base.data.config_file),
                question_bank: overlay.data.question_bank.or(base.data.question_bank),
            },
            account: RawAccountConfig {
                id: overlay.account.id.or(base.account.id),
                coins: overlay.account.coins.or(base.account.coins),
                level: overlay.account.level.or(base.account.level),
            },
            session: RawSessionConfig {
                sign_tokens: overlay.session.sign_tokens.or(base.session.sign_tokens),
                secret: overlay.session.secret.or(base.session.secret),
                token_ttl_minutes: overlay
                    .session
                    .token_ttl_minutes
                    .or(base.session.token_ttl_minutes),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawPlacementConfig) -> PlacementConfig {
        let data = DataConfig::default();
        let account = AccountConfig::default();
        PlacementConfig {
            data: DataConfig {
                config_file: raw.data.config_file.unwrap_or(data.config_file),
                question_bank: raw.data.question_bank.unwrap_or(data.question_bank),
            },
            account: AccountConfig {
                id: raw.account.id.unwrap_or(account.id),
                coins: raw.account.coins.unwrap_or(account.coins),
                level: raw.account.level.unwrap_or(account.level),
            },
            session: SessionConfig {
                sign_tokens: raw.session.sign_tokens.unwrap_or(false),
                secret: raw.session.secret,
                token_ttl_minutes: raw
                    .session
                    .token_ttl_minutes
                    .unwrap_or(DEFAULT_TOKEN_TTL_MINUTES),
            },
        }
    }
}
