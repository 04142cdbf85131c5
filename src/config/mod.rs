mod file_config;

pub use file_config::{AuthFileConfig, FileConfig};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
pub const DEFAULT_JWT_SECRET: &str = "secret";
pub const DEFAULT_TOKEN_LIFETIME_DAYS: i64 = 7;
pub const DEFAULT_MAX_UPLOAD_MB: u64 = 5;

/// Catalog storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StorageBackend {
    /// Flat JSON documents plus local image files.
    #[default]
    Json,
    /// Relational tables in a SQLite database.
    Sqlite,
}

/// Admin authentication strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AuthStrategy {
    /// Configured username/password pair with locally issued tokens.
    #[default]
    Static,
    /// Login and verification forwarded to an external identity provider.
    Delegated,
}

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub data_dir: Option<PathBuf>,
    pub backend: StorageBackend,
    pub media_path: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
    pub media_path: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub max_upload_bytes: u64,

    // Auth settings (with defaults)
    pub auth: AuthSettings,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub strategy: AuthStrategy,
    pub admin_username: String,
    pub admin_password: String,
    pub jwt_secret: String,
    pub token_lifetime_days: i64,
    pub provider_url: Option<String>,
    pub provider_api_key: Option<String>,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        // TOML overrides CLI for each field
        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .or_else(|| cli.data_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("data_dir must be specified via the CLI or in the config file")
            })?;

        let backend = file
            .backend
            .and_then(|s| parse_backend(&s))
            .unwrap_or(cli.backend);

        let media_path = file
            .media_path
            .map(PathBuf::from)
            .or_else(|| cli.media_path.clone())
            .unwrap_or_else(|| data_dir.join("paintings"));

        let port = file.port.unwrap_or(cli.port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        let max_upload_bytes =
            file.max_upload_mb.unwrap_or(DEFAULT_MAX_UPLOAD_MB) * 1024 * 1024;

        // Auth settings - merge file config with defaults
        let auth_file = file.auth.unwrap_or_default();
        let strategy = auth_file
            .strategy
            .as_deref()
            .and_then(parse_auth_strategy)
            .unwrap_or_default();

        let auth = AuthSettings {
            strategy,
            admin_username: auth_file
                .admin_username
                .or_else(|| cli.admin_username.clone())
                .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string()),
            admin_password: auth_file
                .admin_password
                .or_else(|| cli.admin_password.clone())
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
            jwt_secret: auth_file
                .jwt_secret
                .or_else(|| cli.jwt_secret.clone())
                .unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            token_lifetime_days: auth_file
                .token_lifetime_days
                .unwrap_or(DEFAULT_TOKEN_LIFETIME_DAYS),
            provider_url: auth_file.provider_url,
            provider_api_key: auth_file.provider_api_key,
        };

        if auth.strategy == AuthStrategy::Delegated && auth.provider_url.is_none() {
            bail!("The delegated auth strategy requires auth.provider_url in the config file");
        }

        Ok(Self {
            backend,
            data_dir,
            media_path,
            port,
            logging_level,
            frontend_dir_path,
            max_upload_bytes,
            auth,
        })
    }

    pub fn gallery_db_path(&self) -> PathBuf {
        self.data_dir.join("gallery.db")
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

fn parse_backend(s: &str) -> Option<StorageBackend> {
    StorageBackend::from_str(s, true).ok()
}

fn parse_auth_strategy(s: &str) -> Option<AuthStrategy> {
    AuthStrategy::from_str(s, true).ok()
}
