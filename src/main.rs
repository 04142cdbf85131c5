use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use artfusion_gallery_server::auth::{AdminGate, DelegatedGate, StaticCredentialGate};
use artfusion_gallery_server::blob_store::FsBlobStore;
use artfusion_gallery_server::catalog::CatalogService;
use artfusion_gallery_server::catalog_store::{CatalogStore, JsonCatalogStore, SqliteCatalogStore};
use artfusion_gallery_server::config::{
    AppConfig, AuthStrategy, CliConfig, FileConfig, StorageBackend,
};
use artfusion_gallery_server::server::{run_server, RequestsLoggingLevel};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the data directory holding the catalog documents/database.
    #[clap(value_parser = parse_path)]
    pub data_dir: PathBuf,

    /// Catalog storage backend.
    #[clap(long, value_enum, default_value_t)]
    pub backend: StorageBackend,

    /// Path to the public media directory for uploaded images.
    /// Defaults to `<data_dir>/paintings`.
    #[clap(long, value_parser = parse_path)]
    pub media_path: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Path to a TOML config file; its values override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Admin username for the static auth strategy.
    #[clap(long)]
    pub admin_username: Option<String>,

    /// Admin password for the static auth strategy.
    #[clap(long)]
    pub admin_password: Option<String>,

    /// Secret used to sign admin session tokens.
    #[clap(long)]
    pub jwt_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => Some(FileConfig::load(path)?),
        None => None,
    };

    let cli_config = CliConfig {
        data_dir: Some(cli_args.data_dir),
        backend: cli_args.backend,
        media_path: cli_args.media_path,
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        frontend_dir_path: cli_args.frontend_dir_path,
        admin_username: cli_args.admin_username,
        admin_password: cli_args.admin_password,
        jwt_secret: cli_args.jwt_secret,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", config.data_dir))?;

    let catalog_store: Arc<dyn CatalogStore> = match config.backend {
        StorageBackend::Json => {
            info!("Opening JSON catalog in {:?}...", config.data_dir);
            Arc::new(JsonCatalogStore::new(&config.data_dir)?)
        }
        StorageBackend::Sqlite => {
            info!(
                "Opening SQLite catalog database at {:?}...",
                config.gallery_db_path()
            );
            Arc::new(SqliteCatalogStore::new(config.gallery_db_path())?)
        }
    };
    info!("Catalog ready: {} paintings", catalog_store.paintings_count());

    let blob_store = Arc::new(FsBlobStore::new(&config.media_path));
    blob_store.init().await?;

    let admin_gate: Arc<dyn AdminGate> = match config.auth.strategy {
        AuthStrategy::Static => Arc::new(StaticCredentialGate::new(
            config.auth.admin_username.clone(),
            config.auth.admin_password.clone(),
            &config.auth.jwt_secret,
            config.auth.token_lifetime_days,
        )),
        AuthStrategy::Delegated => {
            let provider_url = config
                .auth
                .provider_url
                .clone()
                .context("auth.provider_url is required for the delegated strategy")?;
            info!("Delegating admin auth to {}", provider_url);
            Arc::new(DelegatedGate::new(
                provider_url,
                config.auth.provider_api_key.clone(),
            ))
        }
    };

    let catalog = Arc::new(CatalogService::new(
        catalog_store,
        blob_store,
        config.max_upload_bytes,
    ));

    info!("Ready to serve at port {}!", config.port);
    run_server(
        catalog,
        admin_gate,
        config.media_path,
        config.logging_level,
        config.port,
        config.frontend_dir_path,
        config.max_upload_bytes,
    )
    .await
}
