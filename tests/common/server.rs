//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own catalog and media
//! directory.

use super::constants::*;
use artfusion_gallery_server::auth::{AdminGate, StaticCredentialGate};
use artfusion_gallery_server::blob_store::FsBlobStore;
use artfusion_gallery_server::catalog::CatalogService;
use artfusion_gallery_server::catalog_store::{
    CatalogStore, JsonCatalogStore, SqliteCatalogStore,
};
use artfusion_gallery_server::config::StorageBackend;
use artfusion_gallery_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with an isolated catalog and media directory
///
/// When dropped, the server gracefully shuts down and temp resources are
/// cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Catalog store handle for direct assertions in tests
    pub catalog_store: Arc<dyn CatalogStore>,

    /// Where uploaded images land
    pub media_dir: PathBuf,

    // Private fields - keep resources alive until drop
    _temp_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a test server backed by the JSON document store.
    pub async fn spawn() -> Self {
        Self::spawn_with_backend(StorageBackend::Json).await
    }

    /// Spawns a test server backed by the SQLite store.
    pub async fn spawn_sqlite() -> Self {
        Self::spawn_with_backend(StorageBackend::Sqlite).await
    }

    /// Spawns a new test server on a random port
    ///
    /// # Panics
    ///
    /// Panics if store creation, port binding or server startup fails, or
    /// if the server doesn't become ready within the timeout.
    pub async fn spawn_with_backend(backend: StorageBackend) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_dir = temp_dir.path().join("data");
        let media_dir = temp_dir.path().join("paintings");
        std::fs::create_dir_all(&data_dir).expect("Failed to create data dir");

        let catalog_store: Arc<dyn CatalogStore> = match backend {
            StorageBackend::Json => {
                Arc::new(JsonCatalogStore::new(&data_dir).expect("Failed to open JSON store"))
            }
            StorageBackend::Sqlite => Arc::new(
                SqliteCatalogStore::new(data_dir.join("gallery.db"))
                    .expect("Failed to open SQLite store"),
            ),
        };
        let catalog_store_for_test = catalog_store.clone();

        let blob_store = Arc::new(FsBlobStore::new(&media_dir));
        let catalog = Arc::new(CatalogService::new(
            catalog_store,
            blob_store,
            MAX_UPLOAD_BYTES,
        ));

        let admin_gate: Arc<dyn AdminGate> = Arc::new(StaticCredentialGate::new(
            ADMIN_USER,
            ADMIN_PASS,
            JWT_SECRET,
            7,
        ));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            frontend_dir_path: None,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        };

        let app = make_app(config, catalog, admin_gate, media_dir.clone())
            .expect("Failed to build app");

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            catalog_store: catalog_store_for_test,
            media_dir,
            _temp_dir: temp_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Names of the files currently stored in the media directory.
    pub fn media_files(&self) -> Vec<String> {
        match std::fs::read_dir(&self.media_dir) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Waits for the server to become ready by polling the `/` endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Send shutdown signal
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
        // TempDir will be cleaned up automatically
    }
}
