//! ArtFusion Gallery Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod auth;
pub mod blob_store;
pub mod catalog;
pub mod catalog_store;
pub mod config;
pub mod rating;
pub mod server;

// Re-export commonly used types for convenience
pub use auth::{AdminGate, DelegatedGate, StaticCredentialGate};
pub use blob_store::{BlobStore, FsBlobStore};
pub use catalog::CatalogService;
pub use catalog_store::{CatalogStore, JsonCatalogStore, SqliteCatalogStore};
pub use rating::RatingAggregator;
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
