use axum::extract::FromRef;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;
use crate::auth::AdminGate;
use crate::catalog::CatalogService;

pub type GuardedCatalogService = Arc<CatalogService>;
pub type GuardedAdminGate = Arc<dyn AdminGate>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub catalog: GuardedCatalogService,
    pub admin_gate: GuardedAdminGate,
    pub media_dir: PathBuf,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedCatalogService {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog.clone()
    }
}

impl FromRef<ServerState> for GuardedAdminGate {
    fn from_ref(input: &ServerState) -> Self {
        input.admin_gate.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
