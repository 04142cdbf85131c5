use super::RequestsLoggingLevel;

/// Runtime configuration for the HTTP server.
#[derive(Clone, Debug, Default)]
pub struct ServerConfig {
    pub port: u16,
    pub requests_logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub max_upload_bytes: u64,
}
