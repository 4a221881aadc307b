use super::RequestsLoggingLevel;

#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub port: u16,
    pub requests_logging_level: RequestsLoggingLevel,
    /// Path to a frontend directory to be statically served, if any.
    pub frontend_dir_path: Option<String>,
}
