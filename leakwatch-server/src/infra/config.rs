use std::net::SocketAddr;

/// Runtime configuration, resolved in `main` from CLI flags and environment
/// variables (`.env` is loaded first via dotenvy).
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub max_db_connections: u32,
    pub redis_url: Option<String>,
    /// List-response caching requires Redis; disabled automatically when no
    /// `redis_url` is configured.
    pub cache_enabled: bool,

    pub github_app_id: String,
    pub github_installation_id: u64,
    pub github_private_key_path: String,

    pub scanner_binary: String,
    pub scanner_user_agent_suffix: String,
    /// Default internal parallelism passed to the scanner.
    pub scan_concurrency: u32,

    pub task_workers: usize,
    pub task_queue_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".parse().expect("static addr parses"),
            database_url: String::new(),
            max_db_connections: 10,
            redis_url: None,
            cache_enabled: false,
            github_app_id: String::new(),
            github_installation_id: 0,
            github_private_key_path: String::new(),
            scanner_binary: "trufflehog".to_string(),
            scanner_user_agent_suffix: "Leakwatch".to_string(),
            scan_concurrency: 10,
            task_workers: 4,
            task_queue_depth: 1024,
        }
    }
}
