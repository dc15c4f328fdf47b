use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub maintenance: bool,
    pub session_file: String,
    pub http_timeout_ms: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            api_url: env::var("INSIGHTS_API_URL")
                .unwrap_or_else(|_| "http://localhost:4000/api".to_string()),
            maintenance: env::var("INSIGHTS_MAINTENANCE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            session_file: env::var("INSIGHTS_SESSION_FILE")
                .unwrap_or_else(|_| "./data/session.json".to_string()),
            http_timeout_ms: env::var("INSIGHTS_HTTP_TIMEOUT_MS")
                .unwrap_or_else(|_| "15000".to_string())
                .parse()
                .unwrap_or(15_000),
        }
    }
}
