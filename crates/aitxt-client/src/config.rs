use aitxt::limits::MAX_INPUT_BYTES;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Whole-request timeout
    pub timeout: Duration,
    /// Cache lifetime when the response carries no `max-age`
    pub default_ttl: Duration,
    pub user_agent: String,
    /// Larger bodies are rejected before parsing
    pub max_body_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            default_ttl: Duration::from_secs(3600),
            user_agent: format!("aitxt-client/{}", env!("CARGO_PKG_VERSION")),
            max_body_bytes: MAX_INPUT_BYTES,
        }
    }
}
