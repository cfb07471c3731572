use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("response from {url} exceeds the {limit} byte limit")]
    TooLarge { url: String, limit: usize },

    #[error("policy at {url} could not be parsed: {}", .errors.join("; "))]
    Parse { url: String, errors: Vec<String> },
}

impl ClientError {
    pub(crate) fn http(url: &str, source: reqwest::Error) -> Self {
        ClientError::Http {
            url: url.to_string(),
            source,
        }
    }
}
