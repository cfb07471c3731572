use aitxt::FormatError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read policy file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("policy file {} could not be parsed: {}", .path.display(), .errors.join("; "))]
    Policy { path: PathBuf, errors: Vec<String> },

    #[error("policy could not be rendered: {0}")]
    Render(#[from] FormatError),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
