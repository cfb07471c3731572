//! Client side of ai.txt: find, fetch and evaluate a site's AI policy.
//!
//! ```no_run
//! use aitxt::PolicyField;
//! use aitxt_client::{AiTxtClient, ClientConfig};
//!
//! # async fn example() -> Result<(), aitxt_client::ClientError> {
//! let client = AiTxtClient::new(ClientConfig::default())?;
//! let verdict = client
//!     .check_access("https://example.com", "MyBot", PolicyField::Training, Some("/blog/post"))
//!     .await?;
//! println!("{}", verdict);
//! # Ok(())
//! # }
//! ```
mod cache;
pub mod client;
pub mod config;
pub mod error;

pub use client::{AiTxtClient, Discovery};
pub use config::ClientConfig;
pub use error::ClientError;
