//! Client for the gitignore.io template API.
//!
//! [`GitignoreClient::list`] enumerates the available template identifiers and
//! [`GitignoreClient::get`] fetches the generated `.gitignore` content for a set
//! of them. Failures are returned as [`Error`] and reported once through
//! `tracing` at error level.
//!
//! ```no_run
//! # async fn run() -> gogi::Result<()> {
//! let client = gogi::GitignoreClient::with_defaults()?;
//! let types = client.list().await?;
//! assert!(types.iter().any(|t| t == "rust"));
//! let content = client.get(&["rust", "macos"]).await?;
//! println!("{}", String::from_utf8_lossy(&content));
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;

pub use client::GitignoreClient;
pub use config::{
    ClientConfig, DEFAULT_HOST, DEFAULT_USER_AGENT, END_COMMENT, START_COMMENT,
    TRANSPORT_TIMEOUT, VERSION,
};
pub use error::{Error, Result};
