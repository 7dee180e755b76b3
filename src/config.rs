use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Version of the crate, used in the default User-Agent.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Base URL used when no host is configured.
pub const DEFAULT_HOST: &str = "https://www.gitignore.io";
/// User-Agent used when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("gogi/", env!("CARGO_PKG_VERSION"));
/// Marks the beginning of a generated template.
pub const START_COMMENT: &str = "# Created by ";
/// Marks the end of a generated template.
pub const END_COMMENT: &str = "# End of ";

/// Connect, read and idle-connection timeout of the transport.
pub const TRANSPORT_TIMEOUT: Duration = Duration::from_secs(1);

/// Connection parameters of a [`GitignoreClient`](crate::GitignoreClient).
///
/// Empty fields are replaced with [`DEFAULT_HOST`] and [`DEFAULT_USER_AGENT`]
/// when the client is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Sent as the `User-Agent` header.
    pub user_agent: String,
    /// Base URL for all requests, e.g. `https://www.gitignore.io`.
    pub host: String,
}

impl ClientConfig {
    pub fn new(user_agent: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            host: host.into(),
        }
    }

    /// Returns a copy with every empty field replaced by its default.
    pub fn resolved(mut self) -> Self {
        if self.host.is_empty() {
            self.host = DEFAULT_HOST.to_string();
        }
        if self.user_agent.is_empty() {
            self.user_agent = DEFAULT_USER_AGENT.to_string();
        }
        self
    }
}
