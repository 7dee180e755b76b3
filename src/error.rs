use thiserror::Error;

/// Errors returned by [`GitignoreClient`](crate::GitignoreClient).
///
/// Every variant is terminal for the call that produced it; the client never
/// retries on its own.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("invalid gitignore.io host {host:?}: {source}")]
    InvalidHost {
        host: String,
        #[source]
        source: url::ParseError,
    },

    #[error("gitignore.io api request to {uri} failed: {source}")]
    Transport {
        uri: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("gitignore.io api response from {uri} could not be parsed")]
    ResponseFormat { uri: String },

    #[error("gitignore.io api response from {uri} is not valid")]
    ResponseValidation { uri: String },
}

impl Error {
    /// Request URI the error refers to, if any.
    pub fn uri(&self) -> Option<&str> {
        match self {
            Error::Build(_) | Error::InvalidHost { .. } => None,
            Error::Transport { uri, .. }
            | Error::ResponseFormat { uri }
            | Error::ResponseValidation { uri } => Some(uri),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
