use reqwest::{StatusCode, Url};
use tracing::Dispatch;

use crate::config::{ClientConfig, END_COMMENT, START_COMMENT, TRANSPORT_TIMEOUT};
use crate::error::{Error, Result};

const TYPE_PATH: &str = "api";
const LIST_PATH: &str = "list";
const SEPARATOR: &str = ",";
/// Identifier every valid list response contains.
const SENTINEL_TYPE: &str = "go";

/// Client for the gitignore.io template API.
///
/// Cloning is cheap; clones share the same connection pool and logger.
#[derive(Debug, Clone)]
pub struct GitignoreClient {
    client: reqwest::Client,
    config: ClientConfig,
    /// Normalized host without a trailing slash.
    base_url: String,
    logger: Option<Dispatch>,
}

impl GitignoreClient {
    /// Builds a client, filling empty config fields with their defaults.
    ///
    /// Failure events are reported to the caller's current `tracing` dispatcher.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::build(config, None)
    }

    /// Builds a client using the default host and User-Agent.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Builds a client that reports failure events to `logger` only.
    pub fn with_logger(config: ClientConfig, logger: Dispatch) -> Result<Self> {
        Self::build(config, Some(logger))
    }

    fn build(config: ClientConfig, logger: Option<Dispatch>) -> Result<Self> {
        let config = config.resolved();
        let base_url = normalize_host(&config.host)?;
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(TRANSPORT_TIMEOUT)
            .read_timeout(TRANSPORT_TIMEOUT)
            .pool_idle_timeout(TRANSPORT_TIMEOUT)
            .build()
            .map_err(Error::Build)?;

        Ok(Self {
            client,
            config,
            base_url,
            logger,
        })
    }

    /// Configuration as given, defaults applied.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Lists every template identifier the service knows, sorted ascending.
    pub async fn list(&self) -> Result<Vec<String>> {
        let uri = format!("{}/{}/{}", self.base_url, TYPE_PATH, LIST_PATH);
        let (status, body) = self.fetch(&uri).await?;

        let types = parse_list(&String::from_utf8_lossy(&body));
        if !types.iter().any(|t| t == SENTINEL_TYPE) {
            let err = Error::ResponseFormat { uri: uri.clone() };
            self.log_error(
                "gitignore.io api response could not be parsed",
                &uri,
                &err,
                Some(status),
            );
            return Err(err);
        }

        Ok(types)
    }

    /// Builds the request URI for the given identifiers.
    ///
    /// Identifiers are lowercased and sorted, so any permutation or casing of
    /// the same set maps to the same URI. Scheme and host are in the
    /// normalized form the request is sent with; a path prefix keeps its case.
    pub fn get_path<S: AsRef<str>>(&self, included_types: &[S]) -> String {
        let mut types: Vec<String> = included_types
            .iter()
            .map(|t| t.as_ref().to_lowercase())
            .collect();
        types.sort();

        format!(
            "{}/{}/{}",
            self.base_url,
            TYPE_PATH,
            types.join(SEPARATOR)
        )
    }

    /// Fetches the generated template for the given identifiers.
    ///
    /// The body must be framed by the start and end markers of the exact
    /// request URI; it is returned unmodified.
    pub async fn get<S: AsRef<str>>(&self, included_types: &[S]) -> Result<Vec<u8>> {
        let uri = self.get_path(included_types);
        let (status, body) = self.fetch(&uri).await?;

        let start = format!("{}{}", START_COMMENT, uri);
        let end = format!("{}{}", END_COMMENT, uri);
        if !contains(&body, start.as_bytes()) || !contains(&body, end.as_bytes()) {
            let err = Error::ResponseValidation { uri: uri.clone() };
            self.log_error(
                "gitignore.io api response is not valid",
                &uri,
                &err,
                Some(status),
            );
            return Err(err);
        }

        Ok(body)
    }

    async fn fetch(&self, uri: &str) -> Result<(StatusCode, Vec<u8>)> {
        let result = async {
            let response = self.client.get(uri).send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body.to_vec()))
        }
        .await;

        result.map_err(|source| {
            self.log_error("gitignore.io api request failed", uri, &source, None);
            Error::Transport {
                uri: uri.to_string(),
                source,
            }
        })
    }

    fn log_error(
        &self,
        message: &str,
        uri: &str,
        err: &dyn std::fmt::Display,
        status: Option<StatusCode>,
    ) {
        let status = status.map(|s| s.as_u16());
        let emit = || tracing::error!(uri, err = %err, status, "{}", message);
        match &self.logger {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, emit),
            None => emit(),
        }
    }
}

/// Parses `host` the way the transport will send it: scheme and host
/// lowercased, path prefix untouched, trailing slash removed.
fn normalize_host(host: &str) -> Result<String> {
    let url = Url::parse(host).map_err(|source| Error::InvalidHost {
        host: host.to_string(),
        source,
    })?;
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// Splits a list response on commas and newlines into sorted, unique,
/// lowercase identifiers.
fn parse_list(body: &str) -> Vec<String> {
    let mut types: Vec<String> = body
        .split([',', '\n'])
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    types.sort();
    types.dedup();
    types
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|w| w == needle)
}
