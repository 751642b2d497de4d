//! HTTP fetcher implementation
//!
//! This module handles every HTTP request made during an export, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - GET requests for pages, shared assets, and images
//! - Bounded retry with a fixed delay for transient failures
//! - Treating "not found" as an absent value for optional resources

use crate::config::FetchConfig;
use crate::FetchError;
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;

/// A successfully fetched resource
#[derive(Debug, Clone)]
pub struct FetchedResource {
    /// Final URL after redirects
    pub url: String,
    /// Raw response body
    pub body: Vec<u8>,
    /// Content-Type header value, if the server sent one
    pub content_type: Option<String>,
}

impl FetchedResource {
    /// Consumes the resource and returns its body as text
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected.
    pub fn into_text(self) -> String {
        match String::from_utf8(self.body) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}

/// How many times a request is tried and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy; at least one attempt is always made
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_secs(config.retry_delay_secs),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

/// What a 404 response means for a given request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NotFound {
    /// A failure like any other bad status
    Fail,
    /// The resource is optional; report it as absent
    Absent,
    /// The 404 body is the resource itself (the site's error page)
    KeepBody,
}

/// Why a single attempt failed
#[derive(Debug)]
pub(crate) enum AttemptError {
    /// Connection, timeout, or body read failure
    Transport(reqwest::Error),
    /// Non-2xx status that was not a permitted "not found"
    Status(StatusCode),
}

impl AttemptError {
    /// The single retry predicate
    ///
    /// Every bad status and every transport failure is retryable, except a
    /// request that could not even be built (malformed URL), which no amount
    /// of waiting will fix.
    pub(crate) fn is_retryable(&self) -> bool {
        match self {
            AttemptError::Transport(e) => !e.is_builder(),
            AttemptError::Status(_) => true,
        }
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Transport(e) if e.is_timeout() => write!(f, "request timeout"),
            AttemptError::Transport(e) if e.is_connect() => write!(f, "connection failed: {}", e),
            AttemptError::Transport(e) => write!(f, "{}", e),
            AttemptError::Status(status) => write!(f, "HTTP {}", status),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetch configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// HTTP GET with bounded, fixed-delay retries
///
/// # Retry Logic
///
/// | Condition                       | Action                          |
/// |---------------------------------|---------------------------------|
/// | 2xx                             | Return the body                 |
/// | 404 on an optional resource     | Return `None`, no retry         |
/// | Other non-2xx                   | Retry after the fixed delay     |
/// | Timeout / connection failure    | Retry after the fixed delay     |
/// | Malformed request               | Fail immediately                |
/// | Attempt budget exhausted        | `FetchError::GaveUp`            |
///
/// The client is cheap to clone, so the fetcher is too.
#[derive(Debug, Clone)]
pub struct RetryingFetcher {
    client: Client,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Builds a fetcher (client and policy) from the fetch configuration
    pub fn from_config(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            build_http_client(config)?,
            RetryPolicy::from_config(config),
        ))
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetches a URL, optionally treating 404 as an absent resource
    ///
    /// # Returns
    ///
    /// * `Ok(Some(resource))` - The resource was fetched
    /// * `Ok(None)` - `allow_not_found` was set and the server answered 404
    /// * `Err(FetchError)` - The attempt budget ran out or the request was malformed
    pub async fn fetch(
        &self,
        url: &str,
        allow_not_found: bool,
    ) -> Result<Option<FetchedResource>, FetchError> {
        let not_found = if allow_not_found {
            NotFound::Absent
        } else {
            NotFound::Fail
        };
        self.fetch_with(url, not_found).await
    }

    /// Fetches a required text resource
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.fetch_with(url, NotFound::Fail)
            .await?
            .map(FetchedResource::into_text)
            .ok_or_else(|| absent_required(url))
    }

    /// Fetches an optional text resource such as `robots.txt` or `sitemap.xml`
    pub async fn fetch_optional_text(&self, url: &str) -> Result<Option<String>, FetchError> {
        Ok(self
            .fetch_with(url, NotFound::Absent)
            .await?
            .map(FetchedResource::into_text))
    }

    /// Fetches the site's error page, which is served with a 404 status
    pub async fn fetch_error_page(&self, url: &str) -> Result<String, FetchError> {
        self.fetch_with(url, NotFound::KeepBody)
            .await?
            .map(FetchedResource::into_text)
            .ok_or_else(|| absent_required(url))
    }

    /// Fetches a required binary resource (images)
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.fetch_with(url, NotFound::Fail)
            .await?
            .map(|resource| resource.body)
            .ok_or_else(|| absent_required(url))
    }

    async fn fetch_with(
        &self,
        url: &str,
        not_found: NotFound,
    ) -> Result<Option<FetchedResource>, FetchError> {
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::trace!("GET {} (attempt {}/{})", url, attempt, max_attempts);

            let error = match self.attempt(url, not_found).await {
                Ok(resource) => return Ok(resource),
                Err(error) => error,
            };

            if !error.is_retryable() {
                return Err(FetchError::Request {
                    url: url.to_string(),
                    reason: error.to_string(),
                });
            }

            if attempt >= max_attempts {
                tracing::error!("Giving up on {} after {} attempts: {}", url, attempt, error);
                return Err(FetchError::GaveUp {
                    url: url.to_string(),
                    attempts: attempt,
                    reason: error.to_string(),
                });
            }

            tracing::warn!(
                "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                attempt,
                max_attempts,
                url,
                error,
                self.policy.delay
            );
            tokio::time::sleep(self.policy.delay).await;
        }
    }

    async fn attempt(
        &self,
        url: &str,
        not_found: NotFound,
    ) -> Result<Option<FetchedResource>, AttemptError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(AttemptError::Transport)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            match not_found {
                NotFound::Absent => {
                    tracing::debug!("{} not found, treating as absent", url);
                    return Ok(None);
                }
                NotFound::Fail => return Err(AttemptError::Status(status)),
                NotFound::KeepBody => {}
            }
        } else if !status.is_success() {
            return Err(AttemptError::Status(status));
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = response
            .bytes()
            .await
            .map_err(AttemptError::Transport)?
            .to_vec();

        Ok(Some(FetchedResource {
            url: final_url,
            body,
            content_type,
        }))
    }
}

fn absent_required(url: &str) -> FetchError {
    FetchError::Request {
        url: url.to_string(),
        reason: "required resource reported as absent".to_string(),
    }
}
