// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Authenticated, paginated access to the Sentry REST API.
//!
//! [`ApiClient`] issues GET requests through a [`Transport`], retries
//! transient failures with exponential backoff and maps HTTP statuses onto
//! the crate [`Error`] taxonomy. List endpoints are consumed through a
//! [`Paginator`] that yields one page per call and stops once the `Link`
//! header signals that no further pages exist.

mod link;
mod transport;

use std::{fmt, sync::Mutex, time::Duration};

use serde_json::Value;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

pub use link::{LinkEntry, next_cursor, parse_link_header};
pub use transport::{HttpResponse, ReqwestTransport, Transport, TransportError, USER_AGENT};

use crate::{
    error::Error,
    retry::{RetryConfig, RetryError, Retryable, retry_with_backoff},
};

/// Default Sentry API root.
pub const DEFAULT_BASE_URL: &str = "https://sentry.io/api/0";

const MAX_ERROR_BODY: usize = 512;

/// Explicit configuration for [`ApiClient`].
#[derive(Debug, Clone, PartialEq,)]
pub struct ApiConfig
{
    /// API root such as `https://sentry.io/api/0`.
    pub base_url:             String,
    /// Bearer token.
    pub token:                String,
    /// Per-request timeout.
    pub timeout:              Duration,
    /// Retry policy for transient failures.
    pub retry:                RetryConfig,
    /// Minimum spacing between consecutive requests.
    pub min_request_interval: Duration,
}

impl ApiConfig
{
    /// Creates a configuration with default timeout, retry policy and
    /// request spacing.
    pub fn new(base_url: impl Into<String,>, token: impl Into<String,>,) -> Self
    {
        Self {
            base_url:             base_url.into(),
            token:                token.into(),
            timeout:              Duration::from_secs(30,),
            retry:                RetryConfig::default(),
            min_request_interval: Duration::from_millis(100,),
        }
    }
}

/// Organization-scoped list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash,)]
pub enum Resource
{
    /// `/organizations/{org}/teams/`
    Teams,
    /// `/organizations/{org}/projects/`
    Projects,
    /// `/organizations/{org}/members/`
    Members,
}

impl Resource
{
    fn segment(self,) -> &'static str
    {
        match self {
            Self::Teams => "teams",
            Self::Projects => "projects",
            Self::Members => "members",
        }
    }
}

impl fmt::Display for Resource
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str(self.segment(),)
    }
}

/// Sentry API client generic over its transport.
#[derive(Debug,)]
pub struct ApiClient<T = ReqwestTransport,>
{
    transport:    T,
    base_url:     String,
    retry:        RetryConfig,
    min_interval: Duration,
    next_slot:    Mutex<Option<Instant,>,>,
}

impl ApiClient<ReqwestTransport,>
{
    /// Creates a client backed by [`ReqwestTransport`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the token is empty or unusable.
    pub fn new(config: ApiConfig,) -> Result<Self, Error,>
    {
        if config.token.trim().is_empty() {
            return Err(Error::validation("auth token is required",),);
        }
        let transport = ReqwestTransport::new(&config.token, config.timeout,)?;
        Ok(Self::with_transport(transport, &config,),)
    }
}

impl<T: Transport,> ApiClient<T,>
{
    /// Creates a client over an arbitrary transport. The token in `config`
    /// is not used; the transport is responsible for authentication.
    pub fn with_transport(transport: T, config: &ApiConfig,) -> Self
    {
        info!("Initialized Sentry API client for {}", config.base_url);
        Self {
            transport,
            base_url: config.base_url.trim_end_matches('/',).to_owned(),
            retry: config.retry.clone(),
            min_interval: config.min_request_interval,
            next_slot: Mutex::new(None,),
        }
    }

    /// Returns the underlying transport.
    pub fn transport(&self,) -> &T
    {
        &self.transport
    }

    /// Fetches a single JSON object such as `/organizations/{slug}/`.
    ///
    /// # Errors
    ///
    /// Propagates request errors and returns [`Error::Decode`] when the body
    /// is not a JSON object.
    pub async fn get_object(&self, path: &str,) -> Result<Value, Error,>
    {
        let url = self.url(path,);
        let response = self.get(&url, &[],).await?;
        let value: Value = decode(&url, &response.body,)?;
        if !value.is_object() {
            return Err(Error::Decode {
                url, message: "expected a JSON object".to_owned(),
            },);
        }
        Ok(value,)
    }

    /// Starts lazy pagination over the list endpoint at `path`.
    pub fn paginate(&self, path: &str,) -> Paginator<'_, T,>
    {
        Paginator {
            client: self, url: self.url(path,), cursor: None, done: false, pages: 0,
        }
    }

    /// Fetches every record of `resource` for `organization`, following
    /// pagination until the service signals the last page.
    ///
    /// # Errors
    ///
    /// Any failed page aborts the whole fetch.
    pub async fn fetch_all(
        &self,
        resource: Resource,
        organization: &str,
    ) -> Result<Vec<Value,>, Error,>
    {
        let path = format!("organizations/{organization}/{}/", resource.segment());
        let records = self.collect(&path,).await?;
        info!("Fetched {} {} for organization {}", records.len(), resource, organization);
        Ok(records,)
    }

    /// Lists every organization visible to the token.
    ///
    /// # Errors
    ///
    /// Any failed page aborts the listing.
    pub async fn list_organizations(&self,) -> Result<Vec<Value,>, Error,>
    {
        self.collect("organizations/",).await
    }

    async fn collect(&self, path: &str,) -> Result<Vec<Value,>, Error,>
    {
        let mut pager = self.paginate(path,);
        let mut records = Vec::new();
        while let Some(page,) = pager.next_page().await? {
            records.extend(page,);
        }
        Ok(records,)
    }

    fn url(&self, path: &str,) -> String
    {
        format!("{}/{}", self.base_url, path.trim_start_matches('/',))
    }

    async fn get(&self, url: &str, query: &[(String, String,)],) -> Result<HttpResponse, Error,>
    {
        let outcome = retry_with_backoff(&self.retry, url, || async move {
            self.throttle().await;
            debug!("GET {} {:?}", url, query);
            match self.transport.get(url, query,).await {
                Ok(response,) if (200..300).contains(&response.status,) => Ok(response,),
                Ok(response,) => Err(Attempt::Status(response,),),
                Err(error,) => Err(Attempt::Transport(error,),),
            }
        },)
        .await;

        outcome.map_err(|failure| failure_to_error(url, failure,),)
    }

    async fn throttle(&self,)
    {
        if self.min_interval.is_zero() {
            return;
        }

        let wait_until = {
            let mut slot = self.next_slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner(),);
            let now = Instant::now();
            let start = slot.map_or(now, |next| next.max(now,),);
            *slot = Some(start + self.min_interval,);
            start
        };
        sleep_until(wait_until,).await;
    }
}

/// Lazy, finite, non-restartable sequence of pages.
#[derive(Debug,)]
pub struct Paginator<'client, T,>
{
    client: &'client ApiClient<T,>,
    url:    String,
    cursor: Option<String,>,
    done:   bool,
    pages:  u32,
}

impl<T: Transport,> Paginator<'_, T,>
{
    /// Fetches the next page, or returns `Ok(None)` once the previous page
    /// signalled that no further pages exist.
    ///
    /// # Errors
    ///
    /// Propagates request errors and returns [`Error::Decode`] when a page is
    /// not a JSON array.
    pub async fn next_page(&mut self,) -> Result<Option<Vec<Value,>,>, Error,>
    {
        if self.done {
            return Ok(None,);
        }

        let query: Vec<(String, String,),> =
            self.cursor.iter().map(|cursor| ("cursor".to_owned(), cursor.clone(),),).collect();
        let response = self.client.get(&self.url, &query,).await?;
        let records = match decode(&self.url, &response.body,)? {
            Value::Array(records,) => records,
            _ => {
                return Err(Error::Decode {
                    url:     self.url.clone(),
                    message: "expected a JSON array".to_owned(),
                },);
            }
        };
        self.pages += 1;
        debug!("Page {} of {} returned {} records", self.pages, self.url, records.len());

        match next_cursor(response.link.as_deref(),) {
            Some(cursor,) if self.cursor.as_deref() == Some(cursor.as_str(),) => {
                warn!("{} repeated cursor {}; stopping pagination", self.url, cursor);
                self.done = true;
            }
            Some(cursor,) => self.cursor = Some(cursor,),
            None => self.done = true,
        }

        Ok(Some(records,),)
    }

    /// Number of pages fetched so far.
    pub fn pages(&self,) -> u32
    {
        self.pages
    }
}

/// Outcome of a single failed attempt.
#[derive(Debug,)]
enum Attempt
{
    Transport(TransportError,),
    Status(HttpResponse,),
}

impl Retryable for Attempt
{
    fn is_transient(&self,) -> bool
    {
        match self {
            Self::Transport(error,) => error.transient,
            Self::Status(response,) => response.status == 429 || response.status >= 500,
        }
    }

    fn retry_after(&self,) -> Option<Duration,>
    {
        match self {
            Self::Status(response,) => response.retry_after,
            Self::Transport(_,) => None,
        }
    }
}

impl fmt::Display for Attempt
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        match self {
            Self::Transport(error,) => write!(f, "{error}"),
            Self::Status(response,) if response.status == 429 => f.write_str("rate limited (HTTP 429)",),
            Self::Status(response,) => write!(f, "HTTP {}", response.status),
        }
    }
}

fn failure_to_error(url: &str, failure: RetryError<Attempt,>,) -> Error
{
    let RetryError {
        error,
        attempts,
    } = failure;

    if error.is_transient() {
        return Error::Transient {
            url: url.to_owned(), attempts, message: error.to_string(),
        };
    }

    match error {
        Attempt::Transport(error,) => Error::Request {
            url: url.to_owned(), message: error.message,
        },
        Attempt::Status(response,) => match response.status {
            401 | 403 => Error::Authentication {
                url: url.to_owned(), status: response.status,
            },
            404 => Error::NotFound {
                url: url.to_owned(),
            },
            status => Error::Http {
                url: url.to_owned(), status, body: truncate(&response.body,),
            },
        },
    }
}

fn decode(url: &str, body: &str,) -> Result<Value, Error,>
{
    serde_json::from_str(body,).map_err(|e| Error::Decode {
        url: url.to_owned(), message: e.to_string(),
    },)
}

fn truncate(body: &str,) -> String
{
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY,) {
        Some((index, _,),) => format!("{}...", &trimmed[..index]),
        None => trimmed.to_owned(),
    }
}
