// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! HTTP transport seam for the API client.
//!
//! [`Transport`] performs a single authenticated GET and reports the raw
//! outcome; status classification and retries live in the client.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LINK, RETRY_AFTER};

use crate::error::Error;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Raw response of a single GET request.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct HttpResponse
{
    /// HTTP status code.
    pub status:      u16,
    /// Value of the `Link` header, if any.
    pub link:        Option<String,>,
    /// Delay requested through `Retry-After`, if any.
    pub retry_after: Option<Duration,>,
    /// Response body.
    pub body:        String,
}

impl HttpResponse
{
    /// Builds a `200 OK` response carrying `body`.
    pub fn ok(body: impl Into<String,>,) -> Self
    {
        Self::with_status(200, body,)
    }

    /// Builds a response with an arbitrary status.
    pub fn with_status(status: u16, body: impl Into<String,>,) -> Self
    {
        Self {
            status, link: None, retry_after: None, body: body.into(),
        }
    }

    /// Attaches a `Link` header value.
    pub fn link(mut self, link: impl Into<String,>,) -> Self
    {
        self.link = Some(link.into(),);
        self
    }
}

/// Failure to obtain any response at all.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct TransportError
{
    /// Description of the failure.
    pub message:   String,
    /// Whether the failure is a timeout or connection problem worth retrying.
    pub transient: bool,
}

impl fmt::Display for TransportError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str(&self.message,)
    }
}

/// Performs authenticated GET requests.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug
{
    /// Sends a GET request to `url` with the given query parameters.
    async fn get(
        &self,
        url: &str,
        query: &[(String, String,)],
    ) -> Result<HttpResponse, TransportError,>;
}

/// [`Transport`] backed by a pooled [`reqwest::Client`].
#[derive(Debug, Clone,)]
pub struct ReqwestTransport
{
    client: reqwest::Client,
}

impl ReqwestTransport
{
    /// Builds a client that sends `token` as a bearer credential.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the token cannot be used as a header
    /// value or the client cannot be initialized.
    pub fn new(token: &str, timeout: Duration,) -> Result<Self, Error,>
    {
        let mut authorization = HeaderValue::from_str(&format!("Bearer {token}"),).map_err(|_| {
            Error::validation("auth token contains characters that are not valid in HTTP headers",)
        },)?;
        authorization.set_sensitive(true,);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization,);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json",),);

        let client = reqwest::Client::builder()
            .default_headers(headers,)
            .user_agent(USER_AGENT,)
            .timeout(timeout,)
            .build()
            .map_err(|e| Error::validation(format!("failed to initialize HTTP client: {e}"),),)?;

        Ok(Self {
            client,
        },)
    }
}

#[async_trait]
impl Transport for ReqwestTransport
{
    async fn get(
        &self,
        url: &str,
        query: &[(String, String,)],
    ) -> Result<HttpResponse, TransportError,>
    {
        let response = self.client.get(url,).query(query,).send().await.map_err(|e| {
            TransportError {
                transient: e.is_timeout() || e.is_connect() || e.is_request(),
                message:   e.to_string(),
            }
        },)?;

        let status = response.status().as_u16();
        let headers = response.headers();
        let link = headers.get(LINK,).and_then(|value| value.to_str().ok(),).map(str::to_owned,);
        let retry_after = headers
            .get(RETRY_AFTER,)
            .and_then(|value| value.to_str().ok(),)
            .and_then(|value| value.trim().parse::<u64,>().ok(),)
            .map(Duration::from_secs,);

        let body = response.text().await.map_err(|e| TransportError {
            message: format!("failed to read response body: {e}"), transient: true,
        },)?;

        Ok(HttpResponse {
            status,
            link,
            retry_after,
            body,
        },)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn user_agent_names_the_crate()
    {
        assert!(USER_AGENT.starts_with("stfd/"));
    }

    #[test]
    fn token_with_newline_is_rejected()
    {
        let error = ReqwestTransport::new("bad\ntoken", Duration::from_secs(5,),).unwrap_err();
        assert!(error.to_string().contains("not valid in HTTP headers"));
    }

    #[test]
    fn response_builders_set_fields()
    {
        let response = HttpResponse::with_status(503, "busy",).link("<x>; rel=\"next\"",);
        assert_eq!(response.status, 503);
        assert_eq!(response.body, "busy");
        assert!(response.link.is_some());
        assert!(response.retry_after.is_none());
    }
}
