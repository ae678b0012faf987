//! Request builder.

use crate::{API_KEY_HEADER, HttpClient, HttpClientError, Response, Result};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use std::time::Duration;

/// HTTP request builder.
pub struct RequestBuilder<'a> {
    client: &'a HttpClient,
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    body_error: Option<HttpClientError>,
    timeout: Option<Duration>,
}

impl<'a> RequestBuilder<'a> {
    /// Create a new request builder.
    pub(crate) fn new(client: &'a HttpClient, method: Method, url: String) -> Self {
        Self {
            client,
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            body_error: None,
            timeout: None,
        }
    }

    /// Add a header to the request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Set the request body as JSON.
    ///
    /// A serialization failure is reported when the request is sent.
    pub fn json<T: Serialize + ?Sized>(mut self, json: &T) -> Self {
        match serde_json::to_vec(json) {
            Ok(bytes) => {
                self.headers.insert(
                    http::header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                self.body = Some(bytes);
            }
            Err(e) => self.body_error = Some(e.into()),
        }
        self
    }

    /// Set a custom timeout for this request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolve the request URL against the configured base URL.
    ///
    /// Absolute URLs are used as-is. Relative paths are appended to the base
    /// URL so that a base with a path prefix keeps it.
    fn build_url(&self) -> Result<url::Url> {
        if let Ok(url) = url::Url::parse(&self.url) {
            return Ok(url);
        }

        let base = self
            .client
            .config()
            .base_url
            .as_deref()
            .ok_or_else(|| HttpClientError::InvalidUrl(self.url.clone()))?;

        let joined = format!(
            "{}/{}",
            base.trim_end_matches('/'),
            self.url.trim_start_matches('/')
        );
        url::Url::parse(&joined).map_err(|e| HttpClientError::InvalidUrl(format!("{joined}: {e}")))
    }

    /// Send the request.
    pub async fn send(self) -> Result<Response> {
        if let Some(err) = self.body_error {
            return Err(err);
        }

        let url = self.build_url()?;
        let config = self.client.config();

        let mut request = self.client.inner().request(self.method.clone(), url);

        for (name, value) in &config.default_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        if let Some(api_key) = &config.api_key {
            request = request.header(API_KEY_HEADER, api_key.as_str());
        }

        for (name, value) in &self.headers {
            request = request.header(name, value);
        }

        if let Some(body) = self.body {
            request = request.body(body);
        }

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        self.client.execute(request.build()?).await
    }
}
