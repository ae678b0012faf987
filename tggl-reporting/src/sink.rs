//! Report destinations

use crate::{ReportPayload, ReportingConfig, Result};
use async_trait::async_trait;
use tggl_http_client::{HttpClient, HttpClientConfig};

/// Destination of report payloads
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Deliver one payload.
    async fn send(&self, payload: &ReportPayload) -> Result<()>;
}

/// Posts reports as JSON to the Tggl API
pub struct HttpReportSink {
    client: HttpClient,
    url: String,
}

impl HttpReportSink {
    pub fn new(config: &ReportingConfig) -> Result<Self> {
        let http = HttpClientConfig::builder()
            .maybe_api_key(config.api_key.clone())
            .timeout(config.request_timeout)
            .build();

        Ok(Self {
            client: HttpClient::new(http)?,
            url: config.report_url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ReportSink for HttpReportSink {
    async fn send(&self, payload: &ReportPayload) -> Result<()> {
        self.client
            .post(self.url.as_str())
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
