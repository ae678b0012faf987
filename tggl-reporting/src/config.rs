//! Reporting configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tggl_http_client::DEFAULT_BASE_URL;

/// Shortest flush interval; shorter ones are raised to it.
pub const MIN_REPORT_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for usage reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportingConfig {
    /// Enable usage reporting
    pub enabled: bool,
    /// Application name, appended to the client id
    pub app: Option<String>,
    /// Client id prefix identifying the SDK flavour
    pub app_prefix: Option<String>,
    /// API key sent with reports
    pub api_key: Option<String>,
    /// Full report URL, overrides `base_url`
    pub url: Option<String>,
    /// Base URL the `/report` path is appended to
    pub base_url: Option<String>,
    /// Interval between two flushes
    pub report_interval: Duration,
    /// Maximum number of received values per request
    pub page_size: usize,
    /// Received values and labels are truncated to this many characters
    pub max_value_length: usize,
    /// Timeout of a report request
    pub request_timeout: Duration,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            app: None,
            app_prefix: None,
            api_key: None,
            url: None,
            base_url: None,
            report_interval: Duration::from_millis(5000),
            page_size: 2000,
            max_value_length: 240,
            request_timeout: Duration::from_secs(20),
        }
    }
}

impl ReportingConfig {
    /// Create a new configuration builder
    pub fn builder() -> ReportingConfigBuilder {
        ReportingConfigBuilder::default()
    }

    /// Configuration with reporting turned off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// URL reports are posted to
    pub fn report_url(&self) -> String {
        match (&self.url, &self.base_url) {
            (Some(url), _) => url.clone(),
            (None, Some(base)) => format!("{}/report", base.trim_end_matches('/')),
            (None, None) => format!("{DEFAULT_BASE_URL}/report"),
        }
    }

    /// Identity flag usage is counted under: `{app_prefix}/{app}`, or
    /// whichever part is set.
    pub fn client_id(&self) -> String {
        match (&self.app_prefix, &self.app) {
            (Some(prefix), Some(app)) => format!("{prefix}/{app}"),
            (Some(prefix), None) => prefix.clone(),
            (None, Some(app)) => app.clone(),
            (None, None) => String::new(),
        }
    }
}

/// Builder for ReportingConfig
#[derive(Default)]
pub struct ReportingConfigBuilder {
    config: ReportingConfig,
}

impl ReportingConfigBuilder {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    pub fn app(mut self, app: impl Into<String>) -> Self {
        self.config.app = Some(app.into());
        self
    }

    pub fn app_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.app_prefix = Some(prefix.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = Some(url.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    pub fn report_interval(mut self, interval: Duration) -> Self {
        self.config.report_interval = interval.max(MIN_REPORT_INTERVAL);
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.config.page_size = size.max(1);
        self
    }

    pub fn max_value_length(mut self, length: usize) -> Self {
        self.config.max_value_length = length;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn build(self) -> ReportingConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReportingConfig::default();
        assert!(config.enabled);
        assert_eq!(config.report_interval, Duration::from_millis(5000));
        assert_eq!(config.page_size, 2000);
        assert_eq!(config.max_value_length, 240);
        assert_eq!(config.report_url(), "https://api.tggl.io/report");
    }

    #[test]
    fn test_report_url() {
        let config = ReportingConfig::builder().base_url("http://localhost:3000/").build();
        assert_eq!(config.report_url(), "http://localhost:3000/report");

        let config = ReportingConfig::builder()
            .base_url("http://localhost:3000")
            .url("http://collector/ingest")
            .build();
        assert_eq!(config.report_url(), "http://collector/ingest");
    }

    #[test]
    fn test_client_id() {
        let both = ReportingConfig::builder().app_prefix("sdk").app("shop").build();
        assert_eq!(both.client_id(), "sdk/shop");

        let prefix = ReportingConfig::builder().app_prefix("sdk").build();
        assert_eq!(prefix.client_id(), "sdk");

        let app = ReportingConfig::builder().app("shop").build();
        assert_eq!(app.client_id(), "shop");

        assert_eq!(ReportingConfig::default().client_id(), "");
    }

    #[test]
    fn test_page_size_is_at_least_one() {
        assert_eq!(ReportingConfig::builder().page_size(0).build().page_size, 1);
    }

    #[test]
    fn test_zero_report_interval_is_raised() {
        let config = ReportingConfig::builder().report_interval(Duration::ZERO).build();
        assert_eq!(config.report_interval, MIN_REPORT_INTERVAL);
    }
}
