//! Client configuration

use crate::env::EnvLoader;
use crate::{ClientError, Result};
use std::collections::HashMap;
use std::time::Duration;
use tggl_flags::Flag;
use tggl_http_client::{DEFAULT_BASE_URL, HttpClientConfig};
use tggl_reporting::ReportingConfig;

/// Shortest polling interval; shorter ones are raised to it.
pub const MIN_POLLING_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration shared by [`LocalClient`](crate::LocalClient) and
/// [`RemoteClient`](crate::RemoteClient)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key sent as `x-tggl-api-key`
    pub api_key: Option<String>,
    /// Base URL the endpoint paths are appended to
    pub base_url: Option<String>,
    /// Full endpoint URL, overrides `base_url`
    pub url: Option<String>,
    /// Interval between two config fetches
    pub polling_interval: Duration,
    /// Timeout of config and evaluation requests
    pub request_timeout: Duration,
    /// Flags served until the first fetch succeeds
    pub initial_config: Vec<Flag>,
    /// Usage reporting settings
    pub reporting: ReportingConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            url: None,
            polling_interval: Duration::from_millis(5000),
            request_timeout: Duration::from_secs(10),
            initial_config: Vec::new(),
            reporting: ReportingConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Configuration with only an API key set
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self::builder().api_key(api_key).build()
    }

    /// Load the configuration from `TGGL_*` environment variables
    ///
    /// A `.env` file in the working directory is loaded first when present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Parse the configuration from `TGGL_*` pairs
    ///
    /// Recognized keys: `TGGL_API_KEY`, `TGGL_BASE_URL`, `TGGL_URL`,
    /// `TGGL_POLLING_INTERVAL` (ms), `TGGL_REPORTING`, `TGGL_APP` and
    /// `TGGL_REPORT_INTERVAL` (ms). Other keys are ignored.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut vars = EnvLoader::default().collect(vars);
        let mut builder = Self::builder();

        if let Some(key) = vars.remove("api_key") {
            builder = builder.api_key(key);
        }
        if let Some(base_url) = vars.remove("base_url") {
            builder = builder.base_url(base_url);
        }
        if let Some(url) = vars.remove("url") {
            builder = builder.url(url);
        }
        if let Some(interval) = parse_millis(&mut vars, "polling_interval")? {
            builder = builder.polling_interval(interval);
        }

        let mut reporting = ReportingConfig::default();
        if let Some(enabled) = vars.remove("reporting") {
            reporting.enabled = parse_switch("TGGL_REPORTING", &enabled)?;
        }
        if let Some(app) = vars.remove("app") {
            reporting.app = Some(app);
        }
        if let Some(interval) = parse_millis(&mut vars, "report_interval")? {
            reporting.report_interval = interval;
        }

        Ok(builder.reporting(reporting).build())
    }

    /// URL the flag definitions are fetched from
    pub fn config_url(&self) -> String {
        self.endpoint("config")
    }

    /// URL contexts are evaluated at by the remote client
    pub fn flags_url(&self) -> String {
        self.endpoint("flags")
    }

    fn endpoint(&self, path: &str) -> String {
        match (&self.url, &self.base_url) {
            (Some(url), _) => url.clone(),
            (None, Some(base)) => format!("{}/{path}", base.trim_end_matches('/')),
            (None, None) => format!("{DEFAULT_BASE_URL}/{path}"),
        }
    }

    /// Transport settings for config and evaluation requests
    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig::builder()
            .maybe_api_key(self.api_key.clone())
            .timeout(self.request_timeout)
            .build()
    }

    /// Reporting settings with the client's defaults filled in
    ///
    /// The API key and base URL fall back to the client's, and the app
    /// prefix defaults to `tggl-rust:{version}/{client}`.
    pub fn reporting_config(&self, client: &str) -> ReportingConfig {
        let mut reporting = self.reporting.clone();

        if reporting.api_key.is_none() {
            reporting.api_key = self.api_key.clone();
        }
        if reporting.base_url.is_none() {
            reporting.base_url = self.base_url.clone();
        }
        if reporting.app_prefix.is_none() {
            reporting.app_prefix = Some(format!(
                "tggl-rust:{}/{client}",
                env!("CARGO_PKG_VERSION")
            ));
        }

        reporting
    }
}

fn parse_millis(vars: &mut HashMap<String, String>, name: &str) -> Result<Option<Duration>> {
    vars.remove(name)
        .map(|raw| match raw.trim().parse::<u64>() {
            Ok(millis) if millis > 0 => Ok(Duration::from_millis(millis)),
            _ => Err(ClientError::Config(format!(
                "TGGL_{} must be a positive number of milliseconds, got '{raw}'",
                name.to_uppercase()
            ))),
        })
        .transpose()
}

fn parse_switch(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        _ => Err(ClientError::Config(format!(
            "{name} must be true or false, got '{raw}'"
        ))),
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = Some(url.into());
        self
    }

    /// Interval between two config fetches, at least [`MIN_POLLING_INTERVAL`]
    pub fn polling_interval(mut self, interval: Duration) -> Self {
        self.config.polling_interval = interval.max(MIN_POLLING_INTERVAL);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn initial_config(mut self, flags: impl IntoIterator<Item = Flag>) -> Self {
        self.config.initial_config = flags.into_iter().collect();
        self
    }

    pub fn reporting(mut self, reporting: ReportingConfig) -> Self {
        self.config.reporting = reporting;
        self
    }

    /// Turn usage reporting off
    pub fn disable_reporting(mut self) -> Self {
        self.config.reporting.enabled = false;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
