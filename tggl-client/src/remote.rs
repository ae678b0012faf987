//! Client delegating evaluation to the Tggl API.

use crate::{ClientConfig, ClientError, FlagsResponse, Result};
use std::collections::BTreeMap;
use tggl_flags::{Context, Value};
use tggl_http_client::HttpClient;
use tggl_log::{TARGET_CLIENT, debug, warn};
use tggl_reporting::Reporting;

/// Name the remote client reports usage under
pub const REMOTE_CLIENT_NAME: &str = "RemoteClient";

/// Feature flag client evaluating contexts with `POST /flags`
///
/// Evaluation never fails: when the API cannot be reached, every flag is
/// inactive in the returned responses.
#[derive(Clone)]
pub struct RemoteClient {
    client: HttpClient,
    url: String,
    reporting: Reporting,
}

impl RemoteClient {
    /// Create a client and start its reporting timer
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let reporting = Reporting::new(config.reporting_config(REMOTE_CLIENT_NAME))?;
        Self::with_reporting(config, reporting)
    }

    /// Create a client reporting usage through `reporting`
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_reporting(config: ClientConfig, reporting: Reporting) -> Result<Self> {
        let client = HttpClient::new(config.http_config())?;
        reporting.start();

        Ok(Self {
            client,
            url: config.flags_url(),
            reporting,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn reporting(&self) -> &Reporting {
        &self.reporting
    }

    /// Evaluate every flag for one context
    pub async fn eval_context<C: Context + ?Sized>(&self, context: &C) -> FlagsResponse {
        let body = vec![context.to_json()];
        self.eval_json(body).await.pop().unwrap_or_default()
    }

    /// Evaluate every flag for several contexts in one request
    ///
    /// Responses are in the order of `contexts`.
    pub async fn eval_contexts<C: Context>(&self, contexts: &[C]) -> Vec<FlagsResponse> {
        let body = contexts.iter().map(|context| context.to_json()).collect();
        self.eval_json(body).await
    }

    async fn eval_json(&self, body: Vec<serde_json::Value>) -> Vec<FlagsResponse> {
        let count = body.len();

        let flags = match self.request(&body).await {
            Ok(flags) => flags,
            Err(e) => {
                warn!(target: TARGET_CLIENT, "Could not eval context: {}", e);
                vec![BTreeMap::new(); count]
            }
        };

        flags
            .into_iter()
            .map(|flags| FlagsResponse::new(flags).with_reporting(self.reporting.clone()))
            .collect()
    }

    async fn request(&self, body: &[serde_json::Value]) -> Result<Vec<BTreeMap<String, Value>>> {
        debug!(target: TARGET_CLIENT, "Evaluating {} context(s) remotely", body.len());

        let flags: Vec<BTreeMap<String, Value>> = self
            .client
            .post(self.url.as_str())
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json()?;

        if flags.len() != body.len() {
            return Err(ClientError::Config(format!(
                "Expected {} evaluation result(s), got {}",
                body.len(),
                flags.len()
            )));
        }

        Ok(flags)
    }

    /// Stop the reporting timer and send the remaining usage
    pub async fn close(&self) {
        self.reporting.close().await;
    }
}
