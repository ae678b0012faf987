//! Client evaluating flags locally against a polled config.

use crate::source::{ConfigSource, HttpConfigSource};
use crate::{ClientConfig, Poller, Result};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tggl_flags::{ConfigSnapshot, ConfigStore, Context, Value, Variation};
use tggl_log::{TARGET_CLIENT, debug};
use tggl_reporting::{FlagUsage, Reporting};

/// Name the local client reports usage under
pub const LOCAL_CLIENT_NAME: &str = "LocalClient";

/// Feature flag client evaluating against a local snapshot
///
/// Flag definitions are fetched in the background and evaluation never
/// waits on the network. Until the first fetch succeeds, the initial
/// config (empty by default) is served.
///
/// Cheap to clone; clones share the same snapshot, poller and reporting.
///
/// # Examples
///
/// ```rust,no_run
/// use tggl_client::{ClientConfig, LocalClient};
/// use tggl_flags::EvaluationContext;
///
/// # async fn run() -> tggl_client::Result<()> {
/// let client = LocalClient::new(ClientConfig::with_api_key("server-key"))?;
/// client.ready().await?;
///
/// let context = EvaluationContext::new().with_user_id("u1");
/// if client.is_active(&context, "new-checkout") {
///     // ...
/// }
///
/// client.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalClient {
    inner: Arc<LocalClientInner>,
}

struct LocalClientInner {
    store: Arc<ConfigStore>,
    poller: Poller,
    reporting: Reporting,
}

impl LocalClient {
    /// Create a client polling the Tggl API
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let source = HttpConfigSource::new(&config)?;
        Self::with_source(config, Arc::new(source))
    }

    /// Create a client polling a custom source
    pub fn with_source(config: ClientConfig, source: Arc<dyn ConfigSource>) -> Result<Self> {
        let reporting = Reporting::new(config.reporting_config(LOCAL_CLIENT_NAME))?;
        Ok(Self::from_parts(config, source, reporting))
    }

    /// Create a client from a source and a reporting instance
    ///
    /// Starts both the poller and the reporting timer.
    pub fn from_parts(config: ClientConfig, source: Arc<dyn ConfigSource>, reporting: Reporting) -> Self {
        let store = Arc::new(ConfigStore::with_snapshot(ConfigSnapshot::from_flags(
            config.initial_config,
        )));
        let poller = Poller::spawn(source, store.clone(), config.polling_interval);
        reporting.start();

        debug!(target: TARGET_CLIENT, "Local client started");

        Self {
            inner: Arc::new(LocalClientInner {
                store,
                poller,
                reporting,
            }),
        }
    }

    /// Wait until the first config fetch succeeded
    ///
    /// Returns [`ClientError::Closed`](crate::ClientError::Closed) when the
    /// client is closed first.
    pub async fn ready(&self) -> Result<()> {
        self.inner.poller.ready().await
    }

    pub fn is_ready(&self) -> bool {
        self.inner.poller.is_ready()
    }

    /// Evaluate a flag without reporting usage
    pub fn evaluate<C: Context + ?Sized>(&self, context: &C, slug: &str) -> Variation {
        self.inner.store.read().evaluate(context, slug)
    }

    /// Whether the flag is active for this context
    pub fn is_active<C: Context + ?Sized>(&self, context: &C, slug: &str) -> bool {
        let variation = self.evaluate(context, slug);

        self.inner.reporting.report_flag(
            slug,
            FlagUsage::new(variation.active, variation.value, Value::Null),
        );
        self.inner.reporting.report_context(context);

        variation.active
    }

    /// Value of the flag for this context, or `default` when inactive
    pub fn get<C: Context + ?Sized>(
        &self,
        context: &C,
        slug: &str,
        default: impl Into<Value>,
    ) -> Value {
        let default = default.into();
        let variation = self.evaluate(context, slug);
        let value = if variation.active {
            variation.value
        } else {
            default.clone()
        };

        self.inner.reporting.report_flag(
            slug,
            FlagUsage::new(!value.is_null(), value.clone(), default),
        );
        self.inner.reporting.report_context(context);

        value
    }

    /// Values of every flag active for this context
    pub fn get_all_active_flags<C: Context + ?Sized>(&self, context: &C) -> BTreeMap<String, Value> {
        self.inner.store.read().active_flags(context)
    }

    /// Current snapshot of flag definitions
    pub fn config(&self) -> Arc<ConfigSnapshot> {
        self.inner.store.read()
    }

    /// Replace the flag definitions
    ///
    /// The next successful fetch replaces them again.
    pub fn set_config(&self, snapshot: ConfigSnapshot) {
        self.inner.store.replace(snapshot);
    }

    pub fn reporting(&self) -> &Reporting {
        &self.inner.reporting
    }

    /// Stop polling and send the remaining usage
    ///
    /// Evaluation keeps working on the last snapshot after close.
    pub async fn close(&self) {
        self.inner.poller.close().await;
        self.inner.reporting.close().await;
        debug!(target: TARGET_CLIENT, "Local client closed");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.poller.is_closed()
    }

    /// Run `f` with the client, then close it
    ///
    /// The client is closed whatever `f` returns, so a closure returning an
    /// error still flushes the remaining usage.
    pub async fn scoped<F, Fut, T>(self, f: F) -> T
    where
        F: FnOnce(LocalClient) -> Fut,
        Fut: Future<Output = T>,
    {
        let output = f(self.clone()).await;
        self.close().await;
        output
    }
}
