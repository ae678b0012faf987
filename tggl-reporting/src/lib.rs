//! Usage reporting for the Tggl SDK
//!
//! Counts flag evaluation outcomes and observed context values, then sends
//! them to the Tggl API in periodic batches.
//!
//! ## Features
//!
//! - **Deduplication**: identical outcomes are sent once with a count
//! - **Property windows**: first and last time each context property was seen
//! - **Observed values**: string property values with an optional label
//! - **Pagination**: observed values are split into pages of 2000
//! - **Best effort**: delivery failures are logged and dropped
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tggl_reporting::{FlagUsage, Reporting, ReportingConfig};
//! use tggl_flags::{EvaluationContext, Value};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let reporting = Reporting::new(
//!     ReportingConfig::builder().api_key("server-key").app("checkout").build(),
//! )?;
//! reporting.start();
//!
//! reporting.report_flag("beta", FlagUsage::new(true, "on", Value::Null));
//! reporting.report_context(&EvaluationContext::new().with_user_id("u1"));
//!
//! // Stop the timer and send what is left
//! reporting.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │          report_flag / report_context (any thread)           │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     UsageCollector                           │
//! │  ┌──────────┐ ┌──────────────┐ ┌──────────────┐             │
//! │  │  Flag    │ │  Property    │ │  Observed    │             │
//! │  │ Counters │ │  Windows     │ │  Values      │             │
//! │  └──────────┘ └──────────────┘ └──────────────┘             │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │ drain (timer or close)
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                ReportSink (POST /report)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod collector;
mod config;
mod error;
mod payload;
mod sink;

pub use collector::*;
pub use config::*;
pub use error::*;
pub use payload::*;
pub use sink::*;

use parking_lot::Mutex;
use std::sync::Arc;
use tggl_flags::Context;
use tggl_log::{TARGET_REPORTING, debug, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Main reporting instance
///
/// Cheap to clone; clones share the same collector and timer.
#[derive(Clone)]
pub struct Reporting {
    inner: Arc<ReportingInner>,
}

struct ReportingInner {
    config: ReportingConfig,
    client_id: String,
    collector: UsageCollector,
    sink: Arc<dyn ReportSink>,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Reporting {
    /// Create a reporting instance posting to the Tggl API
    pub fn new(config: ReportingConfig) -> Result<Self> {
        let sink = HttpReportSink::new(&config)?;
        Ok(Self::with_sink(config, Arc::new(sink)))
    }

    /// Create a reporting instance with a custom destination
    pub fn with_sink(config: ReportingConfig, sink: Arc<dyn ReportSink>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(ReportingInner {
                client_id: config.client_id(),
                config,
                collector: UsageCollector::new(),
                sink,
                shutdown,
                task: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &ReportingConfig {
        &self.inner.config
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.config.enabled
    }

    /// Identity flag usage is counted under
    pub fn client_id(&self) -> &str {
        &self.inner.client_id
    }

    /// Count one evaluation of `slug` under this instance's client id
    pub fn report_flag(&self, slug: &str, usage: FlagUsage) {
        if self.is_enabled() {
            self.inner
                .collector
                .record_flag(&self.inner.client_id, slug, usage);
        }
    }

    /// Record the properties of an evaluated context
    pub fn report_context<C: Context + ?Sized>(&self, context: &C) {
        if self.is_enabled() {
            self.inner.collector.record_context(context);
        }
    }

    /// Direct access to the collector
    pub fn collector(&self) -> &UsageCollector {
        &self.inner.collector
    }

    /// Send everything recorded so far
    ///
    /// The main page goes first, overflow pages of observed values follow.
    /// Failures are logged and dropped. Nothing is sent when nothing was
    /// recorded.
    pub async fn flush(&self) {
        let config = &self.inner.config;
        let pages = self
            .inner
            .collector
            .drain(config.page_size, config.max_value_length);

        if pages.is_empty() {
            return;
        }

        debug!(target: TARGET_REPORTING, "Sending {} report page(s)", pages.len());

        for page in &pages {
            if let Err(e) = self.inner.sink.send(page).await {
                warn!(target: TARGET_REPORTING, "Failed to send usage report: {}", e);
            }
        }
    }

    /// Start the flush timer
    ///
    /// Must be called from within a tokio runtime. Does nothing when
    /// reporting is disabled, already started, or closed.
    pub fn start(&self) {
        if !self.is_enabled() || *self.inner.shutdown.borrow() {
            return;
        }

        let mut task = self.inner.task.lock();
        if task.is_some() {
            return;
        }

        let reporting = self.clone();
        let mut shutdown = self.inner.shutdown.subscribe();
        let period = self.inner.config.report_interval.max(MIN_REPORT_INTERVAL);

        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => reporting.flush().await,
                }
            }

            debug!(target: TARGET_REPORTING, "Report timer stopped");
        }));

        debug!(
            target: TARGET_REPORTING,
            "Report timer started for '{}' every {:?}", self.inner.client_id, period
        );
    }

    /// Stop the timer and send a final report
    ///
    /// A flush already in progress completes before the final one runs.
    pub async fn close(&self) {
        self.inner.shutdown.send_replace(true);

        let task = self.inner.task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }

        self.flush().await;
    }

    pub fn is_closed(&self) -> bool {
        *self.inner.shutdown.borrow()
    }
}
