//! # Tggl Clients
//!
//! Feature flag clients for Tggl.
//!
//! - [`LocalClient`] polls the flag definitions and evaluates them in
//!   process. Evaluation never waits on the network.
//! - [`RemoteClient`] sends contexts to the Tggl API and reads back the
//!   active flags.
//!
//! Both clients report flag usage in the background unless reporting is
//! disabled.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tggl_client::{ClientConfig, LocalClient};
//! use tggl_flags::EvaluationContext;
//!
//! #[tokio::main]
//! async fn main() -> tggl_client::Result<()> {
//!     let client = LocalClient::new(ClientConfig::from_env()?)?;
//!     client.ready().await?;
//!
//!     let context = EvaluationContext::new()
//!         .with_user_id("u1")
//!         .with_attribute("plan", "pro");
//!
//!     let theme = client.get(&context, "theme", "light");
//!     println!("theme: {theme}");
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Scoped Use
//!
//! ```rust,no_run
//! use tggl_client::{ClientConfig, LocalClient};
//! use tggl_flags::EvaluationContext;
//!
//! # async fn run() -> tggl_client::Result<()> {
//! let client = LocalClient::new(ClientConfig::with_api_key("server-key"))?;
//!
//! // The client is closed and its usage flushed when the closure returns
//! client
//!     .scoped(|client| async move {
//!         client.ready().await?;
//!         let active = client.is_active(&EvaluationContext::new(), "beta");
//!         Ok::<_, tggl_client::ClientError>(active)
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment
//!
//! [`ClientConfig::from_env`] reads `TGGL_API_KEY`, `TGGL_BASE_URL`,
//! `TGGL_URL`, `TGGL_POLLING_INTERVAL`, `TGGL_REPORTING`, `TGGL_APP` and
//! `TGGL_REPORT_INTERVAL`, after loading `.env` when present.

pub mod config;
pub mod env;
pub mod error;
pub mod local;
pub mod poller;
pub mod remote;
pub mod response;
pub mod source;

pub use config::{ClientConfig, ClientConfigBuilder, MIN_POLLING_INTERVAL};
pub use env::EnvLoader;
pub use error::{ClientError, Result};
pub use local::{LOCAL_CLIENT_NAME, LocalClient};
pub use poller::Poller;
pub use remote::{REMOTE_CLIENT_NAME, RemoteClient};
pub use response::FlagsResponse;
pub use source::{ConfigSource, HttpConfigSource, StaticConfigSource};

/// Prelude for common imports.
///
/// ```
/// use tggl_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::ClientConfig;
    pub use crate::error::{ClientError, Result};
    pub use crate::local::LocalClient;
    pub use crate::remote::RemoteClient;
    pub use crate::response::FlagsResponse;
    pub use crate::source::ConfigSource;
    pub use tggl_flags::{Context, EvaluationContext, SerializedContext, Value, Variation};
}
