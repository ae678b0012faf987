//! # Tggl HTTP Client
//!
//! A thin JSON transport over `reqwest` used by every component that talks to
//! the Tggl API: the config poller, remote evaluation and usage reporting.
//!
//! ## Features
//!
//! - **API key authentication**: the `x-tggl-api-key` header is attached to every request
//! - **Timeouts**: per-client and per-request timeout configuration
//! - **Typed errors**: API error bodies (`{"error": "..."}`) surface as [`HttpClientError::Response`]
//! - **No redirects**: redirects are not followed unless explicitly enabled
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tggl_http_client::{HttpClient, HttpClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HttpClientConfig::builder()
//!         .base_url("https://api.tggl.io")
//!         .api_key("server-key")
//!         .build();
//!
//!     let client = HttpClient::new(config)?;
//!     let flags: serde_json::Value = client
//!         .get("/config")
//!         .send()
//!         .await?
//!         .error_for_status()?
//!         .json()?;
//!
//!     println!("{flags}");
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod request;
mod response;

pub use client::HttpClient;
pub use config::{API_KEY_HEADER, DEFAULT_BASE_URL, HttpClientConfig, HttpClientConfigBuilder};
pub use error::{HttpClientError, Result};
pub use request::RequestBuilder;
pub use response::Response;
