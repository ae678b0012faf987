//! Where flag definitions come from

use crate::{ClientConfig, Result};
use async_trait::async_trait;
use tggl_flags::{Flag, decode_flags};
use tggl_http_client::HttpClient;

/// Source of flag definitions polled by the [`Poller`](crate::Poller)
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Fetch the complete list of flag definitions.
    async fn fetch(&self) -> Result<Vec<Flag>>;
}

/// Fetches flag definitions from the Tggl API with `GET /config`
pub struct HttpConfigSource {
    client: HttpClient,
    url: String,
}

impl HttpConfigSource {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new(config.http_config())?,
            url: config.config_url(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ConfigSource for HttpConfigSource {
    async fn fetch(&self) -> Result<Vec<Flag>> {
        let response = self
            .client
            .get(self.url.as_str())
            .send()
            .await?
            .error_for_status()?;

        // Unknown operators surface as definition errors
        Ok(decode_flags(response.bytes())?)
    }
}

/// Serves a fixed list of flags
pub struct StaticConfigSource {
    flags: Vec<Flag>,
}

impl StaticConfigSource {
    pub fn new(flags: impl IntoIterator<Item = Flag>) -> Self {
        Self {
            flags: flags.into_iter().collect(),
        }
    }
}

#[async_trait]
impl ConfigSource for StaticConfigSource {
    async fn fetch(&self) -> Result<Vec<Flag>> {
        Ok(self.flags.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tggl_flags::Variation;

    #[test]
    fn test_http_source_url() {
        let config = ClientConfig::builder().base_url("http://localhost:3000").build();
        let source = HttpConfigSource::new(&config).unwrap();
        assert_eq!(source.url(), "http://localhost:3000/config");
    }

    #[tokio::test]
    async fn test_static_source() {
        let source = StaticConfigSource::new([Flag::new("a", Variation::active(1))]);
        let flags = source.fetch().await.unwrap();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].slug, "a");
    }
}
