// Environment variable loading

use std::collections::HashMap;
use std::env;

/// Prefix of every variable the clients read
pub const ENV_PREFIX: &str = "TGGL";

/// Environment variable loader
///
/// Keeps the variables starting with `{prefix}_` and strips the prefix,
/// lowercasing the rest: `TGGL_API_KEY` becomes `api_key`.
pub struct EnvLoader {
    prefix: String,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load the prefixed variables of the process environment
    pub fn load(&self) -> HashMap<String, String> {
        self.collect(env::vars())
    }

    /// Keep the prefixed variables of an arbitrary set of pairs
    pub fn collect<I, K, V>(&self, vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let prefix = format!("{}_", self.prefix);

        vars.into_iter()
            .filter_map(|(key, value)| {
                key.as_ref()
                    .strip_prefix(&prefix)
                    .map(|name| (name.to_lowercase(), value.into()))
            })
            .collect()
    }

    /// Load a specific environment variable
    pub fn load_var(&self, key: &str) -> Option<String> {
        env::var(format!("{}_{}", self.prefix, key.to_uppercase())).ok()
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(ENV_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // std::env::set_var is unsafe, so these tests work on explicit pairs
    // or on variables that are never set.

    #[test]
    fn test_collect_strips_prefix() {
        let vars = EnvLoader::default().collect([
            ("TGGL_API_KEY", "server-key"),
            ("TGGL_POLLING_INTERVAL", "1000"),
            ("TGGLX_OTHER", "ignored"),
            ("PATH", "/usr/bin"),
        ]);

        assert_eq!(vars.len(), 2);
        assert_eq!(vars["api_key"], "server-key");
        assert_eq!(vars["polling_interval"], "1000");
    }

    #[test]
    fn test_custom_prefix() {
        let vars = EnvLoader::new("FLAGS").collect([("FLAGS_URL", "http://localhost")]);
        assert_eq!(vars["url"], "http://localhost");
    }

    #[test]
    fn test_missing_var() {
        let loader = EnvLoader::new("TGGL_TEST_MISSING");
        assert!(loader.load_var("NONEXISTENT_67890").is_none());
    }
}
