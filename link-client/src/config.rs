use std::time::Duration;

use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub struct ClientConfig {
    #[envconfig(from = "LINKS_API_URL", default = "http://localhost:3310")]
    pub api_url: String,

    /// Quiet window before a reorder is persisted.
    #[envconfig(from = "LINKS_DEBOUNCE_MS", default = "500")]
    pub debounce_ms: u64,

    #[envconfig(from = "LINKS_REQUEST_TIMEOUT_MS", default = "5000")]
    pub request_timeout_ms: u64,
}

impl ClientConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn default_for_test() -> Self {
        ClientConfig {
            api_url: "http://localhost:3310".to_string(),
            debounce_ms: 500,
            request_timeout_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::init_from_hashmap(&Default::default()).unwrap();

        assert_eq!(config.api_url, "http://localhost:3310");
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_debounce_override() {
        let env = [("LINKS_DEBOUNCE_MS".to_string(), "600".to_string())]
            .into_iter()
            .collect();

        let config = ClientConfig::init_from_hashmap(&env).unwrap();

        assert_eq!(config.debounce(), Duration::from_millis(600));
    }
}
