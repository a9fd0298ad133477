use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Page sizes offered by every list screen
pub const PAGE_SIZE_OPTIONS: [u32; 4] = [10, 25, 50, 100];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub list: ListConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConfig {
    pub default_page_size: u32,
    pub search_debounce_ms: u64,
    pub fallback_fetch_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub storage_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub debug_requests: bool,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl ListConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("CONSOLE_API_URL") {
            self.api.base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("CONSOLE_REQUEST_TIMEOUT_MS") {
            self.api.request_timeout_ms = v.parse().unwrap_or(self.api.request_timeout_ms);
        }

        // List overrides
        if let Ok(v) = env::var("CONSOLE_DEFAULT_PAGE_SIZE") {
            match v.parse::<u32>() {
                Ok(size) if PAGE_SIZE_OPTIONS.contains(&size) => self.list.default_page_size = size,
                _ => tracing::warn!(
                    "CONSOLE_DEFAULT_PAGE_SIZE={} is not one of {:?}, keeping {}",
                    v, PAGE_SIZE_OPTIONS, self.list.default_page_size
                ),
            }
        }
        if let Ok(v) = env::var("CONSOLE_SEARCH_DEBOUNCE_MS") {
            self.list.search_debounce_ms = v.parse().unwrap_or(self.list.search_debounce_ms);
        }
        if let Ok(v) = env::var("CONSOLE_FALLBACK_FETCH_LIMIT") {
            self.list.fallback_fetch_limit = v.parse().unwrap_or(self.list.fallback_fetch_limit);
        }

        // Session overrides
        if let Ok(v) = env::var("CONSOLE_CONFIG_DIR") {
            self.session.storage_dir = Some(PathBuf::from(v));
        }

        // Logging overrides
        if let Ok(v) = env::var("CONSOLE_DEBUG_REQUESTS") {
            self.logging.debug_requests = v.parse().unwrap_or(self.logging.debug_requests);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: "http://localhost:8000/api/v1".to_string(),
                request_timeout_ms: 10_000,
                user_agent: format!("crm-console/{}", env!("CARGO_PKG_VERSION")),
            },
            list: ListConfig {
                default_page_size: 25,
                search_debounce_ms: 500,
                fallback_fetch_limit: 1000,
            },
            session: SessionConfig { storage_dir: None },
            logging: LoggingConfig { debug_requests: true },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                base_url: "https://staging.example.com/api/v1".to_string(),
                request_timeout_ms: 10_000,
                user_agent: format!("crm-console/{}", env!("CARGO_PKG_VERSION")),
            },
            list: ListConfig {
                default_page_size: 25,
                search_debounce_ms: 500,
                fallback_fetch_limit: 1000,
            },
            session: SessionConfig { storage_dir: None },
            logging: LoggingConfig { debug_requests: false },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: "https://app.example.com/api/v1".to_string(),
                request_timeout_ms: 10_000,
                user_agent: format!("crm-console/{}", env!("CARGO_PKG_VERSION")),
            },
            list: ListConfig {
                default_page_size: 25,
                search_debounce_ms: 500,
                fallback_fetch_limit: 500,
            },
            session: SessionConfig { storage_dir: None },
            logging: LoggingConfig { debug_requests: false },
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self::development()
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<ConsoleConfig> = Lazy::new(ConsoleConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static ConsoleConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = ConsoleConfig::development();
        assert_eq!(config.api.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.list.search_debounce(), Duration::from_millis(500));
        assert!(config.logging.debug_requests);
    }

    #[test]
    fn test_default_page_size_is_an_offered_option() {
        for config in [ConsoleConfig::development(), ConsoleConfig::staging(), ConsoleConfig::production()] {
            assert!(PAGE_SIZE_OPTIONS.contains(&config.list.default_page_size));
        }
    }

    #[test]
    fn test_default_production_config() {
        let config = ConsoleConfig::production();
        assert!(config.api.base_url.starts_with("https://"));
        assert!(!config.logging.debug_requests);
    }
}
