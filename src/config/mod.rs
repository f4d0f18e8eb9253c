//! Configuration module for the activity backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Base URL of the classification service
    pub classifier_url: String,
    /// Optional directory of bundled sample dataset JSON files
    pub sample_dir: Option<PathBuf>,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_path = env::var("ACTIVITY_DB_PATH")
            .unwrap_or_else(|_| "./data/activity.sqlite".to_string())
            .into();

        let classifier_url = env::var("ACTIVITY_CLASSIFIER_URL")
            .unwrap_or_else(|_| "http://localhost:8000/classify".to_string());

        let sample_dir = env::var("ACTIVITY_SAMPLE_DIR").ok().map(PathBuf::from);

        let bind_addr = env::var("ACTIVITY_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid ACTIVITY_BIND_ADDR format");

        let log_level = env::var("ACTIVITY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            db_path,
            classifier_url,
            sample_dir,
            bind_addr,
            log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("ACTIVITY_DB_PATH");
        env::remove_var("ACTIVITY_CLASSIFIER_URL");
        env::remove_var("ACTIVITY_SAMPLE_DIR");
        env::remove_var("ACTIVITY_BIND_ADDR");
        env::remove_var("ACTIVITY_LOG_LEVEL");

        let config = Config::from_env();

        assert_eq!(config.db_path, PathBuf::from("./data/activity.sqlite"));
        assert_eq!(config.classifier_url, "http://localhost:8000/classify");
        assert!(config.sample_dir.is_none());
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
    }
}
