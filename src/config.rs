use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;

use crate::error::ConfigError;

fn default_timeout_seconds() -> u64 {
    60
}

fn default_chunk_size() -> usize {
    1024 * 1024
}

fn default_verify_ssl() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the content server API
    pub server_url: String,

    /// API key sent with every request (optional)
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Verify TLS certificates when talking to the server
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,

    /// Upload chunk size in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "https://localhost:8443/api/".to_string(),
            api_key: None,
            timeout_seconds: 60,
            verify_ssl: true,
            chunk_size: 1024 * 1024,
        }
    }
}

impl Config {
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        // Try to load .env file if it exists (for development setups)
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        // An explicitly named file must exist; the default location is
        // optional and falls back to defaults.
        let config_file = if let Some(path) = config_path {
            let path = PathBuf::from(path);
            if !path.exists() {
                return Err(ConfigError::FileNotFound { path });
            }
            path
        } else {
            Self::default_config_path()?
        };

        if config_file.exists() {
            let content = fs::read_to_string(&config_file).map_err(|source| ConfigError::Io {
                path: config_file.clone(),
                source,
            })?;
            config = toml::from_str(&content)?;
        }

        // Environment variables take priority over the file
        config.load_from_env()?;

        Ok(config)
    }

    /// Apply configuration overrides from environment variables. Unset
    /// variables are skipped; set-but-unparseable values are an error.
    fn load_from_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(server_url) = env::var("ISOREPO_SERVER_URL") {
            self.server_url = server_url;
        }

        if let Ok(api_key) = env::var("ISOREPO_API_KEY") {
            let trimmed = api_key.trim().to_string();
            if !trimmed.is_empty() {
                self.api_key = Some(trimmed);
            } else {
                self.api_key = None;
            }
        }

        if let Ok(timeout) = env::var("ISOREPO_TIMEOUT_SECONDS") {
            self.timeout_seconds =
                timeout.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                    field: "ISOREPO_TIMEOUT_SECONDS".to_string(),
                    value: timeout,
                })?;
        }

        if let Ok(verify) = env::var("ISOREPO_VERIFY_SSL") {
            self.verify_ssl = verify.parse::<bool>().map_err(|_| ConfigError::InvalidValue {
                field: "ISOREPO_VERIFY_SSL".to_string(),
                value: verify,
            })?;
        }

        if let Ok(chunk) = env::var("ISOREPO_CHUNK_SIZE") {
            self.chunk_size = chunk.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                field: "ISOREPO_CHUNK_SIZE".to_string(),
                value: chunk,
            })?;
        }

        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    fn default_config_path() -> Result<PathBuf, ConfigError> {
        let project_dirs =
            ProjectDirs::from("net", "musicdock", "isorepo-cli").ok_or(ConfigError::NoConfigDir)?;

        Ok(project_dirs.config_dir().join("config.toml"))
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Self::default_config_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Clears the ISOREPO_* variables for the duration of a test so file and
    /// default values are observable.
    struct CleanEnv;

    impl CleanEnv {
        const VARS: [&'static str; 5] = [
            "ISOREPO_SERVER_URL",
            "ISOREPO_API_KEY",
            "ISOREPO_TIMEOUT_SECONDS",
            "ISOREPO_VERIFY_SSL",
            "ISOREPO_CHUNK_SIZE",
        ];

        fn new() -> Self {
            for var in Self::VARS {
                env::remove_var(var);
            }
            CleanEnv
        }
    }

    impl Drop for CleanEnv {
        fn drop(&mut self) {
            for var in Self::VARS {
                env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.timeout_seconds, 60);
        assert!(config.verify_ssl);
        assert!(config.api_key.is_none());
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let _env = CleanEnv::new();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "server_url = \"https://content.example.com/api/\"\napi_key = \"secret\"\n",
        )
        .expect("write config");

        let config = Config::load(path.to_str()).expect("load config");
        assert_eq!(config.server_url, "https://content.example.com/api/");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        // Unset fields fall back to serde defaults
        assert_eq!(config.timeout_seconds, 60);
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let _env = CleanEnv::new();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "server_url = \"https://from-file.example.com/api/\"\ntimeout_seconds = 30\n",
        )
        .expect("write config");

        env::set_var("ISOREPO_SERVER_URL", "https://from-env.example.com/api/");
        env::set_var("ISOREPO_TIMEOUT_SECONDS", "120");

        let config = Config::load(path.to_str()).expect("load config");
        assert_eq!(config.server_url, "https://from-env.example.com/api/");
        assert_eq!(config.timeout_seconds, 120);
    }

    #[test]
    #[serial]
    fn test_unparseable_env_value_is_invalid() {
        let _env = CleanEnv::new();
        env::set_var("ISOREPO_TIMEOUT_SECONDS", "soon");

        let mut config = Config::default();
        let err = config.load_from_env().expect_err("bad timeout value");
        match err {
            ConfigError::InvalidValue { field, value } => {
                assert_eq!(field, "ISOREPO_TIMEOUT_SECONDS");
                assert_eq!(value, "soon");
            }
            other => panic!("expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_explicit_missing_file_is_an_error() {
        let _env = CleanEnv::new();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nope.toml");

        let err = Config::load(path.to_str()).expect_err("missing explicit file");
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    #[serial]
    fn test_malformed_file_is_invalid_format() {
        let _env = CleanEnv::new();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "server_url = [not toml").expect("write config");

        let err = Config::load(path.to_str()).expect_err("malformed file");
        assert!(matches!(err, ConfigError::InvalidFormat(_)));
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.server_url = "https://other.example.com/api/".to_string();
        config.save(&path).expect("save config");

        let loaded: Config =
            toml::from_str(&fs::read_to_string(&path).expect("read")).expect("parse");
        assert_eq!(loaded.server_url, config.server_url);
    }
}
