//! CLI settings

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use unireq::AdapterKind;

const DEFAULT_CONFIG_DIR: &str = ".unireq";
const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Transport backend used to dispatch requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// reqwest
    #[default]
    Reqwest,
    /// bitreq
    Bitreq,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reqwest" => Ok(Backend::Reqwest),
            "bitreq" => Ok(Backend::Bitreq),
            _ => Err(format!("Unknown backend: {}", s)),
        }
    }
}

/// Settings layered from defaults, the config file, the environment and flags
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Prefix for relative request paths
    pub base_url: Option<String>,
    pub token: Option<String>,
    #[serde(default)]
    pub adapter: AdapterKind,
    #[serde(default)]
    pub backend: Backend,
    pub timeout_secs: Option<u64>,
    pub proxy: Option<String>,
    #[serde(default)]
    pub accept_invalid_certs: bool,
    /// Headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("adapter", &self.adapter)
            .field("backend", &self.backend)
            .field("timeout_secs", &self.timeout_secs)
            .field("proxy", &self.proxy)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("headers", &self.headers)
            .finish()
    }
}

impl Settings {
    /// Defaults overlaid with the config file
    ///
    /// An explicit `config_file_name` must exist; the default `~/.unireq/config.toml` is
    /// optional.
    pub fn new<P>(config_file_name: Option<P>) -> Result<Self, ConfigError>
    where
        P: Into<PathBuf>,
    {
        let default_settings = Self::default();

        let (path, required) = match config_file_name {
            Some(value) => (value.into(), true),
            None => {
                let default_config_file_name = home::home_dir()
                    .ok_or(ConfigError::NotFound("Config Path".to_string()))?
                    .join(DEFAULT_CONFIG_DIR)
                    .join(DEFAULT_CONFIG_FILE);
                (default_config_file_name, false)
            }
        };

        tracing::debug!("Loading config from {}", path.display());

        let config = Config::builder()
            // use defaults
            .add_source(Config::try_from(&default_settings)?)
            // override with file contents
            .add_source(File::from(path).required(required))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("unireq-{}-{}.toml", name, std::process::id()));
        fs::write(&path, contents).expect("write config");
        path
    }

    #[test]
    fn test_settings_from_file() {
        let path = write_config(
            "settings",
            r#"
base_url = "https://api.example.com"
token = "secret"
adapter = "axios"
backend = "bitreq"
timeout_secs = 5

[headers]
x-client = "unireq"
"#,
        );

        let settings = Settings::new(Some(&path)).expect("settings load");
        fs::remove_file(&path).expect("cleanup");

        assert_eq!(settings.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(settings.token.as_deref(), Some("secret"));
        assert_eq!(settings.adapter, AdapterKind::Axios);
        assert_eq!(settings.backend, Backend::Bitreq);
        assert_eq!(settings.timeout_secs, Some(5));
        assert!(!settings.accept_invalid_certs);
        assert_eq!(settings.headers.get("x-client").map(String::as_str), Some("unireq"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let path = write_config("partial", "timeout_secs = 30\n");

        let settings = Settings::new(Some(&path)).expect("settings load");
        fs::remove_file(&path).expect("cleanup");

        assert_eq!(settings.adapter, AdapterKind::Fetch);
        assert_eq!(settings.backend, Backend::Reqwest);
        assert_eq!(settings.timeout_secs, Some(30));
        assert!(settings.headers.is_empty());
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let path = std::env::temp_dir().join("unireq-does-not-exist.toml");
        assert!(Settings::new(Some(path)).is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let settings = Settings {
            token: Some("secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", settings);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("BITREQ".parse::<Backend>(), Ok(Backend::Bitreq));
        assert!("curl".parse::<Backend>().is_err());
    }
}
