//! Environment variable overrides

use std::env;

use anyhow::{anyhow, Result};

use crate::config::Settings;

pub const ENV_BASE_URL: &str = "UNIREQ_BASE_URL";
pub const ENV_TOKEN: &str = "UNIREQ_TOKEN";
pub const ENV_ADAPTER: &str = "UNIREQ_ADAPTER";
pub const ENV_BACKEND: &str = "UNIREQ_BACKEND";
pub const ENV_TIMEOUT_SECS: &str = "UNIREQ_TIMEOUT_SECS";
pub const ENV_PROXY: &str = "UNIREQ_PROXY";

impl Settings {
    /// Override settings with any `UNIREQ_*` variables that are set
    pub fn from_env(mut self) -> Result<Self> {
        if let Ok(base_url) = env::var(ENV_BASE_URL) {
            self.base_url = Some(base_url);
        }

        if let Ok(token) = env::var(ENV_TOKEN) {
            self.token = Some(token);
        }

        if let Ok(adapter) = env::var(ENV_ADAPTER) {
            self.adapter = adapter.parse().map_err(|e: String| anyhow!(e))?;
        }

        if let Ok(backend) = env::var(ENV_BACKEND) {
            self.backend = backend.parse().map_err(|e: String| anyhow!(e))?;
        }

        if let Ok(timeout_str) = env::var(ENV_TIMEOUT_SECS) {
            let timeout = timeout_str
                .parse()
                .map_err(|_| anyhow!("Invalid {}: {}", ENV_TIMEOUT_SECS, timeout_str))?;
            self.timeout_secs = Some(timeout);
        }

        if let Ok(proxy) = env::var(ENV_PROXY) {
            self.proxy = Some(proxy);
        }

        Ok(self)
    }
}
