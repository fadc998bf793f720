use std::env;

use serde::{Deserialize, Serialize};

use crate::env_or;

pub const DEFAULT_RELEASE_URL: &str =
    "https://api.github.com/repos/scriptin/jmdict-simplified/releases/latest";

/// Where the dataset comes from and how it is fetched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Release metadata endpoint returning the asset list
    pub release_url: String,
    /// Asset name prefix: language + "with examples" variant
    pub asset_prefix: String,
    pub asset_suffix: String,
    pub user_agent: String,
    /// Connect timeout, and the longest wait for the next body chunk
    pub timeout_seconds: u64,
}

impl NetworkConfig {
    pub fn new() -> Self {
        let release_url =
            env::var("JISHO_RELEASE_URL").unwrap_or_else(|_| DEFAULT_RELEASE_URL.to_string());

        let asset_prefix =
            env::var("JISHO_ASSET_PREFIX").unwrap_or_else(|_| "jmdict-examples-eng-".to_string());

        let asset_suffix =
            env::var("JISHO_ASSET_SUFFIX").unwrap_or_else(|_| ".json.tgz".to_string());

        let user_agent = env::var("JISHO_USER_AGENT")
            .unwrap_or_else(|_| concat!("jisho/", env!("CARGO_PKG_VERSION")).to_string());

        let timeout_seconds = env_or("JISHO_TIMEOUT_SECONDS", 30);

        Self {
            release_url,
            asset_prefix,
            asset_suffix,
            user_agent,
            timeout_seconds,
        }
    }

    pub fn matches_asset(&self, name: &str) -> bool {
        name.starts_with(&self.asset_prefix) && name.ends_with(&self.asset_suffix)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::new()
    }
}
