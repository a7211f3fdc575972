// src/settings.rs

use std::{net::SocketAddr, path::Path, time::Duration};

use clap::Parser;
use config::{builder::DefaultState, ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};

use crate::cache::CachePolicy;

const DEFAULT_ADDR: &str = "127.0.0.1:8000";
const DEFAULT_SIGNER_URL: &str = "http://127.0.0.1:3000/api/signed-url";

#[derive(Parser, Debug)]
#[command(version)]
pub struct Args {
    /// Path to the local configuration TOML file.
    #[arg(short, value_name = "CONFIG_PATH")]
    pub config: std::path::PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Web {
    #[serde(deserialize_with = "deserialize_socket_addr")]
    pub address: SocketAddr,
}

/// Where analysis datasets are fetched from.
#[derive(Debug, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Endpoint that answers `?path=<dataset path>` with a signed URL.
    pub signer_url: String,
    /// Bearer token for the signer, if it requires one.
    pub api_key: Option<String>,
    /// Upper bound for each outbound request.
    pub timeout_secs: u64,
}

impl StoreSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CacheSettings {
    pub ttl_secs: u64,
    pub max_entries: usize,
    pub evict_batch: usize,
}

impl CacheSettings {
    pub fn policy(&self) -> CachePolicy {
        CachePolicy {
            ttl: Duration::from_secs(self.ttl_secs),
            max_entries: self.max_entries,
            evict_batch: self.evict_batch,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Settings {
    pub web: Web,
    pub store: StoreSettings,
    pub cache: CacheSettings,
}

impl Settings {
    /// Load settings from the given TOML file, with sane defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let builder = ConfigBuilder::<DefaultState>::default()
            .set_default("web.address", DEFAULT_ADDR)?
            .set_default("store.signer_url", DEFAULT_SIGNER_URL)?
            .set_default("store.timeout_secs", 30)?
            .set_default("cache.ttl_secs", 300)?
            .set_default("cache.max_entries", 50)?
            .set_default("cache.evict_batch", 10)?;

        let cfg = builder.add_source(File::from(path)).build()?;

        cfg.try_deserialize()
    }
}

fn deserialize_socket_addr<'de, D>(deserializer: D) -> Result<SocketAddr, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}
