//! Preference model and on-disk persistence
//!
//! Preferences live as pretty-printed JSON in `~/.tortray/config.json`.
//! Missing fields fall back to defaults so configs written by older
//! versions keep loading; unknown fields are ignored for the same reason.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants;

/// Which circumvention transport the generated torrc requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BridgeMode {
    /// Direct connection, no bridges
    None,
    /// obfs4 bridges supplied by the user via `obfs4_bridges`
    Obfs4,
    /// Built-in snowflake bridge (broker behind CDN fronts)
    #[default]
    Snowflake,
    /// Built-in meek bridge (Azure domain front)
    MeekAzure,
}

impl BridgeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BridgeMode::None => "none",
            BridgeMode::Obfs4 => "obfs4",
            BridgeMode::Snowflake => "snowflake",
            BridgeMode::MeekAzure => "meek-azure",
        }
    }
}

impl fmt::Display for BridgeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown bridge mode `{0}` (expected none, obfs4, snowflake, or meek-azure)")]
pub struct UnknownBridgeMode(String);

impl FromStr for BridgeMode {
    type Err = UnknownBridgeMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Tolerate menu-style labels like "Meek-Azure"
        let normalized = s.trim().to_ascii_lowercase().replace(' ', "");
        match normalized.as_str() {
            "none" => Ok(BridgeMode::None),
            "obfs4" => Ok(BridgeMode::Obfs4),
            "snowflake" => Ok(BridgeMode::Snowflake),
            "meek-azure" | "meekazure" => Ok(BridgeMode::MeekAzure),
            _ => Err(UnknownBridgeMode(s.to_string())),
        }
    }
}

/// Persisted tortray preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrayConfig {
    /// Connect immediately when a `run` session starts
    pub run_on_launch: bool,
    /// Selected bridge mode
    pub bridge: BridgeMode,
    /// Tor binary path, or a bare name resolved via PATH
    pub tor_path: String,
    /// Local SOCKS5 listener port
    pub socks_port: u16,
    /// Control listener port
    pub control_port: u16,
    /// Pluggable-transport client search lists, keyed by binary name,
    /// each value a colon-separated candidate list
    pub pt_paths: HashMap<String, String>,
    /// obfs4 bridge lines; `#` comments and blank lines are ignored
    pub obfs4_bridges: Vec<String>,
}

impl Default for TrayConfig {
    fn default() -> Self {
        TrayConfig {
            run_on_launch: false,
            bridge: BridgeMode::Snowflake,
            tor_path: constants::DEFAULT_TOR_PATH.to_string(),
            socks_port: constants::DEFAULT_SOCKS_PORT,
            control_port: constants::DEFAULT_CONTROL_PORT,
            pt_paths: HashMap::from([
                (
                    constants::OBFS4_CLIENT.to_string(),
                    constants::DEFAULT_OBFS4_PATHS.to_string(),
                ),
                (
                    constants::SNOWFLAKE_CLIENT.to_string(),
                    constants::DEFAULT_SNOWFLAKE_PATHS.to_string(),
                ),
                (
                    constants::MEEK_CLIENT.to_string(),
                    constants::DEFAULT_MEEK_PATHS.to_string(),
                ),
            ]),
            obfs4_bridges: vec![
                "# Paste your obfs4 Bridge lines here".to_string(),
                "# Example format:".to_string(),
                "# obfs4 IP:PORT FINGERPRINT cert=CERT iat-mode=0".to_string(),
            ],
        }
    }
}

/// Loads and saves [`TrayConfig`] under a base directory
/// (default `~/.tortray/`, overridable for tests and side-by-side profiles)
#[derive(Debug, Clone)]
pub struct ConfigStore {
    base: PathBuf,
}

impl ConfigStore {
    pub fn new(base: PathBuf) -> Self {
        ConfigStore { base }
    }

    /// Default base directory: `~/.tortray`
    pub fn default_base() -> Result<PathBuf> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        Ok(home.join(constants::CONFIG_DIR_NAME))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn config_path(&self) -> PathBuf {
        self.base.join(constants::CONFIG_FILE_NAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.base.join(constants::LOG_FILE_NAME)
    }

    /// Load preferences, creating the directory and a default config file on
    /// first use. A file that fails to parse is left untouched and defaults
    /// are returned instead.
    pub fn load(&self) -> Result<TrayConfig> {
        self.ensure_base_dir()?;
        let path = self.config_path();
        if !path.exists() {
            let cfg = TrayConfig::default();
            self.save(&cfg)?;
            return Ok(cfg);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        match serde_json::from_str(&contents) {
            Ok(cfg) => Ok(cfg),
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "config unreadable, using defaults");
                Ok(TrayConfig::default())
            }
        }
    }

    /// Persist preferences as pretty-printed JSON
    pub fn save(&self, cfg: &TrayConfig) -> Result<()> {
        self.ensure_base_dir()?;
        let path = self.config_path();
        let json = serde_json::to_string_pretty(cfg).context("failed to serialize config")?;
        fs::write(&path, json + "\n")
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    fn ensure_base_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.base)
            .with_context(|| format!("failed to create {}", self.base.display()))
    }
}
