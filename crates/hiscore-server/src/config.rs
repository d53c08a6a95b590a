use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use hiscore_board::LeaderboardConfig;
use hiscore_store::SyncMode;

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub data_path: PathBuf,
    pub sync_mode: SyncMode,
    pub leaderboard: LeaderboardConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            data_path: PathBuf::from("data/scores.journal"),
            sync_mode: SyncMode::EveryWrite,
            leaderboard: LeaderboardConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load a TOML config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Apply the `PORT` environment variable, if set.
    pub fn with_env_overrides(self) -> Self {
        self.with_port_override(std::env::var("PORT").ok().as_deref())
    }

    /// Replace the bind port with `port` when it parses; keep the configured
    /// one otherwise.
    pub fn with_port_override(mut self, port: Option<&str>) -> Self {
        if let Some(raw) = port {
            match raw.trim().parse::<u16>() {
                Ok(port) => self.bind_addr.set_port(port),
                Err(e) => warn!(value = raw, error = %e, "ignoring invalid PORT"),
            }
        }
        self
    }
}
