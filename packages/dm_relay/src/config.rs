use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

// =============================================================================
// Unified config (figment-deserialized from defaults / config.toml / env vars)
// =============================================================================
//
// Three equivalent ways to configure:
//
//   config.toml:     [server]
//                    port = 5000
//
//   env var:         DM_RELAY_SERVER__PORT=5000   (double underscore = nesting)
//
//   (single underscore stays within field names: DM_RELAY_SERVER__SEND_CHANNEL_CAPACITY)

/// Named configuration presets.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// host=127.0.0.1
    Local,
    /// host=0.0.0.0
    Server,
}

/// Top-level tunable configuration, deserialized by figment.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// Server tuning knobs (lives under `[server]` in config.toml).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerFileConfig {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    /// Per-session outbox depth. A full outbox drops live deliveries to that session.
    #[serde(default = "default_send_channel_capacity")]
    pub send_channel_capacity: usize,
    /// Presence broadcast depth. Lagging sessions skip straight to the newest snapshot.
    #[serde(default = "default_presence_channel_capacity")]
    pub presence_channel_capacity: usize,
    /// Allowed browser origins. Empty means permissive.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerFileConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            send_channel_capacity: default_send_channel_capacity(),
            presence_channel_capacity: default_presence_channel_capacity(),
            cors_origins: Vec::new(),
        }
    }
}

fn default_send_channel_capacity() -> usize {
    100
}
fn default_presence_channel_capacity() -> usize {
    64
}

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

/// Build a figment that layers: defaults → profile defaults → config.toml → DM_RELAY_* env vars.
///
/// The CLI profile takes priority over the config file profile.
pub fn load_config(data_dir: &Path, cli_profile: Option<&Profile>) -> figment::Figment {
    use figment::{
        Figment,
        providers::{Env, Format, Serialized, Toml},
    };

    // Pass 1: peek at profile from config.toml/env (CLI overrides file)
    let base = Figment::from(Serialized::defaults(FileConfig::default()))
        .merge(Toml::file(data_dir.join("config.toml")))
        .merge(Env::prefixed("DM_RELAY_").split("__"));

    let profile: Option<Profile> = cli_profile
        .cloned()
        .or_else(|| base.extract_inner("profile").ok());

    // Pass 2: rebuild with profile defaults as a layer between defaults and config.toml
    let profile_layer = profile_to_file_config(profile.as_ref());

    Figment::from(Serialized::defaults(FileConfig::default()))
        .merge(Serialized::defaults(profile_layer))
        .merge(Toml::file(data_dir.join("config.toml")))
        .merge(Env::prefixed("DM_RELAY_").split("__"))
}

fn profile_to_file_config(profile: Option<&Profile>) -> FileConfig {
    match profile {
        Some(Profile::Local) => FileConfig {
            profile: Some(Profile::Local),
            server: ServerFileConfig {
                host: Some("127.0.0.1".to_string()),
                ..Default::default()
            },
        },
        Some(Profile::Server) => FileConfig {
            profile: Some(Profile::Server),
            server: ServerFileConfig {
                host: Some("0.0.0.0".to_string()),
                ..Default::default()
            },
        },
        None => FileConfig::default(),
    }
}

// =============================================================================
// Runtime config (derived from FileConfig, used throughout the server)
// =============================================================================

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub websocket: WebSocketConfig,
    pub cors_origins: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct WebSocketConfig {
    /// Channel capacity for messages to one client
    pub send_channel_capacity: usize,
    /// Broadcast channel capacity for presence snapshots
    pub presence_channel_capacity: usize,
}

impl ServerConfig {
    pub fn from_file(fc: &ServerFileConfig) -> Self {
        Self {
            host: fc.host.clone().unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: fc.port.unwrap_or(DEFAULT_PORT),
            websocket: WebSocketConfig {
                send_channel_capacity: fc.send_channel_capacity.max(1),
                presence_channel_capacity: fc.presence_channel_capacity.max(1),
            },
            cors_origins: fc.cors_origins.clone(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_file(&ServerFileConfig::default())
    }
}

// =============================================================================
// Directory layout config (not tunable via figment, derived from --data-dir)
// =============================================================================

#[derive(Clone, Debug)]
pub struct RelayDirs {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
}

impl RelayDirs {
    pub fn new(custom_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match custom_dir {
            Some(dir) => dir,
            None => dirs::home_dir()
                .context("Could not find home directory")?
                .join(".dm_relay"),
        };

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;

        let db_path = data_dir.join("relay.db");
        info!("Data directory: {}", data_dir.display());

        Ok(Self { data_dir, db_path })
    }

    pub fn db_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.db_path.display())
    }
}
