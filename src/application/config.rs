use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use clap::{Parser, Subcommand};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "argus",
    version,
    about = "Argus Core (camera-event monitoring client runtime)"
)]
pub struct Args {
    #[arg(long, env = "ARGUS_SERVER_URL")]
    pub server_url: Option<String>,

    #[arg(long, env = "ARGUS_CONFIG_PATH", default_value = "./.argus-core/config.toml")]
    pub config_path: PathBuf,

    #[arg(long, env = "ARGUS_DB_PATH", default_value = "./.argus-core/argus.db")]
    pub db_path: PathBuf,

    #[arg(long, env = "ARGUS_DEVICE_NAME")]
    pub device_name: Option<String>,

    #[arg(long, env = "ARGUS_HTTP_TIMEOUT_MS", default_value_t = 15_000)]
    pub http_timeout_ms: u64,

    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_filter: String,

    #[arg(long, env = "ARGUS_JSON_LOGS", default_value_t = false)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Pair this device with a server using the 6-digit code it displays.
    Pair { code: String },
    /// Show whether this device holds a valid session.
    Status,
    /// List the cameras known to the server.
    Cameras,
    /// Page through the event feed.
    Events {
        /// Restrict the feed to one camera.
        #[arg(long)]
        camera: Option<Uuid>,
        /// How many pages to fetch before stopping.
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
    /// Show a single event, optionally saving its thumbnail.
    Event {
        id: Uuid,
        /// Write the event thumbnail to this path.
        #[arg(long)]
        thumbnail: Option<PathBuf>,
    },
    /// Trade the refresh token for a fresh session.
    Refresh,
    /// Forget the stored session.
    SignOut,
}

/// Optional on-disk overlay for settings that rarely change. Flags and
/// environment variables win over the file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub server_url: Option<String>,
    pub device_name: Option<String>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, String> {
        match std::fs::read_to_string(path) {
            Ok(text) => toml::from_str(&text)
                .map_err(|error| format!("invalid config file {}: {error}", path.display())),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(format!(
                "failed to read config file {}: {error}",
                path.display()
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub server_url: String,
    pub db_path: PathBuf,
    pub device_name: String,
    pub device_model: String,
    pub http_timeout: Duration,
    pub log_filter: String,
    pub json_logs: bool,
}

impl RuntimeConfig {
    pub fn from_args(args: &Args) -> Result<Self, String> {
        let file = ConfigFile::load(&args.config_path)?;

        let server_url = normalize(args.server_url.clone())
            .or_else(|| normalize(file.server_url))
            .ok_or_else(|| {
                "server URL is not set; pass --server-url or add it to the config file".to_owned()
            })?;
        let device_name = normalize(args.device_name.clone())
            .or_else(|| normalize(file.device_name))
            .unwrap_or_else(|| "Argus CLI".to_owned());

        if args.http_timeout_ms == 0 {
            return Err("http_timeout_ms must be greater than 0".to_owned());
        }

        Ok(Self {
            server_url,
            db_path: args.db_path.clone(),
            device_name,
            device_model: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
            http_timeout: Duration::from_millis(args.http_timeout_ms),
            log_filter: args.log_filter.clone(),
            json_logs: args.json_logs,
        })
    }

    #[must_use]
    pub fn for_test(server_url: impl Into<String>, db_path: PathBuf) -> Self {
        Self {
            server_url: server_url.into(),
            db_path,
            device_name: "Argus Test".to_owned(),
            device_model: "test".to_owned(),
            http_timeout: Duration::from_millis(3_000),
            log_filter: "warn".to_owned(),
            json_logs: false,
        }
    }
}

fn normalize(input: Option<String>) -> Option<String> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    })
}
