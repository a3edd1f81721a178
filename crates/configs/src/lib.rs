//! # configs
//!
//! Layered settings for the Rusty-Board binary. Later layers win:
//! built-in defaults, `rusty-board.toml` (optional), then environment
//! variables such as `RUSTY_BOARD__SERVER__PORT=9000`. A `.env` file in the
//! working directory is loaded into the environment first.

use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use config::builder::DefaultState;
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "RUSTY_BOARD";
pub const CONFIG_FILE: &str = "rusty-board";

#[derive(Error, Debug)]
pub enum ConfigsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub media: MediaSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Shown in the page header and the browser tab
    pub board_title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// e.g. "sqlite:rusty_board.db" or "sqlite::memory:"
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    /// Root directory for all uploads
    pub upload_dir: String,
    /// Public URL prefix the upload dir is served under
    pub url_prefix: String,
    pub max_upload_bytes: usize,
    /// Longest edge of generated thumbnails, in pixels
    pub thumbnail_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Settings {
    /// Loads `.env`, the optional config file and the environment.
    pub fn load() -> Result<Self, ConfigsError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env"),
        }

        let settings = defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Builds settings from defaults overlaid with a TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigsError> {
        let settings = defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("server.board_title", "Rusty-Board")?
        .set_default("database.url", "sqlite:rusty_board.db")?
        .set_default("database.max_connections", 5)?
        .set_default("media.upload_dir", "./data/uploads")?
        .set_default("media.url_prefix", "/static/uploads")?
        .set_default("media.max_upload_bytes", 4 * 1024 * 1024)?
        .set_default("media.thumbnail_size", 250)?
        .set_default("log.filter", "info")?
        .set_default("log.json", false)
}
