//! Server configuration
//!
//! All settings are read from environment variables (after loading `.env`). Invalid values are logged and replaced
//! with the default, so the server always starts.
use std::env;

use log::*;
use order_bridge_engine::SessionFileDriver;

const DEFAULT_OBS_HOST: &str = "127.0.0.1";
const DEFAULT_OBS_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/order_bridge.db";
const DEFAULT_MAX_DB_CONNECTIONS: u32 = 5;
const DEFAULT_SESSION_FILE: &str = "partner-session.json";
const DEFAULT_PARTNER_URL: &str = "https://www.zomato.com/partners";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_db_connections: u32,
    pub driver: DriverConfig,
}

/// Settings for the browser automation that logs into the partner portal.
#[derive(Clone, Debug)]
pub struct DriverConfig {
    /// Where the browser session (cookies and local storage) is persisted between logins
    pub session_file: String,
    pub partner_url: String,
    pub headless: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OBS_HOST.to_string(),
            port: DEFAULT_OBS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_db_connections: DEFAULT_MAX_DB_CONNECTIONS,
            driver: DriverConfig::default(),
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { session_file: DEFAULT_SESSION_FILE.to_string(), partner_url: DEFAULT_PARTNER_URL.to_string(), headless: true }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("OBS_HOST").ok().unwrap_or_else(|| DEFAULT_OBS_HOST.into());
        let port = env::var("OBS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for OBS_PORT. {e} Using the default, {DEFAULT_OBS_PORT}, instead."
                    );
                    DEFAULT_OBS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_OBS_PORT);
        let database_url = env::var("OBS_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ OBS_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.into()
        });
        let max_db_connections = env::var("OBS_MAX_DB_CONNECTIONS")
            .ok()
            .and_then(|s| match s.parse::<u32>() {
                Ok(0) => {
                    warn!("🪛️ OBS_MAX_DB_CONNECTIONS must be at least 1. Using {DEFAULT_MAX_DB_CONNECTIONS}.");
                    None
                },
                Ok(n) => Some(n),
                Err(e) => {
                    warn!("🪛️ Ignoring OBS_MAX_DB_CONNECTIONS ({s}). {e}. Using {DEFAULT_MAX_DB_CONNECTIONS}.");
                    None
                },
            })
            .unwrap_or(DEFAULT_MAX_DB_CONNECTIONS);
        let driver = DriverConfig::from_env_or_default();
        Self { host, port, database_url, max_db_connections, driver }
    }
}

impl DriverConfig {
    pub fn from_env_or_default() -> Self {
        let session_file = env::var("OBS_SESSION_FILE").ok().unwrap_or_else(|| {
            info!("🪛️ OBS_SESSION_FILE is not set. The browser session will be stored in {DEFAULT_SESSION_FILE}");
            DEFAULT_SESSION_FILE.into()
        });
        let partner_url = env::var("OBS_PARTNER_URL").ok().unwrap_or_else(|| DEFAULT_PARTNER_URL.into());
        let headless = env::var("OBS_HEADLESS").map(|s| &s != "0" && &s != "false").unwrap_or(true);
        Self { session_file, partner_url, headless }
    }

    pub fn build_driver(&self) -> SessionFileDriver {
        SessionFileDriver::new(&self.session_file, &self.partner_url, self.headless)
    }
}
