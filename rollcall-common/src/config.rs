//! Bootstrap configuration loading
//!
//! Configuration file resolution priority:
//! 1. Command-line argument (highest priority, `--config` / `ROLLCALL_CONFIG`)
//! 2. User config: `~/.config/rollcall/rollcall.toml`
//! 3. System config: `/etc/rollcall/rollcall.toml`
//! 4. Compiled defaults (fallback, a missing file never stops startup)
//!
//! Individual values may then be overridden from the environment. Secrets
//! (gateway auth token) are read from the environment only.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable holding the gateway auth token
pub const ENV_GATEWAY_AUTH_TOKEN: &str = "ROLLCALL_GATEWAY_AUTH_TOKEN";
/// Environment override for the SQLite database path
pub const ENV_DATABASE_PATH: &str = "ROLLCALL_DATABASE_PATH";
/// Environment override for the operator alert address
pub const ENV_OPERATOR_ADDRESS: &str = "ROLLCALL_OPERATOR_ADDRESS";
/// Environment override for the administrator display name
pub const ENV_ADMIN_NAME: &str = "ROLLCALL_ADMIN_NAME";

const CONFIG_DIR_NAME: &str = "rollcall";
const CONFIG_FILE_NAME: &str = "rollcall.toml";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Path to SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub schedule: ScheduleSection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values threaded into the reconciliation engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineSection {
    /// Prefix applied to bare local numbers
    #[serde(default = "default_region_code")]
    pub region_code: String,

    /// Name signed on reminder messages
    #[serde(default = "default_admin_name")]
    pub admin_name: String,

    /// Operator address for run reports and empty-address fallback
    #[serde(default)]
    pub operator_address: Option<String>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            region_code: default_region_code(),
            admin_name: default_admin_name(),
            operator_address: None,
        }
    }
}

/// Outbound gateway selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    /// Messages are logged, never sent
    #[default]
    Log,
    /// Twilio-compatible SMS REST API
    Twilio,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GatewaySection {
    #[serde(default)]
    pub kind: GatewayKind,

    #[serde(default)]
    pub account_sid: Option<String>,

    /// Sender address (phone number) messages originate from
    #[serde(default)]
    pub from_address: Option<String>,

    #[serde(default = "default_gateway_base_url")]
    pub base_url: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            kind: GatewayKind::default(),
            account_sid: None,
            from_address: None,
            base_url: default_gateway_base_url(),
        }
    }
}

/// Daily trigger and collection window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleSection {
    /// Local hour (0-23) of the daily run
    #[serde(default = "default_hour")]
    pub hour: u32,

    /// Day of month from which runs stop until the month's last day
    #[serde(default = "default_stop_day")]
    pub stop_day: u32,

    /// Skip runs outside the collection window
    #[serde(default = "default_true")]
    pub enforce_window: bool,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            hour: default_hour(),
            stop_day: default_stop_day(),
            enforce_window: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_region_code() -> String {
    "+1".to_string()
}

fn default_admin_name() -> String {
    "Rollcall Admin".to_string()
}

fn default_gateway_base_url() -> String {
    "https://api.twilio.com".to_string()
}

fn default_hour() -> u32 {
    18
}

fn default_stop_day() -> u32 {
    5
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Apply environment overrides on top of file values
    pub fn apply_env_overrides(&mut self) {
        if let Some(path) = non_empty_env(ENV_DATABASE_PATH) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(address) = non_empty_env(ENV_OPERATOR_ADDRESS) {
            self.engine.operator_address = Some(address);
        }
        if let Some(name) = non_empty_env(ENV_ADMIN_NAME) {
            self.engine.admin_name = name;
        }
    }

    /// Database path, falling back to the OS data directory
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(default_database_path)
    }

    /// Check values that would otherwise fail deep inside a run
    pub fn validate(&self) -> Result<()> {
        if self.schedule.hour > 23 {
            return Err(Error::Config(format!(
                "schedule.hour must be 0-23, got {}",
                self.schedule.hour
            )));
        }
        if !(1..=31).contains(&self.schedule.stop_day) {
            return Err(Error::Config(format!(
                "schedule.stop_day must be 1-31, got {}",
                self.schedule.stop_day
            )));
        }
        if !self.engine.region_code.starts_with('+') {
            return Err(Error::Config(format!(
                "engine.region_code must start with '+', got {:?}",
                self.engine.region_code
            )));
        }
        if self.gateway.kind == GatewayKind::Twilio
            && (self.gateway.account_sid.is_none() || self.gateway.from_address.is_none())
        {
            return Err(Error::Config(
                "gateway.kind = \"twilio\" requires account_sid and from_address".to_string(),
            ));
        }
        Ok(())
    }
}

/// Gateway auth token from the environment
pub fn gateway_auth_token() -> Option<String> {
    non_empty_env(ENV_GATEWAY_AUTH_TOKEN)
}

/// Load configuration following the resolution priority
///
/// An explicit path that cannot be read is an error. When no file is found
/// compiled defaults are used and a warning is logged.
pub fn load_config(cli_path: Option<&Path>) -> Result<TomlConfig> {
    let mut config = match cli_path {
        Some(path) => load_toml_config(path)?,
        None => match locate_config_file() {
            Some(path) => load_toml_config(&path)?,
            None => {
                warn!("No config file found, using compiled defaults");
                TomlConfig::default()
            }
        },
    };

    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config = TomlConfig::from_toml_str(&content)?;
    info!("Loaded config: {}", path.display());
    Ok(config)
}

/// Find the first existing config file in the standard locations
fn locate_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    let system_config = PathBuf::from("/etc")
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME);
    if system_config.exists() {
        return Some(system_config);
    }

    None
}

/// OS-dependent default database location
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(CONFIG_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("./rollcall_data"))
        .join("rollcall.db")
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
