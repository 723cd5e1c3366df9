//! Plugin configuration and builder
//!
//! `PluginConfig` carries everything the policy engine and the event logger need from the
//! environment: where the PAI directory lives, which time zone audit timestamps use, whether
//! the operator opted out of human-in-the-loop confirmation, and the identity variables
//! substituted into the core skill.
//!
//! # Example
//!
//! ```
//! use pai_plugin::config::PluginConfig;
//!
//! let config = PluginConfig::builder()
//!     .pai_dir("/tmp/pai-home")
//!     .time_zone("UTC")
//!     .dangerous_mode(false)
//!     .build()
//!     .unwrap();
//!
//! assert!(config.history_dir().ends_with("history"));
//! ```
//!
//! # Environment
//!
//! [`PluginConfig::from_env`] reads:
//!
//! - `PAI_DIR` - plugin root; falls back to `$XDG_CONFIG_HOME/opencode`, then `~/.config/opencode`
//! - `TIME_ZONE` - IANA zone for local timestamps (default `America/Los_Angeles`)
//! - `PAI_I_AM_DANGEROUS` - `true` auto-approves tools the policy does not block
//! - `DA`, `DA_COLOR`, `ENGINEER_NAME` - identity variables for the core skill

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::PaiError;

/// Default agent role stamped on audit events when a session has no declared role
pub const DEFAULT_ROLE: &str = "pai";

/// Default IANA time zone for local timestamps
pub const DEFAULT_TIME_ZONE: &str = "America/Los_Angeles";

/// Configuration shared by every component of the plugin
#[derive(Debug, Clone)]
pub struct PluginConfig {
    /// Plugin root directory (`PAI_DIR`)
    pub pai_dir: PathBuf,
    /// Zone used for local timestamps and date buckets
    pub time_zone: Tz,
    /// When false, every permission request the policy does not block is escalated to `ask`
    pub dangerous_mode: bool,
    /// Digital assistant name substituted for `{{DA}}`
    pub da_name: String,
    /// Engineer name substituted for `{{ENGINEER_NAME}}`
    pub engineer_name: String,
    /// Color substituted for `{{DA_COLOR}}`
    pub da_color: String,
    /// Role used when a session has none recorded
    pub default_role: String,
    /// Project worktree supplied by the host, if any
    pub worktree: Option<PathBuf>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            pai_dir: default_pai_dir(&|key: &str| std::env::var(key).ok()),
            time_zone: chrono_tz::America::Los_Angeles,
            dangerous_mode: false,
            da_name: "PAI".to_string(),
            engineer_name: "Engineer".to_string(),
            da_color: "blue".to_string(),
            default_role: DEFAULT_ROLE.to_string(),
            worktree: None,
        }
    }
}

impl PluginConfig {
    /// Create a new configuration builder
    pub fn builder() -> PluginConfigBuilder {
        PluginConfigBuilder::default()
    }

    /// Load configuration from process environment variables
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Load configuration with a custom environment lookup (for testing)
    ///
    /// An unknown `TIME_ZONE` falls back to the default zone with a warning rather
    /// than failing plugin startup.
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let time_zone = match non_empty("TIME_ZONE") {
            Some(name) => parse_time_zone(&name).unwrap_or_else(|e| {
                warn!("{}; using {}", e, DEFAULT_TIME_ZONE);
                chrono_tz::America::Los_Angeles
            }),
            None => chrono_tz::America::Los_Angeles,
        };

        Self {
            pai_dir: default_pai_dir(&lookup),
            time_zone,
            dangerous_mode: non_empty("PAI_I_AM_DANGEROUS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            da_name: non_empty("DA").unwrap_or_else(|| "PAI".to_string()),
            engineer_name: non_empty("ENGINEER_NAME").unwrap_or_else(|| "Engineer".to_string()),
            da_color: non_empty("DA_COLOR").unwrap_or_else(|| "blue".to_string()),
            default_role: DEFAULT_ROLE.to_string(),
            worktree: None,
        }
    }

    /// Attach the host worktree
    pub fn with_worktree(mut self, worktree: impl Into<PathBuf>) -> Self {
        self.worktree = Some(worktree.into());
        self
    }

    /// `<pai_dir>/history`
    pub fn history_dir(&self) -> PathBuf {
        self.pai_dir.join("history")
    }

    /// Current time in the configured zone
    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.time_zone)
    }

    /// `YYYY-MM-DD HH:MM:SS <abbrev>` in the configured zone
    pub fn local_timestamp(&self) -> String {
        self.now().format("%Y-%m-%d %H:%M:%S %Z").to_string()
    }
}

/// Builder for [`PluginConfig`]
#[derive(Debug, Default)]
pub struct PluginConfigBuilder {
    pai_dir: Option<PathBuf>,
    time_zone: Option<String>,
    dangerous_mode: bool,
    da_name: Option<String>,
    engineer_name: Option<String>,
    da_color: Option<String>,
    default_role: Option<String>,
    worktree: Option<PathBuf>,
}

impl PluginConfigBuilder {
    /// Set the plugin root directory
    pub fn pai_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pai_dir = Some(dir.into());
        self
    }

    /// Set the IANA time zone name
    pub fn time_zone(mut self, zone: impl Into<String>) -> Self {
        self.time_zone = Some(zone.into());
        self
    }

    /// Auto-approve tools the policy does not block
    pub fn dangerous_mode(mut self, enabled: bool) -> Self {
        self.dangerous_mode = enabled;
        self
    }

    /// Set the assistant name
    pub fn da_name(mut self, name: impl Into<String>) -> Self {
        self.da_name = Some(name.into());
        self
    }

    /// Set the engineer name
    pub fn engineer_name(mut self, name: impl Into<String>) -> Self {
        self.engineer_name = Some(name.into());
        self
    }

    /// Set the assistant color
    pub fn da_color(mut self, color: impl Into<String>) -> Self {
        self.da_color = Some(color.into());
        self
    }

    /// Set the role used for sessions with no declared role
    pub fn default_role(mut self, role: impl Into<String>) -> Self {
        self.default_role = Some(role.into());
        self
    }

    /// Set the project worktree
    pub fn worktree(mut self, worktree: impl Into<PathBuf>) -> Self {
        self.worktree = Some(worktree.into());
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// - [`PaiError::InvalidTimeZone`] if the zone name is unknown
    /// - [`PaiError::Config`] if the default role is empty
    pub fn build(self) -> Result<PluginConfig, PaiError> {
        let defaults = PluginConfig::default();

        let time_zone = match self.time_zone {
            Some(name) => parse_time_zone(&name)?,
            None => defaults.time_zone,
        };

        let default_role = self.default_role.unwrap_or(defaults.default_role);
        if default_role.trim().is_empty() {
            return Err(PaiError::Config("default role must not be empty".to_string()));
        }

        Ok(PluginConfig {
            pai_dir: self.pai_dir.unwrap_or(defaults.pai_dir),
            time_zone,
            dangerous_mode: self.dangerous_mode,
            da_name: self.da_name.unwrap_or(defaults.da_name),
            engineer_name: self.engineer_name.unwrap_or(defaults.engineer_name),
            da_color: self.da_color.unwrap_or(defaults.da_color),
            default_role,
            worktree: self.worktree,
        })
    }
}

/// Parse an IANA zone name such as `Europe/Berlin` or `UTC`
pub fn parse_time_zone(name: &str) -> Result<Tz, PaiError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| PaiError::InvalidTimeZone {
            value: name.to_string(),
        })
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn default_pai_dir(lookup: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = lookup("PAI_DIR").filter(|v| !v.trim().is_empty()) {
        return absolutize(Path::new(&dir));
    }

    let config_home = lookup("XDG_CONFIG_HOME")
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let home = lookup("HOME").unwrap_or_else(|| ".".to_string());
            PathBuf::from(home).join(".config")
        });

    absolutize(&config_home.join("opencode"))
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}
