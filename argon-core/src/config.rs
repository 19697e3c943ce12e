//! Configuration file loading
//!
//! Loads service configuration from `~/.config/argon/config.toml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{ArgonError, Result};
use crate::types::{SourceDescriptor, SourceKind};

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Service settings
    #[serde(default)]
    pub service: ServiceSettings,

    /// Source table for the development backend
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Socket path override (defaults to the runtime-dir socket)
    #[serde(default)]
    pub socket_path: Option<PathBuf>,
}

/// One synthetic capture source served by the development backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    /// Backend identifier (e.g., "DP-1")
    pub id: String,

    /// Human-readable label; defaults to the id
    #[serde(default)]
    pub label: String,

    /// Source kind: "output" or "window"
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Top-left x coordinate
    #[serde(default)]
    pub x: i32,

    /// Top-left y coordinate
    #[serde(default)]
    pub y: i32,

    /// Width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Height in pixels
    #[serde(default = "default_height")]
    pub height: u32,
}

impl SourceEntry {
    /// Convert to the descriptor the backend serves
    pub fn to_descriptor(&self) -> Result<SourceDescriptor> {
        let kind = match self.kind.as_str() {
            "output" | "monitor" => SourceKind::Output,
            "window" => SourceKind::Window,
            other => {
                return Err(ArgonError::config(format!(
                    "Unknown source kind '{}' for source {}",
                    other, self.id
                )));
            }
        };
        let label = if self.label.is_empty() {
            self.id.clone()
        } else {
            self.label.clone()
        };
        Ok(SourceDescriptor {
            kind,
            id: self.id.clone(),
            label,
            position: (self.x, self.y),
            size: (self.width, self.height),
        })
    }
}

fn default_kind() -> String {
    "output".to_string()
}

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1080
}

impl ConfigFile {
    /// Get the default config file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("argon").join("config.toml")
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("argon")
                .join("config.toml")
        } else {
            PathBuf::from("/etc/argon/config.toml")
        }
    }

    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| ArgonError::Config(format!("Failed to read config file: {}", e)))?;

        let config: ConfigFile = toml::from_str(&content)
            .map_err(|e| ArgonError::Config(format!("Failed to parse config file: {}", e)))?;

        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load configuration, logging warnings but returning defaults on error
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load config file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Descriptors for the development backend
    ///
    /// Falls back to a built-in dual-monitor table when the config lists
    /// no sources.
    pub fn descriptors(&self) -> Result<Vec<SourceDescriptor>> {
        if self.sources.is_empty() {
            return Ok(default_sources());
        }
        self.sources
            .iter()
            .map(SourceEntry::to_descriptor)
            .collect()
    }
}

/// Built-in source table used when no config file is present
pub fn default_sources() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor::output("DP-1", "Built-in Display", (0, 0), (1920, 1080)),
        SourceDescriptor::output("HDMI-A-1", "External Display", (1920, 0), (2560, 1440)),
    ]
}

/// Generate a sample configuration file
pub fn sample_config() -> String {
    r#"# Argon Configuration

[service]
# Socket path override (defaults to $XDG_RUNTIME_DIR/argon.sock)
# socket_path = "/run/user/1000/argon.sock"

# Synthetic sources served by the development backend. Real deployments
# wire a compositor-backed CaptureBackend instead and ignore this table.
[[sources]]
id = "DP-1"
label = "Built-in Display"
kind = "output"
x = 0
y = 0
width = 1920
height = 1080

[[sources]]
id = "HDMI-A-1"
label = "External Display"
kind = "output"
x = 1920
y = 0
width = 2560
height = 1440
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_config_parses() {
        let config: ConfigFile = toml::from_str(&sample_config()).unwrap();
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].id, "DP-1");
        assert!(config.service.socket_path.is_none());
    }

    #[test]
    fn test_source_entry_defaults() {
        let config: ConfigFile = toml::from_str("[[sources]]\nid = \"DP-3\"\n").unwrap();
        let descriptor = config.sources[0].to_descriptor().unwrap();
        assert_eq!(descriptor.kind, SourceKind::Output);
        assert_eq!(descriptor.label, "DP-3");
        assert_eq!(descriptor.size, (1920, 1080));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let entry = SourceEntry {
            id: "X".to_string(),
            label: String::new(),
            kind: "hologram".to_string(),
            x: 0,
            y: 0,
            width: 800,
            height: 600,
        };
        assert!(entry.to_descriptor().is_err());
    }

    #[test]
    fn test_empty_config_uses_default_sources() {
        let config = ConfigFile::default();
        let descriptors = config.descriptors().unwrap();
        assert_eq!(descriptors.len(), 2);
    }

    #[test]
    fn test_load_from_missing_path_is_default() {
        let config = ConfigFile::load_from(PathBuf::from("/nonexistent/argon.toml")).unwrap();
        assert!(config.sources.is_empty());
    }
}
