//! Configuration management for deepvision-contact
//!
//! Config file location:
//! - Linux: ~/.config/deepvision-contact/config.toml
//! - macOS: ~/Library/Application Support/com.deepvision.deepvision-contact/config.toml
//! - Windows: %APPDATA%/deepvision/deepvision-contact/config/config.toml
//!
//! You can override the config location by setting `DEEPVISION_CONTACT_CONFIG_PATH`.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::form::{FormRules, PhonePolicy};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Form intake endpoint
    #[serde(default)]
    pub intake: IntakeConfig,

    /// Chat handoff after a successful submission
    #[serde(default)]
    pub chat: ChatConfig,

    /// Which inputs the form revision shows
    #[serde(default)]
    pub form: FormConfig,
}

impl Config {
    /// Load configuration from file or create default
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

            let config: Config = toml::from_str(&content).with_context(|| {
                format!("Failed to parse config from {}", config_path.display())
            })?;

            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, toml)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("DEEPVISION_CONTACT_CONFIG_PATH") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        let proj_dirs = ProjectDirs::from("com", "deepvision", "deepvision-contact")
            .context("Could not determine project directories")?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Create default config file if it doesn't exist
    pub fn init() -> Result<Self> {
        let config = Self::load()?;

        let config_path = Self::config_path()?;
        if !config_path.exists() {
            config.save()?;
        }

        Ok(config)
    }

    pub fn form_rules(&self) -> FormRules {
        FormRules {
            phone: self.form.phone,
        }
    }
}

/// Intake endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    /// Form endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds; unset leaves the transport default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    /// Whether to verify SSL certificates
    #[serde(default = "default_true")]
    pub verify_ssl: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_seconds: None,
            verify_ssl: default_true(),
        }
    }
}

fn default_endpoint() -> String {
    "https://formspree.io/f/deepvision".to_string()
}

fn default_true() -> bool {
    true
}

/// Chat deep-link configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Deep-link base, recipient is appended as a path segment
    #[serde(default = "default_chat_base_url")]
    pub base_url: String,

    /// Recipient phone number; non-digits are stripped
    #[serde(default = "default_recipient")]
    pub recipient: String,

    /// First line of the pre-filled message
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Open the link after a successful submission
    #[serde(default = "default_true")]
    pub open_after_success: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_chat_base_url(),
            recipient: default_recipient(),
            greeting: default_greeting(),
            open_after_success: default_true(),
        }
    }
}

fn default_chat_base_url() -> String {
    "https://wa.me".to_string()
}

fn default_recipient() -> String {
    "+965-98935210".to_string()
}

fn default_greeting() -> String {
    "Hello DeepVision Solution, I just sent a message through your website.".to_string()
}

/// Form revision settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormConfig {
    #[serde(default)]
    pub phone: PhonePolicy,
}

/// Get configuration file path for display purposes
pub fn get_config_path() -> Result<String> {
    let path = Config::config_path()?;
    Ok(path.display().to_string())
}

/// Initialize configuration (load or create default)
pub fn init_config() -> Result<Config> {
    Config::init()
}
