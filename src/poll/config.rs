//! Poll engine settings.
//!
//! Loaded once at startup and read-only afterwards. Field defaults mirror a
//! stock deployment: hourly automatic close, 15-minute reminders, 2-minute
//! countdown ticks, every feature opt-in.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

/// Errors loading or validating settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Read(#[from] std::io::Error),

    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Runtime configuration for the poll engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    /// Relay final results to the webhook on close.
    pub relay_results: bool,
    /// Discord-compatible webhook URL for the relay.
    pub webhook_url: String,
    /// Countdown applied when a poll opens with automatic closing enabled.
    pub default_closing_secs: u64,
    /// Present the vote surface to every connected user on open.
    pub force_show_on_open: bool,
    /// Close the poll automatically when the countdown runs out.
    pub auto_close: bool,
    /// Periodically remind connected users who have not voted.
    pub reminders: bool,
    /// Seconds between reminders.
    pub reminder_interval_secs: u64,
    /// Seconds between countdown ticks.
    pub tick_interval_secs: u64,
    /// Prefix applied to user-facing messages.
    pub message_prefix: String,
    /// Suffix applied to user-facing messages.
    pub message_suffix: String,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            relay_results: false,
            webhook_url: String::new(),
            default_closing_secs: 3600,
            force_show_on_open: false,
            auto_close: false,
            reminders: false,
            reminder_interval_secs: 900,
            tick_interval_secs: 120,
            message_prefix: "[SERVER POLL]: ".to_string(),
            message_suffix: String::new(),
        }
    }
}

impl PollSettings {
    /// Load settings from a JSON file, creating it with defaults if absent.
    pub fn load_or_create(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            let settings = Self::default();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_string_pretty(&settings)?)?;
            return Ok(settings);
        }

        let settings: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check the settings for contradictions.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.relay_results {
            Url::parse(&self.webhook_url)
                .map_err(|e| SettingsError::Invalid(format!("webhook_url: {e}")))?;
        }

        if self.auto_close {
            if self.default_closing_secs == 0 {
                return Err(SettingsError::Invalid(
                    "auto_close requires a non-zero default_closing_secs".into(),
                ));
            }
            if self.tick_interval_secs == 0 {
                return Err(SettingsError::Invalid(
                    "auto_close requires a non-zero tick_interval_secs".into(),
                ));
            }
        }

        if self.reminders && self.reminder_interval_secs == 0 {
            return Err(SettingsError::Invalid(
                "reminders require a non-zero reminder_interval_secs".into(),
            ));
        }

        Ok(())
    }

    /// Wrap a user-facing message with the configured affixes.
    pub fn decorate(&self, text: &str) -> String {
        format!("{}{}{}", self.message_prefix, text, self.message_suffix)
    }
}
