//! Configuration types for the assistant runtime.

use serde::{Deserialize, Serialize};

/// Top-level configuration for an assistant session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Remote reply service settings.
    pub remote: RemoteConfig,
    /// Timer and delay settings.
    pub timing: TimingConfig,
    /// Snapshot persistence settings.
    pub persistence: PersistenceConfig,
    /// Notification cue settings.
    pub notification: NotificationConfig,
}

/// Remote reply service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the reply endpoint.
    pub base_url: String,
    /// Per-request timeout in ms. Anything slower falls back locally.
    pub timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api/chat".to_owned(),
            timeout_ms: 10_000,
        }
    }
}

/// Timer and delay configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Lower bound of the simulated-typing delay before a fallback reply, in ms.
    pub fallback_delay_min_ms: u64,
    /// Upper bound of the simulated-typing delay before a fallback reply, in ms.
    pub fallback_delay_max_ms: u64,
    /// How long the avatar stays in `talking` after a reply, in ms.
    pub mood_reset_ms: u64,
    /// Inactivity window before the closed, idle avatar falls asleep, in ms.
    pub sleep_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            fallback_delay_min_ms: 800,
            fallback_delay_max_ms: 1_800,
            mood_reset_ms: 2_000,
            sleep_timeout_ms: 30_000,
        }
    }
}

/// Snapshot persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Key-value store key holding the conversation snapshot.
    pub snapshot_key: String,
    /// Key-value store key holding the mute flag.
    pub mute_key: String,
    /// Maximum number of messages kept in the snapshot (oldest dropped first).
    pub max_messages: usize,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            snapshot_key: "pixie.chat.history".to_owned(),
            mute_key: "pixie.chat.muted".to_owned(),
            max_messages: 50,
        }
    }
}

/// Notification cue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Cue playback volume in \[0, 1\].
    pub volume: f32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { volume: 0.4 }
    }
}

impl AssistantConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::AssistantError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::AssistantError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
