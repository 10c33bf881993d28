//! Core types for audio focus coordination

use crate::error::{FocusError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Default settings key for the persisted audio flag
pub const DEFAULT_SETTINGS_KEY: &str = "media.audio_enabled";

/// Stable identifier of a registered player
///
/// Unique per feed item or overlay instance for as long as it stays registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for PlayerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Where a player lives in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerKind {
    /// Item in the scrolling feed
    Feed,

    /// Modal fullscreen viewer layered above the feed
    FullscreenOverlay,
}

/// Fullscreen state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FocusMode {
    /// Feed is the only surface (default)
    #[default]
    Feed,

    /// A fullscreen overlay is open; feed players are paused and muted
    Fullscreen,
}

/// State delivered to listeners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFocusSnapshot {
    /// Global sound toggle
    pub audio_enabled: bool,

    /// Currently focused player, if any
    pub active_id: Option<PlayerId>,

    /// Whether a fullscreen overlay is open
    pub fullscreen_active: bool,
}

/// Configuration for the audio focus coordinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Settings key the audio flag is persisted under (default: "media.audio_enabled")
    pub settings_key: String,

    /// Load the persisted flag at startup (default: true)
    pub restore_persisted: bool,

    /// Skip the unmute of a focus transition when a newer transition
    /// started while its mutes were in flight (default: false)
    pub cancel_superseded_unmutes: bool,
}

impl CoordinatorConfig {
    /// Reject settings the coordinator cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.settings_key.trim().is_empty() {
            return Err(FocusError::Config(
                "settings_key must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            settings_key: DEFAULT_SETTINGS_KEY.to_string(),
            restore_persisted: true,
            cancel_superseded_unmutes: false,
        }
    }
}
