//! Core types for the Vela player

use crate::gesture::GestureConfig;
use crate::tracks::SubtitlePreferences;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for a playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Player state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerState {
    /// Initial state, no content loaded
    Idle,
    /// Load command issued, waiting for the engine's file-loaded event
    Loading,
    /// Content is playing
    Playing,
    /// Playback paused
    Paused,
    /// Playback reached end of file
    Ended,
    /// Fatal error occurred
    Error,
}

impl PlayerState {
    /// Check if transition to target state is valid
    pub fn can_transition_to(&self, target: PlayerState) -> bool {
        use PlayerState::*;
        matches!(
            (self, target),
            // From Idle
            (Idle, Loading) |
            // From Loading
            (Loading, Playing) | (Loading, Paused) | (Loading, Error) |
            // From Playing
            (Playing, Paused) | (Playing, Ended) | (Playing, Error) |
            // From Paused
            (Paused, Playing) | (Paused, Ended) | (Paused, Error) |
            // From Ended
            (Ended, Playing) | (Ended, Idle) |
            // From Error
            (Error, Idle)
        )
    }
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerState::Idle => write!(f, "idle"),
            PlayerState::Loading => write!(f, "loading"),
            PlayerState::Playing => write!(f, "playing"),
            PlayerState::Paused => write!(f, "paused"),
            PlayerState::Ended => write!(f, "ended"),
            PlayerState::Error => write!(f, "error"),
        }
    }
}

/// An external subtitle file supplied by the caller alongside the media URL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExternalSubtitle {
    pub url: String,
    #[serde(default)]
    pub title: String,
}

/// What to play and how to reach it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSource {
    /// Media URL or file path handed verbatim to the engine
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// HTTP headers applied when the source is an http(s) URL
    #[serde(default)]
    pub http_headers: HashMap<String, String>,
    /// External subtitles loaded after the engine reports file-loaded
    #[serde(default)]
    pub subtitles: Vec<ExternalSubtitle>,
}

impl MediaSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            http_headers: HashMap::new(),
            subtitles: Vec::new(),
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Telemetry poll period in milliseconds
    pub poll_interval_ms: u64,
    /// Overlay auto-hide delay in milliseconds
    pub auto_hide_ms: u64,
    /// Start with playback paused instead of rolling immediately
    pub start_paused: bool,
    /// Gesture thresholds and sensitivities
    pub gesture: GestureConfig,
    /// Subtitle auto-selection behavior
    pub subtitles: SubtitlePreferences,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            auto_hide_ms: 4000,
            start_paused: false,
            gesture: GestureConfig::default(),
            subtitles: SubtitlePreferences::default(),
        }
    }
}

/// Final playback figures reported back to the caller when a session closes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub position_ms: i64,
    pub duration_ms: i64,
}

/// Playback speed steps offered by the speed menu
pub const SPEED_STEPS: &[f64] = &[0.5, 0.75, 1.0, 1.25, 1.5, 2.0];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_state_transitions() {
        // Valid transitions
        assert!(PlayerState::Idle.can_transition_to(PlayerState::Loading));
        assert!(PlayerState::Loading.can_transition_to(PlayerState::Playing));
        assert!(PlayerState::Playing.can_transition_to(PlayerState::Paused));
        assert!(PlayerState::Paused.can_transition_to(PlayerState::Playing));
        assert!(PlayerState::Playing.can_transition_to(PlayerState::Ended));

        // Invalid transitions
        assert!(!PlayerState::Idle.can_transition_to(PlayerState::Playing));
        assert!(!PlayerState::Playing.can_transition_to(PlayerState::Loading));
        assert!(!PlayerState::Ended.can_transition_to(PlayerState::Paused));
    }

    #[test]
    fn test_session_config_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.auto_hide_ms, 4000);
        assert!(!config.start_paused);
    }

    #[test]
    fn test_media_source_camel_case() {
        let json = r#"{
            "url": "https://example.com/a.mkv",
            "title": "A",
            "httpHeaders": {"Authorization": "Bearer x"},
            "subtitles": [{"url": "https://example.com/a.srt", "title": "English"}]
        }"#;
        let source: MediaSource = serde_json::from_str(json).unwrap();
        assert_eq!(source.http_headers.get("Authorization").unwrap(), "Bearer x");
        assert_eq!(source.subtitles.len(), 1);
    }
}
