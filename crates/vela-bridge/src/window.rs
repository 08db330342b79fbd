//! Window chrome for the full-screen player surface

use serde::{Deserialize, Serialize};

/// How the host should dress the window while a session is on screen
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WindowChrome {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
    /// Inhibit the screen saver while playing
    pub keep_screen_on: bool,
    /// Lock the surface to landscape (mobile hosts)
    pub force_landscape: bool,
    /// Hide system bars until the user swipes them back
    pub immersive: bool,
}

impl Default for WindowChrome {
    fn default() -> Self {
        Self {
            title: "Vela".to_string(),
            width: 1280,
            height: 720,
            fullscreen: true,
            keep_screen_on: true,
            force_landscape: true,
            immersive: true,
        }
    }
}

impl WindowChrome {
    /// Windowed preview chrome used outside full-screen playback
    pub fn windowed(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fullscreen: false,
            force_landscape: false,
            immersive: false,
            ..Self::default()
        }
    }
}
