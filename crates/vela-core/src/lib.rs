//! Vela Core - playback control library
//!
//! This crate provides the platform-side control logic of the Vela video
//! player:
//! - Playback engine adapter boundary (typed events, advisory reads)
//! - Gesture interpretation (brightness/volume/seek/tap)
//! - Control overlay auto-hide state machine
//! - Position and throughput telemetry polling
//! - Subtitle track selection and encoding override
//! - Scoped player session with ordered teardown
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Vela Core                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐            │
//! │  │  Gesture   │   │  Overlay   │   │ Telemetry  │            │
//! │  │Interpreter │   │ Controller │   │   Poller   │            │
//! │  └─────┬──────┘   └─────┬──────┘   └─────┬──────┘            │
//! │        │                │                │                   │
//! │        └────────────────┼────────────────┘                   │
//! │                         │                                    │
//! │                  ┌──────┴──────┐        ┌──────────────┐     │
//! │                  │   Player    │────────│    Track     │     │
//! │                  │   Session   │        │   Selector   │     │
//! │                  └──────┬──────┘        └──────────────┘     │
//! │                         │                                    │
//! │                  ┌──────┴──────┐                             │
//! │                  │  Playback   │  (external engine)          │
//! │                  │   Adapter   │                             │
//! │                  └─────────────┘                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The media engine itself (decode, render, cache, network) is an external
//! collaborator behind [`PlaybackAdapter`]; so is the host windowing layer
//! behind [`SystemSurface`].

pub mod engine;
pub mod error;
pub mod gesture;
pub mod overlay;
pub mod session;
pub mod telemetry;
pub mod tracks;
pub mod types;

pub use engine::{EngineEvent, EngineEvents, PlaybackAdapter, PropertyValue};
pub use error::{Error, Result};
pub use gesture::{
    GestureConfig, GestureEffect, GestureInterpreter, GestureKind, SystemSurface, TouchPhase,
    TouchPoint,
};
pub use overlay::{OverlayController, OverlayState};
pub use session::PlayerSession;
pub use telemetry::{TelemetrySnapshot, ThroughputEstimator};
pub use tracks::{SelectionStrategy, SubtitlePreferences, SubtitleTrack, TrackSelector};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the player library with default configuration
pub fn init() {
    tracing::info!(version = VERSION, "Vela Core initialized");
}
