//! Playback engine adapter boundary
//!
//! The media engine (decode, render, cache, network) is an external
//! collaborator reached through the [`PlaybackAdapter`] trait:
//! - commands and property reads/writes return `Result` and are treated as
//!   fast, synchronous, best-effort calls
//! - engine notifications arrive as typed [`EngineEvent`]s on a
//!   single-consumer channel
//! - advisory reads go through the `read_*` helpers, which absorb transient
//!   failures instead of propagating them
//!
//! Adapter implementations must be callable from the telemetry poller task;
//! thread-affine engines serialize access internally (worker thread plus
//! request channels).

use crate::Result;
use tokio::sync::mpsc;
use tracing::debug;

/// Property names understood by libmpv-compatible engines
pub mod prop {
    pub const TIME_POS: &str = "time-pos";
    pub const DURATION: &str = "duration";
    pub const PAUSE: &str = "pause";
    pub const SPEED: &str = "speed";
    pub const VOLUME: &str = "volume";
    pub const SID: &str = "sid";
    pub const SUB_VISIBILITY: &str = "sub-visibility";
    pub const SUB_CODEPAGE: &str = "sub-codepage";
    pub const CACHE_AHEAD: &str = "demuxer-cache-time";
    pub const HTTP_HEADERS: &str = "http-header-fields";
    pub const TRACK_COUNT: &str = "track-list/count";
    pub const ENGINE_VERSION: &str = "mpv-version";

    /// `track-list/<index>/<field>` accessor used during track enumeration
    pub fn track_field(index: i64, field: &str) -> String {
        format!("track-list/{index}/{field}")
    }
}

/// Command names issued to the engine
pub mod cmd {
    pub const LOADFILE: &str = "loadfile";
    pub const SEEK: &str = "seek";
    pub const STOP: &str = "stop";
    pub const SUB_ADD: &str = "sub-add";
    pub const SUB_RELOAD: &str = "sub-reload";
}

/// A property value crossing the engine boundary
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Flag(bool),
    Int(i64),
    Double(f64),
    Str(String),
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Double(v) => Some(*v),
            PropertyValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            PropertyValue::Double(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            PropertyValue::Flag(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Flag(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Double(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Str(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Str(v)
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyValue::Flag(true) => write!(f, "yes"),
            PropertyValue::Flag(false) => write!(f, "no"),
            PropertyValue::Int(v) => write!(f, "{v}"),
            PropertyValue::Double(v) => write!(f, "{v}"),
            PropertyValue::Str(v) => write!(f, "{v}"),
        }
    }
}

/// Typed engine notifications
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The engine finished opening the media and knows its tracks
    FileLoaded,
    /// Playback reached the end of the media
    EndOfFile,
    /// An observed property changed
    PropertyChanged { name: String, value: PropertyValue },
}

/// Single-consumer engine event stream
pub type EngineEvents = mpsc::UnboundedReceiver<EngineEvent>;

/// Boundary interface to the media playback engine.
///
/// Every call may fail; [`Result`]s from `command`/`set_property`/
/// `get_property` let call sites decide whether a failure is fatal.
/// The `read_*`/`try_*` helpers encode the advisory policy: log at debug
/// level and substitute `None`/nothing, never crash on an advisory call.
pub trait PlaybackAdapter: Send + Sync {
    /// Issue an engine command such as `loadfile` or `seek`
    fn command(&self, name: &str, args: &[&str]) -> Result<()>;

    /// Write an engine property
    fn set_property(&self, name: &str, value: PropertyValue) -> Result<()>;

    /// Read an engine property
    fn get_property(&self, name: &str) -> Result<PropertyValue>;

    /// Take the single-consumer event stream. Returns `None` once taken.
    fn take_events(&self) -> Option<EngineEvents>;

    /// Advisory read of a float property
    fn read_f64(&self, name: &str) -> Option<f64> {
        match self.get_property(name) {
            Ok(value) => value.as_f64(),
            Err(err) => {
                debug!(property = name, %err, "advisory read failed");
                None
            }
        }
    }

    /// Advisory read of an integer property
    fn read_i64(&self, name: &str) -> Option<i64> {
        match self.get_property(name) {
            Ok(value) => value.as_i64(),
            Err(err) => {
                debug!(property = name, %err, "advisory read failed");
                None
            }
        }
    }

    /// Advisory read of a flag property
    fn read_flag(&self, name: &str) -> Option<bool> {
        match self.get_property(name) {
            Ok(value) => value.as_flag(),
            Err(err) => {
                debug!(property = name, %err, "advisory read failed");
                None
            }
        }
    }

    /// Advisory read of a string property
    fn read_str(&self, name: &str) -> Option<String> {
        match self.get_property(name) {
            Ok(value) => value.as_str().map(str::to_string),
            Err(err) => {
                debug!(property = name, %err, "advisory read failed");
                None
            }
        }
    }

    /// Advisory property write
    fn try_set(&self, name: &str, value: PropertyValue) {
        if let Err(err) = self.set_property(name, value) {
            debug!(property = name, %err, "advisory write failed");
        }
    }

    /// Advisory command
    fn try_command(&self, name: &str, args: &[&str]) {
        if let Err(err) = self.command(name, args) {
            debug!(command = name, %err, "advisory command failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_conversions() {
        assert_eq!(PropertyValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(PropertyValue::Double(2.5).as_i64(), Some(2));
        assert_eq!(PropertyValue::Flag(true).as_f64(), None);
        assert_eq!(PropertyValue::from("yes").as_str(), Some("yes"));
    }

    #[test]
    fn test_property_value_display() {
        assert_eq!(PropertyValue::Flag(true).to_string(), "yes");
        assert_eq!(PropertyValue::Flag(false).to_string(), "no");
        assert_eq!(PropertyValue::Double(1.5).to_string(), "1.5");
    }

    #[test]
    fn test_track_field_path() {
        assert_eq!(prop::track_field(2, "lang"), "track-list/2/lang");
    }
}
