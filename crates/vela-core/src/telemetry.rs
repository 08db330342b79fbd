//! Playback position and throughput telemetry
//!
//! The session polls the engine every tick and publishes a formatted
//! [`TelemetrySnapshot`] for the overlay. All engine reads are advisory:
//! a failed read yields a placeholder, never an error. The network speed is
//! a windowed estimate derived from how far the engine's demuxer cache grew
//! over wall-clock time, converted to bytes with an assumed stream bitrate.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Shown before the engine reports file-loaded
pub const SPEED_LOADING: &str = "loading…";

/// Shown when the cache-ahead read fails after load
pub const SPEED_UNKNOWN: &str = "-- KB/s";

/// Shown while the cache is not growing
pub const SPEED_IDLE: &str = "0 KB/s";

/// Windowed network speed estimate from demuxer cache growth
#[derive(Debug)]
pub struct ThroughputEstimator {
    /// Assumed stream bitrate in kbit/s used to convert cache seconds
    /// into bytes
    pub assumed_bitrate_kbps: f64,
    last_cache_ahead: f64,
    last_sample: Option<Instant>,
    speed_text: String,
}

impl ThroughputEstimator {
    /// Minimum wall-clock window between two estimates, in seconds
    const MIN_WINDOW_SECS: f64 = 1.0;

    pub fn new() -> Self {
        Self {
            assumed_bitrate_kbps: 8000.0,
            last_cache_ahead: 0.0,
            last_sample: None,
            speed_text: SPEED_LOADING.to_string(),
        }
    }

    /// Feed one poll tick.
    ///
    /// `cache_ahead_secs` is the advisory `demuxer-cache-time` read (absent
    /// on failure); `loaded` is whether file-loaded has been seen. Returns
    /// the current speed label, which is sticky between sample windows.
    pub fn sample(&mut self, cache_ahead_secs: Option<f64>, loaded: bool, now: Instant) -> &str {
        if !loaded {
            self.speed_text = SPEED_LOADING.to_string();
            return &self.speed_text;
        }

        let Some(cache) = cache_ahead_secs else {
            self.speed_text = SPEED_UNKNOWN.to_string();
            return &self.speed_text;
        };

        let Some(last) = self.last_sample else {
            self.last_sample = Some(now);
            self.last_cache_ahead = cache;
            return &self.speed_text;
        };

        let elapsed = now.duration_since(last).as_secs_f64();
        if elapsed < Self::MIN_WINDOW_SECS {
            return &self.speed_text;
        }

        let growth = cache - self.last_cache_ahead;
        self.speed_text = if growth > 0.0 {
            let bytes = growth * self.assumed_bitrate_kbps * 1000.0 / 8.0;
            format_speed(bytes / elapsed)
        } else {
            SPEED_IDLE.to_string()
        };
        self.last_cache_ahead = cache;
        self.last_sample = Some(now);
        &self.speed_text
    }
}

impl Default for ThroughputEstimator {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats bytes per second as `B/s`, `KB/s`, or `MB/s`
pub fn format_speed(bytes_per_sec: f64) -> String {
    let bytes_per_sec = bytes_per_sec.max(0.0);
    if bytes_per_sec < 1024.0 {
        format!("{} B/s", bytes_per_sec as u64)
    } else if bytes_per_sec < 1024.0 * 1024.0 {
        format!("{:.1} KB/s", bytes_per_sec / 1024.0)
    } else {
        format!("{:.2} MB/s", bytes_per_sec / (1024.0 * 1024.0))
    }
}

/// Formats seconds as `mm:ss`, or `hh:mm:ss` past the hour mark
pub fn format_clock(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;
    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// One formatted overlay refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetrySnapshot {
    pub position_secs: f64,
    pub duration_secs: f64,
    pub position_text: String,
    pub duration_text: String,
    /// Seek bar progress; the bar runs 0..=1000
    pub progress_permille: u32,
    pub speed_text: String,
    /// Wall clock shown in the overlay corner, `HH:MM`
    pub clock_text: String,
    pub speed_factor: f64,
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self {
            position_secs: 0.0,
            duration_secs: 0.0,
            position_text: "00:00".to_string(),
            duration_text: "00:00".to_string(),
            progress_permille: 0,
            speed_text: SPEED_LOADING.to_string(),
            clock_text: String::new(),
            speed_factor: 1.0,
        }
    }
}

/// Builds a snapshot from advisory position/duration reads
pub fn snapshot(
    position: Option<f64>,
    duration: Option<f64>,
    speed_text: &str,
    speed_factor: f64,
) -> TelemetrySnapshot {
    let position_secs = position.unwrap_or(0.0).max(0.0);
    let duration_secs = duration.unwrap_or(0.0).max(0.0);
    let progress_permille = if duration_secs > 0.0 {
        (((position_secs / duration_secs) * 1000.0) as u32).min(1000)
    } else {
        0
    };
    TelemetrySnapshot {
        position_text: format_clock(position_secs),
        duration_text: format_clock(duration_secs),
        progress_permille,
        speed_text: speed_text.to_string(),
        clock_text: Local::now().format("%H:%M").to_string(),
        speed_factor,
        position_secs,
        duration_secs,
    }
}
