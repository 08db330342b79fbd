//! Drag gesture interpretation for the full-screen player
//!
//! Classifies a touch sequence into one of brightness / volume / seek / tap
//! and computes the continuous adjustment value:
//! - classification happens once, on the first move that crosses the
//!   threshold on either axis, and is fixed for the rest of the sequence
//! - horizontal-dominant displacement seeks; vertical displacement adjusts
//!   brightness on the left half of the screen and volume on the right
//! - brightness and volume are applied continuously during the drag; a seek
//!   is previewed during the drag and committed exactly once on release
//!
//! The seek preview is always derived from the touch-down baseline
//! (`start_position + window * dx / screen_width`), never compounded per
//! move event.

/// Host controls the gestures act on: screen brightness and the media
/// volume of the system mixer, plus the touch surface geometry.
pub trait SystemSurface: Send + Sync {
    /// Current screen brightness in `[0, 1]`
    fn brightness(&self) -> f64;

    fn set_brightness(&self, level: f64);

    /// Current media volume in mixer steps
    fn volume(&self) -> i64;

    /// Maximum mixer volume step
    fn max_volume(&self) -> i64;

    fn set_volume(&self, level: i64);

    /// Width of the touch surface in pixels
    fn screen_width(&self) -> f32;
}

/// Touch sample phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// A touch sample position in surface pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub x: f32,
    pub y: f32,
}

impl TouchPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Gesture classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    None,
    Brightness,
    Volume,
    Seek,
}

/// Gesture thresholds and sensitivities
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GestureConfig {
    /// Displacement in pixels that turns a touch into a drag
    pub classify_threshold: f32,
    /// Pixels of vertical drag for a full-range brightness/volume sweep
    pub drag_scale: f32,
    /// Seconds of media covered by a full-width horizontal drag
    pub seek_window_secs: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            classify_threshold: 20.0,
            drag_scale: 500.0,
            seek_window_secs: 180.0,
        }
    }
}

/// Interpretation baselines snapshotted on touch-down
#[derive(Debug, Clone, Copy, Default)]
pub struct GestureBaseline {
    /// Screen brightness in `[0, 1]` at touch-down
    pub brightness: f64,
    /// Mixer volume step at touch-down
    pub volume: i64,
    pub max_volume: i64,
    /// Playback position in seconds at touch-down
    pub position_secs: f64,
    pub duration_secs: f64,
    pub screen_width: f32,
}

/// Outcome of feeding one touch sample to the interpreter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEffect {
    /// Nothing to apply for this sample
    None,
    /// Sub-threshold sequence ended: toggle the control overlay
    Tap,
    /// Apply this brightness level now
    Brightness { level: f64 },
    /// Apply this mixer volume now
    Volume { level: i64, max: i64 },
    /// Show this position in the gesture indicator; nothing is seeked yet
    SeekPreview { position_secs: f64 },
    /// Commit a single absolute seek to this position
    SeekCommit { position_secs: f64 },
    /// Drag ended; brightness/volume were already applied during the drag
    Released,
}

impl GestureEffect {
    /// Percentage shown by the gesture indicator, clamped to `[0, 100]`
    pub fn indicator_percent(&self) -> Option<u8> {
        match self {
            GestureEffect::Brightness { level } => {
                Some((level.clamp(0.0, 1.0) * 100.0).round() as u8)
            }
            GestureEffect::Volume { level, max } if *max > 0 => {
                Some(((*level as f64 / *max as f64).clamp(0.0, 1.0) * 100.0).round() as u8)
            }
            _ => None,
        }
    }
}

struct ActiveGesture {
    start: TouchPoint,
    baseline: GestureBaseline,
    kind: GestureKind,
    moved: bool,
    /// Last valid seek preview, committed on release
    preview_secs: Option<f64>,
}

/// Interprets one touch sequence at a time.
///
/// State is reset on every touch-down and discarded on up/cancel; at most
/// one gesture is active per sequence and at most one seek is committed.
pub struct GestureInterpreter {
    config: GestureConfig,
    active: Option<ActiveGesture>,
}

impl GestureInterpreter {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    /// Classification of the gesture in flight
    pub fn kind(&self) -> GestureKind {
        self.active
            .as_ref()
            .map(|g| g.kind)
            .unwrap_or(GestureKind::None)
    }

    /// Begin a touch sequence, recording the interpretation baselines
    pub fn on_down(&mut self, point: TouchPoint, baseline: GestureBaseline) {
        self.active = Some(ActiveGesture {
            start: point,
            baseline,
            kind: GestureKind::None,
            moved: false,
            preview_secs: None,
        });
    }

    /// Feed a move sample
    pub fn on_move(&mut self, point: TouchPoint) -> GestureEffect {
        let Some(gesture) = self.active.as_mut() else {
            return GestureEffect::None;
        };

        let dx = point.x - gesture.start.x;
        let dy = point.y - gesture.start.y;

        if gesture.kind == GestureKind::None {
            if dx.abs() <= self.config.classify_threshold
                && dy.abs() <= self.config.classify_threshold
            {
                return GestureEffect::None;
            }
            gesture.moved = true;
            gesture.kind = if dx.abs() > dy.abs() {
                GestureKind::Seek
            } else if gesture.start.x < gesture.baseline.screen_width / 2.0 {
                GestureKind::Brightness
            } else {
                GestureKind::Volume
            };
        }

        match gesture.kind {
            GestureKind::Brightness => {
                let change = -(f64::from(dy) / f64::from(self.config.drag_scale));
                let level = (gesture.baseline.brightness + change).clamp(0.0, 1.0);
                GestureEffect::Brightness { level }
            }
            GestureKind::Volume => {
                let max = gesture.baseline.max_volume;
                if max <= 0 {
                    return GestureEffect::None;
                }
                let change = (-(f64::from(dy) / f64::from(self.config.drag_scale)) * max as f64)
                    .round() as i64;
                let level = (gesture.baseline.volume + change).clamp(0, max);
                GestureEffect::Volume { level, max }
            }
            GestureKind::Seek => {
                let duration = gesture.baseline.duration_secs;
                let width = gesture.baseline.screen_width;
                if duration <= 0.0 || width <= 0.0 {
                    return GestureEffect::None;
                }
                let change = (f64::from(dx) / f64::from(width)) * self.config.seek_window_secs;
                let position = (gesture.baseline.position_secs + change).clamp(0.0, duration);
                gesture.preview_secs = Some(position);
                GestureEffect::SeekPreview {
                    position_secs: position,
                }
            }
            GestureKind::None => GestureEffect::None,
        }
    }

    /// End the touch sequence (up or cancel)
    pub fn on_up(&mut self) -> GestureEffect {
        let Some(gesture) = self.active.take() else {
            return GestureEffect::None;
        };

        if !gesture.moved {
            return GestureEffect::Tap;
        }

        match (gesture.kind, gesture.preview_secs) {
            (GestureKind::Seek, Some(position_secs)) => GestureEffect::SeekCommit { position_secs },
            _ => GestureEffect::Released,
        }
    }
}

impl Default for GestureInterpreter {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

/// A [`SystemSurface`] backed by plain in-process state, for headless
/// embeddings and tests.
#[derive(Debug)]
pub struct HeadlessSurface {
    brightness: std::sync::Mutex<f64>,
    volume: std::sync::Mutex<i64>,
    max_volume: i64,
    screen_width: f32,
}

impl HeadlessSurface {
    pub fn new(max_volume: i64, screen_width: f32) -> Self {
        Self {
            brightness: std::sync::Mutex::new(0.5),
            volume: std::sync::Mutex::new(max_volume / 2),
            max_volume,
            screen_width,
        }
    }
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new(15, 1920.0)
    }
}

impl SystemSurface for HeadlessSurface {
    fn brightness(&self) -> f64 {
        *self.brightness.lock().unwrap()
    }

    fn set_brightness(&self, level: f64) {
        *self.brightness.lock().unwrap() = level.clamp(0.0, 1.0);
    }

    fn volume(&self) -> i64 {
        *self.volume.lock().unwrap()
    }

    fn max_volume(&self) -> i64 {
        self.max_volume
    }

    fn set_volume(&self, level: i64) {
        *self.volume.lock().unwrap() = level.clamp(0, self.max_volume);
    }

    fn screen_width(&self) -> f32 {
        self.screen_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> GestureBaseline {
        GestureBaseline {
            brightness: 0.5,
            volume: 8,
            max_volume: 15,
            position_secs: 30.0,
            duration_secs: 120.0,
            screen_width: 1000.0,
        }
    }

    #[test]
    fn test_sub_threshold_drag_is_tap() {
        let mut interp = GestureInterpreter::default();
        interp.on_down(TouchPoint::new(100.0, 100.0), baseline());
        // Wander inside the 20px box in both axes
        for (x, y) in [(110.0, 95.0), (90.0, 110.0), (105.0, 105.0)] {
            assert_eq!(interp.on_move(TouchPoint::new(x, y)), GestureEffect::None);
        }
        assert_eq!(interp.on_up(), GestureEffect::Tap);
        assert_eq!(interp.kind(), GestureKind::None);
    }

    #[test]
    fn test_horizontal_drag_classifies_as_seek() {
        let mut interp = GestureInterpreter::default();
        interp.on_down(TouchPoint::new(100.0, 100.0), baseline());
        let effect = interp.on_move(TouchPoint::new(160.0, 110.0));
        assert!(matches!(effect, GestureEffect::SeekPreview { .. }));
        assert_eq!(interp.kind(), GestureKind::Seek);
    }

    #[test]
    fn test_left_half_vertical_drag_is_brightness() {
        let mut interp = GestureInterpreter::default();
        interp.on_down(TouchPoint::new(200.0, 400.0), baseline());
        let effect = interp.on_move(TouchPoint::new(205.0, 300.0));
        // -100px of vertical drag raises brightness by 100/500 = 0.2
        match effect {
            GestureEffect::Brightness { level } => assert!((level - 0.7).abs() < 1e-9),
            other => panic!("expected brightness, got {other:?}"),
        }
    }

    #[test]
    fn test_right_half_vertical_drag_is_volume() {
        let mut interp = GestureInterpreter::default();
        interp.on_down(TouchPoint::new(800.0, 400.0), baseline());
        let effect = interp.on_move(TouchPoint::new(805.0, 300.0));
        // -100px over 500px scale on a 15-step mixer: +3 steps
        assert_eq!(effect, GestureEffect::Volume { level: 11, max: 15 });
    }

    #[test]
    fn test_classification_is_sticky() {
        let mut interp = GestureInterpreter::default();
        interp.on_down(TouchPoint::new(200.0, 400.0), baseline());
        interp.on_move(TouchPoint::new(205.0, 300.0));
        assert_eq!(interp.kind(), GestureKind::Brightness);
        // A later horizontal-dominant sample must not reclassify
        let effect = interp.on_move(TouchPoint::new(600.0, 390.0));
        assert!(matches!(effect, GestureEffect::Brightness { .. }));
        assert_eq!(interp.kind(), GestureKind::Brightness);
    }

    #[test]
    fn test_seek_half_screen_drag_is_ninety_seconds() {
        let mut interp = GestureInterpreter::default();
        interp.on_down(TouchPoint::new(100.0, 100.0), baseline());
        let effect = interp.on_move(TouchPoint::new(600.0, 100.0));
        // 500px over a 1000px screen: 0.5 * 180 = 90s past the 30s baseline
        assert_eq!(
            effect,
            GestureEffect::SeekPreview {
                position_secs: 120.0
            }
        );
        assert_eq!(
            interp.on_up(),
            GestureEffect::SeekCommit {
                position_secs: 120.0
            }
        );
    }

    #[test]
    fn test_seek_commit_clamped_to_duration() {
        let mut interp = GestureInterpreter::default();
        interp.on_down(TouchPoint::new(0.0, 100.0), baseline());
        // Drag three screen-widths to the right
        interp.on_move(TouchPoint::new(3000.0, 100.0));
        assert_eq!(
            interp.on_up(),
            GestureEffect::SeekCommit {
                position_secs: 120.0
            }
        );

        interp.on_down(TouchPoint::new(900.0, 100.0), baseline());
        interp.on_move(TouchPoint::new(-3000.0, 100.0));
        assert_eq!(
            interp.on_up(),
            GestureEffect::SeekCommit { position_secs: 0.0 }
        );
    }

    #[test]
    fn test_seek_with_zero_duration_is_absorbed() {
        let mut interp = GestureInterpreter::default();
        let zero = GestureBaseline {
            duration_secs: 0.0,
            ..baseline()
        };
        interp.on_down(TouchPoint::new(100.0, 100.0), zero);
        assert_eq!(
            interp.on_move(TouchPoint::new(400.0, 100.0)),
            GestureEffect::None
        );
        // No valid preview was ever produced, so nothing is committed
        assert_eq!(interp.on_up(), GestureEffect::Released);
    }

    #[test]
    fn test_brightness_monotonic_and_clamped() {
        let mut interp = GestureInterpreter::default();
        interp.on_down(TouchPoint::new(100.0, 500.0), baseline());
        let mut last = 0.0;
        for step in 1..=50 {
            let y = 500.0 - step as f32 * 20.0;
            if let GestureEffect::Brightness { level } = interp.on_move(TouchPoint::new(100.0, y)) {
                assert!(level >= last);
                assert!((0.0..=1.0).contains(&level));
                last = level;
            }
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn test_volume_percent_clamped() {
        let mut interp = GestureInterpreter::default();
        interp.on_down(TouchPoint::new(900.0, 100.0), baseline());
        // Huge downward drag pins the mixer to zero
        let effect = interp.on_move(TouchPoint::new(900.0, 5000.0));
        assert_eq!(effect, GestureEffect::Volume { level: 0, max: 15 });
        assert_eq!(effect.indicator_percent(), Some(0));
    }

    #[test]
    fn test_single_commit_per_sequence() {
        let mut interp = GestureInterpreter::default();
        interp.on_down(TouchPoint::new(100.0, 100.0), baseline());
        interp.on_move(TouchPoint::new(300.0, 100.0));
        assert!(matches!(interp.on_up(), GestureEffect::SeekCommit { .. }));
        // The sequence is consumed; a stray second release does nothing
        assert_eq!(interp.on_up(), GestureEffect::None);
    }

    #[test]
    fn test_headless_surface_roundtrip() {
        let surface = HeadlessSurface::new(10, 1280.0);
        surface.set_brightness(1.4);
        assert_eq!(surface.brightness(), 1.0);
        surface.set_volume(25);
        assert_eq!(surface.volume(), 10);
        assert_eq!(surface.screen_width(), 1280.0);
    }
}
