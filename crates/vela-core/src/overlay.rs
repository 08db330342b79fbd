//! Control overlay visibility state machine
//!
//! Two states, Visible and Hidden. The overlay auto-hides after an
//! inactivity window while playback is active; any interaction cancels the
//! pending countdown and reschedules it (the timer is single-shot and never
//! stacks). While paused the overlay never hides. The controller is pure:
//! callers inject `Instant`s, the session drives the countdown with a timer
//! task.

use std::time::{Duration, Instant};

/// Overlay visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    Visible,
    Hidden,
}

/// Tracks overlay visibility and the single-shot auto-hide deadline
#[derive(Debug)]
pub struct OverlayController {
    state: OverlayState,
    auto_hide: Duration,
    deadline: Option<Instant>,
    playing: bool,
}

impl OverlayController {
    /// Starts visible with no countdown scheduled; the session schedules the
    /// first one once playback begins.
    pub fn new(auto_hide: Duration) -> Self {
        Self {
            state: OverlayState::Visible,
            auto_hide,
            deadline: None,
            playing: false,
        }
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state == OverlayState::Visible
    }

    /// Pending auto-hide deadline, if one is scheduled
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// User interaction: show the overlay and restart the countdown.
    ///
    /// The previous deadline is always replaced, never stacked.
    pub fn interact(&mut self, now: Instant) -> OverlayState {
        self.state = OverlayState::Visible;
        self.deadline = Some(now + self.auto_hide);
        self.state
    }

    /// Tap on empty space: toggle visibility
    pub fn toggle(&mut self, now: Instant) -> OverlayState {
        match self.state {
            OverlayState::Visible => {
                self.state = OverlayState::Hidden;
                self.deadline = None;
            }
            OverlayState::Hidden => {
                self.state = OverlayState::Visible;
                self.deadline = Some(now + self.auto_hide);
            }
        }
        self.state
    }

    /// Playback activity gate: the countdown only runs while playing
    pub fn set_playing(&mut self, playing: bool, now: Instant) {
        self.playing = playing;
        if playing {
            if self.state == OverlayState::Visible && self.deadline.is_none() {
                self.deadline = Some(now + self.auto_hide);
            }
        } else {
            self.deadline = None;
        }
    }

    /// Timer callback. Hides the overlay if the deadline passed while
    /// playing; returns whether a transition happened.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline && self.playing && self.is_visible() => {
                self.state = OverlayState::Hidden;
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AUTO_HIDE: Duration = Duration::from_millis(4000);

    fn playing_controller(now: Instant) -> OverlayController {
        let mut overlay = OverlayController::new(AUTO_HIDE);
        overlay.set_playing(true, now);
        overlay
    }

    #[test]
    fn test_starts_visible() {
        let overlay = OverlayController::new(AUTO_HIDE);
        assert!(overlay.is_visible());
        assert!(overlay.deadline().is_none());
    }

    #[test]
    fn test_hides_after_inactivity_while_playing() {
        let start = Instant::now();
        let mut overlay = playing_controller(start);

        assert!(!overlay.fire(start + Duration::from_millis(3999)));
        assert!(overlay.is_visible());

        assert!(overlay.fire(start + Duration::from_millis(4000)));
        assert_eq!(overlay.state(), OverlayState::Hidden);
        assert!(overlay.deadline().is_none());
    }

    #[test]
    fn test_interaction_resets_countdown() {
        let start = Instant::now();
        let mut overlay = playing_controller(start);

        // Interact 3s in: the countdown restarts from that moment
        let touched = start + Duration::from_millis(3000);
        overlay.interact(touched);
        assert!(!overlay.fire(start + Duration::from_millis(4000)));
        assert!(overlay.is_visible());
        assert!(overlay.fire(touched + AUTO_HIDE));
        assert_eq!(overlay.state(), OverlayState::Hidden);
    }

    #[test]
    fn test_never_hides_while_paused() {
        let start = Instant::now();
        let mut overlay = playing_controller(start);

        overlay.set_playing(false, start + Duration::from_millis(1000));
        assert!(!overlay.fire(start + Duration::from_secs(60)));
        assert!(overlay.is_visible());

        // Resuming schedules a fresh countdown
        let resumed = start + Duration::from_secs(61);
        overlay.set_playing(true, resumed);
        assert!(overlay.fire(resumed + AUTO_HIDE));
    }

    #[test]
    fn test_toggle_while_hidden_shows_and_schedules() {
        let start = Instant::now();
        let mut overlay = playing_controller(start);
        overlay.fire(start + AUTO_HIDE);
        assert_eq!(overlay.state(), OverlayState::Hidden);

        let tapped = start + Duration::from_secs(10);
        assert_eq!(overlay.toggle(tapped), OverlayState::Visible);
        assert_eq!(overlay.deadline(), Some(tapped + AUTO_HIDE));
    }

    #[test]
    fn test_toggle_while_visible_hides_and_cancels() {
        let start = Instant::now();
        let mut overlay = playing_controller(start);

        assert_eq!(overlay.toggle(start), OverlayState::Hidden);
        assert!(overlay.deadline().is_none());
        // A stale deadline firing later must not flip anything back
        assert!(!overlay.fire(start + AUTO_HIDE));
    }

    #[test]
    fn test_interactions_replace_deadline() {
        let start = Instant::now();
        let mut overlay = playing_controller(start);

        for i in 1..=5 {
            overlay.interact(start + Duration::from_millis(i * 500));
        }
        let last = start + Duration::from_millis(2500);
        assert_eq!(overlay.deadline(), Some(last + AUTO_HIDE));

        // Only the final deadline fires
        assert!(!overlay.fire(last + Duration::from_millis(3999)));
        assert!(overlay.fire(last + AUTO_HIDE));
    }
}
