//! Player session - scoped handle for one full-screen playback
//!
//! Coordinates:
//! - engine load and handshake
//! - gesture interpretation and the control overlay
//! - the telemetry poller and auto-hide timer tasks
//! - subtitle selection off engine events
//! - ordered teardown with final position/duration reporting
//!
//! The session is acquired on screen entry and released on screen exit;
//! nothing here relies on ambient global engine lifecycle.

use crate::{
    engine::{cmd, prop, EngineEvent, PlaybackAdapter, PropertyValue},
    gesture::{
        GestureBaseline, GestureEffect, GestureInterpreter, SystemSurface, TouchPhase, TouchPoint,
    },
    overlay::{OverlayController, OverlayState},
    telemetry::{self, TelemetrySnapshot, ThroughputEstimator},
    tracks::TrackSelector,
    types::{MediaSource, PlayerState, SessionConfig, SessionId, SessionSummary},
    Error, Result,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Player session managing a single playback screen
pub struct PlayerSession {
    /// Unique session ID
    id: SessionId,
    /// Playback engine boundary
    adapter: Arc<dyn PlaybackAdapter>,
    /// Host brightness/volume controls
    surface: Arc<dyn SystemSurface>,
    /// Current player state
    state: Arc<RwLock<PlayerState>>,
    /// State change broadcaster
    state_tx: Arc<watch::Sender<PlayerState>>,
    /// Control overlay state machine
    overlay: Arc<RwLock<OverlayController>>,
    /// Overlay visibility broadcaster
    overlay_tx: Arc<watch::Sender<OverlayState>>,
    /// Auto-hide deadline feed for the timer task
    deadline_tx: Arc<watch::Sender<Option<Instant>>>,
    /// Telemetry broadcaster
    telemetry_tx: Arc<watch::Sender<TelemetrySnapshot>>,
    /// Gesture interpreter for the touch surface
    gesture: Mutex<GestureInterpreter>,
    /// Subtitle track selection
    tracks: Arc<Mutex<TrackSelector>>,
    /// Current playback speed factor
    speed: Arc<RwLock<f64>>,
    /// Set once the engine reports file-loaded
    loaded: Arc<AtomicBool>,
    poll_task: Option<JoinHandle<()>>,
    hide_task: Option<JoinHandle<()>>,
    event_task: Option<JoinHandle<()>>,
}

impl PlayerSession {
    /// Open a session: handshake the engine, issue the load, and start the
    /// background tasks.
    ///
    /// Fails fatally when the engine does not answer the version probe or
    /// rejects the load command; the caller closes the screen in that case.
    #[instrument(skip_all, fields(url = %source.url))]
    pub async fn open(
        source: MediaSource,
        config: SessionConfig,
        adapter: Arc<dyn PlaybackAdapter>,
        surface: Arc<dyn SystemSurface>,
    ) -> Result<Self> {
        let id = SessionId::new();

        let version = adapter
            .get_property(prop::ENGINE_VERSION)
            .map_err(|err| Error::NativeLibrary(format!("engine version probe failed: {err}")))?;
        info!(session_id = %id, version = %version, "playback engine ready");

        let events = adapter
            .take_events()
            .ok_or_else(|| Error::Internal("engine event stream already taken".to_string()))?;

        // Headers apply to http(s) sources only
        if !source.http_headers.is_empty() && has_http_scheme(&source.url) {
            let mut pairs: Vec<String> = source
                .http_headers
                .iter()
                .map(|(name, value)| format!("{name}: {value}"))
                .collect();
            pairs.sort();
            if let Err(err) = adapter.set_property(prop::HTTP_HEADERS, pairs.join(",").into()) {
                warn!(%err, "failed to set HTTP headers");
            }
        }

        adapter.command(cmd::LOADFILE, &[&source.url])?;
        adapter.set_property(prop::PAUSE, PropertyValue::Flag(config.start_paused))?;

        let state = Arc::new(RwLock::new(PlayerState::Loading));
        let state_tx = Arc::new(watch::channel(PlayerState::Loading).0);

        let mut controller = OverlayController::new(Duration::from_millis(config.auto_hide_ms));
        controller.set_playing(!config.start_paused, Instant::now());
        let first_deadline = controller.deadline();
        let overlay = Arc::new(RwLock::new(controller));
        let overlay_tx = Arc::new(watch::channel(OverlayState::Visible).0);
        let deadline_tx = Arc::new(watch::channel(first_deadline).0);

        let telemetry_tx = Arc::new(watch::channel(TelemetrySnapshot::default()).0);
        let speed = Arc::new(RwLock::new(1.0));
        let loaded = Arc::new(AtomicBool::new(false));
        let tracks = Arc::new(Mutex::new(TrackSelector::new(
            config.subtitles.clone(),
            source.subtitles.clone(),
        )));

        let event_task = spawn_event_consumer(
            events,
            adapter.clone(),
            tracks.clone(),
            state.clone(),
            state_tx.clone(),
            overlay.clone(),
            overlay_tx.clone(),
            deadline_tx.clone(),
            loaded.clone(),
            config.start_paused,
        );
        let poll_task = spawn_poller(
            adapter.clone(),
            telemetry_tx.clone(),
            speed.clone(),
            loaded.clone(),
            Duration::from_millis(config.poll_interval_ms.max(1)),
        );
        let hide_task = spawn_auto_hide(overlay.clone(), overlay_tx.clone(), deadline_tx.subscribe());

        Ok(Self {
            id,
            adapter,
            surface,
            state,
            state_tx,
            overlay,
            overlay_tx,
            deadline_tx,
            telemetry_tx,
            gesture: Mutex::new(GestureInterpreter::new(config.gesture.clone())),
            tracks,
            speed,
            loaded,
            poll_task: Some(poll_task),
            hide_task: Some(hide_task),
            event_task: Some(event_task),
        })
    }

    /// Get session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Get current state
    pub async fn state(&self) -> PlayerState {
        *self.state.read().await
    }

    /// Subscribe to state changes
    pub fn subscribe_state(&self) -> watch::Receiver<PlayerState> {
        self.state_tx.subscribe()
    }

    /// Subscribe to overlay visibility changes
    pub fn subscribe_overlay(&self) -> watch::Receiver<OverlayState> {
        self.overlay_tx.subscribe()
    }

    /// Subscribe to telemetry refreshes
    pub fn subscribe_telemetry(&self) -> watch::Receiver<TelemetrySnapshot> {
        self.telemetry_tx.subscribe()
    }

    pub async fn overlay_visible(&self) -> bool {
        self.overlay.read().await.is_visible()
    }

    /// True once the engine has reported file-loaded
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Advisory playback position in milliseconds
    pub fn position_ms(&self) -> i64 {
        to_ms(self.adapter.read_f64(prop::TIME_POS))
    }

    /// Advisory media duration in milliseconds
    pub fn duration_ms(&self) -> i64 {
        to_ms(self.adapter.read_f64(prop::DURATION))
    }

    pub async fn speed(&self) -> f64 {
        *self.speed.read().await
    }

    async fn set_state(&self, target: PlayerState) -> Result<()> {
        let current = *self.state.read().await;
        if current == target {
            return Ok(());
        }
        if !current.can_transition_to(target) {
            return Err(Error::InvalidStateTransition {
                from: current.to_string(),
                to: target.to_string(),
            });
        }
        *self.state.write().await = target;
        let _ = self.state_tx.send(target);
        info!(from = %current, to = %target, "state transition");
        Ok(())
    }

    /// Mutates the overlay and broadcasts visibility plus the new deadline
    async fn sync_overlay<F>(&self, mutate: F) -> OverlayState
    where
        F: FnOnce(&mut OverlayController, Instant),
    {
        let mut controller = self.overlay.write().await;
        mutate(&mut controller, Instant::now());
        let state = controller.state();
        let deadline = controller.deadline();
        drop(controller);
        let _ = self.overlay_tx.send(state);
        let _ = self.deadline_tx.send(deadline);
        state
    }

    /// User interaction outside a gesture (seek-bar release, button press):
    /// shows the overlay and restarts the auto-hide countdown
    pub async fn interact(&self) {
        self.sync_overlay(|overlay, now| {
            overlay.interact(now);
        })
        .await;
    }

    /// Start playback
    #[instrument(skip(self))]
    pub async fn play(&self) -> Result<()> {
        self.adapter
            .set_property(prop::PAUSE, PropertyValue::Flag(false))?;
        self.set_state(PlayerState::Playing).await?;
        self.sync_overlay(|overlay, now| overlay.set_playing(true, now))
            .await;
        Ok(())
    }

    /// Pause playback
    #[instrument(skip(self))]
    pub async fn pause(&self) -> Result<()> {
        self.adapter
            .set_property(prop::PAUSE, PropertyValue::Flag(true))?;
        let current = *self.state.read().await;
        if matches!(current, PlayerState::Playing | PlayerState::Loading) {
            self.set_state(PlayerState::Paused).await?;
        }
        self.sync_overlay(|overlay, now| overlay.set_playing(false, now))
            .await;
        Ok(())
    }

    /// Toggle play/pause; returns whether playback is now running
    pub async fn toggle_play(&self) -> Result<bool> {
        let playing = *self.state.read().await == PlayerState::Playing;
        if playing {
            self.pause().await?;
        } else {
            self.play().await?;
        }
        Ok(!playing)
    }

    /// Seek to an absolute position, clamped to `[0, duration]`
    #[instrument(skip(self))]
    pub async fn seek(&self, position_secs: f64) -> Result<()> {
        let duration = self.adapter.read_f64(prop::DURATION).unwrap_or(0.0);
        let clamped = if duration > 0.0 {
            position_secs.clamp(0.0, duration)
        } else {
            position_secs.max(0.0)
        };
        self.adapter
            .command(cmd::SEEK, &[&format!("{clamped:.3}"), "absolute"])?;
        info!(position = clamped, "seek");
        self.interact().await;
        Ok(())
    }

    /// Seek relative to the current position (the +-10s buttons)
    pub async fn seek_by(&self, delta_secs: f64) -> Result<()> {
        let position = self.adapter.read_f64(prop::TIME_POS).unwrap_or(0.0);
        self.seek(position + delta_secs).await
    }

    /// Set the playback speed factor
    pub async fn set_speed(&self, factor: f64) -> Result<()> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "playback speed must be positive, got {factor}"
            )));
        }
        self.adapter
            .set_property(prop::SPEED, PropertyValue::Double(factor))?;
        *self.speed.write().await = factor;
        self.interact().await;
        Ok(())
    }

    /// Set the engine output volume, clamped to `[0, 100]`
    pub async fn set_volume(&self, volume: f64) -> Result<()> {
        self.adapter
            .set_property(prop::VOLUME, PropertyValue::Double(volume.clamp(0.0, 100.0)))
    }

    /// Feed one touch sample from the video surface.
    ///
    /// Side effects (brightness, volume, the single committed seek, overlay
    /// toggling) are applied here; the returned effect carries what the
    /// gesture indicator should render.
    pub async fn touch(&self, phase: TouchPhase, point: TouchPoint) -> GestureEffect {
        match phase {
            TouchPhase::Down => {
                let baseline = GestureBaseline {
                    brightness: self.surface.brightness(),
                    volume: self.surface.volume(),
                    max_volume: self.surface.max_volume(),
                    position_secs: self.adapter.read_f64(prop::TIME_POS).unwrap_or(0.0),
                    duration_secs: self.adapter.read_f64(prop::DURATION).unwrap_or(0.0),
                    screen_width: self.surface.screen_width(),
                };
                self.gesture.lock().await.on_down(point, baseline);
                GestureEffect::None
            }
            TouchPhase::Move => {
                let effect = self.gesture.lock().await.on_move(point);
                self.apply_effect(effect).await;
                effect
            }
            TouchPhase::Up | TouchPhase::Cancel => {
                let effect = self.gesture.lock().await.on_up();
                self.apply_effect(effect).await;
                effect
            }
        }
    }

    async fn apply_effect(&self, effect: GestureEffect) {
        match effect {
            GestureEffect::None | GestureEffect::SeekPreview { .. } => {}
            GestureEffect::Tap => {
                let state = self
                    .sync_overlay(|overlay, now| {
                        overlay.toggle(now);
                    })
                    .await;
                debug!(overlay = ?state, "overlay toggled");
            }
            GestureEffect::Brightness { level } => self.surface.set_brightness(level),
            GestureEffect::Volume { level, .. } => self.surface.set_volume(level),
            GestureEffect::SeekCommit { position_secs } => {
                self.adapter
                    .try_command(cmd::SEEK, &[&format!("{position_secs:.3}"), "absolute"]);
                self.interact().await;
            }
            GestureEffect::Released => self.interact().await,
        }
    }

    /// Subtitle menu entries: a leading "Off" plus every reported track
    pub async fn subtitle_menu(&self) -> Vec<(i64, String)> {
        self.tracks.lock().await.menu(self.adapter.as_ref())
    }

    /// Apply a subtitle menu selection
    pub async fn select_subtitle(&self, id: i64) {
        self.tracks.lock().await.select(self.adapter.as_ref(), id);
        self.interact().await;
    }

    pub async fn selected_subtitle(&self) -> Option<i64> {
        self.tracks.lock().await.selected()
    }

    /// Load one more external subtitle and activate it
    pub async fn load_external_subtitle(&self, url: &str, title: &str) -> Result<()> {
        self.tracks
            .lock()
            .await
            .load_external(self.adapter.as_ref(), url, title)
    }

    pub async fn subtitle_encoding(&self) -> String {
        self.tracks
            .lock()
            .await
            .current_encoding(self.adapter.as_ref())
    }

    /// Reapply the subtitle codepage and force a reload (fire-and-forget)
    pub async fn apply_subtitle_encoding(&self, codepage: &str) {
        self.tracks
            .lock()
            .await
            .apply_encoding(self.adapter.as_ref(), codepage);
    }

    /// Tears the session down and reports the final playback figures.
    ///
    /// Order matters: cancel the telemetry poller, cancel the auto-hide
    /// timer, detach from engine events, then tell the engine to pause and
    /// stop. The adapter instance is released when `self` drops.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn close(mut self) -> SessionSummary {
        let summary = SessionSummary {
            position_ms: self.position_ms(),
            duration_ms: self.duration_ms(),
        };

        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
        if let Some(task) = self.hide_task.take() {
            task.abort();
        }
        if let Some(task) = self.event_task.take() {
            task.abort();
        }

        self.adapter.try_set(prop::PAUSE, PropertyValue::Flag(true));
        self.adapter.try_command(cmd::STOP, &[]);

        info!(
            position_ms = summary.position_ms,
            duration_ms = summary.duration_ms,
            "session closed"
        );
        summary
    }
}

impl Drop for PlayerSession {
    fn drop(&mut self) {
        for task in [
            self.poll_task.take(),
            self.hide_task.take(),
            self.event_task.take(),
        ]
        .into_iter()
        .flatten()
        {
            task.abort();
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn spawn_event_consumer(
    mut events: crate::engine::EngineEvents,
    adapter: Arc<dyn PlaybackAdapter>,
    tracks: Arc<Mutex<TrackSelector>>,
    state: Arc<RwLock<PlayerState>>,
    state_tx: Arc<watch::Sender<PlayerState>>,
    overlay: Arc<RwLock<OverlayController>>,
    overlay_tx: Arc<watch::Sender<OverlayState>>,
    deadline_tx: Arc<watch::Sender<Option<Instant>>>,
    loaded: Arc<AtomicBool>,
    start_paused: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                EngineEvent::FileLoaded => {
                    loaded.store(true, Ordering::Release);
                    let ran = tracks.lock().await.on_file_loaded(adapter.as_ref());
                    if ran {
                        let target = if start_paused {
                            PlayerState::Paused
                        } else {
                            PlayerState::Playing
                        };
                        transition(&state, &state_tx, target).await;
                    }
                }
                EngineEvent::EndOfFile => {
                    info!("engine reported end of file");
                    transition(&state, &state_tx, PlayerState::Ended).await;
                    let mut controller = overlay.write().await;
                    let now = Instant::now();
                    controller.interact(now);
                    controller.set_playing(false, now);
                    let visibility = controller.state();
                    let deadline = controller.deadline();
                    drop(controller);
                    let _ = overlay_tx.send(visibility);
                    let _ = deadline_tx.send(deadline);
                }
                EngineEvent::PropertyChanged { name, value } => {
                    debug!(property = %name, value = %value, "engine property changed");
                }
            }
        }
        debug!("engine event stream closed");
    })
}

fn spawn_poller(
    adapter: Arc<dyn PlaybackAdapter>,
    telemetry_tx: Arc<watch::Sender<TelemetrySnapshot>>,
    speed: Arc<RwLock<f64>>,
    loaded: Arc<AtomicBool>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        let mut estimator = ThroughputEstimator::new();
        loop {
            ticker.tick().await;
            let position = adapter.read_f64(prop::TIME_POS);
            let duration = adapter.read_f64(prop::DURATION);
            let cache_ahead = adapter.read_f64(prop::CACHE_AHEAD);
            let speed_label = estimator
                .sample(cache_ahead, loaded.load(Ordering::Acquire), Instant::now())
                .to_string();
            let snapshot =
                telemetry::snapshot(position, duration, &speed_label, *speed.read().await);
            let _ = telemetry_tx.send(snapshot);
        }
    })
}

fn spawn_auto_hide(
    overlay: Arc<RwLock<OverlayController>>,
    overlay_tx: Arc<watch::Sender<OverlayState>>,
    mut deadline_rx: watch::Receiver<Option<Instant>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let target = *deadline_rx.borrow_and_update();
            match target {
                Some(at) => {
                    tokio::select! {
                        _ = tokio::time::sleep_until(tokio::time::Instant::from_std(at)) => {
                            let hidden = {
                                let mut controller = overlay.write().await;
                                controller.fire(Instant::now()).then(|| controller.state())
                            };
                            if let Some(state) = hidden {
                                let _ = overlay_tx.send(state);
                            }
                            if deadline_rx.changed().await.is_err() {
                                break;
                            }
                        }
                        changed = deadline_rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                    }
                }
                None => {
                    if deadline_rx.changed().await.is_err() {
                        break;
                    }
                }
            }
        }
    })
}

async fn transition(
    state: &RwLock<PlayerState>,
    state_tx: &watch::Sender<PlayerState>,
    target: PlayerState,
) {
    let current = *state.read().await;
    if current == target {
        return;
    }
    if !current.can_transition_to(target) {
        warn!(from = %current, to = %target, "ignoring invalid state transition");
        return;
    }
    *state.write().await = target;
    let _ = state_tx.send(target);
    info!(from = %current, to = %target, "state transition");
}

fn has_http_scheme(source: &str) -> bool {
    url::Url::parse(source)
        .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
        .unwrap_or(false)
}

fn to_ms(seconds: Option<f64>) -> i64 {
    (seconds.unwrap_or(0.0).max(0.0) * 1000.0) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_scheme_detection() {
        assert!(has_http_scheme("https://example.com/a.mkv"));
        assert!(has_http_scheme("http://example.com/a.mkv"));
        assert!(!has_http_scheme("smb://nas/share/a.mkv"));
        assert!(!has_http_scheme("/local/path/a.mkv"));
    }

    #[test]
    fn test_to_ms() {
        assert_eq!(to_ms(Some(1.5)), 1500);
        assert_eq!(to_ms(Some(-3.0)), 0);
        assert_eq!(to_ms(None), 0);
    }
}
