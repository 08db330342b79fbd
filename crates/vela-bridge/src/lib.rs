//! Vela Bridge - host UI boundary
//!
//! Serves the player to a host UI toolkit over a request/reply channel:
//! the host sends [`BridgeRequest`]s and awaits a [`BridgeReply`] per
//! request, while [`BridgeNotification`]s flow back asynchronously
//! (session ready, fatal errors). At most one session is live at a time;
//! disposing it returns the final position/duration to the caller.

pub mod protocol;
pub mod window;

pub use protocol::{BridgeNotification, BridgeReply, BridgeRequest};
pub use window::WindowChrome;

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};
use vela_core::{
    Error, MediaSource, PlaybackAdapter, PlayerSession, SessionConfig, SystemSurface,
};

/// Creates one engine adapter per session
pub type AdapterFactory =
    Box<dyn Fn() -> vela_core::Result<Arc<dyn PlaybackAdapter>> + Send + Sync>;

/// A request paired with its reply slot
pub type BridgeEnvelope = (BridgeRequest, oneshot::Sender<BridgeReply>);

/// Dispatches host requests onto at most one live [`PlayerSession`]
pub struct PlayerBridge {
    factory: AdapterFactory,
    surface: Arc<dyn SystemSurface>,
    config: SessionConfig,
    session: Option<PlayerSession>,
    notifications: mpsc::UnboundedSender<BridgeNotification>,
}

impl PlayerBridge {
    /// Returns the bridge and the notification stream the host listens on
    pub fn new(
        factory: AdapterFactory,
        surface: Arc<dyn SystemSurface>,
        config: SessionConfig,
    ) -> (Self, mpsc::UnboundedReceiver<BridgeNotification>) {
        let (notifications, notifications_rx) = mpsc::unbounded_channel();
        (
            Self {
                factory,
                surface,
                config,
                session: None,
                notifications,
            },
            notifications_rx,
        )
    }

    /// The live session, if any
    pub fn session(&self) -> Option<&PlayerSession> {
        self.session.as_ref()
    }

    /// Serve a request channel until the host hangs up; any live session is
    /// closed on the way out.
    pub async fn serve(mut self, mut requests: mpsc::Receiver<BridgeEnvelope>) {
        while let Some((request, reply_tx)) = requests.recv().await {
            let reply = self.handle(request).await;
            let _ = reply_tx.send(reply);
        }
        if let Some(session) = self.session.take() {
            session.close().await;
        }
    }

    /// Handle a single request
    pub async fn handle(&mut self, request: BridgeRequest) -> BridgeReply {
        match request {
            BridgeRequest::Initialize {
                url,
                title,
                http_headers,
                subtitles,
            } => {
                self.initialize(MediaSource {
                    url,
                    title,
                    http_headers,
                    subtitles,
                })
                .await
            }
            BridgeRequest::Play => match &self.session {
                Some(session) => result_reply(session.play().await),
                None => no_session(),
            },
            BridgeRequest::Pause => match &self.session {
                Some(session) => result_reply(session.pause().await),
                None => no_session(),
            },
            BridgeRequest::Seek { position_ms } => match &self.session {
                Some(session) => result_reply(session.seek(position_ms as f64 / 1000.0).await),
                None => no_session(),
            },
            BridgeRequest::GetPosition => match &self.session {
                Some(session) => BridgeReply::Position {
                    position_ms: session.position_ms(),
                },
                None => no_session(),
            },
            BridgeRequest::GetDuration => match &self.session {
                Some(session) => BridgeReply::Duration {
                    duration_ms: session.duration_ms(),
                },
                None => no_session(),
            },
            BridgeRequest::SetVolume { volume } => match &self.session {
                Some(session) => result_reply(session.set_volume(volume).await),
                None => no_session(),
            },
            BridgeRequest::SetSpeed { speed } => match &self.session {
                Some(session) => result_reply(session.set_speed(speed).await),
                None => no_session(),
            },
            BridgeRequest::LoadSubtitle { url } => match &self.session {
                Some(session) => {
                    let title = url.rsplit('/').next().unwrap_or("external").to_string();
                    result_reply(session.load_external_subtitle(&url, &title).await)
                }
                None => no_session(),
            },
            BridgeRequest::SetSubtitle { index } => match &self.session {
                Some(session) => {
                    session.select_subtitle(index).await;
                    BridgeReply::Ok
                }
                None => no_session(),
            },
            BridgeRequest::Dispose => match self.session.take() {
                Some(session) => {
                    let summary = session.close().await;
                    BridgeReply::Summary {
                        position_ms: summary.position_ms,
                        duration_ms: summary.duration_ms,
                    }
                }
                None => no_session(),
            },
        }
    }

    async fn initialize(&mut self, source: MediaSource) -> BridgeReply {
        // A second initialize replaces the live session
        if let Some(old) = self.session.take() {
            warn!("initialize over a live session; closing the old one");
            old.close().await;
        }

        let adapter = match (self.factory)() {
            Ok(adapter) => adapter,
            Err(err) => {
                self.notify_fatal(&err);
                return reply_error(&err);
            }
        };

        match PlayerSession::open(source, self.config.clone(), adapter, self.surface.clone()).await
        {
            Ok(session) => {
                info!(session_id = %session.id(), "session opened");
                self.session = Some(session);
                let _ = self.notifications.send(BridgeNotification::Ready);
                BridgeReply::Ok
            }
            Err(err) => {
                self.notify_fatal(&err);
                reply_error(&err)
            }
        }
    }

    fn notify_fatal(&self, err: &Error) {
        if err.is_fatal() {
            let _ = self.notifications.send(BridgeNotification::Error {
                message: err.to_string(),
            });
        }
    }
}

fn no_session() -> BridgeReply {
    reply_error(&Error::EngineUnavailable)
}

fn reply_error(err: &Error) -> BridgeReply {
    BridgeReply::Error {
        code: err.error_code().to_string(),
        message: err.to_string(),
    }
}

fn result_reply(result: vela_core::Result<()>) -> BridgeReply {
    match result {
        Ok(()) => BridgeReply::Ok,
        Err(err) => reply_error(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use vela_core::engine::{prop, EngineEvents};
    use vela_core::gesture::HeadlessSurface;
    use vela_core::PropertyValue;

    /// Minimal scripted engine: a property map plus a command log
    struct StubAdapter {
        props: Mutex<HashMap<String, PropertyValue>>,
        commands: Mutex<Vec<String>>,
        events_rx: Mutex<Option<EngineEvents>>,
    }

    impl StubAdapter {
        fn ready(duration_secs: f64) -> Arc<Self> {
            // The sender is dropped here; the session just sees an event
            // stream that never fires.
            let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
            let stub = Arc::new(Self {
                props: Mutex::new(HashMap::new()),
                commands: Mutex::new(Vec::new()),
                events_rx: Mutex::new(Some(rx)),
            });
            stub.set(prop::ENGINE_VERSION, "stub 0.1".into());
            stub.set(prop::TIME_POS, PropertyValue::Double(12.0));
            stub.set(prop::DURATION, PropertyValue::Double(duration_secs));
            stub
        }

        fn set(&self, name: &str, value: PropertyValue) {
            self.props.lock().unwrap().insert(name.to_string(), value);
        }
    }

    impl PlaybackAdapter for StubAdapter {
        fn command(&self, name: &str, _args: &[&str]) -> vela_core::Result<()> {
            self.commands.lock().unwrap().push(name.to_string());
            Ok(())
        }

        fn set_property(&self, name: &str, value: PropertyValue) -> vela_core::Result<()> {
            self.set(name, value);
            Ok(())
        }

        fn get_property(&self, name: &str) -> vela_core::Result<PropertyValue> {
            self.props
                .lock()
                .unwrap()
                .get(name)
                .cloned()
                .ok_or_else(|| Error::PropertyRead {
                    name: name.to_string(),
                })
        }

        fn take_events(&self) -> Option<EngineEvents> {
            self.events_rx.lock().unwrap().take()
        }
    }

    fn bridge_over(stub: Arc<StubAdapter>) -> (PlayerBridge, mpsc::UnboundedReceiver<BridgeNotification>) {
        let factory: AdapterFactory =
            Box::new(move || Ok(stub.clone() as Arc<dyn PlaybackAdapter>));
        PlayerBridge::new(
            factory,
            Arc::new(HeadlessSurface::default()),
            SessionConfig::default(),
        )
    }

    fn unavailable_bridge() -> (PlayerBridge, mpsc::UnboundedReceiver<BridgeNotification>) {
        let factory: AdapterFactory = Box::new(|| Err(Error::EngineUnavailable));
        PlayerBridge::new(
            factory,
            Arc::new(HeadlessSurface::default()),
            SessionConfig::default(),
        )
    }

    fn initialize_request() -> BridgeRequest {
        BridgeRequest::Initialize {
            url: "https://example.com/a.mkv".into(),
            title: "A".into(),
            http_headers: HashMap::new(),
            subtitles: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_commands_without_session_report_engine_unavailable() {
        let (mut bridge, _notifications) = bridge_over(StubAdapter::ready(120.0));
        for request in [
            BridgeRequest::Play,
            BridgeRequest::GetPosition,
            BridgeRequest::Dispose,
        ] {
            match bridge.handle(request).await {
                BridgeReply::Error { code, .. } => assert_eq!(code, "ENGINE_UNAVAILABLE"),
                other => panic!("expected error, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_initialize_then_dispose_returns_summary() {
        let stub = StubAdapter::ready(120.0);
        let (mut bridge, mut notifications) = bridge_over(stub.clone());

        assert_eq!(bridge.handle(initialize_request()).await, BridgeReply::Ok);
        assert_eq!(notifications.recv().await, Some(BridgeNotification::Ready));
        assert!(bridge.session().is_some());

        let reply = bridge.handle(BridgeRequest::Dispose).await;
        assert_eq!(
            reply,
            BridgeReply::Summary {
                position_ms: 12000,
                duration_ms: 120000,
            }
        );
        assert!(bridge.session().is_none());
        assert!(stub.commands.lock().unwrap().contains(&"stop".to_string()));
    }

    #[tokio::test]
    async fn test_position_and_duration_queries() {
        let (mut bridge, _notifications) = bridge_over(StubAdapter::ready(90.0));
        bridge.handle(initialize_request()).await;

        assert_eq!(
            bridge.handle(BridgeRequest::GetPosition).await,
            BridgeReply::Position { position_ms: 12000 }
        );
        assert_eq!(
            bridge.handle(BridgeRequest::GetDuration).await,
            BridgeReply::Duration { duration_ms: 90000 }
        );
    }

    #[tokio::test]
    async fn test_factory_failure_is_structured_error() {
        let (mut bridge, _notifications) = unavailable_bridge();
        match bridge.handle(initialize_request()).await {
            BridgeReply::Error { code, .. } => assert_eq!(code, "ENGINE_UNAVAILABLE"),
            other => panic!("expected error, got {other:?}"),
        }
        assert!(bridge.session().is_none());
    }

    #[tokio::test]
    async fn test_fatal_open_error_notifies_host() {
        // An adapter that never answers the version probe is a missing engine
        let (_tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let dead = Arc::new(StubAdapter {
            props: Mutex::new(HashMap::new()),
            commands: Mutex::new(Vec::new()),
            events_rx: Mutex::new(Some(rx)),
        });
        let (mut bridge, mut notifications) = bridge_over(dead);

        match bridge.handle(initialize_request()).await {
            BridgeReply::Error { code, .. } => assert_eq!(code, "NATIVE_LIBRARY"),
            other => panic!("expected error, got {other:?}"),
        }
        assert!(matches!(
            notifications.recv().await,
            Some(BridgeNotification::Error { .. })
        ));
    }

    #[tokio::test]
    async fn test_serve_channel_round_trip() {
        let (bridge, _notifications) = bridge_over(StubAdapter::ready(60.0));
        let (request_tx, request_rx) = mpsc::channel::<BridgeEnvelope>(8);
        let server = tokio::spawn(bridge.serve(request_rx));

        let (reply_tx, reply_rx) = oneshot::channel();
        request_tx.send((initialize_request(), reply_tx)).await.unwrap();
        assert_eq!(reply_rx.await.unwrap(), BridgeReply::Ok);

        let (reply_tx, reply_rx) = oneshot::channel();
        request_tx
            .send((BridgeRequest::Seek { position_ms: 30000 }, reply_tx))
            .await
            .unwrap();
        assert_eq!(reply_rx.await.unwrap(), BridgeReply::Ok);

        drop(request_tx);
        server.await.unwrap();
    }
}
