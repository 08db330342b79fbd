//! Worker-thread adapter over libmpv2
//!
//! One thread owns the `Mpv` handle and its event context. Adapter calls
//! send a request and block on the reply; the same loop drains mpv events
//! into the core's typed stream.

use crate::EngineOptions;
use libmpv2::events::{Event, EventContext, PropertyData};
use libmpv2::{Format, Mpv};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};
use vela_core::{EngineEvent, EngineEvents, Error, PlaybackAdapter, PropertyValue, Result};

/// How long an adapter call waits for the worker before giving up
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

enum EngineRequest {
    Command {
        name: String,
        args: Vec<String>,
        reply: Sender<Result<()>>,
    },
    Set {
        name: String,
        value: PropertyValue,
        reply: Sender<Result<()>>,
    },
    Get {
        name: String,
        reply: Sender<Result<PropertyValue>>,
    },
    Shutdown,
}

/// libmpv-backed playback adapter
pub struct MpvAdapter {
    requests: Sender<EngineRequest>,
    events_rx: Mutex<Option<EngineEvents>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl MpvAdapter {
    /// Spawn the engine worker. Fails with a fatal error when the native
    /// library cannot be initialized.
    pub fn new(options: &EngineOptions) -> Result<Self> {
        let (requests_tx, requests_rx) = channel::<EngineRequest>();
        let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
        let (startup_tx, startup_rx) = channel::<std::result::Result<(), String>>();

        let options = options.clone();
        let worker = thread::Builder::new()
            .name("vela-mpv".to_string())
            .spawn(move || worker_loop(options, requests_rx, events_tx, startup_tx))
            .map_err(|err| Error::Internal(format!("failed to spawn engine thread: {err}")))?;

        match startup_rx.recv_timeout(REPLY_TIMEOUT) {
            Ok(Ok(())) => Ok(Self {
                requests: requests_tx,
                events_rx: Mutex::new(Some(events_rx)),
                worker: Mutex::new(Some(worker)),
            }),
            Ok(Err(message)) => Err(Error::NativeLibrary(message)),
            Err(_) => Err(Error::NativeLibrary(
                "engine worker did not start in time".to_string(),
            )),
        }
    }

    fn request<T>(&self, build: impl FnOnce(Sender<Result<T>>) -> EngineRequest) -> Result<T> {
        let (reply_tx, reply_rx) = channel();
        self.requests
            .send(build(reply_tx))
            .map_err(|_| Error::EngineGone)?;
        reply_rx
            .recv_timeout(REPLY_TIMEOUT)
            .map_err(|_| Error::EngineGone)?
    }
}

impl PlaybackAdapter for MpvAdapter {
    fn command(&self, name: &str, args: &[&str]) -> Result<()> {
        let name = name.to_string();
        let args = args.iter().map(|arg| arg.to_string()).collect();
        self.request(|reply| EngineRequest::Command { name, args, reply })
    }

    fn set_property(&self, name: &str, value: PropertyValue) -> Result<()> {
        let name = name.to_string();
        self.request(|reply| EngineRequest::Set { name, value, reply })
    }

    fn get_property(&self, name: &str) -> Result<PropertyValue> {
        let name = name.to_string();
        self.request(|reply| EngineRequest::Get { name, reply })
    }

    fn take_events(&self) -> Option<EngineEvents> {
        self.events_rx.lock().unwrap().take()
    }
}

impl Drop for MpvAdapter {
    fn drop(&mut self) {
        let _ = self.requests.send(EngineRequest::Shutdown);
        if let Some(worker) = self.worker.lock().unwrap().take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop(
    options: EngineOptions,
    requests: Receiver<EngineRequest>,
    events: tokio::sync::mpsc::UnboundedSender<EngineEvent>,
    startup: Sender<std::result::Result<(), String>>,
) {
    let mpv = match create_mpv(&options) {
        Ok(mpv) => {
            let _ = startup.send(Ok(()));
            mpv
        }
        Err(err) => {
            let _ = startup.send(Err(err.to_string()));
            return;
        }
    };

    let mut event_context = EventContext::new(mpv.ctx);
    if let Err(err) = event_context.disable_deprecated_events() {
        warn!(%err, "failed to disable deprecated mpv events");
    }
    if let Err(err) = event_context.observe_property("pause", Format::Flag, 0) {
        warn!(%err, "failed to observe pause property");
    }

    info!("mpv engine worker started");

    loop {
        match requests.recv_timeout(Duration::from_millis(10)) {
            Ok(EngineRequest::Shutdown) => break,
            Ok(request) => handle_request(&mpv, request),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        // Drain whatever the engine queued since the last pass
        while let Some(event) = event_context.wait_event(0.0) {
            match event {
                Ok(Event::FileLoaded) => {
                    let _ = events.send(EngineEvent::FileLoaded);
                }
                Ok(Event::EndFile(reason)) => {
                    debug!(?reason, "mpv end of file");
                    let _ = events.send(EngineEvent::EndOfFile);
                }
                Ok(Event::PropertyChange { name, change, .. }) => {
                    if let Some(value) = map_property(&change) {
                        let _ = events.send(EngineEvent::PropertyChanged {
                            name: name.to_string(),
                            value,
                        });
                    }
                }
                Ok(Event::Shutdown) => {
                    info!("mpv requested shutdown");
                    return;
                }
                Ok(_) => {}
                Err(err) => debug!(%err, "mpv event wait error"),
            }
        }
    }

    let _ = mpv.command("stop", &[]);
    info!("mpv engine worker stopped");
}

fn create_mpv(options: &EngineOptions) -> std::result::Result<Mpv, libmpv2::Error> {
    let video_output = options.video_output.clone();
    let hwdec = if options.hwdec { "auto" } else { "no" };
    let cache_secs = options.cache_secs;
    let network_timeout = options.network_timeout_secs;
    let sub_codepage = options.sub_codepage.clone();

    Mpv::with_initializer(move |init| {
        init.set_property("vo", video_output.as_str())?;
        init.set_property("hwdec", hwdec)?;
        init.set_property("keep-open", "yes")?;

        init.set_property("sub-visibility", "yes")?;
        init.set_property("sub-auto", "all")?;
        init.set_property("sub-codepage", sub_codepage.as_str())?;

        init.set_property("cache", "yes")?;
        init.set_property("cache-secs", cache_secs)?;
        init.set_property("network-timeout", network_timeout)?;
        Ok(())
    })
}

fn handle_request(mpv: &Mpv, request: EngineRequest) {
    match request {
        EngineRequest::Command { name, args, reply } => {
            let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
            let result = mpv
                .command(&name, &arg_refs)
                .map_err(|err| Error::CommandFailed {
                    name: name.clone(),
                    reason: err.to_string(),
                });
            let _ = reply.send(result);
        }
        EngineRequest::Set { name, value, reply } => {
            let result = write_property(mpv, &name, &value)
                .map_err(|_| Error::PropertyWrite { name: name.clone() });
            let _ = reply.send(result);
        }
        EngineRequest::Get { name, reply } => {
            let result =
                read_property(mpv, &name).map_err(|_| Error::PropertyRead { name: name.clone() });
            let _ = reply.send(result);
        }
        EngineRequest::Shutdown => {}
    }
}

fn write_property(
    mpv: &Mpv,
    name: &str,
    value: &PropertyValue,
) -> std::result::Result<(), libmpv2::Error> {
    match value {
        PropertyValue::Flag(v) => mpv.set_property(name, *v),
        PropertyValue::Int(v) => mpv.set_property(name, *v),
        PropertyValue::Double(v) => mpv.set_property(name, *v),
        PropertyValue::Str(v) => mpv.set_property(name, v.as_str()),
    }
}

/// mpv properties are dynamically typed; probe the numeric formats first,
/// then fall back to a string read.
fn read_property(mpv: &Mpv, name: &str) -> std::result::Result<PropertyValue, libmpv2::Error> {
    if let Ok(value) = mpv.get_property::<f64>(name) {
        return Ok(PropertyValue::Double(value));
    }
    if let Ok(value) = mpv.get_property::<i64>(name) {
        return Ok(PropertyValue::Int(value));
    }
    if let Ok(value) = mpv.get_property::<bool>(name) {
        return Ok(PropertyValue::Flag(value));
    }
    mpv.get_property::<String>(name).map(PropertyValue::Str)
}

fn map_property(change: &PropertyData) -> Option<PropertyValue> {
    match change {
        PropertyData::Flag(value) => Some(PropertyValue::Flag(*value)),
        PropertyData::Int64(value) => Some(PropertyValue::Int(*value)),
        PropertyData::Double(value) => Some(PropertyValue::Double(*value)),
        PropertyData::Str(value) => Some(PropertyValue::Str((*value).to_string())),
        _ => None,
    }
}
