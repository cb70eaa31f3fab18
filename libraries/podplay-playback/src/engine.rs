//! Media engine contract and adapter
//!
//! The media engine (an audio element, a native player, a simulator) is an
//! external collaborator. The core only talks to it through [`MediaEngine`]
//! and receives its events through an [`EngineListener`].

use crate::events::{EngineEvent, PlayerInput};
use crate::types::SessionId;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace};

/// Command surface of an external media engine
///
/// Implementors fire events asynchronously through the listener handed to
/// [`attach`](MediaEngine::attach), at most once per underlying state change.
pub trait MediaEngine: Send {
    /// Assign a new source; rendering stops and the position resets
    fn set_source(&mut self, uri: &str);

    /// Drop the current source
    fn clear_source(&mut self);

    fn play(&mut self);

    fn pause(&mut self);

    /// Current position in seconds
    fn position(&self) -> f64;

    fn set_position(&mut self, seconds: f64);

    /// Duration in seconds; may be NaN or 0 until the source is opened
    fn duration(&self) -> f64;

    /// Whether the source has played to its end
    fn has_ended(&self) -> bool;

    /// Start delivering events to `listener`
    fn attach(&mut self, listener: EngineListener);

    /// Stop delivering events registered for `session`
    fn detach(&mut self, session: SessionId);
}

/// Event sink handed to the engine on attach
///
/// Every event is tagged with the session the listener was registered for.
#[derive(Debug, Clone)]
pub struct EngineListener {
    session: SessionId,
    inputs: UnboundedSender<PlayerInput>,
}

impl EngineListener {
    pub fn new(session: SessionId, inputs: UnboundedSender<PlayerInput>) -> Self {
        Self { session, inputs }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Deliver an event; returns false once the player is gone
    pub fn emit(&self, event: EngineEvent) -> bool {
        self.inputs
            .send(PlayerInput::Engine {
                session: self.session,
                event,
            })
            .is_ok()
    }
}

/// Engine event translated into the state machine's vocabulary
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EngineSignal {
    Ready,
    Started,
    Paused,
    Buffering(bool),
    Ended,
    Failed(String),
}

impl From<EngineEvent> for EngineSignal {
    fn from(event: EngineEvent) -> Self {
        match event {
            EngineEvent::Ready => EngineSignal::Ready,
            EngineEvent::Started => EngineSignal::Started,
            EngineEvent::Paused => EngineSignal::Paused,
            EngineEvent::BufferingStarted => EngineSignal::Buffering(true),
            EngineEvent::BufferingEnded => EngineSignal::Buffering(false),
            EngineEvent::Ended => EngineSignal::Ended,
            EngineEvent::Error { detail } => EngineSignal::Failed(detail),
        }
    }
}

/// Live association between a session and the engine
#[derive(Debug)]
struct EngineBinding {
    session: SessionId,
    location: String,
}

/// Wraps a [`MediaEngine`] and owns the single live binding to it
pub struct MediaEngineAdapter {
    engine: Box<dyn MediaEngine>,
    inputs: UnboundedSender<PlayerInput>,
    binding: Option<EngineBinding>,
}

impl MediaEngineAdapter {
    pub fn new(engine: Box<dyn MediaEngine>, inputs: UnboundedSender<PlayerInput>) -> Self {
        Self {
            engine,
            inputs,
            binding: None,
        }
    }

    /// Session the engine is currently bound to
    pub fn bound_session(&self) -> Option<SessionId> {
        self.binding.as_ref().map(|b| b.session)
    }

    pub fn bound_location(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.location.as_str())
    }

    /// Detach the old listener, assign the source, attach a listener for `session`
    pub(crate) fn rebind(&mut self, session: SessionId, location: &str) {
        self.detach();
        self.engine.set_source(location);
        self.engine
            .attach(EngineListener::new(session, self.inputs.clone()));
        self.binding = Some(EngineBinding {
            session,
            location: location.to_owned(),
        });
        debug!(%session, location, "engine bound");
    }

    /// Detach the listener and clear the engine source
    pub(crate) fn unbind(&mut self) {
        self.detach();
        self.engine.clear_source();
    }

    /// Detach the listener but keep the source
    pub(crate) fn detach(&mut self) {
        if let Some(binding) = self.binding.take() {
            self.engine.detach(binding.session);
            debug!(session = %binding.session, "engine listener detached");
        }
    }

    /// Translate an event, discarding it if it was registered for another session
    pub(crate) fn translate(&self, session: SessionId, event: EngineEvent) -> Option<EngineSignal> {
        if self.bound_session() != Some(session) {
            trace!(%session, ?event, "discarding stale engine event");
            return None;
        }
        Some(event.into())
    }

    pub(crate) fn play(&mut self) {
        self.engine.play();
    }

    pub(crate) fn pause(&mut self) {
        self.engine.pause();
    }

    pub(crate) fn position(&self) -> f64 {
        sanitize_seconds(self.engine.position())
    }

    pub(crate) fn set_position(&mut self, seconds: f64) {
        self.engine.set_position(sanitize_seconds(seconds));
    }

    pub(crate) fn duration(&self) -> f64 {
        sanitize_seconds(self.engine.duration())
    }

    pub(crate) fn has_ended(&self) -> bool {
        self.engine.has_ended()
    }
}

/// Map NaN, infinities and negatives to zero
pub(crate) fn sanitize_seconds(seconds: f64) -> f64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

/// Engine that records calls, for unit tests
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct DummyEngine {
    pub source: Option<String>,
    pub attached: Vec<SessionId>,
    pub detached: Vec<SessionId>,
    pub position: f64,
    pub duration: f64,
    pub playing: bool,
    pub ended: bool,
}

#[cfg(test)]
impl MediaEngine for DummyEngine {
    fn set_source(&mut self, uri: &str) {
        self.source = Some(uri.to_owned());
        self.playing = false;
    }

    fn clear_source(&mut self) {
        self.source = None;
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn position(&self) -> f64 {
        self.position
    }

    fn set_position(&mut self, seconds: f64) {
        self.position = seconds;
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn has_ended(&self) -> bool {
        self.ended
    }

    fn attach(&mut self, listener: EngineListener) {
        self.attached.push(listener.session());
    }

    fn detach(&mut self, session: SessionId) {
        self.detached.push(session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn adapter() -> MediaEngineAdapter {
        let (inputs, _rx) = mpsc::unbounded_channel();
        MediaEngineAdapter::new(Box::new(DummyEngine::default()), inputs)
    }

    #[test]
    fn rebind_replaces_binding() {
        let mut adapter = adapter();
        let first = SessionId::INITIAL.next();
        let second = first.next();

        adapter.rebind(first, "ep1.mp3");
        assert_eq!(adapter.bound_session(), Some(first));
        assert_eq!(adapter.bound_location(), Some("ep1.mp3"));

        adapter.rebind(second, "ep2.mp3");
        assert_eq!(adapter.bound_session(), Some(second));
        assert_eq!(adapter.bound_location(), Some("ep2.mp3"));
    }

    #[test]
    fn translate_rejects_other_sessions() {
        let mut adapter = adapter();
        let first = SessionId::INITIAL.next();
        let second = first.next();
        adapter.rebind(first, "ep1.mp3");
        adapter.rebind(second, "ep2.mp3");

        assert_eq!(adapter.translate(first, EngineEvent::Started), None);
        assert_eq!(
            adapter.translate(second, EngineEvent::BufferingStarted),
            Some(EngineSignal::Buffering(true))
        );
    }

    #[test]
    fn unbound_adapter_rejects_everything() {
        let mut adapter = adapter();
        let session = SessionId::INITIAL.next();
        adapter.rebind(session, "ep1.mp3");
        adapter.unbind();
        assert_eq!(adapter.bound_session(), None);
        assert_eq!(
            adapter.translate(session, EngineEvent::Error { detail: "x".into() }),
            None
        );
    }

    #[test]
    fn listener_tags_events_with_session() {
        let (inputs, mut rx) = mpsc::unbounded_channel();
        let session = SessionId::INITIAL.next();
        let listener = EngineListener::new(session, inputs);
        assert!(listener.emit(EngineEvent::Ended));
        assert_eq!(
            rx.try_recv().unwrap(),
            PlayerInput::Engine {
                session,
                event: EngineEvent::Ended
            }
        );
        drop(rx);
        assert!(!listener.emit(EngineEvent::Ended));
    }

    #[test]
    fn sanitize_maps_garbage_to_zero() {
        assert_eq!(sanitize_seconds(f64::NAN), 0.0);
        assert_eq!(sanitize_seconds(f64::INFINITY), 0.0);
        assert_eq!(sanitize_seconds(-1.0), 0.0);
        assert_eq!(sanitize_seconds(12.5), 12.5);
    }
}
