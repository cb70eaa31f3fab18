//! Authoritative playback session record

use crate::error::PlaybackFailure;
use crate::types::{PlaybackPhase, PlaybackRequest, SessionId};

/// State of one bound episode
///
/// Owned by the state machine and only mutated through its transitions. A
/// source change never edits a session in place; a fresh one replaces it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    id: SessionId,
    source_reference: Option<String>,
    audio_location: Option<String>,
    duration_seconds: f64,
    position_seconds: f64,
    phase: PlaybackPhase,
    autoplay_requested: bool,
    awaiting_start: bool,
    buffering: bool,
    failure: Option<PlaybackFailure>,
}

impl PlaybackSession {
    /// Session with nothing bound
    pub(crate) fn unloaded(id: SessionId, source_reference: Option<String>) -> Self {
        Self {
            id,
            source_reference,
            audio_location: None,
            duration_seconds: 0.0,
            position_seconds: 0.0,
            phase: PlaybackPhase::Unloaded,
            autoplay_requested: false,
            awaiting_start: false,
            buffering: false,
            failure: None,
        }
    }

    /// Session for a freshly bound source, positioned at zero
    pub(crate) fn loading(id: SessionId, request: &PlaybackRequest) -> Self {
        Self {
            audio_location: request.location_str().map(str::to_owned),
            phase: PlaybackPhase::Loading,
            autoplay_requested: request.autoplay,
            ..Self::unloaded(id, request.source_reference.clone())
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn source_reference(&self) -> Option<&str> {
        self.source_reference.as_deref()
    }

    pub fn audio_location(&self) -> Option<&str> {
        self.audio_location.as_deref()
    }

    /// Duration in seconds; 0 until the engine reports it
    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn position_seconds(&self) -> f64 {
        self.position_seconds
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn autoplay_requested(&self) -> bool {
        self.autoplay_requested
    }

    /// `play()` was issued while loading and `started` has not arrived yet
    pub fn awaiting_start(&self) -> bool {
        self.awaiting_start
    }

    pub fn buffering(&self) -> bool {
        self.buffering
    }

    pub fn failure(&self) -> Option<&PlaybackFailure> {
        self.failure.as_ref()
    }

    /// Clamp a position into `[0, duration]`
    pub fn clamp(&self, seconds: f64) -> f64 {
        seconds.clamp(0.0, self.duration_seconds)
    }

    pub(crate) fn set_phase(&mut self, phase: PlaybackPhase) {
        self.phase = phase;
        if phase != PlaybackPhase::Loading {
            self.awaiting_start = false;
        }
    }

    /// Consume the autoplay flag; true at most once per session
    pub(crate) fn take_autoplay(&mut self) -> bool {
        std::mem::take(&mut self.autoplay_requested)
    }

    pub(crate) fn await_start(&mut self) {
        self.awaiting_start = true;
    }

    /// Returns true if the stored duration changed
    pub(crate) fn set_duration(&mut self, seconds: f64) -> bool {
        if seconds == self.duration_seconds {
            return false;
        }
        self.duration_seconds = seconds;
        self.position_seconds = self.clamp(self.position_seconds);
        true
    }

    /// Store a clamped position
    pub(crate) fn set_position(&mut self, seconds: f64) {
        self.position_seconds = self.clamp(seconds);
    }

    /// Returns true if the flag changed
    pub(crate) fn set_buffering(&mut self, buffering: bool) -> bool {
        std::mem::replace(&mut self.buffering, buffering) != buffering
    }

    pub(crate) fn fail(&mut self, failure: PlaybackFailure) {
        self.set_phase(PlaybackPhase::Errored);
        self.buffering = false;
        self.failure = Some(failure);
    }
}
