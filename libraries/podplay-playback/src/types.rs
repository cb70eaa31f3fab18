//! Core types for playback synchronization

use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Identity of one playback session
///
/// Every rebind produces a fresh id. Engine listeners and poll timers are
/// tagged with the id of the session they were registered for, which is how
/// stale events are told apart from current ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    /// Session of a player that has never bound a source
    pub const INITIAL: SessionId = SessionId(0);

    pub(crate) fn next(self) -> Self {
        SessionId(self.0 + 1)
    }

    /// Raw numeric value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Playback phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackPhase {
    /// No episode bound to the engine
    Unloaded,

    /// Source assigned, waiting for the engine to become ready or start
    Loading,

    /// Engine is rendering
    Playing,

    /// Bound and ready, not rendering
    Paused,

    /// Engine reported a failure; only a new request leaves this phase
    Errored,
}

impl PlaybackPhase {
    /// Whether play/pause and seek controls are disabled
    pub fn controls_disabled(self) -> bool {
        matches!(
            self,
            PlaybackPhase::Unloaded | PlaybackPhase::Loading | PlaybackPhase::Errored
        )
    }

    /// Whether the session may reposition by scrubbing
    pub(crate) fn allows_scrub(self) -> bool {
        matches!(
            self,
            PlaybackPhase::Loading | PlaybackPhase::Playing | PlaybackPhase::Paused
        )
    }
}

impl fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackPhase::Unloaded => "unloaded",
            PlaybackPhase::Loading => "loading",
            PlaybackPhase::Playing => "playing",
            PlaybackPhase::Paused => "paused",
            PlaybackPhase::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// Request to bind an episode to the player
///
/// A request without an audio location unloads the player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackRequest {
    /// Episode identifier shown by the presentation layer
    pub source_reference: Option<String>,

    /// URI handed to the media engine
    pub audio_location: Option<String>,

    /// Start rendering as soon as the source is bound
    pub autoplay: bool,
}

impl PlaybackRequest {
    /// Request for an episode with a known location
    pub fn episode(source_reference: impl Into<String>, audio_location: impl Into<String>) -> Self {
        Self {
            source_reference: Some(source_reference.into()),
            audio_location: Some(audio_location.into()),
            autoplay: false,
        }
    }

    /// Request for a bare audio location
    pub fn location(audio_location: impl Into<String>) -> Self {
        Self {
            source_reference: None,
            audio_location: Some(audio_location.into()),
            autoplay: false,
        }
    }

    /// Request that unloads the player
    pub fn unload() -> Self {
        Self::default()
    }

    /// Set the autoplay flag
    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    /// The audio location, treating an empty string as absent
    pub fn location_str(&self) -> Option<&str> {
        self.audio_location.as_deref().filter(|l| !l.is_empty())
    }
}

/// Configuration for the playback state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Progress sampling cadence in milliseconds (default: 50)
    pub poll_interval_ms: u64,

    /// Step used by `skip_back` (default: 10s)
    pub skip_back_seconds: f64,

    /// Step used by `skip_forward` (default: 30s)
    pub skip_forward_seconds: f64,

    /// Message raised through the notification sink on failure
    pub failure_message: String,
}

impl PlayerConfig {
    /// Sampling cadence as a `Duration`
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reject settings the player cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(PlaybackError::InvalidConfig(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }

        for (name, step) in [
            ("skip_back_seconds", self.skip_back_seconds),
            ("skip_forward_seconds", self.skip_forward_seconds),
        ] {
            if !(step.is_finite() && step > 0.0) {
                return Err(PlaybackError::InvalidConfig(format!(
                    "{name} must be a positive number of seconds, got {step}"
                )));
            }
        }

        Ok(())
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            skip_back_seconds: 10.0,
            skip_forward_seconds: 30.0,
            failure_message: "Failed to load podcast. Try again or check devtools for details."
                .to_string(),
        }
    }
}
