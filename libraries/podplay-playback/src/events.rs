//! Player inputs and render-facing snapshots
//!
//! Everything that can change the player arrives as a [`PlayerInput`]:
//! - playback requests
//! - user commands
//! - engine events, tagged with the session they were registered for
//! - poll ticks, tagged with the timer that produced them
//!
//! After every accepted transition the machine publishes a [`PlayerSnapshot`].

use crate::error::PlaybackFailure;
use crate::poller::PollToken;
use crate::session::PlaybackSession;
use crate::types::{PlaybackPhase, PlaybackRequest, SessionId};
use serde::{Deserialize, Serialize};

/// Placeholder shown instead of a timestamp when nothing meaningful is bound
pub const TIMESTAMP_PLACEHOLDER: &str = "--:--";

/// Events fired by the media engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Source opened; duration is now known
    Ready,

    /// Rendering started or resumed
    Started,

    /// Rendering paused
    Paused,

    /// Engine stalled waiting for data
    BufferingStarted,

    /// Engine has enough data again
    BufferingEnded,

    /// Reached the end of the source
    Ended,

    /// Load or playback failure
    Error { detail: String },
}

/// Commands issued from the control surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "seconds", rename_all = "snake_case")]
pub enum UserCommand {
    TogglePlayPause,
    SkipBack,
    SkipForward,
    SeekRelative(f64),
    /// Scrub in progress; display only
    SeekPreview(f64),
    /// Scrub released; reposition the engine
    SeekCommit(f64),
}

/// One turn of input for the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerInput {
    Request(PlaybackRequest),
    Command(UserCommand),
    Engine {
        session: SessionId,
        event: EngineEvent,
    },
    Tick(PollToken),
}

/// State the presentation layer renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub phase: PlaybackPhase,
    pub position_seconds: f64,
    pub duration_seconds: f64,
    pub controls_disabled: bool,
    pub source_reference: Option<String>,
    pub buffering: bool,
    pub failure: Option<PlaybackFailure>,
}

impl PlayerSnapshot {
    pub(crate) fn from_session(session: &PlaybackSession) -> Self {
        Self {
            phase: session.phase(),
            position_seconds: session.position_seconds(),
            duration_seconds: session.duration_seconds(),
            controls_disabled: session.phase().controls_disabled(),
            source_reference: session.source_reference().map(str::to_owned),
            buffering: session.buffering(),
            failure: session.failure().cloned(),
        }
    }

    /// Whether timestamps should be replaced by a placeholder
    pub fn shows_placeholder(&self) -> bool {
        matches!(
            self.phase,
            PlaybackPhase::Unloaded | PlaybackPhase::Errored
        )
    }

    /// Current position formatted for display
    pub fn position_label(&self) -> String {
        if self.shows_placeholder() {
            return TIMESTAMP_PLACEHOLDER.to_string();
        }
        format_timestamp(self.position_seconds)
    }

    /// Duration formatted for display; placeholder while still unknown
    pub fn duration_label(&self) -> String {
        if self.shows_placeholder() || self.duration_seconds <= 0.0 {
            return TIMESTAMP_PLACEHOLDER.to_string();
        }
        format_timestamp(self.duration_seconds)
    }
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self::from_session(&PlaybackSession::unloaded(SessionId::INITIAL, None))
    }
}

/// Format seconds as `m:ss`, or `h:mm:ss` past the hour
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}
