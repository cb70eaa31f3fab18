//! Error types for playback synchronization

use crate::types::PlaybackPhase;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned to callers of the player
///
/// Engine-reported failures never show up here; they are absorbed into the
/// `Errored` phase and surfaced as a [`PlaybackFailure`] on the session.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The control surface is disabled in the current phase
    #[error("Controls are disabled while {phase}")]
    ControlsDisabled { phase: PlaybackPhase },

    /// Seek target or delta is NaN or infinite
    #[error("Invalid seek target: {0}")]
    InvalidSeekTarget(f64),

    /// Player configuration cannot be used
    #[error("Invalid player configuration: {0}")]
    InvalidConfig(String),

    /// The player runtime task is gone
    #[error("Player runtime has shut down")]
    RuntimeClosed,
}

/// Failure reported by the media engine
///
/// The engine does not distinguish the two; the kind is derived from the
/// phase the session was in when the failure arrived.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaybackFailure {
    /// Source could not be opened or decoded
    #[error("failed to load source: {detail}")]
    Load { detail: String },

    /// Failure during active rendering
    #[error("playback failed: {detail}")]
    Playback { detail: String },
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
