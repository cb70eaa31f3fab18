//! Podplay - Playback Synchronization
//!
//! Keeps an episode player's UI state consistent with an external media
//! engine that it does not control.
//!
//! This crate provides:
//! - A playback state machine (unloaded, loading, playing, paused, errored)
//! - Progress polling with a single, cancellable timer
//! - Relative seeking and two-phase scrubbing (preview, commit)
//! - Failure handling with one user-visible notification per failure
//! - Stale-event rejection across rapid source swaps
//! - An async runtime that serializes all inputs on one task
//!
//! # Architecture
//!
//! The core never calls into a concrete audio backend. It depends on:
//! - [`MediaEngine`] - command surface of the external engine
//! - [`Ticker`] - recurring timer behind the progress poller
//! - [`NotificationSink`] - where failure notifications go
//!
//! Engine events are tagged with the [`SessionId`] they were registered for;
//! anything tagged with a superseded session is dropped.
//!
//! # Example: Driving the state machine by hand
//!
//! ```rust
//! use podplay_playback::{
//!     EngineListener, MediaEngine, PlaybackPhase, PlaybackRequest, PlaybackStateMachine,
//!     PlayerConfig, PollToken, SessionId, Ticker,
//! };
//! use std::time::Duration;
//! use tokio::sync::mpsc;
//!
//! #[derive(Default)]
//! struct SilentEngine;
//!
//! impl MediaEngine for SilentEngine {
//!     fn set_source(&mut self, _uri: &str) {}
//!     fn clear_source(&mut self) {}
//!     fn play(&mut self) {}
//!     fn pause(&mut self) {}
//!     fn position(&self) -> f64 { 0.0 }
//!     fn set_position(&mut self, _seconds: f64) {}
//!     fn duration(&self) -> f64 { 1800.0 }
//!     fn has_ended(&self) -> bool { false }
//!     fn attach(&mut self, _listener: EngineListener) {}
//!     fn detach(&mut self, _session: SessionId) {}
//! }
//!
//! struct NoTicker;
//!
//! impl Ticker for NoTicker {
//!     fn start(&mut self, _token: PollToken, _period: Duration) {}
//!     fn cancel(&mut self, _token: PollToken) {}
//! }
//!
//! let (inputs, _rx) = mpsc::unbounded_channel();
//! let (notes, _notes_rx) = mpsc::unbounded_channel::<String>();
//! let mut player = PlaybackStateMachine::new(
//!     PlayerConfig::default(),
//!     Box::new(SilentEngine),
//!     Box::new(NoTicker),
//!     Box::new(notes),
//!     inputs,
//! );
//!
//! player.load(PlaybackRequest::episode("fdr-731", "https://example.com/731.mp3"));
//! assert_eq!(player.phase(), PlaybackPhase::Loading);
//! assert!(player.snapshot().controls_disabled);
//! ```

mod engine;
mod error;
mod events;
mod machine;
mod monitor;
mod poller;
mod runtime;
mod seek;
mod session;
mod ticker;
pub mod types;

// Public exports
pub use engine::{EngineListener, MediaEngine, MediaEngineAdapter};
pub use error::{PlaybackError, PlaybackFailure, Result};
pub use events::{
    format_timestamp, EngineEvent, PlayerInput, PlayerSnapshot, UserCommand,
    TIMESTAMP_PLACEHOLDER,
};
pub use machine::PlaybackStateMachine;
pub use monitor::{ErrorMonitor, NotificationSink};
pub use poller::{PollToken, ProgressPoller, Ticker};
pub use runtime::{PlayerHandle, PlayerRuntime};
pub use seek::SeekController;
pub use session::PlaybackSession;
pub use ticker::TokioTicker;
pub use types::{PlaybackPhase, PlaybackRequest, PlayerConfig, SessionId};
