//! Progress sampling while playing
//!
//! Engines do not push progress, so the player samples the position on a
//! timer. The poller owns at most one live timer; starting a new one cancels
//! the previous one first, and ticks from a cancelled timer are ignored.

use crate::engine::MediaEngineAdapter;
use crate::session::PlaybackSession;
use crate::types::{PlaybackPhase, SessionId};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::trace;

/// Identity of one poll timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PollToken {
    session: SessionId,
    generation: u64,
}

impl PollToken {
    pub fn session(&self) -> SessionId {
        self.session
    }
}

/// Recurring timer that produces `PlayerInput::Tick(token)`
pub trait Ticker: Send {
    /// Begin ticking every `period`
    fn start(&mut self, token: PollToken, period: Duration);

    /// Stop the timer identified by `token`
    fn cancel(&mut self, token: PollToken);
}

/// The single live timer
#[derive(Debug)]
struct PollHandle {
    token: PollToken,
}

pub struct ProgressPoller {
    ticker: Box<dyn Ticker>,
    period: Duration,
    live: Option<PollHandle>,
    generation: u64,
}

impl ProgressPoller {
    pub fn new(ticker: Box<dyn Ticker>, period: Duration) -> Self {
        Self {
            ticker,
            period,
            live: None,
            generation: 0,
        }
    }

    /// Start sampling for `session`, replacing any live timer
    pub fn start(&mut self, session: SessionId) -> PollToken {
        self.stop();
        self.generation += 1;
        let token = PollToken {
            session,
            generation: self.generation,
        };
        self.ticker.start(token, self.period);
        self.live = Some(PollHandle { token });
        trace!(%session, generation = self.generation, "poller started");
        token
    }

    /// Cancel the live timer, if any
    pub fn stop(&mut self) {
        if let Some(handle) = self.live.take() {
            self.ticker.cancel(handle.token);
            trace!(session = %handle.token.session, "poller stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.live.is_some()
    }

    /// Token of the live timer
    pub fn token(&self) -> Option<PollToken> {
        self.live.as_ref().map(|h| h.token)
    }

    /// Sample the engine into the session
    ///
    /// Returns true if the session changed. Ticks from a cancelled timer,
    /// ticks outside `Playing`, and ticks after the engine has ended are
    /// ignored. The position never moves backwards here; only seeks do that.
    pub(crate) fn sample(
        &self,
        token: PollToken,
        session: &mut PlaybackSession,
        adapter: &MediaEngineAdapter,
    ) -> bool {
        if self.token() != Some(token) || session.id() != token.session {
            trace!(?token, "discarding stale tick");
            return false;
        }
        if session.phase() != PlaybackPhase::Playing || adapter.has_ended() {
            return false;
        }

        let mut changed = session.set_duration(adapter.duration());
        let sampled = session.clamp(adapter.position());
        if sampled > session.position_seconds() {
            session.set_position(sampled);
            changed = true;
        }
        changed
    }
}

impl Drop for ProgressPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ticker that records timers, for unit tests
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingTicker {
    pub live: std::sync::Arc<std::sync::Mutex<Vec<PollToken>>>,
}

#[cfg(test)]
impl Ticker for RecordingTicker {
    fn start(&mut self, token: PollToken, _period: Duration) {
        self.live.lock().unwrap().push(token);
    }

    fn cancel(&mut self, token: PollToken) {
        self.live.lock().unwrap().retain(|t| *t != token);
    }
}
