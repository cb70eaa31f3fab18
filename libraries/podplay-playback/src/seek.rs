//! Relative and scrub seeking
//!
//! All targets are clamped to `[0, duration]`; out-of-range values are
//! truncated, never rejected. Scrubbing is two-phase: previews only move the
//! displayed position (and hold the poller off), the commit repositions the
//! engine once.

use crate::engine::MediaEngineAdapter;
use crate::error::{PlaybackError, Result};
use crate::poller::ProgressPoller;
use crate::session::PlaybackSession;
use crate::types::PlaybackPhase;
use tracing::debug;

#[derive(Debug, Default)]
pub struct SeekController {
    scrubbing: bool,
}

impl SeekController {
    pub fn new() -> Self {
        Self::default()
    }

    /// A preview has been applied and not yet committed
    pub fn is_scrubbing(&self) -> bool {
        self.scrubbing
    }

    /// Move by `delta` seconds from the displayed position
    ///
    /// An open scrub ends here: the result goes to the engine, so sampling
    /// resumes if playing.
    pub(crate) fn seek_relative(
        &mut self,
        delta: f64,
        session: &mut PlaybackSession,
        adapter: &mut MediaEngineAdapter,
        poller: &mut ProgressPoller,
    ) -> Result<f64> {
        ensure_finite(delta)?;
        match session.phase() {
            PlaybackPhase::Playing | PlaybackPhase::Paused => {}
            phase => return Err(PlaybackError::ControlsDisabled { phase }),
        }
        let target = session.clamp(session.position_seconds() + delta);
        adapter.set_position(target);
        session.set_position(target);
        if std::mem::take(&mut self.scrubbing) && session.phase() == PlaybackPhase::Playing {
            poller.start(session.id());
        }
        debug!(session = %session.id(), delta, target, "relative seek");
        Ok(target)
    }

    /// Show `target` while the user drags, without touching the engine
    pub(crate) fn preview(
        &mut self,
        target: f64,
        session: &mut PlaybackSession,
        poller: &mut ProgressPoller,
    ) -> Result<f64> {
        ensure_finite(target)?;
        ensure_scrubbable(session)?;
        poller.stop();
        self.scrubbing = true;
        session.set_position(target);
        Ok(session.position_seconds())
    }

    /// Apply the released position to the engine and resume sampling
    pub(crate) fn commit(
        &mut self,
        target: f64,
        session: &mut PlaybackSession,
        adapter: &mut MediaEngineAdapter,
        poller: &mut ProgressPoller,
    ) -> Result<f64> {
        ensure_finite(target)?;
        ensure_scrubbable(session)?;
        let target = session.clamp(target);
        adapter.set_position(target);
        session.set_position(target);
        self.scrubbing = false;
        if session.phase() == PlaybackPhase::Playing {
            poller.start(session.id());
        }
        debug!(session = %session.id(), target, "seek committed");
        Ok(target)
    }

    /// Rewind to the start, used when resuming a finished episode
    pub(crate) fn rewind(&mut self, session: &mut PlaybackSession, adapter: &mut MediaEngineAdapter) {
        self.scrubbing = false;
        adapter.set_position(0.0);
        session.set_position(0.0);
    }

    /// Drop an uncommitted scrub and show the engine's position again
    pub(crate) fn abandon(
        &mut self,
        session: &mut PlaybackSession,
        adapter: &MediaEngineAdapter,
    ) {
        if std::mem::take(&mut self.scrubbing) {
            session.set_position(adapter.position());
            debug!(session = %session.id(), "scrub abandoned");
        }
    }

    /// Forget an uncommitted scrub; the session is being replaced or failed
    pub(crate) fn cancel(&mut self) {
        self.scrubbing = false;
    }
}

fn ensure_finite(seconds: f64) -> Result<()> {
    if seconds.is_finite() {
        Ok(())
    } else {
        Err(PlaybackError::InvalidSeekTarget(seconds))
    }
}

fn ensure_scrubbable(session: &PlaybackSession) -> Result<()> {
    let phase = session.phase();
    if phase.allows_scrub() {
        Ok(())
    } else {
        Err(PlaybackError::ControlsDisabled { phase })
    }
}
