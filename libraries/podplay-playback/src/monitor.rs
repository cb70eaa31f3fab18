//! Engine failure handling

use crate::error::PlaybackFailure;
use crate::poller::ProgressPoller;
use crate::session::PlaybackSession;
use crate::types::PlaybackPhase;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{trace, warn};

/// Receives user-visible notifications
pub trait NotificationSink: Send {
    fn notify(&self, message: &str);
}

impl NotificationSink for UnboundedSender<String> {
    fn notify(&self, message: &str) {
        if self.send(message.to_owned()).is_err() {
            trace!(notification = message, "notification receiver closed, dropping message");
        }
    }
}

/// Turns engine failures into the `Errored` phase plus one notification
pub struct ErrorMonitor {
    sink: Box<dyn NotificationSink>,
    message: String,
}

impl ErrorMonitor {
    pub fn new(sink: Box<dyn NotificationSink>, message: impl Into<String>) -> Self {
        Self {
            sink,
            message: message.into(),
        }
    }

    /// Handle an engine failure
    ///
    /// Returns true if the session moved to `Errored`. A session that is
    /// already errored, or unloaded with nothing bound, is left alone.
    pub(crate) fn observe(
        &self,
        detail: String,
        session: &mut PlaybackSession,
        poller: &mut ProgressPoller,
        bound: bool,
    ) -> bool {
        match session.phase() {
            PlaybackPhase::Errored => return false,
            PlaybackPhase::Unloaded if !bound => return false,
            _ => {}
        }

        let failure = if session.phase() == PlaybackPhase::Loading {
            PlaybackFailure::Load { detail }
        } else {
            PlaybackFailure::Playback { detail }
        };
        warn!(
            session = %session.id(),
            location = session.audio_location().unwrap_or_default(),
            %failure,
            "engine reported failure"
        );

        poller.stop();
        session.fail(failure);
        self.sink.notify(&self.message);
        true
    }
}
