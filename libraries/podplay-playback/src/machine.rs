//! Playback state machine - core orchestration
//!
//! Owns the authoritative [`PlaybackSession`] and reconciles user intent,
//! engine events and poll ticks into it. Each call runs to completion and
//! publishes a fresh [`PlayerSnapshot`] when it changed anything.

use crate::{
    engine::{EngineSignal, MediaEngine, MediaEngineAdapter},
    error::{PlaybackError, Result},
    events::{EngineEvent, PlayerInput, PlayerSnapshot, UserCommand},
    monitor::{ErrorMonitor, NotificationSink},
    poller::{PollToken, ProgressPoller, Ticker},
    seek::SeekController,
    session::PlaybackSession,
    types::{PlaybackPhase, PlaybackRequest, PlayerConfig, SessionId},
};
use tokio::sync::{mpsc::UnboundedSender, watch};
use tracing::{debug, info};

pub struct PlaybackStateMachine {
    config: PlayerConfig,
    session: PlaybackSession,
    adapter: MediaEngineAdapter,
    poller: ProgressPoller,
    seek: SeekController,
    monitor: ErrorMonitor,
    snapshots: watch::Sender<PlayerSnapshot>,
}

impl PlaybackStateMachine {
    /// Create an unloaded state machine
    ///
    /// `inputs` is the channel engine listeners report into; whoever owns the
    /// receiving end feeds the inputs back through [`dispatch`](Self::dispatch).
    pub fn new(
        config: PlayerConfig,
        engine: Box<dyn MediaEngine>,
        ticker: Box<dyn Ticker>,
        notifier: Box<dyn NotificationSink>,
        inputs: UnboundedSender<PlayerInput>,
    ) -> Self {
        let session = PlaybackSession::unloaded(SessionId::INITIAL, None);
        let (snapshots, _) = watch::channel(PlayerSnapshot::from_session(&session));
        Self {
            adapter: MediaEngineAdapter::new(engine, inputs),
            poller: ProgressPoller::new(ticker, config.poll_interval()),
            seek: SeekController::new(),
            monitor: ErrorMonitor::new(notifier, config.failure_message.clone()),
            session,
            snapshots,
            config,
        }
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.session.phase()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot::from_session(&self.session)
    }

    /// Receiver that observes every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshots.subscribe()
    }

    /// Token of the live poll timer, if sampling
    pub fn poll_token(&self) -> Option<PollToken> {
        self.poller.token()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_running()
    }

    pub fn is_scrubbing(&self) -> bool {
        self.seek.is_scrubbing()
    }

    /// Session the engine listener is registered for
    pub fn bound_session(&self) -> Option<SessionId> {
        self.adapter.bound_session()
    }

    /// Process one input turn
    pub fn dispatch(&mut self, input: PlayerInput) -> Result<()> {
        match input {
            PlayerInput::Request(request) => self.load(request),
            PlayerInput::Command(command) => return self.command(command),
            PlayerInput::Engine { session, event } => {
                self.handle_engine_event(session, event);
            }
            PlayerInput::Tick(token) => {
                self.handle_tick(token);
            }
        }
        Ok(())
    }

    pub fn command(&mut self, command: UserCommand) -> Result<()> {
        match command {
            UserCommand::TogglePlayPause => self.toggle_play_pause(),
            UserCommand::SkipBack => self.skip_back(),
            UserCommand::SkipForward => self.skip_forward(),
            UserCommand::SeekRelative(delta) => self.seek_relative(delta),
            UserCommand::SeekPreview(target) => self.seek_preview(target),
            UserCommand::SeekCommit(target) => self.seek_commit(target),
        }
    }

    /// Bind a new episode, or unload when the request has no audio location
    ///
    /// The previous binding and poll timer are released before the new
    /// session exists. Requesting the location and source reference that are
    /// already bound is a no-op unless the player is errored or unloaded.
    pub fn load(&mut self, request: PlaybackRequest) {
        let location = request.location_str();
        let live = matches!(
            self.session.phase(),
            PlaybackPhase::Loading | PlaybackPhase::Playing | PlaybackPhase::Paused
        );
        if live
            && location.is_some()
            && self.adapter.bound_location() == location
            && self.session.source_reference() == request.source_reference.as_deref()
        {
            debug!(session = %self.session.id(), "source already bound, ignoring request");
            return;
        }

        self.poller.stop();
        self.seek.cancel();
        let id = self.session.id().next();

        match location {
            None => {
                self.adapter.unbind();
                self.session = PlaybackSession::unloaded(id, request.source_reference.clone());
                info!(session = %id, "player unloaded");
            }
            Some(location) => {
                self.adapter.rebind(id, location);
                let mut session = PlaybackSession::loading(id, &request);
                if session.take_autoplay() {
                    self.adapter.play();
                    session.await_start();
                }
                info!(
                    session = %id,
                    location,
                    source = session.source_reference().unwrap_or_default(),
                    autoplay = request.autoplay,
                    "loading source"
                );
                self.session = session;
            }
        }
        self.publish();
    }

    /// Pause while playing, resume while paused
    pub fn toggle_play_pause(&mut self) -> Result<()> {
        match self.session.phase() {
            PlaybackPhase::Playing => {
                self.adapter.pause();
                self.enter_paused();
            }
            PlaybackPhase::Paused => {
                if self.adapter.has_ended() {
                    self.seek.rewind(&mut self.session, &mut self.adapter);
                } else {
                    self.seek.abandon(&mut self.session, &self.adapter);
                }
                self.adapter.play();
                self.enter_playing();
            }
            phase => return Err(PlaybackError::ControlsDisabled { phase }),
        }
        self.publish();
        Ok(())
    }

    pub fn seek_relative(&mut self, delta: f64) -> Result<()> {
        self.seek
            .seek_relative(delta, &mut self.session, &mut self.adapter, &mut self.poller)?;
        self.publish();
        Ok(())
    }

    pub fn skip_back(&mut self) -> Result<()> {
        self.seek_relative(-self.config.skip_back_seconds)
    }

    pub fn skip_forward(&mut self) -> Result<()> {
        self.seek_relative(self.config.skip_forward_seconds)
    }

    /// Scrub in progress: update the displayed position only
    pub fn seek_preview(&mut self, target: f64) -> Result<()> {
        self.seek
            .preview(target, &mut self.session, &mut self.poller)?;
        self.publish();
        Ok(())
    }

    /// Scrub released: reposition the engine
    pub fn seek_commit(&mut self, target: f64) -> Result<()> {
        self.seek.commit(
            target,
            &mut self.session,
            &mut self.adapter,
            &mut self.poller,
        )?;
        self.publish();
        Ok(())
    }

    /// Apply an engine event registered for `session`
    ///
    /// Returns true if the event changed the session. Events from a
    /// superseded binding are discarded.
    pub fn handle_engine_event(&mut self, session: SessionId, event: EngineEvent) -> bool {
        let Some(signal) = self.adapter.translate(session, event) else {
            return false;
        };

        let changed = match signal {
            EngineSignal::Ready => self.on_ready(),
            EngineSignal::Started => self.on_started(),
            EngineSignal::Paused => self.on_paused(),
            EngineSignal::Buffering(buffering) => self.on_buffering(buffering),
            EngineSignal::Ended => self.on_ended(),
            EngineSignal::Failed(detail) => {
                let bound = self.adapter.bound_session().is_some();
                let failed = self
                    .monitor
                    .observe(detail, &mut self.session, &mut self.poller, bound);
                if failed {
                    self.seek.cancel();
                }
                failed
            }
        };
        if changed {
            self.publish();
        }
        changed
    }

    /// Apply a poll tick; returns true if the position or duration moved
    pub fn handle_tick(&mut self, token: PollToken) -> bool {
        let changed = self
            .poller
            .sample(token, &mut self.session, &self.adapter);
        if changed {
            self.publish();
        }
        changed
    }

    /// Release the poll timer and the engine listener
    pub fn release(&mut self) {
        self.poller.stop();
        self.adapter.detach();
    }

    fn on_ready(&mut self) -> bool {
        match self.session.phase() {
            PlaybackPhase::Loading | PlaybackPhase::Playing | PlaybackPhase::Paused => {}
            _ => return false,
        }
        let mut changed = self.session.set_duration(self.adapter.duration());
        if self.session.phase() == PlaybackPhase::Loading && !self.session.awaiting_start() {
            self.enter_paused();
            changed = true;
        }
        changed
    }

    fn on_started(&mut self) -> bool {
        match self.session.phase() {
            PlaybackPhase::Loading | PlaybackPhase::Paused => {
                self.session.set_duration(self.adapter.duration());
                self.enter_playing();
                true
            }
            _ => false,
        }
    }

    fn on_paused(&mut self) -> bool {
        if self.session.phase() != PlaybackPhase::Playing {
            return false;
        }
        self.enter_paused();
        true
    }

    fn on_buffering(&mut self, buffering: bool) -> bool {
        match self.session.phase() {
            PlaybackPhase::Loading | PlaybackPhase::Playing | PlaybackPhase::Paused => {
                self.session.set_buffering(buffering)
            }
            _ => false,
        }
    }

    fn on_ended(&mut self) -> bool {
        if self.session.phase() != PlaybackPhase::Playing {
            return false;
        }
        // Position stays at the last sampled value
        self.enter_paused();
        self.session.set_buffering(false);
        debug!(session = %self.session.id(), "episode finished");
        true
    }

    fn enter_playing(&mut self) {
        self.session.set_phase(PlaybackPhase::Playing);
        if !self.seek.is_scrubbing() {
            self.poller.start(self.session.id());
        }
        debug!(session = %self.session.id(), "playing");
    }

    fn enter_paused(&mut self) {
        self.poller.stop();
        self.session.set_phase(PlaybackPhase::Paused);
        debug!(session = %self.session.id(), "paused");
    }

    fn publish(&self) {
        self.snapshots
            .send_replace(PlayerSnapshot::from_session(&self.session));
    }
}

impl Drop for PlaybackStateMachine {
    fn drop(&mut self) {
        self.release();
    }
}
