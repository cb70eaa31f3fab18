//! Simulated media engine
//!
//! Stands in for a real audio element: sources "load" after a configurable
//! latency, the position advances in real time while playing, and the end of
//! the episode is reported with an `ended` event. Locations starting with
//! `missing:` fail to load. A position set before the source is ready is
//! held and applied once it is.
//!
//! All timing uses `tokio::time`, so the engine must be driven from inside a
//! tokio runtime.

use crate::config::EngineSettings;
use podplay_playback::{EngineEvent, EngineListener, MediaEngine, SessionId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{debug, trace};

/// Location prefix that makes the simulated load fail
pub const MISSING_PREFIX: &str = "missing:";

#[derive(Debug, Default)]
struct SimState {
    source: Option<String>,
    listener: Option<EngineListener>,
    ready: bool,
    play_pending: bool,
    /// Position requested before the source was ready
    seek_pending: Option<f64>,
    playing: bool,
    ended: bool,
    /// Position at the last resume, pause or seek
    anchor: f64,
    resumed_at: Option<Instant>,
    /// Bumped whenever a scheduled load or end timer becomes obsolete
    epoch: u64,
}

impl SimState {
    fn position(&self) -> f64 {
        match self.resumed_at {
            Some(at) if self.playing => self.anchor + at.elapsed().as_secs_f64(),
            _ => self.anchor,
        }
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(listener) = &self.listener {
            listener.emit(event);
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedEngine {
    settings: EngineSettings,
    state: Arc<Mutex<SimState>>,
}

impl SimulatedEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            state: Arc::new(Mutex::new(SimState::default())),
        }
    }

    pub fn source(&self) -> Option<String> {
        self.lock().source.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn duration_secs(&self) -> f64 {
        self.settings.episode_duration_seconds
    }

    fn schedule_load(&self, epoch: u64, uri: String) {
        let engine = self.clone();
        let latency = self.settings.load_latency();
        tokio::spawn(async move {
            time::sleep(latency).await;
            let mut state = engine.lock();
            if state.epoch != epoch {
                trace!(uri, "discarding superseded load");
                return;
            }
            if uri.starts_with(MISSING_PREFIX) {
                debug!(uri, "simulated load failed");
                state.emit(EngineEvent::Error {
                    detail: format!("source not found: {uri}"),
                });
                return;
            }
            state.ready = true;
            if let Some(seconds) = state.seek_pending.take() {
                state.anchor = seconds.clamp(0.0, engine.duration_secs());
            }
            state.emit(EngineEvent::Ready);
            if std::mem::take(&mut state.play_pending) {
                engine.resume(&mut state);
            }
        });
    }

    fn schedule_end(&self, state: &SimState) {
        let remaining = (self.duration_secs() - state.anchor).max(0.0);
        let epoch = state.epoch;
        let engine = self.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_secs_f64(remaining)).await;
            let mut state = engine.lock();
            if state.epoch != epoch || !state.playing {
                return;
            }
            state.anchor = engine.duration_secs();
            state.playing = false;
            state.resumed_at = None;
            state.ended = true;
            state.emit(EngineEvent::Ended);
        });
    }

    fn resume(&self, state: &mut SimState) {
        state.epoch += 1;
        state.playing = true;
        state.ended = false;
        state.resumed_at = Some(Instant::now());
        state.emit(EngineEvent::Started);
        self.schedule_end(state);
    }
}

impl MediaEngine for SimulatedEngine {
    fn set_source(&mut self, uri: &str) {
        let epoch = {
            let mut state = self.lock();
            let listener = state.listener.take();
            *state = SimState {
                source: Some(uri.to_string()),
                listener,
                epoch: state.epoch + 1,
                ..SimState::default()
            };
            state.epoch
        };
        debug!(uri, "simulated source assigned");
        self.schedule_load(epoch, uri.to_string());
    }

    fn clear_source(&mut self) {
        let mut state = self.lock();
        let listener = state.listener.take();
        *state = SimState {
            listener,
            epoch: state.epoch + 1,
            ..SimState::default()
        };
    }

    fn play(&mut self) {
        let mut state = self.lock();
        if state.playing || state.source.is_none() {
            return;
        }
        if !state.ready {
            state.play_pending = true;
            return;
        }
        self.resume(&mut state);
    }

    fn pause(&mut self) {
        let mut state = self.lock();
        state.play_pending = false;
        if !state.playing {
            return;
        }
        state.anchor = state.position().min(self.duration_secs());
        state.playing = false;
        state.resumed_at = None;
        state.epoch += 1;
        state.emit(EngineEvent::Paused);
    }

    fn position(&self) -> f64 {
        self.lock().position().min(self.duration_secs())
    }

    fn set_position(&mut self, seconds: f64) {
        let mut state = self.lock();
        if !state.ready {
            if state.source.is_some() {
                state.seek_pending = Some(seconds);
            }
            return;
        }
        state.anchor = seconds.clamp(0.0, self.duration_secs());
        state.ended = false;
        state.epoch += 1;
        if state.playing {
            state.resumed_at = Some(Instant::now());
            self.schedule_end(&state);
        }
    }

    fn duration(&self) -> f64 {
        if self.lock().ready {
            self.duration_secs()
        } else {
            f64::NAN
        }
    }

    fn has_ended(&self) -> bool {
        self.lock().ended
    }

    fn attach(&mut self, listener: EngineListener) {
        self.lock().listener = Some(listener);
    }

    fn detach(&mut self, session: SessionId) {
        let mut state = self.lock();
        if state.listener.as_ref().map(EngineListener::session) == Some(session) {
            state.listener = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podplay_playback::PlayerInput;
    use tokio::sync::mpsc;

    fn engine(duration: f64) -> SimulatedEngine {
        SimulatedEngine::new(EngineSettings {
            episode_duration_seconds: duration,
            load_latency_ms: 100,
        })
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<PlayerInput>) -> EngineEvent {
        match rx.recv().await {
            Some(PlayerInput::Engine { event, .. }) => event,
            other => panic!("expected engine event, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reports_ready_after_latency() {
        let mut engine = engine(60.0);
        let (tx, mut rx) = mpsc::unbounded_channel();

        engine.set_source("ep1.mp3");
        engine.attach(EngineListener::new(SessionId::INITIAL, tx));
        assert!(engine.duration().is_nan());

        assert_eq!(next_event(&mut rx).await, EngineEvent::Ready);
        assert_eq!(engine.duration(), 60.0);
        assert_eq!(engine.position(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_source_fails_to_load() {
        let mut engine = engine(60.0);
        let (tx, mut rx) = mpsc::unbounded_channel();

        engine.set_source("missing:ep1.mp3");
        engine.attach(EngineListener::new(SessionId::INITIAL, tx));
        engine.play();

        assert!(matches!(
            next_event(&mut rx).await,
            EngineEvent::Error { .. }
        ));
        assert!(!engine.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn play_before_ready_starts_once_loaded() {
        let mut engine = engine(60.0);
        let (tx, mut rx) = mpsc::unbounded_channel();

        engine.set_source("ep1.mp3");
        engine.attach(EngineListener::new(SessionId::INITIAL, tx));
        engine.play();
        assert!(!engine.is_playing());

        assert_eq!(next_event(&mut rx).await, EngineEvent::Ready);
        assert_eq!(next_event(&mut rx).await, EngineEvent::Started);
        assert!(engine.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn position_set_while_loading_applies_when_ready() {
        let mut engine = engine(600.0);
        let (tx, mut rx) = mpsc::unbounded_channel();

        engine.set_source("ep1.mp3");
        engine.attach(EngineListener::new(SessionId::INITIAL, tx));
        engine.set_position(120.0);
        assert_eq!(engine.position(), 0.0);

        assert_eq!(next_event(&mut rx).await, EngineEvent::Ready);
        assert_eq!(engine.position(), 120.0);

        // A new source forgets the held position
        engine.set_source("ep2.mp3");
        engine.set_position(300.0);
        engine.set_source("ep3.mp3");
        assert_eq!(next_event(&mut rx).await, EngineEvent::Ready);
        assert_eq!(engine.position(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn position_advances_until_ended() {
        let mut engine = engine(5.0);
        let (tx, mut rx) = mpsc::unbounded_channel();

        engine.set_source("ep1.mp3");
        engine.attach(EngineListener::new(SessionId::INITIAL, tx));
        engine.play();
        next_event(&mut rx).await;
        next_event(&mut rx).await;

        time::sleep(Duration::from_secs(2)).await;
        let position = engine.position();
        assert!((2.0..3.0).contains(&position), "position {position}");

        assert_eq!(next_event(&mut rx).await, EngineEvent::Ended);
        assert!(engine.has_ended());
        assert_eq!(engine.position(), 5.0);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_freezes_position_and_seek_rearms() {
        let mut engine = engine(10.0);
        let (tx, mut rx) = mpsc::unbounded_channel();

        engine.set_source("ep1.mp3");
        engine.attach(EngineListener::new(SessionId::INITIAL, tx));
        engine.play();
        next_event(&mut rx).await;
        next_event(&mut rx).await;

        time::sleep(Duration::from_secs(3)).await;
        engine.pause();
        assert_eq!(next_event(&mut rx).await, EngineEvent::Paused);
        let frozen = engine.position();
        time::sleep(Duration::from_secs(30)).await;
        assert_eq!(engine.position(), frozen);
        assert!(!engine.has_ended());

        engine.set_position(9.0);
        engine.play();
        assert_eq!(next_event(&mut rx).await, EngineEvent::Started);
        assert_eq!(next_event(&mut rx).await, EngineEvent::Ended);
    }

    #[tokio::test(start_paused = true)]
    async fn new_source_cancels_pending_load() {
        let mut engine = engine(60.0);
        let (tx, mut rx) = mpsc::unbounded_channel();

        engine.set_source("missing:ep1.mp3");
        engine.set_source("ep2.mp3");
        engine.attach(EngineListener::new(SessionId::INITIAL, tx));

        assert_eq!(next_event(&mut rx).await, EngineEvent::Ready);
        time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(engine.source().as_deref(), Some("ep2.mp3"));
    }
}
