//! Shared fakes for playback integration tests
#![allow(dead_code)]

use podplay_playback::{
    EngineEvent, EngineListener, MediaEngine, NotificationSink, PlaybackStateMachine,
    PlayerConfig, PlayerInput, PollToken, SessionId, Ticker,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Command received by the fake engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    SetSource(String),
    ClearSource,
    Play,
    Pause,
    SetPosition(f64),
    Attach(SessionId),
    Detach(SessionId),
}

/// Observable state of the fake engine
#[derive(Debug, Default)]
pub struct EngineLog {
    pub calls: Vec<EngineCall>,
    pub listener: Option<EngineListener>,
    pub position: f64,
    pub duration: f64,
    pub ended: bool,
}

impl EngineLog {
    pub fn set_position_calls(&self) -> Vec<f64> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                EngineCall::SetPosition(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }
}

/// Engine that records every command; events are fired by the test
#[derive(Debug, Clone, Default)]
pub struct FakeEngine {
    pub log: Arc<Mutex<EngineLog>>,
}

impl MediaEngine for FakeEngine {
    fn set_source(&mut self, uri: &str) {
        let mut log = self.log.lock().unwrap();
        log.calls.push(EngineCall::SetSource(uri.to_string()));
        log.position = 0.0;
        log.ended = false;
    }

    fn clear_source(&mut self) {
        self.log.lock().unwrap().calls.push(EngineCall::ClearSource);
    }

    fn play(&mut self) {
        self.log.lock().unwrap().calls.push(EngineCall::Play);
    }

    fn pause(&mut self) {
        self.log.lock().unwrap().calls.push(EngineCall::Pause);
    }

    fn position(&self) -> f64 {
        self.log.lock().unwrap().position
    }

    fn set_position(&mut self, seconds: f64) {
        let mut log = self.log.lock().unwrap();
        log.calls.push(EngineCall::SetPosition(seconds));
        log.position = seconds;
        log.ended = false;
    }

    fn duration(&self) -> f64 {
        self.log.lock().unwrap().duration
    }

    fn has_ended(&self) -> bool {
        self.log.lock().unwrap().ended
    }

    fn attach(&mut self, listener: EngineListener) {
        let mut log = self.log.lock().unwrap();
        log.calls.push(EngineCall::Attach(listener.session()));
        log.listener = Some(listener);
    }

    fn detach(&mut self, session: SessionId) {
        let mut log = self.log.lock().unwrap();
        log.calls.push(EngineCall::Detach(session));
        if log.listener.as_ref().map(EngineListener::session) == Some(session) {
            log.listener = None;
        }
    }
}

/// Ticker that tracks live timers instead of scheduling anything
#[derive(Debug, Clone, Default)]
pub struct FakeTicker {
    pub live: Arc<Mutex<Vec<PollToken>>>,
    pub started: Arc<Mutex<usize>>,
}

impl FakeTicker {
    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap().len()
    }

    pub fn started_count(&self) -> usize {
        *self.started.lock().unwrap()
    }
}

impl Ticker for FakeTicker {
    fn start(&mut self, token: PollToken, _period: Duration) {
        self.live.lock().unwrap().push(token);
        *self.started.lock().unwrap() += 1;
    }

    fn cancel(&mut self, token: PollToken) {
        self.live.lock().unwrap().retain(|t| *t != token);
    }
}

/// Notification sink that keeps every message
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    pub messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// State machine wired to fakes, with its input channel exposed
pub struct Harness {
    pub machine: PlaybackStateMachine,
    pub inputs: mpsc::UnboundedReceiver<PlayerInput>,
    pub engine: FakeEngine,
    pub ticker: FakeTicker,
    pub notifier: RecordingNotifier,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(PlayerConfig::default())
    }

    pub fn with_config(config: PlayerConfig) -> Self {
        let engine = FakeEngine::default();
        let ticker = FakeTicker::default();
        let notifier = RecordingNotifier::default();
        let (tx, inputs) = mpsc::unbounded_channel();
        let machine = PlaybackStateMachine::new(
            config,
            Box::new(engine.clone()),
            Box::new(ticker.clone()),
            Box::new(notifier.clone()),
            tx,
        );
        Self {
            machine,
            inputs,
            engine,
            ticker,
            notifier,
        }
    }

    /// Listener the engine currently holds
    pub fn listener(&self) -> EngineListener {
        self.engine
            .log
            .lock()
            .unwrap()
            .listener
            .clone()
            .expect("engine has no listener attached")
    }

    /// Fire an event through the current listener and process it
    pub fn emit(&mut self, event: EngineEvent) {
        assert!(self.listener().emit(event));
        self.drain();
    }

    /// Process every queued input
    pub fn drain(&mut self) {
        while let Ok(input) = self.inputs.try_recv() {
            let _ = self.machine.dispatch(input);
        }
    }

    pub fn set_engine_position(&self, seconds: f64) {
        self.engine.log.lock().unwrap().position = seconds;
    }

    pub fn set_engine_duration(&self, seconds: f64) {
        self.engine.log.lock().unwrap().duration = seconds;
    }

    pub fn set_engine_ended(&self, ended: bool) {
        self.engine.log.lock().unwrap().ended = ended;
    }

    /// Deliver a tick from the live poll timer
    pub fn tick(&mut self) -> bool {
        let token = self.machine.poll_token().expect("poller is not running");
        self.machine.handle_tick(token)
    }

    pub fn engine_calls(&self) -> Vec<EngineCall> {
        self.engine.log.lock().unwrap().calls.clone()
    }

    pub fn clear_engine_calls(&self) {
        self.engine.log.lock().unwrap().calls.clear();
    }
}
