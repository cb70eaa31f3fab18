//! Async driver for the state machine
//!
//! One tokio task owns the [`PlaybackStateMachine`] and drains a single input
//! channel, so requests, commands, engine events and ticks are handled one
//! turn at a time without locking. Callers talk to it through a cloneable
//! [`PlayerHandle`].

use crate::{
    engine::MediaEngine,
    error::{PlaybackError, Result},
    events::{PlayerInput, PlayerSnapshot, UserCommand},
    machine::PlaybackStateMachine,
    monitor::NotificationSink,
    ticker::TokioTicker,
    types::{PlaybackRequest, PlayerConfig},
};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Caller-facing handle to a running player
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    inputs: mpsc::UnboundedSender<PlayerInput>,
    snapshots: watch::Receiver<PlayerSnapshot>,
}

impl PlayerHandle {
    pub fn load(&self, request: PlaybackRequest) -> Result<()> {
        self.send(PlayerInput::Request(request))
    }

    pub fn toggle_play_pause(&self) -> Result<()> {
        self.command(UserCommand::TogglePlayPause)
    }

    pub fn skip_back(&self) -> Result<()> {
        self.command(UserCommand::SkipBack)
    }

    pub fn skip_forward(&self) -> Result<()> {
        self.command(UserCommand::SkipForward)
    }

    pub fn seek_relative(&self, delta_seconds: f64) -> Result<()> {
        self.command(UserCommand::SeekRelative(delta_seconds))
    }

    pub fn seek_preview(&self, target_seconds: f64) -> Result<()> {
        self.command(UserCommand::SeekPreview(target_seconds))
    }

    pub fn seek_commit(&self, target_seconds: f64) -> Result<()> {
        self.command(UserCommand::SeekCommit(target_seconds))
    }

    /// Queue a command; rejection by the machine is logged, not returned
    pub fn command(&self, command: UserCommand) -> Result<()> {
        self.send(PlayerInput::Command(command))
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshots.clone()
    }

    fn send(&self, input: PlayerInput) -> Result<()> {
        self.inputs
            .send(input)
            .map_err(|_| PlaybackError::RuntimeClosed)
    }
}

/// A state machine running on its own tokio task
#[derive(Debug)]
pub struct PlayerRuntime {
    handle: PlayerHandle,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PlayerRuntime {
    /// Spawn the player; must be called from within a tokio runtime
    ///
    /// Fails with [`PlaybackError::InvalidConfig`] before anything is spawned
    /// if `config` does not validate.
    pub fn spawn(
        config: PlayerConfig,
        engine: Box<dyn MediaEngine>,
        notifier: Box<dyn NotificationSink>,
    ) -> Result<Self> {
        config.validate()?;
        let (inputs, mut rx) = mpsc::unbounded_channel();
        let (shutdown, mut shutdown_rx) = oneshot::channel();

        let ticker = TokioTicker::new(inputs.clone());
        let mut machine =
            PlaybackStateMachine::new(config, engine, Box::new(ticker), notifier, inputs.clone());
        let handle = PlayerHandle {
            inputs,
            snapshots: machine.subscribe(),
        };

        let task = tokio::spawn(async move {
            info!("player runtime started");
            loop {
                tokio::select! {
                    biased;
                    _ = &mut shutdown_rx => break,
                    input = rx.recv() => {
                        let Some(input) = input else { break };
                        if let Err(e) = machine.dispatch(input) {
                            debug!(error = %e, "command rejected");
                        }
                    }
                }
            }
            machine.release();
            info!("player runtime stopped");
        });

        Ok(Self {
            handle,
            shutdown: Some(shutdown),
            task,
        })
    }

    pub fn handle(&self) -> PlayerHandle {
        self.handle.clone()
    }

    /// Stop the player task and wait for it to release its resources
    pub async fn shutdown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        let _ = (&mut self.task).await;
    }
}
