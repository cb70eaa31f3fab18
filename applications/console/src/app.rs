//! Line-driven player loop
//!
//! Reads [`ConsoleCommand`]s, forwards them to a [`PlayerRuntime`] and writes
//! what the player publishes. Snapshots are written as JSON lines whenever the
//! phase, buffering flag, failure or bound episode changes; notifications are
//! written as `! message`; rejected input as `? reason`.

use crate::{
    command::ConsoleCommand,
    config::ConsoleConfig,
    engine::SimulatedEngine,
    error::Result,
};
use podplay_playback::{
    PlaybackRequest, PlayerHandle, PlayerRuntime, PlayerSnapshot, UserCommand,
};
use serde::Serialize;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// What the loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    PrintState,
    Quit,
}

/// Snapshot as printed, with the formatted timestamps alongside
#[derive(Debug, Serialize)]
struct SnapshotLine<'a> {
    #[serde(flatten)]
    snapshot: &'a PlayerSnapshot,
    position: String,
    duration: String,
}

pub struct ConsoleApp {
    runtime: PlayerRuntime,
    handle: PlayerHandle,
    notifications: mpsc::UnboundedReceiver<String>,
    autoplay: bool,
}

impl ConsoleApp {
    /// Spawn the player; must be called from within a tokio runtime
    pub fn start(config: &ConsoleConfig, autoplay: bool) -> Result<Self> {
        let (notifier, notifications) = mpsc::unbounded_channel::<String>();
        let engine = SimulatedEngine::new(config.engine.clone());
        let runtime =
            PlayerRuntime::spawn(config.player.clone(), Box::new(engine), Box::new(notifier))?;
        info!(
            poll_interval_ms = config.player.poll_interval_ms,
            episode_duration_seconds = config.engine.episode_duration_seconds,
            "console player started"
        );
        Ok(Self {
            handle: runtime.handle(),
            runtime,
            notifications,
            autoplay,
        })
    }

    pub fn handle(&self) -> PlayerHandle {
        self.handle.clone()
    }

    /// Bind an episode given on the command line
    pub fn load(&self, location: String, source_reference: Option<String>) -> Result<()> {
        self.handle.load(PlaybackRequest {
            source_reference,
            audio_location: Some(location),
            autoplay: self.autoplay,
        })?;
        Ok(())
    }

    /// Forward one command to the player
    pub fn apply(&self, command: ConsoleCommand) -> Result<Flow> {
        if let Some(request) = command.request(self.autoplay) {
            self.handle.load(request)?;
            return Ok(Flow::Continue);
        }

        match command {
            ConsoleCommand::Player(cmd) => self.handle.command(cmd)?,
            ConsoleCommand::Scrub(targets) => {
                for target in targets {
                    self.handle.command(UserCommand::SeekPreview(target))?;
                }
            }
            ConsoleCommand::Commit(target) => {
                self.handle.command(UserCommand::SeekCommit(target))?;
            }
            ConsoleCommand::State => return Ok(Flow::PrintState),
            ConsoleCommand::Quit => return Ok(Flow::Quit),
            ConsoleCommand::Load { .. } | ConsoleCommand::Unload => {}
        }
        Ok(Flow::Continue)
    }

    /// Run until `quit` or end of input, then shut the player down
    ///
    /// Returns the writer so callers can inspect what was written.
    pub async fn run<R, W>(mut self, input: R, mut out: W) -> Result<W>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        let mut snapshots = self.handle.subscribe();
        let mut last = snapshots.borrow_and_update().clone();
        write_snapshot(&mut out, &last)?;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match line.parse::<ConsoleCommand>() {
                        Ok(command) => match self.apply(command)? {
                            Flow::Continue => {}
                            Flow::PrintState => write_snapshot(&mut out, &self.handle.snapshot())?,
                            Flow::Quit => break,
                        },
                        Err(e) => writeln!(out, "? {e}")?,
                    }
                }
                changed = snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = snapshots.borrow_and_update().clone();
                    if is_notable(&last, &snapshot) {
                        write_snapshot(&mut out, &snapshot)?;
                    }
                    last = snapshot;
                }
                Some(message) = self.notifications.recv() => {
                    writeln!(out, "! {message}")?;
                }
            }
        }

        debug!("input finished, stopping player");
        self.runtime.shutdown().await;
        out.flush()?;
        Ok(out)
    }
}

fn is_notable(previous: &PlayerSnapshot, next: &PlayerSnapshot) -> bool {
    previous.phase != next.phase
        || previous.buffering != next.buffering
        || previous.failure != next.failure
        || previous.source_reference != next.source_reference
}

fn write_snapshot<W: Write>(out: &mut W, snapshot: &PlayerSnapshot) -> Result<()> {
    let line = SnapshotLine {
        snapshot,
        position: snapshot.position_label(),
        duration: snapshot.duration_label(),
    };
    let json = serde_json::to_string(&line).map_err(std::io::Error::from)?;
    writeln!(out, "{json}")?;
    Ok(())
}
