//! Tokio-backed poll timer

use crate::events::PlayerInput;
use crate::poller::{PollToken, Ticker};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// `interval_at` panics on a zero period
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// [`Ticker`] that feeds `PlayerInput::Tick` into the player's input channel
///
/// Must be started from within a tokio runtime. Aborting the task is the
/// cancellation; a tick already queued when that happens is rejected by the
/// poller because its token is no longer live.
#[derive(Debug)]
pub struct TokioTicker {
    inputs: UnboundedSender<PlayerInput>,
    task: Option<(PollToken, JoinHandle<()>)>,
}

impl TokioTicker {
    pub fn new(inputs: UnboundedSender<PlayerInput>) -> Self {
        Self { inputs, task: None }
    }

    fn abort(&mut self) {
        if let Some((_, task)) = self.task.take() {
            task.abort();
        }
    }
}

impl Ticker for TokioTicker {
    fn start(&mut self, token: PollToken, period: Duration) {
        self.abort();
        let period = period.max(MIN_PERIOD);
        let inputs = self.inputs.clone();
        let task = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if inputs.send(PlayerInput::Tick(token)).is_err() {
                    break;
                }
            }
        });
        self.task = Some((token, task));
    }

    fn cancel(&mut self, token: PollToken) {
        if matches!(self.task, Some((live, _)) if live == token) {
            self.abort();
        }
    }
}

impl Drop for TokioTicker {
    fn drop(&mut self) {
        self.abort();
    }
}
