//! Poll waiters drive the subscription loop.

use crate::error::Result;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;
use tracing::trace;

use super::types::{PollConfig, PollOutcome};

/// Repeatedly invokes a poll action until its budget runs out, the action
/// returns [`PollOutcome::Stop`], or the action fails.
pub trait PollWaiter {
    fn poll(&mut self, action: &mut dyn FnMut() -> Result<PollOutcome>) -> Result<()>;
}

impl<W: PollWaiter + ?Sized> PollWaiter for &mut W {
    fn poll(&mut self, action: &mut dyn FnMut() -> Result<PollOutcome>) -> Result<()> {
        (**self).poll(action)
    }
}

impl<W: PollWaiter + ?Sized> PollWaiter for Box<W> {
    fn poll(&mut self, action: &mut dyn FnMut() -> Result<PollOutcome>) -> Result<()> {
        (**self).poll(action)
    }
}

/// Runs the action a fixed number of times without sleeping.
#[derive(Clone, Copy, Debug)]
pub struct BoundedPollWaiter {
    times: u64,
}

impl BoundedPollWaiter {
    pub fn new(times: u64) -> Self {
        Self { times }
    }

    /// Poll exactly once.
    pub fn once() -> Self {
        Self::new(1)
    }
}

impl PollWaiter for BoundedPollWaiter {
    fn poll(&mut self, action: &mut dyn FnMut() -> Result<PollOutcome>) -> Result<()> {
        for _ in 0..self.times {
            if action()? == PollOutcome::Stop {
                break;
            }
        }
        Ok(())
    }
}

/// Smallest delay that backoff doubles from, so a zero interval still grows.
const MIN_BACKOFF_STEP: Duration = Duration::from_millis(1);

/// Wakes a sleeping [`IntervalPollWaiter`] and ends its loop.
#[derive(Clone, Debug)]
pub struct PollStopHandle {
    sender: Sender<()>,
}

impl PollStopHandle {
    /// Ask the waiter to stop. Safe to call more than once.
    pub fn stop(&self) {
        let _ = self.sender.try_send(());
    }
}

/// Sleeps between polls, optionally backing off while nothing arrives.
pub struct IntervalPollWaiter {
    config: PollConfig,
    stop_rx: Receiver<()>,
    stop_tx: Sender<()>,
}

impl IntervalPollWaiter {
    pub fn new(config: PollConfig) -> Self {
        let (stop_tx, stop_rx) = bounded(1);
        Self {
            config,
            stop_rx,
            stop_tx,
        }
    }

    /// Handle for stopping this waiter from another thread.
    pub fn stop_handle(&self) -> PollStopHandle {
        PollStopHandle {
            sender: self.stop_tx.clone(),
        }
    }

    /// Delay to use after a poll with `outcome`, given the previous delay.
    fn next_delay(&self, previous: Duration, outcome: PollOutcome) -> Duration {
        let base = self.config.interval();
        match (outcome, self.config.max_backoff()) {
            (PollOutcome::Idle, Some(max)) => (previous.max(MIN_BACKOFF_STEP) * 2).clamp(base, max.max(base)),
            _ => base,
        }
    }

    /// Sleep for `delay`. Returns false if a stop was requested meanwhile.
    fn sleep(&self, delay: Duration) -> bool {
        // The waiter holds a sender, so the channel never disconnects.
        matches!(self.stop_rx.recv_timeout(delay), Err(RecvTimeoutError::Timeout))
    }
}

impl PollWaiter for IntervalPollWaiter {
    fn poll(&mut self, action: &mut dyn FnMut() -> Result<PollOutcome>) -> Result<()> {
        let mut polls = 0u64;
        let mut delay: Option<Duration> = None;

        loop {
            if self.stop_rx.try_recv().is_ok() {
                break;
            }

            let outcome = action()?;
            polls += 1;

            if outcome == PollOutcome::Stop {
                break;
            }
            if self.config.max_polls.is_some_and(|max| polls >= max) {
                break;
            }

            let next = match delay {
                Some(previous) => self.next_delay(previous, outcome),
                None => self.config.interval(),
            };
            delay = Some(next);

            trace!(?outcome, delay_ms = next.as_millis() as u64, "waiting before next poll");
            if !self.sleep(next) {
                break;
            }
        }

        Ok(())
    }
}
