//! Cancellable periodic tasks.
//!
//! Pollers are scheduled through the `Scheduler` trait so the shell never
//! touches timers directly. `TokioScheduler` runs on the tokio clock, which
//! tests pause and advance deterministically.

use std::future::Future;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// What a poller wants after one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Stop,
}

pub type TickFn = Box<dyn FnMut() -> BoxFuture<'static, Tick> + Send>;

/// Box a closure returning a future into a `TickFn`.
pub fn tick_fn<F, Fut>(mut f: F) -> TickFn
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Tick> + Send + 'static,
{
    Box::new(move || f().boxed())
}

pub trait Scheduler: Send + Sync {
    /// Run `tick` every `period`, first after one full period.
    fn every(&self, name: &'static str, period: Duration, tick: TickFn) -> PeriodicTask;
}

/// Handle to a running poller. Dropping it cancels the poller.
pub struct PeriodicTask {
    name: &'static str,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    pub fn new(
        name: &'static str,
        cancel: CancellationToken,
        handle: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            name,
            cancel,
            handle,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stop scheduling further ticks. A tick already running finishes.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            tracing::debug!("Cancelling {} poller", self.name);
            self.cancel.cancel();
        }
    }

    /// True once the poller has stopped itself or been cancelled.
    pub fn is_finished(&self) -> bool {
        match &self.handle {
            Some(handle) => handle.is_finished(),
            None => self.cancel.is_cancelled(),
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn every(&self, name: &'static str, period: Duration, mut tick: TickFn) -> PeriodicTask {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!("{} poller started ({:?})", name, period);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        tracing::info!("{} poller cancelled", name);
                        break;
                    }
                    _ = interval.tick() => {}
                }

                if tick().await == Tick::Stop {
                    tracing::info!("{} poller stopped", name);
                    break;
                }
            }
        });

        PeriodicTask::new(name, cancel, Some(handle))
    }
}
