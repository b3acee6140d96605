use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::trace;

const TICK: Duration = Duration::from_secs(1);

/// Cancellable one-second countdown for reflex rounds.
///
/// At most one tick stream exists per timer: arming again tears the previous task down first,
/// and dropping the timer disarms it.
#[derive(Debug, Default)]
pub struct CountdownTimer {
    task: Option<JoinHandle<()>>,
}

impl CountdownTimer {
    /// Create an idle timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting down from `duration_secs`.
    ///
    /// `on_tick` receives the remaining seconds after every elapsed second, including the final
    /// zero; `on_expire` then runs exactly once. Must be called from within a Tokio runtime.
    pub fn arm<T, E>(&mut self, duration_secs: u32, mut on_tick: T, on_expire: E)
    where
        T: FnMut(u32) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        self.disarm();

        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + TICK, TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            let mut remaining = duration_secs;
            while remaining > 0 {
                ticker.tick().await;
                remaining -= 1;
                on_tick(remaining);
            }

            trace!(duration_secs, "countdown expired");
            on_expire();
        }));
    }

    /// Cancel pending ticks. No callback runs after this returns.
    pub fn disarm(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Whether a countdown is still running.
    pub fn is_armed(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}
