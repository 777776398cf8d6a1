//! Periodic tick sources.
//!
//! A clock never touches session state itself. It emits [`Tick`]s stamped
//! with the generation it was started under; the controller ignores any tick
//! whose generation is not the current one. That is what makes `stop()`
//! final: a tick already queued when the clock stops can no longer apply.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

/// A single periodic tick source.
///
/// `start` on a running clock replaces the previous run; there is never more
/// than one live source per clock. `stop` is idempotent.
pub trait Clock: Send {
    fn start(&mut self, interval: Duration, generation: u64);

    fn stop(&mut self);

    fn is_running(&self) -> bool;
}

/// Tokio-backed clock. Ticks arrive on the receiver returned by [`IntervalClock::new`].
///
/// Must be started from within a tokio runtime.
#[derive(Debug)]
pub struct IntervalClock {
    tx: mpsc::UnboundedSender<Tick>,
    task: Option<JoinHandle<()>>,
}

impl IntervalClock {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, task: None }, rx)
    }
}

impl Clock for IntervalClock {
    fn start(&mut self, interval: Duration, generation: u64) {
        self.stop();

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(error = %e, "interval clock started outside a tokio runtime");
                return;
            }
        };

        let tx = self.tx.clone();
        self.task = Some(handle.spawn(async move {
            // First tick one full interval after start, not immediately.
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(Tick { generation }).is_err() {
                    break;
                }
            }
        }));
        tracing::debug!(generation, interval_ms = interval.as_millis() as u64, "clock started");
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("clock stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for IntervalClock {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Default)]
struct ManualState {
    live: Option<u64>,
    interval: Option<Duration>,
    starts: u32,
    stops: u32,
}

/// Deterministic clock driven by hand.
///
/// Clones share state, so a test can keep one handle while the controller
/// owns the other, then [`fire`](ManualClock::fire) ticks at will.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualState>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ManualState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The tick the live source would emit next, if any.
    pub fn fire(&self) -> Option<Tick> {
        self.state().live.map(|generation| Tick { generation })
    }

    /// Generation of the live run.
    pub fn generation(&self) -> Option<u64> {
        self.state().live
    }

    /// Number of live tick sources (0 or 1).
    pub fn live_sources(&self) -> usize {
        usize::from(self.state().live.is_some())
    }

    pub fn interval(&self) -> Option<Duration> {
        self.state().interval
    }

    pub fn starts(&self) -> u32 {
        self.state().starts
    }

    pub fn stops(&self) -> u32 {
        self.state().stops
    }
}

impl Clock for ManualClock {
    fn start(&mut self, interval: Duration, generation: u64) {
        let mut state = self.state();
        if state.live.take().is_some() {
            state.stops += 1;
        }
        state.live = Some(generation);
        state.interval = Some(interval);
        state.starts += 1;
    }

    fn stop(&mut self) {
        let mut state = self.state();
        if state.live.take().is_some() {
            state.stops += 1;
        }
    }

    fn is_running(&self) -> bool {
        self.state().live.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_replaces_previous_run() {
        let mut clock = ManualClock::new();
        let observer = clock.clone();

        clock.start(Duration::from_secs(1), 1);
        clock.start(Duration::from_secs(1), 2);

        assert_eq!(observer.live_sources(), 1);
        assert_eq!(observer.fire(), Some(Tick { generation: 2 }));
        assert_eq!(observer.starts(), 2);
        assert_eq!(observer.stops(), 1);
    }

    #[test]
    fn manual_clock_stop_is_idempotent() {
        let mut clock = ManualClock::new();
        clock.start(Duration::from_secs(1), 7);
        clock.stop();
        clock.stop();
        assert!(!clock.is_running());
        assert_eq!(clock.stops(), 1);
        assert_eq!(clock.fire(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_clock_ticks_once_per_interval() {
        let (mut clock, mut rx) = IntervalClock::new();
        clock.start(Duration::from_secs(1), 3);

        tokio::time::sleep(Duration::from_millis(3500)).await;
        let mut ticks = Vec::new();
        while let Ok(tick) = rx.try_recv() {
            ticks.push(tick);
        }
        assert_eq!(ticks, vec![Tick { generation: 3 }; 3]);
        assert!(clock.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn interval_clock_restart_leaves_single_source() {
        let (mut clock, mut rx) = IntervalClock::new();
        clock.start(Duration::from_secs(1), 1);
        clock.start(Duration::from_secs(1), 2);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        let mut ticks = Vec::new();
        while let Ok(tick) = rx.try_recv() {
            ticks.push(tick);
        }
        assert_eq!(ticks, vec![Tick { generation: 2 }; 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_clock_stop_ends_ticks() {
        let (mut clock, mut rx) = IntervalClock::new();
        clock.start(Duration::from_secs(1), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;
        clock.stop();
        while rx.try_recv().is_ok() {}

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
        assert!(!clock.is_running());
    }
}
