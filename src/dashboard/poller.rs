use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::config::PollingSettings;

/// Trading control state. Each state owns a polling cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradingState {
    Idle,
    Active,
}

impl TradingState {
    pub fn from_flag(is_trading: bool) -> Self {
        if is_trading {
            TradingState::Active
        } else {
            TradingState::Idle
        }
    }

    pub fn is_trading(&self) -> bool {
        matches!(self, TradingState::Active)
    }

    pub fn cadence(&self, settings: &PollingSettings) -> Duration {
        match self {
            TradingState::Idle => Duration::from_millis(settings.idle_interval_ms),
            TradingState::Active => Duration::from_millis(settings.active_interval_ms),
        }
    }
}

impl fmt::Display for TradingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradingState::Idle => write!(f, "Idle"),
            TradingState::Active => write!(f, "Active"),
        }
    }
}

struct ArmedTimer {
    cadence: TradingState,
    period: Duration,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Slot {
    armed: Option<ArmedTimer>,
    closed: bool,
}

/// A single repeating timer. Re-arming aborts the running task before the
/// new one is spawned, so at most one timer is ever live. Once closed it
/// refuses to re-arm.
pub struct PollTimer {
    slot: Mutex<Slot>,
}

impl PollTimer {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::default()),
        }
    }

    /// Starts ticking every `period`, first tick one period from now. Each
    /// tick's work is spawned so a slow refresh never delays the next tick.
    /// Returns false when the timer has been closed.
    pub fn rearm<F, Fut>(&self, cadence: TradingState, period: Duration, on_tick: F) -> bool
    where
        F: Fn(TradingState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.lock();
        if slot.closed {
            return false;
        }
        if let Some(previous) = slot.armed.take() {
            previous.handle.abort();
        }

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                tokio::spawn(on_tick(cadence));
            }
        });

        slot.armed = Some(ArmedTimer {
            cadence,
            period,
            handle,
        });
        true
    }

    /// Returns whether a timer was running.
    pub fn cancel(&self) -> bool {
        Self::abort(&mut self.lock())
    }

    /// Cancels and blocks every later `rearm`. Returns whether a timer was
    /// running.
    pub fn close(&self) -> bool {
        let mut slot = self.lock();
        slot.closed = true;
        Self::abort(&mut slot)
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn cadence(&self) -> Option<TradingState> {
        self.lock().armed.as_ref().map(|timer| timer.cadence)
    }

    pub fn period(&self) -> Option<Duration> {
        self.lock().armed.as_ref().map(|timer| timer.period)
    }

    fn abort(slot: &mut Slot) -> bool {
        match slot.armed.take() {
            Some(timer) => {
                timer.handle.abort();
                true
            }
            None => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for PollTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_cadence_per_state() {
        let settings = PollingSettings::default();
        assert_eq!(TradingState::Idle.cadence(&settings), Duration::from_millis(5_000));
        assert_eq!(TradingState::Active.cadence(&settings), Duration::from_millis(1_000));
        assert_eq!(TradingState::from_flag(true), TradingState::Active);
        assert!(!TradingState::from_flag(false).is_trading());
    }

    fn counting_timer(timer: &PollTimer, state: TradingState, period_ms: u64, hits: &Arc<AtomicUsize>) -> bool {
        let hits = Arc::clone(hits);
        timer.rearm(state, Duration::from_millis(period_ms), move |_| {
            let hits = Arc::clone(&hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_waits_one_period() {
        let timer = PollTimer::new();
        let hits = Arc::new(AtomicUsize::new(0));
        counting_timer(&timer, TradingState::Idle, 5_000, &hits);

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(10_200)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_running_timer() {
        let timer = PollTimer::new();
        let idle_hits = Arc::new(AtomicUsize::new(0));
        let active_hits = Arc::new(AtomicUsize::new(0));

        counting_timer(&timer, TradingState::Idle, 5_000, &idle_hits);
        counting_timer(&timer, TradingState::Active, 1_000, &active_hits);
        assert_eq!(timer.cadence(), Some(TradingState::Active));
        assert_eq!(timer.period(), Some(Duration::from_millis(1_000)));

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        assert_eq!(idle_hits.load(Ordering::SeqCst), 0);
        assert_eq!(active_hits.load(Ordering::SeqCst), 5);

        assert!(timer.cancel());
        assert!(!timer.cancel());
        assert_eq!(timer.cadence(), None);
        tokio::time::sleep(Duration::from_millis(3_000)).await;
        assert_eq!(active_hits.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_timer_refuses_rearm() {
        let timer = PollTimer::new();
        let hits = Arc::new(AtomicUsize::new(0));
        assert!(counting_timer(&timer, TradingState::Idle, 5_000, &hits));

        assert!(timer.close());
        assert!(timer.is_closed());
        assert!(!timer.close());

        assert!(!counting_timer(&timer, TradingState::Active, 1_000, &hits));
        assert_eq!(timer.cadence(), None);
        assert_eq!(timer.period(), None);

        tokio::time::sleep(Duration::from_millis(12_000)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
