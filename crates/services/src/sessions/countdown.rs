use std::ops::ControlFlow;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// A cancellable timer task.
///
/// Dropping the countdown cancels it, so at most one timer is alive per owner.
#[derive(Debug)]
pub(crate) struct Countdown {
    handle: JoinHandle<()>,
}

impl Countdown {
    /// Call `on_tick` every `period`, first after one full period, until it
    /// returns `ControlFlow::Break`.
    pub(crate) fn repeating<F>(runtime: &Handle, period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        let handle = runtime.spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if on_tick().is_break() {
                    break;
                }
            }
        });
        Self { handle }
    }

    /// Call `on_fire` once after `delay`.
    pub(crate) fn once<F>(runtime: &Handle, delay: Duration, on_fire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = runtime.spawn(async move {
            time::sleep(delay).await;
            on_fire();
        });
        Self { handle }
    }

    pub(crate) fn cancel(&self) {
        self.handle.abort();
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn repeating_ticks_once_per_period_until_break() {
        let count = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&count);
        let countdown = Countdown::repeating(&Handle::current(), Duration::from_secs(1), move || {
            if seen.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(countdown.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_countdown_stops_ticking() {
        let count = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&count);
        let countdown = Countdown::repeating(&Handle::current(), Duration::from_secs(1), move || {
            seen.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        });

        time::sleep(Duration::from_millis(2_500)).await;
        countdown.cancel();
        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_once_never_fires() {
        let fired = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&fired);
        let countdown = Countdown::once(&Handle::current(), Duration::from_secs(2), move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        drop(countdown);

        time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
