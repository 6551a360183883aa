//! Idle disposal scheduler

use crate::events::PoolEvent;
use crate::lifecycle::PoolLifecycle;
use crate::pool::PoolShared;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// State of the idle-disposal countdown. Exactly one exists per pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisposalState {
    /// No countdown running
    Idle,
    /// Counting down toward disposal
    CountingDown {
        /// Whole seconds left before the pool disposes itself
        remaining: u64,
        /// Tracked handles when the countdown started
        tracked_at_start: usize,
    },
    /// The pool disposed itself or was disposed explicitly; terminal
    Disposed,
}

/// Spawn the single watcher task for a pool.
///
/// The task is the only driver of `DisposalState` transitions, which makes
/// a second concurrent countdown impossible by construction: while a
/// countdown runs, change notifications accumulate as at most one stored
/// permit and are observed at the next tick boundary.
pub(crate) fn spawn_watcher<L: PoolLifecycle>(shared: Arc<PoolShared<L>>) -> JoinHandle<()> {
    tokio::spawn(run_watcher(shared))
}

async fn run_watcher<L: PoolLifecycle>(shared: Arc<PoolShared<L>>) {
    loop {
        shared.changed.notified().await;
        if shared.is_disposed() {
            break;
        }
        if !shared.idle_and_occupied() {
            continue;
        }

        let ticks = shared.config.idle_ticks();
        let tracked_at_start = shared.tracked_count();
        shared.set_disposal_state(DisposalState::CountingDown {
            remaining: ticks,
            tracked_at_start,
        });
        shared
            .metrics
            .countdowns_started
            .fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            pool = %shared.config.name,
            seconds = ticks,
            tracked = tracked_at_start,
            "pool fully idle, disposal countdown started"
        );
        shared.emit(&PoolEvent::CountdownStarted { seconds: ticks });

        let mut remaining = ticks;
        let expired = loop {
            tokio::time::sleep(Duration::from_secs(1)).await;
            // cancellation is observed here, before the decrement lands
            if !shared.idle_and_occupied() {
                break false;
            }
            remaining = remaining.saturating_sub(1);
            shared.set_disposal_state(DisposalState::CountingDown {
                remaining,
                tracked_at_start,
            });
            shared.emit(&PoolEvent::CountdownTick { remaining });
            if remaining == 0 {
                break true;
            }
        };

        if expired && shared.try_dispose_idle() {
            // terminal; try_dispose_idle published the Disposed state
            break;
        }
        if shared.is_disposed() {
            // disposed by an external caller mid-countdown; the terminal
            // state is already published
            break;
        }

        shared
            .metrics
            .countdowns_cancelled
            .fetch_add(1, Ordering::Relaxed);
        tracing::info!(pool = %shared.config.name, "disposal countdown cancelled");
        shared.emit(&PoolEvent::CountdownCancelled);
        shared.set_disposal_state(DisposalState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::errors::PoolError;
    use crate::lifecycle::Activatable;
    use crate::pool::IdlePool;

    struct Sprite {
        visible: bool,
    }

    impl Activatable for Sprite {
        fn activate(&mut self) {
            self.visible = true;
        }

        fn deactivate(&mut self) {
            self.visible = false;
        }
    }

    fn sprite_pool(config: PoolConfig) -> IdlePool<crate::lifecycle::ActivationLifecycle<Sprite, fn() -> Sprite>> {
        fn make() -> Sprite {
            Sprite { visible: false }
        }
        IdlePool::new(crate::lifecycle::ActivationLifecycle::new(make as fn() -> Sprite), config).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn fully_idle_pool_disposes_at_timeout() {
        let pool = sprite_pool(
            PoolConfig::new()
                .with_name("expiry")
                .with_idle_timeout(Duration::from_secs(2))
                .with_initial_capacity(3),
        );
        assert_eq!(pool.count(), 3);

        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(pool.count(), 0);
        assert_eq!(pool.disposal_state(), DisposalState::Disposed);
        assert!(matches!(
            pool.acquire().unwrap_err(),
            PoolError::Disposed { .. }
        ));
        assert_eq!(pool.metrics().total_destroyed, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn acquire_cancels_a_running_countdown() {
        let pool = sprite_pool(
            PoolConfig::new()
                .with_idle_timeout(Duration::from_secs(5))
                .with_initial_capacity(3),
        );

        // let the countdown start and run two ticks
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert!(matches!(
            pool.disposal_state(),
            DisposalState::CountingDown { .. }
        ));

        let handle = pool.acquire().unwrap();

        // well past the original t=5 deadline; disposal must not happen
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(pool.count(), 3);
        assert_eq!(pool.disposal_state(), DisposalState::Idle);
        assert_eq!(pool.metrics().countdowns_cancelled, 1);

        // releasing restarts the countdown from the full timeout
        pool.release(handle).unwrap();
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(pool.count(), 0);
        assert_eq!(pool.disposal_state(), DisposalState::Disposed);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_exposes_remaining_and_start_count() {
        let pool = sprite_pool(
            PoolConfig::new()
                .with_idle_timeout(Duration::from_secs(5))
                .with_initial_capacity(2),
        );

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        match pool.disposal_state() {
            DisposalState::CountingDown {
                remaining,
                tracked_at_start,
            } => {
                assert_eq!(remaining, 2);
                assert_eq!(tracked_at_start, 2);
            }
            other => panic!("expected a running countdown, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn keep_alive_pool_never_counts_down() {
        let pool = sprite_pool(
            PoolConfig::new()
                .with_idle_timeout(Duration::from_secs(1))
                .with_initial_capacity(2)
                .with_keep_alive(),
        );

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(pool.count(), 2);
        assert_eq!(pool.disposal_state(), DisposalState::Idle);
        assert_eq!(pool.metrics().countdowns_started, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn keep_alive_request_cancels_in_flight_countdown() {
        let pool = sprite_pool(
            PoolConfig::new()
                .with_idle_timeout(Duration::from_secs(5))
                .with_initial_capacity(1),
        );

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert!(matches!(
            pool.disposal_state(),
            DisposalState::CountingDown { .. }
        ));

        pool.set_keep_alive(true);
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(pool.count(), 1);
        assert_eq!(pool.disposal_state(), DisposalState::Idle);

        // dropping keep-alive lets the countdown start over
        pool.set_keep_alive(false);
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(pool.disposal_state(), DisposalState::Disposed);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_pool_does_not_count_down() {
        let pool = sprite_pool(PoolConfig::new().with_idle_timeout(Duration::from_secs(1)));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(pool.disposal_state(), DisposalState::Idle);
        assert_eq!(pool.metrics().countdowns_started, 0);

        // once something exists and goes idle, the countdown engages
        let handle = pool.acquire().unwrap();
        pool.release(handle).unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(pool.disposal_state(), DisposalState::Disposed);
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_dispose_stops_the_scheduler() {
        let pool = sprite_pool(
            PoolConfig::new()
                .with_idle_timeout(Duration::from_secs(5))
                .with_initial_capacity(2),
        );

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        pool.dispose().unwrap();
        assert_eq!(pool.disposal_state(), DisposalState::Disposed);

        // no late tick resurrects the pool or fires a second disposal
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(pool.count(), 0);
        assert_eq!(pool.disposal_state(), DisposalState::Disposed);
        assert_eq!(pool.metrics().total_destroyed, 2);
    }
}
