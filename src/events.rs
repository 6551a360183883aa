//! Change-notification channel: pool events and external observers

use crate::registry::ResourceHandle;

/// One pool transition or scheduler decision.
///
/// Every registry mutation produces exactly one resource event, in
/// create/acquire/release/destroy order. The countdown events are
/// informational; the scheduler reads pool state directly and does not
/// depend on observers seeing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEvent {
    ResourceCreated { handle: ResourceHandle },
    ResourceAcquired { handle: ResourceHandle },
    ResourceReleased { handle: ResourceHandle },
    ResourceDestroyed { handle: ResourceHandle },
    CountdownStarted { seconds: u64 },
    CountdownTick { remaining: u64 },
    CountdownCancelled,
    PoolDisposed,
}

/// External subscriber to pool events (display, telemetry).
///
/// Observers are invoked synchronously, outside the pool lock, in
/// subscription order. They must not call mutating pool operations from
/// inside the callback; registering further observers is allowed.
pub trait PoolObserver: Send + Sync {
    fn on_pool_event(&self, event: &PoolEvent);
}

impl<F> PoolObserver for F
where
    F: Fn(&PoolEvent) + Send + Sync,
{
    fn on_pool_event(&self, event: &PoolEvent) {
        self(event)
    }
}
