//! Core pool implementation

use crate::config::PoolConfig;
use crate::errors::{PoolError, PoolResult};
use crate::events::{PoolEvent, PoolObserver};
use crate::lifecycle::PoolLifecycle;
use crate::metrics::{MetricsExporter, MetricsTracker, PoolMetrics};
use crate::registry::{ReleaseOutcome, ResourceHandle, ResourceStatus, TrackingRegistry};
use crate::scheduler::{spawn_watcher, DisposalState};

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// Registry, resource storage and the idle reuse queue, all behind one lock
/// so every read-then-branch-then-write sequence is atomic relative to the
/// scheduler and to other callers.
pub(crate) struct PoolInner<T> {
    pub(crate) registry: TrackingRegistry,
    pub(crate) resources: HashMap<ResourceHandle, T>,
    pub(crate) idle: VecDeque<ResourceHandle>,
}

/// State shared between the pool handle and its scheduler task.
pub(crate) struct PoolShared<L: PoolLifecycle> {
    pub(crate) config: PoolConfig,
    pub(crate) lifecycle: L,
    pub(crate) inner: Mutex<PoolInner<L::Resource>>,
    pub(crate) keep_alive: AtomicBool,
    pub(crate) disposed: AtomicBool,
    pub(crate) changed: Notify,
    pub(crate) next_id: AtomicUsize,
    pub(crate) metrics: MetricsTracker,
    pub(crate) observers: Mutex<Vec<Arc<dyn PoolObserver>>>,
    pub(crate) disposal_state: Mutex<DisposalState>,
}

impl<L: PoolLifecycle> PoolShared<L> {
    pub(crate) fn name(&self) -> &str {
        &self.config.name
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Countdown predicate: nothing checked out, something to dispose, and
    /// neither keep-alive nor disposal already in effect.
    pub(crate) fn idle_and_occupied(&self) -> bool {
        if self.is_disposed() || self.keep_alive.load(Ordering::Acquire) {
            return false;
        }
        let inner = self.inner.lock();
        inner.registry.active_count() == 0 && inner.registry.count() > 0
    }

    pub(crate) fn tracked_count(&self) -> usize {
        self.inner.lock().registry.count()
    }

    pub(crate) fn set_disposal_state(&self, state: DisposalState) {
        *self.disposal_state.lock() = state;
    }

    /// Deliver one event to tracing and every observer. Must be called with
    /// the inner lock released. The list is cloned out first so callbacks
    /// run without the observers lock and may themselves subscribe.
    pub(crate) fn emit(&self, event: &PoolEvent) {
        tracing::trace!(pool = %self.config.name, ?event, "pool event");
        let observers = self.observers.lock().clone();
        for observer in &observers {
            observer.on_pool_event(event);
        }
    }

    /// Deliver a batch of transition events and raise the change
    /// notification the scheduler waits on.
    pub(crate) fn notify_change(&self, events: Vec<PoolEvent>) {
        if events.is_empty() {
            return;
        }
        for event in &events {
            self.emit(event);
        }
        self.changed.notify_one();
    }

    /// Build one resource through the create hook and track it as Inactive.
    /// The caller decides whether the handle goes to the idle queue or is
    /// acquired immediately.
    pub(crate) fn create_locked(
        &self,
        inner: &mut PoolInner<L::Resource>,
    ) -> PoolResult<ResourceHandle> {
        let resource = self
            .lifecycle
            .create()
            .map_err(|err| err.with_pool(self.name()))?;
        let handle = ResourceHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        inner.resources.insert(handle, resource);
        inner.registry.insert_inactive(handle);
        self.metrics.total_created.fetch_add(1, Ordering::Relaxed);
        Ok(handle)
    }

    /// Destroy every tracked resource and clear the registry. The disposed
    /// flag must already be set by the caller.
    pub(crate) fn drain_locked(&self, inner: &mut PoolInner<L::Resource>) -> Vec<ResourceHandle> {
        let mut destroyed = Vec::with_capacity(inner.resources.len());
        for (handle, resource) in inner.resources.drain() {
            inner.registry.remove(handle);
            self.lifecycle.destroy(resource);
            self.metrics.total_destroyed.fetch_add(1, Ordering::Relaxed);
            destroyed.push(handle);
        }
        debug_assert_eq!(inner.registry.count(), 0);
        inner.idle.clear();
        destroyed
    }

    /// End of a disposal path: publish the terminal state and the destroy
    /// events, then wake the scheduler so it can exit.
    pub(crate) fn finish_dispose(&self, destroyed: Vec<ResourceHandle>) {
        self.set_disposal_state(DisposalState::Disposed);
        for handle in destroyed {
            self.emit(&PoolEvent::ResourceDestroyed { handle });
        }
        self.emit(&PoolEvent::PoolDisposed);
        tracing::info!(pool = %self.config.name, "pool disposed");
        self.changed.notify_one();
    }

    /// Disposal from the scheduler. Re-validates the idle predicate under
    /// the lock, so an acquire that slipped in after the last tick wins and
    /// the disposal turns into a cancellation.
    pub(crate) fn try_dispose_idle(&self) -> bool {
        let destroyed = {
            let mut inner = self.inner.lock();
            if self.is_disposed()
                || self.keep_alive.load(Ordering::Acquire)
                || inner.registry.active_count() != 0
                || inner.registry.count() == 0
            {
                return false;
            }
            self.disposed.store(true, Ordering::Release);
            self.drain_locked(&mut inner)
        };
        self.finish_dispose(destroyed);
        true
    }
}

/// A pool of reusable resources that disposes itself after sitting fully
/// idle for the configured duration.
///
/// Handles are checked out with [`acquire`](Self::acquire) and given back
/// with [`release`](Self::release); the registry keeps every handle's
/// Active/Inactive status consistent with those operations. A background
/// scheduler task watches the registry and, once nothing is checked out and
/// at least one resource is tracked, counts down the idle timeout and tears
/// the whole pool down unless some activity cancels it first.
///
/// Must be constructed inside a Tokio runtime; the scheduler task is
/// spawned at construction.
pub struct IdlePool<L: PoolLifecycle> {
    shared: Arc<PoolShared<L>>,
    watcher: JoinHandle<()>,
}

impl<L: PoolLifecycle> IdlePool<L> {
    /// Create a pool, pre-populating `initial_capacity` resources as
    /// Inactive.
    pub fn new(lifecycle: L, config: PoolConfig) -> PoolResult<Self> {
        let keep_alive = config.keep_alive;
        let shared = Arc::new(PoolShared {
            config,
            lifecycle,
            inner: Mutex::new(PoolInner {
                registry: TrackingRegistry::new(),
                resources: HashMap::new(),
                idle: VecDeque::new(),
            }),
            keep_alive: AtomicBool::new(keep_alive),
            disposed: AtomicBool::new(false),
            changed: Notify::new(),
            next_id: AtomicUsize::new(0),
            metrics: MetricsTracker::new(),
            observers: Mutex::new(Vec::new()),
            disposal_state: Mutex::new(DisposalState::Idle),
        });

        let mut events = Vec::with_capacity(shared.config.initial_capacity);
        {
            let mut inner = shared.inner.lock();
            for _ in 0..shared.config.initial_capacity {
                let handle = shared.create_locked(&mut inner)?;
                inner.idle.push_back(handle);
                events.push(PoolEvent::ResourceCreated { handle });
            }
        }
        shared.notify_change(events);

        let watcher = spawn_watcher(Arc::clone(&shared));
        Ok(Self { shared, watcher })
    }

    /// Check a resource out of the pool.
    ///
    /// Reuses the oldest idle resource when one exists, otherwise creates a
    /// new one through the create hook. The soft capacity cap never fails an
    /// acquire; exceeding it over-allocates with a warning.
    pub fn acquire(&self) -> PoolResult<ResourceHandle> {
        self.ensure_live()?;
        let mut events = Vec::with_capacity(2);
        {
            let mut inner = self.shared.inner.lock();
            // the disposed flag only flips while this lock is held, so a
            // disposal landing after ensure_live is caught here
            if self.shared.is_disposed() {
                return Err(PoolError::Disposed {
                    pool: self.shared.name().to_string(),
                });
            }
            let handle = match inner.idle.pop_front() {
                Some(handle) => handle,
                None => {
                    let tracked = inner.registry.count();
                    let cap = self.shared.config.effective_max_capacity();
                    if tracked >= cap {
                        tracing::warn!(
                            pool = %self.shared.name(),
                            tracked,
                            max_capacity = cap,
                            "soft capacity exceeded; over-allocating"
                        );
                    }
                    let handle = self.shared.create_locked(&mut inner)?;
                    events.push(PoolEvent::ResourceCreated { handle });
                    handle
                }
            };

            inner.registry.set_active(handle);
            let resource = inner
                .resources
                .get_mut(&handle)
                .ok_or_else(|| PoolError::UnknownHandle {
                    pool: self.shared.name().to_string(),
                    handle,
                })?;
            if let Err(err) = self.shared.lifecycle.on_acquire(resource) {
                // roll the flip back so a failed activation cannot leak an
                // Active entry; the resource stays tracked and idle
                inner.registry.set_inactive(handle);
                inner.idle.push_front(handle);
                drop(inner);
                self.shared.notify_change(events);
                return Err(err.with_pool(self.shared.name()));
            }
            self.shared
                .metrics
                .total_acquired
                .fetch_add(1, Ordering::Relaxed);
            events.push(PoolEvent::ResourceAcquired { handle });
            drop(inner);
            self.shared.notify_change(events);
            tracing::debug!(pool = %self.shared.name(), ?handle, "resource acquired");
            Ok(handle)
        }
    }

    /// Return a resource to the pool.
    ///
    /// Unknown handles are a silent no-op. Releasing an already-Inactive
    /// handle is a [`PoolError::DuplicateRelease`] when duplicate-release
    /// checking is enabled and a silent no-op otherwise.
    pub fn release(&self, handle: ResourceHandle) -> PoolResult<()> {
        self.ensure_live()?;
        self.release_one(handle, self.shared.config.duplicate_release_check)
    }

    /// Release every currently Active handle, using a snapshot of the
    /// Active set taken before iterating. Hook failures are collected and
    /// the first one is returned after every handle has been attempted.
    pub fn release_all(&self) -> PoolResult<()> {
        self.ensure_live()?;
        let snapshot = self.shared.inner.lock().registry.active_handles();
        let mut first_err = None;
        for handle in snapshot {
            // handles released by someone else mid-iteration are skipped,
            // never reported as duplicates
            if let Err(err) = self.release_one(handle, false) {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn release_one(&self, handle: ResourceHandle, check_duplicates: bool) -> PoolResult<()> {
        let event = {
            let mut inner = self.shared.inner.lock();
            if self.shared.is_disposed() {
                return Err(PoolError::Disposed {
                    pool: self.shared.name().to_string(),
                });
            }
            match inner.registry.set_inactive(handle) {
                ReleaseOutcome::Released => {
                    let resource = inner
                        .resources
                        .get_mut(&handle)
                        .ok_or_else(|| PoolError::UnknownHandle {
                            pool: self.shared.name().to_string(),
                            handle,
                        })?;
                    if let Err(err) = self.shared.lifecycle.on_release(resource) {
                        inner.registry.set_active(handle);
                        return Err(err.with_pool(self.shared.name()));
                    }
                    inner.idle.push_back(handle);
                    self.shared
                        .metrics
                        .total_released
                        .fetch_add(1, Ordering::Relaxed);
                    PoolEvent::ResourceReleased { handle }
                }
                ReleaseOutcome::AlreadyInactive => {
                    if check_duplicates {
                        self.shared
                            .metrics
                            .duplicate_releases
                            .fetch_add(1, Ordering::Relaxed);
                        return Err(PoolError::DuplicateRelease {
                            pool: self.shared.name().to_string(),
                            handle,
                        });
                    }
                    return Ok(());
                }
                ReleaseOutcome::Unknown => return Ok(()),
            }
        };
        self.shared.notify_change(vec![event]);
        tracing::debug!(pool = %self.shared.name(), ?handle, "resource released");
        Ok(())
    }

    /// Run a closure against the resource behind a handle.
    pub fn with_resource<R>(
        &self,
        handle: ResourceHandle,
        f: impl FnOnce(&mut L::Resource) -> R,
    ) -> PoolResult<R> {
        self.ensure_live()?;
        let mut inner = self.shared.inner.lock();
        if self.shared.is_disposed() {
            return Err(PoolError::Disposed {
                pool: self.shared.name().to_string(),
            });
        }
        match inner.resources.get_mut(&handle) {
            Some(resource) => Ok(f(resource)),
            None => Err(PoolError::UnknownHandle {
                pool: self.shared.name().to_string(),
                handle,
            }),
        }
    }

    /// Destroy every tracked resource and render the pool unusable.
    ///
    /// Count queries keep working afterwards and report zero; mutating
    /// operations fail with [`PoolError::Disposed`].
    pub fn dispose(&self) -> PoolResult<()> {
        let destroyed = {
            let mut inner = self.shared.inner.lock();
            if self.shared.disposed.swap(true, Ordering::AcqRel) {
                return Err(PoolError::Disposed {
                    pool: self.shared.name().to_string(),
                });
            }
            self.shared.drain_locked(&mut inner)
        };
        self.shared.finish_dispose(destroyed);
        Ok(())
    }

    /// Number of handles currently checked out.
    pub fn active_count(&self) -> usize {
        self.shared.inner.lock().registry.active_count()
    }

    /// Number of handles currently available for reuse.
    pub fn inactive_count(&self) -> usize {
        self.shared.inner.lock().registry.inactive_count()
    }

    /// Total tracked handles.
    pub fn count(&self) -> usize {
        self.shared.inner.lock().registry.count()
    }

    /// Status of one handle, if it is tracked.
    pub fn status(&self, handle: ResourceHandle) -> Option<ResourceStatus> {
        self.shared.inner.lock().registry.status(handle)
    }

    /// Current state of the idle-disposal scheduler.
    pub fn disposal_state(&self) -> DisposalState {
        *self.shared.disposal_state.lock()
    }

    /// Toggle keep-alive. Turning it on cancels an in-flight countdown at
    /// its next tick; turning it off lets an idle pool start counting down
    /// again.
    pub fn set_keep_alive(&self, keep_alive: bool) {
        self.shared.keep_alive.store(keep_alive, Ordering::Release);
        self.shared.changed.notify_one();
    }

    /// Register an external observer for pool events. Safe to call from
    /// inside an observer callback.
    pub fn subscribe(&self, observer: impl PoolObserver + 'static) {
        self.shared.observers.lock().push(Arc::new(observer));
    }

    /// Point-in-time metrics snapshot.
    pub fn metrics(&self) -> PoolMetrics {
        let (active, inactive) = {
            let inner = self.shared.inner.lock();
            (
                inner.registry.active_count(),
                inner.registry.inactive_count(),
            )
        };
        self.shared
            .metrics
            .snapshot(active, inactive, self.shared.config.effective_max_capacity())
    }

    /// Export metrics as a HashMap
    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.metrics().export()
    }

    /// Export metrics in Prometheus exposition format
    pub fn export_metrics_prometheus(&self, tags: Option<&HashMap<String, String>>) -> String {
        MetricsExporter::export_prometheus(&self.metrics(), self.shared.name(), tags)
    }

    fn ensure_live(&self) -> PoolResult<()> {
        if self.shared.is_disposed() {
            return Err(PoolError::Disposed {
                pool: self.shared.name().to_string(),
            });
        }
        Ok(())
    }
}

impl<L: PoolLifecycle> Drop for IdlePool<L> {
    fn drop(&mut self) {
        self.watcher.abort();
        if !self.shared.disposed.swap(true, Ordering::AcqRel) {
            let mut inner = self.shared.inner.lock();
            let _ = self.shared.drain_locked(&mut inner);
        }
    }
}
