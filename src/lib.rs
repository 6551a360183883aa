//! # idlepool
//!
//! Self-disposing object pool: hands out reusable resource instances,
//! tracks every handle's Active/Inactive status, and tears the whole pool
//! down after it has sat completely idle for a configurable duration.
//!
//! ## Features
//!
//! - Handle-based acquire/release with a consistent tracking registry
//! - Overridable lifecycle hooks for create/acquire/release/destroy
//! - Default activation hooks for resource kinds with an on/off capability
//! - Cancellable, restartable idle-timeout countdown per pool
//! - Keep-alive switch to suspend self-disposal
//! - Soft maximum capacity (over-allocates with a warning, never fails)
//! - Duplicate-release detection (opt-in)
//! - Pool event observers for display and telemetry collaborators
//! - Metrics with Prometheus-format export
//!
//! ## Quick Start
//!
//! ```rust
//! use idlepool::{Activatable, ActivationLifecycle, IdlePool, PoolConfig};
//! use std::time::Duration;
//!
//! struct Sprite { visible: bool }
//!
//! impl Activatable for Sprite {
//!     fn activate(&mut self) { self.visible = true; }
//!     fn deactivate(&mut self) { self.visible = false; }
//! }
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let pool = IdlePool::new(
//!     ActivationLifecycle::new(|| Sprite { visible: false }),
//!     PoolConfig::new()
//!         .with_initial_capacity(2)
//!         .with_idle_timeout(Duration::from_secs(30)),
//! ).unwrap();
//!
//! let handle = pool.acquire().unwrap();
//! assert_eq!(pool.active_count(), 1);
//! pool.release(handle).unwrap();
//! // once every handle is back, the idle countdown starts; after 30
//! // seconds without activity the pool disposes itself
//! # });
//! ```

mod config;
mod errors;
mod events;
mod lifecycle;
mod metrics;
mod pool;
mod registry;
mod scheduler;

pub use config::{PoolConfig, MAX_IDLE_TIMEOUT, MIN_IDLE_TIMEOUT};
pub use errors::{PoolError, PoolResult};
pub use events::{PoolEvent, PoolObserver};
pub use lifecycle::{Activatable, ActivationLifecycle, FactoryLifecycle, PoolLifecycle};
pub use metrics::{MetricsExporter, PoolMetrics};
pub use pool::IdlePool;
pub use registry::{ResourceHandle, ResourceStatus};
pub use scheduler::DisposalState;
