//! Metrics collection and export

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Point-in-time metrics snapshot for a pool
///
/// # Examples
///
/// ```
/// use idlepool::{ActivationLifecycle, Activatable, IdlePool, PoolConfig};
///
/// struct Unit { on: bool }
/// impl Activatable for Unit {
///     fn activate(&mut self) { self.on = true; }
///     fn deactivate(&mut self) { self.on = false; }
/// }
///
/// # let rt = tokio::runtime::Runtime::new().unwrap();
/// # rt.block_on(async {
/// let pool = IdlePool::new(
///     ActivationLifecycle::new(|| Unit { on: false }),
///     PoolConfig::new().with_initial_capacity(2),
/// ).unwrap();
///
/// let _handle = pool.acquire().unwrap();
/// let metrics = pool.metrics();
/// assert_eq!(metrics.total_acquired, 1);
/// assert_eq!(metrics.active, 1);
/// # });
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "metrics", derive(serde::Serialize))]
pub struct PoolMetrics {
    /// Total resources created
    pub total_created: usize,

    /// Total successful acquisitions
    pub total_acquired: usize,

    /// Total releases that flipped a handle back to Inactive
    pub total_released: usize,

    /// Total resources destroyed
    pub total_destroyed: usize,

    /// Releases rejected by duplicate-release checking
    pub duplicate_releases: usize,

    /// Idle countdowns started
    pub countdowns_started: usize,

    /// Idle countdowns cancelled before expiry
    pub countdowns_cancelled: usize,

    /// Currently Active handles
    pub active: usize,

    /// Currently Inactive handles
    pub inactive: usize,

    /// Soft maximum capacity
    pub max_capacity: usize,

    /// Active handles over the soft cap (0.0 to 1.0 and beyond when
    /// over-allocated)
    pub utilization: f64,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("total_created".to_string(), self.total_created.to_string());
        metrics.insert("total_acquired".to_string(), self.total_acquired.to_string());
        metrics.insert("total_released".to_string(), self.total_released.to_string());
        metrics.insert("total_destroyed".to_string(), self.total_destroyed.to_string());
        metrics.insert("duplicate_releases".to_string(), self.duplicate_releases.to_string());
        metrics.insert("countdowns_started".to_string(), self.countdowns_started.to_string());
        metrics.insert("countdowns_cancelled".to_string(), self.countdowns_cancelled.to_string());
        metrics.insert("active".to_string(), self.active.to_string());
        metrics.insert("inactive".to_string(), self.inactive.to_string());
        metrics.insert("max_capacity".to_string(), self.max_capacity.to_string());
        metrics.insert("utilization".to_string(), format!("{:.2}", self.utilization));
        metrics
    }
}

/// Metrics exporter for Prometheus format
pub struct MetricsExporter;

impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        let mut output = String::new();
        let labels = Self::format_labels(pool_name, tags);

        // Gauge metrics
        output.push_str("# HELP idlepool_handles_active Currently active handles\n");
        output.push_str("# TYPE idlepool_handles_active gauge\n");
        output.push_str(&format!("idlepool_handles_active{{{}}} {}\n", labels, metrics.active));

        output.push_str("# HELP idlepool_handles_inactive Currently inactive handles\n");
        output.push_str("# TYPE idlepool_handles_inactive gauge\n");
        output.push_str(&format!("idlepool_handles_inactive{{{}}} {}\n", labels, metrics.inactive));

        output.push_str("# HELP idlepool_utilization Active handles over the soft cap\n");
        output.push_str("# TYPE idlepool_utilization gauge\n");
        output.push_str(&format!("idlepool_utilization{{{}}} {:.2}\n", labels, metrics.utilization));

        // Counter metrics
        output.push_str("# HELP idlepool_resources_created_total Total resources created\n");
        output.push_str("# TYPE idlepool_resources_created_total counter\n");
        output.push_str(&format!("idlepool_resources_created_total{{{}}} {}\n", labels, metrics.total_created));

        output.push_str("# HELP idlepool_resources_acquired_total Total acquisitions\n");
        output.push_str("# TYPE idlepool_resources_acquired_total counter\n");
        output.push_str(&format!("idlepool_resources_acquired_total{{{}}} {}\n", labels, metrics.total_acquired));

        output.push_str("# HELP idlepool_resources_released_total Total releases\n");
        output.push_str("# TYPE idlepool_resources_released_total counter\n");
        output.push_str(&format!("idlepool_resources_released_total{{{}}} {}\n", labels, metrics.total_released));

        output.push_str("# HELP idlepool_resources_destroyed_total Total resources destroyed\n");
        output.push_str("# TYPE idlepool_resources_destroyed_total counter\n");
        output.push_str(&format!("idlepool_resources_destroyed_total{{{}}} {}\n", labels, metrics.total_destroyed));

        output.push_str("# HELP idlepool_duplicate_releases_total Releases rejected as duplicates\n");
        output.push_str("# TYPE idlepool_duplicate_releases_total counter\n");
        output.push_str(&format!("idlepool_duplicate_releases_total{{{}}} {}\n", labels, metrics.duplicate_releases));

        output.push_str("# HELP idlepool_countdowns_started_total Idle countdowns started\n");
        output.push_str("# TYPE idlepool_countdowns_started_total counter\n");
        output.push_str(&format!("idlepool_countdowns_started_total{{{}}} {}\n", labels, metrics.countdowns_started));

        output.push_str("# HELP idlepool_countdowns_cancelled_total Idle countdowns cancelled\n");
        output.push_str("# TYPE idlepool_countdowns_cancelled_total counter\n");
        output.push_str(&format!("idlepool_countdowns_cancelled_total{{{}}} {}\n", labels, metrics.countdowns_cancelled));

        output
    }

    fn format_labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> String {
        let mut labels = vec![format!("pool=\"{}\"", pool_name)];

        if let Some(tags) = tags {
            for (key, value) in tags {
                labels.push(format!("{}=\"{}\"", key, value));
            }
        }

        labels.join(",")
    }
}

/// Internal metrics tracker
#[derive(Debug, Default)]
pub(crate) struct MetricsTracker {
    pub total_created: AtomicUsize,
    pub total_acquired: AtomicUsize,
    pub total_released: AtomicUsize,
    pub total_destroyed: AtomicUsize,
    pub duplicate_releases: AtomicUsize,
    pub countdowns_started: AtomicUsize,
    pub countdowns_cancelled: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self, active: usize, inactive: usize, max_capacity: usize) -> PoolMetrics {
        let utilization = if max_capacity > 0 {
            active as f64 / max_capacity as f64
        } else {
            0.0
        };

        PoolMetrics {
            total_created: self.total_created.load(Ordering::Relaxed),
            total_acquired: self.total_acquired.load(Ordering::Relaxed),
            total_released: self.total_released.load(Ordering::Relaxed),
            total_destroyed: self.total_destroyed.load(Ordering::Relaxed),
            duplicate_releases: self.duplicate_releases.load(Ordering::Relaxed),
            countdowns_started: self.countdowns_started.load(Ordering::Relaxed),
            countdowns_cancelled: self.countdowns_cancelled.load(Ordering::Relaxed),
            active,
            inactive,
            max_capacity,
            utilization,
        }
    }
}
