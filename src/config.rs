//! Pool configuration options

use std::time::Duration;

/// Shortest idle timeout a pool will honor.
pub const MIN_IDLE_TIMEOUT: Duration = Duration::from_secs(1);

/// Longest idle timeout a pool will honor.
pub const MAX_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

const DEFAULT_MAX_CAPACITY: usize = 100;

/// Configuration for pool behavior
///
/// Constructed once, never mutated afterwards.
///
/// # Examples
///
/// ```
/// use idlepool::PoolConfig;
/// use std::time::Duration;
///
/// let config = PoolConfig::new()
///     .with_name("projectiles")
///     .with_idle_timeout(Duration::from_secs(30))
///     .with_initial_capacity(8)
///     .with_max_capacity(64);
///
/// assert_eq!(config.initial_capacity, 8);
/// assert_eq!(config.max_capacity, 64);
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Name used in errors and log events
    pub name: String,

    /// How long the pool may sit fully idle before disposing itself,
    /// clamped to `[MIN_IDLE_TIMEOUT, MAX_IDLE_TIMEOUT]`
    pub idle_timeout: Duration,

    /// Number of resources created up front, all Inactive
    pub initial_capacity: usize,

    /// Soft cap on tracked resources; acquiring past it over-allocates
    /// with a warning rather than failing
    pub max_capacity: usize,

    /// Whether releasing an already-Inactive handle is an error
    /// (off: silent no-op)
    pub duplicate_release_check: bool,

    /// Whether the pool is kept alive indefinitely (never counts down)
    pub keep_alive: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "idlepool".to_string(),
            idle_timeout: Duration::from_secs(60),
            initial_capacity: 0,
            max_capacity: DEFAULT_MAX_CAPACITY,
            duplicate_release_check: false,
            keep_alive: false,
        }
    }
}

impl PoolConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pool name used in errors and log events
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the idle timeout, clamped to `[1s, 300s]`
    ///
    /// # Examples
    ///
    /// ```
    /// use idlepool::PoolConfig;
    /// use std::time::Duration;
    ///
    /// let config = PoolConfig::new().with_idle_timeout(Duration::from_secs(900));
    /// assert_eq!(config.idle_timeout, Duration::from_secs(300));
    /// ```
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout.clamp(MIN_IDLE_TIMEOUT, MAX_IDLE_TIMEOUT);
        self
    }

    /// Set the number of resources created at construction
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Set the soft maximum capacity
    pub fn with_max_capacity(mut self, capacity: usize) -> Self {
        self.max_capacity = capacity;
        self
    }

    /// Enable duplicate-release checking
    pub fn with_duplicate_release_check(mut self) -> Self {
        self.duplicate_release_check = true;
        self
    }

    /// Keep the pool alive indefinitely; the idle countdown never starts
    pub fn with_keep_alive(mut self) -> Self {
        self.keep_alive = true;
        self
    }

    /// Number of whole-second ticks in one idle countdown.
    /// Re-clamps in case the struct was built literally rather than
    /// through the builder.
    pub(crate) fn idle_ticks(&self) -> u64 {
        self.idle_timeout
            .clamp(MIN_IDLE_TIMEOUT, MAX_IDLE_TIMEOUT)
            .as_secs()
    }

    /// Soft cap, never below the initial capacity.
    pub(crate) fn effective_max_capacity(&self) -> usize {
        self.max_capacity.max(self.initial_capacity)
    }
}
