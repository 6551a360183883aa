//! Basic usage examples for idlepool

use idlepool::{Activatable, ActivationLifecycle, IdlePool, PoolConfig, PoolError};
use std::time::Duration;

struct Particle {
    visible: bool,
}

impl Activatable for Particle {
    fn activate(&mut self) {
        self.visible = true;
    }

    fn deactivate(&mut self) {
        self.visible = false;
    }
}

fn particle_pool(config: PoolConfig) -> IdlePool<ActivationLifecycle<Particle, fn() -> Particle>> {
    fn make() -> Particle {
        Particle { visible: false }
    }
    IdlePool::new(ActivationLifecycle::new(make as fn() -> Particle), config)
        .expect("pool construction")
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== idlepool - Basic Examples ===\n");

    simple_pool();
    duplicate_release_checking();
    metrics();
}

fn simple_pool() {
    println!("1. Simple Pool:");
    let pool = particle_pool(
        PoolConfig::new()
            .with_name("particles")
            .with_initial_capacity(3)
            .with_idle_timeout(Duration::from_secs(30)),
    );

    let handle = pool.acquire().unwrap();
    println!("   Acquired: {handle:?}");
    println!("   Active: {}, inactive: {}", pool.active_count(), pool.inactive_count());

    let lit = pool.with_resource(handle, |p| p.visible).unwrap();
    println!("   Resource visible while acquired: {lit}");

    pool.release(handle).unwrap();
    println!("   After release - inactive: {}\n", pool.inactive_count());
}

fn duplicate_release_checking() {
    println!("2. Duplicate-Release Checking:");
    let pool = particle_pool(
        PoolConfig::new()
            .with_name("checked")
            .with_duplicate_release_check(),
    );

    let handle = pool.acquire().unwrap();
    pool.release(handle).unwrap();

    match pool.release(handle) {
        Err(PoolError::DuplicateRelease { .. }) => {
            println!("   Second release rejected as a duplicate\n")
        }
        other => println!("   Unexpected outcome: {other:?}\n"),
    }
}

fn metrics() {
    println!("3. Metrics:");
    let pool = particle_pool(PoolConfig::new().with_name("metered").with_initial_capacity(2));

    let a = pool.acquire().unwrap();
    let _b = pool.acquire().unwrap();
    pool.release(a).unwrap();

    let snapshot = pool.metrics();
    println!("   created={} acquired={} released={}",
        snapshot.total_created, snapshot.total_acquired, snapshot.total_released);
    println!("{}", pool.export_metrics_prometheus(None));
}
