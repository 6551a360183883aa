// idlepool - self-disposing object pool
//
// This is just a binary wrapper - the actual library is in lib.rs
// Run demos with: cargo run --example basic

use idlepool::{Activatable, ActivationLifecycle, IdlePool, PoolConfig};
use std::time::Duration;

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

#[tokio::main]
async fn main() {
    println!("=== idlepool ===");
    println!("See demos/ directory for usage examples");
    println!("Run: cargo run --example basic");
    println!();

    // Quick demo
    println!("Quick Demo:");
    let pool = IdlePool::new(
        ActivationLifecycle::new(|| Sprite { visible: false }),
        PoolConfig::new()
            .with_name("demo")
            .with_initial_capacity(3)
            .with_idle_timeout(Duration::from_secs(60)),
    )
    .expect("pool construction");

    let handle = pool.acquire().expect("acquire");
    println!("  Acquired {handle:?}, active: {}", pool.active_count());

    pool.release(handle).expect("release");
    println!("  Released, inactive: {}", pool.inactive_count());
    println!("  Disposal state: {:?}", pool.disposal_state());
}
