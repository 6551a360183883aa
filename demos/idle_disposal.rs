//! Watch a pool count down and dispose itself, with one cancelled run

use idlepool::{Activatable, ActivationLifecycle, IdlePool, PoolConfig, PoolEvent};
use std::time::Duration;

struct Connection {
    open: bool,
}

impl Activatable for Connection {
    fn activate(&mut self) {
        self.open = true;
    }

    fn deactivate(&mut self) {
        self.open = false;
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("=== idlepool - Idle Disposal ===\n");

    let pool = IdlePool::new(
        ActivationLifecycle::new(|| Connection { open: false }),
        PoolConfig::new()
            .with_name("connections")
            .with_initial_capacity(2)
            .with_idle_timeout(Duration::from_secs(3)),
    )
    .expect("pool construction");

    pool.subscribe(|event: &PoolEvent| match event {
        PoolEvent::CountdownStarted { seconds } => {
            println!("  countdown started: {seconds}s until disposal")
        }
        PoolEvent::CountdownTick { remaining } => println!("  tick, {remaining}s left"),
        PoolEvent::CountdownCancelled => println!("  countdown cancelled"),
        PoolEvent::PoolDisposed => println!("  pool disposed"),
        _ => {}
    });

    // the pool is fully idle from construction, so the countdown starts;
    // two seconds in we acquire and cancel it
    tokio::time::sleep(Duration::from_secs(2)).await;
    let handle = pool.acquire().expect("acquire");
    println!("acquired {handle:?}, countdown should cancel\n");
    tokio::time::sleep(Duration::from_secs(2)).await;

    // hand it back and let the countdown run out this time
    pool.release(handle).expect("release");
    println!("released, letting the pool expire");
    tokio::time::sleep(Duration::from_secs(5)).await;

    println!(
        "\nfinal state: {:?}, tracked handles: {}",
        pool.disposal_state(),
        pool.count()
    );
}
