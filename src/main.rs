use fixed_pool::ThreadPool;
use rand::Rng;
use std::{thread, time::{Duration, Instant}};
use tracing_subscriber::EnvFilter;


fn time_of_operation(elapsed: Duration) -> String {
    format!("Time of operation: {} s.", elapsed.as_secs())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let thread_count = 4;
    let pool = ThreadPool::new(thread_count)?;

    let now = Instant::now();
    println!("Work started with {} threads active.", thread_count);

    let handles = (0..thread_count)
        .map(|_| {
            pool.post(|| {
                let mut rng = rand::rng();
                let secs = rng.random_range(1..=5);
                thread::sleep(Duration::from_secs(secs));
                rng.random_range(1..=100)
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    for (i, handle) in handles.into_iter().enumerate() {
        println!("Result {}: {}", i, handle.wait()?);
    }

    println!("{}", time_of_operation(now.elapsed()));
    pool.shutdown();
    Ok(())
}
