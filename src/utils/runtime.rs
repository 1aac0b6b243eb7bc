use std::future::Future;

use anyhow::Result;

/// The host is a single writer that handles one browser event at a time, so a current thread
/// runtime is all it needs.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

/// Runs `future` on a fresh runtime and drops it without waiting for blocking tasks. A pending
/// stdin read parks a blocking thread that never notices the shutdown.
pub fn block_on_detached<F: Future>(future: F) -> Result<F::Output> {
    let runtime = single_thread_runtime()?;
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    Ok(output)
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use anyhow::Result;

    use super::block_on_detached;

    #[test]
    fn test_blocking_tasks_dont_delay_exit() -> Result<()> {
        let started = Instant::now();
        let value = block_on_detached(async {
            tokio::task::spawn_blocking(|| std::thread::sleep(Duration::from_secs(30)));
            7
        })?;

        assert_eq!(value, 7);
        assert!(started.elapsed() < Duration::from_secs(10));
        Ok(())
    }
}
