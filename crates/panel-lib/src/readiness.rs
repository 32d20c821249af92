//! Bounded wait for an external dependency to become available

use crate::error::ReadyError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout_at, Instant};
use tracing::{debug, info};

/// Poll `probe` every `poll_interval` until it reports ready or `timeout`
/// elapses. A probe still running at the deadline counts as not ready.
///
/// Returns the number of attempts it took.
pub async fn await_ready<F, Fut>(
    mut probe: F,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<u32, ReadyError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = Instant::now() + timeout;
    let mut attempts = 0u32;

    loop {
        attempts += 1;

        if let Ok(true) = timeout_at(deadline, probe()).await {
            info!(attempts, "Dependency ready");
            return Ok(attempts);
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(ReadyError::TimedOut { attempts, timeout });
        }

        debug!(attempts, "Dependency not ready, retrying");
        sleep(poll_interval.min(deadline - now)).await;
    }
}
