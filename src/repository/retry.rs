use std::future::Future;
use std::time::Duration;

const BASE_DELAY: Duration = Duration::from_millis(50);

/// Connection-level failures worth another attempt. Query errors are not.
pub fn is_transient(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut)
}

/// Runs `op` up to `attempts` times, backing off linearly between transient
/// failures. Only use for reads.
pub async fn with_retry<T, F, Fut>(attempts: u32, mut op: F) -> Result<T, sqlx::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Err(e) if attempt < attempts && is_transient(&e) => {
                tracing::warn!(attempt, attempts, error = %e, "transient database error, retrying");
                tokio::time::sleep(BASE_DELAY * attempt).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}
