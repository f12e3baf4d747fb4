//! Running the synchronous core from async handlers.

use tokio::task::spawn_blocking;

/// Runs a blocking closure on the blocking pool.
///
/// Returns `None` if the task panicked or was cancelled; the join error is
/// logged here so handlers only pick their fallback.
pub(crate) async fn run_blocking<T, F>(f: F) -> Option<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    spawn_blocking(f)
        .await
        .map_err(|e| tracing::error!(error = %e, "blocking task failed"))
        .ok()
}
