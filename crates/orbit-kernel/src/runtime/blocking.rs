use crate::{AppError, AppResult};
use tokio::task::JoinError;

/// Runs filesystem or process work on tokio's blocking pool.
///
/// The job's own error is returned as is; a job that panics or is cancelled
/// becomes a `blocking_task_*` error tagged with `label`.
pub async fn run_blocking<T, F>(label: &'static str, job: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> AppResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .unwrap_or_else(|error| Err(join_failure(label, &error)))
}

fn join_failure(label: &'static str, error: &JoinError) -> AppError {
    let (code, message) = if error.is_cancelled() {
        ("blocking_task_canceled", "Background task was canceled")
    } else if error.is_panic() {
        ("blocking_task_panicked", "Background task panicked")
    } else {
        ("blocking_task_failed", "Background task failed")
    };
    tracing::error!(event = code, blocking_task = label, detail = %error);

    AppError::new(code, message)
        .with_context("blockingTask", label)
        .with_context("joinError", error.to_string())
}

#[cfg(test)]
#[path = "../../tests/runtime/blocking_tests.rs"]
mod tests;
