use crate::backend::ProjectBackend;
use orbit_contracts::models::ProjectDto;
use orbit_kernel::runtime::blocking::run_blocking;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Scans every root in parallel and returns one batch per root, in root
/// order. A failing root yields an empty batch; no root is ever skipped
/// because a sibling failed.
pub async fn scan_roots(
    backend: Arc<dyn ProjectBackend>,
    roots: Vec<String>,
) -> Vec<Vec<ProjectDto>> {
    if roots.is_empty() {
        return Vec::new();
    }

    let mut pending = JoinSet::new();
    for (index, root) in roots.iter().cloned().enumerate() {
        let backend = Arc::clone(&backend);
        pending.spawn(async move {
            let result = run_blocking("orbit_scan_root", move || backend.scan(&root)).await;
            (index, result)
        });
    }

    let mut batches: Vec<Vec<ProjectDto>> = vec![Vec::new(); roots.len()];
    while let Some(joined) = pending.join_next().await {
        match joined {
            Ok((index, Ok(projects))) => batches[index] = projects,
            Ok((index, Err(error))) => {
                tracing::warn!(
                    event = "orbit_scan_root_failed",
                    root = roots[index].as_str(),
                    error_code = error.code.as_str(),
                    error_message = error.message.as_str()
                );
            }
            Err(error) => {
                tracing::warn!(event = "orbit_scan_task_join_failed", detail = %error);
            }
        }
    }
    batches
}

#[cfg(test)]
#[path = "../../tests/orbit/coordinator_tests.rs"]
mod tests;
