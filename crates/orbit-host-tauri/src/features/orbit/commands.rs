use super::picker::pick_folders;
use crate::app::state::AppState;
use crate::features::{run_command_async, run_command_sync};
use orbit_contracts::models::{ActionResultDto, OrbitSnapshotDto};
use orbit_contracts::{AppResult, InvokeError};
use tauri::{AppHandle, State};

#[tauri::command]
pub fn orbit_get_snapshot(
    state: State<'_, AppState>,
    request_id: Option<String>,
    window_label: Option<String>,
) -> Result<OrbitSnapshotDto, InvokeError> {
    run_command_sync("orbit_get_snapshot", request_id, window_label, || {
        Ok::<_, InvokeError>(state.orbit.snapshot())
    })
}

#[tauri::command]
pub async fn orbit_add_roots(
    state: State<'_, AppState>,
    paths: Vec<String>,
    request_id: Option<String>,
    window_label: Option<String>,
) -> Result<OrbitSnapshotDto, InvokeError> {
    let service = state.orbit.clone();
    run_command_async("orbit_add_roots", request_id, window_label, move || async move {
        service.add_roots(paths).await
    })
    .await
}

#[tauri::command]
pub async fn orbit_toggle_root(
    state: State<'_, AppState>,
    index: usize,
    request_id: Option<String>,
    window_label: Option<String>,
) -> Result<OrbitSnapshotDto, InvokeError> {
    let service = state.orbit.clone();
    run_command_async("orbit_toggle_root", request_id, window_label, move || async move {
        service.toggle_root(index).await
    })
    .await
}

#[tauri::command]
pub async fn orbit_delete_root(
    state: State<'_, AppState>,
    path: String,
    request_id: Option<String>,
    window_label: Option<String>,
) -> Result<OrbitSnapshotDto, InvokeError> {
    let service = state.orbit.clone();
    run_command_async("orbit_delete_root", request_id, window_label, move || async move {
        service.delete_root(&path).await
    })
    .await
}

#[tauri::command]
pub async fn orbit_exclude_project(
    state: State<'_, AppState>,
    path: String,
    request_id: Option<String>,
    window_label: Option<String>,
) -> Result<OrbitSnapshotDto, InvokeError> {
    let service = state.orbit.clone();
    run_command_async(
        "orbit_exclude_project",
        request_id,
        window_label,
        move || async move { service.exclude_project(&path).await },
    )
    .await
}

#[tauri::command]
pub async fn orbit_restore_excluded(
    state: State<'_, AppState>,
    request_id: Option<String>,
    window_label: Option<String>,
) -> Result<OrbitSnapshotDto, InvokeError> {
    let service = state.orbit.clone();
    run_command_async(
        "orbit_restore_excluded",
        request_id,
        window_label,
        move || async move { service.restore_excluded().await },
    )
    .await
}

#[tauri::command]
pub async fn orbit_reorder_projects(
    state: State<'_, AppState>,
    ordered_paths: Vec<String>,
    request_id: Option<String>,
    window_label: Option<String>,
) -> Result<OrbitSnapshotDto, InvokeError> {
    let service = state.orbit.clone();
    run_command_async(
        "orbit_reorder_projects",
        request_id,
        window_label,
        move || async move { service.reorder_projects(ordered_paths).await },
    )
    .await
}

#[tauri::command]
pub async fn orbit_set_project_ide(
    state: State<'_, AppState>,
    path: String,
    ide_id: String,
    request_id: Option<String>,
    window_label: Option<String>,
) -> Result<OrbitSnapshotDto, InvokeError> {
    let service = state.orbit.clone();
    run_command_async(
        "orbit_set_project_ide",
        request_id,
        window_label,
        move || async move { service.set_project_ide(&path, &ide_id).await },
    )
    .await
}

#[tauri::command]
pub async fn orbit_rescan(
    state: State<'_, AppState>,
    request_id: Option<String>,
    window_label: Option<String>,
) -> Result<OrbitSnapshotDto, InvokeError> {
    let service = state.orbit.clone();
    run_command_async("orbit_rescan", request_id, window_label, move || async move {
        Ok::<_, InvokeError>(service.rescan().await)
    })
    .await
}

/// Opens the folder dialog and registers whatever was picked.
/// A cancelled dialog leaves state untouched.
#[tauri::command]
pub async fn orbit_pick_roots(
    app: AppHandle,
    state: State<'_, AppState>,
    multiple: Option<bool>,
    request_id: Option<String>,
    window_label: Option<String>,
) -> Result<OrbitSnapshotDto, InvokeError> {
    let service = state.orbit.clone();
    run_command_async("orbit_pick_roots", request_id, window_label, move || async move {
        let selection = pick_folders(app, multiple.unwrap_or(true)).await?;
        if selection.is_cancelled() {
            return AppResult::Ok(service.snapshot());
        }
        service.add_roots(selection.into_paths()).await
    })
    .await
}

#[tauri::command]
pub async fn orbit_launch_project(
    state: State<'_, AppState>,
    path: String,
    ide_id: Option<String>,
    open_latest_file: Option<bool>,
    request_id: Option<String>,
    window_label: Option<String>,
) -> Result<ActionResultDto, InvokeError> {
    let service = state.orbit.clone();
    run_command_async(
        "orbit_launch_project",
        request_id,
        window_label,
        move || async move {
            service
                .launch_project(&path, ide_id.as_deref(), open_latest_file.unwrap_or(false))
                .await?;
            AppResult::Ok(ActionResultDto {
                ok: true,
                message: path,
            })
        },
    )
    .await
}

#[tauri::command]
pub fn orbit_reveal_project(
    state: State<'_, AppState>,
    path: String,
    request_id: Option<String>,
    window_label: Option<String>,
) -> Result<ActionResultDto, InvokeError> {
    run_command_sync("orbit_reveal_project", request_id, window_label, || {
        state.orbit.reveal_project(&path)?;
        AppResult::Ok(ActionResultDto {
            ok: true,
            message: path.clone(),
        })
    })
}
