use crate::constants::FOLDER_PICKER_TITLE;
use orbit_contracts::models::FolderSelection;
use orbit_contracts::{AppError, AppResult};
use orbit_kernel::runtime::blocking::run_blocking;
use tauri::AppHandle;
use tauri_plugin_dialog::{DialogExt, FilePath};

/// Shows the native folder dialog off the main thread.
pub(super) async fn pick_folders(app: AppHandle, multiple: bool) -> AppResult<FolderSelection> {
    run_blocking("orbit_pick_roots", move || {
        let dialog = app.dialog().file().set_title(FOLDER_PICKER_TITLE);
        let picked = if multiple {
            dialog.blocking_pick_folders()
        } else {
            dialog.blocking_pick_folder().map(|path| vec![path])
        };
        let paths = picked
            .map(|paths| {
                paths
                    .into_iter()
                    .map(into_path_string)
                    .collect::<AppResult<Vec<_>>>()
            })
            .transpose()?;
        Ok(FolderSelection::from_paths(paths))
    })
    .await
}

fn into_path_string(path: FilePath) -> AppResult<String> {
    path.into_path()
        .map(|path| path.to_string_lossy().into_owned())
        .map_err(|error| {
            AppError::new("folder_picker_failed", "Selected folder is not a local path")
                .with_context("detail", error.to_string())
        })
}
