use orbit_app::OrbitHost;
use orbit_contracts::{AppError, AppResult};
use tauri::{AppHandle, Emitter};
use tauri_plugin_opener::OpenerExt;

pub(crate) struct TauriOrbitHost {
    app: AppHandle,
}

impl TauriOrbitHost {
    pub(crate) fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl OrbitHost for TauriOrbitHost {
    fn emit(&self, event: &str, payload: serde_json::Value) -> AppResult<()> {
        self.app.emit(event, payload).map_err(|error| {
            AppError::new("orbit_event_emit_failed", "Failed to send dashboard event")
                .with_context("event", event)
                .with_context("detail", error.to_string())
        })
    }

    fn reveal_path(&self, path: &str) -> AppResult<()> {
        self.app.opener().reveal_item_in_dir(path).map_err(|error| {
            AppError::new("project_reveal_failed", "Failed to reveal project folder")
                .with_context("path", path)
                .with_context("detail", error.to_string())
        })
    }
}
