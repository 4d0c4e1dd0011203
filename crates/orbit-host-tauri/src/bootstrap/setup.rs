use crate::app::state::AppState;
use crate::host::TauriOrbitHost;
use orbit_app::{DiscoveryBackend, OrbitService};
use orbit_settings::{JsonFileSettingsStore, OrbitSettingsRepository};
use std::error::Error;
use std::sync::Arc;
use std::time::Instant;
use tauri::Manager;

pub(crate) fn log_error_fallback(message: &str) {
    if tracing::dispatcher::has_been_set() {
        tracing::error!(event = "bootstrap_error", message = message);
        return;
    }

    eprintln!("{message}");
}

fn log_setup_stage(stage: &str, started_at: Instant, ok: bool) {
    tracing::info!(
        event = "setup_stage_done",
        stage = stage,
        duration_ms = started_at.elapsed().as_millis() as u64,
        ok = ok
    );
}

fn build_orbit_service(app: &tauri::App, app_data_dir: &std::path::Path) -> OrbitService {
    let store = JsonFileSettingsStore::in_dir(app_data_dir);
    tracing::info!(
        event = "settings_store_opened",
        path = %store.path().to_string_lossy()
    );
    OrbitService::new(
        OrbitSettingsRepository::new(Arc::new(store)),
        Arc::new(DiscoveryBackend::default()),
        Arc::new(TauriOrbitHost::new(app.handle().clone())),
    )
}

pub(crate) fn setup(app: &mut tauri::App) -> Result<(), Box<dyn Error>> {
    let setup_started_at = Instant::now();

    let app_data_dir = app.path().app_data_dir()?;
    let logging_guard = orbit_logging::init_logging(app_data_dir.as_path())?;
    tracing::info!(
        event = "logging_initialized",
        level = logging_guard.level(),
        log_dir = %logging_guard.log_dir().to_string_lossy()
    );

    let service_stage_started_at = Instant::now();
    let orbit = build_orbit_service(app, &app_data_dir);
    log_setup_stage("orbit_service_init", service_stage_started_at, true);

    // Commands may mutate settings as soon as the state is managed.
    let settings_stage_started_at = Instant::now();
    tauri::async_runtime::block_on(orbit.load_settings());
    log_setup_stage("orbit_settings_load", settings_stage_started_at, true);

    app.manage(AppState::new(orbit.clone()));

    // First scan runs in the background so the window shows immediately.
    tauri::async_runtime::spawn(async move {
        let load_started_at = Instant::now();
        let snapshot = orbit.startup_scan().await;
        tracing::info!(
            event = "orbit_startup_loaded",
            root_count = snapshot.roots.len(),
            project_count = snapshot.projects.len(),
            duration_ms = load_started_at.elapsed().as_millis() as u64
        );
    });

    log_setup_stage("setup_total", setup_started_at, true);
    Ok(())
}
