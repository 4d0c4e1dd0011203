mod invoke;
mod setup;

use crate::constants::MAIN_WINDOW_LABEL;
use setup::log_error_fallback;

pub(crate) struct AppBootstrap;

impl AppBootstrap {
    pub(crate) fn run(context: tauri::Context<tauri::Wry>) {
        let builder = tauri::Builder::default()
            .plugin(tauri_plugin_dialog::init())
            .plugin(tauri_plugin_opener::init())
            .setup(setup::setup)
            .on_window_event(|window, event| {
                if window.label() != MAIN_WINDOW_LABEL {
                    return;
                }
                if let tauri::WindowEvent::Destroyed = event {
                    tracing::info!(event = "main_window_destroyed", window = MAIN_WINDOW_LABEL);
                }
            });

        let app = invoke::with_invoke_handler(builder)
            .build(context)
            .unwrap_or_else(|error| {
                log_error_fallback(&format!(
                    "error while building tauri application: {}",
                    error
                ));
                std::process::exit(1);
            });

        app.run(|_, event| {
            if let tauri::RunEvent::Exit = event {
                tracing::info!(event = "app_exit");
            }
        });
    }
}
