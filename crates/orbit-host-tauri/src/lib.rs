pub mod app;
mod bootstrap;
mod command_runtime;
mod constants;
mod features;
mod host;

pub fn run(context: tauri::Context<tauri::Wry>) {
    bootstrap::AppBootstrap::run(context);
}
