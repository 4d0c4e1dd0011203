#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    orbit_host_tauri::run(tauri::generate_context!())
}
