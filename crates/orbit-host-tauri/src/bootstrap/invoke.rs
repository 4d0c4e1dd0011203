pub(crate) fn with_invoke_handler(
    builder: tauri::Builder<tauri::Wry>,
) -> tauri::Builder<tauri::Wry> {
    builder.invoke_handler(tauri::generate_handler![
        crate::features::orbit::commands::orbit_get_snapshot,
        crate::features::orbit::commands::orbit_add_roots,
        crate::features::orbit::commands::orbit_toggle_root,
        crate::features::orbit::commands::orbit_delete_root,
        crate::features::orbit::commands::orbit_exclude_project,
        crate::features::orbit::commands::orbit_restore_excluded,
        crate::features::orbit::commands::orbit_reorder_projects,
        crate::features::orbit::commands::orbit_set_project_ide,
        crate::features::orbit::commands::orbit_rescan,
        crate::features::orbit::commands::orbit_pick_roots,
        crate::features::orbit::commands::orbit_launch_project,
        crate::features::orbit::commands::orbit_reveal_project,
    ])
}
