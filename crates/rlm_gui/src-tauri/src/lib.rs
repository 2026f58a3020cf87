//! Tauri application library: config form and query session commands.

pub mod commands;

pub fn run() {
    tauri::Builder::default()
        .invoke_handler(tauri::generate_handler![
            commands::get_config_path,
            commands::load_config,
            commands::save_config,
            commands::start_query,
            commands::reset_session,
            commands::query_snapshot,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
