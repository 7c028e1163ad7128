// Banana Browser library entry point.
// Exposes all modules so they can be tested independently; `run` wires them
// into the Tauri application.

use tauri::Manager;

pub mod browser_view;
pub mod main_window;
pub mod settings;
pub mod state;

// Pure logic and dialog plumbing
pub mod modules;

use modules::settings_dialog;
use settings::SettingsStore;
use state::AppState;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let log_level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    tauri::Builder::default()
        .plugin(tauri_plugin_log::Builder::default().level(log_level).build())
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let store = SettingsStore::for_app(app.handle())?;
            let settings = store.load_or_default();
            log::info!(
                "[Startup] Settings from {:?}: {:?}",
                store.path(),
                settings
            );
            app.manage(AppState::new(store, settings));

            let menu = main_window::build_menu(app.handle())?;
            app.set_menu(menu)?;
            app.on_menu_event(|app_handle, event| {
                main_window::handle_menu_event(app_handle, event.id().as_ref());
            });

            main_window::init(app.handle())?;
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            main_window::new_tab,
            main_window::close_tab,
            main_window::switch_tab,
            main_window::list_tabs,
            main_window::navigate,
            main_window::go_back,
            main_window::go_forward,
            main_window::reload,
            settings_dialog::open_settings,
            settings_dialog::get_settings,
            settings_dialog::save_settings,
            settings_dialog::close_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
