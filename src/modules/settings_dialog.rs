// Settings window and the commands behind its form.

use serde::Serialize;
use tauri::{AppHandle, Manager, State};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};

use crate::settings::{SearchEngine, Settings, SettingsError};
use crate::state::AppState;

pub const SETTINGS_WINDOW: &str = "settings";

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsForm {
    pub search_engine: SearchEngine,
    pub http_warning: bool,
    pub search_engines: Vec<SearchEngine>,
}

impl From<Settings> for SettingsForm {
    fn from(settings: Settings) -> Self {
        Self {
            search_engine: settings.search_engine,
            http_warning: settings.http_warning,
            search_engines: SearchEngine::ALL.to_vec(),
        }
    }
}

/// Writes accepted settings into the shared state and persists them.
/// The in-memory value is updated even if persisting fails.
pub fn apply(state: &AppState, settings: Settings) -> Result<(), SettingsError> {
    match state.settings.write() {
        Ok(mut current) => *current = settings,
        Err(poisoned) => *poisoned.into_inner() = settings,
    }
    log::info!(
        "[Settings] Applied search engine {:?}, http warning {}",
        settings.search_engine,
        settings.http_warning
    );
    state.store.save(&settings)
}

pub fn show_settings_window(app: &AppHandle) {
    if let Some(win) = app.get_window(SETTINGS_WINDOW) {
        let _ = win.set_focus();
        return;
    }

    let settings_window = tauri::WebviewWindowBuilder::new(
        app,
        SETTINGS_WINDOW,
        tauri::WebviewUrl::App("settings.html".into()),
    )
    .title("Settings")
    .inner_size(420.0, 220.0)
    .resizable(false)
    .minimizable(false)
    .maximizable(false)
    .always_on_top(true)
    .center()
    .focused(true)
    .build();

    if let Err(e) = settings_window {
        log::error!("[Settings] Failed to create settings window: {}", e);
    }
}

fn close_window(app: &AppHandle) {
    if let Some(win) = app.get_window(SETTINGS_WINDOW) {
        if let Err(e) = win.close() {
            log::warn!("[Settings] Failed to close settings window: {}", e);
        }
    }
}

#[tauri::command]
pub async fn open_settings(app: AppHandle) -> Result<(), String> {
    show_settings_window(&app);
    Ok(())
}

#[tauri::command]
pub fn get_settings(state: State<AppState>) -> SettingsForm {
    state.settings_snapshot().into()
}

#[tauri::command]
pub fn save_settings(
    app: AppHandle,
    state: State<AppState>,
    search_engine: SearchEngine,
    http_warning: bool,
) -> Result<(), String> {
    let settings = Settings {
        search_engine,
        http_warning,
    };

    if let Err(e) = apply(&state, settings) {
        log::error!("[Settings] {}", e);
        app.dialog()
            .message(format!("Your settings could not be saved: {}", e))
            .title("Settings")
            .kind(MessageDialogKind::Error)
            .show(|_| {});
        return Err(e.to_string());
    }

    close_window(&app);
    Ok(())
}

#[tauri::command]
pub fn close_settings(app: AppHandle) {
    close_window(&app);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsStore;
    use tempfile::tempdir;

    #[test]
    fn test_apply_updates_shared_settings_and_file() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        let state = AppState::new(store.clone(), Settings::default());
        let shared = state.settings.clone();

        let accepted = Settings {
            search_engine: SearchEngine::DuckDuckGo,
            http_warning: false,
        };
        apply(&state, accepted).unwrap();

        assert_eq!(*shared.read().unwrap(), accepted);
        assert_eq!(store.load().unwrap(), accepted);
    }

    #[test]
    fn test_apply_surfaces_save_errors() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();
        let state = AppState::new(SettingsStore::new(&blocker), Settings::default());

        let accepted = Settings {
            search_engine: SearchEngine::Bing,
            http_warning: true,
        };
        assert!(matches!(apply(&state, accepted), Err(SettingsError::Io(_))));
        assert_eq!(state.settings_snapshot(), accepted);
    }

    #[test]
    fn test_form_lists_all_engines() {
        let form = SettingsForm::from(Settings::default());
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["searchEngine"], "Google");
        assert_eq!(json["httpWarning"], true);
        assert_eq!(
            json["searchEngines"],
            serde_json::json!(["Google", "Bing", "DuckDuckGo"])
        );
    }
}
