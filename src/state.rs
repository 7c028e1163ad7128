// Shared state managed by Tauri.
// Kept free of Tauri types so it can be built in tests.

use std::sync::{Arc, Mutex, RwLock};

use crate::modules::tabs::TabSet;
use crate::settings::{Settings, SettingsStore};

pub struct AppState {
    /// Read by every browser view; written only by the settings dialog.
    pub settings: Arc<RwLock<Settings>>,
    pub store: SettingsStore,
    pub tabs: Arc<Mutex<TabSet>>,
}

impl AppState {
    pub fn new(store: SettingsStore, settings: Settings) -> Self {
        Self {
            settings: Arc::new(RwLock::new(settings)),
            store,
            tabs: Arc::new(Mutex::new(TabSet::new())),
        }
    }

    pub fn settings_snapshot(&self) -> Settings {
        match self.settings.read() {
            Ok(settings) => *settings,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
