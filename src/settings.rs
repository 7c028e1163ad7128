use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tauri::AppHandle;
use tauri::Manager;
use thiserror::Error;

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SearchEngine {
    Google,
    Bing,
    DuckDuckGo,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::Google
    }
}

impl SearchEngine {
    pub const ALL: [SearchEngine; 3] = [Self::Google, Self::Bing, Self::DuckDuckGo];

    /// Page a new tab opens when no URL is given.
    pub fn home_url(&self) -> &'static str {
        match self {
            Self::Google => "https://www.google.com",
            Self::Bing => "https://www.bing.com",
            Self::DuckDuckGo => "https://www.duckduckgo.com",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub search_engine: SearchEngine,
    pub http_warning: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            search_engine: SearchEngine::default(),
            http_warning: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to access settings file: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SettingsError {
    pub fn is_missing_file(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::NotFound)
    }
}

/// JSON file holding the user's [`Settings`].
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self::at(dir.as_ref().join(SETTINGS_FILE))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_app(app: &AppHandle) -> Result<Self, String> {
        let dir = app.path().app_data_dir().map_err(|e| e.to_string())?;
        Ok(Self::new(dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the settings file. Callers that want the default policy use
    /// [`SettingsStore::load_or_default`].
    pub fn load(&self) -> Result<Settings, SettingsError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn load_or_default(&self) -> Settings {
        match self.load() {
            Ok(settings) => settings,
            Err(e) if e.is_missing_file() => {
                log::info!("[Settings] No settings at {:?}, using defaults", self.path);
                Settings::default()
            }
            Err(e) => {
                log::warn!("[Settings] {}, using defaults", e);
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(settings)?;

        // Write to tmp, then rename, so a crash never leaves a half-written file.
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &self.path)?;

        log::info!("[Settings] Saved to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::tempdir;

    #[rstest]
    fn test_round_trip(
        #[values(SearchEngine::Google, SearchEngine::Bing, SearchEngine::DuckDuckGo)]
        search_engine: SearchEngine,
        #[values(true, false)] http_warning: bool,
    ) {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        let settings = Settings { search_engine, http_warning };

        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());

        let err = store.load().unwrap_err();
        assert!(err.is_missing_file());
        assert_eq!(
            store.load_or_default(),
            Settings { search_engine: SearchEngine::Google, http_warning: true }
        );
    }

    #[rstest]
    #[case("")]
    #[case("{not json")]
    #[case("\"just a string\"")]
    #[case(r#"{"search_engine": "AltaVista", "http_warning": true}"#)]
    #[case(r#"{"search_engine": "Bing", "http_warning": "yes"}"#)]
    fn test_corrupt_file_falls_back_to_defaults(#[case] content: &str) {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        fs::write(store.path(), content).unwrap();

        assert!(matches!(store.load(), Err(SettingsError::Parse(_))));
        assert_eq!(store.load_or_default(), Settings::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_missing_keys() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        fs::write(store.path(), r#"{"search_engine": "DuckDuckGo", "theme": "dark"}"#).unwrap();

        let settings = store.load().unwrap();
        assert_eq!(settings.search_engine, SearchEngine::DuckDuckGo);
        assert!(settings.http_warning);
    }

    #[test]
    fn test_file_format() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path());
        store
            .save(&Settings { search_engine: SearchEngine::Bing, http_warning: false })
            .unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["search_engine"], "Bing");
        assert_eq!(raw["http_warning"], false);
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nested").join("app"));

        store.save(&Settings::default()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn test_save_reports_io_errors() {
        let dir = tempdir().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join("settings.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupied"), "x").unwrap();

        let store = SettingsStore::at(&path);
        assert!(matches!(store.save(&Settings::default()), Err(SettingsError::Io(_))));
    }

    #[rstest]
    #[case(SearchEngine::Google, "https://www.google.com")]
    #[case(SearchEngine::Bing, "https://www.bing.com")]
    #[case(SearchEngine::DuckDuckGo, "https://www.duckduckgo.com")]
    fn test_home_url(#[case] engine: SearchEngine, #[case] expected: &str) {
        assert_eq!(engine.home_url(), expected);
    }
}
