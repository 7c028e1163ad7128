// Main window: tab strip, navigation toolbar and menu.
//
// The toolbar is the window's own webview (dist/index.html). Page content
// lives in one child webview per tab, stacked below the toolbar; only the
// active one is visible.

use serde::Serialize;
use std::path::Path;
use tauri::menu::{Menu, MenuBuilder, MenuItemBuilder, PredefinedMenuItem, SubmenuBuilder};
use tauri::{AppHandle, Emitter, Manager, State, Webview, Window};
use tauri_plugin_dialog::{DialogExt, MessageDialogKind};
use url::Url;

use crate::browser_view;
use crate::modules::files::{self, PageSource, ALL_FILTER, HTML_FILTER};
use crate::modules::navigation;
use crate::modules::settings_dialog;
use crate::modules::tabs::{Tab, TabSet, TabsPayload, DEFAULT_TAB_TITLE};
use crate::state::AppState;

pub const MAIN_WINDOW: &str = "main";

const TABS_CHANGED: &str = "tabs-changed";
const URL_CHANGED: &str = "url-changed";

const MENU_NEW_TAB: &str = "new_tab";
const MENU_OPEN_FILE: &str = "open_file";
const MENU_SAVE_FILE: &str = "save_file";
const MENU_PRINT: &str = "print";
const MENU_SETTINGS: &str = "settings";
const MENU_RELOAD: &str = "reload";
const MENU_BACK: &str = "go_back";
const MENU_FORWARD: &str = "go_forward";

#[derive(Serialize, Clone)]
struct UrlPayload {
    url: String,
}

fn window(app: &AppHandle) -> Result<Window, String> {
    app.get_window(MAIN_WINDOW)
        .ok_or_else(|| "main window is not open".to_string())
}

fn with_tabs<T>(app: &AppHandle, f: impl FnOnce(&mut TabSet) -> T) -> Result<T, String> {
    let state = app.state::<AppState>();
    let mut tabs = state.tabs.lock().map_err(|e| e.to_string())?;
    Ok(f(&mut tabs))
}

fn active_view(app: &AppHandle) -> Result<Webview, String> {
    let label = with_tabs(app, |tabs| tabs.active().map(|t| t.label.clone()))?
        .map_err(|e| e.to_string())?;
    browser_view::find(app, &label).ok_or_else(|| format!("view {} is gone", label))
}

fn show_message(app: &AppHandle, title: &str, message: String, kind: MessageDialogKind) {
    app.dialog()
        .message(message)
        .title(title)
        .kind(kind)
        .show(|_| {});
}

/// Opens the main window's first tab and keeps the views sized to the window.
pub fn init(app: &AppHandle) -> Result<(), String> {
    let main_window = window(app)?;
    open_tab(app, None, DEFAULT_TAB_TITLE)?;

    let handle = app.clone();
    let resized_window = main_window.clone();
    main_window.on_window_event(move |event| {
        if let tauri::WindowEvent::Resized(new_size) = event {
            let scale = resized_window.scale_factor().unwrap_or(1.0);
            let bounds = browser_view::content_rect(*new_size, scale);
            let labels = with_tabs(&handle, |tabs| {
                tabs.tabs().iter().map(|t| t.label.clone()).collect::<Vec<_>>()
            })
            .unwrap_or_default();
            for label in labels {
                if let Some(view) = browser_view::find(&handle, &label) {
                    let _ = view.set_bounds(bounds);
                }
            }
        }
    });

    Ok(())
}

/// Adds a tab showing `url`, or the search engine's home page, and makes it
/// active. Returns the new tab's index.
pub fn open_tab(app: &AppHandle, url: Option<Url>, title: &str) -> Result<usize, String> {
    let state = app.state::<AppState>();
    let url = match url {
        Some(url) => url,
        None => navigation::default_tab_url(&state.settings_snapshot()).map_err(|e| e.to_string())?,
    };
    let label = with_tabs(app, |tabs| tabs.next_label())?;

    let main_window = window(app)?;
    browser_view::create(app, &main_window, &label, url.clone(), state.settings.clone())
        .map_err(|e| e.to_string())?;

    let index = with_tabs(app, |tabs| {
        tabs.push(Tab::new(label.clone(), url.to_string(), title))
    })?;
    log::info!("[Tabs] Opened {} at index {}: {}", label, index, url);

    show_active(app)?;
    Ok(index)
}

/// Closes the tab at `index`. Returns `false` when it was the last tab.
pub fn remove_tab(app: &AppHandle, index: usize) -> Result<bool, String> {
    let removed = with_tabs(app, |tabs| tabs.close(index))?.map_err(|e| e.to_string())?;

    let Some(tab) = removed else {
        log::debug!("[Tabs] Keeping the last tab open");
        return Ok(false);
    };

    if let Some(view) = browser_view::find(app, &tab.label) {
        view.close().map_err(|e| e.to_string())?;
    }
    log::info!("[Tabs] Closed {}", tab.label);

    show_active(app)?;
    Ok(true)
}

pub fn activate_tab(app: &AppHandle, index: usize) -> Result<(), String> {
    with_tabs(app, |tabs| tabs.select(index).map(|_| ()))?.map_err(|e| e.to_string())?;
    show_active(app)
}

/// Shows the active view, hides the rest, and resyncs the toolbar.
fn show_active(app: &AppHandle) -> Result<(), String> {
    let (views, payload) = with_tabs(app, |tabs| {
        let views: Vec<(String, bool)> = tabs
            .tabs()
            .iter()
            .map(|t| (t.label.clone(), tabs.is_active(&t.label)))
            .collect();
        (views, tabs.payload())
    })?;

    for (label, active) in views {
        let Some(view) = browser_view::find(app, &label) else {
            continue;
        };
        if active {
            view.show().map_err(|e| e.to_string())?;
            let _ = view.set_focus();
        } else {
            view.hide().map_err(|e| e.to_string())?;
        }
    }

    if let Some(url) = payload.active_url.clone() {
        emit_url(app, &url);
    }
    emit_tabs(app, &payload);
    Ok(())
}

fn emit_tabs(app: &AppHandle, payload: &TabsPayload) {
    if let Err(e) = app.emit(TABS_CHANGED, payload) {
        log::warn!("[Tabs] Failed to emit {}: {}", TABS_CHANGED, e);
    }
}

fn emit_url(app: &AppHandle, url: &str) {
    let shown = Url::parse(url)
        .map(|u| navigation::shows_in_url_bar(&u))
        .unwrap_or(true);
    if !shown {
        return;
    }
    let payload = UrlPayload {
        url: url.to_string(),
    };
    if let Err(e) = app.emit(URL_CHANGED, payload) {
        log::warn!("[Tabs] Failed to emit {}: {}", URL_CHANGED, e);
    }
}

/// Page-load hook of every browser view.
pub fn on_url_changed(app: &AppHandle, label: &str, url: &Url) {
    match with_tabs(app, |tabs| tabs.record_url(label, url.as_str())) {
        Ok(Ok(true)) => emit_url(app, url.as_str()),
        Ok(Ok(false)) => {}
        // Views report their first load before the tab is registered.
        Ok(Err(e)) => log::debug!("[Tabs] {}", e),
        Err(e) => log::warn!("[Tabs] {}", e),
    }
}

/// Title hook of every browser view.
pub fn on_title_changed(app: &AppHandle, label: &str, title: &str) {
    let title = title.trim();
    if title.is_empty() {
        return;
    }
    let result = with_tabs(app, |tabs| {
        tabs.set_title(label, title).map(|_| tabs.payload())
    });
    match result {
        Ok(Ok(payload)) => emit_tabs(app, &payload),
        Ok(Err(e)) => log::debug!("[Tabs] {}", e),
        Err(e) => log::warn!("[Tabs] {}", e),
    }
}

fn navigate_active(app: &AppHandle, input: &str) -> Result<(), String> {
    let url = navigation::parse_input(input)?;
    log::info!("[Navigation] {}", url);
    active_view(app)?.navigate(url).map_err(|e| e.to_string())
}

fn eval_active(app: &AppHandle, script: &str) -> Result<(), String> {
    active_view(app)?.eval(script).map_err(|e| e.to_string())
}

fn load_file_into_active_tab(app: &AppHandle, path: &Path) -> Result<(), String> {
    let html = files::read_html(path).map_err(|e| e.to_string())?;
    eval_active(app, &files::replace_document_script(&html))?;

    let payload = with_tabs(app, |tabs| {
        tabs.active_mut().map(|tab| {
            tab.title = files::title_for(path);
            tab.local_html = Some(html);
        })?;
        Ok::<_, crate::modules::tabs::TabError>(tabs.payload())
    })?
    .map_err(|e| e.to_string())?;

    log::info!("[Files] Opened {:?}", path);
    emit_tabs(app, &payload);
    Ok(())
}

pub fn open_file(app: &AppHandle) {
    let handle = app.clone();
    app.dialog()
        .file()
        .set_title("Open file")
        .add_filter(HTML_FILTER.0, HTML_FILTER.1)
        .add_filter(ALL_FILTER.0, ALL_FILTER.1)
        .pick_file(move |path| {
            let Some(path) = path.and_then(|p| p.into_path().ok()) else {
                return;
            };
            if let Err(e) = load_file_into_active_tab(&handle, &path) {
                log::error!("[Files] {}", e);
                show_message(&handle, "Open File", e, MessageDialogKind::Error);
            }
        });
}

pub fn save_file(app: &AppHandle) {
    let source = with_tabs(app, |tabs| {
        tabs.active()
            .map_err(|e| e.to_string())
            .and_then(|tab| {
                PageSource::for_tab(&tab.url, tab.local_html.as_deref()).map_err(|e| e.to_string())
            })
    })
    .and_then(|source| source);

    let source = match source {
        Ok(source) => source,
        Err(e) => {
            show_message(app, "Save Page As", e, MessageDialogKind::Error);
            return;
        }
    };

    let handle = app.clone();
    app.dialog()
        .file()
        .set_title("Save Page As")
        .add_filter(HTML_FILTER.0, HTML_FILTER.1)
        .add_filter(ALL_FILTER.0, ALL_FILTER.1)
        .save_file(move |path| {
            let Some(path) = path.and_then(|p| p.into_path().ok()) else {
                return;
            };
            tauri::async_runtime::spawn(async move {
                match files::write_page(source, &path).await {
                    Ok(bytes) => log::info!("[Files] Saved {} bytes to {:?}", bytes, path),
                    Err(e) => {
                        log::error!("[Files] {}", e);
                        show_message(&handle, "Save Page As", e.to_string(), MessageDialogKind::Error);
                    }
                }
            });
        });
}

pub fn print_page(app: &AppHandle) {
    show_message(
        app,
        "Print",
        "Print functionality is not implemented yet.".to_string(),
        MessageDialogKind::Info,
    );
}

pub fn build_menu(app: &AppHandle) -> tauri::Result<Menu<tauri::Wry>> {
    let file_menu = SubmenuBuilder::new(app, "File")
        .item(&MenuItemBuilder::with_id(MENU_NEW_TAB, "New Tab").accelerator("CmdOrCtrl+T").build(app)?)
        .item(&MenuItemBuilder::with_id(MENU_OPEN_FILE, "Open File...").accelerator("CmdOrCtrl+O").build(app)?)
        .item(&MenuItemBuilder::with_id(MENU_SAVE_FILE, "Save Page As...").accelerator("CmdOrCtrl+S").build(app)?)
        .item(&MenuItemBuilder::with_id(MENU_PRINT, "Print...").accelerator("CmdOrCtrl+P").build(app)?)
        .separator()
        .item(&PredefinedMenuItem::quit(app, Some("Quit"))?)
        .build()?;

    let edit_menu = SubmenuBuilder::new(app, "Edit")
        .item(&PredefinedMenuItem::undo(app, Some("Undo"))?)
        .item(&PredefinedMenuItem::redo(app, Some("Redo"))?)
        .separator()
        .item(&PredefinedMenuItem::cut(app, Some("Cut"))?)
        .item(&PredefinedMenuItem::copy(app, Some("Copy"))?)
        .item(&PredefinedMenuItem::paste(app, Some("Paste"))?)
        .item(&PredefinedMenuItem::select_all(app, Some("Select All"))?)
        .build()?;

    let view_menu = SubmenuBuilder::new(app, "View")
        .item(&MenuItemBuilder::with_id(MENU_RELOAD, "Reload Page").accelerator("CmdOrCtrl+R").build(app)?)
        .build()?;

    let history_menu = SubmenuBuilder::new(app, "History")
        .item(&MenuItemBuilder::with_id(MENU_BACK, "Back").accelerator("Alt+Left").build(app)?)
        .item(&MenuItemBuilder::with_id(MENU_FORWARD, "Forward").accelerator("Alt+Right").build(app)?)
        .build()?;

    let settings_menu = SubmenuBuilder::new(app, "Settings")
        .item(&MenuItemBuilder::with_id(MENU_SETTINGS, "Settings").build(app)?)
        .build()?;

    MenuBuilder::new(app)
        .items(&[&file_menu, &edit_menu, &view_menu, &history_menu, &settings_menu])
        .build()
}

pub fn handle_menu_event(app: &AppHandle, id: &str) {
    let result = match id {
        // Webviews must not be built on the event-loop thread.
        MENU_NEW_TAB => {
            let handle = app.clone();
            tauri::async_runtime::spawn(async move {
                if let Err(e) = open_tab(&handle, None, DEFAULT_TAB_TITLE) {
                    log::warn!("[Menu] New tab failed: {}", e);
                }
            });
            Ok(())
        }
        MENU_OPEN_FILE => {
            open_file(app);
            Ok(())
        }
        MENU_SAVE_FILE => {
            save_file(app);
            Ok(())
        }
        MENU_PRINT => {
            print_page(app);
            Ok(())
        }
        MENU_SETTINGS => {
            let handle = app.clone();
            tauri::async_runtime::spawn(async move {
                settings_dialog::show_settings_window(&handle);
            });
            Ok(())
        }
        MENU_RELOAD => eval_active(app, "window.location.reload()"),
        MENU_BACK => eval_active(app, "window.history.back()"),
        MENU_FORWARD => eval_active(app, "window.history.forward()"),
        _ => Ok(()),
    };

    if let Err(e) = result {
        log::warn!("[Menu] '{}' failed: {}", id, e);
    }
}

// Async so the webview is built off the main thread.
#[tauri::command]
pub async fn new_tab(app: AppHandle, url: Option<String>) -> Result<usize, String> {
    let url = url.map(|u| navigation::parse_input(&u)).transpose()?;
    open_tab(&app, url, DEFAULT_TAB_TITLE)
}

#[tauri::command]
pub fn close_tab(app: AppHandle, index: usize) -> Result<bool, String> {
    remove_tab(&app, index)
}

#[tauri::command]
pub fn switch_tab(app: AppHandle, index: usize) -> Result<(), String> {
    activate_tab(&app, index)
}

#[tauri::command]
pub fn list_tabs(state: State<AppState>) -> Result<TabsPayload, String> {
    let tabs = state.tabs.lock().map_err(|e| e.to_string())?;
    Ok(tabs.payload())
}

#[tauri::command]
pub fn navigate(app: AppHandle, url: String) -> Result<(), String> {
    navigate_active(&app, &url)
}

#[tauri::command]
pub fn go_back(app: AppHandle) -> Result<(), String> {
    eval_active(&app, "window.history.back()")
}

#[tauri::command]
pub fn go_forward(app: AppHandle) -> Result<(), String> {
    eval_active(&app, "window.history.forward()")
}

#[tauri::command]
pub fn reload(app: AppHandle) -> Result<(), String> {
    eval_active(&app, "window.location.reload()")
}
