// Browser view: one engine child webview per tab.
//
// Every view gets its own user agent and its own engine hooks, so nothing is
// registered on a process-wide profile.

use std::sync::{Arc, RwLock};
use tauri::webview::PageLoadEvent;
use tauri::{
    AppHandle, Manager, PhysicalPosition, PhysicalSize, Rect, Webview, WebviewBuilder,
    WebviewUrl, Window,
};
use url::Url;

use crate::main_window;
use crate::modules::downloads;
use crate::settings::Settings;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Logical height of the tab strip plus the navigation toolbar.
pub const CHROME_HEIGHT: f64 = 40.0 + 44.0;

/// Area below the toolbar, in physical pixels.
pub fn content_bounds(window: &Window) -> tauri::Result<Rect> {
    let size = window.inner_size()?;
    let scale = window.scale_factor()?;
    Ok(content_rect(size, scale))
}

pub fn content_rect(window_size: PhysicalSize<u32>, scale_factor: f64) -> Rect {
    let toolbar = (CHROME_HEIGHT * scale_factor) as u32;
    let height = window_size.height.saturating_sub(toolbar).max(100);
    Rect {
        position: PhysicalPosition::new(0, toolbar as i32).into(),
        size: PhysicalSize::new(window_size.width, height).into(),
    }
}

/// Creates the view for tab `label` inside the main window.
pub fn create(
    app: &AppHandle,
    window: &Window,
    label: &str,
    url: Url,
    settings: Arc<RwLock<Settings>>,
) -> tauri::Result<Webview> {
    let load_app = app.clone();
    let title_app = app.clone();
    let download_app = app.clone();

    let builder = WebviewBuilder::new(label, WebviewUrl::External(url))
        .user_agent(BROWSER_USER_AGENT)
        .on_page_load(move |webview, payload| {
            if matches!(payload.event(), PageLoadEvent::Finished) {
                log::debug!("[View {}] Loaded {}", webview.label(), payload.url());
            }
            main_window::on_url_changed(&load_app, webview.label(), payload.url());
        })
        .on_document_title_changed(move |webview, title| {
            main_window::on_title_changed(&title_app, webview.label(), &title);
        })
        .on_download(move |_webview, event| {
            downloads::intercept(&download_app, &settings, event)
        });

    let bounds = content_bounds(window)?;
    let webview = window.add_child(builder, bounds.position, bounds.size)?;
    log::info!("[View {}] Created", label);
    Ok(webview)
}

pub fn find(app: &AppHandle, label: &str) -> Option<Webview> {
    app.get_webview(label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tauri::{Position, Size};

    #[test]
    fn test_content_rect_leaves_room_for_toolbar() {
        let rect = content_rect(PhysicalSize::new(1200, 800), 1.0);
        assert_eq!(rect.position, Position::Physical(PhysicalPosition::new(0, 84)));
        assert_eq!(rect.size, Size::Physical(PhysicalSize::new(1200, 716)));
    }

    #[test]
    fn test_content_rect_scales_and_keeps_minimum_height() {
        let rect = content_rect(PhysicalSize::new(2400, 1600), 2.0);
        assert_eq!(rect.position, Position::Physical(PhysicalPosition::new(0, 168)));

        let tiny = content_rect(PhysicalSize::new(300, 120), 1.0);
        assert_eq!(tiny.size, Size::Physical(PhysicalSize::new(300, 100)));
    }
}
