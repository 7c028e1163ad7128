// Download interception.
//
// http(s) downloads are taken from the engine, resolved through the user's
// answers and transferred by the shell itself. Engine-local sources (blob:,
// data:) are left to the engine.

use futures_util::StreamExt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tauri::webview::DownloadEvent;
use tauri::AppHandle;
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::browser_view::BROWSER_USER_AGENT;
use crate::settings::Settings;

const FALLBACK_FILE_NAME: &str = "download";

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    url: Url,
    suggested_file_name: String,
}

impl DownloadRequest {
    pub fn new(url: Url, suggested: Option<&str>) -> Self {
        let suggested_file_name = suggested
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| file_name_from_url(&url))
            .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string());

        Self {
            url,
            suggested_file_name,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn suggested_file_name(&self) -> &str {
        &self.suggested_file_name
    }

    pub fn is_insecure(&self) -> bool {
        self.url.scheme() == "http"
    }

    /// Only http(s) can be re-fetched by the shell. `blob:`, `data:` and
    /// other engine-local sources stay with the engine's own download.
    pub fn is_shell_transfer(&self) -> bool {
        matches!(self.url.scheme(), "http" | "https")
    }
}

fn file_name_from_url(url: &Url) -> Option<String> {
    url.path_segments()?
        .next_back()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The user answered "No" to the insecure-connection warning.
    Declined,
    /// The save dialog was dismissed.
    NoDestination,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Accepted { directory: PathBuf, file_name: String },
    Cancelled(CancelReason),
}

pub fn needs_insecure_warning(request: &DownloadRequest, http_warning: bool) -> bool {
    http_warning && request.is_insecure()
}

/// Splits a chosen save path into destination directory and file name.
pub fn split_destination(path: &Path) -> Option<(PathBuf, String)> {
    let file_name = path.file_name()?.to_str()?.to_string();
    let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Some((directory, file_name))
}

pub type Reply<T> = Box<dyn FnOnce(T) + Send>;

/// The questions a download asks the user. Answers arrive through the
/// reply callbacks so no prompt blocks the event loop.
pub trait DownloadPrompter: Send + Sync {
    fn confirm_insecure(&self, url: &Url, reply: Reply<bool>);
    fn choose_destination(&self, suggested_file_name: &str, reply: Reply<Option<PathBuf>>);
}

/// Runs the download policy. `done` is called exactly once.
pub fn resolve<P, F>(request: DownloadRequest, http_warning: bool, prompter: Arc<P>, done: F)
where
    P: DownloadPrompter + ?Sized + 'static,
    F: FnOnce(DownloadRequest, Resolution) + Send + 'static,
{
    if !needs_insecure_warning(&request, http_warning) {
        choose_destination(request, prompter, done);
        return;
    }

    let url = request.url.clone();
    let next = prompter.clone();
    prompter.confirm_insecure(
        &url,
        Box::new(move |proceed| {
            if proceed {
                choose_destination(request, next, done);
            } else {
                done(request, Resolution::Cancelled(CancelReason::Declined));
            }
        }),
    );
}

fn choose_destination<P, F>(request: DownloadRequest, prompter: Arc<P>, done: F)
where
    P: DownloadPrompter + ?Sized + 'static,
    F: FnOnce(DownloadRequest, Resolution) + Send + 'static,
{
    let suggested = request.suggested_file_name.clone();
    prompter.choose_destination(
        &suggested,
        Box::new(move |path| {
            let resolution = match path.as_deref().and_then(split_destination) {
                Some((directory, file_name)) => Resolution::Accepted { directory, file_name },
                None => Resolution::Cancelled(CancelReason::NoDestination),
            };
            done(request, resolution);
        }),
    );
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to write file: {0}")]
    Io(#[from] io::Error),
}

/// Sibling path a transfer streams into before it is complete.
pub fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Streams `url` into `path`. Returns the number of bytes written.
///
/// The body goes to a `.part` sibling that is renamed over `path` only once
/// the transfer completed; a failed transfer leaves neither file behind.
pub async fn fetch_to_file(url: &Url, path: &Path) -> Result<u64, DownloadError> {
    let client = reqwest::Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .build()?;

    let response = client.get(url.as_str()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status(status));
    }

    let tmp_path = part_path(path);
    match stream_body(response, &tmp_path).await {
        Ok(written) => {
            tokio::fs::rename(&tmp_path, path).await?;
            Ok(written)
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            Err(e)
        }
    }
}

async fn stream_body(response: reqwest::Response, path: &Path) -> Result<u64, DownloadError> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

/// Prompts backed by native dialogs.
pub struct DialogPrompter {
    app: AppHandle,
}

impl DialogPrompter {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

impl DownloadPrompter for DialogPrompter {
    fn confirm_insecure(&self, url: &Url, reply: Reply<bool>) {
        self.app
            .dialog()
            .message(format!(
                "The file is being downloaded from an insecure HTTP site: {}. Continue?",
                url
            ))
            .title("Insecure Connection")
            .kind(MessageDialogKind::Warning)
            .buttons(MessageDialogButtons::YesNo)
            .show(move |proceed| reply(proceed));
    }

    fn choose_destination(&self, suggested_file_name: &str, reply: Reply<Option<PathBuf>>) {
        self.app
            .dialog()
            .file()
            .set_title("Save File")
            .set_file_name(suggested_file_name)
            .save_file(move |path| reply(path.and_then(|p| p.into_path().ok())));
    }
}

/// Engine download hook of a browser view. Declines the engine's own
/// transfer for http(s); accepted requests are fetched by [`fetch_to_file`].
pub fn intercept(
    app: &AppHandle,
    settings: &Arc<RwLock<Settings>>,
    event: DownloadEvent<'_>,
) -> bool {
    match event {
        DownloadEvent::Requested { url, destination } => {
            let suggested = destination
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string);
            let request = DownloadRequest::new(url, suggested.as_deref());
            if !request.is_shell_transfer() {
                log::info!("[Download] Engine handles {}", request.url().scheme());
                return true;
            }
            let http_warning = settings.read().map(|s| s.http_warning).unwrap_or(true);

            log::info!("[Download] Requested {}", request.url());
            let prompter = Arc::new(DialogPrompter::new(app.clone()));
            let app = app.clone();
            resolve(request, http_warning, prompter, move |request, resolution| {
                finish(app, request, resolution)
            });
            false
        }
        DownloadEvent::Finished { url, success, .. } => {
            log::debug!("[Download] Engine finished {} (success: {})", url, success);
            true
        }
        _ => true,
    }
}

fn finish(app: AppHandle, request: DownloadRequest, resolution: Resolution) {
    match resolution {
        Resolution::Cancelled(reason) => {
            log::info!("[Download] Cancelled {} ({:?})", request.url(), reason);
        }
        Resolution::Accepted { directory, file_name } => {
            let path = directory.join(&file_name);
            log::info!("[Download] Saving {} to {:?}", request.url(), path);
            tauri::async_runtime::spawn(async move {
                match fetch_to_file(request.url(), &path).await {
                    Ok(bytes) => log::info!("[Download] Wrote {} bytes to {:?}", bytes, path),
                    Err(e) => {
                        log::error!("[Download] {} failed: {}", request.url(), e);
                        app.dialog()
                            .message(format!("Download of {} failed: {}", file_name, e))
                            .title("Download Failed")
                            .kind(MessageDialogKind::Error)
                            .show(|_| {});
                    }
                }
            });
        }
    }
}
