// Open/save of page files.

use std::io;
use std::path::Path;
use thiserror::Error;
use url::Url;

use crate::modules::downloads::{self, DownloadError};

pub const HTML_FILTER: (&str, &[&str]) = ("HTML files", &["htm", "html"]);
pub const ALL_FILTER: (&str, &[&str]) = ("All files", &["*"]);

#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("failed to write page: {0}")]
    Write(#[from] io::Error),
    #[error(transparent)]
    Fetch(#[from] DownloadError),
    #[error("the page has no savable address: {0}")]
    Unsavable(String),
}

/// What "Save Page As" writes for a tab.
#[derive(Debug, Clone, PartialEq)]
pub enum PageSource {
    /// A file opened into the tab.
    Html(String),
    Remote(Url),
}

impl PageSource {
    pub fn for_tab(url: &str, local_html: Option<&str>) -> Result<Self, FileError> {
        if let Some(html) = local_html {
            return Ok(Self::Html(html.to_string()));
        }
        match Url::parse(url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(Self::Remote(u)),
            _ => Err(FileError::Unsavable(url.to_string())),
        }
    }
}

pub fn read_html(path: &Path) -> Result<String, FileError> {
    std::fs::read_to_string(path).map_err(|source| FileError::Read {
        path: path.display().to_string(),
        source,
    })
}

/// Script that replaces the current document with `html`.
pub fn replace_document_script(html: &str) -> String {
    // A JSON string literal is a valid JS string literal; escape "</" so the
    // markup cannot terminate an enclosing script element.
    let literal = serde_json::Value::String(html.to_string())
        .to_string()
        .replace("</", "<\\/");
    format!(
        "document.open();document.write({});document.close();",
        literal
    )
}

/// Tab title for an opened file.
pub fn title_for(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("Local File")
        .to_string()
}

pub async fn write_page(source: PageSource, path: &Path) -> Result<u64, FileError> {
    match source {
        PageSource::Html(html) => {
            tokio::fs::write(path, html.as_bytes()).await?;
            Ok(html.len() as u64)
        }
        PageSource::Remote(url) => Ok(downloads::fetch_to_file(&url, path).await?),
    }
}
