// Tab bookkeeping - pure logic, no Tauri imports.
// The main window owns one TabSet and mirrors it onto engine webviews.

use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_TAB_TITLE: &str = "New Tab";

#[derive(Clone, Debug, PartialEq)]
pub struct Tab {
    /// Label of the engine webview backing this tab.
    pub label: String,
    pub title: String,
    pub url: String,
    /// Raw HTML of a file opened into the tab, until it navigates away.
    pub local_html: Option<String>,
}

impl Tab {
    pub fn new(label: String, url: String, title: &str) -> Self {
        Self {
            label,
            title: title.to_string(),
            url,
            local_html: None,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct TabSummary {
    pub label: String,
    pub title: String,
}

/// Payload of the `tabs-changed` event.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabsPayload {
    pub tabs: Vec<TabSummary>,
    pub active: Option<usize>,
    pub active_url: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum TabError {
    #[error("no tab at index {0}")]
    OutOfRange(usize),
    #[error("no tab labelled '{0}'")]
    UnknownLabel(String),
    #[error("no open tab")]
    NoActiveTab,
}

#[derive(Debug, Default)]
pub struct TabSet {
    tabs: Vec<Tab>,
    active: usize,
    next_id: u64,
}

impl TabSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    /// Reserves a fresh webview label. Labels are never reused.
    pub fn next_label(&mut self) -> String {
        self.next_id += 1;
        format!("tab-{}", self.next_id)
    }

    /// Appends a tab and makes it active. Returns its index.
    pub fn push(&mut self, tab: Tab) -> usize {
        self.tabs.push(tab);
        self.active = self.tabs.len() - 1;
        self.active
    }

    pub fn active_index(&self) -> Option<usize> {
        if self.tabs.is_empty() {
            None
        } else {
            Some(self.active)
        }
    }

    pub fn active(&self) -> Result<&Tab, TabError> {
        self.tabs.get(self.active).ok_or(TabError::NoActiveTab)
    }

    pub fn active_mut(&mut self) -> Result<&mut Tab, TabError> {
        self.tabs.get_mut(self.active).ok_or(TabError::NoActiveTab)
    }

    pub fn is_active(&self, label: &str) -> bool {
        self.active().map(|t| t.label == label).unwrap_or(false)
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.label == label)
    }

    pub fn get_mut(&mut self, label: &str) -> Result<&mut Tab, TabError> {
        self.tabs
            .iter_mut()
            .find(|t| t.label == label)
            .ok_or_else(|| TabError::UnknownLabel(label.to_string()))
    }

    pub fn select(&mut self, index: usize) -> Result<&Tab, TabError> {
        if index >= self.tabs.len() {
            return Err(TabError::OutOfRange(index));
        }
        self.active = index;
        Ok(&self.tabs[index])
    }

    /// Removes the tab at `index`. The last remaining tab is never closed;
    /// that case returns `Ok(None)`.
    ///
    /// The active tab stays selected if it survives. Closing the active tab
    /// selects the one that slides into its position, or the new last tab.
    pub fn close(&mut self, index: usize) -> Result<Option<Tab>, TabError> {
        if index >= self.tabs.len() {
            return Err(TabError::OutOfRange(index));
        }
        if self.tabs.len() < 2 {
            return Ok(None);
        }

        let removed = self.tabs.remove(index);
        if index < self.active || self.active >= self.tabs.len() {
            self.active -= 1;
        }
        Ok(Some(removed))
    }

    pub fn set_title(&mut self, label: &str, title: &str) -> Result<(), TabError> {
        let tab = self.get_mut(label)?;
        tab.title = title.to_string();
        Ok(())
    }

    /// Records the URL a tab reports. Returns whether that tab is the
    /// active one, i.e. whether the URL bar should follow.
    pub fn record_url(&mut self, label: &str, url: &str) -> Result<bool, TabError> {
        let tab = self.get_mut(label)?;
        if tab.url != url {
            tab.url = url.to_string();
            tab.local_html = None;
        }
        Ok(self.is_active(label))
    }

    pub fn payload(&self) -> TabsPayload {
        TabsPayload {
            tabs: self
                .tabs
                .iter()
                .map(|t| TabSummary {
                    label: t.label.clone(),
                    title: t.title.clone(),
                })
                .collect(),
            active: self.active_index(),
            active_url: self.active().ok().map(|t| t.url.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tab_set(count: usize) -> TabSet {
        let mut tabs = TabSet::new();
        for i in 0..count {
            let label = tabs.next_label();
            tabs.push(Tab::new(label, format!("https://example.com/{}", i), DEFAULT_TAB_TITLE));
        }
        tabs
    }

    fn labels(tabs: &TabSet) -> Vec<&str> {
        tabs.tabs().iter().map(|t| t.label.as_str()).collect()
    }

    #[test]
    fn test_push_activates_new_tab() {
        let mut tabs = tab_set(2);
        assert_eq!(tabs.active_index(), Some(1));

        let label = tabs.next_label();
        let index = tabs.push(Tab::new(label, "about:blank".into(), DEFAULT_TAB_TITLE));
        assert_eq!(index, 2);
        assert_eq!(tabs.active().unwrap().label, "tab-3");
        assert_eq!(tabs.active().unwrap().title, "New Tab");
    }

    #[test]
    fn test_labels_are_not_reused() {
        let mut tabs = tab_set(2);
        tabs.close(1).unwrap();
        assert_eq!(tabs.next_label(), "tab-3");
    }

    #[test]
    fn test_last_tab_cannot_be_closed() {
        let mut tabs = tab_set(1);
        assert_eq!(tabs.close(0), Ok(None));
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs.active_index(), Some(0));
    }

    #[rstest]
    // (open tabs, active, closed index, expected active label)
    #[case(3, 2, 2, "tab-2")] // closing the active last tab selects the new last one
    #[case(3, 0, 0, "tab-2")] // closing the active first tab selects its successor
    #[case(3, 1, 1, "tab-3")]
    #[case(3, 2, 0, "tab-3")] // closing before the active tab keeps it selected
    #[case(3, 0, 2, "tab-1")] // closing after the active tab keeps it selected
    #[case(2, 1, 0, "tab-2")]
    fn test_close_keeps_valid_selection(
        #[case] count: usize,
        #[case] active: usize,
        #[case] index: usize,
        #[case] expected: &str,
    ) {
        let mut tabs = tab_set(count);
        tabs.select(active).unwrap();

        let removed = tabs.close(index).unwrap().unwrap();
        assert_eq!(removed.label, format!("tab-{}", index + 1));
        assert_eq!(tabs.len(), count - 1);
        assert_eq!(tabs.active().unwrap().label, expected);
        assert!(tabs.active_index().unwrap() < tabs.len());
    }

    #[test]
    fn test_close_out_of_range() {
        let mut tabs = tab_set(2);
        assert_eq!(tabs.close(5), Err(TabError::OutOfRange(5)));
        assert_eq!(labels(&tabs), vec!["tab-1", "tab-2"]);
    }

    #[test]
    fn test_select() {
        let mut tabs = tab_set(3);
        assert_eq!(tabs.select(0).unwrap().label, "tab-1");
        assert!(tabs.is_active("tab-1"));
        assert_eq!(tabs.select(3), Err(TabError::OutOfRange(3)));
        assert_eq!(tabs.active_index(), Some(0));
    }

    #[test]
    fn test_record_url_reports_active_tab_only() {
        let mut tabs = tab_set(2);
        assert_eq!(tabs.record_url("tab-2", "https://rust-lang.org/"), Ok(true));
        assert_eq!(tabs.record_url("tab-1", "https://docs.rs/"), Ok(false));
        assert_eq!(tabs.tabs()[0].url, "https://docs.rs/");
        assert_eq!(
            tabs.record_url("tab-9", "https://docs.rs/"),
            Err(TabError::UnknownLabel("tab-9".into()))
        );
    }

    #[test]
    fn test_navigation_drops_local_html() {
        let mut tabs = tab_set(1);
        let tab = tabs.active_mut().unwrap();
        tab.local_html = Some("<h1>local</h1>".into());
        let url = tab.url.clone();

        tabs.record_url("tab-1", &url).unwrap();
        assert!(tabs.active().unwrap().local_html.is_some());

        tabs.record_url("tab-1", "https://example.org/").unwrap();
        assert!(tabs.active().unwrap().local_html.is_none());
    }

    #[test]
    fn test_set_title_and_payload() {
        let mut tabs = tab_set(2);
        tabs.set_title("tab-1", "Example Domain").unwrap();
        tabs.select(0).unwrap();

        let payload = tabs.payload();
        assert_eq!(payload.active, Some(0));
        assert_eq!(payload.active_url.as_deref(), Some("https://example.com/0"));
        assert_eq!(
            payload.tabs,
            vec![
                TabSummary { label: "tab-1".into(), title: "Example Domain".into() },
                TabSummary { label: "tab-2".into(), title: "New Tab".into() },
            ]
        );

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["activeUrl"], "https://example.com/0");
    }

    #[test]
    fn test_empty_set_has_no_active_tab() {
        let tabs = TabSet::new();
        assert!(tabs.is_empty());
        assert_eq!(tabs.active_index(), None);
        assert_eq!(tabs.active(), Err(TabError::NoActiveTab));
    }
}
