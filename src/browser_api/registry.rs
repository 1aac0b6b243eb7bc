use std::collections::HashMap;

use anyhow::{anyhow, Result};
use tracing::trace;

use super::{BrowserHost, TabId, TabInfo, WindowId, WindowInfo};

/// Host side mirror of the browser tabs. The extension only pushes events, so the lookups the
/// tracker needs are answered from what those events told us.
#[derive(Debug, Default)]
pub struct TabRegistry {
    tabs: HashMap<TabId, TabInfo>,
    last_focused_window: Option<WindowId>,
    browser_focused: bool,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces everything known with a full snapshot of the browser.
    pub fn replace_all(&mut self, tabs: Vec<TabInfo>, focused_window: Option<WindowId>) {
        self.tabs = tabs.into_iter().map(|tab| (tab.id, tab)).collect();
        self.browser_focused = focused_window.is_some();
        if focused_window.is_some() {
            self.last_focused_window = focused_window;
        }
    }

    /// Inserts or refreshes a tab. A tab reported as active deactivates its window siblings.
    pub fn upsert_tab(&mut self, tab: TabInfo) {
        if tab.active {
            self.deactivate_window(tab.window_id, tab.id);
        }
        match self.tabs.get_mut(&tab.id) {
            Some(existing) => {
                existing.window_id = tab.window_id;
                existing.active = tab.active;
                // Updates without a url (e.g. status only) keep the last known one.
                if tab.url.is_some() {
                    existing.url = tab.url;
                }
            }
            None => {
                self.tabs.insert(tab.id, tab);
            }
        }
    }

    pub fn activate(&mut self, tab_id: TabId, window_id: WindowId) {
        self.deactivate_window(window_id, tab_id);
        let tab = self.tabs.entry(tab_id).or_insert_with(|| TabInfo {
            id: tab_id,
            window_id,
            url: None,
            active: true,
        });
        tab.window_id = window_id;
        tab.active = true;
    }

    pub fn remove(&mut self, tab_id: TabId) {
        self.tabs.remove(&tab_id);
    }

    pub fn focus(&mut self, window_id: Option<WindowId>) {
        trace!("Focus moved to {window_id:?}");
        self.browser_focused = window_id.is_some();
        if window_id.is_some() {
            self.last_focused_window = window_id;
        }
    }

    fn deactivate_window(&mut self, window_id: WindowId, except: TabId) {
        self.tabs
            .values_mut()
            .filter(|tab| tab.window_id == window_id && tab.id != except)
            .for_each(|tab| tab.active = false);
    }
}

impl BrowserHost for TabRegistry {
    fn get_tab(&self, tab_id: TabId) -> Result<TabInfo> {
        self.tabs
            .get(&tab_id)
            .cloned()
            .ok_or_else(|| anyhow!("No tab with id: {tab_id}"))
    }

    fn query_active_tab(&self, window_id: WindowId) -> Result<Option<TabInfo>> {
        Ok(self
            .tabs
            .values()
            .find(|tab| tab.window_id == window_id && tab.active)
            .cloned())
    }

    fn get_last_focused_window(&self) -> Result<Option<WindowInfo>> {
        Ok(self.last_focused_window.map(|id| WindowInfo {
            id,
            focused: self.browser_focused,
        }))
    }
}
