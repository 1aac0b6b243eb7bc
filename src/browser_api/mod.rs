//! Contract between the tracker and the browser it observes.
//! [BrowserHost] answers the lookups the tracker needs (tab by id, active tab of a window, last
//! focused window) and [BrowserEvent] is the set of signals that drive it.
//! [registry::TabRegistry] is the implementation used by the native messaging host.

pub mod registry;

use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub type TabId = i64;
pub type WindowId = i64;

/// Browsers report `-1` as the window id when focus moved outside of the browser.
pub const WINDOW_ID_NONE: WindowId = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabInfo {
    pub id: TabId,
    pub window_id: WindowId,
    /// Missing for tabs the extension isn't allowed to see, or that are still loading.
    pub url: Option<Arc<str>>,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: WindowId,
    pub focused: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdleState {
    Active,
    Idle,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Loading,
    Complete,
    Unloaded,
}

/// Signals that move the attention tracker between states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEvent {
    TabActivated {
        tab_id: TabId,
    },
    TabUpdated {
        tab_id: TabId,
        status: Option<TabStatus>,
        active: bool,
    },
    /// `None` means focus left the browser.
    WindowFocusChanged {
        window_id: Option<WindowId>,
    },
    IdleStateChanged {
        state: IdleState,
    },
    Heartbeat,
}

/// Lookups into the browser state. Every failure is treated by the tracker as "nothing is
/// active", so implementations are free to return errors for closed or unknown tabs.
#[cfg_attr(test, mockall::automock)]
pub trait BrowserHost {
    fn get_tab(&self, tab_id: TabId) -> Result<TabInfo>;

    /// Active tab of a window. `None` for windows without tabs.
    fn query_active_tab(&self, window_id: WindowId) -> Result<Option<TabInfo>>;

    fn get_last_focused_window(&self) -> Result<Option<WindowInfo>>;
}
