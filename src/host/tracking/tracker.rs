use anyhow::{anyhow, Result};
use tokio::time::Instant;
use tracing::{debug, info, instrument};

use crate::{
    browser_api::{BrowserEvent, BrowserHost, IdleState, TabId, TabInfo, TabStatus, WindowId},
    host::storage::{daily_storage::DailyStorage, entities::add_usage},
    utils::clock::Clock,
};

use super::domain::{resolve_domain, Domain};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TrackerState {
    /// Nothing is tracked: browser unfocused, user idle or a non web page is active.
    #[default]
    Idle,
    /// `domain` holds the user's attention since `start`.
    Tracking { domain: Domain, start: Instant },
}

/// Decides which domain is active and turns every transition into usage written to storage.
///
/// Every transition first closes the open segment, then resolves the next one starting at the
/// exact instant the previous one ended. There is only one tracker per storage, so the
/// read-modify-write of a day record needs no further coordination.
pub struct AttentionTracker<S, H> {
    storage: S,
    host: H,
    clock: Box<dyn Clock>,
    state: TrackerState,
    /// Last idle state the browser reported. Tab events never reopen tracking while away.
    user_state: IdleState,
}

impl<S: DailyStorage, H: BrowserHost> AttentionTracker<S, H> {
    pub fn new(storage: S, host: H, clock: Box<dyn Clock>) -> Self {
        Self {
            storage,
            host,
            clock,
            state: TrackerState::Idle,
            user_state: IdleState::Active,
        }
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub async fn handle(&mut self, event: BrowserEvent) -> Result<()> {
        match event {
            BrowserEvent::TabActivated { tab_id } => self.on_tab_activated(tab_id).await,
            BrowserEvent::TabUpdated {
                tab_id,
                status,
                active,
            } => self.on_tab_updated(tab_id, status, active).await,
            BrowserEvent::WindowFocusChanged { window_id } => {
                self.on_window_focus_changed(window_id).await
            }
            BrowserEvent::IdleStateChanged { state } => self.on_idle_state_changed(state).await,
            BrowserEvent::Heartbeat => self.on_heartbeat().await,
        }
    }

    pub async fn on_tab_activated(&mut self, tab_id: TabId) -> Result<()> {
        self.reopen_with_tab(tab_id).await
    }

    /// Only finished navigations of the active tab matter. Everything else is a background tab
    /// or a page that is still loading.
    pub async fn on_tab_updated(
        &mut self,
        tab_id: TabId,
        status: Option<TabStatus>,
        active: bool,
    ) -> Result<()> {
        if !active || status != Some(TabStatus::Complete) {
            return Ok(());
        }
        self.reopen_with_tab(tab_id).await
    }

    pub async fn on_window_focus_changed(&mut self, window_id: Option<WindowId>) -> Result<()> {
        match window_id {
            None => self.stop_tracking().await,
            Some(window_id) => {
                self.reopen_with(|host| active_tab_of(host, window_id))
                    .await
            }
        }
    }

    pub async fn on_idle_state_changed(&mut self, state: IdleState) -> Result<()> {
        self.user_state = state;
        match state {
            IdleState::Idle | IdleState::Locked => self.stop_tracking().await,
            IdleState::Active => {
                let window = match self.host.get_last_focused_window() {
                    Ok(Some(window)) if window.focused => window,
                    Ok(_) => {
                        debug!("User is back, but the browser isn't focused");
                        return Ok(());
                    }
                    Err(e) => {
                        debug!("Failed to resolve last focused window {e:?}");
                        return Ok(());
                    }
                };
                self.reopen_with(|host| active_tab_of(host, window.id))
                    .await
            }
        }
    }

    /// Flushes the open segment and continues tracking the same domain.
    pub async fn on_heartbeat(&mut self) -> Result<()> {
        let TrackerState::Tracking { domain, .. } = &self.state else {
            return Ok(());
        };
        let domain = domain.clone();
        let now = self.clock.instant();
        let closed = self.close_segment_at(now).await;
        self.state = TrackerState::Tracking { domain, start: now };
        closed
    }

    /// Writes the open segment, if there is one, to storage. The tracker is idle afterwards.
    pub async fn close_segment(&mut self) -> Result<()> {
        let now = self.clock.instant();
        self.close_segment_at(now).await
    }

    /// Closes the last segment before the tracker goes away.
    pub async fn shutdown(&mut self) -> Result<()> {
        info!("Closing last segment");
        self.close_segment().await
    }

    async fn stop_tracking(&mut self) -> Result<()> {
        self.close_segment().await
    }

    /// Tab events only count while the user is present and the tab sits in the focused window.
    async fn reopen_with_tab(&mut self, tab_id: TabId) -> Result<()> {
        if self.user_state != IdleState::Active {
            debug!("Ignoring tab {tab_id} while the user is away");
            return self.stop_tracking().await;
        }
        self.reopen_with(|host| focused_tab(host, tab_id)).await
    }

    /// The segment is closed before the next tab is even looked up. Even if writing fails, the
    /// tracker still moves on to the new tab, so a broken write never keeps a stale domain.
    async fn reopen_with(&mut self, resolve: impl FnOnce(&H) -> Result<TabInfo>) -> Result<()> {
        let now = self.clock.instant();
        let closed = self.close_segment_at(now).await;
        let tab = resolve(&self.host);
        self.open_from_tab(tab, now);
        closed
    }

    fn open_from_tab(&mut self, tab: Result<TabInfo>, start: Instant) {
        let domain = match tab {
            Ok(tab) => tab.url.as_deref().and_then(resolve_domain),
            Err(e) => {
                debug!("Failed to resolve tab {e:?}");
                None
            }
        };
        self.state = match domain {
            Some(domain) => {
                debug!("Tracking {domain}");
                TrackerState::Tracking { domain, start }
            }
            None => TrackerState::Idle,
        };
    }

    #[instrument(skip(self))]
    async fn close_segment_at(&mut self, now: Instant) -> Result<()> {
        let TrackerState::Tracking { domain, start } = std::mem::take(&mut self.state) else {
            return Ok(());
        };
        let duration_ms = u64::try_from(now.saturating_duration_since(start).as_millis())?;
        // A segment spanning midnight belongs to the day it was closed on.
        let today = self.clock.today();

        let mut records = self.storage.get(&[today]).await?;
        add_usage(
            records.entry(today).or_default(),
            domain.as_str(),
            duration_ms,
        );
        self.storage.set(records).await?;

        debug!("Added {duration_ms}ms to {domain} on {today}");
        Ok(())
    }
}

fn focused_tab(host: &impl BrowserHost, tab_id: TabId) -> Result<TabInfo> {
    let tab = host.get_tab(tab_id)?;
    match host.get_last_focused_window()? {
        Some(window) if window.focused && window.id == tab.window_id => Ok(tab),
        _ => Err(anyhow!("Tab {tab_id} is not in the focused window")),
    }
}

fn active_tab_of(host: &impl BrowserHost, window_id: WindowId) -> Result<TabInfo> {
    host.query_active_tab(window_id)?
        .ok_or_else(|| anyhow!("Window {window_id} has no active tab"))
}
