//! Messages exchanged with the browser extension over native messaging.
//!
//! With [MessageFraming::Native] every message is a 32 bit length in native byte order followed by
//! that many bytes of json, which is what browsers speak to native hosts. [MessageFraming::Lines]
//! is one json object per line and exists for running the host by hand.

use std::fmt::Display;

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::warn;

use crate::browser_api::{
    registry::TabRegistry, BrowserEvent, IdleState, TabId, TabInfo, TabStatus, WindowId,
    WINDOW_ID_NONE,
};

/// Browsers refuse to send anything bigger to a host.
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageFraming {
    Native,
    Lines,
}

impl Display for MessageFraming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageFraming::Native => write!(f, "native"),
            MessageFraming::Lines => write!(f, "lines"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TabSnapshot {
    pub id: TabId,
    pub window_id: WindowId,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub active: bool,
}

impl From<TabSnapshot> for TabInfo {
    fn from(TabSnapshot { id, window_id, url, active }: TabSnapshot) -> Self {
        TabInfo {
            id,
            window_id,
            url: url.map(Into::into),
            active,
        }
    }
}

/// Everything the extension reports.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    TabActivated {
        tab_id: TabId,
        window_id: WindowId,
    },
    TabUpdated {
        tab_id: TabId,
        window_id: WindowId,
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        status: Option<TabStatus>,
        #[serde(default)]
        active: bool,
    },
    TabRemoved {
        tab_id: TabId,
    },
    WindowFocusChanged {
        #[serde(default)]
        window_id: Option<WindowId>,
    },
    IdleStateChanged {
        state: IdleState,
    },
    /// Sent once the extension connects, so lookups work before any tab event arrives.
    TabsSnapshot {
        tabs: Vec<TabSnapshot>,
        #[serde(default)]
        focused_window_id: Option<WindowId>,
    },
}

impl HostMessage {
    /// Records what the message tells about the browser in `registry` and returns the event the
    /// tracker has to react to.
    pub fn apply_to(self, registry: &mut TabRegistry) -> Option<BrowserEvent> {
        match self {
            HostMessage::TabActivated { tab_id, window_id } => {
                registry.activate(tab_id, window_id);
                Some(BrowserEvent::TabActivated { tab_id })
            }
            HostMessage::TabUpdated {
                tab_id,
                window_id,
                url,
                status,
                active,
            } => {
                registry.upsert_tab(TabInfo {
                    id: tab_id,
                    window_id,
                    url: url.map(Into::into),
                    active,
                });
                Some(BrowserEvent::TabUpdated {
                    tab_id,
                    status,
                    active,
                })
            }
            HostMessage::TabRemoved { tab_id } => {
                // The browser activates another tab right after, which is what switches tracking.
                registry.remove(tab_id);
                None
            }
            HostMessage::WindowFocusChanged { window_id } => {
                let window_id = window_id.filter(|id| *id != WINDOW_ID_NONE);
                registry.focus(window_id);
                Some(BrowserEvent::WindowFocusChanged { window_id })
            }
            HostMessage::IdleStateChanged { state } => Some(BrowserEvent::IdleStateChanged { state }),
            HostMessage::TabsSnapshot {
                tabs,
                focused_window_id,
            } => {
                let focused_window_id = focused_window_id.filter(|id| *id != WINDOW_ID_NONE);
                registry.replace_all(tabs.into_iter().map(Into::into).collect(), focused_window_id);
                Some(BrowserEvent::WindowFocusChanged {
                    window_id: focused_window_id,
                })
            }
        }
    }
}

/// Everything the host tells the extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutgoingMessage {
    /// Idle detection threshold the extension should configure. Sent once at startup.
    Configure { idle_threshold_secs: u64 },
}

/// Reads raw message payloads from the browser.
pub struct FrameReader<R> {
    input: R,
    framing: MessageFraming,
    line: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> FrameReader<R> {
    pub fn new(input: R, framing: MessageFraming) -> Self {
        Self {
            input,
            framing,
            line: Vec::new(),
        }
    }

    /// Returns the next payload, or `None` once the browser closed the channel.
    pub async fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        match self.framing {
            MessageFraming::Native => self.next_native_frame().await,
            MessageFraming::Lines => self.next_line_frame().await,
        }
    }

    /// Oversized messages are skipped whole, so the stream stays in sync.
    async fn next_native_frame(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            let mut length = [0u8; 4];
            if !filled(self.input.read_exact(&mut length).await)? {
                return Ok(None);
            }
            let length = u32::from_ne_bytes(length) as usize;
            if length > MAX_MESSAGE_SIZE {
                warn!("Skipping message of {length} bytes, the limit is {MAX_MESSAGE_SIZE} bytes");
                let skipped = tokio::io::copy(
                    &mut (&mut self.input).take(length as u64),
                    &mut tokio::io::sink(),
                )
                .await?;
                if skipped < length as u64 {
                    return Ok(None);
                }
                continue;
            }
            let mut payload = vec![0u8; length];
            if !filled(self.input.read_exact(&mut payload).await)? {
                warn!("Browser closed the connection in the middle of a message");
                return Ok(None);
            }
            return Ok(Some(payload));
        }
    }

    /// Lines are returned as raw bytes. Invalid utf-8 fails json parsing like any other garbage.
    async fn next_line_frame(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            self.line.clear();
            if self.input.read_until(b'\n', &mut self.line).await? == 0 {
                return Ok(None);
            }
            let line = self.line.trim_ascii();
            if !line.is_empty() {
                return Ok(Some(line.to_vec()));
            }
        }
    }
}

/// `false` when the input ended before the buffer was filled.
fn filled(read: std::io::Result<usize>) -> Result<bool> {
    match read {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e.into()),
    }
}

pub async fn write_message(
    output: &mut (impl AsyncWrite + Unpin),
    framing: MessageFraming,
    message: &OutgoingMessage,
) -> Result<()> {
    let payload = serde_json::to_vec(message)?;
    match framing {
        MessageFraming::Native => {
            let length = u32::try_from(payload.len())?;
            output.write_all(&length.to_ne_bytes()).await?;
            output.write_all(&payload).await?;
        }
        MessageFraming::Lines => {
            output.write_all(&payload).await?;
            output.write_all(b"\n").await?;
        }
    }
    output.flush().await?;
    Ok(())
}
