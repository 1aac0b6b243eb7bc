use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};
use tracker::AttentionTracker;

use crate::{
    browser_api::{registry::TabRegistry, BrowserEvent},
    utils::clock::Clock,
};

use super::{protocol::HostMessage, storage::daily_storage::DailyStorage};

pub mod domain;
pub mod tracker;

/// The single consumer of browser messages. It owns the tracker, handles one message to completion
/// before taking the next one and injects heartbeats, so the open segment is flushed at least every
/// `heartbeat_interval`.
pub struct TrackingModule<S> {
    receiver: Receiver<HostMessage>,
    tracker: AttentionTracker<S, TabRegistry>,
    shutdown: CancellationToken,
    heartbeat_interval: Duration,
    time_provider: Box<dyn Clock>,
}

impl<S: DailyStorage> TrackingModule<S> {
    pub fn new(
        receiver: Receiver<HostMessage>,
        tracker: AttentionTracker<S, TabRegistry>,
        shutdown: CancellationToken,
        heartbeat_interval: Duration,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            receiver,
            tracker,
            shutdown,
            heartbeat_interval,
            time_provider,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let mut next_heartbeat = self.time_provider.instant() + self.heartbeat_interval;
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    break;
                }
                message = self.receiver.recv() => {
                    let Some(message) = message else {
                        info!("Message channel closed");
                        break;
                    };
                    self.process(message).await;
                }
                _ = self.time_provider.sleep_until(next_heartbeat) => {
                    next_heartbeat += self.heartbeat_interval;
                    self.dispatch(BrowserEvent::Heartbeat).await;
                }
            }
        }

        self.receiver.close();
        self.tracker
            .shutdown()
            .await
            .inspect_err(|e| error!("Failed to save last segment {e:?}"))
    }

    async fn process(&mut self, message: HostMessage) {
        debug!("Processing message {:?}", message);
        if let Some(event) = message.apply_to(self.tracker.host_mut()) {
            self.dispatch(event).await;
        }
    }

    async fn dispatch(&mut self, event: BrowserEvent) {
        match self.tracker.handle(event.clone()).await {
            Ok(_) => {
                trace!("Processed event {:?}, state {:?}", event, self.tracker.state())
            }
            Err(e) => {
                error!("Error processing event {:?}: {e:?}", event)
            }
        }
    }
}
