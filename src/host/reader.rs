use anyhow::Result;
use tokio::{io::AsyncBufRead, sync::mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::protocol::{FrameReader, HostMessage};

/// Reads messages coming from the browser and forwards them to the
/// [TrackingModule](super::tracking::TrackingModule). Once the browser disconnects the sender is
/// dropped, which stops the tracking module as well.
pub struct HostMessageReader<R> {
    next: mpsc::Sender<HostMessage>,
    input: FrameReader<R>,
    shutdown: CancellationToken,
}

impl<R: AsyncBufRead + Unpin> HostMessageReader<R> {
    pub fn new(
        next: mpsc::Sender<HostMessage>,
        input: FrameReader<R>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            next,
            input,
            shutdown,
        }
    }

    /// Executes the reading loop.
    pub async fn run(mut self) -> Result<()> {
        loop {
            let frame = tokio::select! {
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                frame = self.input.next_frame() => frame?,
            };

            let Some(frame) = frame else {
                info!("Browser closed the connection");
                return Ok(());
            };

            match serde_json::from_slice::<HostMessage>(&frame) {
                Ok(message) => {
                    debug!("Sending message {:?}", message);
                    self.next
                        .send(message)
                        .await
                        .inspect_err(|e| error!("Unexpected error during sending {e:?}"))?;
                }
                Err(e) => {
                    warn!(
                        "Skipping malformed message {}: {e}",
                        String::from_utf8_lossy(&frame)
                    )
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tokio::{io::BufReader, sync::mpsc};
    use tokio_util::sync::CancellationToken;

    use crate::host::protocol::{FrameReader, HostMessage, MessageFraming, MAX_MESSAGE_SIZE};

    use super::HostMessageReader;

    async fn read_all(input: &[u8], framing: MessageFraming) -> Result<Vec<HostMessage>> {
        let (sender, mut receiver) = mpsc::channel(8);
        HostMessageReader::new(
            sender,
            FrameReader::new(BufReader::new(input), framing),
            CancellationToken::new(),
        )
        .run()
        .await?;

        let mut messages = Vec::new();
        while let Some(message) = receiver.recv().await {
            messages.push(message);
        }
        Ok(messages)
    }

    #[tokio::test]
    async fn test_bad_lines_are_skipped() -> Result<()> {
        let input = b"\xff\xfe\xfd\nnot json\n{\"type\":\"tab_removed\",\"tab_id\":4}\n";

        let messages = read_all(input, MessageFraming::Lines).await?;

        assert_eq!(messages, vec![HostMessage::TabRemoved { tab_id: 4 }]);
        Ok(())
    }

    #[tokio::test]
    async fn test_oversized_message_is_skipped() -> Result<()> {
        let oversized = MAX_MESSAGE_SIZE + 10;
        let mut input = (oversized as u32).to_ne_bytes().to_vec();
        input.extend(vec![b' '; oversized]);
        let message = br#"{"type":"tab_removed","tab_id":7}"#;
        input.extend((message.len() as u32).to_ne_bytes());
        input.extend(message);

        let messages = read_all(&input, MessageFraming::Native).await?;

        assert_eq!(messages, vec![HostMessage::TabRemoved { tab_id: 7 }]);
        Ok(())
    }
}
