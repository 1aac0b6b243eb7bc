use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use protocol::{write_message, FrameReader, HostMessage, MessageFraming, OutgoingMessage};
use reader::HostMessageReader;
use storage::daily_storage::JsonDailyStorage;
use tokio::{
    io::{AsyncBufRead, AsyncWrite, BufReader},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracking::{tracker::AttentionTracker, TrackingModule};

use crate::{
    browser_api::registry::TabRegistry,
    utils::clock::{Clock, DefaultClock},
};

pub mod args;
pub mod protocol;
pub mod reader;
pub mod shutdown;
pub mod storage;
pub mod tracking;

/// Directory inside the application directory that holds daily records.
pub const RECORDS_DIR: &str = "records";

pub const DEFAULT_IDLE_THRESHOLD: Duration = Duration::from_secs(60);
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
pub struct HostConfig {
    pub framing: MessageFraming,
    pub idle_threshold: Duration,
    pub heartbeat_interval: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            framing: MessageFraming::Native,
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }
}

/// Represents the starting point for the host. Talks to the browser over stdin/stdout.
pub async fn start_host(dir: PathBuf, config: HostConfig) -> Result<()> {
    let shutdown_token = CancellationToken::new();
    run_host(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        dir.join(RECORDS_DIR),
        config,
        shutdown_token,
        DefaultClock,
    )
    .await
}

async fn run_host(
    input: impl AsyncBufRead + Unpin,
    mut output: impl AsyncWrite + Unpin,
    records_dir: PathBuf,
    config: HostConfig,
    shutdown_token: CancellationToken,
    clock: impl Clock + Clone,
) -> Result<()> {
    info!("Starting host with {config:?}");
    write_message(
        &mut output,
        config.framing,
        &OutgoingMessage::Configure {
            idle_threshold_secs: config.idle_threshold.as_secs(),
        },
    )
    .await?;

    let (sender, receiver) = mpsc::channel::<HostMessage>(32);

    let reader = HostMessageReader::new(
        sender,
        FrameReader::new(input, config.framing),
        shutdown_token.clone(),
    );

    let tracking = create_tracking_module(
        records_dir,
        receiver,
        &shutdown_token,
        config.heartbeat_interval,
        clock,
    )?;

    let (_, reading_result, tracking_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        reader.run(),
        async {
            let result = tracking.run().await;
            // Nothing is left to wait for once tracking stopped.
            shutdown_token.cancel();
            result
        },
    );

    if let Err(reading_result) = &reading_result {
        error!("Reading module got an error {:?}", reading_result);
    }

    if let Err(tracking_result) = &tracking_result {
        error!("Tracking module got an error {:?}", tracking_result);
    }

    reading_result.and(tracking_result)
}

fn create_tracking_module(
    records_dir: PathBuf,
    receiver: mpsc::Receiver<HostMessage>,
    shutdown_token: &CancellationToken,
    heartbeat_interval: Duration,
    clock: impl Clock + Clone,
) -> Result<TrackingModule<JsonDailyStorage>> {
    let storage = JsonDailyStorage::new(records_dir)?;
    let tracker = AttentionTracker::new(storage, TabRegistry::new(), Box::new(clock.clone()));
    Ok(TrackingModule::new(
        receiver,
        tracker,
        shutdown_token.clone(),
        heartbeat_interval,
        Box::new(clock),
    ))
}

#[cfg(test)]
mod host_tests {
    use std::time::Duration;

    use anyhow::Result;
    use chrono::NaiveDate;
    use tempfile::tempdir;
    use tokio::io::{AsyncWriteExt, BufReader, DuplexStream};
    use tokio_util::sync::CancellationToken;

    use crate::{
        host::{
            protocol::MessageFraming,
            run_host,
            storage::daily_storage::{DailyStorage, JsonDailyStorage},
            HostConfig,
        },
        utils::{clock::FixedDayClock, logging::TEST_LOGGING},
    };

    const TEST_DAY: NaiveDate = NaiveDate::from_ymd_opt(2018, 7, 4).unwrap();

    async fn send(browser: &mut DuplexStream, message: &str) -> Result<()> {
        let mut frame = (message.len() as u32).to_ne_bytes().to_vec();
        frame.extend_from_slice(message.as_bytes());
        browser.write_all(&frame).await?;
        Ok(())
    }

    /// Simulates a browser session: snapshot, a few tab switches, a heartbeat and a disconnect.
    #[tokio::test(start_paused = true)]
    async fn smoke_test_host() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let (mut browser, host_input) = tokio::io::duplex(4096);

        let config = HostConfig {
            framing: MessageFraming::Native,
            heartbeat_interval: Duration::from_secs(60),
            ..Default::default()
        };

        let (_, host_result) = tokio::join!(
            async {
                send(
                    &mut browser,
                    r#"{"type":"tabs_snapshot","focused_window_id":1,"tabs":[
                        {"id":1,"window_id":1,"url":"https://a.com","active":true},
                        {"id":2,"window_id":1,"url":"https://b.com","active":false}
                    ]}"#,
                )
                .await?;
                tokio::time::sleep(Duration::from_secs(5)).await;
                send(&mut browser, r#"{"type":"tab_activated","tab_id":2,"window_id":1}"#)
                    .await?;
                tokio::time::sleep(Duration::from_secs(90)).await;
                send(&mut browser, r#"this is not json"#).await?;
                send(&mut browser, r#"{"type":"window_focus_changed","window_id":-1}"#).await?;
                tokio::time::sleep(Duration::from_secs(30)).await;
                drop(browser);
                anyhow::Ok(())
            },
            run_host(
                BufReader::new(host_input),
                tokio::io::sink(),
                dir.path().to_path_buf(),
                config,
                CancellationToken::new(),
                FixedDayClock { day: TEST_DAY },
            ),
        );
        host_result?;

        let storage = JsonDailyStorage::new(dir.path().to_path_buf())?;
        let records = storage.get(&[TEST_DAY]).await?;
        let day = &records[&TEST_DAY];
        assert_eq!(day.get("a.com"), Some(&5_000));
        assert_eq!(day.get("b.com"), Some(&90_000));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_saves_open_segment() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let (mut browser, host_input) = tokio::io::duplex(4096);
        let shutdown = CancellationToken::new();

        let (_, host_result) = tokio::join!(
            async {
                send(
                    &mut browser,
                    r#"{"type":"tabs_snapshot","focused_window_id":1,"tabs":[
                        {"id":1,"window_id":1,"url":"https://a.com","active":true}
                    ]}"#,
                )
                .await?;
                tokio::time::sleep(Duration::from_secs(12)).await;
                shutdown.cancel();
                anyhow::Ok(browser)
            },
            run_host(
                BufReader::new(host_input),
                tokio::io::sink(),
                dir.path().to_path_buf(),
                HostConfig::default(),
                shutdown.clone(),
                FixedDayClock { day: TEST_DAY },
            ),
        );
        host_result?;

        let storage = JsonDailyStorage::new(dir.path().to_path_buf())?;
        let records = storage.get(&[TEST_DAY]).await?;
        assert_eq!(records[&TEST_DAY].get("a.com"), Some(&12_000));
        Ok(())
    }
}
