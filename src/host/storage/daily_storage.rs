use std::{
    future::Future,
    io::ErrorKind,
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::NaiveDate;
use fs4::tokio::AsyncFileExt;
use futures::future::try_join_all;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::{debug, warn};

use crate::utils::time::{date_key, parse_date_key};

use super::entities::{DailyRecords, DomainDurations};

const RECORD_EXTENSION: &str = "json";

/// Key-value interface over daily records. Keys are days, values are per domain durations.
/// A missing day is simply absent from the returned records.
pub trait DailyStorage {
    /// Retrieves records for the requested days.
    fn get(&self, keys: &[NaiveDate]) -> impl Future<Output = Result<DailyRecords>> + Send;

    /// Overwrites records of the days present in `records`. Other days are left untouched.
    fn set(&self, records: DailyRecords) -> impl Future<Output = Result<()>> + Send;

    /// Removes every record.
    fn clear(&self) -> impl Future<Output = Result<()>> + Send;
}

impl<T: Deref> DailyStorage for T
where
    T::Target: DailyStorage,
{
    fn get(&self, keys: &[NaiveDate]) -> impl Future<Output = Result<DailyRecords>> + Send {
        self.deref().get(keys)
    }

    fn set(&self, records: DailyRecords) -> impl Future<Output = Result<()>> + Send {
        self.deref().set(records)
    }

    fn clear(&self) -> impl Future<Output = Result<()>> + Send {
        self.deref().clear()
    }
}

/// The main realization of [DailyStorage]. Stores every day as a json object in its own file.
pub struct JsonDailyStorage {
    record_dir: PathBuf,
}

impl JsonDailyStorage {
    pub fn new(record_dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&record_dir)?;

        Ok(Self { record_dir })
    }

    fn record_path(&self, date: NaiveDate) -> PathBuf {
        self.record_dir
            .join(format!("{}.{RECORD_EXTENSION}", date_key(date)))
    }

    async fn read_record(path: &Path) -> Result<Option<DomainDurations>> {
        async fn extract(path: &Path) -> std::result::Result<String, std::io::Error> {
            debug!("Extracting {path:?}");
            let mut file = File::open(path).await?;
            file.lock_shared()?;
            let mut content = String::new();
            let read = file.read_to_string(&mut content).await;
            file.unlock_async().await?;
            read?;
            Ok(content)
        }

        let content = match extract(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => Err(e)?,
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        match serde_json::from_str::<DomainDurations>(&content) {
            Ok(durations) => Ok(Some(durations)),
            Err(e) => {
                // A broken file shouldn't make every other day unreadable.
                warn!("Record {path:?} contains illegal json: {e}");
                Ok(None)
            }
        }
    }

    async fn write_record(path: &Path, durations: &DomainDurations) -> Result<()> {
        let buffer = serde_json::to_vec(durations)?;

        let mut file = File::options()
            .write(true)
            .create(true)
            .read(true)
            .truncate(false)
            .open(path)
            .await?;

        // Truncating only after the lock is held, so readers never observe a half written file.
        file.lock_exclusive()?;
        let result = async {
            file.set_len(0).await?;
            file.rewind().await?;
            file.write_all(&buffer).await?;
            file.flush().await?;
            file.sync_data().await
        }
        .await;
        file.unlock_async().await?;
        result?;
        Ok(())
    }
}

impl DailyStorage for JsonDailyStorage {
    async fn get(&self, keys: &[NaiveDate]) -> Result<DailyRecords> {
        let reads = keys.iter().map(|date| {
            let path = self.record_path(*date);
            async move { Ok::<_, anyhow::Error>((*date, Self::read_record(&path).await?)) }
        });

        Ok(try_join_all(reads)
            .await?
            .into_iter()
            .filter_map(|(date, durations)| durations.map(|d| (date, d)))
            .collect())
    }

    async fn set(&self, records: DailyRecords) -> Result<()> {
        for (date, durations) in records {
            Self::write_record(&self.record_path(date), &durations).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut entries = tokio::fs::read_dir(&self.record_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_record = path.extension().is_some_and(|e| e == RECORD_EXTENSION)
                && path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .and_then(parse_date_key)
                    .is_some();
            if !is_record {
                continue;
            }
            debug!("Removing {path:?}");
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => Err(e)?,
            }
        }
        Ok(())
    }
}
