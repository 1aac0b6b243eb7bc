use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Utc};
use tokio::time::Instant;

/// Represents an entity responsible for providing dates across application. This can allow it to
/// be used for testing
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;

    /// Monotonic point in time. Segment durations are measured with it, so wall clock jumps don't
    /// produce negative or inflated usage.
    fn instant(&self) -> Instant;

    /// Calendar day in the local timezone. Records are bucketed by it.
    fn today(&self) -> NaiveDate {
        self.time().with_timezone(&Local).date_naive()
    }

    async fn sleep_until(&self, instant: tokio::time::Instant);
}

#[derive(Clone)]
pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&self, instant: tokio::time::Instant) {
        tokio::time::sleep_until(instant).await;
    }
}

/// Clock frozen on a single calendar day. Monotonic time still comes from tokio, so tests can
/// pause and advance it.
#[cfg(test)]
#[derive(Clone)]
pub struct FixedDayClock {
    pub day: NaiveDate,
}

#[cfg(test)]
#[async_trait]
impl Clock for FixedDayClock {
    fn time(&self) -> DateTime<Utc> {
        self.day
            .and_time(chrono::NaiveTime::from_hms_opt(12, 0, 0).unwrap())
            .and_utc()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    fn today(&self) -> NaiveDate {
        self.day
    }

    async fn sleep_until(&self, instant: tokio::time::Instant) {
        tokio::time::sleep_until(instant).await;
    }
}

/// Like [FixedDayClock], but the day can be moved forward while a test runs.
#[cfg(test)]
#[derive(Clone)]
pub struct MovableDayClock {
    day: std::sync::Arc<std::sync::Mutex<NaiveDate>>,
}

#[cfg(test)]
impl MovableDayClock {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day: std::sync::Arc::new(std::sync::Mutex::new(day)),
        }
    }

    pub fn set_day(&self, day: NaiveDate) {
        *self.day.lock().unwrap() = day;
    }
}

#[cfg(test)]
#[async_trait]
impl Clock for MovableDayClock {
    fn time(&self) -> DateTime<Utc> {
        self.today()
            .and_time(chrono::NaiveTime::from_hms_opt(12, 0, 0).unwrap())
            .and_utc()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    fn today(&self) -> NaiveDate {
        *self.day.lock().unwrap()
    }

    async fn sleep_until(&self, instant: tokio::time::Instant) {
        tokio::time::sleep_until(instant).await;
    }
}
