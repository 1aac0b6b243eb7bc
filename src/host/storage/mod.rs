//!  Storage is organized through [daily_storage::JsonDailyStorage].
//!  The basic idea is:
//!   - There is a directory with all the records.
//!   - Each local calendar day has its own record file, named by its date key.
//!   - A record file maps a domain to the milliseconds it was actively viewed that day.

pub mod daily_storage;
pub mod entities;
