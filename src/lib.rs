//! Tracks which website holds your attention and how long, straight from the browser.
//! A native messaging host receives tab, focus and idle events from a tiny browser extension and
//! accumulates time per domain into daily records. The cli shows the collected statistics in a
//! terminal.
//!

pub mod browser_api;
pub mod cli;
pub mod host;
pub mod utils;
