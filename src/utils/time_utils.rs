use chrono::{Local, TimeZone, SecondsFormat, Utc};

// Comments carry an ISO 8601 timestamp in the API,
// chrono formatting reference:
// https://docs.rs/chrono/0.4.19/chrono/format/strftime/index.html
const DATE_FORMAT_DISPLAY: &'static str = "%A, %B %-d, %Y";

pub fn current_timestamp() -> i64 {
  Local::now().timestamp()
}

// Returns an empty string for timestamps chrono
// considers out of range, should never happen.
pub fn timestamp_to_iso_string(timestamp: i64) -> String {
  match Utc.timestamp_opt(timestamp, 0).single() {
    Some(d) => d.to_rfc3339_opts(SecondsFormat::Secs, true),
    None => String::new()
  }
}

// The date shown in the page header, looks
// like "Monday, March 8, 2021".
pub fn display_date(timestamp: i64) -> String {
  match Local.timestamp_opt(timestamp, 0).single() {
    Some(d) => d.format(DATE_FORMAT_DISPLAY).to_string(),
    None => String::new()
  }
}
