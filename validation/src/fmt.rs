//! Date rendering and parsing helpers.
//!
//! Instants are carried as [`std::time::SystemTime`] throughout the
//! crate; conversion to and from calendar form only happens here, at
//! the boundaries: trace attributes, log events, and policy documents.

use std::time::SystemTime;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};

use crate::Error;
use crate::Result;

/// Renders `t` as an RFC 3339 timestamp in UTC.
pub fn date(t: SystemTime) -> String {
    DateTime::<Utc>::from(t).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parses a `YYYY-MM-DD` date as midnight UTC.
pub fn parse_date(s: &str) -> Result<SystemTime> {
    let day = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| Error::InvalidArgument(
            format!("bad date {:?}: {}", s, e)))?;
    Ok(day.and_time(NaiveTime::MIN).and_utc().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frozen_time;

    #[test]
    fn render() {
        assert_eq!(date(frozen_time()), "2020-06-01T00:00:00Z");
    }

    #[test]
    fn parse() {
        assert_eq!(parse_date("2020-06-01").unwrap(), frozen_time());
        assert!(parse_date("01/06/2020").is_err());
        assert!(parse_date("2020-13-01").is_err());
    }
}
