//! Date normalization between the edit model and the backend wire shapes
//!
//! The backend uses two date shapes: date-only (`YYYY-MM-DD`) for trade,
//! start, maturity, execution and validity dates, and date-time
//! (`YYYY-MM-DDTHH:MM:SS`) for timestamps. Responses are not always
//! consistent about which shape they return, so parsing tolerates both.
//! All functions here are pure.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::{Error, Result};

const DATE_FMT: &str = "%Y-%m-%d";
const DATE_TIME_FMT: &str = "%Y-%m-%dT%H:%M:%S";
// Some callers send minute precision; accept it on the way in.
const DATE_TIME_MINUTES_FMT: &str = "%Y-%m-%dT%H:%M";

/// Render a date-only field for the backend (`YYYY-MM-DD`).
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

/// Render a date-time field for the backend (`YYYY-MM-DDTHH:MM:SS`).
pub fn format_date_time(ts: NaiveDateTime) -> String {
    ts.format(DATE_TIME_FMT).to_string()
}

/// Promote a date-only value to a timestamp at midnight.
pub fn date_time_from_date(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Parse a backend date in either shape, keeping only the date part.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let date_part = raw.split('T').next().unwrap_or(raw).trim();
    NaiveDate::parse_from_str(date_part, DATE_FMT)
        .map_err(|e| Error::Internal(format!("unparseable date {:?}: {}", raw, e)))
}

/// Parse a backend date-time; a date-only value parses to midnight and a
/// missing seconds component defaults to zero.
pub fn parse_date_time(raw: &str) -> Result<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.contains('T') {
        NaiveDateTime::parse_from_str(trimmed, DATE_TIME_FMT)
            .or_else(|_| NaiveDateTime::parse_from_str(trimmed, DATE_TIME_MINUTES_FMT))
            .map_err(|e| Error::Internal(format!("unparseable timestamp {:?}: {}", raw, e)))
    } else {
        parse_date(trimmed).map(date_time_from_date)
    }
}

/// Today's date (UTC)
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// One year from today, the default maturity for a draft trade.
pub fn one_year_from_today() -> NaiveDate {
    let now = today();
    now.with_year(now.year() + 1)
        // Feb 29 in a non-leap target year
        .unwrap_or_else(|| now + Days::new(365))
}

/// Serde adapter for `Option<NaiveDate>` fields: serializes `YYYY-MM-DD`,
/// deserializes either backend shape.
pub mod serde_date_opt {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDate>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match value {
            Some(date) => serializer.serialize_str(&format_date(*date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse_date(&s).map(Some).map_err(serde::de::Error::custom),
        }
    }
}

/// Serde adapter for `Option<NaiveDateTime>` fields: serializes
/// `YYYY-MM-DDTHH:MM:SS`, deserializes either backend shape.
pub mod serde_date_time_opt {
    use super::*;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&format_date_time(*ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<NaiveDateTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse_date_time(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
