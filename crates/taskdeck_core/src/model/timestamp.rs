//! ISO 8601 timestamp helpers for task records.
//!
//! Timestamps are truncated to millisecond precision when produced so that
//! the `...sss Z` wire form round-trips exactly.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use mockable::Clock;
use serde::{Deserialize, Deserializer, Serializer};

/// Returns the current UTC time from `clock`, truncated to milliseconds.
pub fn now_millis(clock: &dyn Clock) -> DateTime<Utc> {
    clock.utc().trunc_subsecs(3)
}

/// Formats a timestamp as `YYYY-MM-DDTHH:MM:SS.sssZ`.
pub fn format_iso8601(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses any RFC 3339 timestamp into UTC.
pub fn parse_iso8601(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value.trim()).map(|parsed| parsed.with_timezone(&Utc))
}

pub(crate) fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_iso8601(value))
}

pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_iso8601(&raw).map_err(|err| {
        serde::de::Error::custom(format!("invalid ISO 8601 timestamp `{raw}`: {err}"))
    })
}

pub(crate) mod option {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(crate) fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => super::serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => super::parse_iso8601(&raw).map(Some).map_err(|err| {
                serde::de::Error::custom(format!("invalid ISO 8601 timestamp `{raw}`: {err}"))
            }),
            None => Ok(None),
        }
    }
}
