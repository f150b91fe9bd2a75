//! Day boundary helpers.
//!
//! "Today" always means the local calendar day of the bot process.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use mongodb::bson;

/// Start of the calendar day containing `now`, in `now`'s timezone, as UTC.
///
/// When local midnight does not exist (DST gap) the UTC reading of the
/// naive midnight is used instead.
pub fn day_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let midnight = now.date_naive().and_time(NaiveTime::MIN);
    now.timezone()
        .from_local_datetime(&midnight)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Convert a chrono timestamp into a BSON datetime (millisecond precision).
pub fn to_bson<Tz: TimeZone>(dt: &DateTime<Tz>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}
