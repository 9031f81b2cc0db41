use an_core::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::warn;

/// Parses `raw` with a strftime-style `format`.
///
/// Formats with an offset, naive date-times (taken as UTC) and date-only formats (midnight UTC)
/// are accepted. RFC 3339 is tried last since `datetime` attributes usually carry it.
pub fn try_parse_date(raw: &str, format: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    let error = || Error::DateParse {
        raw: raw.to_string(),
        format: format.to_string(),
    };
    if raw.is_empty() {
        return Err(error());
    }

    if let Ok(dt) = DateTime::parse_from_str(raw, format) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&midnight));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    Err(error())
}

/// Like [`try_parse_date`], but a missing or malformed date becomes the current time.
pub fn parse_date(raw: &str, format: &str) -> DateTime<Utc> {
    match try_parse_date(raw, format) {
        Ok(date) => date,
        Err(e) => {
            warn!(error = %e, "using fetch time as publication date");
            Utc::now()
        }
    }
}
