use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

/// Parse a stored date string. Blank and unparseable values are `None`,
/// never the epoch.
pub fn parse_loose(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_time(NaiveTime::MIN));
        }
    }
    tracing::debug!(value = s, "ignoring unparseable date");
    None
}

pub fn parse_loose_date(raw: &str) -> Option<NaiveDate> {
    parse_loose(raw).map(|dt| dt.date())
}

/// Fractional days from midnight of `today` to `event`.
pub fn days_until(event: NaiveDateTime, today: NaiveDate) -> f64 {
    let midnight = today.and_time(NaiveTime::MIN);
    (event - midnight).num_milliseconds() as f64 / MILLIS_PER_DAY
}

const REFERENCE_YEARS: std::ops::RangeInclusive<i32> = 1900..=9999;

/// Reference date for a request: `YYYY-MM-DD` when given, else the local
/// calendar date. Years outside 1900..=9999 are rejected.
pub fn reference_date(raw: Option<&str>) -> Result<NaiveDate, String> {
    let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(chrono::Local::now().date_naive());
    };
    let d = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("date must be YYYY-MM-DD, got {:?}", s))?;
    if !REFERENCE_YEARS.contains(&d.year()) {
        return Err(format!("date year must be between 1900 and 9999, got {:?}", s));
    }
    Ok(d)
}

pub fn iso_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}
