//! Front-matter date parsing

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

/// Formats that carry no offset; interpreted in the site timezone
const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a front-matter date, keeping any offset written in the text.
///
/// Dates without an offset are placed in `tz`, or UTC when `tz` is `None`.
pub fn parse_date(s: &str, tz: Option<Tz>) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }

    // Jekyll style: 2023-04-02 21:10:00 +0800
    for fmt in ["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M %z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return localize(naive, tz);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return localize(d.and_hms_opt(0, 0, 0)?, tz);
        }
    }

    None
}

/// Resolve a timezone name from the site config; empty means none
pub fn parse_timezone(name: &str) -> Option<Tz> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    match name.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(_) => {
            tracing::warn!("Unknown timezone {:?}, falling back to UTC", name);
            None
        }
    }
}

fn localize(naive: NaiveDateTime, tz: Option<Tz>) -> Option<DateTime<FixedOffset>> {
    match tz {
        Some(tz) => {
            // Ambiguous wall-clock times during DST changes take the earlier instant
            let local = tz.from_local_datetime(&naive).earliest()?;
            Some(local.with_timezone(&local.offset().fix()))
        }
        None => Some(Utc.from_utc_datetime(&naive).fixed_offset()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc3339() {
        let dt = parse_date("2025-01-01T10:00:00+08:00", None).unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 8 * 3600);
        assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), "2025-01-01 10:00");
    }

    #[test]
    fn test_jekyll_offset() {
        let dt = parse_date("2023-04-02 21:10:00 +0800", None).unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 8 * 3600);
        assert_eq!(dt.to_rfc3339(), "2023-04-02T21:10:00+08:00");
    }

    #[test]
    fn test_date_only_is_utc_midnight() {
        let dt = parse_date("2025-01-01", None).unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_naive_in_site_timezone() {
        let tz = parse_timezone("Asia/Shanghai");
        let dt = parse_date("2024-01-15 10:30:00", tz).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-01-15T10:30:00+08:00");
    }

    #[test]
    fn test_unknown_timezone() {
        assert!(parse_timezone("Mars/Olympus").is_none());
        assert!(parse_timezone("").is_none());
    }

    #[test]
    fn test_garbage() {
        assert!(parse_date("last tuesday", None).is_none());
        assert!(parse_date("2025-13-40", None).is_none());
    }
}
