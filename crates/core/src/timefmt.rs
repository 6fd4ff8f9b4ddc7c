//! Timezone-aware rendering of user-visible hours.

use chrono_tz::Tz;

use crate::types::Timestamp;

/// Zone applied when an employee has no (or an unparseable) timezone.
pub const DEFAULT_TZ: Tz = chrono_tz::Africa::Nairobi;

/// Resolve an optional IANA zone name, falling back to [`DEFAULT_TZ`].
pub fn resolve_timezone(name: Option<&str>) -> Tz {
    name.and_then(|name| name.parse::<Tz>().ok())
        .unwrap_or(DEFAULT_TZ)
}

/// Render a UTC instant as a localized `h:mm AM/PM` string.
pub fn format_hour(timestamp: Timestamp, tz: Tz) -> String {
    timestamp.with_timezone(&tz).format("%-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn formats_in_nairobi_time() {
        // 12:05 UTC is 15:05 in Nairobi (UTC+3, no DST).
        let instant = Utc.with_ymd_and_hms(2026, 8, 2, 12, 5, 0).unwrap();
        assert_eq!(format_hour(instant, DEFAULT_TZ), "3:05 PM");
    }

    #[test]
    fn formats_morning_without_zero_padding() {
        let instant = Utc.with_ymd_and_hms(2026, 8, 2, 6, 30, 0).unwrap();
        assert_eq!(format_hour(instant, DEFAULT_TZ), "9:30 AM");
    }

    #[test]
    fn resolve_falls_back_to_default() {
        assert_eq!(resolve_timezone(None), DEFAULT_TZ);
        assert_eq!(resolve_timezone(Some("Not/AZone")), DEFAULT_TZ);
        assert_eq!(
            resolve_timezone(Some("Europe/Berlin")),
            chrono_tz::Europe::Berlin
        );
    }
}
