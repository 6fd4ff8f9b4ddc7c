//! Location validation: freshness, live-state, and containment combined
//! into a single verdict with a typed failure kind.

use crate::geo::WorkingArea;
use crate::location::CurrentLocation;
use crate::types::Timestamp;

/// Why a location failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    NoLocation,
    SharingEnded,
    StaleLocation,
    NotLive,
    OutsideArea,
    BadWorkingArea,
}

impl ValidationErrorKind {
    /// Actionable kinds trigger an automatic clock-out. `NoLocation` and
    /// `BadWorkingArea` are observed but never actioned.
    pub fn is_actionable(self) -> bool {
        matches!(
            self,
            ValidationErrorKind::OutsideArea
                | ValidationErrorKind::NotLive
                | ValidationErrorKind::SharingEnded
                | ValidationErrorKind::StaleLocation
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValidationErrorKind::NoLocation => "NO_LOCATION",
            ValidationErrorKind::SharingEnded => "SHARING_ENDED",
            ValidationErrorKind::StaleLocation => "STALE_LOCATION",
            ValidationErrorKind::NotLive => "NOT_LIVE",
            ValidationErrorKind::OutsideArea => "OUTSIDE_AREA",
            ValidationErrorKind::BadWorkingArea => "BAD_WORKING_AREA",
        }
    }
}

impl std::fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
}

/// Result of validating one employee's current location.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub is_valid: bool,
    pub error: Option<ValidationError>,
    pub accuracy: Option<f64>,
    /// `(longitude, latitude)` of the evaluated reading, when one exists.
    pub coordinates: Option<(f64, f64)>,
    /// Whole minutes since the reading was produced.
    pub location_age_minutes: Option<i64>,
    /// Effective live state (declared live AND not past `live_until`).
    pub is_live: bool,
}

impl Verdict {
    fn valid(location: &CurrentLocation, age_minutes: i64) -> Self {
        Verdict {
            is_valid: true,
            error: None,
            accuracy: location.accuracy,
            coordinates: Some((location.longitude, location.latitude)),
            location_age_minutes: Some(age_minutes),
            is_live: true,
        }
    }

    fn invalid(kind: ValidationErrorKind, message: String) -> Self {
        Verdict {
            is_valid: false,
            error: Some(ValidationError { kind, message }),
            accuracy: None,
            coordinates: None,
            location_age_minutes: None,
            is_live: false,
        }
    }

    fn with_location(mut self, location: &CurrentLocation, age_minutes: i64, is_live: bool) -> Self {
        self.accuracy = location.accuracy;
        self.coordinates = Some((location.longitude, location.latitude));
        self.location_age_minutes = Some(age_minutes);
        self.is_live = is_live;
        self
    }
}

/// Validate a current location against a working area and freshness policy.
///
/// Pure: `now` is passed in by the caller. The decision ladder is ordered;
/// the first matching rule wins.
pub fn validate(
    location: Option<&CurrentLocation>,
    working_area: &str,
    max_age_minutes: i64,
    now: Timestamp,
) -> Verdict {
    let Some(location) = location else {
        return Verdict::invalid(
            ValidationErrorKind::NoLocation,
            "No location data has been received".to_string(),
        );
    };

    if location.ended_at.is_some() {
        return Verdict::invalid(
            ValidationErrorKind::SharingEnded,
            "You have stopped sharing your live location".to_string(),
        )
        .with_location(location, (now - location.updated_at).num_minutes(), false);
    }

    let age_minutes = (now - location.updated_at).num_minutes();
    let is_live = location.is_live && location.live_until.is_none_or(|until| now < until);

    if is_live {
        let area = match WorkingArea::parse(working_area) {
            Ok(area) => area,
            Err(e) => {
                return Verdict::invalid(
                    ValidationErrorKind::BadWorkingArea,
                    format!("Your working area could not be read: {e}"),
                )
                .with_location(location, age_minutes, true);
            }
        };

        if !area.contains(location.longitude, location.latitude) {
            return Verdict::invalid(
                ValidationErrorKind::OutsideArea,
                "You are outside your designated working area".to_string(),
            )
            .with_location(location, age_minutes, true);
        }

        return Verdict::valid(location, age_minutes);
    }

    if age_minutes > max_age_minutes {
        return Verdict::invalid(
            ValidationErrorKind::StaleLocation,
            format!(
                "Your last location update is {age_minutes} minutes old (maximum allowed is {max_age_minutes})"
            ),
        )
        .with_location(location, age_minutes, false);
    }

    Verdict::invalid(
        ValidationErrorKind::NotLive,
        "You are not sharing your live location".to_string(),
    )
    .with_location(location, age_minutes, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationSource;
    use chrono::{Duration, Utc};

    const UNIT_SQUARE: &str = "[[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,1.0]]]";

    fn live_location(longitude: f64, latitude: f64, age: Duration, now: Timestamp) -> CurrentLocation {
        CurrentLocation {
            latitude,
            longitude,
            accuracy: Some(10.0),
            heading: None,
            speed: None,
            source: LocationSource::TelegramLive,
            is_live: true,
            updated_at: now - age,
            live_message_id: "1".into(),
            live_chat_id: "1".into(),
            live_until: None,
            ended_at: None,
        }
    }

    #[test]
    fn no_location_is_not_actionable() {
        let verdict = validate(None, UNIT_SQUARE, 10, Utc::now());
        assert!(!verdict.is_valid);
        let error = verdict.error.unwrap();
        assert_eq!(error.kind, ValidationErrorKind::NoLocation);
        assert!(!error.kind.is_actionable());
    }

    #[test]
    fn ended_session_wins_over_everything_else() {
        let now = Utc::now();
        let mut location = live_location(0.5, 0.5, Duration::minutes(1), now);
        location.ended_at = Some(now);
        // Even though the point is inside the area and fresh, SHARING_ENDED
        // is checked first.
        let verdict = validate(Some(&location), UNIT_SQUARE, 10, now);
        assert_eq!(
            verdict.error.unwrap().kind,
            ValidationErrorKind::SharingEnded
        );
    }

    #[test]
    fn live_inside_area_is_valid() {
        let now = Utc::now();
        let location = live_location(0.5, 0.5, Duration::minutes(2), now);
        let verdict = validate(Some(&location), UNIT_SQUARE, 10, now);
        assert!(verdict.is_valid);
        assert!(verdict.error.is_none());
        assert!(verdict.is_live);
        assert_eq!(verdict.location_age_minutes, Some(2));
    }

    #[test]
    fn live_outside_area_is_outside_area() {
        let now = Utc::now();
        let location = live_location(1.5, 0.5, Duration::minutes(2), now);
        let verdict = validate(Some(&location), UNIT_SQUARE, 10, now);
        let error = verdict.error.unwrap();
        assert_eq!(error.kind, ValidationErrorKind::OutsideArea);
        assert!(error.kind.is_actionable());
        assert_eq!(verdict.coordinates, Some((1.5, 0.5)));
    }

    #[test]
    fn expired_live_until_downgrades_to_non_live() {
        let now = Utc::now();
        let mut location = live_location(0.5, 0.5, Duration::minutes(2), now);
        location.live_until = Some(now - Duration::minutes(1));
        let verdict = validate(Some(&location), UNIT_SQUARE, 10, now);
        // Fresh but no longer effectively live.
        assert_eq!(verdict.error.unwrap().kind, ValidationErrorKind::NotLive);
        assert!(!verdict.is_live);
    }

    #[test]
    fn stale_non_live_is_stale_location() {
        let now = Utc::now();
        let mut location = live_location(0.5, 0.5, Duration::minutes(45), now);
        location.is_live = false;
        let verdict = validate(Some(&location), UNIT_SQUARE, 10, now);
        let error = verdict.error.unwrap();
        assert_eq!(error.kind, ValidationErrorKind::StaleLocation);
        assert!(error.message.contains("45"));
    }

    #[test]
    fn fresh_non_live_is_not_live() {
        let now = Utc::now();
        let mut location = live_location(0.5, 0.5, Duration::minutes(3), now);
        location.is_live = false;
        let verdict = validate(Some(&location), UNIT_SQUARE, 10, now);
        assert_eq!(verdict.error.unwrap().kind, ValidationErrorKind::NotLive);
        assert_eq!(verdict.coordinates, Some((0.5, 0.5)));
    }

    #[test]
    fn bad_working_area_retains_coordinates() {
        let now = Utc::now();
        let location = live_location(0.5, 0.5, Duration::minutes(1), now);
        let verdict = validate(Some(&location), "garbage", 10, now);
        let error = verdict.error.unwrap();
        assert_eq!(error.kind, ValidationErrorKind::BadWorkingArea);
        assert!(!error.kind.is_actionable());
        assert_eq!(verdict.coordinates, Some((0.5, 0.5)));
    }

    #[test]
    fn validity_matches_error_absence() {
        let now = Utc::now();
        let inside = live_location(0.5, 0.5, Duration::minutes(1), now);
        let outside = live_location(9.0, 9.0, Duration::minutes(1), now);
        for location in [None, Some(&inside), Some(&outside)] {
            let verdict = validate(location, UNIT_SQUARE, 10, now);
            assert_eq!(verdict.is_valid, verdict.error.is_none());
        }
    }

    #[test]
    fn actionable_partition_is_exact() {
        use ValidationErrorKind::*;
        for kind in [OutsideArea, NotLive, SharingEnded, StaleLocation] {
            assert!(kind.is_actionable(), "{kind} should be actionable");
        }
        for kind in [NoLocation, BadWorkingArea] {
            assert!(!kind.is_actionable(), "{kind} should not be actionable");
        }
    }
}
