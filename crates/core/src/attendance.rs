//! Attendance documents: one per `(uid, year, month)`, with per-day
//! entries in a `values` array indexed by day-of-month minus one.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::Timestamp;

pub const STATUS_NA: &str = "N/A";
pub const STATUS_SUBMITTED: &str = "Submitted";

/// Daily classification codes.
pub const VALUE_PRESENT: &str = "P";
pub const VALUE_HALF_PRESENT: &str = "H";
pub const VALUE_ABSENT: &str = "A";

pub const ENTRY_CLOCK_IN: &str = "Clock In";
pub const ENTRY_CLOCK_OUT: &str = "Clock Out";

/// English month names; attendance documents are keyed by these.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Name for a 1-based month number. Out-of-range input maps to January
/// rather than panicking; callers pass `chrono` month numbers.
pub fn month_name(month: u32) -> &'static str {
    MONTH_NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or(MONTH_NAMES[0])
}

/// One clock-in or clock-out event inside a day. Insertion order is
/// monotonic in `timestamp` by construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkedHoursEntry {
    pub id: String,
    pub timestamp: Timestamp,
    #[serde(rename = "type")]
    pub entry_type: String,
    /// Localized `h:mm AM/PM` rendering of `timestamp`.
    pub hour: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAttendance {
    pub id: String,
    /// 1-based day of month.
    pub day: u32,
    /// Classification code (`P`/`H`/`A`) or `None` when not yet classified.
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub daily_worked_hours: f64,
    #[serde(default)]
    pub worked_hours: Vec<WorkedHoursEntry>,
}

fn default_status() -> String {
    STATUS_NA.to_string()
}

impl DailyAttendance {
    /// A fresh, empty day entry for the given 1-based day.
    pub fn empty(day: u32) -> Self {
        DailyAttendance {
            id: uuid::Uuid::new_v4().to_string(),
            day,
            value: None,
            timestamp: None,
            from: None,
            to: None,
            status: STATUS_NA.to_string(),
            daily_worked_hours: 0.0,
            worked_hours: Vec::new(),
        }
    }
}

/// The per-day entries of an attendance document.
///
/// The store may have serialized this as a dense JSON array or as a
/// sparse object with numeric string keys. Deserialization normalizes
/// both shapes to a dense `day - 1`-indexed vector, and serialization
/// always writes the dense array back, preserving indices.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct AttendanceValues(Vec<Option<DailyAttendance>>);

impl AttendanceValues {
    pub fn new(days: Vec<Option<DailyAttendance>>) -> Self {
        AttendanceValues(days)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, day_index: usize) -> Option<&DailyAttendance> {
        self.0.get(day_index).and_then(|day| day.as_ref())
    }

    /// The day entry at `day_index`, created empty (and the vector grown)
    /// if absent.
    pub fn get_or_create(&mut self, day_index: usize) -> &mut DailyAttendance {
        if self.0.len() <= day_index {
            self.0.resize_with(day_index + 1, || None);
        }
        self.0[day_index].get_or_insert_with(|| DailyAttendance::empty(day_index as u32 + 1))
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&DailyAttendance>> {
        self.0.iter().map(|day| day.as_ref())
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(AttendanceValues::default()),
            Value::Array(items) => {
                let days = items
                    .into_iter()
                    .map(|item| match item {
                        Value::Null => Ok(None),
                        other => serde_json::from_value::<DailyAttendance>(other)
                            .map(Some)
                            .map_err(|e| e.to_string()),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(AttendanceValues(days))
            }
            Value::Object(map) => {
                let mut entries = Vec::with_capacity(map.len());
                for (key, item) in map {
                    let index: usize = key
                        .parse()
                        .map_err(|_| format!("non-numeric values key '{key}'"))?;
                    let day = serde_json::from_value::<DailyAttendance>(item)
                        .map_err(|e| e.to_string())?;
                    entries.push((index, day));
                }
                let len = entries.iter().map(|(index, _)| index + 1).max().unwrap_or(0);
                let mut days: Vec<Option<DailyAttendance>> = Vec::new();
                days.resize_with(len, || None);
                for (index, day) in entries {
                    days[index] = Some(day);
                }
                Ok(AttendanceValues(days))
            }
            other => Err(format!(
                "values must be an array or a numeric-keyed object, got {other}"
            )),
        }
    }
}

impl<'de> Deserialize<'de> for AttendanceValues {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        AttendanceValues::from_value(value).map_err(D::Error::custom)
    }
}

/// A monthly attendance document, keyed by `(uid, year, month)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceDoc {
    /// Document key.
    pub id: String,
    pub uid: String,
    pub year: i32,
    /// English month name, e.g. `September`.
    pub month: String,
    #[serde(default)]
    pub monthly_worked_hours: f64,
    /// Non-null iff the employee is currently clocked in.
    #[serde(default)]
    pub last_clock_in_timestamp: Option<Timestamp>,
    #[serde(default)]
    pub last_changed: Option<Timestamp>,
    #[serde(default)]
    pub values: AttendanceValues,
}
