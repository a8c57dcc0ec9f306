use chrono::Weekday;

use crate::config::{ShiftConfig, WeekendRewrite};
use crate::model::{ShiftClass, StaffRecord};

/// Rule-based shift classification.
///
/// Order of rules:
/// 1. A weekday-named on-call label worked on Saturday/Sunday is renamed to
///    its weekend label (billing does not distinguish the two).
/// 2. A label containing a weekend on-call marker → `OnCallWeekend`.
/// 3. A label containing the on-call marker → `OnCallWeekday`.
/// 4. Everything else → `Regular`.
#[derive(Debug, Clone)]
pub struct ShiftClassifier {
    on_call_marker: String,
    weekend_markers: Vec<String>,
    weekend_rewrites: Vec<WeekendRewrite>,
}

impl ShiftClassifier {
    pub fn from_config(config: &ShiftConfig) -> Self {
        Self {
            on_call_marker: config.on_call_marker.clone(),
            weekend_markers: config.weekend_call_markers.clone(),
            weekend_rewrites: config.weekend_rewrites.clone(),
        }
    }

    /// Class of a label as written, ignoring the calendar.
    pub fn class_of(&self, shift: &str) -> ShiftClass {
        if self.weekend_markers.iter().any(|m| shift.contains(m.as_str())) {
            ShiftClass::OnCallWeekend
        } else if shift.contains(self.on_call_marker.as_str()) {
            ShiftClass::OnCallWeekday
        } else {
            ShiftClass::Regular
        }
    }

    /// Returns a new record with the (possibly renamed) shift and its class.
    /// Depends only on the record's own date, so it must run before any
    /// filtering or joining.
    pub fn classify(&self, record: StaffRecord) -> StaffRecord {
        let weekend = matches!(record.day_of_week, Weekday::Sat | Weekday::Sun);
        let shift = if weekend {
            self.weekend_rewrites
                .iter()
                .find(|r| r.shift == record.shift)
                .map(|r| r.weekend_label.clone())
                .unwrap_or(record.shift)
        } else {
            record.shift
        };
        let class = self.class_of(&shift);

        StaffRecord {
            shift,
            class,
            ..record
        }
    }
}
