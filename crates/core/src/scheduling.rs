use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::hours::DayWindow;

/// An occupied window on a tenant's calendar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedSlot {
    pub start: NaiveDateTime,
    pub duration_minutes: u32,
}

impl BookedSlot {
    fn end(&self) -> NaiveDateTime {
        self.start + Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// Half-open interval overlap: `[start, end)` conflicts with an existing
/// `[booked_start, booked_end)` iff `start < booked_end && end > booked_start`.
/// Back-to-back appointments therefore do not conflict.
pub fn overlaps(start: NaiveDateTime, duration_minutes: u32, booked: &BookedSlot) -> bool {
    let end = start + Duration::minutes(i64::from(duration_minutes));
    start < booked.end() && end > booked.start
}

pub fn conflicts_with_any(
    start: NaiveDateTime,
    duration_minutes: u32,
    booked: &[BookedSlot],
) -> bool {
    booked.iter().any(|slot| overlaps(start, duration_minutes, slot))
}

/// Walks the business-hours window in `slot_minutes` steps and keeps every
/// start time whose full slot fits the window and passes the conflict
/// predicate. Slot listing and direct conflict checks share `overlaps`, so
/// they cannot diverge.
pub fn free_slots(
    date: NaiveDate,
    window: &DayWindow,
    slot_minutes: u32,
    booked: &[BookedSlot],
) -> Vec<NaiveTime> {
    if slot_minutes == 0 {
        return Vec::new();
    }

    let step = Duration::minutes(i64::from(slot_minutes));
    let mut slots = Vec::new();
    let mut cursor = date.and_time(window.open);
    let day_end = date.and_time(window.close);

    while cursor + step <= day_end {
        if !conflicts_with_any(cursor, slot_minutes, booked) {
            slots.push(cursor.time());
        }
        cursor += step;
    }

    slots
}
