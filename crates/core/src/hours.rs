use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Opening window for one weekday. Half-open: open inclusive, close exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl DayWindow {
    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.open && time < self.close
    }
}

/// Weekly business-hours table. `None` means closed that day.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekSchedule {
    pub monday: Option<DayWindow>,
    pub tuesday: Option<DayWindow>,
    pub wednesday: Option<DayWindow>,
    pub thursday: Option<DayWindow>,
    pub friday: Option<DayWindow>,
    pub saturday: Option<DayWindow>,
    pub sunday: Option<DayWindow>,
}

impl WeekSchedule {
    pub fn window_for(&self, weekday: Weekday) -> Option<DayWindow> {
        match weekday {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }

    pub fn is_within(&self, now: NaiveDateTime) -> bool {
        self.window_for(now.weekday())
            .map(|window| window.contains(now.time()))
            .unwrap_or(false)
    }

    /// Renders the hours table for prompts and the closed reply. One line per
    /// day, `HH:MM - HH:MM` or `closed`.
    pub fn render(&self) -> String {
        DAY_LABELS
            .iter()
            .map(|(weekday, label)| match self.window_for(*weekday) {
                Some(window) => format!(
                    "{label}: {} - {}",
                    window.open.format("%H:%M"),
                    window.close.format("%H:%M")
                ),
                None => format!("{label}: closed"),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

const DAY_LABELS: [(Weekday, &str); 7] = [
    (Weekday::Mon, "Monday"),
    (Weekday::Tue, "Tuesday"),
    (Weekday::Wed, "Wednesday"),
    (Weekday::Thu, "Thursday"),
    (Weekday::Fri, "Friday"),
    (Weekday::Sat, "Saturday"),
    (Weekday::Sun, "Sunday"),
];

/// The canned reply sent when `business_hours_only` is set and the message
/// arrives outside the window. Rendered from the same table the gate checks,
/// so the customer never sees hours the gate disagrees with.
pub fn render_closed_reply(workshop_name: &str, schedule: &WeekSchedule) -> String {
    format!(
        "Thanks for contacting {workshop_name}! We are currently closed. \
         Our business hours are:\n{}\nLeave us a message and we will reply \
         as soon as we open.",
        schedule.render()
    )
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::{render_closed_reply, DayWindow, WeekSchedule};

    fn window(open: (u32, u32), close: (u32, u32)) -> DayWindow {
        DayWindow {
            open: NaiveTime::from_hms_opt(open.0, open.1, 0).unwrap(),
            close: NaiveTime::from_hms_opt(close.0, close.1, 0).unwrap(),
        }
    }

    fn weekday_schedule() -> WeekSchedule {
        WeekSchedule {
            monday: Some(window((9, 0), (18, 0))),
            tuesday: Some(window((9, 0), (18, 0))),
            wednesday: Some(window((9, 0), (18, 0))),
            thursday: Some(window((9, 0), (18, 0))),
            friday: Some(window((9, 0), (18, 0))),
            saturday: Some(window((10, 0), (14, 0))),
            sunday: None,
        }
    }

    #[test]
    fn within_hours_on_open_weekday() {
        let schedule = weekday_schedule();
        // 2026-08-24 is a Monday.
        let monday_noon =
            NaiveDate::from_ymd_opt(2026, 8, 24).unwrap().and_hms_opt(12, 0, 0).unwrap();
        assert!(schedule.is_within(monday_noon));
    }

    #[test]
    fn closed_day_is_outside_hours() {
        let schedule = weekday_schedule();
        let sunday_noon =
            NaiveDate::from_ymd_opt(2026, 8, 23).unwrap().and_hms_opt(12, 0, 0).unwrap();
        assert!(!schedule.is_within(sunday_noon));
    }

    #[test]
    fn window_is_half_open() {
        let schedule = weekday_schedule();
        let monday = NaiveDate::from_ymd_opt(2026, 8, 24).unwrap();
        assert!(schedule.is_within(monday.and_hms_opt(9, 0, 0).unwrap()));
        assert!(!schedule.is_within(monday.and_hms_opt(18, 0, 0).unwrap()));
    }

    #[test]
    fn closed_reply_lists_every_day() {
        let reply = render_closed_reply("Taller Demo", &weekday_schedule());
        assert!(reply.contains("Taller Demo"));
        assert!(reply.contains("Monday: 09:00 - 18:00"));
        assert!(reply.contains("Sunday: closed"));
    }
}
