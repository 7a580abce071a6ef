use std::fmt;

use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;

use super::timetable::{TIME_SLOTS, TimeSlot, Timetable, Weekday, time_slot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClassStatus {
    Free,
    InClass { period: u8, subject: String },
}

impl ClassStatus {
    pub fn is_in_class(&self) -> bool {
        matches!(self, ClassStatus::InClass { .. })
    }

    pub fn subject(&self) -> Option<&str> {
        match self {
            ClassStatus::InClass { subject, .. } => Some(subject),
            ClassStatus::Free => None,
        }
    }
}

impl fmt::Display for ClassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassStatus::Free => f.write_str("空き時間"),
            ClassStatus::InClass { period, subject } => {
                let name = time_slot(*period).map(|s| s.display_name).unwrap_or("?");
                write!(f, "授業中 ({}: {})", name, subject)
            }
        }
    }
}

pub fn resolve_status(now: NaiveDateTime, schedule: &Timetable) -> ClassStatus {
    resolve_status_with(now, schedule, &TIME_SLOTS)
}

/// First slot whose window holds `now` (minute precision, both bounds
/// inclusive) decides the result; later slots are not consulted.
pub fn resolve_status_with(
    now: NaiveDateTime,
    schedule: &Timetable,
    slots: &[TimeSlot],
) -> ClassStatus {
    let Some(today) = Weekday::from_chrono(now.weekday()) else {
        return ClassStatus::Free;
    };
    let hhmm = now.format("%H:%M").to_string();

    match slots.iter().find(|slot| slot.contains(&hhmm)) {
        Some(slot) => match schedule.get(today, slot.period) {
            Some(entry) => ClassStatus::InClass {
                period: slot.period,
                subject: entry.subject.clone(),
            },
            None => ClassStatus::Free,
        },
        None => ClassStatus::Free,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::timetable::ClassForm;

    // 2024-01-01 は月曜日
    fn at(day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .expect("valid datetime")
    }

    fn monday_first_period() -> Timetable {
        let mut t = Timetable::new();
        t.insert(Weekday::Monday, 1, ClassForm::new("数学").to_entry(None));
        t
    }

    #[test]
    fn weekend_is_always_free() {
        let mut full = Timetable::new();
        for day in Weekday::ALL {
            for slot in TIME_SLOTS {
                full.insert(day, slot.period, ClassForm::new("授業").to_entry(None));
            }
        }
        // 1/6 土曜, 1/7 日曜
        for day in [6, 7] {
            for h in 0..24 {
                assert_eq!(resolve_status(at(day, h, 0, 0), &full), ClassStatus::Free);
                assert_eq!(resolve_status(at(day, h, 30, 0), &full), ClassStatus::Free);
            }
        }
    }

    #[test]
    fn whole_first_period_window_is_in_class() {
        let schedule = monday_first_period();
        let mut minutes = 8 * 60 + 45;
        while minutes <= 10 * 60 + 15 {
            let status = resolve_status(at(1, minutes / 60, minutes % 60, 0), &schedule);
            assert_eq!(
                status,
                ClassStatus::InClass { period: 1, subject: "数学".to_string() },
                "at minute {}",
                minutes
            );
            minutes += 1;
        }
    }

    #[test]
    fn end_minute_is_inclusive_then_free() {
        let schedule = monday_first_period();
        assert!(resolve_status(at(1, 10, 15, 59), &schedule).is_in_class());
        assert_eq!(resolve_status(at(1, 10, 16, 0), &schedule), ClassStatus::Free);
        assert_eq!(resolve_status(at(1, 8, 44, 59), &schedule), ClassStatus::Free);
    }

    #[test]
    fn empty_cell_in_matching_slot_is_free() {
        let schedule = monday_first_period();
        assert_eq!(resolve_status(at(1, 11, 0, 0), &schedule), ClassStatus::Free);
        assert_eq!(resolve_status(at(2, 9, 0, 0), &schedule), ClassStatus::Free);
    }

    #[test]
    fn touching_custom_slots_pick_the_first() {
        let slots = [
            TimeSlot { period: 1, start: "09:00", end: "10:00", display_name: "1限" },
            TimeSlot { period: 2, start: "10:00", end: "11:00", display_name: "2限" },
        ];
        let mut schedule = Timetable::new();
        schedule.insert(Weekday::Monday, 2, ClassForm::new("物理学").to_entry(None));

        // 10:00 は 1限 の終端にも含まれるので 1限 で判定が止まる
        assert_eq!(resolve_status_with(at(1, 10, 0, 0), &schedule, &slots), ClassStatus::Free);
        assert!(resolve_status_with(at(1, 10, 1, 0), &schedule, &slots).is_in_class());
    }

    #[test]
    fn labels_match_dashboard() {
        let status = ClassStatus::InClass { period: 3, subject: "物理学".to_string() };
        assert_eq!(status.to_string(), "授業中 (3限: 物理学)");
        assert_eq!(ClassStatus::Free.to_string(), "空き時間");
    }
}
