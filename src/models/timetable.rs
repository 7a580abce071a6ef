use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// One of the five fixed daily class periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub period: u8,
    /// `HH:MM`, 24h.
    pub start: &'static str,
    pub end: &'static str,
    pub display_name: &'static str,
}

impl TimeSlot {
    /// Inclusive on both bounds. `hhmm` must be zero-padded `HH:MM`.
    pub fn contains(&self, hhmm: &str) -> bool {
        self.start <= hhmm && hhmm <= self.end
    }
}

pub const TIME_SLOTS: [TimeSlot; 5] = [
    TimeSlot { period: 1, start: "08:45", end: "10:15", display_name: "1限" },
    TimeSlot { period: 2, start: "10:30", end: "12:00", display_name: "2限" },
    TimeSlot { period: 3, start: "13:00", end: "14:30", display_name: "3限" },
    TimeSlot { period: 4, start: "14:45", end: "16:15", display_name: "4限" },
    TimeSlot { period: 5, start: "16:30", end: "18:00", display_name: "5限" },
];

pub fn time_slot(period: u8) -> Option<&'static TimeSlot> {
    TIME_SLOTS.iter().find(|s| s.period == period)
}

pub fn is_valid_period(period: u8) -> bool {
    time_slot(period).is_some()
}

/// Schedulable days. Saturday and Sunday have no variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Weekday {
    pub const ALL: [Weekday; 5] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ];

    pub fn id(self) -> u8 {
        match self {
            Weekday::Monday => 1,
            Weekday::Tuesday => 2,
            Weekday::Wednesday => 3,
            Weekday::Thursday => 4,
            Weekday::Friday => 5,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            Weekday::Monday => "月",
            Weekday::Tuesday => "火",
            Weekday::Wednesday => "水",
            Weekday::Thursday => "木",
            Weekday::Friday => "金",
        }
    }

    pub fn full_name(self) -> &'static str {
        match self {
            Weekday::Monday => "月曜日",
            Weekday::Tuesday => "火曜日",
            Weekday::Wednesday => "水曜日",
            Weekday::Thursday => "木曜日",
            Weekday::Friday => "金曜日",
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.id() == id)
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_lowercase();
        Self::ALL.into_iter().find(|d| d.key() == key)
    }

    pub fn from_chrono(day: chrono::Weekday) -> Option<Self> {
        match day {
            chrono::Weekday::Mon => Some(Weekday::Monday),
            chrono::Weekday::Tue => Some(Weekday::Tuesday),
            chrono::Weekday::Wed => Some(Weekday::Wednesday),
            chrono::Weekday::Thu => Some(Weekday::Thursday),
            chrono::Weekday::Fri => Some(Weekday::Friday),
            chrono::Weekday::Sat | chrono::Weekday::Sun => None,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name())
    }
}

/// `day_of_week` as sent by the server: the key string for the owner's
/// timetable, a 0-based index (0 = Monday) for a friend's.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DayValue {
    Index(i64),
    Key(String),
}

impl DayValue {
    pub fn weekday(&self) -> Option<Weekday> {
        match self {
            DayValue::Key(key) => Weekday::from_key(key),
            DayValue::Index(idx) => u8::try_from(*idx)
                .ok()
                .and_then(|i| i.checked_add(1))
                .and_then(Weekday::from_id),
        }
    }
}

/// A timetable row as returned by `GET /api/timetable`.
#[derive(Debug, Clone, Deserialize)]
pub struct TimetableRecord {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    pub day_of_week: DayValue,
    pub period: i64,
    #[serde(default)]
    pub subject_name: Option<String>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub professor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEntry {
    pub id: Option<String>,
    pub subject: String,
    pub room: Option<String>,
    pub professor: Option<String>,
}

/// User input for one cell. Values are trimmed before they are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassForm {
    pub subject: String,
    pub room: String,
    pub professor: String,
}

impl ClassForm {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Default::default()
        }
    }

    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = room.into();
        self
    }

    pub fn with_professor(mut self, professor: impl Into<String>) -> Self {
        self.professor = professor.into();
        self
    }

    pub fn from_entry(entry: &ClassEntry) -> Self {
        Self {
            subject: entry.subject.clone(),
            room: entry.room.clone().unwrap_or_default(),
            professor: entry.professor.clone().unwrap_or_default(),
        }
    }

    /// Local entry for this form, carrying over an existing id.
    pub fn to_entry(&self, id: Option<String>) -> ClassEntry {
        ClassEntry {
            id,
            subject: self.subject.trim().to_string(),
            room: non_empty(&self.room),
            professor: non_empty(&self.professor),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Weekly grid keyed by weekday, then period. A weekday key is present only
/// while it holds at least one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timetable {
    days: BTreeMap<Weekday, BTreeMap<u8, ClassEntry>>,
}

impl Timetable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = TimetableRecord>) -> Self {
        let mut timetable = Self::new();

        for record in records {
            let Some(day) = record.day_of_week.weekday() else {
                debug!("skipping record with unknown day: {:?}", record.day_of_week);
                continue;
            };
            let Some(period) = u8::try_from(record.period).ok().filter(|p| is_valid_period(*p))
            else {
                debug!("skipping record with invalid period: {}", record.period);
                continue;
            };
            let subject = record.subject_name.unwrap_or_default();
            if subject.trim().is_empty() {
                debug!("skipping empty cell {} {}", day.key(), period);
                continue;
            }

            timetable.insert(
                day,
                period,
                ClassEntry {
                    id: record.id,
                    subject,
                    room: record.room.filter(|r| !r.is_empty()),
                    professor: record.professor.filter(|p| !p.is_empty()),
                },
            );
        }

        timetable
    }

    pub fn get(&self, day: Weekday, period: u8) -> Option<&ClassEntry> {
        self.days.get(&day).and_then(|periods| periods.get(&period))
    }

    pub fn insert(&mut self, day: Weekday, period: u8, entry: ClassEntry) -> Option<ClassEntry> {
        self.days.entry(day).or_default().insert(period, entry)
    }

    /// Removes the cell, and the weekday key with it when it becomes empty.
    pub fn remove(&mut self, day: Weekday, period: u8) -> Option<ClassEntry> {
        let periods = self.days.get_mut(&day)?;
        let removed = periods.remove(&period);
        if periods.is_empty() {
            self.days.remove(&day);
        }
        removed
    }

    pub fn contains_day(&self, day: Weekday) -> bool {
        self.days.contains_key(&day)
    }

    pub fn day(&self, day: Weekday) -> Option<&BTreeMap<u8, ClassEntry>> {
        self.days.get(&day)
    }

    /// Occupied cells in (weekday, period) order.
    pub fn cells(&self) -> impl Iterator<Item = (Weekday, u8, &ClassEntry)> + '_ {
        self.days
            .iter()
            .flat_map(|(day, periods)| periods.iter().map(move |(p, e)| (*day, *p, e)))
    }

    pub fn len(&self) -> usize {
        self.days.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Num(i64),
    Str(String),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Num(n) => n.to_string(),
            RawId::Str(s) => s,
        }
    }
}

/// Ids arrive as UUID strings or integers depending on the table.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(RawId::into_string)
}

pub(crate) fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(RawId::into_string))
}
