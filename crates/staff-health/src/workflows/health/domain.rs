use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::cycles::CycleWindow;

/// Reserved subject that shares the scoring path but is not an employee.
pub const ADMIN_SUBJECT: &str = "admin";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub String);

impl EmployeeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn is_admin(&self) -> bool {
        self.0 == ADMIN_SUBJECT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

/// Employee snapshot, immutable for the duration of a scoring call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    /// Overrides the organisation-wide expected hours when present.
    #[serde(default)]
    pub expected_hours_per_day: Option<f64>,
}

/// Read-only task snapshot. Recurrence is inferred from `title` and `labels`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub labels: String,
    #[serde(default)]
    pub assigned_to: String,
}

/// Single entry from a task's change history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskHistoryEvent {
    pub task_id: TaskId,
    pub action: String,
    pub new_value: String,
    pub timestamp: DateTime<Utc>,
}

impl TaskHistoryEvent {
    pub const STATUS_CHANGED: &'static str = "status changed";
    pub const COMPLETED: &'static str = "Completed";

    pub fn is_completion(&self) -> bool {
        self.action.trim().eq_ignore_ascii_case(Self::STATUS_CHANGED)
            && self.new_value.trim().eq_ignore_ascii_case(Self::COMPLETED)
    }

    /// Calendar day of the event in the organisation's time zone.
    pub fn local_date(&self, timezone: &Tz) -> NaiveDate {
        self.timestamp.with_timezone(timezone).date_naive()
    }
}

/// Raw attendance row as stored; either an explicit duration or a clock pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub employee_id: EmployeeId,
    pub date: NaiveDate,
    #[serde(default)]
    pub duration_seconds: Option<i64>,
    #[serde(default)]
    pub clock_in: Option<DateTime<Utc>>,
    #[serde(default)]
    pub clock_out: Option<DateTime<Utc>>,
}

impl AttendanceRecord {
    /// Time worked, preferring the explicit duration over the clock pair.
    pub fn worked(&self) -> Duration {
        if let Some(seconds) = self.duration_seconds {
            return Duration::seconds(seconds.max(0));
        }

        match (self.clock_in, self.clock_out) {
            (Some(clock_in), Some(clock_out)) if clock_out > clock_in => clock_out - clock_in,
            _ => Duration::zero(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSeverity {
    High,
    Medium,
    Low,
}

impl ErrorSeverity {
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub employee_id: EmployeeId,
    pub severity: ErrorSeverity,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppreciationRecord {
    pub employee_id: EmployeeId,
    pub created_at: DateTime<Utc>,
}

/// Error counts per severity inside one window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCounts {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

impl ErrorCounts {
    pub fn record(&mut self, severity: ErrorSeverity) {
        match severity {
            ErrorSeverity::High => self.high += 1,
            ErrorSeverity::Medium => self.medium += 1,
            ErrorSeverity::Low => self.low += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.high + self.medium + self.low
    }
}

/// Calendar month used to bucket hours and presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.next().first_day()?.pred_opt()
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The `count` consecutive months starting at `self`.
    pub fn run(self, count: u32) -> Vec<MonthKey> {
        let mut months = Vec::with_capacity(count as usize);
        let mut current = self;
        for _ in 0..count {
            months.push(current);
            current = current.next();
        }
        months
    }

    pub fn months_before(&self, count: u32) -> Option<Self> {
        self.first_day()?
            .checked_sub_months(Months::new(count))
            .map(Self::of)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Hours worked in one month, already normalised to a single unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyHours {
    pub month: MonthKey,
    pub worked: Duration,
}

impl MonthlyHours {
    pub fn hours(&self) -> f64 {
        self.worked.num_seconds() as f64 / 3600.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyPresence {
    pub month: MonthKey,
    pub days_present: u32,
}

/// Buckets attendance rows inside `window` into per-month hours and present days.
///
/// A day counts as present when it has at least one attendance row, whatever
/// its duration.
pub fn summarize_attendance<'a, I>(
    records: I,
    window: &CycleWindow,
) -> (Vec<MonthlyHours>, Vec<MonthlyPresence>)
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    let mut worked: BTreeMap<MonthKey, Duration> = BTreeMap::new();
    let mut present: BTreeMap<MonthKey, BTreeSet<NaiveDate>> = BTreeMap::new();

    for record in records {
        if !window.contains(record.date) {
            continue;
        }
        let month = MonthKey::of(record.date);
        let entry = worked.entry(month).or_insert_with(Duration::zero);
        *entry = *entry + record.worked();
        present.entry(month).or_default().insert(record.date);
    }

    let hours = worked
        .into_iter()
        .map(|(month, worked)| MonthlyHours { month, worked })
        .collect();
    let presence = present
        .into_iter()
        .map(|(month, days)| MonthlyPresence {
            month,
            days_present: days.len() as u32,
        })
        .collect();

    (hours, presence)
}
