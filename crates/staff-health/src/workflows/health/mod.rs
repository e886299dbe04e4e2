//! Employee performance health score.
//!
//! Turns recurring-task completions, attendance hours, recorded errors and
//! appreciations into a composite score and a rating band, each component
//! measured over its own rolling window.

pub mod classifier;
pub mod completion;
pub mod conduct;
pub mod cycles;
pub mod domain;
pub mod hours;
pub mod rating;
pub mod repository;
pub mod router;
pub mod service;
pub mod settings;

#[cfg(test)]
mod tests;

pub use classifier::{classify, Classification, RecurrenceType};
pub use completion::{CompletionIndex, DailyCompletionAggregator, DayCompletion, TaskCompletionScorer};
pub use conduct::ErrorAppreciationScorer;
pub use cycles::{CycleWindow, CycleWindowCalculator, HealthCycles};
pub use domain::{
    summarize_attendance, AppreciationRecord, AttendanceRecord, Employee, EmployeeId, ErrorCounts,
    ErrorRecord, ErrorSeverity, MonthKey, MonthlyHours, MonthlyPresence, Task, TaskHistoryEvent,
    TaskId, ADMIN_SUBJECT,
};
pub use hours::HoursAttendanceScorer;
pub use rating::{HealthRating, HealthScoreCalculations, HealthScoreResult, ScoreSource};
pub use repository::{HealthRepository, RepositoryError, SettingsStore};
pub use router::health_router;
pub use service::{HealthScoreError, HealthScoreService};
pub use settings::{HealthSettings, SettingEntry, SettingsError, SettingsSnapshot};
