use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde_json::Value;

use crate::workflows::health::cycles::CycleWindow;
use crate::workflows::health::domain::{
    summarize_attendance, AppreciationRecord, AttendanceRecord, Employee, EmployeeId,
    ErrorCounts, ErrorRecord, ErrorSeverity, MonthlyHours, MonthlyPresence, Task,
    TaskHistoryEvent, TaskId,
};
use crate::workflows::health::repository::{HealthRepository, RepositoryError, SettingsStore};
use crate::workflows::health::service::HealthScoreService;
use crate::workflows::health::settings::SettingEntry;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn at(day: NaiveDate, hour: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_hms_opt(hour, 0, 0).expect("valid time"))
}

/// Reference date used by the end-to-end scenarios.
pub(super) fn reference_date() -> NaiveDate {
    date(2026, 10, 18)
}

pub(super) fn employee() -> Employee {
    Employee {
        id: EmployeeId::new("emp-17"),
        name: "Asha Patel".to_string(),
        expected_hours_per_day: None,
    }
}

pub(super) fn task(id: &str, title: &str, labels: &str) -> Task {
    Task {
        id: TaskId(id.to_string()),
        title: title.to_string(),
        labels: labels.to_string(),
        assigned_to: "Asha Patel, Ravi Kumar".to_string(),
    }
}

pub(super) fn completed(task_id: &str, day: NaiveDate) -> TaskHistoryEvent {
    TaskHistoryEvent {
        task_id: TaskId(task_id.to_string()),
        action: TaskHistoryEvent::STATUS_CHANGED.to_string(),
        new_value: TaskHistoryEvent::COMPLETED.to_string(),
        timestamp: at(day, 10),
    }
}

pub(super) fn worked(day: NaiveDate, hours: i64) -> AttendanceRecord {
    AttendanceRecord {
        employee_id: employee().id,
        date: day,
        duration_seconds: Some(hours * 3600),
        clock_in: None,
        clock_out: None,
    }
}

pub(super) fn error(severity: ErrorSeverity, day: NaiveDate) -> ErrorRecord {
    ErrorRecord {
        employee_id: employee().id,
        severity,
        created_at: at(day, 12),
    }
}

pub(super) fn appreciation(day: NaiveDate) -> AppreciationRecord {
    AppreciationRecord {
        employee_id: employee().id,
        created_at: at(day, 12),
    }
}

/// Eight hours on every Monday-to-Saturday between `start` and `end`.
pub(super) fn full_attendance(start: NaiveDate, end: NaiveDate) -> Vec<AttendanceRecord> {
    CycleWindow::new(start, end)
        .days()
        .filter(|day| day.weekday() != Weekday::Sun)
        .map(|day| worked(day, 8))
        .collect()
}

/// Dataset for the default scenario at [`reference_date`]:
/// daily task completed on every task-window day, full attendance for
/// July to September, one High error and two appreciations.
pub(super) fn scenario_repository() -> MemoryRepository {
    let task_window = CycleWindow::new(date(2026, 7, 16), date(2026, 10, 16));
    MemoryRepository {
        employees: vec![employee()],
        tasks: vec![task("t-daily", "Daily Task", "")],
        events: task_window
            .days()
            .map(|day| completed("t-daily", day))
            .collect(),
        attendance: full_attendance(date(2026, 7, 1), date(2026, 9, 30)),
        errors: vec![error(ErrorSeverity::High, date(2026, 9, 2))],
        appreciations: vec![appreciation(date(2026, 8, 4)), appreciation(date(2026, 10, 1))],
        ..MemoryRepository::default()
    }
}

pub(super) fn build_service(
    repository: MemoryRepository,
) -> (
    HealthScoreService<MemoryRepository, MemorySettings>,
    Arc<MemoryRepository>,
) {
    build_service_with(repository, MemorySettings::default())
}

pub(super) fn build_service_with(
    repository: MemoryRepository,
    settings: MemorySettings,
) -> (
    HealthScoreService<MemoryRepository, MemorySettings>,
    Arc<MemoryRepository>,
) {
    let repository = Arc::new(repository);
    let service = HealthScoreService::new(repository.clone(), Arc::new(settings), Tz::UTC);
    (service, repository)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum Fetch {
    Employee,
    Tasks,
    CompletionEvents,
    Hours,
    Presence,
    Errors,
    Appreciations,
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    pub(super) employees: Vec<Employee>,
    pub(super) tasks: Vec<Task>,
    pub(super) events: Vec<TaskHistoryEvent>,
    pub(super) attendance: Vec<AttendanceRecord>,
    pub(super) errors: Vec<ErrorRecord>,
    pub(super) appreciations: Vec<AppreciationRecord>,
    pub(super) failing: HashSet<Fetch>,
    calls: AtomicUsize,
    log: Mutex<Vec<Fetch>>,
}

impl MemoryRepository {
    pub(super) fn failing_on(mut self, fetch: Fetch) -> Self {
        self.failing.insert(fetch);
        self
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn fetched(&self) -> Vec<Fetch> {
        self.log.lock().expect("log mutex poisoned").clone()
    }

    fn enter(&self, fetch: Fetch) -> Result<(), RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().expect("log mutex poisoned").push(fetch);
        if self.failing.contains(&fetch) {
            return Err(RepositoryError::Unavailable(format!("{fetch:?} offline")));
        }
        Ok(())
    }
}

#[async_trait]
impl HealthRepository for MemoryRepository {
    async fn employee(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError> {
        self.enter(Fetch::Employee)?;
        Ok(self.employees.iter().find(|e| &e.id == id).cloned())
    }

    async fn tasks_assigned_to(&self, employee_name: &str) -> Result<Vec<Task>, RepositoryError> {
        self.enter(Fetch::Tasks)?;
        Ok(self
            .tasks
            .iter()
            .filter(|task| {
                task.assigned_to
                    .split(',')
                    .any(|name| name.trim() == employee_name)
            })
            .cloned()
            .collect())
    }

    async fn completion_events(
        &self,
        task_ids: &[TaskId],
        window: &CycleWindow,
    ) -> Result<Vec<TaskHistoryEvent>, RepositoryError> {
        self.enter(Fetch::CompletionEvents)?;
        Ok(self
            .events
            .iter()
            .filter(|event| task_ids.contains(&event.task_id))
            .filter(|event| window.contains(event.timestamp.date_naive()))
            .cloned()
            .collect())
    }

    async fn attendance_hours_by_month(
        &self,
        employee_id: &EmployeeId,
        window: &CycleWindow,
    ) -> Result<Vec<MonthlyHours>, RepositoryError> {
        self.enter(Fetch::Hours)?;
        let rows = self.attendance.iter().filter(|r| &r.employee_id == employee_id);
        Ok(summarize_attendance(rows, window).0)
    }

    async fn present_days_by_month(
        &self,
        employee_id: &EmployeeId,
        window: &CycleWindow,
    ) -> Result<Vec<MonthlyPresence>, RepositoryError> {
        self.enter(Fetch::Presence)?;
        let rows = self.attendance.iter().filter(|r| &r.employee_id == employee_id);
        Ok(summarize_attendance(rows, window).1)
    }

    async fn errors_by_severity(
        &self,
        employee_id: &EmployeeId,
        window: &CycleWindow,
    ) -> Result<ErrorCounts, RepositoryError> {
        self.enter(Fetch::Errors)?;
        let mut counts = ErrorCounts::default();
        self.errors
            .iter()
            .filter(|e| &e.employee_id == employee_id)
            .filter(|e| window.contains(e.created_at.date_naive()))
            .for_each(|e| counts.record(e.severity));
        Ok(counts)
    }

    async fn appreciation_count(
        &self,
        employee_id: &EmployeeId,
        window: &CycleWindow,
    ) -> Result<u32, RepositoryError> {
        self.enter(Fetch::Appreciations)?;
        Ok(self
            .appreciations
            .iter()
            .filter(|a| &a.employee_id == employee_id)
            .filter(|a| window.contains(a.created_at.date_naive()))
            .count() as u32)
    }
}

#[derive(Default)]
pub(super) struct MemorySettings {
    pub(super) entries: Vec<SettingEntry>,
    pub(super) unavailable: bool,
    calls: AtomicUsize,
}

impl MemorySettings {
    pub(super) fn with_entries(entries: Vec<SettingEntry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    pub(super) fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn health_settings(&self) -> Result<Vec<SettingEntry>, RepositoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(RepositoryError::Unavailable("settings table locked".to_string()));
        }
        Ok(self.entries.clone())
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
