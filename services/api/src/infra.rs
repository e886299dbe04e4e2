use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;
use staff_health::workflows::health::{
    summarize_attendance, AppreciationRecord, AttendanceRecord, CycleWindow, Employee,
    EmployeeId, ErrorCounts, ErrorRecord, HealthRepository, MonthlyHours, MonthlyPresence,
    RepositoryError, SettingEntry, SettingsStore, Task, TaskHistoryEvent, TaskId,
};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, RwLock, RwLockReadGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Raw tracker rows backing the in-memory repository.
#[derive(Debug, Default, Clone)]
pub(crate) struct HealthDataset {
    pub(crate) employees: Vec<Employee>,
    pub(crate) tasks: Vec<Task>,
    pub(crate) events: Vec<TaskHistoryEvent>,
    pub(crate) attendance: Vec<AttendanceRecord>,
    pub(crate) errors: Vec<ErrorRecord>,
    pub(crate) appreciations: Vec<AppreciationRecord>,
}

/// Window filters compare calendar days in the organisation's time zone.
#[derive(Clone)]
pub(crate) struct InMemoryHealthRepository {
    data: Arc<RwLock<HealthDataset>>,
    timezone: Tz,
}

impl InMemoryHealthRepository {
    pub(crate) fn new(dataset: HealthDataset, timezone: Tz) -> Self {
        Self {
            data: Arc::new(RwLock::new(dataset)),
            timezone,
        }
    }

    fn in_window(&self, instant: &DateTime<Utc>, window: &CycleWindow) -> bool {
        window.contains(instant.with_timezone(&self.timezone).date_naive())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HealthDataset>, RepositoryError> {
        self.data
            .read()
            .map_err(|_| RepositoryError::Unavailable("dataset lock poisoned".to_string()))
    }

    fn attendance_for(
        &self,
        employee_id: &EmployeeId,
        window: &CycleWindow,
    ) -> Result<(Vec<MonthlyHours>, Vec<MonthlyPresence>), RepositoryError> {
        let guard = self.read()?;
        let rows = guard
            .attendance
            .iter()
            .filter(|record| &record.employee_id == employee_id);
        Ok(summarize_attendance(rows, window))
    }
}

#[async_trait]
impl HealthRepository for InMemoryHealthRepository {
    async fn employee(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError> {
        let guard = self.read()?;
        Ok(guard.employees.iter().find(|employee| &employee.id == id).cloned())
    }

    async fn tasks_assigned_to(&self, employee_name: &str) -> Result<Vec<Task>, RepositoryError> {
        let guard = self.read()?;
        Ok(guard
            .tasks
            .iter()
            .filter(|task| {
                task.assigned_to
                    .split(',')
                    .any(|assignee| assignee.trim() == employee_name)
            })
            .cloned()
            .collect())
    }

    async fn completion_events(
        &self,
        task_ids: &[TaskId],
        window: &CycleWindow,
    ) -> Result<Vec<TaskHistoryEvent>, RepositoryError> {
        let guard = self.read()?;
        Ok(guard
            .events
            .iter()
            .filter(|event| task_ids.contains(&event.task_id))
            .filter(|event| window.contains(event.local_date(&self.timezone)))
            .cloned()
            .collect())
    }

    async fn attendance_hours_by_month(
        &self,
        employee_id: &EmployeeId,
        window: &CycleWindow,
    ) -> Result<Vec<MonthlyHours>, RepositoryError> {
        Ok(self.attendance_for(employee_id, window)?.0)
    }

    async fn present_days_by_month(
        &self,
        employee_id: &EmployeeId,
        window: &CycleWindow,
    ) -> Result<Vec<MonthlyPresence>, RepositoryError> {
        Ok(self.attendance_for(employee_id, window)?.1)
    }

    async fn errors_by_severity(
        &self,
        employee_id: &EmployeeId,
        window: &CycleWindow,
    ) -> Result<ErrorCounts, RepositoryError> {
        let guard = self.read()?;
        let mut counts = ErrorCounts::default();
        guard
            .errors
            .iter()
            .filter(|error| &error.employee_id == employee_id)
            .filter(|error| self.in_window(&error.created_at, window))
            .for_each(|error| counts.record(error.severity));
        Ok(counts)
    }

    async fn appreciation_count(
        &self,
        employee_id: &EmployeeId,
        window: &CycleWindow,
    ) -> Result<u32, RepositoryError> {
        let guard = self.read()?;
        let count = guard
            .appreciations
            .iter()
            .filter(|appreciation| &appreciation.employee_id == employee_id)
            .filter(|appreciation| self.in_window(&appreciation.created_at, window))
            .count();
        u32::try_from(count).map_err(|_| RepositoryError::Invalid("appreciation overflow".into()))
    }
}

/// Settings entries read from a JSON file on every call.
///
/// Accepts either `[{"key": .., "value": ..}]` or a flat `{"key": value}` object.
/// Without a path the store is empty and every setting keeps its default.
#[derive(Debug, Default, Clone)]
pub(crate) struct FileSettingsStore {
    path: Option<PathBuf>,
}

impl FileSettingsStore {
    pub(crate) fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn health_settings(&self) -> Result<Vec<SettingEntry>, RepositoryError> {
        let Some(path) = &self.path else {
            return Ok(Vec::new());
        };

        let raw = tokio::fs::read_to_string(path).await.map_err(|err| {
            RepositoryError::Unavailable(format!("{}: {err}", path.display()))
        })?;
        parse_settings_document(&raw)
    }
}

pub(crate) fn parse_settings_document(raw: &str) -> Result<Vec<SettingEntry>, RepositoryError> {
    let document: Value = serde_json::from_str(raw)
        .map_err(|err| RepositoryError::Invalid(format!("settings document: {err}")))?;

    match document {
        Value::Array(_) => serde_json::from_value(document)
            .map_err(|err| RepositoryError::Invalid(format!("settings entries: {err}"))),
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(key, value)| SettingEntry::new(key, value))
            .collect()),
        other => Err(RepositoryError::Invalid(format!(
            "settings document must be an array or object, found {other}"
        ))),
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
