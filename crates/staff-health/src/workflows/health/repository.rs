use async_trait::async_trait;

use super::cycles::CycleWindow;
use super::domain::{
    Employee, EmployeeId, ErrorCounts, MonthlyHours, MonthlyPresence, Task, TaskHistoryEvent,
    TaskId,
};
use super::settings::SettingEntry;

/// Read-only data access the health score is computed from.
///
/// Every method is an independent fetch; the engine never writes through it.
#[async_trait]
pub trait HealthRepository: Send + Sync {
    async fn employee(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError>;

    async fn tasks_assigned_to(&self, employee_name: &str) -> Result<Vec<Task>, RepositoryError>;

    /// Status-change events of `task_ids` whose timestamp falls inside `window`.
    async fn completion_events(
        &self,
        task_ids: &[TaskId],
        window: &CycleWindow,
    ) -> Result<Vec<TaskHistoryEvent>, RepositoryError>;

    async fn attendance_hours_by_month(
        &self,
        employee_id: &EmployeeId,
        window: &CycleWindow,
    ) -> Result<Vec<MonthlyHours>, RepositoryError>;

    async fn present_days_by_month(
        &self,
        employee_id: &EmployeeId,
        window: &CycleWindow,
    ) -> Result<Vec<MonthlyPresence>, RepositoryError>;

    async fn errors_by_severity(
        &self,
        employee_id: &EmployeeId,
        window: &CycleWindow,
    ) -> Result<ErrorCounts, RepositoryError>;

    async fn appreciation_count(
        &self,
        employee_id: &EmployeeId,
        window: &CycleWindow,
    ) -> Result<u32, RepositoryError>;
}

/// Source of the stored health settings entries.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn health_settings(&self) -> Result<Vec<SettingEntry>, RepositoryError>;
}

/// Error enumeration for collaborator failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("malformed record: {0}")]
    Invalid(String),
}
