use chrono::NaiveDate;
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::completion::{CompletionIndex, TaskCalculation, TaskCompletionScorer};
use super::conduct::{AppreciationCalculation, ErrorAppreciationScorer, ErrorCalculation};
use super::cycles::{CycleWindow, CycleWindowCalculator};
use super::domain::{Employee, EmployeeId, MonthKey, TaskId};
use super::hours::{AttendanceCalculation, HoursAttendanceScorer, HoursCalculation};
use super::rating::{HealthScoreCalculations, HealthScoreResult, ScoreSource};
use super::repository::{HealthRepository, RepositoryError, SettingsStore};
use super::settings::{HealthSettings, SettingsSnapshot};

/// Computes employee health scores from injected collaborators.
///
/// Holds no mutable state; every call re-reads settings and records.
pub struct HealthScoreService<R, S> {
    repository: Arc<R>,
    settings: Arc<S>,
    timezone: Tz,
}

impl<R, S> HealthScoreService<R, S>
where
    R: HealthRepository + 'static,
    S: SettingsStore + 'static,
{
    pub fn new(repository: Arc<R>, settings: Arc<S>, timezone: Tz) -> Self {
        Self {
            repository,
            settings,
            timezone,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Scores one employee as of `reference_date`.
    ///
    /// A failing data source zeroes its own component and is listed in
    /// `degraded_sources`; only the employee lookup can fail the call.
    pub async fn compute_health_score(
        &self,
        employee_id: &EmployeeId,
        reference_date: NaiveDate,
    ) -> Result<HealthScoreResult, HealthScoreError> {
        if employee_id.is_admin() {
            let cycles = CycleWindowCalculator::from_settings(&HealthSettings::default())
                .compute(reference_date);
            debug!(%employee_id, "admin subject, skipping health score");
            return Ok(HealthScoreResult::admin(
                employee_id.clone(),
                reference_date,
                cycles,
            ));
        }

        let (settings, employee) = tokio::join!(
            SettingsSnapshot::load(self.settings.as_ref()),
            self.repository.employee(employee_id)
        );
        let employee = match employee {
            Ok(Some(employee)) => employee,
            Ok(None) | Err(RepositoryError::NotFound) => {
                return Err(HealthScoreError::EmployeeNotFound(employee_id.clone()))
            }
            Err(source) => {
                return Err(HealthScoreError::EmployeeLookup {
                    employee_id: employee_id.clone(),
                    source,
                })
            }
        };

        let calculator = CycleWindowCalculator::from_settings(&settings);
        let cycles = calculator.compute(reference_date);
        let hr_months = calculator.hr_months(reference_date);
        debug!(
            %employee_id,
            task_start = %cycles.task.start,
            task_end = %cycles.task.end,
            hr_start = %cycles.hr.start,
            data_start = %cycles.data.start,
            "computed health cycles"
        );

        let (tasks, hours, attendance, errors, appreciations) = tokio::join!(
            self.task_component(&employee, &cycles.task, &settings),
            self.hours_component(&employee, &cycles.hr, &hr_months, &settings),
            self.attendance_component(&employee, &cycles.hr, &hr_months, &settings),
            self.error_component(&employee, &cycles.data, &settings),
            self.appreciation_component(&employee, &cycles.data, &settings),
        );

        let mut degraded = Vec::new();
        let calculations = HealthScoreCalculations {
            task: recover(tasks, ScoreSource::Tasks, employee_id, &mut degraded, || {
                TaskCompletionScorer::new(settings.task_points_per_day).unavailable(&cycles.task)
            }),
            hours: recover(hours, ScoreSource::Hours, employee_id, &mut degraded, || {
                HoursCalculation {
                    points_per_month: settings.hours_points_per_month,
                    ..HoursCalculation::default()
                }
            }),
            attendance: recover(
                attendance,
                ScoreSource::Attendance,
                employee_id,
                &mut degraded,
                || AttendanceCalculation {
                    max_absences_per_month: settings.max_absences_per_month,
                    deduction_per_month: settings.attendance_deduction,
                    ..AttendanceCalculation::default()
                },
            ),
            errors: recover(
                errors,
                ScoreSource::Errors,
                employee_id,
                &mut degraded,
                ErrorCalculation::default,
            ),
            appreciations: recover(
                appreciations,
                ScoreSource::Appreciations,
                employee_id,
                &mut degraded,
                || ErrorAppreciationScorer::new(&settings).score_appreciations(0),
            ),
            unapplied_warning_letter_deduction: settings.warning_letter_deduction,
        };

        let result = HealthScoreResult::aggregate(
            employee.id.clone(),
            reference_date,
            calculations,
            cycles,
            degraded,
            &settings,
        );

        info!(
            %employee_id,
            health_score = result.health_score,
            rating = %result.rating,
            degraded = result.degraded_sources.len(),
            "health score computed"
        );

        Ok(result)
    }

    async fn task_component(
        &self,
        employee: &Employee,
        window: &CycleWindow,
        settings: &HealthSettings,
    ) -> Result<TaskCalculation, RepositoryError> {
        let scorer = TaskCompletionScorer::new(settings.task_points_per_day);
        let tasks = self.repository.tasks_assigned_to(&employee.name).await?;
        if tasks.is_empty() {
            return Ok(scorer.score(window, &tasks, &CompletionIndex::default()));
        }

        let task_ids: Vec<TaskId> = tasks.iter().map(|task| task.id.clone()).collect();
        let events = self
            .repository
            .completion_events(&task_ids, window)
            .await?;
        let completions = CompletionIndex::from_events(&events, &self.timezone);

        Ok(scorer.score(window, &tasks, &completions))
    }

    async fn hours_component(
        &self,
        employee: &Employee,
        window: &CycleWindow,
        months: &[MonthKey],
        settings: &HealthSettings,
    ) -> Result<HoursCalculation, RepositoryError> {
        let worked = self
            .repository
            .attendance_hours_by_month(&employee.id, window)
            .await?;
        Ok(HoursAttendanceScorer::new(settings).score_hours(months, employee, &worked))
    }

    async fn attendance_component(
        &self,
        employee: &Employee,
        window: &CycleWindow,
        months: &[MonthKey],
        settings: &HealthSettings,
    ) -> Result<AttendanceCalculation, RepositoryError> {
        let presence = self
            .repository
            .present_days_by_month(&employee.id, window)
            .await?;
        Ok(HoursAttendanceScorer::new(settings).score_attendance(months, &presence))
    }

    async fn error_component(
        &self,
        employee: &Employee,
        window: &CycleWindow,
        settings: &HealthSettings,
    ) -> Result<ErrorCalculation, RepositoryError> {
        let counts = self
            .repository
            .errors_by_severity(&employee.id, window)
            .await?;
        Ok(ErrorAppreciationScorer::new(settings).score_errors(counts))
    }

    async fn appreciation_component(
        &self,
        employee: &Employee,
        window: &CycleWindow,
        settings: &HealthSettings,
    ) -> Result<AppreciationCalculation, RepositoryError> {
        let count = self
            .repository
            .appreciation_count(&employee.id, window)
            .await?;
        Ok(ErrorAppreciationScorer::new(settings).score_appreciations(count))
    }
}

fn recover<T>(
    outcome: Result<T, RepositoryError>,
    source: ScoreSource,
    employee_id: &EmployeeId,
    degraded: &mut Vec<ScoreSource>,
    fallback: impl FnOnce() -> T,
) -> T {
    match outcome {
        Ok(value) => value,
        Err(error) => {
            warn!(
                %employee_id,
                source = source.label(),
                %error,
                "health score source failed, component scored as zero"
            );
            degraded.push(source);
            fallback()
        }
    }
}

/// Error raised by the health score service.
#[derive(Debug, thiserror::Error)]
pub enum HealthScoreError {
    #[error("employee {0} not found")]
    EmployeeNotFound(EmployeeId),
    #[error("employee {employee_id} lookup failed: {source}")]
    EmployeeLookup {
        employee_id: EmployeeId,
        #[source]
        source: RepositoryError,
    },
}
