use crate::infra::{FileSettingsStore, HealthDataset, InMemoryHealthRepository};
use chrono::{Datelike, NaiveDate, TimeZone, Utc, Weekday};
use clap::Args;
use staff_health::config::AppConfig;
use staff_health::error::AppError;
use staff_health::workflows::health::{
    classify, AppreciationRecord, AttendanceRecord, CycleWindowCalculator, Employee, EmployeeId,
    ErrorRecord, ErrorSeverity, HealthScoreService, HealthSettings, Task, TaskHistoryEvent,
    TaskId,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Employee identifier to score (`admin` yields the admin message)
    #[arg(long)]
    pub(crate) employee: String,
    /// Reference date (YYYY-MM-DD). Defaults to today in APP_TIMEZONE.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// JSON settings file overriding HEALTH_SETTINGS_PATH
    #[arg(long)]
    pub(crate) settings: Option<PathBuf>,
}

/// Scores one employee of the bundled demo roster and prints the result as JSON.
pub(crate) async fn run_score(args: ScoreArgs, config: AppConfig) -> Result<(), AppError> {
    let ScoreArgs {
        employee,
        date,
        settings,
    } = args;

    let timezone = config.organization.timezone;
    let reference_date =
        date.unwrap_or_else(|| Utc::now().with_timezone(&timezone).date_naive());
    let settings_path = settings.or(config.organization.health_settings_path);

    let repository = Arc::new(InMemoryHealthRepository::new(
        demo_dataset(reference_date),
        timezone,
    ));
    let store = Arc::new(FileSettingsStore::new(settings_path));
    let service = HealthScoreService::new(repository, store, timezone);

    let result = service
        .compute_health_score(&EmployeeId::new(employee), reference_date)
        .await?;
    let rendered = serde_json::to_string_pretty(&result).map_err(std::io::Error::from)?;
    println!("{rendered}");

    Ok(())
}

pub(crate) const DEMO_STEADY: &str = "emp-101";
pub(crate) const DEMO_SLIPPING: &str = "emp-102";

/// Two-person roster with tracker history covering every window ending at `reference`.
///
/// `emp-101` completes every due task, works full days and has one
/// appreciation. `emp-102` misses every fourth day, works six-hour shifts,
/// is absent three Mondays a month and has two errors on record.
pub(crate) fn demo_dataset(reference: NaiveDate) -> HealthDataset {
    let cycles = CycleWindowCalculator::from_settings(&HealthSettings::default()).compute(reference);
    let roster = [
        DemoProfile {
            id: DEMO_STEADY,
            name: "Maya Chen",
            skip_every: None,
            shift_hours: 8,
            absent_mondays: 0,
        },
        DemoProfile {
            id: DEMO_SLIPPING,
            name: "Tomas Silva",
            skip_every: Some(4),
            shift_hours: 6,
            absent_mondays: 3,
        },
    ];

    let mut dataset = HealthDataset::default();
    for profile in &roster {
        let employee_id = EmployeeId::new(profile.id);
        let tasks = demo_tasks(profile);

        for (offset, day) in cycles.task.days().enumerate() {
            if profile.skip_every.is_some_and(|every| offset % every == every - 1) {
                continue;
            }
            for task in &tasks {
                if classify(&task.title, &task.labels, day).due_on_date {
                    dataset.events.push(completion_event(&task.id, day));
                }
            }
        }

        let mut mondays_missed = (0u32, 0u32);
        for day in cycles.hr.days().filter(|day| day.weekday() != Weekday::Sun) {
            if day.weekday() == Weekday::Mon {
                if mondays_missed.0 != day.month() {
                    mondays_missed = (day.month(), 0);
                }
                if mondays_missed.1 < profile.absent_mondays {
                    mondays_missed.1 += 1;
                    continue;
                }
            }
            dataset.attendance.push(AttendanceRecord {
                employee_id: employee_id.clone(),
                date: day,
                duration_seconds: Some(profile.shift_hours * 3600),
                clock_in: None,
                clock_out: None,
            });
        }

        dataset.employees.push(Employee {
            id: employee_id,
            name: profile.name.to_string(),
            expected_hours_per_day: None,
        });
        dataset.tasks.extend(tasks);
    }

    let appreciated_on = cycles.data.start + chrono::Days::new(20);
    dataset.appreciations.push(AppreciationRecord {
        employee_id: EmployeeId::new(DEMO_STEADY),
        created_at: noon(appreciated_on),
    });
    for (severity, days_in) in [(ErrorSeverity::Medium, 12), (ErrorSeverity::Low, 40)] {
        dataset.errors.push(ErrorRecord {
            employee_id: EmployeeId::new(DEMO_SLIPPING),
            severity,
            created_at: noon(cycles.data.start + chrono::Days::new(days_in)),
        });
    }

    dataset
}

struct DemoProfile {
    id: &'static str,
    name: &'static str,
    skip_every: Option<usize>,
    shift_hours: i64,
    absent_mondays: u32,
}

fn demo_tasks(profile: &DemoProfile) -> Vec<Task> {
    [
        ("morning-queue", "Clear morning ticket queue", "daily task"),
        ("weekly-sync", "Team sync notes (Monday)", ""),
        ("payroll", "Payroll cut-off review (25 of month)", "finance"),
    ]
    .into_iter()
    .map(|(suffix, title, labels)| Task {
        id: TaskId(format!("{}-{suffix}", profile.id)),
        title: title.to_string(),
        labels: labels.to_string(),
        assigned_to: profile.name.to_string(),
    })
    .collect()
}

fn noon(day: NaiveDate) -> chrono::DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap_or_default())
}

fn completion_event(task_id: &TaskId, day: NaiveDate) -> TaskHistoryEvent {
    TaskHistoryEvent {
        task_id: task_id.clone(),
        action: TaskHistoryEvent::STATUS_CHANGED.to_string(),
        new_value: TaskHistoryEvent::COMPLETED.to_string(),
        timestamp: Utc.from_utc_datetime(&day.and_hms_opt(9, 30, 0).unwrap_or_default()),
    }
}
