use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::classifier::{classify, RecurrenceType};
use super::cycles::CycleWindow;
use super::domain::{Task, TaskHistoryEvent, TaskId};

/// Days on which each task became Completed, in the organisation's calendar.
#[derive(Debug, Default, Clone)]
pub struct CompletionIndex {
    days: HashMap<TaskId, HashSet<NaiveDate>>,
}

impl CompletionIndex {
    pub fn from_events<'a, I>(events: I, timezone: &Tz) -> Self
    where
        I: IntoIterator<Item = &'a TaskHistoryEvent>,
    {
        let mut days: HashMap<TaskId, HashSet<NaiveDate>> = HashMap::new();
        for event in events.into_iter().filter(|event| event.is_completion()) {
            days.entry(event.task_id.clone())
                .or_default()
                .insert(event.local_date(timezone));
        }
        Self { days }
    }

    pub fn completed_on(&self, task_id: &TaskId, date: NaiveDate) -> bool {
        self.days
            .get(task_id)
            .map(|days| days.contains(&date))
            .unwrap_or(false)
    }
}

/// Due versus completed tasks of one recurrence type on one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeTally {
    pub total: u32,
    pub completed: u32,
}

impl TypeTally {
    fn satisfied(&self) -> bool {
        self.completed == self.total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCompletion {
    pub date: NaiveDate,
    pub daily: TypeTally,
    pub weekly: TypeTally,
    pub monthly: TypeTally,
    pub complete: bool,
}

impl DayCompletion {
    pub fn has_due_tasks(&self) -> bool {
        self.daily.total + self.weekly.total + self.monthly.total > 0
    }
}

/// Decides whether one day counts as fully complete for an employee.
///
/// Every recurrence type with at least one due task must have all of them
/// completed that day; a day without any due task never counts.
pub struct DailyCompletionAggregator<'a> {
    tasks: &'a [Task],
    completions: &'a CompletionIndex,
}

impl<'a> DailyCompletionAggregator<'a> {
    pub fn new(tasks: &'a [Task], completions: &'a CompletionIndex) -> Self {
        Self { tasks, completions }
    }

    pub fn evaluate(&self, date: NaiveDate) -> DayCompletion {
        let mut daily = TypeTally::default();
        let mut weekly = TypeTally::default();
        let mut monthly = TypeTally::default();

        for task in self.tasks {
            let classification = classify(&task.title, &task.labels, date);
            if !classification.due_on_date {
                continue;
            }
            let tally = match classification.recurrence {
                RecurrenceType::Daily => &mut daily,
                RecurrenceType::Weekly => &mut weekly,
                RecurrenceType::Monthly => &mut monthly,
                RecurrenceType::None => continue,
            };
            tally.total += 1;
            if self.completions.completed_on(&task.id, date) {
                tally.completed += 1;
            }
        }

        let any_due = daily.total + weekly.total + monthly.total > 0;
        let complete = any_due && daily.satisfied() && weekly.satisfied() && monthly.satisfied();

        DayCompletion {
            date,
            daily,
            weekly,
            monthly,
            complete,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCalculation {
    pub days_completed: u32,
    pub days_with_due_tasks: u32,
    pub total_days: u32,
    pub points_per_day: i64,
    pub score: i64,
}

/// Walks every day of the task window and awards points per complete day.
pub struct TaskCompletionScorer {
    points_per_day: i64,
}

impl TaskCompletionScorer {
    pub fn new(points_per_day: i64) -> Self {
        Self { points_per_day }
    }

    pub fn score(
        &self,
        window: &CycleWindow,
        tasks: &[Task],
        completions: &CompletionIndex,
    ) -> TaskCalculation {
        let aggregator = DailyCompletionAggregator::new(tasks, completions);
        let mut days_completed = 0;
        let mut days_with_due_tasks = 0;

        for date in window.days() {
            let day = aggregator.evaluate(date);
            if day.has_due_tasks() {
                days_with_due_tasks += 1;
            }
            if day.complete {
                days_completed += 1;
            }
        }

        TaskCalculation {
            days_completed,
            days_with_due_tasks,
            total_days: window.total_days(),
            points_per_day: self.points_per_day,
            score: i64::from(days_completed).saturating_mul(self.points_per_day),
        }
    }

    /// Zero-valued result used when the task data could not be fetched.
    pub fn unavailable(&self, window: &CycleWindow) -> TaskCalculation {
        TaskCalculation {
            total_days: window.total_days(),
            points_per_day: self.points_per_day,
            ..TaskCalculation::default()
        }
    }
}
