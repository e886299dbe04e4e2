use super::common::*;
use chrono::{TimeZone, Utc};
use chrono_tz::Tz;

use crate::workflows::health::completion::{
    CompletionIndex, DailyCompletionAggregator, TaskCompletionScorer, TypeTally,
};
use crate::workflows::health::cycles::CycleWindow;
use crate::workflows::health::domain::{TaskHistoryEvent, TaskId};

fn index(events: &[TaskHistoryEvent]) -> CompletionIndex {
    CompletionIndex::from_events(events, &Tz::UTC)
}

#[test]
fn day_without_due_tasks_is_never_complete() {
    let tasks = vec![
        task("t-1", "Fix printer", "hardware"),
        task("t-2", "Report (Monday)", ""),
    ];
    let completions = index(&[completed("t-1", date(2026, 7, 7))]);
    let aggregator = DailyCompletionAggregator::new(&tasks, &completions);

    let tuesday = aggregator.evaluate(date(2026, 7, 7));

    assert!(!tuesday.has_due_tasks());
    assert!(!tuesday.complete);
}

#[test]
fn all_or_nothing_across_daily_tasks() {
    let tasks = vec![
        task("t-1", "Daily Task", ""),
        task("t-2", "Cash count", "daily-task"),
    ];
    let day = date(2026, 7, 7);
    let partial = index(&[completed("t-1", day)]);

    let result = DailyCompletionAggregator::new(&tasks, &partial).evaluate(day);
    assert_eq!(
        result.daily,
        TypeTally {
            total: 2,
            completed: 1
        }
    );
    assert!(!result.complete);

    let full = index(&[completed("t-1", day), completed("t-2", day)]);
    assert!(DailyCompletionAggregator::new(&tasks, &full)
        .evaluate(day)
        .complete);
}

#[test]
fn every_due_type_must_be_finished() {
    let tasks = vec![
        task("t-daily", "Daily Task", ""),
        task("t-weekly", "Report (Monday)", ""),
    ];
    let monday = date(2026, 7, 6);
    let completions = index(&[completed("t-daily", monday)]);
    let aggregator = DailyCompletionAggregator::new(&tasks, &completions);

    let result = aggregator.evaluate(monday);
    assert_eq!(result.weekly.total, 1);
    assert_eq!(result.weekly.completed, 0);
    assert!(!result.complete);

    // Tuesday only has the daily task due.
    let tuesday = date(2026, 7, 7);
    let completions = index(&[completed("t-daily", tuesday)]);
    assert!(DailyCompletionAggregator::new(&tasks, &completions)
        .evaluate(tuesday)
        .complete);
}

#[test]
fn completion_on_another_day_does_not_count() {
    let tasks = vec![task("t-1", "Daily Task", "")];
    let completions = index(&[completed("t-1", date(2026, 7, 6))]);
    let result = DailyCompletionAggregator::new(&tasks, &completions).evaluate(date(2026, 7, 7));
    assert!(!result.complete);
}

#[test]
fn only_completed_status_changes_are_indexed() {
    let event = TaskHistoryEvent {
        task_id: TaskId("t-1".to_string()),
        action: "status changed".to_string(),
        new_value: "In Progress".to_string(),
        timestamp: at(date(2026, 7, 7), 9),
    };
    let completions = index(&[event]);
    assert!(!completions.completed_on(&TaskId("t-1".to_string()), date(2026, 7, 7)));
}

#[test]
fn completion_day_follows_organisation_timezone() {
    let tasks = vec![task("t-1", "Daily Task", "")];
    let event = TaskHistoryEvent {
        task_id: TaskId("t-1".to_string()),
        action: TaskHistoryEvent::STATUS_CHANGED.to_string(),
        new_value: TaskHistoryEvent::COMPLETED.to_string(),
        timestamp: Utc.with_ymd_and_hms(2026, 7, 6, 20, 0, 0).unwrap(),
    };
    let completions = CompletionIndex::from_events([&event], &chrono_tz::Asia::Kolkata);
    let aggregator = DailyCompletionAggregator::new(&tasks, &completions);

    assert!(!aggregator.evaluate(date(2026, 7, 6)).complete);
    assert!(aggregator.evaluate(date(2026, 7, 7)).complete);
}

#[test]
fn daily_task_completed_on_sixty_of_ninety_days() {
    let window = CycleWindow::new(date(2026, 7, 1), date(2026, 9, 28));
    assert_eq!(window.total_days(), 90);

    let tasks = vec![task("t-daily", "Daily Task", "")];
    let events: Vec<TaskHistoryEvent> = window
        .days()
        .take(60)
        .map(|day| completed("t-daily", day))
        .collect();
    let result = TaskCompletionScorer::new(2).score(&window, &tasks, &index(&events));

    assert_eq!(result.days_completed, 60);
    assert_eq!(result.days_with_due_tasks, 90);
    assert_eq!(result.total_days, 90);
    assert_eq!(result.score, 120);
}

#[test]
fn weekly_task_completed_on_ten_of_thirteen_mondays() {
    let window = CycleWindow::new(date(2026, 7, 6), date(2026, 9, 28));
    let tasks = vec![task("t-report", "Report (Monday)", "")];
    let mondays: Vec<_> = window.days().step_by(7).collect();
    assert_eq!(mondays.len(), 13);

    let events: Vec<TaskHistoryEvent> = mondays
        .iter()
        .take(10)
        .map(|day| completed("t-report", *day))
        .collect();
    let result = TaskCompletionScorer::new(2).score(&window, &tasks, &index(&events));

    assert_eq!(result.days_with_due_tasks, 13);
    assert_eq!(result.days_completed, 10);
    assert_eq!(result.score, 20);
}

#[test]
fn monthly_task_counts_only_on_its_day() {
    let window = CycleWindow::new(date(2026, 7, 1), date(2026, 9, 30));
    let tasks = vec![task("t-payroll", "Payroll review (15 of month)", "")];
    let events = vec![
        completed("t-payroll", date(2026, 7, 15)),
        completed("t-payroll", date(2026, 8, 14)),
        completed("t-payroll", date(2026, 9, 15)),
    ];
    let result = TaskCompletionScorer::new(2).score(&window, &tasks, &index(&events));

    assert_eq!(result.days_with_due_tasks, 3);
    assert_eq!(result.days_completed, 2);
}

#[test]
fn unavailable_result_keeps_window_length() {
    let window = CycleWindow::new(date(2026, 7, 1), date(2026, 7, 31));
    let result = TaskCompletionScorer::new(2).unavailable(&window);
    assert_eq!(result.total_days, 31);
    assert_eq!(result.days_completed, 0);
    assert_eq!(result.score, 0);
}

#[test]
fn oversized_points_saturate_instead_of_overflowing() {
    let window = CycleWindow::new(date(2026, 7, 1), date(2026, 7, 3));
    let tasks = vec![task("t-daily", "Daily Task", "")];
    let events: Vec<_> = window.days().map(|day| completed("t-daily", day)).collect();

    let result = TaskCompletionScorer::new(i64::MAX).score(&window, &tasks, &index(&events));

    assert_eq!(result.days_completed, 3);
    assert_eq!(result.score, i64::MAX);
}
