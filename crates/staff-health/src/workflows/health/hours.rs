use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;

use super::domain::{Employee, MonthKey, MonthlyHours, MonthlyPresence};
use super::settings::HealthSettings;

const HOURS_TOLERANCE: f64 = 1e-9;

/// Counts working days in `month`, treating the first `working_days_per_week`
/// days of a Monday-first week as working days.
pub fn working_days_in_month(month: MonthKey, working_days_per_week: u32) -> u32 {
    let (Some(first), Some(last)) = (month.first_day(), month.last_day()) else {
        return 0;
    };

    first
        .iter_days()
        .take_while(|day| *day <= last)
        .filter(|day| is_working_day(*day, working_days_per_week))
        .count() as u32
}

fn is_working_day(day: NaiveDate, working_days_per_week: u32) -> bool {
    day.weekday().num_days_from_monday() < working_days_per_week
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthHours {
    pub month: MonthKey,
    pub working_days: u32,
    pub required_hours: f64,
    pub provided_hours: f64,
    pub points: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoursCalculation {
    pub months: Vec<MonthHours>,
    pub total_required_hours: f64,
    pub total_provided_hours: f64,
    pub points_per_month: i64,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthAttendance {
    pub month: MonthKey,
    pub required_days: u32,
    pub days_present: u32,
    pub absences: u32,
    pub deduction: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceCalculation {
    pub months: Vec<MonthAttendance>,
    pub max_absences_per_month: u32,
    pub deduction_per_month: i64,
    pub score: i64,
}

/// Required-versus-provided hours and absence penalties per HR month.
pub struct HoursAttendanceScorer<'a> {
    settings: &'a HealthSettings,
}

impl<'a> HoursAttendanceScorer<'a> {
    pub fn new(settings: &'a HealthSettings) -> Self {
        Self { settings }
    }

    fn working_days(&self, month: MonthKey) -> u32 {
        working_days_in_month(month, self.settings.working_days_per_week)
    }

    /// Awards `hours_points_per_month` for every month whose provided hours
    /// reach the required hours.
    pub fn score_hours(
        &self,
        months: &[MonthKey],
        employee: &Employee,
        worked: &[MonthlyHours],
    ) -> HoursCalculation {
        let hours_per_day = employee
            .expected_hours_per_day
            .filter(|hours| *hours > 0.0)
            .unwrap_or(self.settings.expected_hours_per_day);
        let provided_by_month: HashMap<MonthKey, f64> =
            worked.iter().fold(HashMap::new(), |mut acc, entry| {
                *acc.entry(entry.month).or_insert(0.0) += entry.hours();
                acc
            });

        let mut calculation = HoursCalculation {
            points_per_month: self.settings.hours_points_per_month,
            ..HoursCalculation::default()
        };

        for month in months {
            let working_days = self.working_days(*month);
            let required_hours = f64::from(working_days) * hours_per_day;
            let provided_hours = provided_by_month.get(month).copied().unwrap_or(0.0);
            let points = if provided_hours + HOURS_TOLERANCE >= required_hours {
                self.settings.hours_points_per_month
            } else {
                0
            };

            calculation.total_required_hours += required_hours;
            calculation.total_provided_hours += provided_hours;
            calculation.score += points;
            calculation.months.push(MonthHours {
                month: *month,
                working_days,
                required_hours,
                provided_hours,
                points,
            });
        }

        calculation
    }

    /// Deducts `attendance_deduction` once for each month whose absences
    /// exceed `max_absences_per_month`.
    pub fn score_attendance(
        &self,
        months: &[MonthKey],
        presence: &[MonthlyPresence],
    ) -> AttendanceCalculation {
        let present_by_month: HashMap<MonthKey, u32> =
            presence.iter().fold(HashMap::new(), |mut acc, entry| {
                *acc.entry(entry.month).or_insert(0) += entry.days_present;
                acc
            });

        let mut calculation = AttendanceCalculation {
            max_absences_per_month: self.settings.max_absences_per_month,
            deduction_per_month: self.settings.attendance_deduction,
            ..AttendanceCalculation::default()
        };
        let mut total_deduction = 0;

        for month in months {
            let required_days = self.working_days(*month);
            let days_present = present_by_month.get(month).copied().unwrap_or(0);
            let absences = required_days.saturating_sub(days_present);
            let deduction = if absences > self.settings.max_absences_per_month {
                self.settings.attendance_deduction
            } else {
                0
            };

            total_deduction += deduction;
            calculation.months.push(MonthAttendance {
                month: *month,
                required_days,
                days_present,
                absences,
                deduction,
            });
        }

        calculation.score = -total_deduction;
        calculation
    }
}
