use chrono::{Days, Months, NaiveDate};
use serde::Serialize;

use super::domain::MonthKey;
use super::settings::HealthSettings;

/// Closed date range; both `start` and `end` are part of the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CycleWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of calendar days in the window, zero when it is inverted.
    pub fn total_days(&self) -> u32 {
        if self.end < self.start {
            return 0;
        }
        ((self.end - self.start).num_days() + 1) as u32
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

/// The three independent evaluation windows of one scoring call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthCycles {
    pub hr: CycleWindow,
    pub data: CycleWindow,
    pub task: CycleWindow,
}

/// Derives the rolling windows from a reference date.
///
/// Month arithmetic clamps to the end of shorter months, so 31 May minus
/// three months lands on 28/29 February.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleWindowCalculator {
    hr_cycle_months: u32,
    data_cycle_months: u32,
    task_cycle_months: u32,
    task_cycle_offset_days: u32,
}

impl CycleWindowCalculator {
    pub fn from_settings(settings: &HealthSettings) -> Self {
        Self {
            hr_cycle_months: settings.hr_cycle_months,
            data_cycle_months: settings.data_cycle_months,
            task_cycle_months: settings.task_cycle_months,
            task_cycle_offset_days: settings.task_cycle_offset_days,
        }
    }

    pub fn compute(&self, reference: NaiveDate) -> HealthCycles {
        HealthCycles {
            hr: self.hr_window(reference),
            data: self.data_window(reference),
            task: self.task_window(reference),
        }
    }

    /// From the first day of the month `hr_cycle_months` back, up to the reference date.
    pub fn hr_window(&self, reference: NaiveDate) -> CycleWindow {
        let start = MonthKey::of(reference)
            .months_before(self.hr_cycle_months)
            .and_then(|month| month.first_day())
            .unwrap_or(NaiveDate::MIN);
        CycleWindow::new(start, reference)
    }

    /// Calendar months scored for hours and attendance: complete months from the HR start.
    pub fn hr_months(&self, reference: NaiveDate) -> Vec<MonthKey> {
        MonthKey::of(self.hr_window(reference).start).run(self.hr_cycle_months)
    }

    /// `data_cycle_months` back from the reference date through the following day.
    pub fn data_window(&self, reference: NaiveDate) -> CycleWindow {
        let start = months_back(reference, self.data_cycle_months);
        let end = reference
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDate::MAX);
        CycleWindow::new(start, end)
    }

    /// Ends `task_cycle_offset_days` before the reference date so fresh tasks are not penalised.
    pub fn task_window(&self, reference: NaiveDate) -> CycleWindow {
        let end = reference
            .checked_sub_days(Days::new(u64::from(self.task_cycle_offset_days)))
            .unwrap_or(NaiveDate::MIN);
        let start = months_back(end, self.task_cycle_months);
        CycleWindow::new(start, end)
    }
}

fn months_back(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}
