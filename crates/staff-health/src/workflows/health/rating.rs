use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::fmt;

use super::completion::TaskCalculation;
use super::conduct::{AppreciationCalculation, ErrorCalculation};
use super::cycles::HealthCycles;
use super::domain::EmployeeId;
use super::hours::{AttendanceCalculation, HoursCalculation};
use super::settings::HealthSettings;

/// Qualitative band derived from the health score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthRating {
    TopRated,
    Average,
    BelowStandard,
}

impl HealthRating {
    /// Inclusive lower bounds, checked from the top band down.
    pub fn classify(score: i64, settings: &HealthSettings) -> Self {
        if score >= settings.top_rated_threshold {
            Self::TopRated
        } else if score >= settings.average_threshold {
            Self::Average
        } else {
            Self::BelowStandard
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::TopRated => "TOP RATED",
            Self::Average => "AVERAGE",
            Self::BelowStandard => "BELOW STANDARD",
        }
    }

    pub const fn color(self) -> &'static str {
        match self {
            Self::TopRated => "#16a34a",
            Self::Average => "#f59e0b",
            Self::BelowStandard => "#dc2626",
        }
    }
}

impl fmt::Display for HealthRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for HealthRating {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

/// Score component whose data source can fail independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Tasks,
    Hours,
    Attendance,
    Errors,
    Appreciations,
}

impl ScoreSource {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Hours => "hours",
            Self::Attendance => "attendance",
            Self::Errors => "errors",
            Self::Appreciations => "appreciations",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScoreCalculations {
    pub task: TaskCalculation,
    pub hours: HoursCalculation,
    pub attendance: AttendanceCalculation,
    pub errors: ErrorCalculation,
    pub appreciations: AppreciationCalculation,
    /// Reported for visibility only; it does not take part in the sum.
    pub unapplied_warning_letter_deduction: i64,
}

impl HealthScoreCalculations {
    pub fn total(&self) -> i64 {
        // TODO: warning-letter deductions are configured but never summed;
        // wire them in once HR confirms they should affect the score.
        [
            self.task.score,
            self.hours.score,
            self.errors.score,
            self.appreciations.score,
            self.attendance.score,
        ]
        .into_iter()
        .fold(0, i64::saturating_add)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScoreResult {
    pub employee_id: EmployeeId,
    pub reference_date: NaiveDate,
    pub health_score: i64,
    pub rating: HealthRating,
    pub rating_color: &'static str,
    pub calculations: HealthScoreCalculations,
    pub cycles: HealthCycles,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded_sources: Vec<ScoreSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl HealthScoreResult {
    /// Sums the components and assigns the rating band.
    pub fn aggregate(
        employee_id: EmployeeId,
        reference_date: NaiveDate,
        calculations: HealthScoreCalculations,
        cycles: HealthCycles,
        degraded_sources: Vec<ScoreSource>,
        settings: &HealthSettings,
    ) -> Self {
        let health_score = calculations.total();
        let rating = HealthRating::classify(health_score, settings);

        Self {
            employee_id,
            reference_date,
            health_score,
            rating,
            rating_color: rating.color(),
            calculations,
            cycles,
            degraded_sources,
            message: None,
        }
    }

    /// Zero-filled result for the administrator account.
    pub fn admin(employee_id: EmployeeId, reference_date: NaiveDate, cycles: HealthCycles) -> Self {
        let rating = HealthRating::BelowStandard;
        Self {
            employee_id,
            reference_date,
            health_score: 0,
            rating,
            rating_color: rating.color(),
            calculations: HealthScoreCalculations::default(),
            cycles,
            degraded_sources: Vec::new(),
            message: Some("Health score is not tracked for the administrator account".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_inclusive_lower_bounds() {
        let settings = HealthSettings::default();
        assert_eq!(HealthRating::classify(300, &settings), HealthRating::TopRated);
        assert_eq!(HealthRating::classify(299, &settings), HealthRating::Average);
        assert_eq!(HealthRating::classify(200, &settings), HealthRating::Average);
        assert_eq!(HealthRating::classify(199, &settings), HealthRating::BelowStandard);
        assert_eq!(HealthRating::classify(-40, &settings), HealthRating::BelowStandard);
    }

    #[test]
    fn equal_thresholds_skip_the_average_band() {
        let settings = HealthSettings {
            top_rated_threshold: 250,
            average_threshold: 250,
            ..HealthSettings::default()
        };
        assert_eq!(HealthRating::classify(250, &settings), HealthRating::TopRated);
        assert_eq!(HealthRating::classify(249, &settings), HealthRating::BelowStandard);
    }

    #[test]
    fn total_ignores_warning_letters() {
        let calculations = HealthScoreCalculations {
            task: TaskCalculation {
                score: 120,
                ..TaskCalculation::default()
            },
            hours: HoursCalculation {
                score: 16,
                ..HoursCalculation::default()
            },
            attendance: AttendanceCalculation {
                score: -5,
                ..AttendanceCalculation::default()
            },
            errors: ErrorCalculation {
                score: -53,
                ..ErrorCalculation::default()
            },
            appreciations: AppreciationCalculation {
                score: 10,
                ..AppreciationCalculation::default()
            },
            unapplied_warning_letter_deduction: 10,
        };
        assert_eq!(calculations.total(), 88);
    }

    #[test]
    fn rating_serializes_as_label() {
        let json = serde_json::to_value(HealthRating::TopRated).expect("serializes");
        assert_eq!(json, serde_json::json!("TOP RATED"));
    }
}
