use serde::Serialize;

use super::domain::{ErrorCounts, ErrorSeverity};
use super::settings::HealthSettings;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorCalculation {
    pub high: u32,
    pub medium: u32,
    pub low: u32,
    pub score: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppreciationCalculation {
    pub count: u32,
    pub bonus_per_appreciation: i64,
    pub score: i64,
}

/// Severity-weighted error deductions and appreciation bonuses.
pub struct ErrorAppreciationScorer<'a> {
    settings: &'a HealthSettings,
}

impl<'a> ErrorAppreciationScorer<'a> {
    pub fn new(settings: &'a HealthSettings) -> Self {
        Self { settings }
    }

    pub fn deduction_for(&self, severity: ErrorSeverity) -> i64 {
        match severity {
            ErrorSeverity::High => self.settings.error_high_deduction,
            ErrorSeverity::Medium => self.settings.error_medium_deduction,
            ErrorSeverity::Low => self.settings.error_low_deduction,
        }
    }

    pub fn score_errors(&self, counts: ErrorCounts) -> ErrorCalculation {
        let deduction = [
            (counts.high, ErrorSeverity::High),
            (counts.medium, ErrorSeverity::Medium),
            (counts.low, ErrorSeverity::Low),
        ]
        .into_iter()
        .fold(0i64, |total, (count, severity)| {
            total.saturating_add(i64::from(count).saturating_mul(self.deduction_for(severity)))
        });

        ErrorCalculation {
            high: counts.high,
            medium: counts.medium,
            low: counts.low,
            score: deduction.saturating_neg(),
        }
    }

    pub fn score_appreciations(&self, count: u32) -> AppreciationCalculation {
        AppreciationCalculation {
            count,
            bonus_per_appreciation: self.settings.appreciation_bonus,
            score: i64::from(count).saturating_mul(self.settings.appreciation_bonus),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_high_and_one_medium_with_defaults() {
        let settings = HealthSettings::default();
        let scorer = ErrorAppreciationScorer::new(&settings);
        let result = scorer.score_errors(ErrorCounts {
            high: 3,
            medium: 1,
            low: 0,
        });
        assert_eq!(result.score, -53);
    }

    #[test]
    fn low_errors_and_appreciations_use_configured_weights() {
        let settings = HealthSettings {
            error_low_deduction: 4,
            appreciation_bonus: 7,
            ..HealthSettings::default()
        };
        let scorer = ErrorAppreciationScorer::new(&settings);
        assert_eq!(
            scorer
                .score_errors(ErrorCounts {
                    high: 0,
                    medium: 0,
                    low: 2
                })
                .score,
            -8
        );
        assert_eq!(scorer.score_appreciations(3).score, 21);
        assert_eq!(scorer.score_appreciations(0).score, 0);
    }

    #[test]
    fn extreme_weights_saturate() {
        let settings = HealthSettings {
            error_high_deduction: i64::MAX,
            appreciation_bonus: i64::MAX,
            ..HealthSettings::default()
        };
        let scorer = ErrorAppreciationScorer::new(&settings);
        let errors = scorer.score_errors(ErrorCounts {
            high: u32::MAX,
            medium: u32::MAX,
            low: 0,
        });

        assert_eq!(errors.score, -i64::MAX);
        assert_eq!(scorer.score_appreciations(2).score, i64::MAX);
    }
}
