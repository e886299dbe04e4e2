use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, warn};

use super::repository::SettingsStore;

/// Weights, thresholds and cycle lengths driving the health score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthSettings {
    pub top_rated_threshold: i64,
    pub average_threshold: i64,
    pub task_points_per_day: i64,
    pub task_cycle_months: u32,
    pub task_cycle_offset_days: u32,
    pub hours_points_per_month: i64,
    pub expected_hours_per_day: f64,
    pub working_days_per_week: u32,
    pub hr_cycle_months: u32,
    pub error_high_deduction: i64,
    pub error_medium_deduction: i64,
    pub error_low_deduction: i64,
    pub appreciation_bonus: i64,
    pub attendance_deduction: i64,
    pub max_absences_per_month: u32,
    pub data_cycle_months: u32,
    /// Configured but never applied to the health score.
    pub warning_letter_deduction: i64,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            top_rated_threshold: 300,
            average_threshold: 200,
            task_points_per_day: 2,
            task_cycle_months: 3,
            task_cycle_offset_days: 2,
            hours_points_per_month: 8,
            expected_hours_per_day: 8.0,
            working_days_per_week: 6,
            hr_cycle_months: 3,
            error_high_deduction: 15,
            error_medium_deduction: 8,
            error_low_deduction: 3,
            appreciation_bonus: 5,
            attendance_deduction: 5,
            max_absences_per_month: 2,
            data_cycle_months: 3,
            warning_letter_deduction: 10,
        }
    }
}

/// Raw key/value pair as kept by the settings store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingEntry {
    pub key: String,
    pub value: Value,
}

impl SettingEntry {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

const MAX_THRESHOLD: i64 = 1_000_000;
const MAX_POINTS: i64 = 10_000;
const MAX_CYCLE_MONTHS: u32 = 24;
const MAX_OFFSET_DAYS: u32 = 366;
const MAX_ABSENCES: u32 = 31;

/// A settings entry that was rejected and replaced by its default.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("setting '{key}' has unusable value {value}")]
    Invalid { key: String, value: Value },
    #[error("average_threshold {average} exceeds top_rated_threshold {top_rated}")]
    ThresholdOrder { average: i64, top_rated: i64 },
}

impl HealthSettings {
    /// Applies stored entries over the defaults.
    ///
    /// Unknown keys are ignored, unusable values keep the default and are
    /// reported back. Inverted rating thresholds reset both to defaults.
    pub fn from_entries<I>(entries: I) -> (Self, Vec<SettingsError>)
    where
        I: IntoIterator<Item = SettingEntry>,
    {
        let mut settings = Self::default();
        let mut rejected = Vec::new();

        for entry in entries {
            if let Err(error) = settings.apply(&entry) {
                rejected.push(error);
            }
        }

        if settings.average_threshold > settings.top_rated_threshold {
            rejected.push(SettingsError::ThresholdOrder {
                average: settings.average_threshold,
                top_rated: settings.top_rated_threshold,
            });
            let defaults = Self::default();
            settings.average_threshold = defaults.average_threshold;
            settings.top_rated_threshold = defaults.top_rated_threshold;
        }

        (settings, rejected)
    }

    fn apply(&mut self, entry: &SettingEntry) -> Result<(), SettingsError> {
        let invalid = || SettingsError::Invalid {
            key: entry.key.clone(),
            value: entry.value.clone(),
        };
        let threshold = || {
            as_i64(&entry.value)
                .filter(|value| (-MAX_THRESHOLD..=MAX_THRESHOLD).contains(value))
                .ok_or_else(invalid)
        };
        let points = || {
            as_i64(&entry.value)
                .filter(|value| (0..=MAX_POINTS).contains(value))
                .ok_or_else(invalid)
        };
        let months = || {
            as_u32(&entry.value)
                .filter(|value| (1..=MAX_CYCLE_MONTHS).contains(value))
                .ok_or_else(invalid)
        };
        let count = |max: u32| as_u32(&entry.value).filter(|value| *value <= max).ok_or_else(invalid);

        match entry.key.trim() {
            "top_rated_threshold" => self.top_rated_threshold = threshold()?,
            "average_threshold" => self.average_threshold = threshold()?,
            "task_points_per_day" => self.task_points_per_day = points()?,
            "task_cycle_months" => self.task_cycle_months = months()?,
            "task_cycle_offset_days" => self.task_cycle_offset_days = count(MAX_OFFSET_DAYS)?,
            "hours_points_per_month" => self.hours_points_per_month = points()?,
            "expected_hours_per_day" => {
                self.expected_hours_per_day = as_f64(&entry.value)
                    .filter(|hours| *hours > 0.0 && *hours <= 24.0)
                    .ok_or_else(invalid)?
            }
            "working_days_per_week" => {
                self.working_days_per_week = as_u32(&entry.value)
                    .filter(|days| (1..=7).contains(days))
                    .ok_or_else(invalid)?
            }
            "hr_cycle_months" => self.hr_cycle_months = months()?,
            "error_high_deduction" => self.error_high_deduction = points()?,
            "error_medium_deduction" => self.error_medium_deduction = points()?,
            "error_low_deduction" => self.error_low_deduction = points()?,
            "appreciation_bonus" => self.appreciation_bonus = points()?,
            "attendance_deduction" => self.attendance_deduction = points()?,
            "max_absences_per_month" => self.max_absences_per_month = count(MAX_ABSENCES)?,
            "data_cycle_months" => self.data_cycle_months = months()?,
            "warning_letter_deduction" => self.warning_letter_deduction = points()?,
            other => debug!(key = other, "ignoring unknown health setting"),
        }

        Ok(())
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|number| number.is_finite())
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            }),
        Value::String(raw) => raw.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn as_u32(value: &Value) -> Option<u32> {
    as_i64(value).and_then(|number| u32::try_from(number).ok())
}

/// Immutable settings shared by every branch of one scoring call.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsSnapshot(Arc<HealthSettings>);

impl SettingsSnapshot {
    pub fn new(settings: HealthSettings) -> Self {
        Self(Arc::new(settings))
    }

    /// Reads the store once; any failure falls back to the documented defaults.
    pub async fn load<S>(store: &S) -> Self
    where
        S: SettingsStore + ?Sized,
    {
        match store.health_settings().await {
            Ok(entries) => {
                let (settings, rejected) = HealthSettings::from_entries(entries);
                for error in &rejected {
                    warn!(%error, "health setting replaced by default");
                }
                Self::new(settings)
            }
            Err(error) => {
                warn!(%error, "health settings unavailable, using defaults");
                Self::default()
            }
        }
    }
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self::new(HealthSettings::default())
    }
}

impl Deref for SettingsSnapshot {
    type Target = HealthSettings;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
