//! Recurrence inference for free-text tasks.
//!
//! Tasks carry no recurrence field. Whether a task is a Daily, Weekly or
//! Monthly obligation is read from its title and labels, and the rules below
//! are evaluated in table order so the first rule due on the date wins. The
//! matching is a heuristic over user-entered text and will misfire on titles
//! that mention the marker words incidentally.

use chrono::{Datelike, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Days of the month a monthly task may be scheduled on.
pub const MONTHLY_DUE_DAYS: [u32; 6] = [5, 10, 15, 20, 25, 30];

const WEEKDAYS: [(Weekday, &str); 7] = [
    (Weekday::Mon, "monday"),
    (Weekday::Tue, "tuesday"),
    (Weekday::Wed, "wednesday"),
    (Weekday::Thu, "thursday"),
    (Weekday::Fri, "friday"),
    (Weekday::Sat, "saturday"),
    (Weekday::Sun, "sunday"),
];

static WEEKDAY_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\(\s*(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\s*\)")
        .expect("weekday tag pattern compiles")
});

static MONTH_DAY_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\s*(\d{1,2})\s+of\s+month\s*\)").expect("month tag pattern compiles"));

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("digit pattern compiles"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceType {
    Daily,
    Weekly,
    Monthly,
    None,
}

impl RecurrenceType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::None => "None",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub recurrence: RecurrenceType,
    pub due_on_date: bool,
}

impl Classification {
    const NOT_RECURRING: Self = Self {
        recurrence: RecurrenceType::None,
        due_on_date: false,
    };
}

/// Lower-cased view of a task's text fields.
struct TaskText {
    title: String,
    labels: String,
}

impl TaskText {
    fn new(title: &str, labels: &str) -> Self {
        Self {
            title: title.to_lowercase(),
            labels: labels.to_lowercase(),
        }
    }

    fn mentions(&self, marker: &str) -> bool {
        self.title.contains(marker) || self.labels.contains(marker)
    }

    fn weekday_tags(&self) -> impl Iterator<Item = &str> + '_ {
        WEEKDAY_TAG
            .captures_iter(&self.title)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
    }

    fn month_day_tags(&self) -> impl Iterator<Item = u32> + '_ {
        MONTH_DAY_TAG
            .captures_iter(&self.title)
            .filter_map(|caps| caps.get(1).and_then(|m| m.as_str().parse().ok()))
    }

    fn title_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        DIGIT_RUN
            .find_iter(&self.title)
            .filter_map(|m| m.as_str().parse().ok())
    }
}

struct RecurrenceRule {
    recurrence: RecurrenceType,
    applies: fn(&TaskText) -> bool,
    due_on: fn(&TaskText, NaiveDate) -> bool,
}

const RULES: [RecurrenceRule; 3] = [
    RecurrenceRule {
        recurrence: RecurrenceType::Daily,
        applies: is_daily,
        due_on: always_due,
    },
    RecurrenceRule {
        recurrence: RecurrenceType::Weekly,
        applies: is_weekly,
        due_on: weekly_due,
    },
    RecurrenceRule {
        recurrence: RecurrenceType::Monthly,
        applies: is_monthly,
        due_on: monthly_due,
    },
];

/// Classifies a task for `date`.
///
/// The first rule in table order that is due on `date` wins. When none is
/// due, the first rule whose pattern appears at all names the recurrence and
/// the task is reported as not due.
pub fn classify(title: &str, labels: &str, date: NaiveDate) -> Classification {
    let text = TaskText::new(title, labels);

    RULES
        .iter()
        .find(|rule| (rule.applies)(&text) && (rule.due_on)(&text, date))
        .map(|rule| Classification {
            recurrence: rule.recurrence,
            due_on_date: true,
        })
        .or_else(|| {
            RULES
                .iter()
                .find(|rule| (rule.applies)(&text))
                .map(|rule| Classification {
                    recurrence: rule.recurrence,
                    due_on_date: false,
                })
        })
        .unwrap_or(Classification::NOT_RECURRING)
}

fn weekday_name(date: NaiveDate) -> &'static str {
    let weekday = date.weekday();
    WEEKDAYS
        .iter()
        .find(|(day, _)| *day == weekday)
        .map(|(_, name)| *name)
        .unwrap_or("monday")
}

fn always_due(_: &TaskText, _: NaiveDate) -> bool {
    true
}

fn is_daily(text: &TaskText) -> bool {
    text.mentions("daily")
}

fn is_weekly(text: &TaskText) -> bool {
    text.weekday_tags().next().is_some()
        || (text.mentions("weekly") && WEEKDAYS.iter().any(|(_, name)| text.title.contains(name)))
}

fn weekly_due(text: &TaskText, date: NaiveDate) -> bool {
    let today = weekday_name(date);
    text.weekday_tags().any(|tag| tag == today)
        || (text.mentions("weekly") && text.title.contains(today))
}

fn is_monthly(text: &TaskText) -> bool {
    text.month_day_tags().any(|day| MONTHLY_DUE_DAYS.contains(&day))
        || (text.mentions("monthly")
            && text.title_numbers().any(|day| MONTHLY_DUE_DAYS.contains(&day)))
}

fn monthly_due(text: &TaskText, date: NaiveDate) -> bool {
    let day = date.day();
    if !MONTHLY_DUE_DAYS.contains(&day) {
        return false;
    }
    text.month_day_tags().any(|tag| tag == day)
        || (text.mentions("monthly") && text.title_numbers().any(|number| number == day))
}
