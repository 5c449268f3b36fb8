use std::hash::Hash;

use indexmap::IndexMap;
use serde::Serialize;

use crate::models::AttendanceStatus;
use crate::rounding::{average_text, percentage_text, round_half_away, AVERAGE_PLACES};

/// A closed enumeration that categorical summaries count over.
pub trait Category: Copy + Eq + Hash + 'static {
    const ALL: &'static [Self];

    fn label(self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericSummary {
    pub count: usize,
    pub sum: f64,
    pub average: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    count: usize,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl Accumulator {
    fn push(self, value: f64) -> Self {
        Self {
            count: self.count + 1,
            sum: self.sum + value,
            min: Some(self.min.map_or(value, |min| min.min(value))),
            max: Some(self.max.map_or(value, |max| max.max(value))),
        }
    }

    fn finish(self) -> NumericSummary {
        NumericSummary {
            count: self.count,
            sum: round_half_away(self.sum, AVERAGE_PLACES),
            average: average_text(self.sum, self.count),
            min: self.min.unwrap_or(0.0),
            max: self.max.unwrap_or(0.0),
        }
    }
}

/// Count, sum, two-decimal average, min and max. Empty input yields zeros.
pub fn summarize<I>(values: I) -> NumericSummary
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .fold(Accumulator::default(), Accumulator::push)
        .finish()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub count: usize,
    pub percentage: String,
}

/// Occurrence counts for every member of a category enumeration, listed in
/// declaration order, including members that never occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoricalSummary {
    pub total: usize,
    pub categories: IndexMap<&'static str, CategoryStat>,
}

impl CategoricalSummary {
    pub fn count<C: Category>(&self, category: C) -> usize {
        self.categories
            .get(category.label())
            .map_or(0, |stat| stat.count)
    }
}

pub fn summarize_categorical<'a, T, C, I, F>(records: I, category_of: F) -> CategoricalSummary
where
    T: 'a,
    C: Category,
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> C,
{
    let mut counts: IndexMap<C, usize> = C::ALL.iter().map(|&category| (category, 0)).collect();
    let mut total = 0usize;
    for record in records {
        *counts.entry(category_of(record)).or_insert(0) += 1;
        total += 1;
    }

    let categories = counts
        .into_iter()
        .map(|(category, count)| {
            (
                category.label(),
                CategoryStat {
                    count,
                    percentage: percentage_text(count, total),
                },
            )
        })
        .collect();

    CategoricalSummary { total, categories }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRates {
    pub attendance_percentage: String,
    pub absent_percentage: String,
}

/// Present share and absence share (sick, excused, absent) of all marks.
/// Computed from raw counts, not from the rounded per-status percentages.
pub fn attendance_rates(summary: &CategoricalSummary) -> AttendanceRates {
    let present = summary.count(AttendanceStatus::Present);
    let absent: usize = AttendanceStatus::ALL
        .iter()
        .filter(|status| status.is_absence())
        .map(|&status| summary.count(status))
        .sum();

    AttendanceRates {
        attendance_percentage: percentage_text(present, summary.total),
        absent_percentage: percentage_text(absent, summary.total),
    }
}
