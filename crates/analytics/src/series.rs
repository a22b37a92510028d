//! Chart-ready projections of aggregated results.
//!
//! Series carry labels and raw values only; colours, formatting and rounding
//! belong to whatever draws them. Identical input always yields identical,
//! identically ordered output.

use crate::aggregate::{self, HUNDRED};
use crate::error::AnalyticsError;
use chrono::{DateTime, Utc};
use core_types::{HistoryPoint, ReviewReport, Strategy};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: Decimal,
}

/// One value per category, for pie and bar charts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategorySeries {
    pub points: Vec<SeriesPoint>,
}

impl CategorySeries {
    pub fn new(points: Vec<SeriesPoint>) -> Self {
        Self { points }
    }

    /// Drops categories whose value is zero.
    pub fn non_zero(mut self) -> Self {
        self.points.retain(|p| !p.value.is_zero());
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.label.as_str()).collect()
    }

    pub fn values(&self) -> Vec<Decimal> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn total(&self) -> Decimal {
        aggregate::total(self.points.iter().map(|p| p.value))
    }
}

/// Builds a category series in the order the items are given.
pub fn category<'a, T: 'a, I>(
    items: I,
    label: impl Fn(&T) -> String,
    value: impl Fn(&T) -> Decimal,
) -> CategorySeries
where
    I: IntoIterator<Item = &'a T>,
{
    CategorySeries::new(
        items
            .into_iter()
            .map(|item| SeriesPoint {
                label: label(item),
                value: value(item),
            })
            .collect(),
    )
}

/// One point per enum value, in the enumeration's declared order, zeros included.
pub fn bucket_counts<K>(counts: &BTreeMap<K, usize>, all: &[K]) -> CategorySeries
where
    K: Ord + Display,
{
    CategorySeries::new(
        all.iter()
            .map(|k| SeriesPoint {
                label: k.to_string(),
                value: Decimal::from(counts.get(k).copied().unwrap_or(0)),
            })
            .collect(),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub name: String,
    pub values: Vec<Decimal>,
}

/// Several metrics over one shared category axis.
///
/// `metrics[m].values[i]` always belongs to `categories[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MultiSeries {
    pub categories: Vec<String>,
    pub metrics: Vec<Metric>,
}

impl MultiSeries {
    pub fn metric(&self, name: &str) -> Option<&[Decimal]> {
        self.metrics
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.values.as_slice())
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// A metric extractor for [`multi`].
pub type MetricFn<T> = (&'static str, fn(&T) -> Decimal);

pub fn multi<'a, T: 'a, I>(
    items: I,
    label: impl Fn(&T) -> String,
    metrics: &[MetricFn<T>],
) -> MultiSeries
where
    I: IntoIterator<Item = &'a T>,
{
    let items: Vec<&T> = items.into_iter().collect();
    MultiSeries {
        categories: items.iter().map(|item| label(*item)).collect(),
        metrics: metrics
            .iter()
            .map(|(name, extract)| Metric {
                name: (*name).to_string(),
                values: items.iter().map(|item| extract(*item)).collect(),
            })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimePoint {
    pub timestamp: DateTime<Utc>,
    pub value: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    pub points: Vec<TimePoint>,
}

/// A time-ordered series from an external history source.
///
/// `None` means no source is configured, which is reported as an error rather
/// than papered over with made-up points.
pub fn time_series(history: Option<&[HistoryPoint]>) -> Result<TimeSeries, AnalyticsError> {
    let history = history.ok_or(AnalyticsError::NoHistorySource)?;
    let mut points: Vec<TimePoint> = history
        .iter()
        .map(|p| TimePoint {
            timestamp: p.timestamp,
            value: p.value.value(),
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);
    Ok(TimeSeries { points })
}

/// A time series that may be unavailable, in a form that can be serialized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Trend {
    Available(TimeSeries),
    Unavailable { reason: String },
}

impl From<Result<TimeSeries, AnalyticsError>> for Trend {
    fn from(result: Result<TimeSeries, AnalyticsError>) -> Self {
        match result {
            Ok(series) => Trend::Available(series),
            Err(e) => Trend::Unavailable {
                reason: e.to_string(),
            },
        }
    }
}

fn clamp_percent(value: Decimal) -> Decimal {
    value.clamp(Decimal::ZERO, HUNDRED)
}

/// A radar-style profile of one strategy, every axis scaled into 0-100.
pub fn strategy_profile(strategy: &Strategy) -> CategorySeries {
    let usage = Decimal::from(strategy.usage_count);
    let success_base = Decimal::from(strategy.usage_count.max(1));
    let return_pct = aggregate::mul(strategy.total_return.value(), HUNDRED);
    let sharpe = aggregate::add(strategy.sharpe_ratio.value(), Decimal::TWO);
    let axes = [
        ("return", aggregate::add(return_pct, Decimal::from(50))),
        ("win_rate", strategy.win_rate.value()),
        ("sharpe", aggregate::mul(sharpe, Decimal::from(20))),
        ("usage", usage),
        ("success", aggregate::percent_of(Decimal::from(strategy.success_count), success_base)),
        ("score", aggregate::mul(strategy.score.value(), Decimal::TEN)),
    ];
    CategorySeries::new(
        axes.into_iter()
            .map(|(label, value)| SeriesPoint {
                label: label.to_string(),
                value: clamp_percent(value),
            })
            .collect(),
    )
}

/// The most recent `limit` reports as a series running oldest to newest.
///
/// Reports without a date sort before every dated report, so they are the
/// first to fall outside the window.
pub fn report_trend(reports: &[ReviewReport], limit: usize) -> MultiSeries {
    let mut newest_first: Vec<&ReviewReport> = reports.iter().collect();
    // Stable: same-day reports keep their backend order.
    newest_first.sort_by(|a, b| b.report_date.cmp(&a.report_date));
    newest_first.truncate(limit);
    newest_first.reverse();

    let metrics: [MetricFn<ReviewReport>; 3] = [
        ("return_pct", |r| aggregate::mul(r.total_return.value(), HUNDRED)),
        ("win_rate", |r| r.win_rate.value()),
        ("trade_count", |r| Decimal::from(r.trade_count)),
    ];
    multi(
        newest_first,
        |r: &ReviewReport| match r.report_date {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => "-".to_string(),
        },
        &metrics,
    )
}
