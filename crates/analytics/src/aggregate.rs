//! Aggregation primitives.
//!
//! Every function here is total: empty input, zero denominators, missing
//! values and results outside `Decimal`'s range all produce a number (usually
//! zero), never a panic or a NaN.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

pub const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Counts records per key. Records whose key is `None` are left out of every bucket.
pub fn count_by<T, K, F>(items: &[T], key: F) -> BTreeMap<K, usize>
where
    K: Ord,
    F: Fn(&T) -> Option<K>,
{
    let mut counts = BTreeMap::new();
    for item in items {
        if let Some(k) = key(item) {
            *counts.entry(k).or_insert(0) += 1;
        }
    }
    counts
}

/// Counts records matching a predicate.
pub fn count_where<T>(items: &[T], predicate: impl Fn(&T) -> bool) -> usize {
    items.iter().filter(|item| predicate(item)).count()
}

/// Treats a result outside `Decimal`'s range like malformed input: zero.
fn or_zero(result: Option<Decimal>, op: &'static str) -> Decimal {
    result.unwrap_or_else(|| {
        tracing::debug!(op, "Decimal overflow, treating the result as zero.");
        Decimal::ZERO
    })
}

pub fn add(a: Decimal, b: Decimal) -> Decimal {
    or_zero(a.checked_add(b), "add")
}

pub fn mul(a: Decimal, b: Decimal) -> Decimal {
    or_zero(a.checked_mul(b), "mul")
}

/// `a / b`, zero when `b` is zero or the quotient does not fit.
pub fn div(a: Decimal, b: Decimal) -> Decimal {
    if b.is_zero() {
        return Decimal::ZERO;
    }
    or_zero(a.checked_div(b), "div")
}

/// Sum of all values. A sum that overflows is zero as a whole.
pub fn total<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    let sum = values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value));
    or_zero(sum, "sum")
}

/// Sum of integer counters, saturating at `u64::MAX`.
pub fn total_count<I>(counts: I) -> u64
where
    I: IntoIterator<Item = u64>,
{
    counts.into_iter().fold(0, u64::saturating_add)
}

pub fn sum_by<T>(items: &[T], value: impl Fn(&T) -> Decimal) -> Decimal {
    total(items.iter().map(value))
}

/// Profit/loss classification of a record set.
///
/// A record is profitable iff its pnl is strictly positive and losing iff it is
/// strictly negative. Exactly zero counts as `flat`, which is neither.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PnlCounts {
    pub profitable: usize,
    pub losing: usize,
    pub flat: usize,
    pub total_pnl: Decimal,
}

impl PnlCounts {
    pub fn classify<T>(items: &[T], pnl: impl Fn(&T) -> Decimal) -> Self {
        let mut counts = Self::default();
        let values: Vec<Decimal> = items.iter().map(pnl).collect();
        for value in &values {
            if value.is_sign_positive() && !value.is_zero() {
                counts.profitable += 1;
            } else if value.is_sign_negative() && !value.is_zero() {
                counts.losing += 1;
            } else {
                counts.flat += 1;
            }
        }
        counts.total_pnl = total(values);
        counts
    }

    pub fn win_rate(&self) -> Decimal {
        win_rate(self.profitable, self.losing)
    }
}

/// `wins / (wins + losses) × 100`, or zero when there are neither.
pub fn win_rate<N: Into<Decimal>>(wins: N, losses: N) -> Decimal {
    let wins = wins.into();
    let decided = add(wins, losses.into());
    mul(div(wins, decided), HUNDRED)
}

/// `part / total × 100`, or zero when the total is zero.
pub fn percent_of(part: Decimal, total: Decimal) -> Decimal {
    mul(div(part, total), HUNDRED)
}

/// Each value's percentage share of the sum of all values, in input order.
///
/// When the sum is zero every share is zero.
pub fn shares(values: &[Decimal]) -> Vec<Decimal> {
    let total = total(values.iter().copied());
    values.iter().map(|v| percent_of(*v, total)).collect()
}

/// Arithmetic mean; zero for an empty input.
pub fn average<I>(values: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    let values: Vec<Decimal> = values.into_iter().collect();
    div(total(values.iter().copied()), Decimal::from(values.len()))
}

/// Sorts descending by `key`. Equal keys keep their input order.
pub fn rank_by<'a, T>(items: &'a [T], key: impl Fn(&T) -> Decimal) -> Vec<&'a T> {
    let mut keyed: Vec<(Decimal, &T)> = items.iter().map(|item| (key(item), item)).collect();
    // `sort_by` is stable.
    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    keyed.into_iter().map(|(_, item)| item).collect()
}

/// The first `n` entries of [`rank_by`]; all of them when there are fewer than `n`.
pub fn top_n<'a, T>(items: &'a [T], n: usize, key: impl Fn(&T) -> Decimal) -> Vec<&'a T> {
    let mut ranked = rank_by(items, key);
    ranked.truncate(n);
    ranked
}
