//! Accumulation of named scalars over a reporting window.
use super::{Record, RecordValue};
use crate::error::RdpgError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

/// Statistic returned by [`Aggregator::aggregate`].
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum AggregateMethod {
    /// Accumulated value divided by accumulated count.
    Mean,

    /// Accumulated value.
    Sum,

    /// Accumulated count.
    Count,
}

impl Default for AggregateMethod {
    fn default() -> Self {
        Self::Mean
    }
}

/// Accumulates named scalar observations during a session.
///
/// For each name, the aggregator keeps the sum of `value * count` and the sum of
/// `count` over calls of [`Aggregator::add`]. A session starts when the aggregator
/// is constructed and restarts at [`Aggregator::reset`], which also drops all sums.
///
/// ```rust
/// use rdpg_core::record::{AggregateMethod, Aggregator};
///
/// let mut agg = Aggregator::new(AggregateMethod::Mean);
/// agg.add("reward", -1.0, 1);
/// agg.add("reward", -3.0, 1);
/// assert_eq!(agg.get("reward"), -2.0);
/// assert_eq!(agg.aggregate("reward", Some(AggregateMethod::Sum)), -4.0);
///
/// agg.reset();
/// assert_eq!(agg.mean("reward"), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Aggregator {
    method: AggregateMethod,
    acc: BTreeMap<String, (f64, usize)>,
    start: Instant,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(AggregateMethod::default())
    }
}

impl Aggregator {
    /// Constructs an aggregator with the default statistic used by [`Aggregator::get`].
    pub fn new(method: AggregateMethod) -> Self {
        Self {
            method,
            acc: BTreeMap::new(),
            start: Instant::now(),
        }
    }

    /// Adds `value` observed `count` times.
    pub fn add(&mut self, name: impl Into<String>, value: f64, count: usize) {
        let e = self.acc.entry(name.into()).or_insert((0.0, 0));
        e.0 += value * count as f64;
        e.1 += count;
    }

    /// Adds each pair with count one.
    pub fn add_values(&mut self, values: &[(&str, f64)]) {
        for (name, value) in values {
            self.add(*name, *value, 1);
        }
    }

    /// Adds every scalar in `record` with count one.
    ///
    /// Fails without adding anything if the record holds a non-scalar value.
    pub fn add_record(&mut self, record: &Record) -> Result<()> {
        let mut values = Vec::with_capacity(record.len());
        for (k, v) in record.iter() {
            match v {
                RecordValue::Scalar(v) => values.push((k.as_str(), *v as f64)),
                _ => return Err(RdpgError::RecordValueTypeError(k.clone()).into()),
            }
        }
        self.add_values(&values);
        Ok(())
    }

    /// Returns the statistic of `name`, with the default method if `method` is `None`.
    ///
    /// Unknown names are treated as having zero sum and zero count.
    pub fn aggregate(&self, name: &str, method: Option<AggregateMethod>) -> f64 {
        let (sum, count) = self.acc.get(name).copied().unwrap_or((0.0, 0));
        match method.unwrap_or(self.method) {
            AggregateMethod::Mean => sum / count.max(1) as f64,
            AggregateMethod::Sum => sum,
            AggregateMethod::Count => count as f64,
        }
    }

    /// Returns the statistic of `name` with the default method.
    pub fn get(&self, name: &str) -> f64 {
        self.aggregate(name, None)
    }

    /// Returns the mean of `name`.
    pub fn mean(&self, name: &str) -> f64 {
        self.aggregate(name, Some(AggregateMethod::Mean))
    }

    /// Returns the accumulated value of `name`.
    pub fn sum(&self, name: &str) -> f64 {
        self.aggregate(name, Some(AggregateMethod::Sum))
    }

    /// Returns the accumulated count of `name`.
    pub fn count(&self, name: &str) -> usize {
        self.acc.get(name).map(|e| e.1).unwrap_or(0)
    }

    /// Returns the elapsed time of the current session.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Returns counts per second of `name`.
    ///
    /// If `name` is `None`, the first name in lexicographic order is used.
    pub fn speed(&self, name: Option<&str>) -> f64 {
        self.speed_with_elapsed(name, self.elapsed().as_secs_f64())
    }

    /// Returns seconds per count of `name`.
    ///
    /// If `name` is `None`, the first name in lexicographic order is used.
    pub fn time(&self, name: Option<&str>) -> f64 {
        let count = self.resolve(name).map(|k| self.count(k)).unwrap_or(0);
        self.elapsed().as_secs_f64() / count.max(1) as f64
    }

    fn speed_with_elapsed(&self, name: Option<&str>, elapsed: f64) -> f64 {
        let count = self.resolve(name).map(|k| self.count(k)).unwrap_or(0);
        let elapsed = if elapsed > 0.0 { elapsed } else { 1.0 };
        count as f64 / elapsed
    }

    fn resolve<'a>(&'a self, name: Option<&'a str>) -> Option<&'a str> {
        match name {
            Some(name) => Some(name),
            None => self.acc.keys().next().map(|k| k.as_str()),
        }
    }

    /// Returns the tracked names.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.acc.keys().map(|k| k.as_str())
    }

    /// Returns `true` if nothing has been added in the session.
    pub fn is_empty(&self) -> bool {
        self.acc.is_empty()
    }

    /// Drops all sums and counts and restarts the session.
    pub fn reset(&mut self) {
        self.acc.clear();
        self.start = Instant::now();
    }

    /// Same as [`Aggregator::reset`].
    pub fn clear(&mut self) {
        self.reset()
    }

    /// Returns the default statistic of every tracked name.
    pub fn to_record(&self) -> Record {
        let mut record = Record::empty();
        for k in self.acc.keys() {
            record.insert(k.clone(), RecordValue::Scalar(self.get(k) as f32));
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_sum() {
        let mut agg = Aggregator::default();
        agg.add("x", 1.0, 2);
        agg.add("x", 4.0, 1);
        agg.add("x", 0.5, 4);

        // V = 2 + 4 + 2, C = 7
        assert_eq!(agg.sum("x"), 8.0);
        assert_eq!(agg.count("x"), 7);
        assert!((agg.mean("x") - 8.0 / 7.0).abs() < 1e-12);
        assert_eq!(agg.aggregate("x", Some(AggregateMethod::Count)), 7.0);
    }

    #[test]
    fn test_default_method() {
        let mut agg = Aggregator::new(AggregateMethod::Sum);
        agg.add_values(&[("a", 1.0), ("b", 2.0)]);
        agg.add_values(&[("a", 3.0)]);
        assert_eq!(agg.get("a"), 4.0);
        assert_eq!(agg.get("b"), 2.0);
        assert_eq!(agg.mean("a"), 2.0);
    }

    #[test]
    fn test_zero_count() {
        let mut agg = Aggregator::default();
        agg.add("x", 3.0, 0);
        assert_eq!(agg.mean("x"), 0.0);
        assert_eq!(agg.mean("never"), 0.0);
    }

    #[test]
    fn test_reset() {
        let mut agg = Aggregator::default();
        agg.add("loss", 2.0, 3);
        agg.reset();
        assert!(agg.is_empty());
        assert_eq!(agg.mean("loss"), 0.0);
        assert_eq!(agg.sum("loss"), 0.0);

        agg.add("loss", 2.0, 1);
        agg.clear();
        assert_eq!(agg.mean("loss"), 0.0);
    }

    #[test]
    fn test_speed_is_monotone_in_count() {
        let mut agg = Aggregator::default();
        let mut prev = agg.speed_with_elapsed(Some("step"), 2.0);
        for _ in 0..10 {
            agg.add("step", 1.0, 1);
            let speed = agg.speed_with_elapsed(Some("step"), 2.0);
            assert!(speed >= prev);
            prev = speed;
        }
        assert_eq!(prev, 5.0);
        assert_eq!(agg.speed_with_elapsed(Some("step"), 0.0), 10.0);
    }

    #[test]
    fn test_speed_without_name() {
        let mut agg = Aggregator::default();
        assert_eq!(agg.speed(None), 0.0);
        agg.add("b", 1.0, 4);
        agg.add("a", 1.0, 2);
        assert_eq!(agg.speed_with_elapsed(None, 1.0), 2.0);
        assert!(agg.time(Some("b")) >= 0.0);
    }

    #[test]
    fn test_add_record() -> Result<()> {
        let mut agg = Aggregator::default();
        let record = Record::from_slice(&[
            ("reward", RecordValue::Scalar(-1.0)),
            ("value_loss", RecordValue::Scalar(0.25)),
        ]);
        agg.add_record(&record)?;
        agg.add_record(&record)?;
        assert_eq!(agg.count("reward"), 2);
        assert_eq!(agg.mean("value_loss"), 0.25);

        let record = Record::from_slice(&[
            ("reward", RecordValue::Scalar(-1.0)),
            ("obs", RecordValue::Array1(vec![0.0])),
        ]);
        assert!(agg.add_record(&record).is_err());
        assert_eq!(agg.count("reward"), 2);
        Ok(())
    }

    #[test]
    fn test_to_record() -> Result<()> {
        let mut agg = Aggregator::default();
        agg.add("policy_loss", 1.0, 1);
        agg.add("policy_loss", 2.0, 1);
        let record = agg.to_record();
        assert_eq!(record.get_scalar("policy_loss")?, 1.5);
        assert_eq!(agg.keys().collect::<Vec<_>>(), vec!["policy_loss"]);
        Ok(())
    }
}
