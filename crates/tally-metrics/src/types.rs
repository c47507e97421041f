use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{desc::Desc, exemplar::Exemplar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
    Summary,
    Untyped,
}

impl MetricType {
    pub fn as_prometheus_type(&self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Gauge => "gauge",
            Self::Histogram => "histogram",
            Self::Summary => "summary",
            Self::Untyped => "untyped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct LabelPair {
    pub name: String,
    pub value: String,
}

impl LabelPair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One cumulative histogram bucket: every observation at or below `upper_bound`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub upper_bound: f64,
    pub cumulative_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exemplar: Option<Exemplar>,
}

impl Bucket {
    pub fn new(upper_bound: f64, cumulative_count: u64) -> Self {
        Self {
            upper_bound,
            cumulative_count,
            exemplar: None,
        }
    }
}

/// Point-in-time state of a histogram. Buckets are in ascending bound order; an
/// upper bound of `+Inf` may be absent, in which case `sample_count` stands in for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSnapshot {
    pub sample_count: u64,
    pub sample_sum: f64,
    pub buckets: Vec<Bucket>,
}

impl HistogramSnapshot {
    /// Takes buckets that are already cumulative and already ordered.
    pub fn new(sample_count: u64, sample_sum: f64, buckets: Vec<Bucket>) -> Self {
        Self {
            sample_count,
            sample_sum,
            buckets,
        }
    }

    /// Builds cumulative buckets from per-bucket counts given in ascending bound order.
    pub fn from_bucket_counts(sample_count: u64, sample_sum: f64, counts: &[(f64, u64)]) -> Self {
        let mut cumulative = 0_u64;
        let buckets = counts
            .iter()
            .map(|(bound, count)| {
                cumulative = cumulative.saturating_add(*count);
                Bucket::new(*bound, cumulative)
            })
            .collect();

        Self::new(sample_count, sample_sum, buckets)
    }

    /// Builds buckets from `(upper_bound, cumulative_count)` pairs in any order, as
    /// third-party systems hand them over.
    pub fn from_cumulative<I>(sample_count: u64, sample_sum: f64, cumulative: I) -> Self
    where
        I: IntoIterator<Item = (f64, u64)>,
    {
        let mut buckets = cumulative
            .into_iter()
            .map(|(bound, count)| Bucket::new(bound, count))
            .collect::<Vec<_>>();
        buckets.sort_by(|left, right| left.upper_bound.total_cmp(&right.upper_bound));

        Self::new(sample_count, sample_sum, buckets)
    }

    pub fn exemplars(&self) -> impl Iterator<Item = &Exemplar> {
        self.buckets
            .iter()
            .filter_map(|bucket| bucket.exemplar.as_ref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quantile {
    pub quantile: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummarySnapshot {
    pub sample_count: u64,
    pub sample_sum: f64,
    pub quantiles: Vec<Quantile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MetricValue {
    Counter {
        value: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        exemplar: Option<Exemplar>,
    },
    Gauge {
        value: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        exemplar: Option<Exemplar>,
    },
    Untyped {
        value: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        exemplar: Option<Exemplar>,
    },
    Histogram(HistogramSnapshot),
    Summary(SummarySnapshot),
}

impl MetricValue {
    pub fn scalar(metric_type: MetricType, value: f64) -> Option<Self> {
        match metric_type {
            MetricType::Counter => Some(Self::Counter {
                value,
                exemplar: None,
            }),
            MetricType::Gauge => Some(Self::Gauge {
                value,
                exemplar: None,
            }),
            MetricType::Untyped => Some(Self::Untyped {
                value,
                exemplar: None,
            }),
            MetricType::Histogram | MetricType::Summary => None,
        }
    }

    pub fn metric_type(&self) -> MetricType {
        match self {
            Self::Counter { .. } => MetricType::Counter,
            Self::Gauge { .. } => MetricType::Gauge,
            Self::Untyped { .. } => MetricType::Untyped,
            Self::Histogram(_) => MetricType::Histogram,
            Self::Summary(_) => MetricType::Summary,
        }
    }
}

/// Immutable, encoder-ready state of one metric instance.
#[derive(Debug, Clone, Serialize)]
pub struct MetricSnapshot {
    pub desc: Arc<Desc>,
    /// Const and variable labels together, sorted by name.
    pub labels: Vec<LabelPair>,
    pub value: MetricValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl MetricSnapshot {
    pub fn metric_type(&self) -> MetricType {
        self.value.metric_type()
    }
}

#[cfg(test)]
mod tests {
    use super::{HistogramSnapshot, MetricType, MetricValue};

    #[test]
    fn bucket_counts_become_cumulative() {
        let snapshot =
            HistogramSnapshot::from_bucket_counts(10, 12.5, &[(1.0, 2), (2.0, 0), (5.0, 7)]);

        let counts = snapshot
            .buckets
            .iter()
            .map(|bucket| (bucket.upper_bound, bucket.cumulative_count))
            .collect::<Vec<_>>();
        assert_eq!(counts, vec![(1.0, 2), (2.0, 2), (5.0, 9)]);
        assert_eq!(snapshot.sample_count, 10);
    }

    #[test]
    fn cumulative_pairs_are_ordered_by_bound() {
        let snapshot = HistogramSnapshot::from_cumulative(
            4711,
            403.34,
            [(100.0, 3221), (25.0, 121), (200.0, 4233), (50.0, 2403)],
        );

        let bounds = snapshot
            .buckets
            .iter()
            .map(|bucket| bucket.upper_bound)
            .collect::<Vec<_>>();
        assert_eq!(bounds, vec![25.0, 50.0, 100.0, 200.0]);
        assert!(
            snapshot
                .buckets
                .windows(2)
                .all(|pair| pair[0].cumulative_count <= pair[1].cumulative_count)
        );
    }

    #[test]
    fn scalar_values_only_for_scalar_kinds() {
        assert!(MetricValue::scalar(MetricType::Histogram, 1.0).is_none());
        let value = MetricValue::scalar(MetricType::Gauge, 3.0);
        assert_eq!(
            value.map(|value| value.metric_type()),
            Some(MetricType::Gauge)
        );
    }
}
