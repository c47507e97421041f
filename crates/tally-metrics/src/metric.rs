use std::sync::Arc;

use chrono::{DateTime, Utc};
use tally_common::error::Result;

use crate::{
    desc::Desc,
    exemplar::Exemplar,
    matcher::{place_exemplars, retain_scalar_exemplar},
    types::{MetricSnapshot, MetricValue},
};

/// Anything that can hand over its current state as a [`MetricSnapshot`].
pub trait Metric: Send + Sync {
    fn desc(&self) -> &Arc<Desc>;

    /// Produces a fresh snapshot. Fails if the descriptor is invalid or the
    /// underlying storage cannot be read.
    fn write(&self) -> Result<MetricSnapshot>;
}

impl<M: Metric + ?Sized> Metric for Arc<M> {
    fn desc(&self) -> &Arc<Desc> {
        (**self).desc()
    }

    fn write(&self) -> Result<MetricSnapshot> {
        (**self).write()
    }
}

impl<M: Metric + ?Sized> Metric for Box<M> {
    fn desc(&self) -> &Arc<Desc> {
        (**self).desc()
    }

    fn write(&self) -> Result<MetricSnapshot> {
        (**self).write()
    }
}

/// Attaches `exemplars` (ascending by value) to a snapshot.
///
/// Histograms go through [`place_exemplars`]; counters, gauges and untyped metrics
/// keep the last exemplar; summaries carry none.
pub fn attach_exemplars(mut snapshot: MetricSnapshot, exemplars: &[Exemplar]) -> MetricSnapshot {
    if exemplars.is_empty() {
        return snapshot;
    }

    snapshot.value = match snapshot.value {
        MetricValue::Histogram(histogram) => {
            MetricValue::Histogram(place_exemplars(histogram, exemplars))
        }
        MetricValue::Counter { value, .. } => MetricValue::Counter {
            value,
            exemplar: retain_scalar_exemplar(exemplars),
        },
        MetricValue::Gauge { value, .. } => MetricValue::Gauge {
            value,
            exemplar: retain_scalar_exemplar(exemplars),
        },
        MetricValue::Untyped { value, .. } => MetricValue::Untyped {
            value,
            exemplar: retain_scalar_exemplar(exemplars),
        },
        summary @ MetricValue::Summary(_) => summary,
    };
    snapshot
}

/// A metric whose snapshots carry a fixed set of exemplars.
pub struct WithExemplars<M> {
    metric: M,
    exemplars: Vec<Exemplar>,
}

impl<M: Metric> WithExemplars<M> {
    /// `exemplars` must already be sorted ascending by value.
    pub fn new(metric: M, exemplars: Vec<Exemplar>) -> Self {
        Self { metric, exemplars }
    }
}

impl<M: Metric> Metric for WithExemplars<M> {
    fn desc(&self) -> &Arc<Desc> {
        self.metric.desc()
    }

    fn write(&self) -> Result<MetricSnapshot> {
        let snapshot = self.metric.write()?;
        Ok(attach_exemplars(snapshot, &self.exemplars))
    }
}

/// A metric whose snapshots are stamped with an explicit time, for values
/// collected from elsewhere at a known moment.
pub struct WithTimestamp<M> {
    metric: M,
    timestamp: DateTime<Utc>,
}

impl<M: Metric> WithTimestamp<M> {
    pub fn new(metric: M, timestamp: DateTime<Utc>) -> Self {
        Self { metric, timestamp }
    }
}

impl<M: Metric> Metric for WithTimestamp<M> {
    fn desc(&self) -> &Arc<Desc> {
        self.metric.desc()
    }

    fn write(&self) -> Result<MetricSnapshot> {
        let mut snapshot = self.metric.write()?;
        snapshot.timestamp = Some(self.timestamp);
        Ok(snapshot)
    }
}
