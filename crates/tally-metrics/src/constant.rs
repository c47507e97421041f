//! Metrics whose values are computed elsewhere, e.g. mirrored from a third-party
//! system, and only need to be turned into snapshots.

use std::sync::Arc;

use tally_common::error::{Result, TallyError};

use crate::{
    desc::{BUCKET_LABEL, Desc, QUANTILE_LABEL},
    metric::Metric,
    types::{
        HistogramSnapshot, LabelPair, MetricSnapshot, MetricType, MetricValue, Quantile,
        SummarySnapshot,
    },
};

pub struct ConstMetric {
    desc: Arc<Desc>,
    labels: Vec<LabelPair>,
    value: MetricValue,
}

impl ConstMetric {
    /// `metric_type` must be a scalar kind: counter, gauge or untyped.
    pub fn new(
        desc: Arc<Desc>,
        metric_type: MetricType,
        value: f64,
        label_values: &[String],
    ) -> Result<Self> {
        let labels = desc.label_pairs(label_values)?;
        let value = MetricValue::scalar(metric_type, value).ok_or_else(|| {
            TallyError::InvalidArgument(format!(
                "{} is not a scalar metric type",
                metric_type.as_prometheus_type()
            ))
        })?;

        Ok(Self {
            desc,
            labels,
            value,
        })
    }
}

impl Metric for ConstMetric {
    fn desc(&self) -> &Arc<Desc> {
        &self.desc
    }

    fn write(&self) -> Result<MetricSnapshot> {
        Ok(MetricSnapshot {
            desc: self.desc.clone(),
            labels: self.labels.clone(),
            value: self.value.clone(),
            timestamp: None,
        })
    }
}

pub struct ConstHistogram {
    desc: Arc<Desc>,
    labels: Vec<LabelPair>,
    histogram: HistogramSnapshot,
}

impl ConstHistogram {
    /// `buckets` maps upper bounds to cumulative counts, in any order.
    pub fn new<I>(
        desc: Arc<Desc>,
        sample_count: u64,
        sample_sum: f64,
        buckets: I,
        label_values: &[String],
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, u64)>,
    {
        desc.ensure_label_unused(BUCKET_LABEL)?;
        let labels = desc.label_pairs(label_values)?;
        Ok(Self {
            desc,
            labels,
            histogram: HistogramSnapshot::from_cumulative(sample_count, sample_sum, buckets),
        })
    }
}

impl Metric for ConstHistogram {
    fn desc(&self) -> &Arc<Desc> {
        &self.desc
    }

    fn write(&self) -> Result<MetricSnapshot> {
        Ok(MetricSnapshot {
            desc: self.desc.clone(),
            labels: self.labels.clone(),
            value: MetricValue::Histogram(self.histogram.clone()),
            timestamp: None,
        })
    }
}

pub struct ConstSummary {
    desc: Arc<Desc>,
    labels: Vec<LabelPair>,
    summary: SummarySnapshot,
}

impl ConstSummary {
    /// `quantiles` maps quantile ranks to values; they are kept sorted by rank.
    pub fn new<I>(
        desc: Arc<Desc>,
        sample_count: u64,
        sample_sum: f64,
        quantiles: I,
        label_values: &[String],
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        desc.ensure_label_unused(QUANTILE_LABEL)?;
        let labels = desc.label_pairs(label_values)?;
        let mut quantiles = quantiles
            .into_iter()
            .map(|(quantile, value)| Quantile { quantile, value })
            .collect::<Vec<_>>();
        quantiles.sort_by(|left, right| left.quantile.total_cmp(&right.quantile));

        Ok(Self {
            desc,
            labels,
            summary: SummarySnapshot {
                sample_count,
                sample_sum,
                quantiles,
            },
        })
    }
}

impl Metric for ConstSummary {
    fn desc(&self) -> &Arc<Desc> {
        &self.desc
    }

    fn write(&self) -> Result<MetricSnapshot> {
        Ok(MetricSnapshot {
            desc: self.desc.clone(),
            labels: self.labels.clone(),
            value: MetricValue::Summary(self.summary.clone()),
            timestamp: None,
        })
    }
}
