//! In-process metric storage. Each accumulator is a single series with only const
//! labels; writers update it concurrently through atomics and readers take
//! consistent-enough snapshots via [`Metric::write`].

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tally_common::error::{Result, TallyError};

use crate::{
    desc::{BUCKET_LABEL, Desc},
    metric::Metric,
    opts::{HistogramOpts, Opts},
    types::{HistogramSnapshot, MetricSnapshot, MetricValue},
};

/// An `f64` stored as its bit pattern so it can be updated lock-free.
#[derive(Debug, Default)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    fn add(&self, delta: f64) {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }
}

fn scalar_snapshot(desc: &Arc<Desc>, value: MetricValue) -> Result<MetricSnapshot> {
    Ok(MetricSnapshot {
        desc: desc.clone(),
        labels: desc.label_pairs(&[])?,
        value,
        timestamp: None,
    })
}

pub struct Counter {
    desc: Arc<Desc>,
    value: AtomicF64,
}

impl Counter {
    pub fn new(opts: &Opts) -> Self {
        Self {
            desc: Arc::new(Desc::from_opts(opts, &[])),
            value: AtomicF64::default(),
        }
    }

    pub fn inc(&self) {
        self.value.add(1.0);
    }

    /// Counters only go up; a negative `value` is rejected.
    pub fn add(&self, value: f64) -> Result<()> {
        if value < 0.0 {
            return Err(TallyError::InvalidArgument(format!(
                "counter {} cannot decrease (got {value})",
                self.desc.fq_name()
            )));
        }
        self.value.add(value);
        Ok(())
    }

    pub fn get(&self) -> f64 {
        self.value.load()
    }
}

impl Metric for Counter {
    fn desc(&self) -> &Arc<Desc> {
        &self.desc
    }

    fn write(&self) -> Result<MetricSnapshot> {
        scalar_snapshot(
            &self.desc,
            MetricValue::Counter {
                value: self.get(),
                exemplar: None,
            },
        )
    }
}

pub struct Gauge {
    desc: Arc<Desc>,
    value: AtomicF64,
}

impl Gauge {
    pub fn new(opts: &Opts) -> Self {
        Self {
            desc: Arc::new(Desc::from_opts(opts, &[])),
            value: AtomicF64::default(),
        }
    }

    pub fn set(&self, value: f64) {
        self.value.store(value);
    }

    pub fn inc(&self) {
        self.add(1.0);
    }

    pub fn dec(&self) {
        self.sub(1.0);
    }

    pub fn add(&self, value: f64) {
        self.value.add(value);
    }

    pub fn sub(&self, value: f64) {
        self.add(-value);
    }

    pub fn get(&self) -> f64 {
        self.value.load()
    }
}

impl Metric for Gauge {
    fn desc(&self) -> &Arc<Desc> {
        &self.desc
    }

    fn write(&self) -> Result<MetricSnapshot> {
        scalar_snapshot(
            &self.desc,
            MetricValue::Gauge {
                value: self.get(),
                exemplar: None,
            },
        )
    }
}

pub struct Histogram {
    desc: Arc<Desc>,
    upper_bounds: Vec<f64>,
    /// One slot per bound plus the implicit `+Inf` slot, non-cumulative.
    bucket_counts: Vec<AtomicU64>,
    count: AtomicU64,
    sum: AtomicF64,
}

impl Histogram {
    pub fn new(opts: &HistogramOpts) -> Self {
        let mut upper_bounds = opts
            .buckets
            .iter()
            .copied()
            .filter(|bound| !bound.is_nan())
            .collect::<Vec<_>>();
        upper_bounds.sort_by(|left, right| left.total_cmp(right));
        upper_bounds.dedup();
        if upper_bounds.last().is_some_and(|bound| bound.is_infinite() && *bound > 0.0) {
            upper_bounds.pop();
        }

        Self {
            desc: Arc::new(Desc::from_opts(&opts.opts, &[]).reserve_label(BUCKET_LABEL)),
            bucket_counts: (0..upper_bounds.len() + 1)
                .map(|_| AtomicU64::new(0))
                .collect(),
            upper_bounds,
            count: AtomicU64::new(0),
            sum: AtomicF64::default(),
        }
    }

    pub fn upper_bounds(&self) -> &[f64] {
        &self.upper_bounds
    }

    pub fn observe(&self, value: f64) {
        let bucket_index = self
            .upper_bounds
            .iter()
            .position(|bound| value <= *bound)
            .unwrap_or(self.upper_bounds.len());

        if let Some(bucket) = self.bucket_counts.get(bucket_index) {
            bucket.fetch_add(1, Ordering::Relaxed);
        }

        self.count.fetch_add(1, Ordering::Relaxed);
        self.sum.add(value);
    }
}

impl Metric for Histogram {
    fn desc(&self) -> &Arc<Desc> {
        &self.desc
    }

    fn write(&self) -> Result<MetricSnapshot> {
        let labels = self.desc.label_pairs(&[])?;
        let sum = self.sum.load();

        let counts = self
            .upper_bounds
            .iter()
            .zip(&self.bucket_counts)
            .map(|(bound, count)| (*bound, count.load(Ordering::Relaxed)))
            .collect::<Vec<_>>();
        let overflow = self.bucket_counts[self.upper_bounds.len()].load(Ordering::Relaxed);
        let in_bounds = counts
            .iter()
            .fold(0_u64, |total, (_, count)| total.saturating_add(*count));
        // concurrent observers may have bumped buckets before the total
        let count = self
            .count
            .load(Ordering::Relaxed)
            .max(in_bounds.saturating_add(overflow));

        Ok(MetricSnapshot {
            desc: self.desc.clone(),
            labels,
            value: MetricValue::Histogram(HistogramSnapshot::from_bucket_counts(
                count, sum, &counts,
            )),
            timestamp: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use tally_common::error::{DescError, TallyError};

    use super::{Counter, Gauge, Histogram};
    use crate::{
        metric::Metric,
        opts::{HistogramOpts, Opts},
        types::MetricValue,
    };

    #[test]
    fn counter_counts_and_rejects_decrease() {
        let counter = Counter::new(&Opts::new("jobs_total", "Jobs.").namespace("tally"));
        counter.inc();
        counter.add(2.5).unwrap();
        assert!(matches!(counter.add(-1.0), Err(TallyError::InvalidArgument(_))));

        let snapshot = counter.write().unwrap();
        assert_eq!(snapshot.desc.fq_name(), "tally_jobs_total");
        assert_eq!(
            snapshot.value,
            MetricValue::Counter {
                value: 3.5,
                exemplar: None
            }
        );
    }

    #[test]
    fn gauge_moves_both_ways() {
        let gauge =
            Gauge::new(&Opts::new("in_flight", "In-flight requests.").const_label("pool", "a"));
        gauge.set(10.0);
        gauge.inc();
        gauge.sub(4.0);
        gauge.dec();
        assert_eq!(gauge.get(), 6.0);

        let snapshot = gauge.write().unwrap();
        assert_eq!(snapshot.labels.len(), 1);
        assert_eq!(snapshot.labels[0].value, "a");
    }

    #[test]
    fn histogram_snapshot_is_cumulative() {
        let histogram = Histogram::new(
            &HistogramOpts::new("latency_seconds", "Latency.")
                .buckets(vec![1.0, 0.5, 2.0, f64::INFINITY]),
        );
        assert_eq!(histogram.upper_bounds(), [0.5, 1.0, 2.0]);

        for value in [0.1, 0.7, 0.9, 1.5, 3.0] {
            histogram.observe(value);
        }

        let MetricValue::Histogram(snapshot) = histogram.write().unwrap().value else {
            panic!("expected a histogram");
        };
        let counts = snapshot
            .buckets
            .iter()
            .map(|bucket| (bucket.upper_bound, bucket.cumulative_count))
            .collect::<Vec<_>>();
        assert_eq!(counts, vec![(0.5, 1), (1.0, 3), (2.0, 4)]);
        assert_eq!(snapshot.sample_count, 5);
        assert!((snapshot.sample_sum - 6.2).abs() < 1e-9);
    }

    #[test]
    fn histogram_with_le_label_fails_on_write() {
        let histogram = Histogram::new(&HistogramOpts::from(
            Opts::new("latency_seconds", "Latency.").const_label("le", "1"),
        ));
        histogram.observe(1.0);

        match histogram.write() {
            Err(TallyError::InvalidDescriptor { source, .. }) => {
                assert_eq!(source, DescError::ReservedLabelName("le".to_string()));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn nameless_counter_fails_on_write() {
        let counter = Counter::new(&Opts::new("", "help").namespace("tally"));
        counter.inc();
        assert!(counter.write().is_err());
    }

    #[test]
    fn concurrent_observations_are_all_counted() {
        let histogram = Arc::new(Histogram::new(&HistogramOpts::new("work_seconds", "Work.")));
        let workers = (0..4)
            .map(|_| {
                let histogram = Arc::clone(&histogram);
                thread::spawn(move || {
                    for _ in 0..250 {
                        histogram.observe(0.2);
                    }
                })
            })
            .collect::<Vec<_>>();
        for worker in workers {
            worker.join().unwrap();
        }

        let MetricValue::Histogram(snapshot) = histogram.write().unwrap().value else {
            panic!("expected a histogram");
        };
        assert_eq!(snapshot.sample_count, 1000);
        assert!((snapshot.sample_sum - 200.0).abs() < 1e-6);
    }
}
