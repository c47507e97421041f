//! Snapshot assembly for metrics.
//!
//! Turns counters, gauges, histograms and summaries into immutable
//! [`MetricSnapshot`]s ready for an exposition encoder, and places caller-supplied
//! exemplars onto histogram buckets.
//!
//! ```rust,ignore
//! use tally_metrics::{Exemplar, Histogram, HistogramOpts, Metric, WithExemplars};
//!
//! let latency = Histogram::new(&HistogramOpts::new("request_duration_seconds", "Latency."));
//! latency.observe(0.042);
//!
//! let exemplars = vec![Exemplar::stamped(0.042, [("trace_id", "4bf92f35")])?];
//! let snapshot = WithExemplars::new(latency, exemplars).write()?;
//! ```

pub mod accumulator;
pub mod constant;
pub mod desc;
pub mod exemplar;
pub mod fqname;
pub mod matcher;
pub mod metric;
pub mod opts;
pub mod types;

pub use accumulator::{Counter, Gauge, Histogram};
pub use constant::{ConstHistogram, ConstMetric, ConstSummary};
pub use desc::Desc;
pub use exemplar::{EXEMPLAR_MAX_RUNES, Exemplar};
pub use fqname::build_fq_name;
pub use matcher::place_exemplars;
pub use metric::{Metric, WithExemplars, WithTimestamp, attach_exemplars};
pub use opts::{DEFAULT_BUCKETS, HistogramOpts, Opts, exponential_buckets, linear_buckets};
pub use tally_common::error::{DescError, Result, TallyError};
pub use types::{
    Bucket, HistogramSnapshot, LabelPair, MetricSnapshot, MetricType, MetricValue, Quantile,
    SummarySnapshot,
};
