use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tally_common::error::{Result, TallyError};

use crate::fqname::build_fq_name;

/// Default histogram bounds, tuned for request latencies in seconds.
pub const DEFAULT_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Opts {
    pub namespace: String,
    pub subsystem: String,
    pub name: String,
    pub help: String,
    pub const_labels: BTreeMap<String, String>,
}

impl Opts {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            ..Self::default()
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = subsystem.into();
        self
    }

    pub fn const_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.const_labels.insert(name.into(), value.into());
        self
    }

    pub fn fq_name(&self) -> String {
        build_fq_name(&self.namespace, &self.subsystem, &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramOpts {
    #[serde(flatten)]
    pub opts: Opts,
    #[serde(default = "default_buckets")]
    pub buckets: Vec<f64>,
}

impl HistogramOpts {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Self::from(Opts::new(name, help))
    }

    pub fn buckets(mut self, buckets: Vec<f64>) -> Self {
        self.buckets = buckets;
        self
    }
}

impl From<Opts> for HistogramOpts {
    fn from(opts: Opts) -> Self {
        Self {
            opts,
            buckets: default_buckets(),
        }
    }
}

fn default_buckets() -> Vec<f64> {
    DEFAULT_BUCKETS.to_vec()
}

/// `count` bounds starting at `start`, each `width` above the previous one.
pub fn linear_buckets(start: f64, width: f64, count: usize) -> Result<Vec<f64>> {
    if count < 1 {
        return Err(TallyError::InvalidArgument(
            "linear_buckets needs a positive count".to_string(),
        ));
    }
    if width <= 0.0 {
        return Err(TallyError::InvalidArgument(format!(
            "linear_buckets needs a positive width, got {width}"
        )));
    }

    Ok((0..count).map(|index| start + width * index as f64).collect())
}

/// `count` bounds starting at `start`, each `factor` times the previous one.
pub fn exponential_buckets(start: f64, factor: f64, count: usize) -> Result<Vec<f64>> {
    if count < 1 {
        return Err(TallyError::InvalidArgument(
            "exponential_buckets needs a positive count".to_string(),
        ));
    }
    if start <= 0.0 {
        return Err(TallyError::InvalidArgument(format!(
            "exponential_buckets needs a positive start, got {start}"
        )));
    }
    if factor <= 1.0 {
        return Err(TallyError::InvalidArgument(format!(
            "exponential_buckets needs a factor greater than 1, got {factor}"
        )));
    }

    let mut bound = start;
    Ok((0..count)
        .map(|_| {
            let current = bound;
            bound *= factor;
            current
        })
        .collect())
}
