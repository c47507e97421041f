use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tally_common::{
    error::{Result, TallyError},
    time,
};

use crate::{desc::is_valid_label_name, types::LabelPair};

/// Upper limit on the combined length, in characters, of an exemplar's label names
/// and values.
pub const EXEMPLAR_MAX_RUNES: usize = 128;

/// A single observation with its own labels, typically pointing at a trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exemplar {
    pub value: f64,
    pub labels: Vec<LabelPair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Exemplar {
    pub fn new<I, K, V>(value: f64, labels: I, timestamp: Option<DateTime<Utc>>) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut labels = labels
            .into_iter()
            .map(|(name, value)| LabelPair::new(name, value))
            .collect::<Vec<_>>();
        labels.sort();
        validate_labels(&labels)?;

        Ok(Self {
            value,
            labels,
            timestamp,
        })
    }

    /// Like [`Exemplar::new`], timestamped now.
    pub fn stamped<I, K, V>(value: f64, labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(value, labels, Some(time::now()))
    }

    pub fn timestamp_millis(&self) -> Option<i64> {
        self.timestamp.as_ref().map(time::unix_millis)
    }
}

fn validate_labels(labels: &[LabelPair]) -> Result<()> {
    let mut seen = HashSet::new();
    let mut runes = 0_usize;
    for pair in labels {
        if !is_valid_label_name(&pair.name) {
            return Err(TallyError::InvalidExemplar(format!(
                "invalid label name {:?}",
                pair.name
            )));
        }
        if pair.name.starts_with("__") {
            return Err(TallyError::InvalidExemplar(format!(
                "label name {:?} is reserved",
                pair.name
            )));
        }
        if !seen.insert(pair.name.as_str()) {
            return Err(TallyError::InvalidExemplar(format!(
                "duplicate label name {:?}",
                pair.name
            )));
        }
        runes += pair.name.chars().count() + pair.value.chars().count();
    }

    if runes > EXEMPLAR_MAX_RUNES {
        return Err(TallyError::InvalidExemplar(format!(
            "labels are {runes} characters long, limit is {EXEMPLAR_MAX_RUNES}"
        )));
    }
    Ok(())
}
