use std::collections::HashSet;

use serde::Serialize;
use tally_common::error::{DescError, Result, TallyError};
use tracing::debug;

use crate::{fqname::build_fq_name, opts::Opts, types::LabelPair};

/// Label the histogram kind uses for bucket upper bounds.
pub const BUCKET_LABEL: &str = "le";
/// Label the summary kind uses for quantile ranks.
pub const QUANTILE_LABEL: &str = "quantile";

/// Immutable identity of a metric: name, help text and label schema.
///
/// Construction never fails. A malformed descriptor is still built and remembers
/// why it is unusable; the error comes out of [`Desc::validate`] the first time the
/// descriptor is used to build a metric or a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct Desc {
    fq_name: String,
    help: String,
    const_labels: Vec<LabelPair>,
    variable_labels: Vec<String>,
    #[serde(skip)]
    state: std::result::Result<(), DescError>,
}

impl Desc {
    pub fn new<I, K, V>(
        fq_name: impl Into<String>,
        help: impl Into<String>,
        const_labels: I,
        variable_labels: &[&str],
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut const_labels = const_labels
            .into_iter()
            .map(|(name, value)| LabelPair::new(name, value))
            .collect::<Vec<_>>();
        const_labels.sort();

        let mut desc = Self {
            fq_name: fq_name.into(),
            help: help.into(),
            const_labels,
            variable_labels: variable_labels
                .iter()
                .map(|label| (*label).to_string())
                .collect(),
            state: Ok(()),
        };
        desc.state = desc.check();
        if let Err(err) = &desc.state {
            debug!(fq_name = %desc.fq_name, error = %err, "metric descriptor recorded as invalid");
        }
        desc
    }

    pub fn from_opts(opts: &Opts, variable_labels: &[&str]) -> Self {
        Self::new(
            build_fq_name(&opts.namespace, &opts.subsystem, &opts.name),
            opts.help.clone(),
            opts.const_labels.clone(),
            variable_labels,
        )
    }

    pub fn fq_name(&self) -> &str {
        &self.fq_name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn const_labels(&self) -> &[LabelPair] {
        &self.const_labels
    }

    pub fn variable_labels(&self) -> &[String] {
        &self.variable_labels
    }

    pub fn is_valid(&self) -> bool {
        self.state.is_ok()
    }

    pub fn error(&self) -> Option<&DescError> {
        self.state.as_ref().err()
    }

    /// Surfaces the error recorded at construction, if any.
    pub fn validate(&self) -> Result<()> {
        self.state
            .clone()
            .map_err(|source| TallyError::InvalidDescriptor {
                name: self.fq_name.clone(),
                source,
            })
    }

    /// Pairs `label_values` with the variable label names and merges in the const
    /// labels, sorted by name.
    pub fn label_pairs(&self, label_values: &[String]) -> Result<Vec<LabelPair>> {
        self.validate()?;
        if label_values.len() != self.variable_labels.len() {
            return Err(TallyError::InconsistentCardinality {
                name: self.fq_name.clone(),
                expected: self.variable_labels.len(),
                got: label_values.len(),
            });
        }

        let mut pairs = self.const_labels.clone();
        pairs.extend(
            self.variable_labels
                .iter()
                .zip(label_values)
                .map(|(name, value)| LabelPair::new(name.clone(), value.clone())),
        );
        pairs.sort();
        Ok(pairs)
    }

    /// Marks the descriptor invalid if it uses `label`, which the metric kind
    /// reserves for its own series.
    pub(crate) fn reserve_label(mut self, label: &str) -> Self {
        if self.state.is_err() {
            return self;
        }
        if self.uses_label(label) {
            let err = DescError::ReservedLabelName(label.to_string());
            debug!(fq_name = %self.fq_name, error = %err, "metric descriptor recorded as invalid");
            self.state = Err(err);
        }
        self
    }

    /// Fails if the descriptor is invalid or uses `label`, which the metric kind
    /// reserves for its own series.
    pub(crate) fn ensure_label_unused(&self, label: &str) -> Result<()> {
        self.validate()?;
        if self.uses_label(label) {
            return Err(TallyError::InvalidDescriptor {
                name: self.fq_name.clone(),
                source: DescError::ReservedLabelName(label.to_string()),
            });
        }
        Ok(())
    }

    fn uses_label(&self, label: &str) -> bool {
        self.const_labels.iter().any(|pair| pair.name == label)
            || self.variable_labels.iter().any(|name| name == label)
    }

    fn check(&self) -> std::result::Result<(), DescError> {
        if self.fq_name.is_empty() {
            return Err(DescError::EmptyName);
        }
        if !is_valid_metric_name(&self.fq_name) {
            return Err(DescError::InvalidMetricName(self.fq_name.clone()));
        }

        let mut seen = HashSet::new();
        let names = self
            .const_labels
            .iter()
            .map(|pair| pair.name.as_str())
            .chain(self.variable_labels.iter().map(String::as_str));
        for name in names {
            if !is_valid_label_name(name) {
                return Err(DescError::InvalidLabelName(name.to_string()));
            }
            if name.starts_with("__") {
                return Err(DescError::ReservedLabelName(name.to_string()));
            }
            if !seen.insert(name) {
                return Err(DescError::DuplicateLabelName(name.to_string()));
            }
        }
        Ok(())
    }
}

/// `[a-zA-Z_:][a-zA-Z0-9_:]*`
pub fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == ':' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == ':')
}

/// `[a-zA-Z_][a-zA-Z0-9_]*`
pub fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}
