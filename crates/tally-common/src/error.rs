use thiserror::Error;

/// Reason a metric descriptor was recorded as invalid.
///
/// Descriptors keep this around instead of failing at construction, so it has to be
/// cheap to clone and report more than once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescError {
    #[error("metric name is empty")]
    EmptyName,
    #[error("invalid metric name: {0:?}")]
    InvalidMetricName(String),
    #[error("invalid label name: {0:?}")]
    InvalidLabelName(String),
    #[error("label name is reserved: {0:?}")]
    ReservedLabelName(String),
    #[error("duplicate label name: {0:?}")]
    DuplicateLabelName(String),
}

#[derive(Debug, Error)]
pub enum TallyError {
    #[error("invalid descriptor for {name:?}: {source}")]
    InvalidDescriptor {
        name: String,
        #[source]
        source: DescError,
    },
    #[error("inconsistent label cardinality for {name:?}: expected {expected} label values, got {got}")]
    InconsistentCardinality {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("invalid exemplar: {0}")]
    InvalidExemplar(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("snapshot failed: {0}")]
    SnapshotFailed(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

impl TallyError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDescriptor { .. } => "InvalidDescriptor",
            Self::InconsistentCardinality { .. } => "InconsistentCardinality",
            Self::InvalidExemplar(_) => "InvalidExemplar",
            Self::InvalidArgument(_) => "InvalidArgument",
            Self::SnapshotFailed(_) => "SnapshotFailed",
            Self::InternalError(_) => "InternalError",
        }
    }
}

pub type Result<T> = std::result::Result<T, TallyError>;
