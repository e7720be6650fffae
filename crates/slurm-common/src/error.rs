use thiserror::Error;

/// Failure to decode one `sinfo` row into a [`crate::NodeRecord`].
///
/// Decode errors are per-node: the caller skips the offending row and keeps
/// going with the rest of the output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("invalid {field} value {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("cpu state {0:?} is not allocated/idle/other/total")]
    CpuState(String),

    #[error(transparent)]
    Gres(#[from] GresError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GresError {
    #[error("gres descriptor {0:?} is not gpu:<type>:<count>")]
    Descriptor(String),

    #[error("gres count {0:?} is not a number")]
    Count(String),

    #[error("gres count {count} exceeds {max} devices per node")]
    DeviceCount { count: u64, max: u64 },

    #[error("allocated gres {0:?} has no IDX list")]
    MissingIndexSpec(String),

    #[error("invalid gpu index token {0:?}")]
    IndexToken(String),

    #[error("gpu index range {start}-{end} is reversed")]
    ReversedRange { start: usize, end: usize },

    #[error("gpu index {index} out of range for {total} devices")]
    IndexOutOfRange { index: usize, total: usize },
}
