use thiserror::Error;

/// Errors raised while building or querying a [`ProteinIndex`](crate::ProteinIndex).
///
/// Policy rejections (too many `X` in a peptide) and exhausted search bounds are not
/// errors: they surface as an empty mapping.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("index construction was cancelled")]
    Cancelled,

    #[error("index has been closed")]
    Closed,

    #[error("tag mapping needs the reversed index; build with `build_reverse` enabled")]
    MissingReverseIndex,

    #[error("unsupported tag element: {0}")]
    UnsupportedTag(String),

    #[error("invalid mass tolerance: {0}")]
    InvalidTolerance(f64),

    #[error("mass table defines no residue with a positive mass")]
    EmptyMassTable,

    #[error("sampling shift {0} is out of range (at most {max})", max = crate::config::MAX_SAMPLING_SHIFT)]
    InvalidSamplingShift(u32),

    #[error("indexed text of {0} symbols exceeds the 32-bit position limit")]
    TooLarge(usize),
}

pub type Result<T> = std::result::Result<T, IndexError>;
