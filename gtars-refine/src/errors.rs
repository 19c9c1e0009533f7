use thiserror::Error;

#[derive(Error, Debug)]
pub enum RefineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown GC kernel type: {0} (expected `ladder` or `tricube`)")]
    UnknownGcType(String),

    #[error("Kernel weights sum to zero (bind width {bind_width}, flank {flank})")]
    DegenerateKernel { bind_width: u32, flank: u32 },

    #[error("Bias curve must have {expected} entries, found {found}")]
    BiasCurveResolution { expected: usize, found: usize },

    #[error("Bias curve entry {index} is not a positive finite number: {value}")]
    InvalidBiasValue { index: usize, value: f64 },

    #[error("No bias curve entry for GC fraction {gc} (index {index})")]
    BiasLookup { gc: f64, index: i64 },

    #[error("Coverage error: {0}")]
    Coverage(String),

    #[error("Sequence error: {0}")]
    Sequence(String),

    #[error("Error parsing {what} at line {line}: {message}")]
    Parse {
        what: &'static str,
        line: usize,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
