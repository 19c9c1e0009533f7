/// Number of permutation rounds when none is configured.
pub const DEFAULT_PERMUTE: u32 = 5;

/// Bias curve bins per unit of GC fraction.
pub const BIAS_RESOLUTION: usize = 1000;

/// Entries in a bias curve covering GC fractions 0.000..=1.000.
pub const BIAS_CURVE_LEN: usize = BIAS_RESOLUTION + 1;

/// Scores, GC fractions and histogram keys are kept to this many thousandths.
pub const SCORE_SCALE: f64 = 1000.0;

pub const NEW_SCORE_COLUMN: &str = "newScore";
pub const NEW_PVALUE_COLUMN: &str = "newPValue";
