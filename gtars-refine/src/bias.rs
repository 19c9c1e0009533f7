use std::io::BufRead;
use std::path::Path;

use crate::consts::{BIAS_CURVE_LEN, BIAS_RESOLUTION};
use crate::errors::RefineError;
use crate::utils::get_dynamic_reader;

///
/// GC bias correction curve: entry `i` is the multiplier for a GC fraction of
/// `i / 1000`.
///
#[derive(Debug, Clone, PartialEq)]
pub struct BiasCurve {
    values: Vec<f64>,
}

impl TryFrom<Vec<f64>> for BiasCurve {
    type Error = RefineError;

    fn try_from(values: Vec<f64>) -> Result<Self, RefineError> {
        if values.len() != BIAS_CURVE_LEN {
            return Err(RefineError::BiasCurveResolution {
                expected: BIAS_CURVE_LEN,
                found: values.len(),
            });
        }
        if let Some((index, value)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v <= 0.0)
        {
            return Err(RefineError::InvalidBiasValue {
                index,
                value: *value,
            });
        }

        Ok(BiasCurve { values })
    }
}

impl TryFrom<&Path> for BiasCurve {
    type Error = RefineError;

    ///
    /// Read a bias curve from text: one multiplier per line, or two
    /// whitespace separated columns `gc bias` (only the last column is used).
    /// Lines starting with `#` are skipped.
    ///
    fn try_from(value: &Path) -> Result<Self, RefineError> {
        let reader = get_dynamic_reader(value)?;
        let mut values: Vec<f64> = Vec::with_capacity(BIAS_CURVE_LEN);

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let field = trimmed.split_whitespace().last().unwrap_or(trimmed);
            let bias = field.parse::<f64>().map_err(|_| RefineError::Parse {
                what: "bias curve",
                line: line_num + 1,
                message: format!("invalid bias value: {}", field),
            })?;
            values.push(bias);
        }

        BiasCurve::try_from(values)
    }
}

impl BiasCurve {
    /// A curve that leaves every position uncorrected.
    pub fn flat() -> Self {
        BiasCurve {
            values: vec![1.0; BIAS_CURVE_LEN],
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Multiplier for one GC fraction.
    pub fn lookup(&self, gc: f64) -> Result<f64, RefineError> {
        let index = (gc * BIAS_RESOLUTION as f64).round() as i64;
        if index < 0 || index as usize >= self.values.len() {
            return Err(RefineError::BiasLookup { gc, index });
        }
        Ok(self.values[index as usize])
    }

    /// Multipliers for a whole GC profile.
    pub fn bias_track(&self, gc_profile: &[f64]) -> Result<Vec<f64>, RefineError> {
        gc_profile.iter().map(|gc| self.lookup(*gc)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn ramp() -> BiasCurve {
        let values: Vec<f64> = (0..BIAS_CURVE_LEN).map(|i| 1.0 + i as f64).collect();
        BiasCurve::try_from(values).unwrap()
    }

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(0.5, 501.0)]
    #[case(0.2504, 251.0)]
    #[case(1.0, 1001.0)]
    fn test_lookup(#[case] gc: f64, #[case] expected: f64) {
        assert_eq!(ramp().lookup(gc).unwrap(), expected);
    }

    #[rstest]
    fn test_lookup_out_of_range() {
        let curve = ramp();
        assert!(matches!(
            curve.lookup(1.01),
            Err(RefineError::BiasLookup { index: 1010, .. })
        ));
        assert!(curve.lookup(-0.01).is_err());
        assert!(curve.bias_track(&[0.1, 2.0]).is_err());
        assert_eq!(curve.bias_track(&[0.0, 0.001]).unwrap(), vec![1.0, 2.0]);
    }

    #[rstest]
    fn test_resolution_mismatch() {
        let err = BiasCurve::try_from(vec![1.0; 101]).unwrap_err();
        assert!(matches!(
            err,
            RefineError::BiasCurveResolution {
                expected: 1001,
                found: 101
            }
        ));
    }

    #[rstest]
    fn test_rejects_non_positive_values() {
        let mut values = vec![1.0; BIAS_CURVE_LEN];
        values[17] = 0.0;
        assert!(matches!(
            BiasCurve::try_from(values),
            Err(RefineError::InvalidBiasValue { index: 17, .. })
        ));
    }

    #[rstest]
    fn test_read_two_column_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bias.txt");
        let mut text = String::from("# gc\tbias\n");
        for i in 0..BIAS_CURVE_LEN {
            text.push_str(&format!("{:.3}\t{}\n", i as f64 / 1000.0, 0.5 + i as f64 / 1000.0));
        }
        std::fs::write(&path, text).unwrap();

        let curve = BiasCurve::try_from(path.as_path()).unwrap();
        assert_eq!(curve.values().len(), BIAS_CURVE_LEN);
        assert_eq!(curve.lookup(0.0).unwrap(), 0.5);
        assert_eq!(curve.lookup(1.0).unwrap(), 1.5);

        std::fs::write(&path, "1.0\n1.0\n").unwrap();
        assert!(BiasCurve::try_from(path.as_path()).is_err());
    }
}
