//! End to end peak refinement.

use log::info;
use rayon::prelude::*;
use serde::Serialize;

use crate::bias::BiasCurve;
use crate::config::RefineParams;
use crate::coverage::CoverageTrack;
use crate::errors::RefineError;
use crate::gc::{SequenceProvider, gc_profile};
use crate::kernel::Kernel;
use crate::models::{Peak, PeakSet};
use crate::null::estimate_null;
use crate::scoring::{RegionProfile, max_score};
use crate::windows::{build_windows, restore_peak};

/// Read-only inputs shared by every peak.
pub struct RefineInputs<'a, S: SequenceProvider + ?Sized> {
    pub forward: &'a CoverageTrack,
    pub reverse: &'a CoverageTrack,
    pub bias: &'a BiasCurve,
    pub genome: &'a S,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefineSummary {
    pub params: RefineParams,
    pub n_input: usize,
    pub n_refined: usize,
    pub n_dropped: usize,
    /// Number of permuted scores behind the p-values.
    pub null_total: u64,
    pub min_pvalue: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct RefineResult {
    pub peaks: PeakSet,
    pub summary: RefineSummary,
}

/// Collect bias multipliers and raw counts for every region window.
pub fn build_profiles<S: SequenceProvider + ?Sized>(
    peaks: &PeakSet,
    inputs: &RefineInputs<'_, S>,
    params: &RefineParams,
    kernel: &Kernel,
) -> Result<(Vec<RegionProfile>, usize), RefineError> {
    let (windows, dropped) = build_windows(peaks, params, |chr| inputs.genome.chrom_len(chr));

    let profiles = windows
        .into_par_iter()
        .map(|pw| {
            let gc = gc_profile(inputs.genome, &pw, kernel)?;
            let bias = inputs.bias.bias_track(&gc)?;
            let forward = inputs.forward.values(&pw.chr, &pw.region);
            let reverse = inputs.reverse.values(&pw.chr, &pw.region);
            Ok(RegionProfile {
                windows: pw,
                forward,
                reverse,
                bias,
            })
        })
        .collect::<Result<Vec<RegionProfile>, RefineError>>()?;

    Ok((profiles, dropped))
}

///
/// Re-score every peak with the GC-corrected enrichment statistic and
/// calibrate it against a permutation null.
///
/// Peaks too close to a chromosome end are dropped; the others keep their
/// input order, coordinates and annotation, with `new_score` and `new_pvalue`
/// set (replacing any earlier values).
///
pub fn refine_peaks<S: SequenceProvider + ?Sized>(
    peaks: &PeakSet,
    inputs: &RefineInputs<'_, S>,
    params: &RefineParams,
) -> Result<RefineResult, RefineError> {
    let kernel = Kernel::from_params(params)?;

    info!("Starting to refine {} peaks", peaks.len());
    info!("Calculating GC content in peak regions");
    let (profiles, n_dropped) = build_profiles(peaks, inputs, params, &kernel)?;

    info!("Estimating enrichment scores");
    let scores: Vec<f64> = profiles
        .par_iter()
        .map(|p| max_score(&p.score_track(params)).unwrap_or(0.0))
        .collect();

    if profiles.is_empty() {
        info!("No peaks left to refine");
        return Ok(RefineResult {
            peaks: PeakSet {
                peaks: Vec::new(),
                header: peaks.header.clone(),
            },
            summary: RefineSummary {
                params: *params,
                n_input: peaks.len(),
                n_refined: 0,
                n_dropped,
                null_total: 0,
                min_pvalue: None,
            },
        });
    }

    info!("Estimating p-values with {} permutations", params.permute);
    let null = estimate_null(&profiles, params);
    let survival = null.survival();

    let refined: Vec<Peak> = profiles
        .iter()
        .zip(scores.iter())
        .map(|(profile, score)| {
            let mut peak = peaks.peaks[profile.windows.peak_index].clone();
            let (start, end) = restore_peak(&profile.windows.core, params);
            peak.start = start;
            peak.end = end;
            peak.new_score = Some(*score);
            peak.new_pvalue = Some(survival.pvalue(*score));
            peak
        })
        .collect();

    info!("Refined {} peaks", refined.len());

    Ok(RefineResult {
        summary: RefineSummary {
            params: *params,
            n_input: peaks.len(),
            n_refined: refined.len(),
            n_dropped,
            null_total: survival.total(),
            min_pvalue: Some(survival.min_pvalue()),
        },
        peaks: PeakSet {
            peaks: refined,
            header: peaks.header.clone(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RefineConfig;
    use crate::coverage::Run;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::borrow::Cow;
    use std::collections::HashMap;

    /// Knows chromosome lengths but has no sequence.
    struct LengthsOnly;

    impl SequenceProvider for LengthsOnly {
        fn fetch(&self, chr: &str, _start: u64, _end: u64) -> Result<Cow<'_, [u8]>, RefineError> {
            Err(RefineError::Sequence(format!("no sequence for {}", chr)))
        }

        fn chrom_len(&self, _chr: &str) -> Option<u32> {
            Some(1_000_000)
        }
    }

    /// Every base is G, so the smoothed GC is 1.0 everywhere.
    struct AllG;

    impl SequenceProvider for AllG {
        fn fetch(&self, _chr: &str, start: u64, end: u64) -> Result<Cow<'_, [u8]>, RefineError> {
            Ok(Cow::Owned(vec![b'G'; (end - start) as usize]))
        }

        fn chrom_len(&self, _chr: &str) -> Option<u32> {
            Some(1_000_000)
        }
    }

    #[fixture]
    fn params() -> RefineParams {
        RefineConfig {
            bind_width: Some(10),
            flank: Some(5),
            permute: 2,
            seed: Some(1),
            ..Default::default()
        }
        .resolve()
        .unwrap()
    }

    fn coverage() -> CoverageTrack {
        CoverageTrack::try_from(HashMap::from([(
            "chr1".to_string(),
            vec![Run {
                start: 900,
                end: 1200,
                count: 2,
            }],
        )]))
        .unwrap()
    }

    #[rstest]
    fn test_sequence_errors_propagate(params: RefineParams) {
        let track = coverage();
        let bias = BiasCurve::flat();
        let inputs = RefineInputs {
            forward: &track,
            reverse: &track,
            bias: &bias,
            genome: &LengthsOnly,
        };
        let peaks = PeakSet::from(vec![Peak::new("chr1", 1000, 1020)]);

        let err = refine_peaks(&peaks, &inputs, &params).unwrap_err();
        assert!(matches!(err, RefineError::Sequence(_)));
    }

    #[rstest]
    fn test_profiles_use_bias_of_local_gc(params: RefineParams) {
        let track = coverage();
        let mut values = vec![1.0; 1001];
        values[1000] = 0.25;
        let bias = BiasCurve::try_from(values).unwrap();
        let inputs = RefineInputs {
            forward: &track,
            reverse: &track,
            bias: &bias,
            genome: &AllG,
        };
        let peaks = PeakSet::from(vec![Peak::new("chr1", 1000, 1020)]);
        let kernel = Kernel::from_params(&params).unwrap();

        let (profiles, dropped) = build_profiles(&peaks, &inputs, &params, &kernel).unwrap();
        assert_eq!(dropped, 0);
        assert_eq!(profiles.len(), 1);

        let profile = &profiles[0];
        assert_eq!(profile.forward.len(), profile.windows.region_len());
        assert!(profile.bias.iter().all(|b| *b == 0.25));
        assert!(profile.forward.iter().all(|c| *c == 2));
    }

    #[rstest]
    fn test_summary_counts(params: RefineParams) {
        let track = coverage();
        let bias = BiasCurve::flat();
        let inputs = RefineInputs {
            forward: &track,
            reverse: &track,
            bias: &bias,
            genome: &AllG,
        };
        let peaks = PeakSet::from(vec![
            Peak::new("chr1", 1000, 1020),
            Peak::new("chr1", 5, 10),
            Peak::new("chr1", 1050, 1060),
        ]);

        let result = refine_peaks(&peaks, &inputs, &params).unwrap();
        let summary = &result.summary;
        assert_eq!(summary.n_input, 3);
        assert_eq!(summary.n_refined, 2);
        assert_eq!(summary.n_dropped, 1);

        let per_round: usize = result
            .peaks
            .iter()
            .map(|p| (p.width() + params.bind_width + 2 * params.half_bind) as usize)
            .sum();
        assert_eq!(summary.null_total, params.permute as u64 * per_round as u64);
        assert_eq!(summary.min_pvalue, Some(1.0 / summary.null_total as f64));
    }
}
