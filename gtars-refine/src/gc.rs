//! Local GC content around every base of a region window.
//!
//! The sequence under a peak's fetch window is turned into a 0/1 GC indicator
//! and smoothed with the run's [`Kernel`], giving the expected GC fraction of
//! the fragments a read at each position could have come from.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use bio::io::fasta;

use crate::errors::RefineError;
use crate::kernel::Kernel;
use crate::utils::{get_dynamic_reader, round3};
use crate::windows::PeakWindows;

/// Random access to a reference genome.
pub trait SequenceProvider: Sync {
    /// Bases of `chr` in `[start, end)`.
    fn fetch(&self, chr: &str, start: u64, end: u64) -> Result<Cow<'_, [u8]>, RefineError>;

    fn chrom_len(&self, chr: &str) -> Option<u32>;
}

///
/// A whole genome held in memory, keyed by sequence name.
///
#[derive(Debug, Clone, Default)]
pub struct GenomeAssembly {
    seq_map: HashMap<String, Vec<u8>>,
}

impl From<HashMap<String, Vec<u8>>> for GenomeAssembly {
    fn from(seq_map: HashMap<String, Vec<u8>>) -> Self {
        GenomeAssembly { seq_map }
    }
}

impl TryFrom<&Path> for GenomeAssembly {
    type Error = RefineError;

    ///
    /// Create a new [GenomeAssembly] from a (optionally gzipped) fasta file
    ///
    fn try_from(value: &Path) -> Result<GenomeAssembly, RefineError> {
        let reader = get_dynamic_reader(value)?;
        let genome = fasta::Reader::new(reader);

        let mut seq_map: HashMap<String, Vec<u8>> = HashMap::new();
        for record in genome.records() {
            let record = record.map_err(|e| {
                RefineError::Sequence(format!("Error reading genome file: {}", e))
            })?;
            seq_map.insert(record.id().to_string(), record.seq().to_owned());
        }

        Ok(GenomeAssembly { seq_map })
    }
}

impl TryFrom<&str> for GenomeAssembly {
    type Error = RefineError;

    fn try_from(value: &str) -> Result<Self, RefineError> {
        GenomeAssembly::try_from(Path::new(value))
    }
}

impl GenomeAssembly {
    pub fn insert(&mut self, chr: &str, seq: Vec<u8>) {
        self.seq_map.insert(chr.to_string(), seq);
    }

    pub fn contains_chr(&self, chr: &str) -> bool {
        self.seq_map.contains_key(chr)
    }
}

impl SequenceProvider for GenomeAssembly {
    fn fetch(&self, chr: &str, start: u64, end: u64) -> Result<Cow<'_, [u8]>, RefineError> {
        let seq = self
            .seq_map
            .get(chr)
            .ok_or_else(|| RefineError::Sequence(format!("Unknown chromosome: {}", chr)))?;

        let (start, end) = (start as usize, end as usize);
        if start <= end && end <= seq.len() {
            Ok(Cow::Borrowed(&seq[start..end]))
        } else {
            Err(RefineError::Sequence(format!(
                "Invalid range: start={}, end={} for chromosome {} with length {}",
                start,
                end,
                chr,
                seq.len()
            )))
        }
    }

    fn chrom_len(&self, chr: &str) -> Option<u32> {
        self.seq_map.get(chr).map(|s| s.len() as u32)
    }
}

/// 1.0 for G/C (any case), 0.0 for everything else.
pub fn gc_indicator(seq: &[u8]) -> Vec<f64> {
    seq.iter()
        .map(|b| match b.to_ascii_uppercase() {
            b'G' | b'C' => 1.0,
            _ => 0.0,
        })
        .collect()
}

///
/// Slide `kernel` over `seq` and return the first `n_out` weighted sums,
/// rounded to three decimals.
///
pub fn smooth_gc(seq: &[u8], kernel: &Kernel, n_out: usize) -> Result<Vec<f64>, RefineError> {
    let indicator = gc_indicator(seq);
    let k = kernel.len();

    if indicator.len() < k || indicator.len() - k + 1 < n_out {
        return Err(RefineError::Sequence(format!(
            "Sequence of length {} is too short for {} smoothed values with a kernel of length {}",
            indicator.len(),
            n_out,
            k
        )));
    }

    let weights = kernel.weights();
    let profile = (0..n_out)
        .map(|i| {
            let gc: f64 = indicator[i..i + k]
                .iter()
                .zip(weights)
                .map(|(x, w)| x * w)
                .sum();
            round3(gc)
        })
        .collect();

    Ok(profile)
}

/// Smoothed GC fraction for every base of the peak's region window.
pub fn gc_profile<S: SequenceProvider + ?Sized>(
    genome: &S,
    windows: &PeakWindows,
    kernel: &Kernel,
) -> Result<Vec<f64>, RefineError> {
    let fetch = windows.fetch;
    let seq = genome.fetch(&windows.chr, fetch.start as u64, fetch.end as u64)?;
    smooth_gc(&seq, kernel, windows.region_len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RefineConfig;
    use crate::models::Peak;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Write;

    #[rstest]
    fn test_gc_indicator() {
        assert_eq!(
            gc_indicator(b"ACGTgcNn"),
            vec![0.0, 1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0]
        );
    }

    #[rstest]
    fn test_smooth_gc_box_kernel() {
        // ladder with flank 0 is a flat box of width B
        let kernel = Kernel::ladder(4, 0).unwrap();
        let profile = smooth_gc(b"GGGGAAAACCAA", &kernel, 9).unwrap();
        assert_eq!(
            profile,
            vec![1.0, 0.75, 0.5, 0.25, 0.0, 0.25, 0.5, 0.5, 0.5]
        );
    }

    #[rstest]
    fn test_smooth_gc_rounds_to_three_decimals() {
        let kernel = Kernel::ladder(3, 0).unwrap();
        let profile = smooth_gc(b"GAA", &kernel, 1).unwrap();
        assert_eq!(profile, vec![0.333]);
    }

    #[rstest]
    fn test_smooth_gc_too_short() {
        let kernel = Kernel::ladder(4, 2).unwrap();
        assert!(smooth_gc(b"GGGG", &kernel, 1).is_err());
        assert!(smooth_gc(b"GGGGGGGG", &kernel, 2).is_err());
        assert!(smooth_gc(b"GGGGGGGG", &kernel, 1).is_ok());
    }

    #[rstest]
    fn test_genome_fetch_bounds() {
        let mut genome = GenomeAssembly::default();
        genome.insert("chr1", b"ACGTACGTAC".to_vec());

        assert_eq!(genome.chrom_len("chr1"), Some(10));
        assert_eq!(genome.chrom_len("chr2"), None);
        assert_eq!(&genome.fetch("chr1", 2, 5).unwrap()[..], b"GTA");
        assert!(genome.fetch("chr1", 5, 11).is_err());
        assert!(genome.fetch("chr2", 0, 1).is_err());
    }

    #[rstest]
    fn test_genome_from_fasta() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genome.fa");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, ">chr1 test\nACGT\nGGCC\n>chr2\nAAAA").unwrap();

        let genome = GenomeAssembly::try_from(path.as_path()).unwrap();
        assert!(genome.contains_chr("chr1"));
        assert_eq!(genome.chrom_len("chr1"), Some(8));
        assert_eq!(&genome.fetch("chr1", 3, 6).unwrap()[..], b"TGG");
    }

    #[rstest]
    #[case(crate::config::GcType::Ladder)]
    #[case(crate::config::GcType::Tricube)]
    fn test_profile_covers_region(#[case] gc_type: crate::config::GcType) {
        let params = RefineConfig {
            bind_width: Some(20),
            peak_half_width: Some(40),
            gc_type,
            ..Default::default()
        }
        .resolve()
        .unwrap();
        let kernel = Kernel::from_params(&params).unwrap();

        let mut genome = GenomeAssembly::default();
        genome.insert("chr1", b"GC".repeat(5000));

        let windows = PeakWindows::new(0, &Peak::new("chr1", 5000, 5040), &params);
        let profile = gc_profile(&genome, &windows, &kernel).unwrap();

        assert_eq!(profile.len(), windows.region_len());
        assert!(profile.iter().all(|gc| *gc == 1.0));
    }
}
