//! GC-aware refinement of peak calls.
//!
//! Each candidate peak is re-scored with an enrichment statistic that combines
//! forward and reverse strand read counts around every candidate binding
//! position, discounted by a GC bias correction. The peak's score is then
//! calibrated against a null distribution built by shuffling the counts inside
//! each peak's region.
//!
//! - [`windows`]: nested windows around each peak and the boundary check
//! - [`kernel`], [`gc`]: smoothed GC content from the reference sequence
//! - [`bias`]: GC bias correction lookup
//! - [`coverage`]: run-length strand coverage and running sums
//! - [`scoring`]: the enrichment score
//! - [`null`]: permutation null and empirical p-values
//! - [`refine`]: the whole pipeline
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use gtars_refine::{BiasCurve, CoverageTrack, GenomeAssembly, PeakSet, RefineConfig};
//! use gtars_refine::refine::{RefineInputs, refine_peaks};
//!
//! let peaks = PeakSet::try_from("peaks.bed").unwrap();
//! let forward = CoverageTrack::try_from(Path::new("fwd.bedGraph")).unwrap();
//! let reverse = CoverageTrack::try_from(Path::new("rev.bedGraph")).unwrap();
//! let bias = BiasCurve::try_from(Path::new("gcbias.txt")).unwrap();
//! let genome = GenomeAssembly::try_from("genome.fa").unwrap();
//!
//! let params = RefineConfig {
//!     bind_width: Some(150),
//!     peak_half_width: Some(200),
//!     ..Default::default()
//! }
//! .resolve()
//! .unwrap();
//!
//! let inputs = RefineInputs { forward: &forward, reverse: &reverse, bias: &bias, genome: &genome };
//! let result = refine_peaks(&peaks, &inputs, &params).unwrap();
//! result.peaks.to_bed("refined.bed").unwrap();
//! ```

pub mod bias;
pub mod config;
pub mod consts;
pub mod coverage;
pub mod errors;
pub mod gc;
pub mod kernel;
pub mod models;
pub mod null;
pub mod refine;
pub mod scoring;
pub mod utils;
pub mod windows;

// re-exports
pub use bias::BiasCurve;
pub use config::{GcType, RefineConfig, RefineParams};
pub use coverage::CoverageTrack;
pub use errors::RefineError;
pub use gc::{GenomeAssembly, SequenceProvider};
pub use models::{Peak, PeakSet};
pub use refine::{RefineInputs, RefineResult, refine_peaks};
