//! Permutation null distribution for enrichment scores.
//!
//! Every round shuffles the forward and reverse counts inside each region
//! window (independently per region), rescores the region and tallies every
//! score of the track. Partial histograms from the rayon workers are combined
//! with [`NullHistogram::merge`], which is commutative and associative, so no
//! shared table is locked.

use std::collections::BTreeMap;

use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::config::RefineParams;
use crate::scoring::RegionProfile;
use crate::utils::{from_millis, to_millis};

///
/// Counts of null scores keyed by the score in thousandths.
///
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NullHistogram {
    counts: BTreeMap<i64, u64>,
}

impl NullHistogram {
    pub fn add(&mut self, score: f64) {
        *self.counts.entry(to_millis(score)).or_insert(0) += 1;
    }

    pub fn extend(&mut self, scores: &[f64]) {
        for score in scores {
            self.add(*score);
        }
    }

    /// Sum the counts of two histograms key by key.
    pub fn merge(self, other: NullHistogram) -> NullHistogram {
        let (mut big, small) = if self.counts.len() >= other.counts.len() {
            (self, other)
        } else {
            (other, self)
        };
        for (key, count) in small.counts {
            *big.counts.entry(key).or_insert(0) += count;
        }
        big
    }

    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of distinct scores observed.
    pub fn n_keys(&self) -> usize {
        self.counts.len()
    }

    pub fn count(&self, score: f64) -> u64 {
        self.counts.get(&to_millis(score)).copied().unwrap_or(0)
    }

    pub fn survival(&self) -> Survival {
        let total = self.total();
        let mut keys = Vec::with_capacity(self.counts.len());
        let mut at_least = Vec::with_capacity(self.counts.len());
        let mut above = Vec::with_capacity(self.counts.len());

        let mut cumulative: u64 = 0;
        for (key, count) in &self.counts {
            keys.push(*key);
            at_least.push((total - cumulative) as f64 / total as f64);
            cumulative += count;
            above.push((total - cumulative) as f64 / total as f64);
        }

        Survival {
            keys,
            at_least,
            above,
            total,
        }
    }
}

///
/// Empirical survival function of a [`NullHistogram`].
///
#[derive(Debug, Clone)]
pub struct Survival {
    keys: Vec<i64>,
    /// Fraction of null scores `>=` each key.
    at_least: Vec<f64>,
    /// Fraction of null scores `>` each key, i.e. `1 - cumulative(<= key) / total`.
    above: Vec<f64>,
    total: u64,
}

impl Survival {
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Smallest p-value the null can give: one null score at least as large.
    pub fn min_pvalue(&self) -> f64 {
        1.0 / self.total.max(1) as f64
    }

    /// `(key, 1 - cumulative(<= key) / total)` for every key, ascending.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.keys
            .iter()
            .zip(self.above.iter())
            .map(|(k, p)| (from_millis(*k), *p))
    }

    ///
    /// Fraction of null scores at least as large as `score`.
    ///
    /// Scores below every null score get 1; scores above every null score get
    /// [`Survival::min_pvalue`] rather than zero.
    ///
    pub fn pvalue(&self, score: f64) -> f64 {
        let key = to_millis(score);
        let idx = self.keys.partition_point(|k| *k <= key);
        if idx == 0 {
            return 1.0;
        }

        let i = idx - 1;
        let p = if self.keys[i] == key {
            self.at_least[i]
        } else {
            self.above[i]
        };

        if p < self.min_pvalue() {
            self.min_pvalue()
        } else {
            p
        }
    }
}

fn region_rng(seed: Option<u64>, round: u32, n_regions: usize, region: usize) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(
            s.wrapping_add(round as u64 * n_regions as u64 + region as u64),
        ),
        None => StdRng::from_os_rng(),
    }
}

/// One permutation round over every region.
pub fn permutation_round(
    regions: &[RegionProfile],
    params: &RefineParams,
    round: u32,
) -> NullHistogram {
    regions
        .par_iter()
        .enumerate()
        .fold(NullHistogram::default, |mut hist, (idx, region)| {
            let mut rng = region_rng(params.seed, round, regions.len(), idx);

            let mut forward = region.forward.clone();
            let mut reverse = region.reverse.clone();
            forward.shuffle(&mut rng);
            reverse.shuffle(&mut rng);

            hist.extend(&region.score_track_with(&forward, &reverse, params));
            hist
        })
        .reduce(NullHistogram::default, NullHistogram::merge)
}

///
/// Run `params.permute` rounds and return the accumulated null histogram.
///
pub fn estimate_null(regions: &[RegionProfile], params: &RefineParams) -> NullHistogram {
    let pb = if params.progress {
        let pb = ProgressBar::new(params.permute as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} permutations")
        {
            pb.set_style(style);
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut histogram = NullHistogram::default();
    for round in 0..params.permute {
        histogram = histogram.merge(permutation_round(regions, params, round));
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!(
        "Null distribution: {} scores over {} distinct values",
        histogram.total(),
        histogram.n_keys()
    );

    histogram
}
