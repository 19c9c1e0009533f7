//! GC-corrected enrichment score.
//!
//! Over a region window of length `L`, with running sums of width `P` and a
//! bias multiplier per base, three blocks of length `L - 2H - 2F` are laid side
//! by side at offsets `0`, `H + F` and `2H + 2F`. For every `k` in the first
//! block, with `s = H + F`:
//!
//! ```text
//! score(k) = 2 * sqrt(fwd[k + s] * rev[k]) * bias[k + s]
//!            - rev[k] * bias[k]
//!            - fwd[k + s] * bias[k + 2s]
//! ```
//!
//! `rev[k]` counts reads just left of the candidate center `k + s` and
//! `fwd[k + s]` reads starting at it; each is discounted by the bias of its
//! own flank. Every score is rounded to three decimals.

use crate::config::RefineParams;
use crate::coverage::running_sums;
use crate::utils::round3;
use crate::windows::PeakWindows;

/// Everything needed to score one region: its windows, raw per-base counts
/// over the region window and the bias multiplier of every region base.
#[derive(Debug, Clone)]
pub struct RegionProfile {
    pub windows: PeakWindows,
    pub forward: Vec<u32>,
    pub reverse: Vec<u32>,
    pub bias: Vec<f64>,
}

impl RegionProfile {
    /// Score track from the observed counts.
    pub fn score_track(&self, params: &RefineParams) -> Vec<f64> {
        self.score_track_with(&self.forward, &self.reverse, params)
    }

    /// Score track from substitute counts (e.g. a shuffled copy) against this region's bias.
    pub fn score_track_with(
        &self,
        forward: &[u32],
        reverse: &[u32],
        params: &RefineParams,
    ) -> Vec<f64> {
        let width = params.pdwh as usize;
        let fwd_sums = running_sums(forward, width);
        let rev_sums = running_sums(reverse, width);
        score_track(&fwd_sums, &rev_sums, &self.bias, params.block_shift() as usize)
    }
}

///
/// Per-position enrichment scores from running sums and bias multipliers,
/// all aligned to the region window. `shift` is `H + F`.
///
pub fn score_track(fwd_sums: &[u64], rev_sums: &[u64], bias: &[f64], shift: usize) -> Vec<f64> {
    let n = fwd_sums.len().min(rev_sums.len()).min(bias.len());
    let track_len = n.saturating_sub(2 * shift);

    (0..track_len)
        .map(|k| {
            let fwd = fwd_sums[k + shift] as f64;
            let rev = rev_sums[k] as f64;
            round3(
                2.0 * (fwd * rev).sqrt() * bias[k + shift]
                    - rev * bias[k]
                    - fwd * bias[k + 2 * shift],
            )
        })
        .collect()
}

/// Largest score of a track, `None` for an empty track.
pub fn max_score(track: &[f64]) -> Option<f64> {
    track.iter().copied().reduce(f64::max)
}
