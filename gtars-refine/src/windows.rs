//! Nested coordinate windows around each peak.
//!
//! With `B` the bind width, `H = B / 2` and `F` the flank, a peak `[s, e)` becomes:
//!
//! - core:    `[s - H, e + B - H)`, the peak resized by `+B` and shifted by `-H`
//! - region:  core expanded by `2H + F`, the read-count source
//! - gc:      region expanded by `H`
//! - fetch:   gc expanded by `F`, the sequence needed to smooth GC over the region
//!
//! The fetch window is the outermost one and doubles as the context window for
//! the chromosome boundary check.

use log::info;

use crate::config::RefineParams;
use crate::models::{Peak, PeakSet};

/// A genome interval, 0-based half-open. Signed so that windows running off
/// the start of a chromosome can be represented and rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: i64,
    pub end: i64,
}

impl Window {
    pub fn new(start: i64, end: i64) -> Self {
        Window { start, end }
    }

    pub fn width(&self) -> usize {
        (self.end - self.start).max(0) as usize
    }

    pub fn expand(&self, by: u32) -> Window {
        Window {
            start: self.start - by as i64,
            end: self.end + by as i64,
        }
    }

    pub fn within(&self, chrom_len: u32) -> bool {
        self.start >= 0 && self.end <= chrom_len as i64
    }
}

/// All windows derived for one surviving peak.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakWindows {
    /// Position of the peak in the input set.
    pub peak_index: usize,
    pub chr: String,
    pub core: Window,
    pub region: Window,
    pub gc: Window,
    pub fetch: Window,
}

impl PeakWindows {
    pub fn new(peak_index: usize, peak: &Peak, params: &RefineParams) -> Self {
        let core = core_window(peak, params);
        let region = core.expand(params.region_pad());
        let gc = region.expand(params.half_bind);
        let fetch = gc.expand(params.flank);

        PeakWindows {
            peak_index,
            chr: peak.chr.clone(),
            core,
            region,
            gc,
            fetch,
        }
    }

    /// Context window used for the boundary check.
    pub fn context(&self) -> Window {
        self.fetch
    }

    /// Number of bases in the region window (`L`).
    pub fn region_len(&self) -> usize {
        self.region.width()
    }

    /// Length of the score track: `L - 2H - 2F`.
    pub fn track_len(&self, params: &RefineParams) -> usize {
        self.region_len() - 2 * params.block_shift() as usize
    }
}

/// Resize a peak by `+B` and shift it by `-H`.
pub fn core_window(peak: &Peak, params: &RefineParams) -> Window {
    let start = peak.start as i64 - params.half_bind as i64;
    Window::new(start, start + peak.width() as i64 + params.bind_width as i64)
}

/// Inverse of [`core_window`]: recover the original peak coordinates.
pub fn restore_peak(core: &Window, params: &RefineParams) -> (u32, u32) {
    let start = core.start + params.half_bind as i64;
    let end = core.end - params.bind_width as i64 + params.half_bind as i64;
    (start as u32, end as u32)
}

///
/// Build windows for every peak, dropping peaks whose context window leaves
/// the chromosome (or whose chromosome is unknown).
///
/// Returns the surviving windows in input order and the number dropped.
///
pub fn build_windows<F>(
    peaks: &PeakSet,
    params: &RefineParams,
    chrom_len: F,
) -> (Vec<PeakWindows>, usize)
where
    F: Fn(&str) -> Option<u32>,
{
    let mut windows: Vec<PeakWindows> = Vec::with_capacity(peaks.len());
    let mut dropped = 0;

    for (index, peak) in peaks.iter().enumerate() {
        let pw = PeakWindows::new(index, peak, params);
        match chrom_len(&peak.chr) {
            Some(len) if pw.context().within(len) => windows.push(pw),
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        info!(
            "{} peak(s) too close to chromosome boundaries were removed",
            dropped
        );
    }

    (windows, dropped)
}
