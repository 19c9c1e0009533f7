use crate::config::{GcType, RefineParams};
use crate::errors::RefineError;

///
/// Normalized smoothing weights for the GC indicator track. Weights are
/// non-negative and sum to one.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    weights: Vec<f64>,
}

impl Kernel {
    pub fn from_params(params: &RefineParams) -> Result<Self, RefineError> {
        Kernel::new(params.gc_type, params.bind_width, params.flank)
    }

    pub fn new(gc_type: GcType, bind_width: u32, flank: u32) -> Result<Self, RefineError> {
        match gc_type {
            GcType::Ladder => Kernel::ladder(bind_width, flank),
            GcType::Tricube => Kernel::tricube(bind_width, flank),
        }
    }

    ///
    /// `1, 2, ..., F`, then a plateau of `F + 1` repeated `B` times, then `F, ..., 1`.
    /// Length `2F + B`.
    ///
    pub fn ladder(bind_width: u32, flank: u32) -> Result<Self, RefineError> {
        let rise = (1..=flank).map(|i| i as f64);
        let plateau = std::iter::repeat_n((flank + 1) as f64, bind_width as usize);
        let fall = (1..=flank).rev().map(|i| i as f64);

        let raw: Vec<f64> = rise.chain(plateau).chain(fall).collect();
        Kernel::normalize(raw, bind_width, flank)
    }

    ///
    /// Tricube weights `(1 - |t/w|^3)^3` for `t` in `-w..=w`, with `w = F + B/2`.
    /// Length `2w + 1`.
    ///
    /// Meant for `peak_half_width < 3 * bind_width`; wider flanks are not checked here.
    ///
    pub fn tricube(bind_width: u32, flank: u32) -> Result<Self, RefineError> {
        let w = (flank + bind_width / 2) as i64;
        if w == 0 {
            return Err(RefineError::DegenerateKernel { bind_width, flank });
        }

        let raw: Vec<f64> = (-w..=w)
            .map(|t| {
                let u = (t as f64 / w as f64).abs();
                (1.0 - u.powi(3)).powi(3)
            })
            .collect();
        Kernel::normalize(raw, bind_width, flank)
    }

    fn normalize(raw: Vec<f64>, bind_width: u32, flank: u32) -> Result<Self, RefineError> {
        let total: f64 = raw.iter().sum();
        if raw.is_empty() || total <= 0.0 {
            return Err(RefineError::DegenerateKernel { bind_width, flank });
        }

        Ok(Kernel {
            weights: raw.into_iter().map(|w| w / total).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}
