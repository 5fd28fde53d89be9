//! Lagrange fractional-delay interpolation weights
//!
//! Reading a delay line at a non-integer delay d = D + f takes a small FIR
//! whose taps are the Lagrange basis polynomials evaluated at d. The table
//! precomputes those weights for a fixed grid of fractional parts so the
//! real-time path is a lookup, not a polynomial evaluation per sample.

use crate::Sample;

/// Interpolation order of the precomputed table (4 taps)
pub const LAGRANGE_ORDER: usize = 3;

/// Number of fraction steps in the table
pub const LAGRANGE_STEPS: usize = 64;

/// Precomputed Lagrange fractional-delay weights.
///
/// For order 3 the taps cover integer delays `D - 1 ..= D + 2` around the
/// truncated delay `D`; the interpolation point sits at `1 + frac` within
/// the 4-tap window.
#[derive(Debug, Clone)]
pub struct FractionalDelayTable {
    weights: Vec<[Sample; LAGRANGE_ORDER + 1]>,
}

impl FractionalDelayTable {
    pub fn new() -> Self {
        let mut weights = Vec::with_capacity(LAGRANGE_STEPS + 1);
        for step in 0..=LAGRANGE_STEPS {
            let frac = step as f64 / LAGRANGE_STEPS as f64;
            weights.push(lagrange_weights(1.0 + frac));
        }
        Self { weights }
    }

    /// Weights for a fractional part in `[0, 1)`.
    ///
    /// Tap `k` applies to the sample at integer delay `D - 1 + k`.
    #[inline]
    pub fn weights(&self, frac: Sample) -> &[Sample; LAGRANGE_ORDER + 1] {
        let step = (frac.clamp(0.0, 1.0) * LAGRANGE_STEPS as Sample).round() as usize;
        &self.weights[step.min(LAGRANGE_STEPS)]
    }
}

impl Default for FractionalDelayTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Lagrange basis weights for interpolation point `d` over taps `0..=ORDER`
fn lagrange_weights(d: f64) -> [Sample; LAGRANGE_ORDER + 1] {
    let mut w = [0.0; LAGRANGE_ORDER + 1];
    for (k, wk) in w.iter_mut().enumerate() {
        let mut value = 1.0f64;
        for m in 0..=LAGRANGE_ORDER {
            if m != k {
                value *= (d - m as f64) / (k as f64 - m as f64);
            }
        }
        *wk = value as Sample;
    }
    w
}
