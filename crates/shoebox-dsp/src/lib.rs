//! shoebox-dsp: numerical utilities for the shoebox room simulator
//!
//! ## Modules
//! - `biquad` - TDF-II biquad filters (lowpass, highpass, bypass)
//! - `bandsplit` - streaming octave band splitter (cascaded crossovers)
//! - `filterbank` - linear-phase FIR octave filterbank design + FFT convolution
//! - `lagrange` - precomputed Lagrange fractional-delay weights
//! - `sh` - real spherical harmonic basis evaluation (ACN/SN3D, orders 0-3)

pub mod bandsplit;
pub mod biquad;
pub mod filterbank;
pub mod lagrange;
pub mod sh;

/// Audio sample type used throughout the simulator
pub type Sample = f32;

/// Trait for all stateful filters
pub trait Filter {
    /// Reset filter state
    fn reset(&mut self);

    /// Process a single sample
    fn process_sample(&mut self, input: Sample) -> Sample;

    /// Process a block of samples in place
    fn process_block(&mut self, buffer: &mut [Sample]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }
}

/// Stable ascending argsort.
///
/// Returns the permutation `p` such that `values[p[0]] <= values[p[1]] <= ...`.
/// Equal values keep their original relative order. Ordering follows IEEE 754
/// totalOrder, so positive NaN sorts after every other value.
pub fn argsort(values: &[Sample]) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..values.len()).collect();
    perm.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    perm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argsort_ascending() {
        let values = [3.0, 1.0, 2.0, 0.5];
        let perm = argsort(&values);
        assert_eq!(perm, vec![3, 1, 2, 0]);
    }

    #[test]
    fn test_argsort_stable_on_ties() {
        let values = [1.0, 2.0, 1.0, 2.0];
        let perm = argsort(&values);
        assert_eq!(perm, vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_argsort_nan_sorts_last() {
        let values = [f32::NAN, 2.0, 1.0, f32::NAN];
        let perm = argsort(&values);
        assert_eq!(&perm[..2], &[2, 1]);
        assert!(values[perm[2]].is_nan());
        assert!(values[perm[3]].is_nan());
    }

    #[test]
    fn test_argsort_empty() {
        let perm = argsort(&[]);
        assert!(perm.is_empty());
    }
}
