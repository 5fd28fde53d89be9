//! Streaming octave band splitter
//!
//! Splits a mono signal into adjacent frequency bands with a cascade of
//! Linkwitz-Riley crossovers (two cascaded Butterworth biquads per side).
//! Band 0 is the low output of the first crossover; its high output feeds
//! the next crossover, and the final high output becomes the top band.
//! A one-band splitter is a passthrough.

use crate::biquad::{BiquadCoeffs, BiquadTdf2};
use crate::{Filter, Sample};

const BUTTERWORTH_Q: f32 = 0.7071;

/// Linkwitz-Riley 24 dB/oct crossover filter (lowpass or highpass side)
#[derive(Debug, Clone)]
struct LrFilter {
    stages: [BiquadTdf2; 2],
}

impl LrFilter {
    fn lowpass(freq: f32, sample_rate: f32) -> Self {
        let coeffs = BiquadCoeffs::lowpass(freq, BUTTERWORTH_Q, sample_rate);
        Self {
            stages: [
                BiquadTdf2::with_coeffs(coeffs),
                BiquadTdf2::with_coeffs(coeffs),
            ],
        }
    }

    fn highpass(freq: f32, sample_rate: f32) -> Self {
        let coeffs = BiquadCoeffs::highpass(freq, BUTTERWORTH_Q, sample_rate);
        Self {
            stages: [
                BiquadTdf2::with_coeffs(coeffs),
                BiquadTdf2::with_coeffs(coeffs),
            ],
        }
    }

    #[inline]
    fn process(&mut self, input: Sample) -> Sample {
        let mid = self.stages[0].process_sample(input);
        self.stages[1].process_sample(mid)
    }

    fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
    }
}

/// Single crossover point (splits signal into low and high)
#[derive(Debug, Clone)]
struct Crossover {
    lowpass: LrFilter,
    highpass: LrFilter,
}

impl Crossover {
    fn new(freq: f32, sample_rate: f32) -> Self {
        Self {
            lowpass: LrFilter::lowpass(freq, sample_rate),
            highpass: LrFilter::highpass(freq, sample_rate),
        }
    }

    #[inline]
    fn split(&mut self, input: Sample) -> (Sample, Sample) {
        (self.lowpass.process(input), self.highpass.process(input))
    }

    fn reset(&mut self) {
        self.lowpass.reset();
        self.highpass.reset();
    }
}

/// Stateful N-band octave splitter
///
/// Built from `cutoffs.len() + 1` bands; an empty cutoff list gives a
/// single passthrough band.
#[derive(Debug, Clone)]
pub struct BandSplitter {
    crossovers: Vec<Crossover>,
}

impl BandSplitter {
    /// Create a splitter with one crossover per cutoff frequency (Hz)
    pub fn new(cutoffs: &[f32], sample_rate: f32) -> Self {
        Self {
            crossovers: cutoffs
                .iter()
                .map(|&freq| Crossover::new(freq, sample_rate))
                .collect(),
        }
    }

    /// Number of output bands
    pub fn num_bands(&self) -> usize {
        self.crossovers.len() + 1
    }

    /// Split one input frame into bands.
    ///
    /// `bands` must hold `num_bands()` buffers of at least `input.len()`
    /// samples each; only the first `input.len()` samples are written.
    pub fn split_frame(&mut self, input: &[Sample], bands: &mut [Vec<Sample>]) {
        debug_assert_eq!(bands.len(), self.num_bands());

        if self.crossovers.is_empty() {
            bands[0][..input.len()].copy_from_slice(input);
            return;
        }

        for (i, &sample) in input.iter().enumerate() {
            let mut residue = sample;
            for (band, crossover) in self.crossovers.iter_mut().enumerate() {
                let (low, high) = crossover.split(residue);
                bands[band][i] = low;
                residue = high;
            }
            bands[self.crossovers.len()][i] = residue;
        }
    }

    /// Clear all filter state
    pub fn reset(&mut self) {
        for crossover in &mut self.crossovers {
            crossover.reset();
        }
    }
}
