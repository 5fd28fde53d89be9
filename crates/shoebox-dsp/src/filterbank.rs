//! Linear-phase FIR octave filterbank
//!
//! Windowed-sinc kernel design (Blackman-Harris window) for splitting a
//! rendered impulse response into octave bands: the lowest band is a
//! low-pass at the first cutoff, the highest a high-pass at the last
//! cutoff, and interior bands are band-passes between adjacent cutoffs.
//! The kernels are complementary: they sum to a pure (delayed) impulse,
//! so filtered bands recombine to the original broadband signal.
//!
//! Offline convolution runs through `realfft` with zero-padding to the
//! next power of two.

use log::debug;
use realfft::RealFftPlanner;
use rustfft::num_complex::Complex;

use crate::Sample;

use std::f64::consts::PI;

/// Default FIR kernel length (odd, linear phase)
pub const DEFAULT_FIR_LENGTH: usize = 511;

/// Blackman-Harris window value at position `i` of `len`
fn blackman_harris(i: usize, len: usize) -> f64 {
    let t = i as f64 / (len - 1) as f64;
    0.35875 - 0.48829 * (2.0 * PI * t).cos() + 0.14128 * (4.0 * PI * t).cos()
        - 0.01168 * (6.0 * PI * t).cos()
}

/// Windowed-sinc lowpass kernel, normalized to unity DC gain
fn lowpass_kernel(cutoff: f32, sample_rate: f32, length: usize) -> Vec<Sample> {
    debug_assert!(length % 2 == 1, "linear-phase kernel length must be odd");
    let mid = (length / 2) as isize;
    let omega = 2.0 * PI * cutoff as f64 / sample_rate as f64;

    let mut kernel = vec![0.0f64; length];
    for (i, tap) in kernel.iter_mut().enumerate() {
        let n = i as isize - mid;
        let sinc = if n == 0 {
            omega / PI
        } else {
            (omega * n as f64).sin() / (PI * n as f64)
        };
        *tap = sinc * blackman_harris(i, length);
    }

    let sum: f64 = kernel.iter().sum();
    kernel.iter().map(|&v| (v / sum) as Sample).collect()
}

/// Octave filterbank: one linear-phase FIR kernel per band
#[derive(Debug, Clone)]
pub struct OctaveFilterBank {
    kernels: Vec<Vec<Sample>>,
    length: usize,
}

impl OctaveFilterBank {
    /// Design a bank with `cutoffs.len() + 1` bands.
    ///
    /// An empty cutoff list yields a single unit-impulse kernel.
    pub fn design(cutoffs: &[f32], sample_rate: f32, length: usize) -> Self {
        let mid = length / 2;

        if cutoffs.is_empty() {
            let mut delta = vec![0.0; length];
            delta[mid] = 1.0;
            return Self {
                kernels: vec![delta],
                length,
            };
        }

        let lowpasses: Vec<Vec<Sample>> = cutoffs
            .iter()
            .map(|&c| lowpass_kernel(c, sample_rate, length))
            .collect();

        let mut kernels = Vec::with_capacity(cutoffs.len() + 1);
        kernels.push(lowpasses[0].clone());
        for pair in lowpasses.windows(2) {
            let band: Vec<Sample> = pair[1]
                .iter()
                .zip(pair[0].iter())
                .map(|(hi, lo)| hi - lo)
                .collect();
            kernels.push(band);
        }

        // Top band: spectral inversion of the last lowpass
        let last = &lowpasses[lowpasses.len() - 1];
        let mut highpass: Vec<Sample> = last.iter().map(|&v| -v).collect();
        highpass[mid] += 1.0;
        kernels.push(highpass);

        debug!(
            "designed {}-band filterbank, {length} taps, cutoffs {cutoffs:?}",
            kernels.len()
        );
        Self { kernels, length }
    }

    /// Number of bands
    pub fn num_bands(&self) -> usize {
        self.kernels.len()
    }

    /// Kernel length in taps
    pub fn kernel_length(&self) -> usize {
        self.length
    }

    /// Group delay of the linear-phase kernels, in samples
    pub fn group_delay(&self) -> usize {
        self.length / 2
    }

    /// Kernel for one band
    pub fn kernel(&self, band: usize) -> &[Sample] {
        &self.kernels[band]
    }
}

/// Full linear convolution of `signal` with `kernel` via FFT.
///
/// Output length is `signal.len() + kernel.len() - 1`.
pub fn fft_convolve(signal: &[Sample], kernel: &[Sample]) -> Vec<Sample> {
    if signal.is_empty() || kernel.is_empty() {
        return Vec::new();
    }

    let out_len = signal.len() + kernel.len() - 1;
    let fft_len = out_len.next_power_of_two();

    let mut planner = RealFftPlanner::<Sample>::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);

    let mut a = vec![0.0; fft_len];
    a[..signal.len()].copy_from_slice(signal);
    let mut b = vec![0.0; fft_len];
    b[..kernel.len()].copy_from_slice(kernel);

    let mut spec_a = vec![Complex::new(0.0, 0.0); fft_len / 2 + 1];
    let mut spec_b = vec![Complex::new(0.0, 0.0); fft_len / 2 + 1];
    // process only fails on mismatched buffer lengths, which are fixed
    // by fft_len above
    forward
        .process(&mut a, &mut spec_a)
        .expect("forward FFT buffers sized to fft_len");
    forward
        .process(&mut b, &mut spec_b)
        .expect("forward FFT buffers sized to fft_len");

    for (sa, sb) in spec_a.iter_mut().zip(&spec_b) {
        *sa *= sb;
    }

    let mut result = vec![0.0; fft_len];
    inverse
        .process(&mut spec_a, &mut result)
        .expect("inverse FFT buffers sized to fft_len");

    let norm = 1.0 / fft_len as Sample;
    result.truncate(out_len);
    for v in &mut result {
        *v *= norm;
    }
    result
}
