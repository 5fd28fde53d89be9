//! Room impulse response rendering
//!
//! Per octave band, image-source contributions are accumulated at their
//! nearest-rounded sample index; the band buffers are then convolved with
//! the shared linear-phase octave filterbank and summed into one broadband
//! multichannel RIR. Fractional-delay RIR rendering is deliberately
//! unsupported and reports a typed error.

use shoebox_dsp::Sample;
use shoebox_dsp::filterbank::{OctaveFilterBank, fft_convolve};

use crate::echogram::Echogram;
use crate::error::{SimError, SimResult};

/// Rendered room impulse response for one source/receiver pair
#[derive(Debug, Clone)]
pub struct Rir {
    /// Sample data, `[channel][sample]`
    pub data: Vec<Vec<Sample>>,
    /// Length in samples per channel
    pub length: usize,
    /// Channel count
    pub channels: usize,
}

/// Accumulate one band echogram into a `[channel][length]` buffer
fn render_band(echogram: &Echogram, sample_rate: f32, length: usize) -> Vec<Vec<Sample>> {
    let channels = echogram.num_channels();
    let mut buffer = vec![vec![0.0; length]; channels];

    for image in 0..echogram.num_image_sources() {
        let index = (echogram.times()[image] * sample_rate).round() as usize;
        for (channel, band) in buffer.iter_mut().enumerate() {
            band[index] += echogram.values(channel)[image];
        }
    }
    buffer
}

/// Render the per-band echograms of one pair into a broadband RIR.
///
/// Requesting fractional delays is an unsupported configuration; an empty
/// echogram renders as a zero-length (silent) RIR.
pub(crate) fn render_rir(
    bands: &[Echogram],
    sample_rate: f32,
    filterbank: &OctaveFilterBank,
    fractional_delay: bool,
) -> SimResult<Rir> {
    if fractional_delay {
        return Err(SimError::FractionalRirUnsupported);
    }

    let channels = bands[0].num_channels();
    let Some(last_time) = bands[0].last_time() else {
        return Ok(Rir {
            data: vec![Vec::new(); channels],
            length: 0,
            channels,
        });
    };

    // One guard sample past the latest rounded arrival
    let band_length = (last_time * sample_rate).ceil() as usize + 1;

    if bands.len() == 1 {
        let data = render_band(&bands[0], sample_rate, band_length);
        return Ok(Rir {
            data,
            length: band_length,
            channels,
        });
    }

    let out_length = band_length + filterbank.kernel_length() - 1;
    let mut combined = vec![vec![0.0; out_length]; channels];

    for (band_idx, echogram) in bands.iter().enumerate() {
        if echogram.num_channels() != channels
            || echogram.num_image_sources() != bands[0].num_image_sources()
        {
            return Err(SimError::ImageCountMismatch {
                expected: bands[0].num_image_sources(),
                got: echogram.num_image_sources(),
            });
        }

        let rendered = render_band(echogram, sample_rate, band_length);
        for (channel, samples) in rendered.iter().enumerate() {
            let filtered = fft_convolve(samples, filterbank.kernel(band_idx));
            for (acc, v) in combined[channel].iter_mut().zip(&filtered) {
                *acc += v;
            }
        }
    }

    Ok(Rir {
        data: combined,
        length: out_length,
        channels,
    })
}
