//! Real-time echogram application
//!
//! Each live (receiver, source) pair owns a set of per-band delay rings.
//! A streamed frame is band-split into the rings, then every image source
//! taps its ring at the image delay and accumulates into the receiver
//! output, weighted by the band echogram values. When a recompute lands
//! mid-stream the first frame after it is rendered twice, once against the
//! previous echogram generation with a fade-out ramp and once against the
//! new generation with a fade-in ramp, so the transition is click-free.

use shoebox_dsp::Sample;
use shoebox_dsp::bandsplit::BandSplitter;
use shoebox_dsp::lagrange::FractionalDelayTable;

use crate::echogram::Echogram;
use crate::error::{SimError, SimResult};
use crate::workspace::CoreWorkspace;
use crate::{MAX_FRAME_SIZE, MAX_ROOM_RECEIVERS, MAX_ROOM_SOURCES, RING_BUFFER_LENGTH};

const RING_MASK: usize = RING_BUFFER_LENGTH - 1;

/// Generation index of the current echograms
const GEN_CURRENT: usize = 0;
/// Generation index of the fading-out previous echograms
const GEN_PREVIOUS: usize = 1;

/// Per-frame gain ramp applied to one echogram generation
#[derive(Clone, Copy, PartialEq)]
enum Fade {
    Unity,
    In,
    Out,
}

impl Fade {
    #[inline]
    fn gain(self, t: usize, frame_len: usize) -> Sample {
        let ramp = (t + 1) as Sample / frame_len as Sample;
        match self {
            Fade::Unity => 1.0,
            Fade::In => ramp,
            Fade::Out => 1.0 - ramp,
        }
    }
}

/// Delay rings and band-split state for one pair
struct PairStream {
    /// One ring per octave band, power-of-two length
    rings: Vec<Vec<Sample>>,
    /// Ring write position per echogram generation
    write_idx: [usize; 2],
    splitter: BandSplitter,
}

impl PairStream {
    fn new(cutoffs: &[f32], sample_rate: f32) -> Self {
        Self {
            rings: vec![vec![0.0; RING_BUFFER_LENGTH]; cutoffs.len() + 1],
            write_idx: [0; 2],
            splitter: BandSplitter::new(cutoffs, sample_rate),
        }
    }
}

/// Streaming state for the whole scene
pub(crate) struct StreamEngine {
    pairs: Vec<Vec<Option<PairStream>>>,
    /// Band-split scratch, `[band][MAX_FRAME_SIZE]`
    scratch: Vec<Vec<Sample>>,
    frac_table: FractionalDelayTable,
}

impl StreamEngine {
    pub(crate) fn new(num_bands: usize) -> Self {
        Self {
            pairs: (0..MAX_ROOM_RECEIVERS)
                .map(|_| (0..MAX_ROOM_SOURCES).map(|_| None).collect())
                .collect(),
            scratch: vec![vec![0.0; MAX_FRAME_SIZE]; num_bands],
            frac_table: FractionalDelayTable::new(),
        }
    }

    /// Drop all pair state and resize the scratch for a new band layout
    pub(crate) fn reset(&mut self, num_bands: usize) {
        for row in &mut self.pairs {
            for pair in row.iter_mut() {
                *pair = None;
            }
        }
        self.scratch = vec![vec![0.0; MAX_FRAME_SIZE]; num_bands];
    }

    pub(crate) fn clear_source(&mut self, source: usize) {
        for row in &mut self.pairs {
            row[source] = None;
        }
    }

    pub(crate) fn clear_receiver(&mut self, receiver: usize) {
        for pair in &mut self.pairs[receiver] {
            *pair = None;
        }
    }

    /// Stream one source frame through a pair, accumulating into `output`.
    ///
    /// The workspace must hold current echograms. Consumes the pair's
    /// pending cross-fade flag and advances both generation write indices
    /// by the frame length.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn apply_pair(
        &mut self,
        receiver: usize,
        source: usize,
        workspace: &mut CoreWorkspace,
        input: &[Sample],
        output: &mut [Vec<Sample>],
        frame_len: usize,
        fractional_delay: bool,
        cutoffs: &[f32],
        sample_rate: f32,
    ) -> SimResult<()> {
        workspace.check_band_consistency()?;

        let pair = self.pairs[receiver][source]
            .get_or_insert_with(|| PairStream::new(cutoffs, sample_rate));

        pair.splitter
            .split_frame(&input[..frame_len], &mut self.scratch);

        // Push the band-split frame at the current generation's position
        let write = pair.write_idx[GEN_CURRENT];
        for (ring, band) in pair.rings.iter_mut().zip(&self.scratch) {
            for t in 0..frame_len {
                ring[(write + t) & RING_MASK] = band[t];
            }
        }

        let frac = fractional_delay.then_some(&self.frac_table);
        if workspace.crossfade_pending {
            // Align the previous generation with the live stream position,
            // then render both generations with complementary ramps.
            pair.write_idx[GEN_PREVIOUS] = write;
            accumulate_generation(
                &pair.rings,
                workspace.band_echograms(),
                write,
                output,
                frame_len,
                Fade::In,
                frac,
                sample_rate,
            );
            accumulate_generation(
                &pair.rings,
                workspace.prev_band_echograms(),
                pair.write_idx[GEN_PREVIOUS],
                output,
                frame_len,
                Fade::Out,
                frac,
                sample_rate,
            );
            workspace.crossfade_pending = false;
        } else {
            accumulate_generation(
                &pair.rings,
                workspace.band_echograms(),
                write,
                output,
                frame_len,
                Fade::Unity,
                frac,
                sample_rate,
            );
        }

        pair.write_idx[GEN_CURRENT] = (write + frame_len) & RING_MASK;
        pair.write_idx[GEN_PREVIOUS] = (pair.write_idx[GEN_PREVIOUS] + frame_len) & RING_MASK;
        workspace.stream_active = true;
        Ok(())
    }
}

/// Tap every image of one echogram generation into the output frame
#[allow(clippy::too_many_arguments)]
fn accumulate_generation(
    rings: &[Vec<Sample>],
    bands: &[Echogram],
    write: usize,
    output: &mut [Vec<Sample>],
    frame_len: usize,
    fade: Fade,
    frac_table: Option<&FractionalDelayTable>,
    sample_rate: f32,
) {
    for (ring, echogram) in rings.iter().zip(bands) {
        for image in 0..echogram.num_image_sources() {
            let delay = echogram.times()[image] * sample_rate;

            match frac_table {
                None => {
                    let d = delay.round() as usize;
                    if d >= RING_BUFFER_LENGTH {
                        continue;
                    }
                    tap_integer(ring, echogram, image, write, d, output, frame_len, fade);
                }
                Some(table) => {
                    let d = delay as usize;
                    // The 4-tap window spans integer delays d-1 ..= d+2
                    if d < 1 || d + 2 >= RING_BUFFER_LENGTH {
                        let rounded = delay.round() as usize;
                        if rounded < RING_BUFFER_LENGTH {
                            tap_integer(
                                ring, echogram, image, write, rounded, output, frame_len, fade,
                            );
                        }
                        continue;
                    }
                    let weights = table.weights(delay.fract());
                    for t in 0..frame_len {
                        let base = write + t;
                        let mut sample = 0.0;
                        for (k, &w) in weights.iter().enumerate() {
                            sample += w * ring[base.wrapping_sub(d - 1 + k) & RING_MASK];
                        }
                        let gain = fade.gain(t, frame_len);
                        for (channel, out) in output.iter_mut().enumerate() {
                            out[t] += sample * gain * echogram.values(channel)[image];
                        }
                    }
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
#[inline]
fn tap_integer(
    ring: &[Sample],
    echogram: &Echogram,
    image: usize,
    write: usize,
    delay: usize,
    output: &mut [Vec<Sample>],
    frame_len: usize,
    fade: Fade,
) {
    for t in 0..frame_len {
        let sample = ring[(write + t).wrapping_sub(delay) & RING_MASK];
        let gain = fade.gain(t, frame_len);
        for (channel, out) in output.iter_mut().enumerate() {
            out[t] += sample * gain * echogram.values(channel)[image];
        }
    }
}

/// Validate a frame request against a receiver's channel layout
pub(crate) fn check_frame_shape(
    output: &[Vec<Sample>],
    channels: usize,
    frame_len: usize,
) -> SimResult<()> {
    if frame_len > MAX_FRAME_SIZE {
        return Err(SimError::FrameTooLarge {
            max: MAX_FRAME_SIZE,
            got: frame_len,
        });
    }
    if output.len() != channels || output.iter().any(|c| c.len() < frame_len) {
        return Err(SimError::OutputShapeMismatch {
            expected_channels: channels,
            min_samples: frame_len,
        });
    }
    Ok(())
}
