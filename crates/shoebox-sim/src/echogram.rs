//! Echogram container
//!
//! Time-sorted set of image-source contributions for one source/receiver
//! pair. Buffers resize in place and only reallocate when the image or
//! channel count actually changes; allocation failure surfaces as a typed
//! error instead of aborting.

use shoebox_dsp::{Sample, argsort};

use crate::error::{SimError, SimResult};
use crate::position::Position3D;

/// One source/receiver pair's image-source contributions
#[derive(Debug, Clone, Default)]
pub struct Echogram {
    /// Contribution magnitudes, `[channel][image]`
    value: Vec<Vec<Sample>>,
    /// Propagation time per image (seconds)
    time: Vec<f32>,
    /// Signed per-axis reflection order per image
    order: Vec<[i32; 3]>,
    /// Cartesian offset from the receiver per image
    coords: Vec<Position3D>,
    /// Time-ascending permutation from the last sort
    sort_perm: Vec<usize>,
}

impl Echogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resize to `num_images` x `num_channels`, reusing storage where the
    /// shape is unchanged.
    pub fn resize(&mut self, num_images: usize, num_channels: usize) -> SimResult<()> {
        let map_alloc = |e: std::collections::TryReserveError| SimError::Allocation(e.to_string());

        if self.value.len() != num_channels {
            self.value.truncate(num_channels);
            self.value
                .try_reserve_exact(num_channels.saturating_sub(self.value.len()))
                .map_err(map_alloc)?;
            self.value.resize(num_channels, Vec::new());
        }
        for channel in &mut self.value {
            if channel.len() != num_images {
                channel
                    .try_reserve_exact(num_images.saturating_sub(channel.len()))
                    .map_err(map_alloc)?;
                channel.resize(num_images, 0.0);
            }
        }
        if self.time.len() != num_images {
            self.time
                .try_reserve_exact(num_images.saturating_sub(self.time.len()))
                .map_err(map_alloc)?;
            self.time.resize(num_images, 0.0);
            self.order.resize(num_images, [0; 3]);
            self.coords.resize(num_images, Position3D::origin());
        }
        Ok(())
    }

    /// Number of image sources
    pub fn num_image_sources(&self) -> usize {
        self.time.len()
    }

    /// Number of channels
    pub fn num_channels(&self) -> usize {
        self.value.len()
    }

    /// Magnitudes of one channel
    pub fn values(&self, channel: usize) -> &[Sample] {
        &self.value[channel]
    }

    pub fn values_mut(&mut self, channel: usize) -> &mut [Sample] {
        &mut self.value[channel]
    }

    /// Propagation times (seconds)
    pub fn times(&self) -> &[f32] {
        &self.time
    }

    pub fn times_mut(&mut self) -> &mut [f32] {
        &mut self.time
    }

    /// Signed reflection orders
    pub fn orders(&self) -> &[[i32; 3]] {
        &self.order
    }

    pub fn orders_mut(&mut self) -> &mut [[i32; 3]] {
        &mut self.order
    }

    /// Cartesian offsets from the receiver
    pub fn coords(&self) -> &[Position3D] {
        &self.coords
    }

    pub fn coords_mut(&mut self) -> &mut [Position3D] {
        &mut self.coords
    }

    /// Permutation produced by the last [`sort_by_time`](Self::sort_by_time)
    pub fn sort_permutation(&self) -> &[usize] {
        &self.sort_perm
    }

    /// Latest propagation time, if any images exist
    pub fn last_time(&self) -> Option<f32> {
        self.time.last().copied()
    }

    /// Stable ascending sort of every per-image array by propagation time.
    ///
    /// The permutation is retained for reuse by callers that track
    /// positions across recomputes.
    pub fn sort_by_time(&mut self) {
        let perm = argsort(&self.time);

        self.time = perm.iter().map(|&i| self.time[i]).collect();
        self.order = perm.iter().map(|&i| self.order[i]).collect();
        self.coords = perm.iter().map(|&i| self.coords[i]).collect();
        for channel in &mut self.value {
            *channel = perm.iter().map(|&i| channel[i]).collect();
        }
        self.sort_perm = perm;
    }
}
