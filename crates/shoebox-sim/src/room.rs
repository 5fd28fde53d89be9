//! Shoebox room model
//!
//! A rectangular-cuboid room with per-octave-band, per-wall absorption
//! coefficients. Wall indexing per axis pair: 0/1 = x low/high wall,
//! 2/3 = y low/high, 4/5 = z low/high (floor/ceiling).

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Number of walls in a shoebox room
pub const NUM_WALLS: usize = 6;

/// Octave band configuration
///
/// Band k is centered at `lowest_center_hz * 2^k`; the cutoff between
/// adjacent bands sits at center * sqrt(2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OctaveBands {
    /// Center frequency of the lowest band (Hz)
    pub lowest_center_hz: f32,
    /// Number of bands
    pub count: usize,
}

impl OctaveBands {
    pub fn new(lowest_center_hz: f32, count: usize) -> Self {
        Self {
            lowest_center_hz,
            count,
        }
    }

    /// Band center frequencies (Hz), ascending
    pub fn centers(&self) -> Vec<f32> {
        (0..self.count)
            .map(|k| self.lowest_center_hz * 2.0f32.powi(k as i32))
            .collect()
    }

    /// Crossover frequencies between adjacent bands (Hz), `count - 1` entries
    pub fn cutoffs(&self) -> Vec<f32> {
        (0..self.count.saturating_sub(1))
            .map(|k| self.lowest_center_hz * 2.0f32.powi(k as i32) * std::f32::consts::SQRT_2)
            .collect()
    }

    /// Upper edge of the top band (center * sqrt(2)). Must stay below
    /// Nyquist for a valid room.
    pub fn upper_edge_hz(&self) -> f32 {
        self.lowest_center_hz * 2.0f32.powi(self.count as i32 - 1) * std::f32::consts::SQRT_2
    }
}

impl Default for OctaveBands {
    fn default() -> Self {
        // 125 Hz .. 4 kHz, the common six-band absorption tabulation
        Self::new(125.0, 6)
    }
}

/// Room definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Room dimensions [length, width, height] in meters
    pub dimensions: [f32; 3],
    /// Speed of sound (m/s)
    pub speed_of_sound: f32,
    /// Sample rate (Hz)
    pub sample_rate: f32,
    /// Octave band configuration
    pub bands: OctaveBands,
    /// Absorption coefficients, `[band][wall]`, each in [0, 1]
    pub absorption: Vec<[f32; NUM_WALLS]>,
}

impl Room {
    /// Create and validate a room
    pub fn new(
        dimensions: [f32; 3],
        speed_of_sound: f32,
        sample_rate: f32,
        bands: OctaveBands,
        absorption: Vec<[f32; NUM_WALLS]>,
    ) -> SimResult<Self> {
        let room = Self {
            dimensions,
            speed_of_sound,
            sample_rate,
            bands,
            absorption,
        };
        room.validate()?;
        Ok(room)
    }

    /// Anechoic room: zero absorption in every band
    pub fn anechoic_free_field(
        dimensions: [f32; 3],
        sample_rate: f32,
        bands: OctaveBands,
    ) -> SimResult<Self> {
        Self::new(
            dimensions,
            343.0,
            sample_rate,
            bands,
            vec![[0.0; NUM_WALLS]; bands.count],
        )
    }

    /// Check every parameter; typed error on the first violation
    pub fn validate(&self) -> SimResult<()> {
        if self.dimensions.iter().any(|&d| !(d > 0.0)) {
            return Err(SimError::InvalidRoom(format!(
                "dimensions must be positive, got {:?}",
                self.dimensions
            )));
        }
        if !(self.speed_of_sound > 0.0) {
            return Err(SimError::InvalidRoom(format!(
                "speed of sound must be positive, got {}",
                self.speed_of_sound
            )));
        }
        if !(self.sample_rate > 0.0) {
            return Err(SimError::InvalidRoom(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if self.bands.count == 0 {
            return Err(SimError::InvalidRoom("band count must be >= 1".into()));
        }
        if !(self.bands.lowest_center_hz > 0.0) {
            return Err(SimError::InvalidRoom(format!(
                "lowest band center must be positive, got {}",
                self.bands.lowest_center_hz
            )));
        }
        let nyquist = self.sample_rate / 2.0;
        if !(self.bands.upper_edge_hz() < nyquist) {
            return Err(SimError::InvalidRoom(format!(
                "top band edge {} Hz must lie below Nyquist ({} Hz)",
                self.bands.upper_edge_hz(),
                nyquist
            )));
        }
        if self.absorption.len() != self.bands.count {
            return Err(SimError::InvalidRoom(format!(
                "absorption rows ({}) must match band count ({})",
                self.absorption.len(),
                self.bands.count
            )));
        }
        for (band, row) in self.absorption.iter().enumerate() {
            if row.iter().any(|&a| !(0.0..=1.0).contains(&a)) {
                return Err(SimError::InvalidRoom(format!(
                    "absorption out of [0, 1] in band {band}: {row:?}"
                )));
            }
        }
        Ok(())
    }

    /// True if a point lies inside the room bounds
    pub fn contains(&self, position: &crate::position::Position3D) -> bool {
        position.x >= 0.0
            && position.x <= self.dimensions[0]
            && position.y >= 0.0
            && position.y <= self.dimensions[1]
            && position.z >= 0.0
            && position.z <= self.dimensions[2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_octave_centers_and_cutoffs() {
        let bands = OctaveBands::new(125.0, 4);
        assert_eq!(bands.centers(), vec![125.0, 250.0, 500.0, 1000.0]);

        let cutoffs = bands.cutoffs();
        assert_eq!(cutoffs.len(), 3);
        assert!((cutoffs[0] - 125.0 * std::f32::consts::SQRT_2).abs() < 1e-3);
        // Each cutoff is the geometric midpoint of adjacent centers
        assert!((cutoffs[1] / cutoffs[0] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_many_bands_rejected_above_nyquist() {
        // Band centers grow as 2^k; a count this large must be rejected
        // by validation instead of overflowing in centers().
        let bands = OctaveBands::new(125.0, 34);
        let absorption = vec![[0.0; NUM_WALLS]; 34];
        let err = Room::new([4.0, 4.0, 3.0], 343.0, 48000.0, bands, absorption);
        assert!(matches!(err, Err(SimError::InvalidRoom(_))));

        // Nine bands from 31.25 Hz top out at 8 kHz * sqrt(2), still valid
        let bands = OctaveBands::new(31.25, 9);
        let absorption = vec![[0.0; NUM_WALLS]; 9];
        let room = Room::new([4.0, 4.0, 3.0], 343.0, 48000.0, bands, absorption).unwrap();
        let centers = room.bands.centers();
        assert_eq!(centers[8], 8000.0);
    }

    #[test]
    fn test_single_band_has_no_cutoffs() {
        let bands = OctaveBands::new(1000.0, 1);
        assert!(bands.cutoffs().is_empty());
    }

    #[test]
    fn test_room_validation() {
        let bands = OctaveBands::default();
        assert!(Room::new([4.0, 4.0, 3.0], 343.0, 48000.0, bands, vec![[0.1; 6]; 6]).is_ok());

        // Wrong absorption row count
        assert!(Room::new([4.0, 4.0, 3.0], 343.0, 48000.0, bands, vec![[0.1; 6]; 2]).is_err());

        // Negative dimension
        assert!(Room::new([-1.0, 4.0, 3.0], 343.0, 48000.0, bands, vec![[0.1; 6]; 6]).is_err());

        // Absorption above one
        assert!(Room::new([4.0, 4.0, 3.0], 343.0, 48000.0, bands, vec![[1.5; 6]; 6]).is_err());
    }

    #[test]
    fn test_contains() {
        let room =
            Room::anechoic_free_field([4.0, 4.0, 3.0], 48000.0, OctaveBands::default()).unwrap();
        assert!(room.contains(&crate::position::Position3D::new(1.0, 1.0, 1.5)));
        assert!(!room.contains(&crate::position::Position3D::new(5.0, 1.0, 1.5)));
    }
}
