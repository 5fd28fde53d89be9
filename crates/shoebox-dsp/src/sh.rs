//! Real spherical harmonic basis evaluation
//!
//! ACN channel ordering, SN3D normalization, closed-form coefficients up
//! to order 3 (16 channels). Order 0 is the omnidirectional basis.

use crate::Sample;

/// Maximum supported basis order
pub const MAX_SH_ORDER: usize = 3;

/// Number of basis channels for a given order
pub fn channel_count(order: usize) -> usize {
    (order + 1) * (order + 1)
}

/// ACN channel index from (order, degree)
pub fn acn_index(order: i32, degree: i32) -> usize {
    (order * order + order + degree) as usize
}

/// Spherical harmonic coefficients for one direction
#[derive(Debug, Clone)]
pub struct ShBasis {
    coeffs: Vec<Sample>,
    order: usize,
}

impl ShBasis {
    /// Create a zeroed basis for `order` (panics above [`MAX_SH_ORDER`])
    pub fn new(order: usize) -> Self {
        assert!(order <= MAX_SH_ORDER, "unsupported SH order {order}");
        Self {
            coeffs: vec![0.0; channel_count(order)],
            order,
        }
    }

    /// Compute the basis for a direction
    ///
    /// # Arguments
    /// * `azimuth` - horizontal angle in degrees (0 = front, positive = right)
    /// * `elevation` - vertical angle in degrees (positive = up)
    pub fn from_direction(azimuth: Sample, elevation: Sample, order: usize) -> Self {
        let mut basis = Self::new(order);
        basis.compute_for_direction(azimuth, elevation);
        basis
    }

    /// Recompute coefficients for a direction (degrees)
    pub fn compute_for_direction(&mut self, azimuth: Sample, elevation: Sample) {
        let az = azimuth.to_radians();
        let el = elevation.to_radians();

        let cos_el = el.cos();
        let sin_el = el.sin();

        // Order 0 (omnidirectional)
        self.coeffs[0] = 1.0;

        if self.order >= 1 {
            self.coeffs[1] = cos_el * az.sin(); // Y
            self.coeffs[2] = sin_el; // Z
            self.coeffs[3] = cos_el * az.cos(); // X
        }

        if self.order >= 2 {
            let cos2_az = (2.0 * az).cos();
            let sin2_az = (2.0 * az).sin();
            let cos2_el = cos_el * cos_el;

            self.coeffs[4] = 0.866025 * cos2_el * sin2_az;
            self.coeffs[5] = 0.866025 * (2.0 * sin_el * cos_el) * az.sin();
            self.coeffs[6] = 0.5 * (3.0 * sin_el * sin_el - 1.0);
            self.coeffs[7] = 0.866025 * (2.0 * sin_el * cos_el) * az.cos();
            self.coeffs[8] = 0.866025 * cos2_el * cos2_az;
        }

        if self.order >= 3 {
            let sin2_az = (2.0 * az).sin();
            let cos2_az = (2.0 * az).cos();
            let sin3_az = (3.0 * az).sin();
            let cos3_az = (3.0 * az).cos();
            let cos3_el = cos_el * cos_el * cos_el;

            self.coeffs[9] = 0.790569 * cos3_el * sin3_az;
            self.coeffs[10] = 1.936492 * sin_el * cos_el * cos_el * sin2_az;
            self.coeffs[11] = 0.612372 * cos_el * (5.0 * sin_el * sin_el - 1.0) * az.sin();
            self.coeffs[12] = 0.5 * sin_el * (5.0 * sin_el * sin_el - 3.0);
            self.coeffs[13] = 0.612372 * cos_el * (5.0 * sin_el * sin_el - 1.0) * az.cos();
            self.coeffs[14] = 0.968246 * sin_el * cos_el * cos_el * cos2_az;
            self.coeffs[15] = 0.790569 * cos3_el * cos3_az;
        }
    }

    /// Basis order
    pub fn order(&self) -> usize {
        self.order
    }

    /// Channel coefficient by ACN index (0.0 out of range)
    #[inline]
    pub fn get(&self, acn: usize) -> Sample {
        self.coeffs.get(acn).copied().unwrap_or(0.0)
    }

    /// All coefficients in ACN order
    pub fn coeffs(&self) -> &[Sample] {
        &self.coeffs
    }
}
