//! 3D position type and spherical conversion

use serde::{Deserialize, Serialize};

/// 3D position in room coordinates (meters)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position3D {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
    /// Z coordinate (up)
    pub z: f32,
}

impl Position3D {
    /// Create new position
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Origin position
    pub fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Get magnitude (distance from origin)
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Distance to another point
    pub fn distance_to(&self, other: &Self) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Component-wise difference `self - other`
    pub fn offset_from(&self, other: &Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Convert to spherical coordinates
    pub fn to_spherical(&self) -> SphericalCoord {
        let distance = self.magnitude();
        if distance < 1e-10 {
            return SphericalCoord {
                azimuth: 0.0,
                elevation: 0.0,
                distance: 0.0,
            };
        }

        let azimuth = self.x.atan2(self.y).to_degrees();
        let elevation = (self.z / distance).asin().to_degrees();

        SphericalCoord {
            azimuth,
            elevation,
            distance,
        }
    }
}

impl Default for Position3D {
    fn default() -> Self {
        Self::origin()
    }
}

/// Spherical coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphericalCoord {
    /// Azimuth in degrees (-180 to 180, 0 = +y, positive toward +x)
    pub azimuth: f32,
    /// Elevation in degrees (-90 to 90, positive = up)
    pub elevation: f32,
    /// Distance from origin
    pub distance: f32,
}
