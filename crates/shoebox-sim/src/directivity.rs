//! Receiver directivity
//!
//! Converts the mono geometric echogram into a multi-channel directional
//! echogram by weighting each image source with the receiver's angular
//! response, evaluated at the image's direction of arrival.

use serde::{Deserialize, Serialize};
use shoebox_dsp::sh::{self, ShBasis};

use crate::echogram::Echogram;
use crate::error::{SimError, SimResult};

/// Receiver directivity model.
///
/// A closed variant set: new receiver types extend this enum and its
/// dispatch below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directivity {
    /// Real spherical-harmonic response of the given order
    /// ((order + 1)^2 channels; order 0 is omnidirectional)
    SphericalHarmonic(usize),
}

impl Directivity {
    /// Number of output channels this directivity produces
    pub fn num_channels(&self) -> usize {
        match self {
            Directivity::SphericalHarmonic(order) => sh::channel_count(*order),
        }
    }

    /// Reject configurations the basis evaluation cannot satisfy
    pub fn validate(&self) -> SimResult<()> {
        match self {
            Directivity::SphericalHarmonic(order) if *order > sh::MAX_SH_ORDER => {
                Err(SimError::UnsupportedShOrder {
                    max: sh::MAX_SH_ORDER,
                    got: *order,
                })
            }
            Directivity::SphericalHarmonic(_) => Ok(()),
        }
    }
}

/// Weight the geometric echogram into the directional one.
///
/// Preserves ascending-time order: images are processed in place without
/// reordering, and the sort permutation carries over.
pub fn apply_directivity(
    geometric: &Echogram,
    directivity: Directivity,
    out: &mut Echogram,
) -> SimResult<()> {
    let num_images = geometric.num_image_sources();
    let num_channels = directivity.num_channels();
    out.resize(num_images, num_channels)?;

    out.times_mut().copy_from_slice(geometric.times());
    out.orders_mut().copy_from_slice(geometric.orders());
    out.coords_mut().copy_from_slice(geometric.coords());

    match directivity {
        Directivity::SphericalHarmonic(order) => {
            if order == 0 {
                // Omnidirectional: broadcast the mono magnitudes
                out.values_mut(0).copy_from_slice(geometric.values(0));
                return Ok(());
            }

            let mut basis = ShBasis::new(order);
            for image in 0..num_images {
                let direction = geometric.coords()[image].to_spherical();
                basis.compute_for_direction(direction.azimuth, direction.elevation);

                let mono = geometric.values(0)[image];
                for channel in 0..num_channels {
                    out.values_mut(channel)[image] = mono * basis.get(channel);
                }
            }
        }
    }

    Ok(())
}
