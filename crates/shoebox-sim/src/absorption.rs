//! Frequency-dependent wall absorption
//!
//! Produces one echogram per octave band from the directional echogram.
//! Each wall's reflection coefficient is sqrt(1 - absorption); an image's
//! attenuation is the product of the per-wall coefficients raised to the
//! number of bounces off that wall, derived from the signed per-axis
//! reflection order.

use crate::echogram::Echogram;
use crate::error::SimResult;
use crate::room::Room;

/// Bounce counts (low wall, high wall) for a signed per-axis order.
///
/// Even orders split evenly; odd orders give the extra bounce to the high
/// wall when the order is positive, the low wall when negative.
#[inline]
fn bounce_split(order: i32) -> (u32, u32) {
    let n = order.unsigned_abs();
    if n % 2 == 0 {
        (n / 2, n / 2)
    } else if order > 0 {
        (n / 2, n / 2 + 1)
    } else {
        (n / 2 + 1, n / 2)
    }
}

/// Apply band `band`'s wall absorption to the directional echogram.
///
/// `out` becomes an independent copy of `directional` with every channel's
/// magnitude scaled by the image's total reflection loss; it is resized to
/// match the directional echogram exactly.
pub fn apply_absorption(
    directional: &Echogram,
    room: &Room,
    band: usize,
    out: &mut Echogram,
) -> SimResult<()> {
    let num_images = directional.num_image_sources();
    let num_channels = directional.num_channels();
    out.resize(num_images, num_channels)?;

    out.times_mut().copy_from_slice(directional.times());
    out.orders_mut().copy_from_slice(directional.orders());
    out.coords_mut().copy_from_slice(directional.coords());

    // Reflection coefficients per wall for this band
    let alpha = &room.absorption[band];
    let wall_coef: [f32; 6] = std::array::from_fn(|w| (1.0 - alpha[w]).sqrt());

    for image in 0..num_images {
        let orders = directional.orders()[image];
        let mut attenuation = 1.0f32;
        for axis in 0..3 {
            let (low, high) = bounce_split(orders[axis]);
            attenuation *= wall_coef[axis * 2].powi(low as i32);
            attenuation *= wall_coef[axis * 2 + 1].powi(high as i32);
        }

        for channel in 0..num_channels {
            out.values_mut(channel)[image] = directional.values(channel)[image] * attenuation;
        }
    }

    Ok(())
}
