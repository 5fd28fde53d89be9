//! Image-source geometry
//!
//! Generates mirrored virtual sources on an integer lattice and retains
//! those inside the configured bound. Per axis, lattice index `i` maps to
//! the coordinate `i * dim + (-1)^i * src`, expressed relative to the
//! receiver. The lattice itself is cached and only regenerated when the
//! bound or room dimensions change.

use log::trace;

use crate::echogram::Echogram;
use crate::error::SimResult;
use crate::position::Position3D;
use crate::room::Room;

/// Image-source selection bound.
///
/// Exactly one of reflection order or propagation time limits the set;
/// the enum makes supplying both (or neither) unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EchogramBound {
    /// Keep images with L1 reflection order (|i|+|j|+|k|) up to this value
    MaxOrder(u32),
    /// Keep images closer than `speed_of_sound * max_time` meters
    MaxTime(f32),
}

/// Cached reflection lattice for one workspace
#[derive(Debug, Clone, Default)]
pub struct LatticeCache {
    key: Option<[i32; 3]>,
    indices: Vec<[i32; 3]>,
}

impl LatticeCache {
    /// Lattice indices for the given per-axis extents, regenerating only
    /// when the extents changed.
    fn indices(&mut self, extent: [i32; 3]) -> &[[i32; 3]] {
        if self.key != Some(extent) {
            trace!("regenerating image lattice, extent {extent:?}");
            self.indices.clear();
            for i in -extent[0]..=extent[0] {
                for j in -extent[1]..=extent[1] {
                    for k in -extent[2]..=extent[2] {
                        self.indices.push([i, j, k]);
                    }
                }
            }
            self.key = Some(extent);
        }
        &self.indices
    }
}

/// Mirrored coordinate for lattice index `i` along one axis
#[inline]
fn mirror(i: i32, dim: f32, src: f32) -> f32 {
    let sign = if i.rem_euclid(2) == 0 { 1.0 } else { -1.0 };
    i as f32 * dim + sign * src
}

/// Per-axis lattice extents for a bound
fn extents(room: &Room, bound: EchogramBound) -> [i32; 3] {
    match bound {
        EchogramBound::MaxOrder(order) => [order as i32; 3],
        EchogramBound::MaxTime(max_time) => {
            let max_dist = max_time * room.speed_of_sound;
            [
                (max_dist / room.dimensions[0]).ceil() as i32,
                (max_dist / room.dimensions[1]).ceil() as i32,
                (max_dist / room.dimensions[2]).ceil() as i32,
            ]
        }
    }
}

/// Whether an image at `distance` with lattice index `idx` is retained
#[inline]
fn retained(idx: [i32; 3], distance: f32, room: &Room, bound: EchogramBound) -> bool {
    match bound {
        EchogramBound::MaxOrder(order) => {
            (idx[0].unsigned_abs() + idx[1].unsigned_abs() + idx[2].unsigned_abs()) <= order
        }
        EchogramBound::MaxTime(max_time) => distance < max_time * room.speed_of_sound,
    }
}

/// Compute the mono geometric echogram for one source/receiver pair.
///
/// The result is sorted ascending by propagation time; a zero-image
/// echogram (everything outside the bound) is valid.
pub fn compute_geometry(
    room: &Room,
    source: &Position3D,
    receiver: &Position3D,
    bound: EchogramBound,
    cache: &mut LatticeCache,
    out: &mut Echogram,
) -> SimResult<()> {
    let [dx, dy, dz] = room.dimensions;
    let lattice = cache.indices(extents(room, bound));

    // First pass: count retained images so the echogram resizes once.
    let mut count = 0;
    for &idx in lattice {
        let offset = Position3D::new(
            mirror(idx[0], dx, source.x) - receiver.x,
            mirror(idx[1], dy, source.y) - receiver.y,
            mirror(idx[2], dz, source.z) - receiver.z,
        );
        if retained(idx, offset.magnitude(), room, bound) {
            count += 1;
        }
    }

    out.resize(count, 1)?;

    let mut slot = 0;
    for &idx in lattice {
        let offset = Position3D::new(
            mirror(idx[0], dx, source.x) - receiver.x,
            mirror(idx[1], dy, source.y) - receiver.y,
            mirror(idx[2], dz, source.z) - receiver.z,
        );
        let distance = offset.magnitude();
        if !retained(idx, distance, room, bound) {
            continue;
        }

        out.times_mut()[slot] = distance / room.speed_of_sound;
        // Spherical spreading, clamped to unity inside 1 m
        out.values_mut(0)[slot] = if distance <= 1.0 { 1.0 } else { 1.0 / distance };
        out.orders_mut()[slot] = idx;
        out.coords_mut()[slot] = offset;
        slot += 1;
    }

    out.sort_by_time();
    trace!("geometric echogram: {count} image sources within {bound:?}");
    Ok(())
}
