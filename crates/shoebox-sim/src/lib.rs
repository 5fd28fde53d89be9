//! Shoebox room acoustic simulation
//!
//! Image-source simulation of rectangular rooms: echogram computation with
//! frequency-dependent wall absorption and spherical-harmonic receiver
//! directivity, broadband room impulse response rendering through an
//! octave filterbank, and a real-time streaming path that applies the
//! echograms to audio with click-free cross-fades on scene changes.
//!
//! The [`Scene`] type is the entry point: populate a [`Room`] with sources
//! and receivers, call [`Scene::compute_echograms`], then either render
//! RIRs offline or stream frames through [`Scene::apply_echograms_td`].
//!
//! A `Scene` is single-threaded by design; it is `Send` but not shared,
//! and all processing happens on the calling thread.

pub mod absorption;
pub mod directivity;
pub mod echogram;
pub mod error;
pub mod image_source;
pub mod position;
pub mod rir;
pub mod room;
pub mod scene;

mod slots;
mod stream;
mod workspace;

pub use directivity::Directivity;
pub use echogram::Echogram;
pub use error::{SimError, SimResult};
pub use image_source::EchogramBound;
pub use position::{Position3D, SphericalCoord};
pub use rir::Rir;
pub use room::{NUM_WALLS, OctaveBands, Room};
pub use scene::{ReceiverId, Scene, SourceId};
pub use workspace::WorkspaceState;

/// Maximum number of simultaneous sources in a scene
pub const MAX_ROOM_SOURCES: usize = 64;

/// Maximum number of simultaneous receivers in a scene
pub const MAX_ROOM_RECEIVERS: usize = 16;

/// Maximum streamed frame length in samples
pub const MAX_FRAME_SIZE: usize = 4096;

/// Delay ring capacity in samples, power of two for cheap index wrapping
pub const RING_BUFFER_LENGTH: usize = 1 << 15;
