//! Error types for the shoebox room simulator

use thiserror::Error;

/// Simulator error types
#[derive(Error, Debug)]
pub enum SimError {
    /// Fixed source capacity exhausted
    #[error("Maximum sources exceeded: {max}")]
    MaxSourcesExceeded { max: usize },

    /// Fixed receiver capacity exhausted
    #[error("Maximum receivers exceeded: {max}")]
    MaxReceiversExceeded { max: usize },

    /// Stale or never-issued source handle
    #[error("Unknown source id (index {index}, generation {generation})")]
    UnknownSource { index: usize, generation: u32 },

    /// Stale or never-issued receiver handle
    #[error("Unknown receiver id (index {index}, generation {generation})")]
    UnknownReceiver { index: usize, generation: u32 },

    /// Invalid room parameter
    #[error("Invalid room parameter: {0}")]
    InvalidRoom(String),

    /// Receiver directivity order beyond the supported basis
    #[error("Unsupported spherical harmonic order {got} (max {max})")]
    UnsupportedShOrder { max: usize, got: usize },

    /// Octave band index outside the room's band set
    #[error("Band index {got} out of range ({count} bands)")]
    BandOutOfRange { count: usize, got: usize },

    /// Per-band echogram image count diverged from the directional echogram
    #[error("Image source count mismatch: expected {expected}, got {got}")]
    ImageCountMismatch { expected: usize, got: usize },

    /// Echograms must be computed before rendering or streaming.
    ///
    /// Fields carry slot indices; `source` is reserved by the error trait,
    /// hence `source_index`.
    #[error("Echograms not computed for pair (receiver {receiver_index}, source {source_index})")]
    EchogramNotComputed {
        receiver_index: usize,
        source_index: usize,
    },

    /// RIRs must be rendered before they can be read
    #[error("RIR not rendered for pair (receiver {receiver_index}, source {source_index})")]
    RirNotRendered {
        receiver_index: usize,
        source_index: usize,
    },

    /// Fractional-delay RIR rendering is not supported
    #[error("Fractional-delay RIR rendering is unsupported; render with fractional_delay = false")]
    FractionalRirUnsupported,

    /// Frame exceeds the compile-time streaming limit
    #[error("Frame too large: {got} samples (max {max})")]
    FrameTooLarge { max: usize, got: usize },

    /// Output buffer shape does not match the receiver
    #[error("Output buffer mismatch: expected {expected_channels} channels of >= {min_samples} samples")]
    OutputShapeMismatch {
        expected_channels: usize,
        min_samples: usize,
    },

    /// Input frame shorter than the requested sample count
    #[error("Input frame too short: {got} samples, need {need}")]
    InputFrameTooShort { need: usize, got: usize },

    /// Buffer allocation failed
    #[error("Allocation failure: {0}")]
    Allocation(String),
}

/// Result type for simulator operations
pub type SimResult<T> = Result<T, SimError>;
