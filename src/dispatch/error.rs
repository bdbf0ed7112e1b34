use thiserror::Error;

use crate::dispatch::{CompressionMode, DType, ElementKind};

/// Alias for the result type of compression and decompression calls.
pub type ZfpResult<T> = Result<T, ZfpError>;

/// Errors that can occur when compressing or decompressing an array.
///
/// Every variant up to and including [`ZfpError::InvalidModeParameters`] is
/// raised before any native handle is opened.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ZfpError {
    /// Element type is not one of `f32`, `f64`, `i32`, `i64`
    #[error("Unsupported element type {0}")]
    UnsupportedType(DType),

    /// Rank outside `1..=4`
    #[error("Unsupported rank {0}, expected 1 to 4 axes")]
    UnsupportedRank(usize),

    /// At least one axis has extent zero
    #[error("Array of shape {shape:?} has an empty axis")]
    EmptyArray {
        /// Declared shape of the array
        shape: Vec<usize>,
    },

    /// Memory is not row-major contiguous and element aligned
    #[error("Array memory is not row-major contiguous")]
    NonContiguous,

    /// Host buffer length does not match the declared shape
    #[error("Shape describes {expected} elements but the buffer holds {actual}")]
    ShapeMismatch {
        /// Element count implied by the shape
        expected: usize,
        /// Element count of the buffer
        actual: usize,
    },

    /// Missing, extraneous or out-of-domain mode parameter
    #[error("Invalid mode parameters: {0}")]
    InvalidModeParameters(#[from] ModeParameterError),

    /// The codec produced more bytes than the bitstream could hold
    #[error("Compressed output needs at least {required} bytes, bitstream holds {capacity}")]
    BufferTooSmall {
        /// Allocated bitstream capacity in bytes
        capacity: usize,
        /// Bytes the codec reported, or a lower bound when it could not say
        required: usize,
    },

    /// Opaque codec failure
    #[error("Codec failed with code {code}")]
    CodecError {
        /// Native status, uninterpreted
        code: i32,
    },

    /// The compressed buffer ends before the destination is fully decoded
    #[error("Compressed input of {available} bytes is truncated, decoding read {consumed}")]
    TruncatedInput {
        /// Length of the compressed buffer
        available: usize,
        /// Bytes the codec read, or a lower bound when it could not say
        consumed: usize,
    },

    /// The codec found the bitstream inconsistent with the requested mode
    #[error("Compressed input does not match the requested mode")]
    ModeMismatch,

    /// No field constructor for this `(kind, rank)` pair
    #[error("No field constructor for {kind} with rank {rank}")]
    InternalDispatchError {
        /// Element kind that was looked up
        kind: ElementKind,
        /// Rank that was looked up
        rank: usize,
    },
}

/// Reasons a [`Mode`](crate::Mode) or its parameters are rejected.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModeParameterError {
    /// The selected mode needs a parameter that was not supplied
    #[error("{mode} mode requires `{parameter}`")]
    Missing {
        /// Selected mode
        mode: CompressionMode,
        /// Name of the missing parameter
        parameter: &'static str,
    },

    /// A parameter was supplied that the selected mode does not take
    #[error("`{parameter}` does not apply to {mode} mode")]
    Extraneous {
        /// Selected mode
        mode: CompressionMode,
        /// Name of the extra parameter
        parameter: &'static str,
    },

    /// Rate must be positive and at most [`Mode::MAX_RATE`](crate::Mode::MAX_RATE)
    #[error("rate must be in (0, 4096], got {0}")]
    Rate(f64),

    /// Precision must be in `1..=max`
    #[error("precision must be in 1..={max} for {kind}, got {precision}")]
    Precision {
        /// Requested precision
        precision: u32,
        /// Largest precision the element kind supports
        max: u32,
        /// Element kind being compressed
        kind: ElementKind,
    },

    /// Tolerance must be finite and non-negative
    #[error("tolerance must be finite and non-negative, got {0}")]
    Tolerance(f64),

    /// Fixed-accuracy mode is only defined for floating-point data
    #[error("fixed-accuracy mode is not supported for {0} data")]
    AccuracyOnIntegers(ElementKind),
}
