//! Error types for reducing, encoding and decoding mosaics.

use crate::grid::Mode;
use thiserror::Error;

/// Result type for mosaic operations.
pub type Result<T, E = MosaicError> = std::result::Result<T, E>;

/// Errors produced by the codec itself.
///
/// None of these are recoverable at this layer; the caller decides whether to
/// abort or fall back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MosaicError {
    /// Grid dimensions are below 1 or do not fit the signed 32 bit header fields.
    #[error("Invalid grid dimensions: {threads} threads x {crosses} crosses. Both must be between 1 and 2^31-1.")]
    InvalidDimensions {
        /// Requested column count
        threads: i64,
        /// Requested row count
        crosses: i64,
    },

    /// The pixel array's channel axis does not fit the requested mode.
    #[error("Pixel array with {channels} channel(s) cannot be reduced in {mode:?} mode.")]
    InvalidChannelShape {
        /// The requested mode
        mode: Mode,
        /// Channels present in the pixel array
        channels: usize,
    },

    /// Pixel data does not fill the declared shape, or the shape itself is
    /// unusable (no channels, or more samples than fit in memory).
    #[error("Pixel buffer of {actual} samples does not fit a {rows}x{cols}x{channels} array.")]
    InvalidPixelBuffer {
        rows: usize,
        cols: usize,
        channels: usize,
        actual: usize,
    },

    /// One of the two header markers is missing or wrong.
    #[error("Malformed header: {0}")]
    MalformedHeader(&'static str),

    /// Fewer payload bits remain than the header declares.
    #[error("Truncated payload: need {needed} bits, but only {available} bits available.")]
    TruncatedPayload {
        /// Payload bits declared by the header
        needed: u64,
        /// Payload bits present in the input
        available: u64,
    },

    /// The mode could not be mapped to a known variant.
    #[error("Invalid mode: {0}")]
    InvalidMode(u32),

    /// Text rendition could not be parsed.
    #[error("Invalid text mosaic at line {line}: {reason}")]
    InvalidText {
        /// 1-based line number
        line: usize,
        reason: String,
    },
}

/// Errors from the file helpers in [`crate::io`].
#[derive(Debug, Error)]
pub enum FileError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image could not be decoded or encoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// The mosaic itself is invalid
    #[error("Mosaic error: {0}")]
    Mosaic(#[from] MosaicError),
}

impl From<tempfile::PersistError> for FileError {
    fn from(e: tempfile::PersistError) -> Self {
        Self::Io(e.error)
    }
}
