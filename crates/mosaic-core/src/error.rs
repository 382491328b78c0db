//! Error types for mosaic assembly.
//!
//! Every error here is fatal to the run: the driver never skips a bad
//! tile or retries a failed read/write. Callers must treat any
//! non-success result as "discard the output".

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::pixel::PixelLayout;

/// Mosaic assembly error.
#[derive(Debug, Error)]
pub enum MosaicError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A collected file name does not encode a tile placement.
    #[error("invalid tile name: {0:?} does not match the placement pattern")]
    InvalidTileName(String),

    /// The tile directory cannot be listed.
    #[error("cannot list tile directory {path}: {source}")]
    DirectoryUnreadable {
        /// Directory that failed to enumerate.
        path: PathBuf,
        /// Underlying listing error.
        source: io::Error,
    },

    /// A requested read or write rectangle exceeds the image extent.
    #[error(
        "region {width}x{height}+{x}+{y} out of bounds for {extent_width}x{extent_height} image"
    )]
    OutOfBounds {
        /// Rectangle origin X.
        x: u32,
        /// Rectangle origin Y.
        y: u32,
        /// Rectangle width.
        width: u32,
        /// Rectangle height.
        height: u32,
        /// Image width.
        extent_width: u32,
        /// Image height.
        extent_height: u32,
    },

    /// A canvas write was attempted before `set_dimensions`.
    #[error("canvas dimensions have not been set")]
    CanvasUnsized,

    /// `set_dimensions` was called more than once.
    #[error("canvas dimensions are already set")]
    CanvasAlreadySized,

    /// `set_dimensions` was called after a write.
    #[error("canvas has already been written; dimensions are frozen")]
    CanvasAlreadyWritten,

    /// A tile's pixel layout differs from the canvas layout.
    #[error("pixel layout mismatch: tile is {tile}, canvas is {canvas}")]
    LayoutMismatch {
        /// Layout of the offending tile.
        tile: PixelLayout,
        /// Layout inherited from the reference image.
        canvas: PixelLayout,
    },

    /// Decoding error from the pixel codec.
    #[error("decode error: {0}")]
    Decode(String),

    /// Encoding error from the pixel codec.
    #[error("encode error: {0}")]
    Encode(String),

    /// Pixel format the assembler does not handle.
    #[error("unsupported pixel format: {0}")]
    UnsupportedFormat(String),
}

/// Result type for mosaic operations.
pub type MosaicResult<T> = Result<T, MosaicError>;
