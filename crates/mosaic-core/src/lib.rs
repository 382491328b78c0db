//! # mosaic-core
//!
//! Core types for assembling a large mosaic image from rectangular
//! tiles whose placement is encoded in their filenames.
//!
//! This crate is I/O-free. It provides:
//!
//! - [`MosaicError`] / [`MosaicResult`] - the error taxonomy shared by
//!   the whole pipeline (every error is fatal; there is no
//!   skip-and-continue or retry anywhere)
//! - [`PixelLayout`] - sample type and channel count shared by tiles
//!   and the canvas
//! - [`Block`] / [`block_grid`] - bounded-size pixel chunks and the
//!   row-major grid that partitions a tile into them
//! - [`PlacementScheme`] - filename-to-coordinates parsing, with the
//!   default `x<digits>_y<digits>.ome.tif` convention
//!
//! The actual TIFF reader/writer and the assembly driver live in
//! `mosaic-io`; the `mosaic` binary lives in `mosaic-cli`.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod block;
pub mod error;
pub mod pixel;
pub mod placement;

pub use block::{block_grid, Block, BlockRect, DEFAULT_BLOCK_SIZE};
pub use error::{MosaicError, MosaicResult};
pub use pixel::{PixelLayout, SampleType};
pub use placement::{full_suffix, GridFilenameScheme, PlacementScheme};
