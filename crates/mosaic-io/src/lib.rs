//! # mosaic-io
//!
//! TIFF-backed tile reading, canvas writing, and the mosaic assembly
//! driver.
//!
//! The driver in [`assemble`] moves pixel data from placed tiles into
//! one large output image in bounded-size blocks, so peak memory is
//! O(block_size^2) regardless of tile or canvas size:
//!
//! - [`TiffTile`] reads rectangular blocks from one tile at a time via
//!   the `tiff` crate's chunk API (no full decode)
//! - [`TiffCanvas`] accepts blocks at arbitrary offsets, spilling them
//!   to a scratch file, and encodes the final TIFF strip by strip at
//!   finish
//! - [`collect_tiles`] establishes the deterministic processing order
//!   and parses every filename placement up front
//! - [`Assembler`] ties it together, strictly sequentially
//!
//! The codec seam is the [`TileSource`] / [`CanvasSink`] trait pair;
//! nothing format-specific crosses it.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod assemble;
pub mod collect;
pub mod tiff;
pub mod traits;

pub use assemble::{AssembleConfig, Assembler, ProgressCallback};
pub use collect::{collect_tiles, CollectedTile};
pub use tiff::{TiffCanvas, TiffTile};
pub use traits::{BoxedCanvasSink, BoxedTileSource, CanvasSink, TileSource};
