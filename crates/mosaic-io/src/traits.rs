//! Tile source and canvas sink traits.
//!
//! The assembly driver talks to the pixel codec only through these two
//! contracts: open-by-path, read-rectangle, write-rectangle-at-offset,
//! finish. Nothing else about the file format leaks into the driver,
//! so a different codec backend can be swapped in behind them.
//!
//! # Resource discipline
//!
//! Both handles are RAII-scoped: dropping a [`TileSource`] releases its
//! file handle, and dropping a [`CanvasSink`] without calling
//! [`finish`](CanvasSink::finish) discards any scratch state rather
//! than leaving a file that looks complete. On the error path the
//! driver simply unwinds and the handles clean up after themselves.

use mosaic_core::{Block, MosaicResult, PixelLayout};

/// A single open tile, readable in bounded-size blocks.
pub trait TileSource {
    /// Returns the tile's pixel dimensions (width, height).
    fn dimensions(&self) -> (u32, u32);

    /// Returns the tile's pixel layout.
    fn layout(&self) -> PixelLayout;

    /// Reads the rectangle at `(x, y)` with extent `(width, height)`.
    ///
    /// The rectangle must lie entirely within `[0, width) x [0, height)`
    /// of the tile; anything else fails with
    /// [`MosaicError::OutOfBounds`](mosaic_core::MosaicError::OutOfBounds).
    fn read_block(&mut self, x: u32, y: u32, width: u32, height: u32) -> MosaicResult<Block>;
}

/// The output mosaic, writable in blocks at arbitrary offsets.
///
/// # Lifecycle
///
/// `set_dimensions` must be called exactly once, before any write.
/// Calling it again fails with `CanvasAlreadySized`, or with
/// `CanvasAlreadyWritten` once a block has landed. Writing before
/// sizing fails with `CanvasUnsized`. `finish` flushes and finalizes
/// the output exactly once.
pub trait CanvasSink {
    /// Returns the canvas dimensions, or `None` before `set_dimensions`.
    fn dimensions(&self) -> Option<(u32, u32)>;

    /// Returns the pixel layout inherited from the reference image.
    fn layout(&self) -> PixelLayout;

    /// Fixes the canvas extent. Must be called once, before any write.
    fn set_dimensions(&mut self, width: u32, height: u32) -> MosaicResult<()>;

    /// Copies `block` so its top-left corner lands at `(x, y)`.
    ///
    /// The block must lie entirely within the canvas; writes outside
    /// bounds fail with `OutOfBounds`. Blocks whose layout differs from
    /// the canvas fail with `LayoutMismatch`.
    fn write_block(&mut self, x: u32, y: u32, block: &Block) -> MosaicResult<()>;

    /// Flushes all pending data and finalizes the output file.
    fn finish(self: Box<Self>) -> MosaicResult<()>;
}

/// Boxed tile source for dynamic dispatch.
pub type BoxedTileSource = Box<dyn TileSource>;

/// Boxed canvas sink for dynamic dispatch.
pub type BoxedCanvasSink = Box<dyn CanvasSink>;
