//! Tile placement parsing.
//!
//! Tile positions are encoded in filenames: `x<digits>_y<digits>.ome.tif`
//! places the tile's top-left corner at those pixel coordinates on the
//! canvas. The [`PlacementScheme`] trait keeps the encoding swappable
//! (a side-car index file could implement it) without touching the
//! assembly driver.

use regex::Regex;

use crate::{MosaicError, MosaicResult};

/// Maps a tile file name to its placement on the canvas.
pub trait PlacementScheme {
    /// Returns true if `file_name` belongs to this scheme's tile set.
    ///
    /// Used during collection to filter directory entries; a name that
    /// matches the suffix but fails [`parse`](Self::parse) is a fatal
    /// [`MosaicError::InvalidTileName`], not a skip.
    fn matches(&self, file_name: &str) -> bool;

    /// Extracts the destination origin `(x, y)` in pixels.
    fn parse(&self, file_name: &str) -> MosaicResult<(u32, u32)>;
}

/// The `x<digits>_y<digits><suffix>` filename convention.
///
/// # Example
///
/// ```
/// use mosaic_core::placement::{GridFilenameScheme, PlacementScheme};
///
/// let scheme = GridFilenameScheme::default();
/// assert_eq!(scheme.parse("x1024_y2048.ome.tif").unwrap(), (1024, 2048));
/// assert!(scheme.parse("bad_name.ome.tif").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct GridFilenameScheme {
    pattern: Regex,
    suffix: String,
}

impl GridFilenameScheme {
    /// Creates a scheme for the given composite suffix (e.g. `.ome.tif`).
    pub fn new(suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        let pattern = Regex::new(&format!(r"^x(\d+)_y(\d+){}$", regex::escape(&suffix)))
            .expect("escaped suffix always yields a valid pattern");
        Self { pattern, suffix }
    }

    /// Returns the composite suffix tiles must carry.
    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl Default for GridFilenameScheme {
    fn default() -> Self {
        Self::new(".ome.tif")
    }
}

impl PlacementScheme for GridFilenameScheme {
    fn matches(&self, file_name: &str) -> bool {
        full_suffix(file_name) == self.suffix
    }

    fn parse(&self, file_name: &str) -> MosaicResult<(u32, u32)> {
        let captures = self
            .pattern
            .captures(file_name)
            .ok_or_else(|| MosaicError::InvalidTileName(file_name.to_string()))?;

        // Digit runs longer than u32 still fail cleanly via parse().
        let x = captures[1]
            .parse::<u32>()
            .map_err(|_| MosaicError::InvalidTileName(file_name.to_string()))?;
        let y = captures[2]
            .parse::<u32>()
            .map_err(|_| MosaicError::InvalidTileName(file_name.to_string()))?;

        Ok((x, y))
    }
}

/// Returns the full dot-suffix of a file name: all extensions joined.
///
/// `x0_y0.ome.tif` -> `.ome.tif`, `foo.tif` -> `.tif`. Leading dots do
/// not start a suffix (`.hidden` has none), and a trailing dot means
/// no suffix at all.
pub fn full_suffix(file_name: &str) -> &str {
    if file_name.ends_with('.') {
        return "";
    }
    let stem = file_name.trim_start_matches('.');
    match stem.find('.') {
        Some(idx) => &stem[idx..],
        None => "",
    }
}
