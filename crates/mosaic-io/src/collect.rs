//! Tile set collection.
//!
//! Enumerates a flat directory, keeps files whose full dot-suffix
//! matches the placement scheme, orders them lexicographically, and
//! parses every placement up front. The order is the contract: re-runs
//! process tiles identically, and overlapping placements resolve
//! last-writer-wins in this order. Parsing up front means a bad name
//! aborts the run before the canvas is even created.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use mosaic_core::{MosaicError, MosaicResult, PlacementScheme};

/// A tile discovered during collection, placement already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedTile {
    /// Path to the tile file.
    pub path: PathBuf,
    /// Destination origin (x, y) on the canvas, in pixels.
    pub origin: (u32, u32),
}

/// Collects the tile set from `dir` in deterministic order.
///
/// Only regular files whose full composite suffix equals the scheme's
/// suffix are considered (`foo.tif` never matches `.ome.tif`). Every
/// kept name must parse; an unparseable name fails the whole run with
/// [`MosaicError::InvalidTileName`] rather than being skipped.
pub fn collect_tiles(
    dir: &Path,
    scheme: &dyn PlacementScheme,
) -> MosaicResult<Vec<CollectedTile>> {
    let entries = fs::read_dir(dir).map_err(|source| MosaicError::DirectoryUnreadable {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| MosaicError::DirectoryUnreadable {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !scheme.matches(name) || !path.is_file() {
            continue;
        }
        paths.push(path);
    }

    paths.sort();
    debug!(dir = %dir.display(), count = paths.len(), "collected tile candidates");

    paths
        .into_iter()
        .map(|path| {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            let origin = scheme.parse(name)?;
            Ok(CollectedTile { path, origin })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mosaic_core::GridFilenameScheme;
    use std::fs::File;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).expect("touch");
    }

    #[test]
    fn test_collects_sorted_and_filtered() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "x100_y0.ome.tif");
        touch(dir.path(), "x0_y0.ome.tif");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "partial.tif"); // bare .tif is not a tile
        // Directory whose name looks like a tile.
        std::fs::create_dir(dir.path().join("x9_y9.ome.tif")).expect("subdir");

        let scheme = GridFilenameScheme::default();
        let tiles = collect_tiles(dir.path(), &scheme).expect("collect");

        let names: Vec<_> = tiles
            .iter()
            .map(|t| t.path.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["x0_y0.ome.tif", "x100_y0.ome.tif"]);
        assert_eq!(tiles[0].origin, (0, 0));
        assert_eq!(tiles[1].origin, (100, 0));
    }

    #[test]
    fn test_bad_name_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "x0_y0.ome.tif");
        touch(dir.path(), "bad_name.ome.tif");

        let scheme = GridFilenameScheme::default();
        let err = collect_tiles(dir.path(), &scheme).unwrap_err();
        assert!(
            matches!(err, MosaicError::InvalidTileName(ref n) if n == "bad_name.ome.tif"),
            "got {err:?}"
        );
    }

    #[test]
    fn test_unreadable_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope");

        let scheme = GridFilenameScheme::default();
        let err = collect_tiles(&missing, &scheme).unwrap_err();
        assert!(matches!(err, MosaicError::DirectoryUnreadable { .. }));
    }

    #[test]
    fn test_empty_directory_is_empty_set() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scheme = GridFilenameScheme::default();
        assert!(collect_tiles(dir.path(), &scheme).expect("collect").is_empty());
    }
}
