// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image discovery — recursive walk of the input root.
//
// A file is a candidate when its extension is one of the supported raster
// formats and its base name matches the (case-insensitive) glob pattern.
// Results are deduplicated by canonical path and sorted by full path, so the
// same tree always yields the same sequence.

use std::collections::HashSet;
use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use folio_core::error::{FolioError, Result};
use folio_core::types::{DiscoveredItem, MATCH_ALL, SourceFormat};

/// Walks an input tree and collects convertible images.
#[derive(Debug, Clone)]
pub struct ImageDiscoverer {
    /// Compiled base-name pattern.
    matcher: GlobMatcher,
}

impl ImageDiscoverer {
    /// Compile `pattern`. An empty pattern matches everything.
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = if pattern.trim().is_empty() {
            MATCH_ALL
        } else {
            pattern
        };
        let matcher = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| FolioError::InvalidPattern(format!("{pattern}: {e}")))?
            .compile_matcher();
        Ok(Self { matcher })
    }

    /// Whether `path` names a supported image whose base name matches.
    pub fn matches(&self, path: &Path) -> bool {
        if SourceFormat::from_path(path).is_none() {
            return false;
        }
        path.file_name()
            .is_some_and(|name| self.matcher.is_match(name))
    }

    /// Collect every matching image under `root`.
    ///
    /// Fails only if `root` is missing or not a directory. Unreadable entries
    /// below the root (e.g. a subdirectory without read permission) are
    /// skipped and logged, not reported as errors.
    #[instrument(skip(self), fields(root = %root.display()))]
    pub fn discover(&self, root: &Path) -> Result<Vec<DiscoveredItem>> {
        let meta = std::fs::metadata(root)
            .map_err(|e| FolioError::Discovery(format!("{}: {e}", root.display())))?;
        if !meta.is_dir() {
            return Err(FolioError::Discovery(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        let root = std::fs::canonicalize(root)
            .map_err(|e| FolioError::Discovery(format!("{}: {e}", root.display())))?;

        let mut items = Vec::new();
        let mut skipped = 0usize;

        for entry in WalkDir::new(&root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    skipped += 1;
                    warn!(
                        path = ?err.path(),
                        error = %err,
                        "skipping unreadable entry during discovery"
                    );
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.matches(entry.path()) {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&root) else {
                continue;
            };
            items.push(DiscoveredItem {
                source: entry.path().to_path_buf(),
                relative: relative.to_path_buf(),
            });
        }

        items.sort();

        // The same physical file reached through a symlink counts once; the
        // lexicographically first name wins.
        let mut seen = HashSet::new();
        items.retain(|item| {
            let key = std::fs::canonicalize(&item.source).unwrap_or_else(|_| item.source.clone());
            seen.insert(key)
        });

        if skipped > 0 {
            debug!(skipped, "discovery skipped unreadable entries");
        }
        info!(found = items.len(), "image discovery complete");
        Ok(items)
    }
}

/// Convenience wrapper: compile `pattern` and walk `root`.
pub fn discover(root: &Path, pattern: &str) -> Result<Vec<DiscoveredItem>> {
    ImageDiscoverer::new(pattern)?.discover(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    fn relatives(items: &[DiscoveredItem]) -> Vec<String> {
        items.iter().map(DiscoveredItem::name).collect()
    }

    #[test]
    fn pattern_filters_by_base_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.png", "b.png", "c.jpg", "d.jpg", "e.jpg"] {
            touch(dir.path(), name);
        }

        let items = discover(dir.path(), "*.png").unwrap();
        assert_eq!(relatives(&items), vec!["a.png", "b.png"]);
    }

    #[test]
    fn recurses_and_sorts_by_full_path() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "z.png");
        touch(dir.path(), "sub/b.jpeg");
        touch(dir.path(), "sub/deeper/a.gif");
        touch(dir.path(), "a.webp");

        let items = discover(dir.path(), MATCH_ALL).unwrap();
        assert_eq!(
            relatives(&items),
            vec!["a.webp", "sub/b.jpeg", "sub/deeper/a.gif", "z.png"]
        );
        assert!(items.iter().all(|item| item.source.is_absolute()));
    }

    #[test]
    fn rediscovery_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["q/1.png", "q/2.bmp", "r/3.tiff", "4.heic", "5.heif"] {
            touch(dir.path(), name);
        }
        let first = discover(dir.path(), MATCH_ALL).unwrap();
        let second = discover(dir.path(), MATCH_ALL).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }

    #[test]
    fn extensions_and_pattern_are_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "Scan_01.PNG");
        touch(dir.path(), "scan_02.Jpg");
        touch(dir.path(), "photo.JPEG");

        let items = discover(dir.path(), "scan_*").unwrap();
        assert_eq!(relatives(&items), vec!["Scan_01.PNG", "scan_02.Jpg"]);
    }

    #[test]
    fn unsupported_files_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "doc.pdf");
        touch(dir.path(), "noext");
        touch(dir.path(), "ok.bmp");

        let items = discover(dir.path(), "").unwrap();
        assert_eq!(relatives(&items), vec!["ok.bmp"]);
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(dir.path(), MATCH_ALL).unwrap().is_empty());
    }

    #[test]
    fn missing_root_is_a_discovery_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = discover(&dir.path().join("nope"), MATCH_ALL);
        assert!(matches!(result, Err(FolioError::Discovery(_))));
    }

    #[test]
    fn file_root_is_a_discovery_error() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "single.png");
        let result = discover(&dir.path().join("single.png"), MATCH_ALL);
        assert!(matches!(result, Err(FolioError::Discovery(_))));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let result = ImageDiscoverer::new("[unclosed");
        assert!(matches!(result, Err(FolioError::InvalidPattern(_))));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_file_is_counted_once() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "real/photo.png");
        fs::create_dir_all(dir.path().join("alias")).unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("real/photo.png"),
            dir.path().join("alias/photo.png"),
        )
        .unwrap();

        let items = discover(dir.path(), MATCH_ALL).unwrap();
        assert_eq!(relatives(&items), vec!["alias/photo.png"]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_does_not_fail_discovery() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "visible.png");
        touch(dir.path(), "locked/hidden.png");
        let locked: PathBuf = dir.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let result = discover(dir.path(), MATCH_ALL);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        // Privileged users can still read the locked directory, so only the
        // visible file is guaranteed.
        let names = relatives(&result.expect("discovery succeeds"));
        assert!(names.contains(&"visible.png".to_owned()));
    }
}
