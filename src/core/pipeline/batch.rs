//! Reference/candidate split of an input listing.

use crate::error::{InspectorError, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// One reference path and the ordered candidates judged against it
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    reference: PathBuf,
    candidates: Vec<PathBuf>,
}

impl Batch {
    /// Build a batch whose reference may or may not appear in `paths`.
    ///
    /// Paths are matched after [`normalize_path`]. Every spelling of the
    /// reference is dropped from the candidates, and a candidate listed
    /// more than once is kept at its first position only.
    pub fn new(paths: &[PathBuf], reference: &Path) -> Self {
        let mut seen = HashSet::from([normalize_path(reference)]);
        Self {
            reference: reference.to_path_buf(),
            candidates: paths
                .iter()
                .filter(|p| seen.insert(normalize_path(p)))
                .cloned()
                .collect(),
        }
    }

    /// Build a batch from a listing that must contain the reference.
    pub fn from_listing(paths: &[PathBuf], reference: &Path) -> Result<Self> {
        let key = normalize_path(reference);
        if !paths.iter().any(|p| normalize_path(p) == key) {
            return Err(InspectorError::MissingReference {
                path: reference.to_path_buf(),
            });
        }
        Ok(Self::new(paths, reference))
    }

    /// Reference image path
    pub fn reference(&self) -> &Path {
        &self.reference
    }

    /// Candidates in input order
    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// True when there is nothing to judge
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Canonical form of `path` when it exists, otherwise the path without
/// `.` components.
pub fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| {
        path.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    })
}

/// `paths` without repeats, in first-seen order.
pub fn unique_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .iter()
        .filter(|p| seen.insert(normalize_path(p)))
        .cloned()
        .collect()
}

/// File name of `path`, or the whole path when it has none
pub fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn reference_is_removed_from_candidates() {
        let listing = paths(&["a.png", "images/reference.jpg", "b.png"]);
        let batch = Batch::from_listing(&listing, Path::new("images/reference.jpg")).unwrap();
        assert_eq!(batch.candidates(), paths(&["a.png", "b.png"]).as_slice());
        assert_eq!(batch.reference(), Path::new("images/reference.jpg"));
    }

    #[test]
    fn listing_without_reference_is_rejected() {
        let listing = paths(&["a.png", "b.png"]);
        let result = Batch::from_listing(&listing, Path::new("ref.png"));
        assert!(matches!(result, Err(InspectorError::MissingReference { .. })));
    }

    #[test]
    fn new_accepts_external_reference() {
        let batch = Batch::new(&paths(&["a.png", "b.png"]), Path::new("ref.png"));
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn reference_only_listing_is_empty() {
        let batch = Batch::from_listing(&paths(&["ref.png"]), Path::new("ref.png")).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn dot_prefixed_listing_finds_reference() {
        let listing = paths(&["./images/reference.jpg", "images/a.jpg"]);
        let batch = Batch::from_listing(&listing, Path::new("images/reference.jpg")).unwrap();
        assert_eq!(batch.candidates(), paths(&["images/a.jpg"]).as_slice());
    }

    #[test]
    fn existing_files_match_through_canonical_paths() {
        let dir = TempDir::new().unwrap();
        let reference = dir.path().join("ref.png");
        fs::write(&reference, b"").unwrap();
        let nested = dir.path().join("sub");
        fs::create_dir(&nested).unwrap();

        let listing = vec![nested.join("..").join("ref.png"), dir.path().join("a.png")];
        let batch = Batch::from_listing(&listing, &reference).unwrap();
        assert_eq!(batch.candidates(), &[dir.path().join("a.png")]);
    }

    #[test]
    fn repeated_candidates_are_judged_once() {
        let listing = paths(&["c.png", "ref.png", "c.png", "./c.png", "d.png"]);
        let batch = Batch::from_listing(&listing, Path::new("ref.png")).unwrap();
        assert_eq!(batch.candidates(), paths(&["c.png", "d.png"]).as_slice());
    }

    #[test]
    fn unique_paths_keeps_first_seen_order() {
        let listing = paths(&["b.png", "a.png", "./b.png", "a.png"]);
        assert_eq!(unique_paths(&listing), paths(&["b.png", "a.png"]));
    }

    #[test]
    fn basename_strips_directories() {
        assert_eq!(basename(Path::new("/data/images/part_01.png")), "part_01.png");
        assert_eq!(basename(Path::new("plain.jpg")), "plain.jpg");
    }
}
