//! # Scanner Module
//!
//! Expands command-line inputs into an ordered list of image paths.
//!
//! Files are kept exactly as given, in the order given. Directories are
//! walked with walkdir and contribute their supported images in sorted
//! order. Repeats are kept here; the pipeline batch drops them.
//!
//! ## Example
//! ```rust,ignore
//! use defect_inspector::core::scanner::{expand_paths, ScanConfig};
//!
//! let paths = expand_paths(&["images".into()], &ScanConfig::default())?;
//! ```

mod filter;

pub use filter::ImageFilter;

use crate::error::ResourceError;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Configuration for directory expansion
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Custom extensions to include (None = use defaults)
    pub extensions: Option<Vec<String>>,
}

/// Expand files and directories into image paths.
pub fn expand_paths(inputs: &[PathBuf], config: &ScanConfig) -> Result<Vec<PathBuf>, ResourceError> {
    let mut image_filter = ImageFilter::new().with_hidden(config.include_hidden);
    if let Some(ref extensions) = config.extensions {
        image_filter = image_filter.with_extensions(extensions.clone());
    }

    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            paths.extend(scan_directory(input, config, &image_filter)?);
        } else {
            paths.push(input.clone());
        }
    }

    tracing::debug!(inputs = inputs.len(), images = paths.len(), "Inputs expanded");
    Ok(paths)
}

fn scan_directory(
    root: &PathBuf,
    config: &ScanConfig,
    image_filter: &ImageFilter,
) -> Result<Vec<PathBuf>, ResourceError> {
    let mut walker = WalkDir::new(root)
        .follow_links(config.follow_symlinks)
        .sort_by_file_name();
    if let Some(depth) = config.max_depth {
        walker = walker.max_depth(depth);
    }

    let include_hidden = config.include_hidden;
    let entries = walker
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || include_hidden || !filter::is_hidden(entry.path())
        });

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ResourceError::ReadDirectory {
            path: root.clone(),
            reason: e.to_string(),
        })?;

        if entry.file_type().is_file() && image_filter.should_include(entry.path()) {
            found.push(entry.into_path());
        }
    }

    Ok(found)
}
