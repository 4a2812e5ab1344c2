//! File filtering logic for directory expansion.

use std::collections::HashSet;
use std::path::Path;

/// Filters files to determine if they are decodable images
pub struct ImageFilter {
    /// File extensions to include, lowercase
    extensions: HashSet<String>,
    /// Whether to include hidden files
    include_hidden: bool,
}

impl ImageFilter {
    /// Create a new filter with the default supported extensions
    pub fn new() -> Self {
        Self {
            extensions: ["jpg", "jpeg", "png", "bmp", "tif", "tiff", "webp", "gif"]
                .into_iter()
                .map(String::from)
                .collect(),
            include_hidden: false,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Override the list of extensions to accept
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions.into_iter().map(|e| e.to_lowercase()).collect();
        self
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        if !self.include_hidden && is_hidden(path) {
            return false;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new()
    }
}

pub(super) fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_includes_jpeg_any_case() {
        let filter = ImageFilter::new();
        assert!(filter.should_include(Path::new("/line/part.jpg")));
        assert!(filter.should_include(Path::new("/line/part.JPEG")));
    }

    #[test]
    fn filter_excludes_non_images() {
        let filter = ImageFilter::new();
        assert!(!filter.should_include(Path::new("/line/notes.txt")));
        assert!(!filter.should_include(Path::new("/line/weights.safetensors")));
    }

    #[test]
    fn filter_excludes_hidden_by_default() {
        let filter = ImageFilter::new();
        assert!(!filter.should_include(Path::new("/line/.part.png")));
        assert!(ImageFilter::new()
            .with_hidden(true)
            .should_include(Path::new("/line/.part.png")));
    }

    #[test]
    fn filter_handles_no_extension() {
        assert!(!ImageFilter::new().should_include(Path::new("/line/README")));
    }

    #[test]
    fn custom_extensions_replace_defaults() {
        let filter = ImageFilter::new().with_extensions(vec!["PNG".to_string()]);
        assert!(filter.should_include(Path::new("a.png")));
        assert!(!filter.should_include(Path::new("a.jpg")));
    }
}
