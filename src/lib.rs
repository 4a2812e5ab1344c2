//! # Defect Inspector
//!
//! Flags defective product photos by comparing each candidate against a
//! single reference image.
//!
//! ## Analyzers
//! - **ResNet** - cosine similarity of 512-d embeddings against a threshold
//! - **HOG** - near-equality of the leading gradient-histogram bins
//! - **Harris** - near-equality of the full corner-response map
//! - **SIFT** - any scale-space keypoint flags the image
//!
//! ## Architecture
//! - `core` - Extraction, comparison and batch orchestration
//! - `events` - Event-driven progress and similarity reporting
//! - `error` - Error types with path and shape context

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{InspectorError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. `default_level`
/// applies when `RUST_LOG` is unset.
pub fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    // A subscriber installed earlier (e.g. by a test harness) stays in place
    let _ = tracing::subscriber::set_global_default(subscriber);
}
