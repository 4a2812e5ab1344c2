//! # defect-inspect CLI
//!
//! Command-line interface for the defect inspector.
//!
//! ## Usage
//! ```bash
//! defect-inspect hog images/ --reference images/reference.jpg
//! defect-inspect embedding images/ --weights resnet18.safetensors --threshold 0.99
//! defect-inspect sift images/ --output json
//! ```

mod cli;

use defect_inspector::Result;

fn main() -> Result<()> {
    cli::run()
}
