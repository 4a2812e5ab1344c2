//! # Error Module
//!
//! Error types for the defect inspector.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, shapes, what went wrong
//! - **Fail the batch** - any error ends the enclosing inspection run

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum InspectorError {
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    #[error("Reference image {path} is not part of the batch")]
    MissingReference { path: PathBuf },

    #[error("Comparison error: {0}")]
    Comparison(#[from] ComparisonError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while locating or decoding an image
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Image not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to open image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Image is empty or corrupted: {path}")]
    EmptyImage { path: PathBuf },

    #[error("Failed to read directory {path}: {reason}")]
    ReadDirectory { path: PathBuf, reason: String },
}

/// Errors raised when an image or parameter violates an extractor precondition
#[derive(Error, Debug, PartialEq)]
pub enum InvalidInputError {
    #[error("Image of {height}x{width} is not a multiple of the {cell}x{cell} cell size")]
    NotCellAligned {
        height: usize,
        width: usize,
        cell: usize,
    },

    #[error("Image of {height}x{width} is smaller than one {cell}x{cell} cell")]
    TooSmall {
        height: usize,
        width: usize,
        cell: usize,
    },

    #[error("Parameter {name} must be greater than zero")]
    ZeroParameter { name: &'static str },
}

/// Errors that occur while comparing two descriptors
#[derive(Error, Debug, PartialEq)]
pub enum ComparisonError {
    #[error("Descriptor shape mismatch: reference {reference:?}, candidate {candidate:?}")]
    ShapeMismatch {
        reference: Vec<usize>,
        candidate: Vec<usize>,
    },
}

/// Errors from the pretrained embedding network
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model weights not found at {path}")]
    WeightsNotFound { path: PathBuf },

    #[error("Failed to load model weights from {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("Inference failed: {0}")]
    Inference(String),
}

impl From<candle_core::Error> for ModelError {
    fn from(error: candle_core::Error) -> Self {
        ModelError::Inference(error.to_string())
    }
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, InspectorError>;
