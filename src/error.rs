//! Error types for Reprise operations.
//!
//! This module defines [`RepriseError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `RepriseError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `RepriseError::Other`) for unexpected errors
//! - Per-step failures during a run are logged and swallowed by the engine;
//!   packaging and marketplace failures always surface as one of the variants
//!   below

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for Reprise operations.
#[derive(Debug, Error)]
pub enum RepriseError {
    /// Named Component does not exist in the component store.
    #[error("Unknown component: {name}")]
    UnknownComponent { name: String },

    /// Named Assembly does not exist in the assembly store.
    #[error("Unknown assembly: {name}")]
    UnknownAssembly { name: String },

    /// A run was requested while another run is active.
    #[error("A run is already in progress")]
    RunInProgress,

    /// Failed to parse a persisted store document.
    #[error("Failed to parse store at {path}: {message}")]
    StoreParseError { path: PathBuf, message: String },

    /// A step's wire form could not be decoded.
    #[error("Invalid step '{kind}': {message}")]
    InvalidStep { kind: String, message: String },

    /// Reading or unpacking an interchange archive failed.
    #[error("Failed to read package {path}: {message}")]
    PackageReadError { path: PathBuf, message: String },

    /// Producing an interchange archive failed.
    #[error("Failed to write package {path}: {message}")]
    PackageWriteError { path: PathBuf, message: String },

    /// Marketplace rejected the credentials or token.
    #[error("Marketplace authentication failed: {message}")]
    MarketAuth { message: String },

    /// Marketplace refused the request (insufficient points, missing item, ...).
    #[error("Marketplace refused the request: {message}")]
    MarketDenied { message: String },

    /// Network-level marketplace failure.
    #[error("Marketplace request failed: {0}")]
    MarketTransport(#[from] reqwest::Error),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Reprise operations.
pub type Result<T> = std::result::Result<T, RepriseError>;
