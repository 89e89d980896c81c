//! Errors reported by the simulation core.

use std::io;
use thiserror::Error;

/// Errors that abort a simulation run.
///
/// Particle loss is never reported through this type, it is a regular
/// outcome recorded on each particle.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Input file {0} does not exist")]
    NoFile(String),

    #[error("Could not open input file {path}: {source}")]
    OpenFile { path: String, source: io::Error },

    #[error("Malformed structure line {line}: {message}")]
    InvalidStructureLine { line: usize, message: String },

    #[error("Invalid parameter for cell {index}: {message}")]
    InvalidCell { index: usize, message: String },

    #[error("Invalid parameter for segment {index}: {message}")]
    InvalidSegment { index: usize, message: String },

    #[error("Invalid beam configuration: {0}")]
    InvalidBeam(String),

    #[error("Invalid beam current: {0}")]
    InvalidCurrent(String),

    #[error("Invalid dump request for {file}: {message}")]
    InvalidDump { file: String, message: String },

    #[error("Unsupported dump format: {0}")]
    UnsupportedDumpFormat(String),

    #[error("Inconsistent space charge configuration: {0}")]
    InvalidSpaceCharge(String),

    #[error("Particle count mismatch: expected {expected}, got {actual}")]
    ParticleCountMismatch { expected: usize, actual: usize },

    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
