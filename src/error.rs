//! Error types for .bvh importing.

use std::io;
use thiserror::Error;

/// Structural violations of the .bvh format. Any of these aborts the import.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MalformedFileError {
    /// The `HIERARCHY` or `MOTION` marker is absent
    #[error("missing {0} section")]
    MissingSection(&'static str),

    /// A `}` with nothing open, or a block left open at the end of the hierarchy
    #[error("line {line}: unbalanced block ({reason})")]
    UnbalancedBlock { line: usize, reason: &'static str },

    /// A hierarchy line with a keyword we do not understand, or a keyword outside any block
    #[error("line {line}: unexpected token `{token}`")]
    UnexpectedToken { line: usize, token: String },

    /// `CHANNELS n ...` where `n` disagrees with the number of names listed
    #[error("line {line}: CHANNELS declares {declared} channels but lists {listed}")]
    ChannelCountMismatch {
        line: usize,
        declared: usize,
        listed: usize,
    },

    /// A frame record whose length is not the total channel count
    #[error("line {line}: frame has {found} values, skeleton has {expected} channels")]
    FrameLengthMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// `Frames:` disagrees with the number of frame records
    #[error("declared {declared} frames but found {found}")]
    FrameCountMismatch { declared: usize, found: usize },

    /// A token that should be numeric is not
    #[error("line {line}: `{token}` is not a number")]
    InvalidNumber { line: usize, token: String },

    /// A line ended before all of its expected values
    #[error("line {line}: missing {what}")]
    MissingValue { line: usize, what: &'static str },

    /// The hierarchy section declares no root
    #[error("hierarchy declares no ROOT joint")]
    EmptyHierarchy,
}

/// Errors from loading a .bvh file from disk.
#[derive(Debug, Error)]
pub enum BvhError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed bvh file: {0}")]
    Malformed(#[from] MalformedFileError),
}

pub type Result<T> = std::result::Result<T, BvhError>;
