//! Error types for the SLO extraction pipeline.
//!
//! - [`CsvError`] - decoding and CSV reading errors
//! - [`ExtractError`] - a single (grades, questions) pair could not be processed
//! - [`ExtractWarning`] - anomalies absorbed locally, reported alongside results
//! - [`BatchError`] - multi-section aggregation errors
//! - [`MailError`] - mail composer launch errors
//! - [`ServerError`] - HTTP shell errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use serde::Serialize;
use thiserror::Error;

use crate::models::InputRole;

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors while decoding or reading an export.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Bytes could not be decoded.
    #[error("Failed to decode content as {0}")]
    Encoding(String),

    /// Invalid CSV record.
    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Nothing but blank lines.
    #[error("CSV file is empty")]
    EmptyFile,

    /// Header row expected after the banner rows.
    #[error("No header row found after skipping {0} row(s)")]
    NoHeaders(usize),
}

// =============================================================================
// Extraction Errors
// =============================================================================

/// Errors that abort the transformation of one file pair.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The export could not be read.
    #[error("{role} export: {source}")]
    Csv {
        role: InputRole,
        #[source]
        source: CsvError,
    },

    /// Mandatory columns are absent.
    #[error("{role} export is missing required column(s): {}", .missing.join(", "))]
    MalformedInput {
        role: InputRole,
        missing: Vec<String>,
    },
}

impl ExtractError {
    pub fn csv(role: InputRole, source: CsvError) -> Self {
        Self::Csv { role, source }
    }
}

// =============================================================================
// Warnings
// =============================================================================

/// Anomalies that drop a question, a column or a file but never abort a run.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ExtractWarning {
    /// Question name mentions SLO without a number after it.
    #[error("Question {question_number} mentions SLO but has no SLO number: \"{question_name}\"")]
    #[serde(rename_all = "camelCase")]
    AmbiguousSloLabel {
        question_number: u32,
        question_name: String,
    },

    /// Question number listed more than once in the metadata export.
    #[error("Question {question_number} listed twice; \"{kept}\" replaces \"{replaced}\"")]
    #[serde(rename_all = "camelCase")]
    DuplicateQuestion {
        question_number: u32,
        kept: String,
        replaced: String,
    },

    /// Two grade columns resolve to the same SLO label.
    #[error("Columns \"{replaced}\" and \"{kept}\" both map to {label}; keeping \"{kept}\"")]
    #[serde(rename_all = "camelCase")]
    SloLabelCollision {
        label: String,
        kept: String,
        replaced: String,
    },

    /// File has no counterpart with the same common id.
    #[error("{file_name}: no matching {missing} export for \"{common_id}\"")]
    #[serde(rename_all = "camelCase")]
    UnpairedFile {
        file_name: String,
        common_id: String,
        missing: InputRole,
    },

    /// File name does not carry a role suffix.
    #[error("{file_name}: name does not end in -grades.csv or -questionstats.csv")]
    #[serde(rename_all = "camelCase")]
    UnrecognizedFileName { file_name: String },

    /// A second file of the same role for an already seen common id.
    #[error("{file_name}: another {role} export for \"{common_id}\" was already provided")]
    #[serde(rename_all = "camelCase")]
    DuplicateCommonId {
        file_name: String,
        common_id: String,
        role: InputRole,
    },
}

// =============================================================================
// Batch Errors
// =============================================================================

/// Errors from the multi-section aggregator.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Every pair failed or none was paired.
    #[error("No file pair produced any result; nothing to combine")]
    NoData,

    /// Writing the combined roster failed.
    #[error("Failed to write combined roster: {0}")]
    Csv(#[from] CsvError),
}

// =============================================================================
// Mail Errors
// =============================================================================

/// Errors when handing off to the host mail composer.
#[derive(Debug, Error)]
pub enum MailError {
    /// Opener could not be spawned.
    #[error("Could not launch mail composer '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Opener ran but reported failure.
    #[error("Mail composer '{command}' exited with {status}")]
    Exit { command: String, status: String },
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Extraction failed.
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Aggregation failed.
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for single-pair extraction.
pub type ExtractResult<T> = Result<T, ExtractError>;

/// Result type for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
