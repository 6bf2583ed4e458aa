//! # sloscore - Student Learning Outcome score extraction
//!
//! sloscore turns an LMS gradebook export and its question-statistics export
//! into a per-student SLO score sheet, and merges the sheets of several
//! course sections into one roster.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ grades.csv   │──▶│ Header parse │──▶│ SLO columns  │──▶│ SLO score    │
//! │ questions.csv│──▶│ Q# catalog   │──▶│ → percentages│──▶│ sheet (CSV)  │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────┬───────┘
//!                                                                 │ per section
//!                                                          ┌──────▼───────┐
//!                                                          │ first-wins   │
//!                                                          │ roster merge │
//!                                                          └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sloscore::{extract_to_csv, ExtractOptions};
//!
//! let grades = std::fs::read("bio101-grades.csv")?;
//! let questions = std::fs::read("bio101-questionstats.csv")?;
//! let (csv, outcome) = extract_to_csv(&grades, &questions, &ExtractOptions::default())?;
//! std::fs::write("slo_grades.csv", csv)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error and warning types
//! - [`models`] - Domain models (StudentIdentity, QuestionColumn, SloTable)
//! - [`parser`] - CSV decoding, reading and writing
//! - [`transform`] - Header parsing, SLO resolution, pipeline and batch merge
//! - [`mail`] - Mail composer hand-off
//! - [`api`] - HTTP API server and log stream

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Shell
pub mod mail;
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{BatchError, CsvError, ExtractError, ExtractWarning, MailError, ServerError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CombinedRoster, GradeRow, GradeTable, IdentityColumns, InputRole, QuestionColumn,
    QuestionMeta, SloMapping, SloScoreRow, SloTable, StudentIdentity,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{decode_content, detect_encoding, read_table, read_table_file, write_table, RawTable};

// =============================================================================
// Re-exports - Single section
// =============================================================================

pub use transform::pipeline::{
    extract_slo_scores, extract_to_csv, load_grades, transform_grades, write_slo_table,
    ExtractOptions, ExtractOutcome, ExtractStats,
};
pub use transform::{
    extract_slo_label, is_slo_question, load_question_catalog, normalize_score, parse_question_columns,
    parse_question_header, resolve_joined_slo_mapping, resolve_slo_mapping, QuestionCatalog,
};

// =============================================================================
// Re-exports - Batch
// =============================================================================

pub use transform::batch::{
    collect_section_files, pair_files, pair_mixed_files, process_batch, process_pairs,
    BatchOutcome, Pairing, SectionFailure, SectionFile, SectionOutcome, SectionPair,
};
pub use transform::merge_first_wins;

// =============================================================================
// Re-exports - Mail & API
// =============================================================================

pub use mail::{open_composer, MailConfig};
pub use api::types::{error_response, BatchResponse, SectionSummary};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
