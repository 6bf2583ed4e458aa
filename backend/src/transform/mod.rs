//! Transformation module.
//!
//! Gradebook + question-stats exports to SLO score sheets:
//! - Header: `Q. <n> /<max>` column labels to question columns
//! - Metadata: question-stats export to question names
//! - Slo: question names to SLO labels
//! - Score: raw scores to percentages
//! - Pipeline: one section end to end
//! - Grouper: first-wins merge of several score sheets
//! - Batch: pairing files by common id and aggregating sections

pub mod batch;
pub mod grouper;
pub mod header;
pub mod metadata;
pub mod pipeline;
pub mod score;
pub mod slo;

pub use batch::*;
pub use grouper::merge_first_wins;
pub use header::{parse_question_columns, parse_question_header};
pub use metadata::{load_question_catalog, QuestionCatalog};
pub use pipeline::*;
pub use score::{format_percentage, normalize_score};
pub use slo::{
    extract_slo_label, is_slo_question, resolve_joined_slo_mapping, resolve_slo_mapping,
    SloResolution,
};
