//! Question metadata loading.
//!
//! The question-stats export opens with banner rows, then a header row with
//! at least `Q#` and `Question name`, then one row per question.

use std::collections::BTreeMap;

use crate::api::logs::log_warning;
use crate::error::{ExtractError, ExtractResult, ExtractWarning};
use crate::models::{InputRole, QuestionMeta};
use crate::parser::read_table;

use super::pipeline::ExtractOptions;

/// Questions keyed by number, plus the warnings raised while loading.
#[derive(Debug, Clone, Default)]
pub struct QuestionCatalog {
    pub questions: BTreeMap<u32, QuestionMeta>,
    pub warnings: Vec<ExtractWarning>,
}

impl QuestionCatalog {
    pub fn get(&self, question_number: u32) -> Option<&QuestionMeta> {
        self.questions.get(&question_number)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Load the question-stats export.
///
/// Rows whose `Q#` is not a whole number (section headings, totals) are
/// ignored. A repeated question number replaces the earlier entry.
pub fn load_question_catalog(bytes: &[u8], options: &ExtractOptions) -> ExtractResult<QuestionCatalog> {
    let table = read_table(bytes, options.metadata_banner_rows)
        .map_err(|e| ExtractError::csv(InputRole::Questions, e))?;

    let required = [
        options.question_number_column.as_str(),
        options.question_name_column.as_str(),
    ];
    let missing = table.missing_columns(&required);
    if !missing.is_empty() {
        return Err(ExtractError::MalformedInput {
            role: InputRole::Questions,
            missing,
        });
    }

    let number_col = table.column(required[0]).unwrap_or_default();
    let name_col = table.column(required[1]).unwrap_or_default();

    let mut catalog = QuestionCatalog::default();
    for row in &table.rows {
        let Some(question_number) = parse_question_number(table.cell(row, number_col)) else {
            continue;
        };
        let question_name = table.cell(row, name_col).trim().to_string();

        let meta = QuestionMeta {
            question_number,
            question_name,
        };
        if let Some(previous) = catalog.questions.insert(question_number, meta) {
            let warning = ExtractWarning::DuplicateQuestion {
                question_number,
                kept: table.cell(row, name_col).trim().to_string(),
                replaced: previous.question_name,
            };
            log_warning(warning.to_string());
            catalog.warnings.push(warning);
        }
    }

    Ok(catalog)
}

/// Whole, non-negative question number. Accepts `3` and `3.0`.
fn parse_question_number(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u32>() {
        return Some(n);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Some(value as u32)
    } else {
        None
    }
}
