//! SLO label resolution from question names.
//!
//! A question counts toward an SLO when its name mentions "SLO" in any case.
//! The label is the first `SLO <digits>` in the name, canonicalised to
//! upper-case `SLO` with the digits kept as written.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::api::logs::log_warning;
use crate::error::ExtractWarning;
use crate::models::{QuestionColumn, QuestionMeta, SloMapping};
use std::collections::BTreeSet;

use super::metadata::QuestionCatalog;

/// Keyword designating an SLO-bearing question.
pub const SLO_KEYWORD: &str = "SLO";

static SLO_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)SLO\s*(\d+)").expect("valid SLO label pattern"));

/// Whether a question name designates an SLO.
pub fn is_slo_question(name: &str) -> bool {
    name.trim().to_uppercase().contains(SLO_KEYWORD)
}

/// First SLO label in `name`, e.g. `"slo 2 content"` gives `"SLO 2"`.
pub fn extract_slo_label(name: &str) -> Option<String> {
    SLO_LABEL
        .captures(name.trim())
        .map(|caps| format!("{} {}", SLO_KEYWORD, &caps[1]))
}

/// Mapping plus the questions dropped for lack of a label.
#[derive(Debug, Clone, Default)]
pub struct SloResolution {
    pub mapping: SloMapping,
    pub warnings: Vec<ExtractWarning>,
}

/// Resolve SLO labels for every SLO-bearing question in the catalog.
pub fn resolve_slo_mapping(catalog: &QuestionCatalog) -> SloResolution {
    resolve_questions(catalog.questions.values())
}

/// Resolve SLO labels only for catalog questions that have a grade column.
///
/// Questions known to the catalog alone are not candidates and raise no warning.
pub fn resolve_joined_slo_mapping(catalog: &QuestionCatalog, columns: &[QuestionColumn]) -> SloResolution {
    let graded: BTreeSet<u32> = columns.iter().map(|c| c.question_number).collect();
    resolve_questions(
        catalog
            .questions
            .values()
            .filter(|meta| graded.contains(&meta.question_number)),
    )
}

fn resolve_questions<'a, I>(questions: I) -> SloResolution
where
    I: IntoIterator<Item = &'a QuestionMeta>,
{
    let mut resolution = SloResolution::default();

    for meta in questions {
        if !is_slo_question(&meta.question_name) {
            continue;
        }
        match extract_slo_label(&meta.question_name) {
            Some(label) => resolution.mapping.insert(meta.question_number, label),
            None => {
                let warning = ExtractWarning::AmbiguousSloLabel {
                    question_number: meta.question_number,
                    question_name: meta.question_name.clone(),
                };
                log_warning(warning.to_string());
                resolution.warnings.push(warning);
            }
        }
    }

    resolution
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(entries: &[(u32, &str)]) -> QuestionCatalog {
        let mut catalog = QuestionCatalog::default();
        for (n, name) in entries {
            catalog.questions.insert(
                *n,
                QuestionMeta {
                    question_number: *n,
                    question_name: name.to_string(),
                },
            );
        }
        catalog
    }

    #[test]
    fn test_first_match_only() {
        assert_eq!(
            extract_slo_label("Question relates to SLO 3 and SLO 4").as_deref(),
            Some("SLO 3")
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert!(is_slo_question("slo 2 content"));
        assert_eq!(extract_slo_label("slo 2 content").as_deref(), Some("SLO 2"));
    }

    #[test]
    fn test_digits_verbatim() {
        assert_eq!(extract_slo_label("SLO 07: cells").as_deref(), Some("SLO 07"));
        assert_eq!(extract_slo_label("SLO12").as_deref(), Some("SLO 12"));
    }

    #[test]
    fn test_not_slo() {
        assert!(!is_slo_question("Unrelated topic"));
        assert!(extract_slo_label("Unrelated topic").is_none());
    }

    #[test]
    fn test_resolve_mixed_catalog() {
        let resolution = resolve_slo_mapping(&catalog(&[
            (1, "Covers SLO 1 basics"),
            (2, "Unrelated topic"),
            (3, "SLO 1 follow-up"),
        ]));

        assert_eq!(resolution.mapping.len(), 2);
        assert_eq!(resolution.mapping.label(1), Some("SLO 1"));
        assert_eq!(resolution.mapping.label(2), None);
        assert_eq!(resolution.mapping.label(3), Some("SLO 1"));
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn test_ambiguous_label_dropped_with_warning() {
        let resolution = resolve_slo_mapping(&catalog(&[(4, "Slope of a line"), (5, "SLO 5")]));

        assert_eq!(resolution.mapping.label(4), None);
        assert_eq!(resolution.mapping.label(5), Some("SLO 5"));
        assert_eq!(
            resolution.warnings,
            vec![ExtractWarning::AmbiguousSloLabel {
                question_number: 4,
                question_name: "Slope of a line".into(),
            }]
        );
    }

    #[test]
    fn test_joined_mapping_skips_ungraded_questions() {
        let catalog = catalog(&[(1, "Covers SLO 1 basics"), (9, "SLO review"), (12, "SLO 4 recap")]);
        let columns = vec![QuestionColumn {
            question_number: 1,
            max_score: 10.0,
            raw_label: "Q. 1 /10".into(),
        }];

        let resolution = resolve_joined_slo_mapping(&catalog, &columns);

        assert_eq!(resolution.mapping.len(), 1);
        assert_eq!(resolution.mapping.label(1), Some("SLO 1"));
        assert_eq!(resolution.mapping.label(12), None);
        assert!(resolution.warnings.is_empty());
    }
}
