//! Single-section pipeline: one gradebook export plus its question-stats
//! export in, one SLO score sheet out.
//!
//! # Example
//!
//! ```rust,ignore
//! use sloscore::{extract_slo_scores, ExtractOptions};
//!
//! let grades = std::fs::read("bio101-grades.csv")?;
//! let questions = std::fs::read("bio101-questionstats.csv")?;
//! let outcome = extract_slo_scores(&grades, &questions, &ExtractOptions::default())?;
//! println!("{} students, SLOs: {:?}", outcome.table.rows.len(), outcome.table.slo_labels);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::{ExtractError, ExtractResult, ExtractWarning};
use crate::models::{
    GradeRow, GradeTable, IdentityColumns, InputRole, QuestionColumn, SloMapping, SloScoreRow,
    SloTable, StudentIdentity,
};
use crate::parser::{read_table, write_table};

use super::header::parse_question_columns;
use super::metadata::{load_question_catalog, QuestionCatalog};
use super::score::normalize_score;
use super::slo::resolve_joined_slo_mapping;

/// Layout of the two exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractOptions {
    /// Identity columns of the gradebook export, also the output's leading columns.
    pub identity_columns: IdentityColumns,

    /// Last-name value of the class summary row.
    pub summary_row_marker: String,

    /// Banner rows before the question-stats header.
    pub metadata_banner_rows: usize,

    /// Question number column of the question-stats export.
    pub question_number_column: String,

    /// Question name column of the question-stats export.
    pub question_name_column: String,

    /// File name suffix (before `.csv`) of gradebook exports.
    pub grades_suffix: String,

    /// File name suffix (before `.csv`) of question-stats exports.
    pub questions_suffix: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            identity_columns: IdentityColumns::default(),
            summary_row_marker: "Overall average".to_string(),
            metadata_banner_rows: 2,
            question_number_column: "Q#".to_string(),
            question_name_column: "Question name".to_string(),
            grades_suffix: "-grades".to_string(),
            questions_suffix: "-questionstats".to_string(),
        }
    }
}

/// Counts reported after a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractStats {
    pub students: usize,
    pub question_columns: usize,
    pub catalog_questions: usize,
    pub slo_questions: usize,
    pub slo_columns: usize,
    pub dropped_summary_rows: usize,
}

/// Result of one section.
#[derive(Debug, Clone)]
pub struct ExtractOutcome {
    pub table: SloTable,
    pub warnings: Vec<ExtractWarning>,
    pub stats: ExtractStats,
}

impl ExtractOutcome {
    /// The score sheet as CSV bytes.
    pub fn to_csv(&self, options: &ExtractOptions) -> ExtractResult<Vec<u8>> {
        write_slo_table(&self.table, options)
            .map_err(|e| ExtractError::csv(InputRole::Grades, e))
    }
}

/// Serialize an SLO table with the configured identity headers.
pub fn write_slo_table(
    table: &SloTable,
    options: &ExtractOptions,
) -> crate::error::CsvResult<Vec<u8>> {
    write_table(&table.header(&options.identity_columns), table.records())
}

/// Load the gradebook export, dropping class summary rows.
pub fn load_grades(bytes: &[u8], options: &ExtractOptions) -> ExtractResult<GradeTable> {
    let table = read_table(bytes, 0).map_err(|e| ExtractError::csv(InputRole::Grades, e))?;

    let identity_names = options.identity_columns.names();
    let missing = table.missing_columns(&identity_names);
    if !missing.is_empty() {
        return Err(ExtractError::MalformedInput {
            role: InputRole::Grades,
            missing,
        });
    }
    let identity_idx: Vec<usize> = identity_names
        .iter()
        .filter_map(|name| table.column(name))
        .collect();

    let columns: Vec<(usize, String)> = table
        .headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| !identity_idx.contains(idx))
        .map(|(idx, h)| (idx, h.clone()))
        .collect();

    let mut grades = GradeTable {
        columns: columns.iter().map(|(_, h)| h.clone()).collect(),
        ..GradeTable::default()
    };

    for row in &table.rows {
        let identity = StudentIdentity::new(
            table.cell(row, identity_idx[0]),
            table.cell(row, identity_idx[1]),
            table.cell(row, identity_idx[2]),
            table.cell(row, identity_idx[3]),
        );
        if identity.last_name.trim() == options.summary_row_marker {
            grades.dropped_summary_rows += 1;
            continue;
        }

        let scores: HashMap<String, String> = columns
            .iter()
            .map(|(idx, h)| (h.clone(), table.cell(row, *idx).to_string()))
            .collect();
        grades.rows.push(GradeRow { identity, scores });
    }

    Ok(grades)
}

/// Run the whole single-section pipeline on raw export bytes.
pub fn extract_slo_scores(
    grades_bytes: &[u8],
    questions_bytes: &[u8],
    options: &ExtractOptions,
) -> ExtractResult<ExtractOutcome> {
    log_info("📖 Reading gradebook export...");
    let grades = load_grades(grades_bytes, options)?;
    log_success(format!("{} students", grades.rows.len()));
    if grades.dropped_summary_rows > 0 {
        log_info(format!(
            "Dropped {} \"{}\" row(s)",
            grades.dropped_summary_rows, options.summary_row_marker
        ));
    }

    log_info("📋 Reading question statistics...");
    let catalog = load_question_catalog(questions_bytes, options)?;
    log_success(format!("{} questions", catalog.len()));

    Ok(transform_grades(&grades, &catalog))
}

/// Same as [`extract_slo_scores`], serialized to CSV.
pub fn extract_to_csv(
    grades_bytes: &[u8],
    questions_bytes: &[u8],
    options: &ExtractOptions,
) -> ExtractResult<(Vec<u8>, ExtractOutcome)> {
    let outcome = extract_slo_scores(grades_bytes, questions_bytes, options)?;
    let csv = outcome.to_csv(options)?;
    Ok((csv, outcome))
}

/// Join grade columns to the catalog, keep SLO columns, convert and rename.
pub fn transform_grades(grades: &GradeTable, catalog: &QuestionCatalog) -> ExtractOutcome {
    let mut warnings = catalog.warnings.clone();

    let question_columns = parse_question_columns(&grades.columns);
    log_info(format!("{} question columns", question_columns.len()));

    let resolution = resolve_joined_slo_mapping(catalog, &question_columns);
    warnings.extend(resolution.warnings.iter().cloned());

    let (slo_labels, sources) = select_slo_columns(&question_columns, &resolution.mapping, &mut warnings);

    let rows = grades
        .rows
        .iter()
        .map(|row| {
            let mut out = SloScoreRow::new(row.identity.clone());
            for label in &slo_labels {
                if let Some(column) = sources.get(label) {
                    out.scores
                        .insert(label.clone(), normalize_score(row.raw(&column.raw_label), column.max_score));
                }
            }
            out
        })
        .collect::<Vec<_>>();

    let stats = ExtractStats {
        students: rows.len(),
        question_columns: question_columns.len(),
        catalog_questions: catalog.len(),
        slo_questions: resolution.mapping.len(),
        slo_columns: slo_labels.len(),
        dropped_summary_rows: grades.dropped_summary_rows,
    };
    log_success(format!("SLO columns: {}", slo_labels.join(", ")));

    ExtractOutcome {
        table: SloTable { slo_labels, rows },
        warnings,
        stats,
    }
}

/// SLO labels in first-seen column order, and the column each label reads from.
///
/// When two columns resolve to the same label the later column is the source.
fn select_slo_columns<'a>(
    columns: &'a [QuestionColumn],
    mapping: &SloMapping,
    warnings: &mut Vec<ExtractWarning>,
) -> (Vec<String>, HashMap<String, &'a QuestionColumn>) {
    let mut labels: Vec<String> = Vec::new();
    let mut sources: HashMap<String, &QuestionColumn> = HashMap::new();

    for column in columns {
        let Some(label) = mapping.label(column.question_number) else {
            continue;
        };
        match sources.insert(label.to_string(), column) {
            Some(previous) => {
                let warning = ExtractWarning::SloLabelCollision {
                    label: label.to_string(),
                    kept: column.raw_label.clone(),
                    replaced: previous.raw_label.clone(),
                };
                log_warning(warning.to_string());
                warnings.push(warning);
            }
            None => labels.push(label.to_string()),
        }
    }

    (labels, sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRADES: &str = "Last name,First name,ID number,Email address,Q. 1 /10,Q. 2 /20\n\
                          Doe,Jane,1001,jane@x.edu,8,18\n";
    const QUESTIONS: &str = "Quiz structure analysis\nBIO 101\n\
                             Q#,Question name\n1,Covers SLO 1 basics\n2,Unrelated topic\n";

    fn run(grades: &str, questions: &str) -> ExtractOutcome {
        extract_slo_scores(grades.as_bytes(), questions.as_bytes(), &ExtractOptions::default()).unwrap()
    }

    fn jane() -> StudentIdentity {
        StudentIdentity::new("Doe", "Jane", "1001", "jane@x.edu")
    }

    #[test]
    fn test_default_options() {
        let opts = ExtractOptions::default();
        assert_eq!(opts.metadata_banner_rows, 2);
        assert_eq!(opts.summary_row_marker, "Overall average");
        assert_eq!(opts.identity_columns.email, "Email address");
    }

    #[test]
    fn test_end_to_end_csv() {
        let (csv, outcome) =
            extract_to_csv(GRADES.as_bytes(), QUESTIONS.as_bytes(), &ExtractOptions::default()).unwrap();

        assert_eq!(
            String::from_utf8(csv).unwrap(),
            "Last name,First name,ID number,Email address,SLO 1\nDoe,Jane,1001,jane@x.edu,80.00%\n"
        );
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.stats.question_columns, 2);
        assert_eq!(outcome.stats.slo_columns, 1);
    }

    #[test]
    fn test_ungraded_catalog_question_not_resolved() {
        let grades = "Last name,First name,ID number,Email address,Q. 1 /10\n\
                      Doe,Jane,1001,jane@x.edu,8\n";
        let questions = "a\nb\nQ#,Question name\n1,Covers SLO 1 basics\n9,SLO review\n";
        let outcome = run(grades, questions);

        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.stats.slo_questions, 1);
        assert_eq!(outcome.table.rows[0].score("SLO 1"), "80.00%");
    }

    #[test]
    fn test_summary_row_dropped() {
        let grades = format!("{GRADES}Overall average,,,,6.5,15\n");
        let outcome = run(&grades, QUESTIONS);

        assert_eq!(outcome.table.rows.len(), 1);
        assert_eq!(outcome.stats.dropped_summary_rows, 1);
        assert!(outcome
            .table
            .rows
            .iter()
            .all(|r| r.identity.last_name != "Overall average"));
    }

    #[test]
    fn test_blank_score_stays_blank() {
        let grades = "Last name,First name,ID number,Email address,Q. 1 /10\n\
                      Doe,Jane,1001,jane@x.edu,-\n";
        let outcome = run(grades, QUESTIONS);
        assert_eq!(outcome.table.rows[0].score("SLO 1"), "");
        assert_eq!(outcome.table.slo_labels, vec!["SLO 1"]);
    }

    #[test]
    fn test_unmatched_question_ignored() {
        let grades = "Last name,First name,ID number,Email address,Q. 1 /10,Q. 9 /5\n\
                      Doe,Jane,1001,jane@x.edu,5,5\n";
        let outcome = run(grades, QUESTIONS);
        assert_eq!(outcome.table.slo_labels, vec!["SLO 1"]);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_label_collision_later_column_wins() {
        let grades = "Last name,First name,ID number,Email address,Q. 1 /10,Q. 2 /20,Q. 3 /4\n\
                      Doe,Jane,1001,jane@x.edu,5,10,3\n";
        let questions = "b\nb\nQ#,Question name\n1,SLO 2 part a\n2,SLO 1 recall\n3,SLO 2 part b\n";
        let outcome = run(grades, questions);

        assert_eq!(outcome.table.slo_labels, vec!["SLO 2", "SLO 1"]);
        let row = outcome.table.find(&jane()).unwrap();
        assert_eq!(row.score("SLO 2"), "75.00%");
        assert_eq!(row.score("SLO 1"), "50.00%");
        assert_eq!(
            outcome.warnings,
            vec![ExtractWarning::SloLabelCollision {
                label: "SLO 2".into(),
                kept: "Q. 3 /4".into(),
                replaced: "Q. 1 /10".into(),
            }]
        );
    }

    #[test]
    fn test_ambiguous_question_surfaces_warning() {
        let questions = "b\nb\nQ#,Question name\n1,Covers SLO 1 basics\n2,SLO review\n";
        let outcome = run(GRADES, questions);
        assert_eq!(outcome.table.slo_labels, vec!["SLO 1"]);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(matches!(
            outcome.warnings[0],
            ExtractWarning::AmbiguousSloLabel { question_number: 2, .. }
        ));
    }

    #[test]
    fn test_missing_identity_column_aborts() {
        let grades = "Last name,First name,ID number,Q. 1 /10\nDoe,Jane,1001,8\n";
        let err = extract_slo_scores(grades.as_bytes(), QUESTIONS.as_bytes(), &ExtractOptions::default())
            .unwrap_err();
        match err {
            ExtractError::MalformedInput { role, missing } => {
                assert_eq!(role, InputRole::Grades);
                assert_eq!(missing, vec!["Email address".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_identical_input_identical_output() {
        let grades = "Last name,First name,ID number,Email address,Q. 2 /20,Q. 1 /10,Q. 3 /3\n\
                      Doe,Jane,1001,jane@x.edu,18,8,1\n\
                      Roe,Rick,1002,rick@x.edu,,10,2\n";
        let questions = "b\nb\nQ#,Question name\n1,SLO 1\n2,SLO 2\n3,SLO 3\n";
        let opts = ExtractOptions::default();

        let (first, _) = extract_to_csv(grades.as_bytes(), questions.as_bytes(), &opts).unwrap();
        let (second, _) = extract_to_csv(grades.as_bytes(), questions.as_bytes(), &opts).unwrap();
        assert_eq!(first, second);
        assert!(String::from_utf8(first)
            .unwrap()
            .starts_with("Last name,First name,ID number,Email address,SLO 2,SLO 1,SLO 3\n"));
    }

    #[test]
    fn test_open_ended_question_uses_max_one() {
        let grades = "Last name,First name,ID number,Email address,Q. 1\nDoe,Jane,1001,jane@x.edu,0.75\n";
        let outcome = run(grades, QUESTIONS);
        assert_eq!(outcome.table.rows[0].score("SLO 1"), "75.00%");
    }
}
