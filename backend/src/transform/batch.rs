//! Multi-section aggregation.
//!
//! Gradebook and question-stats exports are paired by their common id,
//! the part of the file name before `-grades.csv` / `-questionstats.csv`.
//! Each pair runs through the single-section pipeline in input order; the
//! successful score sheets are merged into one roster.
//!
//! A bad section never blocks the rest: unpaired files become warnings and
//! failing pairs become [`SectionFailure`]s.

use serde::Serialize;
use std::collections::HashMap;
use std::io;
use std::path::Path;

use crate::api::logs::{log_error, log_info, log_section, log_success, log_warning};
use crate::error::{BatchError, BatchResult, ExtractWarning};
use crate::models::{CombinedRoster, InputRole};

use super::grouper::merge_first_wins;
use super::pipeline::{extract_slo_scores, write_slo_table, ExtractOptions, ExtractOutcome};

/// An uploaded or on-disk export.
#[derive(Debug, Clone)]
pub struct SectionFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SectionFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file, keeping its file name.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(Self::new(name, std::fs::read(path)?))
    }
}

/// Every `.csv` file directly inside `dir`, sorted by name.
pub fn collect_section_files(dir: &Path) -> io::Result<Vec<SectionFile>> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && has_csv_extension(&p.to_string_lossy()))
        .collect();
    paths.sort();
    paths.iter().map(|p| SectionFile::from_path(p)).collect()
}

fn has_csv_extension(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".csv")
}

/// Common id of `file_name` for a role suffix, e.g. `bio101-grades.csv` with
/// `-grades` gives `bio101`. Directory components are ignored.
pub fn common_id(file_name: &str, suffix: &str) -> Option<String> {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_name);
    let stem = if has_csv_extension(base) {
        &base[..base.len() - 4]
    } else {
        base
    };
    stem.strip_suffix(suffix)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Role and common id from the file name alone.
pub fn classify_file(file_name: &str, options: &ExtractOptions) -> Option<(InputRole, String)> {
    common_id(file_name, &options.grades_suffix)
        .map(|id| (InputRole::Grades, id))
        .or_else(|| common_id(file_name, &options.questions_suffix).map(|id| (InputRole::Questions, id)))
}

/// Both exports of one section.
#[derive(Debug, Clone)]
pub struct SectionPair {
    pub common_id: String,
    pub grades: SectionFile,
    pub questions: SectionFile,
}

/// Pairs in processing order, plus files that could not be paired.
#[derive(Debug, Clone, Default)]
pub struct Pairing {
    pub pairs: Vec<SectionPair>,
    pub warnings: Vec<ExtractWarning>,
}

impl Pairing {
    fn warn(&mut self, warning: ExtractWarning) {
        log_warning(warning.to_string());
        self.warnings.push(warning);
    }
}

/// Pair grades files with question-stats files by common id.
///
/// Pairs follow the order of `grades`. The first file wins when a common id
/// repeats within a role.
pub fn pair_files(
    grades: Vec<SectionFile>,
    questions: Vec<SectionFile>,
    options: &ExtractOptions,
) -> Pairing {
    let mut pairing = Pairing::default();

    let grades = index_by_common_id(grades, InputRole::Grades, &options.grades_suffix, &mut pairing);
    let questions =
        index_by_common_id(questions, InputRole::Questions, &options.questions_suffix, &mut pairing);

    let mut unclaimed: HashMap<String, SectionFile> = questions
        .iter()
        .map(|(id, file)| (id.clone(), file.clone()))
        .collect();

    for (id, grades_file) in grades {
        match unclaimed.remove(&id) {
            Some(questions_file) => pairing.pairs.push(SectionPair {
                common_id: id,
                grades: grades_file,
                questions: questions_file,
            }),
            None => pairing.warn(ExtractWarning::UnpairedFile {
                file_name: grades_file.name,
                common_id: id,
                missing: InputRole::Questions,
            }),
        }
    }

    for (id, file) in questions {
        if unclaimed.contains_key(&id) {
            pairing.warn(ExtractWarning::UnpairedFile {
                file_name: file.name,
                common_id: id,
                missing: InputRole::Grades,
            });
        }
    }

    pairing
}

/// Pair a mixed list of files, telling roles apart by name suffix.
pub fn pair_mixed_files(files: Vec<SectionFile>, options: &ExtractOptions) -> Pairing {
    let mut grades = Vec::new();
    let mut questions = Vec::new();
    let mut unrecognized = Vec::new();

    for file in files {
        match classify_file(&file.name, options) {
            Some((InputRole::Grades, _)) => grades.push(file),
            Some((InputRole::Questions, _)) => questions.push(file),
            None => unrecognized.push(ExtractWarning::UnrecognizedFileName { file_name: file.name }),
        }
    }

    let mut pairing = Pairing::default();
    for warning in unrecognized {
        pairing.warn(warning);
    }
    let paired = pair_files(grades, questions, options);
    pairing.pairs = paired.pairs;
    pairing.warnings.extend(paired.warnings);
    pairing
}

fn index_by_common_id(
    files: Vec<SectionFile>,
    role: InputRole,
    suffix: &str,
    pairing: &mut Pairing,
) -> Vec<(String, SectionFile)> {
    let mut indexed: Vec<(String, SectionFile)> = Vec::new();
    for file in files {
        let Some(id) = common_id(&file.name, suffix) else {
            pairing.warn(ExtractWarning::UnrecognizedFileName { file_name: file.name });
            continue;
        };
        if indexed.iter().any(|(seen, _)| seen == &id) {
            pairing.warn(ExtractWarning::DuplicateCommonId {
                file_name: file.name,
                common_id: id,
                role,
            });
            continue;
        }
        indexed.push((id, file));
    }
    indexed
}

/// A section that produced a score sheet.
#[derive(Debug, Clone)]
pub struct SectionOutcome {
    pub common_id: String,
    pub outcome: ExtractOutcome,
}

/// A section that was skipped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionFailure {
    pub common_id: String,
    pub message: String,
}

/// Everything a batch run produced.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub sections: Vec<SectionOutcome>,
    pub failures: Vec<SectionFailure>,
    /// Pairing warnings; per-section warnings live in each [`SectionOutcome`].
    pub warnings: Vec<ExtractWarning>,
    pub roster: Option<CombinedRoster>,
}

impl BatchOutcome {
    /// The combined roster, or [`BatchError::NoData`] when no section succeeded.
    pub fn roster(&self) -> BatchResult<&CombinedRoster> {
        self.roster.as_ref().ok_or(BatchError::NoData)
    }

    /// The combined roster as CSV bytes.
    pub fn combined_csv(&self, options: &ExtractOptions) -> BatchResult<Vec<u8>> {
        let roster = self.roster()?;
        Ok(write_slo_table(&roster.table, options)?)
    }

    /// Pairing warnings followed by each section's warnings.
    pub fn all_warnings(&self) -> impl Iterator<Item = &ExtractWarning> {
        self.warnings
            .iter()
            .chain(self.sections.iter().flat_map(|s| s.outcome.warnings.iter()))
    }
}

/// Pair and process uploaded grades and question-stats files.
pub fn process_batch(
    grades: Vec<SectionFile>,
    questions: Vec<SectionFile>,
    options: &ExtractOptions,
) -> BatchOutcome {
    process_pairs(pair_files(grades, questions, options), options)
}

/// Run every pair sequentially and merge the successes.
pub fn process_pairs(pairing: Pairing, options: &ExtractOptions) -> BatchOutcome {
    let mut batch = BatchOutcome {
        warnings: pairing.warnings,
        ..BatchOutcome::default()
    };
    log_info(format!("🔗 {} section pair(s) to process", pairing.pairs.len()));

    for pair in pairing.pairs {
        log_section(&pair.common_id, "Extracting SLO scores");
        match extract_slo_scores(&pair.grades.bytes, &pair.questions.bytes, options) {
            Ok(outcome) => {
                log_success(format!(
                    "{}: {} students, {} SLO column(s)",
                    pair.common_id, outcome.stats.students, outcome.stats.slo_columns
                ));
                batch.sections.push(SectionOutcome {
                    common_id: pair.common_id,
                    outcome,
                });
            }
            Err(e) => {
                log_error(format!("{}: {}", pair.common_id, e));
                batch.failures.push(SectionFailure {
                    common_id: pair.common_id,
                    message: e.to_string(),
                });
            }
        }
    }

    if batch.sections.is_empty() {
        log_warning("No section produced results; combined roster skipped");
        return batch;
    }

    let table = merge_first_wins(batch.sections.iter().map(|s| &s.outcome.table));
    log_success(format!(
        "📦 Combined roster: {} students from {} section(s)",
        table.rows.len(),
        batch.sections.len()
    ));
    batch.roster = Some(CombinedRoster {
        table,
        sections: batch.sections.iter().map(|s| s.common_id.clone()).collect(),
    });
    batch
}
