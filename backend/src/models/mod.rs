//! Domain models for the SLO extraction pipeline.
//!
//! - [`StudentIdentity`] - the four identity fields, used as the join key everywhere
//! - [`GradeRow`] / [`GradeTable`] - one loaded gradebook export
//! - [`QuestionColumn`] - a parsed `Q. <n> /<max>` column header
//! - [`QuestionMeta`] - one question from the question-stats export
//! - [`SloMapping`] - question number to canonical SLO label
//! - [`SloScoreRow`] / [`SloTable`] - per-student percentages by SLO label
//! - [`CombinedRoster`] - SLO tables from several sections collapsed by student

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

// =============================================================================
// Input Role
// =============================================================================

/// Which export a file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputRole {
    /// Gradebook export, one row per student.
    Grades,
    /// Question statistics export, one row per question.
    Questions,
}

impl fmt::Display for InputRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grades => write!(f, "grades"),
            Self::Questions => write!(f, "questions"),
        }
    }
}

// =============================================================================
// Student Identity
// =============================================================================

/// Natural key of a student row. Compared as exact strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentIdentity {
    pub last_name: String,
    pub first_name: String,
    pub id_number: String,
    pub email: String,
}

impl StudentIdentity {
    pub fn new(
        last_name: impl Into<String>,
        first_name: impl Into<String>,
        id_number: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            last_name: last_name.into(),
            first_name: first_name.into(),
            id_number: id_number.into(),
            email: email.into(),
        }
    }

    /// Fields in output column order.
    pub fn fields(&self) -> [&str; 4] {
        [&self.last_name, &self.first_name, &self.id_number, &self.email]
    }
}

/// Header names of the identity columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityColumns {
    pub last_name: String,
    pub first_name: String,
    pub id_number: String,
    pub email: String,
}

impl IdentityColumns {
    pub fn names(&self) -> [&str; 4] {
        [&self.last_name, &self.first_name, &self.id_number, &self.email]
    }
}

impl Default for IdentityColumns {
    fn default() -> Self {
        Self {
            last_name: "Last name".to_string(),
            first_name: "First name".to_string(),
            id_number: "ID number".to_string(),
            email: "Email address".to_string(),
        }
    }
}

// =============================================================================
// Grades
// =============================================================================

/// One student's wide record: raw score strings keyed by the raw column label.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeRow {
    pub identity: StudentIdentity,
    pub scores: HashMap<String, String>,
}

impl GradeRow {
    /// Raw cell under `label`, empty when the row had no such cell.
    pub fn raw(&self, label: &str) -> &str {
        self.scores.get(label).map(String::as_str).unwrap_or("")
    }
}

/// A loaded gradebook export.
#[derive(Debug, Clone, Default)]
pub struct GradeTable {
    /// Every non-identity header, in file order.
    pub columns: Vec<String>,
    pub rows: Vec<GradeRow>,
    /// Class summary rows removed while loading.
    pub dropped_summary_rows: usize,
}

// =============================================================================
// Questions
// =============================================================================

/// A grade column recognised as a question response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionColumn {
    pub question_number: u32,
    /// Always positive.
    pub max_score: f64,
    pub raw_label: String,
}

/// One question from the question-stats export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionMeta {
    pub question_number: u32,
    pub question_name: String,
}

/// Question number to SLO label, for SLO-bearing questions only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SloMapping {
    labels: BTreeMap<u32, String>,
}

impl SloMapping {
    pub fn insert(&mut self, question_number: u32, label: impl Into<String>) {
        self.labels.insert(question_number, label.into());
    }

    pub fn label(&self, question_number: u32) -> Option<&str> {
        self.labels.get(&question_number).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.labels.iter().map(|(n, l)| (*n, l.as_str()))
    }
}

// =============================================================================
// SLO Scores
// =============================================================================

/// One student's percentages keyed by SLO label. Missing labels read as blank.
#[derive(Debug, Clone, PartialEq)]
pub struct SloScoreRow {
    pub identity: StudentIdentity,
    pub scores: HashMap<String, String>,
}

impl SloScoreRow {
    pub fn new(identity: StudentIdentity) -> Self {
        Self {
            identity,
            scores: HashMap::new(),
        }
    }

    pub fn score(&self, label: &str) -> &str {
        self.scores.get(label).map(String::as_str).unwrap_or("")
    }
}

/// Identity columns followed by SLO columns, one row per student.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SloTable {
    /// SLO column labels in output order.
    pub slo_labels: Vec<String>,
    pub rows: Vec<SloScoreRow>,
}

impl SloTable {
    /// Output header: identity column names then SLO labels.
    pub fn header(&self, identity: &IdentityColumns) -> Vec<String> {
        identity
            .names()
            .iter()
            .map(|s| s.to_string())
            .chain(self.slo_labels.iter().cloned())
            .collect()
    }

    /// Output records aligned with [`SloTable::header`].
    pub fn records(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.rows.iter().map(move |row| {
            row.identity
                .fields()
                .iter()
                .map(|s| s.to_string())
                .chain(self.slo_labels.iter().map(|l| row.score(l).to_string()))
                .collect()
        })
    }

    pub fn find(&self, identity: &StudentIdentity) -> Option<&SloScoreRow> {
        self.rows.iter().find(|r| &r.identity == identity)
    }
}

/// SLO tables of several sections merged into one row per student.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedRoster {
    pub table: SloTable,
    /// Common ids of the sections that contributed, in processing order.
    pub sections: Vec<String>,
}
