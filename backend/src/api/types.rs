//! REST API types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ExtractWarning;
use crate::transform::batch::{BatchOutcome, SectionFailure};
use crate::transform::pipeline::{write_slo_table, ExtractOptions, ExtractStats};

/// Response to a batch upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub job_id: String,

    /// "ready", "warning" or "error"
    pub status: String,

    pub generated_at: DateTime<Utc>,

    /// Combined roster CSV, absent when no section succeeded.
    pub combined_csv: Option<String>,

    pub sections: Vec<SectionSummary>,

    pub warnings: Vec<ExtractWarning>,

    pub failures: Vec<SectionFailure>,
}

/// One processed section.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSummary {
    pub common_id: String,
    pub slo_labels: Vec<String>,
    pub stats: ExtractStats,
    pub csv: String,
}

impl BatchResponse {
    pub fn from_outcome(batch: &BatchOutcome, options: &ExtractOptions) -> Self {
        let sections = batch
            .sections
            .iter()
            .map(|s| SectionSummary {
                common_id: s.common_id.clone(),
                slo_labels: s.outcome.table.slo_labels.clone(),
                stats: s.outcome.stats.clone(),
                csv: write_slo_table(&s.outcome.table, options)
                    .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                    .unwrap_or_default(),
            })
            .collect();

        let combined_csv = batch
            .combined_csv(options)
            .ok()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned());

        let warnings: Vec<ExtractWarning> = batch.all_warnings().cloned().collect();
        let status = if combined_csv.is_none() {
            "error"
        } else if warnings.is_empty() && batch.failures.is_empty() {
            "ready"
        } else {
            "warning"
        };

        Self {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            generated_at: Utc::now(),
            combined_csv,
            sections,
            warnings,
            failures: batch.failures.clone(),
        }
    }
}

/// JSON error body.
pub fn error_response(message: &str) -> Value {
    json!({
        "status": "error",
        "error": message
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::batch::{process_batch, SectionFile};

    const GRADES: &str = "Last name,First name,ID number,Email address,Q. 1 /10\nDoe,Jane,1001,jane@x.edu,8\n";
    const QUESTIONS: &str = "x\nx\nQ#,Question name\n1,SLO 1 intro\n";

    #[test]
    fn test_ready_response() {
        let opts = ExtractOptions::default();
        let batch = process_batch(
            vec![SectionFile::new("s1-grades.csv", GRADES)],
            vec![SectionFile::new("s1-questionstats.csv", QUESTIONS)],
            &opts,
        );
        let response = BatchResponse::from_outcome(&batch, &opts);

        assert_eq!(response.status, "ready");
        assert_eq!(response.sections.len(), 1);
        assert_eq!(response.sections[0].slo_labels, vec!["SLO 1"]);
        assert!(response.combined_csv.unwrap().contains("80.00%"));

        let json = serde_json::to_value(BatchResponse::from_outcome(&batch, &opts)).unwrap();
        assert!(json["jobId"].is_string());
        assert!(json["generatedAt"].is_string());
    }

    #[test]
    fn test_error_response_when_nothing_combined() {
        let opts = ExtractOptions::default();
        let batch = process_batch(vec![SectionFile::new("s1-grades.csv", GRADES)], vec![], &opts);
        let response = BatchResponse::from_outcome(&batch, &opts);

        assert_eq!(response.status, "error");
        assert!(response.combined_csv.is_none());
        assert_eq!(response.warnings.len(), 1);
    }

    #[test]
    fn test_error_body() {
        let body = error_response("bad upload");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "bad upload");
    }
}
