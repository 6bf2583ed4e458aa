//! Collapse SLO tables from several sections into one row per student.
//!
//! ```text
//! Section A                         Section B
//! ┌──────────────────────────┐     ┌──────────────────────────┐
//! │ Doe Jane  SLO 1: 80.00%  │     │ Doe Jane  SLO 1: 90.00%  │
//! │ Roe Rick  SLO 1:         │     │ Doe Jane  SLO 2: 70.00%  │
//! └──────────────────────────┘     └──────────────────────────┘
//!                   ↓ first non-blank value wins
//!         ┌─────────────────────────────────────────┐
//!         │ Doe Jane  SLO 1: 80.00%  SLO 2: 70.00%  │
//!         │ Roe Rick  SLO 1:         SLO 2:         │
//!         └─────────────────────────────────────────┘
//! ```
//!
//! Students keep the order in which they were first seen; SLO columns are
//! the union of all tables in first-seen order.

use std::collections::HashMap;

use crate::models::{SloScoreRow, SloTable, StudentIdentity};

/// Merge tables in the given order, first non-blank value per SLO column wins.
pub fn merge_first_wins<'a, I>(tables: I) -> SloTable
where
    I: IntoIterator<Item = &'a SloTable>,
{
    let mut builder = RosterBuilder::default();
    for table in tables {
        builder.add_table(table);
    }
    builder.build()
}

/// Accumulates rows while grouping by identity.
#[derive(Default)]
struct RosterBuilder {
    slo_labels: Vec<String>,
    rows: Vec<SloScoreRow>,
    index: HashMap<StudentIdentity, usize>,
}

impl RosterBuilder {
    fn add_table(&mut self, table: &SloTable) {
        for label in &table.slo_labels {
            if !self.slo_labels.contains(label) {
                self.slo_labels.push(label.clone());
            }
        }
        for row in &table.rows {
            self.add_row(row, &table.slo_labels);
        }
    }

    fn add_row(&mut self, row: &SloScoreRow, labels: &[String]) {
        let slot = match self.index.get(&row.identity).copied() {
            Some(slot) => slot,
            None => {
                self.rows.push(SloScoreRow::new(row.identity.clone()));
                self.index.insert(row.identity.clone(), self.rows.len() - 1);
                self.rows.len() - 1
            }
        };

        let merged = &mut self.rows[slot];
        for label in labels {
            let value = row.score(label);
            if value.trim().is_empty() || !merged.score(label).trim().is_empty() {
                continue;
            }
            merged.scores.insert(label.clone(), value.to_string());
        }
    }

    fn build(self) -> SloTable {
        SloTable {
            slo_labels: self.slo_labels,
            rows: self.rows,
        }
    }
}
