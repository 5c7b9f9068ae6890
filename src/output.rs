//! Output of the enriched student table and the run diagnostics.
//!
//! The table is written as CSV, one row per student in id order. Diagnostics
//! go to the log and, on request, to a JSON file.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use crate::enrollment::ScanStats;
use crate::merge::StudentTable;
use crate::records::ConflictLog;

/// End-of-run summary of what was read and what was flagged.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub generated_at: DateTime<Utc>,
    pub students: usize,
    pub metro: usize,
    pub comp: usize,
    pub scan: ScanStats,
    pub conflict_pairs: usize,
    pub students_with_conflicts: usize,
    pub conflicting_courses: Vec<String>,
    pub remediation_math_students: usize,
}

impl Diagnostics {
    pub fn new(
        table: &StudentTable,
        stats: &ScanStats,
        conflicts: &ConflictLog,
        remediation_math_students: usize,
    ) -> Self {
        let metro = table
            .iter()
            .filter(|r| table.roster.metro.contains(&r.student_id))
            .count();
        Self {
            generated_at: Utc::now(),
            students: table.len(),
            metro,
            comp: table.len() - metro,
            scan: stats.clone(),
            conflict_pairs: conflicts.len(),
            students_with_conflicts: conflicts.students_with_conflicts().len(),
            conflicting_courses: conflicts
                .conflicting_courses()
                .into_iter()
                .map(String::from)
                .collect(),
            remediation_math_students,
        }
    }

    /// Emits the summary as one structured event.
    pub fn log(&self) {
        info!(
            students = self.students,
            metro = self.metro,
            comp = self.comp,
            rows_read = self.scan.rows_read,
            not_enrolled = self.scan.not_enrolled,
            invalid_grade = self.scan.invalid_grade,
            conflicting_courses = self.conflicting_courses.len(),
            students_with_conflicts = self.students_with_conflicts,
            remediation_math_students = self.remediation_math_students,
            "Run diagnostics"
        );
    }
}

/// Writes the student table to `path`, replacing any existing file.
pub fn write_student_table(path: &Path, table: &StudentTable) -> Result<()> {
    debug!(path = %path.display(), rows = table.len(), "Writing student table");

    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("failed to create {}", path.display()))?;
    for record in table.iter() {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes the diagnostics as pretty-printed JSON.
pub fn write_diagnostics(path: &Path, diagnostics: &Diagnostics) -> Result<()> {
    let json = serde_json::to_string_pretty(diagnostics)?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
