//! One end-to-end run: merge, scan, then derive progress columns.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::info;

use crate::config::PipelineConfig;
use crate::enrollment::{ScanStats, scan_enrollments};
use crate::merge::{Scope, StudentTable, build_student_table};
use crate::output::Diagnostics;
use crate::pathway::PathwayBook;
use crate::progress::{compute_fourth_term_completion, compute_progress};
use crate::records::{ConflictLog, StudentTimeline};

/// Everything a run produces.
#[derive(Debug)]
pub struct PipelineOutput {
    /// Students with at least one course observation, with derived columns filled.
    pub table: StudentTable,
    pub timelines: BTreeMap<String, StudentTimeline>,
    pub conflicts: ConflictLog,
    pub stats: ScanStats,
    /// Students who took a remedial mathematics course in any semester.
    pub remediation_math_students: usize,
}

impl PipelineOutput {
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics::new(
            &self.table,
            &self.stats,
            &self.conflicts,
            self.remediation_math_students,
        )
    }
}

/// Runs the pipeline over `config.data_dir`.
///
/// Nothing is returned unless every stage succeeds; a fatal error in any
/// stage leaves the caller with no partially filled table.
#[tracing::instrument(skip(config), fields(data_dir = %config.data_dir.display()))]
pub fn run(config: &PipelineConfig, scope: Scope) -> Result<PipelineOutput> {
    let pathways = PathwayBook::load(&config.data_path(&config.pathways_file))?;
    let mut table = build_student_table(config, &pathways)?;
    let scan = scan_enrollments(config, &table.roster, scope)?;

    let before = table.len();
    table.retain(|record| scan.timelines.contains_key(&record.student_id));
    info!(
        kept = table.len(),
        without_courses = before - table.len(),
        "Students without course records dropped"
    );

    // Students are independent; compute everything before touching the table.
    let derived = table
        .records
        .par_iter()
        .map(|(student_id, record)| -> Result<(String, u8, bool)> {
            let timeline = scan
                .timelines
                .get(student_id)
                .with_context(|| format!("no timeline for student {student_id}"))?;
            let pathway = record.pathway.as_deref().and_then(|name| pathways.get(name));
            let start = config.calendar.cohort_start(record.cohort_year)?;
            Ok((
                student_id.clone(),
                compute_progress(timeline, pathway, config.progress_passing_only),
                compute_fourth_term_completion(timeline, start),
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    for (student_id, progress, completed) in derived {
        if let Some(record) = table.records.get_mut(&student_id) {
            record.core_progress = Some(progress);
            record.fourth_term_completion = Some(completed);
        }
    }

    let remediation_math_students = table
        .iter()
        .filter_map(|record| scan.timelines.get(&record.student_id))
        .filter(|timeline| {
            timeline
                .ordered_semesters()
                .any(|(_, group)| !group.math_courses(&config.remediation_math_courses).is_empty())
        })
        .count();

    let output = PipelineOutput {
        table,
        timelines: scan.timelines,
        conflicts: scan.conflicts,
        stats: scan.stats,
        remediation_math_students,
    };
    output.diagnostics().log();
    Ok(output)
}
