//! Scan of the per-term course-enrollment exports into student timelines.
//!
//! Each export covers one term, named by its file-name prefix (see
//! [`Term::from_file_name`]). Files are read in name order; rows for
//! non-enrolled statuses or grades outside the valid set are administrative
//! and are skipped, not treated as errors.

use anyhow::{Context, Result};
use csv::StringRecord;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::grades::Grade;
use crate::merge::{Roster, Scope};
use crate::records::{ConflictLog, CourseObservation, StudentTimeline};
use crate::terms::Term;

const STUDENT_ID_COLUMN: &str = "SF State ID";
const STATUS_COLUMN: &str = "Status";
const GRADE_COLUMN: &str = "Grade";
const CLASS_COLUMN: &str = "Class";

/// Row counts from one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub files: usize,
    pub rows_read: usize,
    pub not_enrolled: usize,
    pub invalid_grade: usize,
    pub out_of_scope: usize,
    pub observations: usize,
}

#[derive(Debug, Default)]
pub struct ScanOutput {
    pub timelines: BTreeMap<String, StudentTimeline>,
    pub conflicts: ConflictLog,
    pub stats: ScanStats,
}

/// Builds a timeline for every in-scope student found in the export directory.
///
/// # Errors
///
/// Fails if a file name has no term prefix, if its term is outside the
/// semester calendar, or if a file lacks one of the required columns.
#[tracing::instrument(skip_all, fields(dir = %config.query_path().display(), ?scope))]
pub fn scan_enrollments(config: &PipelineConfig, roster: &Roster, scope: Scope) -> Result<ScanOutput> {
    let files = list_exports(&config.query_path())?;
    let mut output = ScanOutput::default();

    for (idx, path) in files.iter().enumerate() {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let term = Term::from_file_name(&file_name)?;
        let semester = config.calendar.require(&term)?;

        let rows = scan_file(path, semester, roster, scope, &mut output)?;
        info!(
            file = %file_name,
            index = idx + 1,
            of = files.len(),
            %term,
            semester,
            rows,
            "Enrollment export read"
        );
    }

    output.stats.files = files.len();
    info!(
        students = output.timelines.len(),
        rows_read = output.stats.rows_read,
        observations = output.stats.observations,
        conflicts = output.conflicts.len(),
        "Enrollment scan complete"
    );
    Ok(output)
}

fn list_exports(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to list export directory {}", dir.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Reads one export into `output`, returning the number of rows read.
fn scan_file(
    path: &Path,
    semester: u32,
    roster: &Roster,
    scope: Scope,
    output: &mut ScanOutput,
) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let headers = dedupe_headers(reader.headers()?);
    let column = |name: &str| -> Result<usize> {
        headers
            .get(name)
            .copied()
            .with_context(|| format!("column '{name}' missing from {}", path.display()))
    };
    let (id_col, status_col, grade_col, class_col) = (
        column(STUDENT_ID_COLUMN)?,
        column(STATUS_COLUMN)?,
        column(GRADE_COLUMN)?,
        column(CLASS_COLUMN)?,
    );

    let mut rows = 0usize;
    for record in reader.records() {
        let record = record.with_context(|| format!("malformed row in {}", path.display()))?;
        rows += 1;
        let field = |idx: usize| record.get(idx).unwrap_or_default();

        if field(status_col) != "Enrolled" {
            output.stats.not_enrolled += 1;
            continue;
        }
        let Some(grade) = Grade::parse(field(grade_col)) else {
            output.stats.invalid_grade += 1;
            continue;
        };
        let student_id = field(id_col);
        if !roster.includes(scope, student_id) {
            output.stats.out_of_scope += 1;
            continue;
        }

        let observation = CourseObservation::new(student_id, semester, field(class_col), grade);
        let outcome = output
            .timelines
            .entry(student_id.to_string())
            .or_insert_with(|| StudentTimeline::new(student_id))
            .insert(observation);
        output.conflicts.observe(&outcome);
        output.stats.observations += 1;
    }

    output.stats.rows_read += rows;
    debug!(path = %path.display(), rows, "Export scanned");
    Ok(rows)
}

/// Maps header names to column indices. Repeated names get their occurrence
/// number appended, so a second `Grade` column becomes `Grade2`.
fn dedupe_headers(headers: &StringRecord) -> HashMap<String, usize> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let count = counts.entry(name).or_insert(0);
            *count += 1;
            let key = if *count == 1 {
                name.to_string()
            } else {
                format!("{name}{count}")
            };
            (key, idx)
        })
        .collect()
}
