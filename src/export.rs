//! Sequence export for the pattern miner, and span analysis over exported files.
//!
//! The export is a pair of line-aligned files: one sequence per line in the
//! miner's input format, and the matching student id on the same line of the
//! labels file.

use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::merge::{Category, StudentTable};
use crate::records::StudentTimeline;
use crate::terms::Season;

/// Which students and which courses go into an export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Cohort years to include; empty means every year.
    pub cohort_years: BTreeSet<i32>,
    pub passing_only: bool,
    /// Seasons visited when `capture_gaps` is set.
    pub seasons: BTreeSet<Season>,
    pub capture_gaps: bool,
    /// Export comparison students only.
    pub comp_only: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            cohort_years: BTreeSet::new(),
            passing_only: false,
            seasons: BTreeSet::from([Season::Fall, Season::Spring]),
            capture_gaps: false,
            comp_only: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub sequence_path: PathBuf,
    pub labels_path: PathBuf,
    /// Lines written to each file.
    pub sequences: usize,
    /// Selected students whose sequence had no courses.
    pub empty: usize,
}

/// The labels file that accompanies a sequence file: `x.txt` → `x_labels.txt`.
pub fn labels_path(sequence_path: &Path) -> PathBuf {
    let path = sequence_path.to_string_lossy();
    match path.strip_suffix(".txt") {
        Some(stem) => PathBuf::from(format!("{stem}_labels.txt")),
        None => PathBuf::from(format!("{path}_labels.txt")),
    }
}

/// Writes the sequences of the selected students, replacing any existing files.
///
/// Students are written in student-id order. A selected student whose
/// sequence would contain no course is left out of both files.
#[tracing::instrument(skip_all, fields(path = %sequence_path.display()))]
pub fn export_sequences(
    table: &StudentTable,
    timelines: &BTreeMap<String, StudentTimeline>,
    options: &ExportOptions,
    sequence_path: &Path,
) -> Result<ExportSummary> {
    let mut lines = Vec::new();
    let mut empty = 0usize;

    for record in table.iter() {
        if options.comp_only && record.category != Category::Comp {
            continue;
        }
        if !options.cohort_years.is_empty() && !options.cohort_years.contains(&record.cohort_year) {
            continue;
        }
        let Some(timeline) = timelines.get(&record.student_id) else {
            continue;
        };
        match timeline.serialize(options.passing_only, &options.seasons, options.capture_gaps) {
            Some(sequence) => lines.push((sequence.to_string(), record.student_id.as_str())),
            None => empty += 1,
        }
    }

    let labels_path = labels_path(sequence_path);
    if let Some(parent) = sequence_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut sequences = BufWriter::new(
        File::create(sequence_path)
            .with_context(|| format!("failed to create {}", sequence_path.display()))?,
    );
    let mut labels = BufWriter::new(
        File::create(&labels_path)
            .with_context(|| format!("failed to create {}", labels_path.display()))?,
    );
    for (sequence, student_id) in &lines {
        writeln!(sequences, "{sequence}")?;
        writeln!(labels, "{student_id}")?;
    }
    sequences.flush()?;
    labels.flush()?;

    info!(
        sequences = lines.len(),
        empty,
        labels = %labels_path.display(),
        "Sequence file written"
    );

    Ok(ExportSummary {
        sequence_path: sequence_path.to_path_buf(),
        labels_path,
        sequences: lines.len(),
        empty,
    })
}

/// Semester positions of one exported line: each `-1`-terminated segment is
/// one semester, gaps included.
fn semester_segments(line: &str) -> Vec<BTreeSet<&str>> {
    let mut segments = Vec::new();
    let mut current = BTreeSet::new();
    for token in line.split_whitespace() {
        match token {
            "-1" => segments.push(std::mem::take(&mut current)),
            "-2" => break,
            course => {
                current.insert(course);
            }
        }
    }
    segments
}

/// Number of semesters spanned by `courses` in one line, if they all occur
/// in that order with each in a later semester than the one before.
///
/// A course's position is the first semester in which it appears.
pub fn line_span(line: &str, courses: &[String]) -> Option<usize> {
    if courses.is_empty() {
        return None;
    }
    let segments = semester_segments(line);
    let positions = courses
        .iter()
        .map(|course| segments.iter().position(|s| s.contains(course.as_str())))
        .collect::<Option<Vec<_>>>()?;

    if !positions.windows(2).all(|pair| pair[0] < pair[1]) {
        return None;
    }
    let (first, last) = (positions.first()?, positions.last()?);
    Some(last - first + 1)
}

/// Spans of `courses` across every line of a sequence file, skipping lines
/// where they do not occur in order.
pub fn sequence_spans(sequence_path: &Path, courses: &[String]) -> Result<Vec<usize>> {
    let file = File::open(sequence_path)
        .with_context(|| format!("failed to open {}", sequence_path.display()))?;

    let mut spans = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.with_context(|| format!("failed to read {}", sequence_path.display()))?;
        if let Some(span) = line_span(&line, courses) {
            spans.push(span);
        }
    }
    debug!(matches = spans.len(), ?courses, "Sequence spans computed");
    Ok(spans)
}
