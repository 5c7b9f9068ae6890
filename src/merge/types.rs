//! Types produced by the record merge.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Program membership of a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    /// Enrolled in the Metro program; has a pathway.
    Metro,
    /// Comparison-group student; has no pathway.
    Comp,
}

/// Which students a run considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Scope {
    /// Metro students only.
    Metro,
    /// Metro and comparison students.
    #[default]
    Combined,
}

/// Institutional outcome derived from enrollment-opportunity stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnrollmentResult {
    Graduated,
    Left,
    Open,
}

impl EnrollmentResult {
    /// Graduation wins over leaving; anything else is still open.
    pub fn from_stages<'a>(stages: impl IntoIterator<Item = &'a str>) -> Self {
        let mut left = false;
        for stage in stages {
            match stage {
                "Graduated" => return EnrollmentResult::Graduated,
                "Left Institution" => left = true,
                _ => {}
            }
        }
        if left {
            EnrollmentResult::Left
        } else {
            EnrollmentResult::Open
        }
    }
}

/// One row of the merged per-student attribute table.
#[derive(Debug, Clone, Serialize)]
pub struct StudentRecord {
    pub student_id: String,
    pub contact_id: String,
    pub category: Category,
    /// Full cohort name, `<academy>-<year>`.
    pub cohort: String,
    pub academy: String,
    pub cohort_year: i32,
    pub applicant_pool_year: String,
    pub result: Option<EnrollmentResult>,
    pub race: String,
    pub household_income: Option<u8>,
    pub gender: Option<String>,
    pub first_gen: Option<String>,
    pub pell_eligible: Option<String>,
    pub mother_edu: Option<String>,
    pub father_edu: Option<String>,
    pub department: Option<String>,
    pub major: Option<String>,
    pub third_persistence: Option<String>,
    pub fifth_persistence: Option<String>,
    pub seventh_persistence: Option<String>,
    pub graduated: Option<String>,
    pub graduation_term: Option<String>,
    pub pathway: Option<String>,
    pub first_math_course: Option<String>,
    pub first_math_semester: Option<u8>,
    pub core_progress: Option<u8>,
    pub fourth_term_completion: Option<bool>,
}

/// Student ids by program membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    pub metro: BTreeSet<String>,
    pub comp: BTreeSet<String>,
}

impl Roster {
    pub fn combined(&self) -> BTreeSet<&str> {
        self.metro
            .iter()
            .chain(self.comp.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn includes(&self, scope: Scope, student_id: &str) -> bool {
        match scope {
            Scope::Metro => self.metro.contains(student_id),
            Scope::Combined => self.metro.contains(student_id) || self.comp.contains(student_id),
        }
    }
}

/// The merged attribute table, keyed and ordered by student id.
#[derive(Debug, Clone, Default)]
pub struct StudentTable {
    pub records: BTreeMap<String, StudentRecord>,
    pub roster: Roster,
}

impl StudentTable {
    pub fn get(&self, student_id: &str) -> Option<&StudentRecord> {
        self.records.get(student_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keeps only records accepted by `keep`; the roster is left untouched.
    pub fn retain(&mut self, mut keep: impl FnMut(&StudentRecord) -> bool) {
        self.records.retain(|_, record| keep(record));
    }

    pub fn iter(&self) -> impl Iterator<Item = &StudentRecord> {
        self.records.values()
    }
}
