//! Run configuration.
//!
//! Built once at startup and passed by reference to every stage. Stored on
//! disk as a JSON object; fields that are left out keep their defaults:
//! ```json
//! {
//!   "data_dir": "/srv/ir/data",
//!   "math_courses": ["MATH110", "MATH124", "PSY171"],
//!   "calendar": { "first_fall_year": 2009, "term_count": 33 }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::terms::SemesterCalendar;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub contacts_file: String,
    pub accounts_file: String,
    pub cohorts_file: String,
    pub terms_file: String,
    pub enrollments_file: String,
    pub pathways_file: String,
    /// Directory (under `data_dir`) holding the institutional-research exports.
    pub ir_dir: String,
    /// Substring identifying per-cohort IR files inside `ir_dir`.
    pub ir_file_marker: String,
    pub parent_education_file: String,
    /// Directory (under `data_dir`) holding per-term course-enrollment exports.
    pub query_dir: String,
    pub calendar: SemesterCalendar,
    pub math_courses: BTreeSet<String>,
    /// Remedial mathematics courses, taken before the credit-bearing ones.
    pub remediation_math_courses: BTreeSet<String>,
    pub excluded_applicant_pools: BTreeSet<String>,
    pub excluded_cohort_years: BTreeSet<i32>,
    /// Parent-education rows at or below this start term are dropped.
    pub min_parent_start_term: i32,
    /// Count only passed courses toward core-pathway progress.
    pub progress_passing_only: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            contacts_file: "Contact.csv".to_string(),
            accounts_file: "Account.csv".to_string(),
            cohorts_file: "Cohorts__c.csv".to_string(),
            terms_file: "Term__c.csv".to_string(),
            enrollments_file: "EnrollmentOpportunity__c.csv".to_string(),
            pathways_file: "Pathways.csv".to_string(),
            ir_dir: "IR_data".to_string(),
            ir_file_marker: "FTFTF_Fall".to_string(),
            parent_education_file: "parent_educ.csv".to_string(),
            query_dir: "query_data".to_string(),
            calendar: SemesterCalendar::default(),
            math_courses: ["MATH124", "ISED160", "PSY171", "MATH110", "MATH199", "MATH226"]
                .into_iter()
                .map(String::from)
                .collect(),
            remediation_math_courses: ["MATH60", "MATH70"].into_iter().map(String::from).collect(),
            excluded_applicant_pools: ["2016-2017", "2017-2018"]
                .into_iter()
                .map(String::from)
                .collect(),
            excluded_cohort_years: BTreeSet::from([2017]),
            min_parent_start_term: 2090,
            progress_passing_only: true,
        }
    }
}

impl PipelineConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: PipelineConfig = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Replaces the data directory, keeping every other setting.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn data_path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    pub fn ir_path(&self) -> PathBuf {
        self.data_dir.join(&self.ir_dir)
    }

    pub fn query_path(&self) -> PathBuf {
        self.data_dir.join(&self.query_dir)
    }
}
