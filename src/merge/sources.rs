//! Rows of the demographic and identity source exports.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;

use crate::error::PipelineError;

/// A row of the contact export.
#[derive(Debug, Deserialize)]
pub(crate) struct ContactRow {
    #[serde(rename = "Id")]
    pub contact_id: String,
    #[serde(rename = "SFSU_student_ID__c", default)]
    pub student_id: Option<String>,
    #[serde(rename = "CurrentCohort__c", default)]
    pub cohort_id: Option<String>,
    #[serde(rename = "AccountId", default)]
    pub account_id: Option<String>,
    #[serde(rename = "Applicant_pool_year__c", default)]
    pub applicant_pool_year: Option<String>,
    #[serde(rename = "Race_or_ethnicity_iped_ir__c", default)]
    pub race: Option<String>,
    #[serde(rename = "First_Generation__c", default)]
    pub first_gen: Option<String>,
    #[serde(rename = "Household_income__c", default)]
    pub household_income: Option<String>,
    #[serde(rename = "Sex_Gender__c", default)]
    pub gender: Option<String>,
    #[serde(rename = "Pell_eligible__c", default)]
    pub pell_eligible: Option<String>,
    #[serde(rename = "Education_level_mother_or_guardian1_IR__c", default)]
    pub mother_edu: Option<String>,
    #[serde(rename = "Education_level_father_or_guardian2_IR__c", default)]
    pub father_edu: Option<String>,
    #[serde(rename = "Third_term_persistence__c", default)]
    pub third_persistence: Option<String>,
    #[serde(rename = "Fifth_term_persistence__c", default)]
    pub fifth_persistence: Option<String>,
    #[serde(rename = "Seventh_term_persistence__c", default)]
    pub seventh_persistence: Option<String>,
}

/// Id/name pairs of the account and cohort lookups.
#[derive(Debug, Deserialize)]
struct LookupRow {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TermRow {
    #[serde(rename = "Id")]
    pub term_id: String,
    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnrollmentRow {
    #[serde(rename = "Id")]
    pub enrollment_id: String,
    #[serde(rename = "Contact__c", default)]
    pub contact_id: Option<String>,
    #[serde(rename = "Stage__c", default)]
    pub stage: Option<String>,
    #[serde(rename = "Term__c", default)]
    pub term_id: Option<String>,
}

/// A row of a per-cohort institutional-research file.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct IrRow {
    #[serde(rename = "cohort_sid")]
    pub student_id: String,
    #[serde(rename = "sex", default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub pell_eligible: Option<String>,
    #[serde(rename = "lst_dept_long", default)]
    pub department: Option<String>,
    #[serde(rename = "cohort_acad_plan_desc1", default)]
    pub major: Option<String>,
    #[serde(rename = "ethnic_desc1", default)]
    pub race: Option<String>,
    #[serde(rename = "rtn_yr1", default)]
    pub third_persistence: Option<String>,
    #[serde(rename = "rtn_yr2", default)]
    pub fifth_persistence: Option<String>,
    #[serde(rename = "rtn_yr3", default)]
    pub seventh_persistence: Option<String>,
    #[serde(rename = "deg_cnt", default)]
    pub graduated: Option<String>,
    #[serde(rename = "deg_year_term", default)]
    pub graduation_term: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ParentEducationRow {
    pub student_id: String,
    #[serde(default)]
    pub mother_edu: Option<String>,
    #[serde(default)]
    pub father_edu: Option<String>,
    #[serde(rename = "strm")]
    pub start_term: i32,
}

/// Reads every row of a CSV export, naming the file and row on failure.
pub(crate) fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    reader
        .deserialize()
        .enumerate()
        .map(|(idx, row)| {
            row.with_context(|| format!("malformed row {} in {}", idx + 2, path.display()))
        })
        .collect()
}

/// Reads an `Id,Name` lookup, rejecting repeated ids.
pub(crate) fn read_lookup(path: &Path, table: &str) -> Result<HashMap<String, String>> {
    let mut lookup = HashMap::new();
    for row in read_rows::<LookupRow>(path)? {
        if lookup.contains_key(&row.id) {
            return Err(PipelineError::DuplicateKey {
                table: table.to_string(),
                key: row.id,
            }
            .into());
        }
        lookup.insert(row.id, row.name);
    }
    Ok(lookup)
}
