//! Record merge: joins the contact, account, cohort, enrollment-opportunity
//! and institutional-research exports into one attribute row per student.
//!
//! Contact attributes take priority; IR data only fills gaps. Only Metro and
//! comparison students are kept, and each is assigned its cohort's pathway.

mod remap;
mod sources;
mod types;

pub use remap::{category_for_account, income_bracket, race_label};
pub use types::{Category, EnrollmentResult, Roster, Scope, StudentRecord, StudentTable};

use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::pathway::PathwayBook;
use crate::terms::Term;
use sources::{
    ContactRow, EnrollmentRow, IrRow, ParentEducationRow, TermRow, read_lookup, read_rows,
};

/// IR attributes of one student after the parent-education join.
#[derive(Debug, Clone, Default)]
struct IrRecord {
    row: Option<IrRow>,
    mother_edu: Option<String>,
    father_edu: Option<String>,
}

/// Builds the merged student table.
///
/// # Errors
///
/// Fails on any unreadable source, on repeated keys in the lookups, on a
/// repeated student id, and on a cohort name without a parseable year.
#[tracing::instrument(skip_all, fields(data_dir = %config.data_dir.display()))]
pub fn build_student_table(config: &PipelineConfig, pathways: &PathwayBook) -> Result<StudentTable> {
    let accounts = read_lookup(&config.data_path(&config.accounts_file), &config.accounts_file)?;
    let cohorts = read_lookup(&config.data_path(&config.cohorts_file), &config.cohorts_file)?;

    let mut records = load_contacts(config, &accounts, &cohorts)?;
    let results = load_enrollment_results(config, &records)?;
    let ir = load_ir_records(config)?;

    let mut ir_matched = 0usize;
    for record in records.values_mut() {
        record.result = results.get(&record.student_id).copied();
        if let Some(ir_record) = ir.get(&record.student_id) {
            ir_matched += 1;
            fill_from_ir(record, ir_record);
        }
        record.race = race_label(Some(record.race.as_str()));

        // Comparison cohorts have no pathway even if the table names one.
        if record.category != Category::Metro {
            continue;
        }
        if let Some(pathway) = pathways.get(&record.cohort) {
            record.pathway = Some(pathway.name.clone());
            record.first_math_course = pathway
                .first_math_course(&config.math_courses)
                .map(String::from);
            record.first_math_semester = pathway.first_math_semester(&config.math_courses);
        }
    }

    let mut roster = Roster::default();
    for record in records.values() {
        match record.category {
            Category::Metro => roster.metro.insert(record.student_id.clone()),
            Category::Comp => roster.comp.insert(record.student_id.clone()),
        };
    }

    info!(
        students = records.len(),
        metro = roster.metro.len(),
        comp = roster.comp.len(),
        ir_matched,
        ir_only = ir.len().saturating_sub(ir_matched),
        "Student table merged"
    );

    Ok(StudentTable { records, roster })
}

/// Reads contacts, keeps program students, and resolves category and cohort.
fn load_contacts(
    config: &PipelineConfig,
    accounts: &HashMap<String, String>,
    cohorts: &HashMap<String, String>,
) -> Result<BTreeMap<String, StudentRecord>> {
    let path = config.data_path(&config.contacts_file);
    let rows: Vec<ContactRow> = read_rows(&path)?;
    let total = rows.len();

    let mut records = BTreeMap::new();
    let mut contact_ids = BTreeSet::new();
    let mut excluded_cohort = 0usize;

    for row in rows {
        let Some(pool) = row
            .applicant_pool_year
            .as_deref()
            .filter(|p| !config.excluded_applicant_pools.contains(*p))
        else {
            continue;
        };

        // Unknown account ids stay as-is and fail the category match.
        let Some(category) = row
            .account_id
            .as_deref()
            .map(|id| accounts.get(id).map(String::as_str).unwrap_or(id))
            .and_then(category_for_account)
        else {
            continue;
        };

        let Some(student_id) = row.student_id.clone().filter(|id| !id.trim().is_empty()) else {
            debug!(contact_id = %row.contact_id, "Program contact without student id skipped");
            continue;
        };

        let cohort = row
            .cohort_id
            .as_deref()
            .map(|id| cohorts.get(id).map(String::as_str).unwrap_or(id))
            .unwrap_or_default()
            .to_string();
        let (academy, cohort_year) =
            split_cohort(&cohort).ok_or_else(|| PipelineError::MalformedCohort {
                student_id: student_id.clone(),
                cohort: cohort.clone(),
            })?;

        if config.excluded_cohort_years.contains(&cohort_year) {
            excluded_cohort += 1;
            continue;
        }

        if !contact_ids.insert(row.contact_id.clone()) {
            return Err(PipelineError::DuplicateKey {
                table: config.contacts_file.clone(),
                key: row.contact_id,
            }
            .into());
        }
        if records.contains_key(&student_id) {
            return Err(PipelineError::DuplicateStudent {
                student_id,
                source_name: config.contacts_file.clone(),
            }
            .into());
        }

        let record = StudentRecord {
            student_id: student_id.clone(),
            contact_id: row.contact_id,
            category,
            academy: academy.to_string(),
            cohort_year,
            cohort,
            applicant_pool_year: pool.to_string(),
            result: None,
            // Raw description until the IR fill; relabelled afterwards.
            race: row.race.unwrap_or_default(),
            household_income: income_bracket(row.household_income.as_deref()),
            gender: row.gender,
            first_gen: row.first_gen,
            pell_eligible: row.pell_eligible,
            mother_edu: row.mother_edu,
            father_edu: row.father_edu,
            department: None,
            major: None,
            third_persistence: row.third_persistence,
            fifth_persistence: row.fifth_persistence,
            seventh_persistence: row.seventh_persistence,
            graduated: None,
            graduation_term: None,
            pathway: None,
            first_math_course: None,
            first_math_semester: None,
            core_progress: None,
            fourth_term_completion: None,
        };
        records.insert(student_id, record);
    }

    info!(
        path = %path.display(),
        rows = total,
        kept = records.len(),
        excluded_cohort,
        "Contacts loaded"
    );
    Ok(records)
}

/// Splits `"<academy>-<yyyy>"` into its academy and year.
fn split_cohort(cohort: &str) -> Option<(&str, i32)> {
    let split = cohort.len().checked_sub(5)?;
    if !cohort.is_char_boundary(split) || cohort.as_bytes()[split] != b'-' {
        return None;
    }
    let year = &cohort[split + 1..];
    if !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((&cohort[..split], year.parse().ok()?))
}

/// Derives each student's institutional result from their enrollment opportunities.
fn load_enrollment_results(
    config: &PipelineConfig,
    records: &BTreeMap<String, StudentRecord>,
) -> Result<HashMap<String, EnrollmentResult>> {
    let terms = load_terms(config)?;

    let path = config.data_path(&config.enrollments_file);
    let rows: Vec<EnrollmentRow> = read_rows(&path)?;

    let student_by_contact: HashMap<&str, &str> = records
        .values()
        .map(|r| (r.contact_id.as_str(), r.student_id.as_str()))
        .collect();

    let mut seen = BTreeSet::new();
    let mut stages: HashMap<String, Vec<String>> = HashMap::new();
    let mut unresolved_terms = 0usize;

    for row in rows {
        if !seen.insert(row.enrollment_id.clone()) {
            return Err(PipelineError::DuplicateKey {
                table: config.enrollments_file.clone(),
                key: row.enrollment_id,
            }
            .into());
        }

        if row
            .term_id
            .as_deref()
            .is_some_and(|id| !terms.contains(id))
        {
            unresolved_terms += 1;
        }

        let (Some(contact_id), Some(stage)) = (row.contact_id.as_deref(), row.stage) else {
            continue;
        };
        let Some(student_id) = student_by_contact.get(contact_id) else {
            continue;
        };
        stages.entry(student_id.to_string()).or_default().push(stage);
    }

    if unresolved_terms > 0 {
        debug!(unresolved_terms, "Enrollments reference terms outside the program term list");
    }

    Ok(stages
        .into_iter()
        .map(|(student, stages)| {
            let result = EnrollmentResult::from_stages(stages.iter().map(String::as_str));
            (student, result)
        })
        .collect())
}

/// Ids of program terms: SFSU terms other than the comparison-group ones.
/// Names must parse as a term once the `"SFSU "` prefix is removed.
fn load_terms(config: &PipelineConfig) -> Result<HashSet<String>> {
    let path = config.data_path(&config.terms_file);
    let mut terms = HashSet::new();

    for row in read_rows::<TermRow>(&path)? {
        if !row.name.contains("SFSU") || row.name.contains("COMP") {
            continue;
        }
        let name = row.name.get(5..).unwrap_or_default();
        if let Err(e) = name.parse::<Term>() {
            warn!(term_id = %row.term_id, name = %row.name, error = %e, "Unparseable term name skipped");
            continue;
        }
        if !terms.insert(row.term_id.clone()) {
            return Err(PipelineError::DuplicateKey {
                table: config.terms_file.clone(),
                key: row.term_id,
            }
            .into());
        }
    }

    Ok(terms)
}

/// Reads the per-cohort IR files and joins parent education onto them.
fn load_ir_records(config: &PipelineConfig) -> Result<HashMap<String, IrRecord>> {
    let ir_dir = config.ir_path();
    let mut files: Vec<_> = std::fs::read_dir(&ir_dir)
        .with_context(|| format!("failed to list IR directory {}", ir_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.contains(&config.ir_file_marker) && !name.starts_with('~'))
        .collect();
    files.sort();

    let mut records: HashMap<String, IrRecord> = HashMap::new();
    let mut readmitted = 0usize;
    for file in &files {
        for row in read_rows::<IrRow>(&ir_dir.join(file))? {
            // Students who left and started again appear twice; the later record wins.
            let entry = records.entry(row.student_id.clone()).or_default();
            if entry.row.is_some() {
                readmitted += 1;
            }
            entry.row = Some(row);
        }
    }

    let parents_path = ir_dir.join(&config.parent_education_file);
    let mut parents_seen = BTreeSet::new();
    for row in read_rows::<ParentEducationRow>(&parents_path)? {
        if row.start_term <= config.min_parent_start_term {
            continue;
        }
        if !parents_seen.insert(row.student_id.clone()) {
            return Err(PipelineError::DuplicateStudent {
                student_id: row.student_id,
                source_name: config.parent_education_file.clone(),
            }
            .into());
        }
        let entry = records.entry(row.student_id).or_default();
        entry.mother_edu = row.mother_edu;
        entry.father_edu = row.father_edu;
    }

    info!(
        files = files.len(),
        students = records.len(),
        readmitted,
        "IR records loaded"
    );
    Ok(records)
}

/// Fills attributes the contact export left empty.
fn fill_from_ir(record: &mut StudentRecord, ir: &IrRecord) {
    fn fill(slot: &mut Option<String>, value: Option<&String>) {
        if slot.is_none() {
            *slot = value.cloned();
        }
    }

    fill(&mut record.mother_edu, ir.mother_edu.as_ref());
    fill(&mut record.father_edu, ir.father_edu.as_ref());

    if let Some(row) = &ir.row {
        fill(&mut record.gender, row.gender.as_ref());
        fill(&mut record.pell_eligible, row.pell_eligible.as_ref());
        fill(&mut record.department, row.department.as_ref());
        fill(&mut record.major, row.major.as_ref());
        fill(&mut record.third_persistence, row.third_persistence.as_ref());
        fill(&mut record.fifth_persistence, row.fifth_persistence.as_ref());
        fill(&mut record.seventh_persistence, row.seventh_persistence.as_ref());
        fill(&mut record.graduated, row.graduated.as_ref());
        fill(&mut record.graduation_term, row.graduation_term.as_ref());
        if record.race.is_empty() {
            record.race = row.race.clone().unwrap_or_default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_cohort() {
        assert_eq!(split_cohort("Health1-2012"), Some(("Health1", 2012)));
        assert_eq!(split_cohort("Comp-Fall-2014"), Some(("Comp-Fall", 2014)));
        assert_eq!(split_cohort("-2014"), Some(("", 2014)));
        assert_eq!(split_cohort("Health1"), None);
        assert_eq!(split_cohort("Health 2012"), None);
        assert_eq!(split_cohort("Health-20x2"), None);
        assert_eq!(split_cohort(""), None);
    }

    #[test]
    fn test_load_terms_keeps_program_term_ids() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Term__c.csv"),
            "Id,Name\nt1,SFSU Fall 2012\nt2,SFSU COMP Fall 2012\nt3,SFSU Spring 2013\nt4,SFSU Someday\nt5,CCSF Fall 2012\n",
        )
        .unwrap();
        let config = PipelineConfig::default().with_data_dir(dir.path());

        let terms = load_terms(&config).unwrap();
        assert_eq!(terms, HashSet::from(["t1".to_string(), "t3".to_string()]));
    }

    #[test]
    fn test_load_terms_rejects_repeated_id() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Term__c.csv"),
            "Id,Name\nt1,SFSU Fall 2012\nt1,SFSU Spring 2013\n",
        )
        .unwrap();
        let config = PipelineConfig::default().with_data_dir(dir.path());

        let err = load_terms(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::DuplicateKey { key, .. }) if key == "t1"
        ));
    }

    #[test]
    fn test_fill_from_ir_keeps_contact_values() {
        let mut record = StudentRecord {
            student_id: "1".into(),
            contact_id: "c1".into(),
            category: Category::Metro,
            cohort: "HLTH-2012".into(),
            academy: "HLTH".into(),
            cohort_year: 2012,
            applicant_pool_year: "2012-2013".into(),
            result: None,
            race: String::new(),
            household_income: None,
            gender: Some("F".into()),
            first_gen: None,
            pell_eligible: None,
            mother_edu: None,
            father_edu: Some("2".into()),
            department: None,
            major: None,
            third_persistence: None,
            fifth_persistence: None,
            seventh_persistence: None,
            graduated: None,
            graduation_term: None,
            pathway: None,
            first_math_course: None,
            first_math_semester: None,
            core_progress: None,
            fourth_term_completion: None,
        };
        let ir = IrRecord {
            row: Some(IrRow {
                student_id: "1".into(),
                gender: Some("M".into()),
                pell_eligible: Some("Y".into()),
                department: Some("Biology".into()),
                major: None,
                race: Some("White Only (White) - Non-Hispanic".into()),
                third_persistence: None,
                fifth_persistence: None,
                seventh_persistence: None,
                graduated: None,
                graduation_term: None,
            }),
            mother_edu: Some("5".into()),
            father_edu: Some("6".into()),
        };

        fill_from_ir(&mut record, &ir);

        assert_eq!(record.gender.as_deref(), Some("F"));
        assert_eq!(record.pell_eligible.as_deref(), Some("Y"));
        assert_eq!(record.department.as_deref(), Some("Biology"));
        assert_eq!(record.mother_edu.as_deref(), Some("5"));
        assert_eq!(record.father_edu.as_deref(), Some("2"));
        assert_eq!(race_label(Some(&record.race)), "White");
    }
}
