//! Fatal precondition failures.
//!
//! Any of these aborts the run before output is written. Data-quality
//! anomalies that processing can survive (conflicting grades, skipped rows)
//! are never reported through this type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The pathway table names the same cohort more than once.
    #[error("cohort '{cohort}' was found twice in the pathways file")]
    DuplicateCohort { cohort: String },

    /// A student identifier appears twice where it must be unique.
    #[error("student '{student_id}' appears more than once in {source_name}")]
    DuplicateStudent {
        student_id: String,
        source_name: String,
    },

    /// A lookup table (accounts, cohorts, terms, contacts, enrollments) repeats a key.
    #[error("duplicate key '{key}' in {table}")]
    DuplicateKey { table: String, key: String },

    /// A cohort name does not end in a four-digit year.
    #[error("cohort '{cohort}' of student '{student_id}' has no parseable year")]
    MalformedCohort { student_id: String, cohort: String },

    /// A course-enrollment export file name does not start with a known term prefix.
    #[error("invalid term prefix in file name '{file_name}'")]
    UnknownTermPrefix { file_name: String },

    /// A term falls outside the configured semester calendar.
    #[error("term '{term}' is outside the semester calendar")]
    TermOutOfCalendar { term: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_cohort_names_the_cohort() {
        let err = PipelineError::DuplicateCohort {
            cohort: "HLTH-2014".to_string(),
        };
        assert!(err.to_string().contains("HLTH-2014"));
    }

    #[test]
    fn test_duplicate_student_names_source() {
        let err = PipelineError::DuplicateStudent {
            student_id: "912345678".to_string(),
            source_name: "Contact.csv".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("912345678"));
        assert!(msg.contains("Contact.csv"));
    }
}
