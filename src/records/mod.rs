//! Longitudinal course records.
//!
//! A [`CourseObservation`] is one grade in one course. Observations for the
//! same student and semester collect in a [`SemesterGroup`], and a student's
//! groups form a [`StudentTimeline`]. Conflicting duplicate grades are kept
//! out of the records and reported through a [`ConflictLog`].

mod observation;
mod semester_group;
mod sequence;
mod timeline;

pub use observation::CourseObservation;
pub use semester_group::{CourseConflict, Insertion, SemesterGroup};
pub use sequence::{Sequence, Token};
pub use timeline::StudentTimeline;

use std::collections::BTreeSet;

/// Accumulates `(course, student)` pairs that were reported with conflicting grades.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictLog {
    pairs: BTreeSet<(String, String)>,
}

impl ConflictLog {
    pub fn record(&mut self, conflict: &CourseConflict) {
        self.pairs
            .insert((conflict.course.clone(), conflict.student_id.clone()));
    }

    /// Records the conflict, if any, carried by an insertion outcome.
    pub fn observe(&mut self, outcome: &Insertion) {
        if let Insertion::Conflict(conflict) = outcome {
            self.record(conflict);
        }
    }

    /// Folds another log into this one.
    pub fn merge(&mut self, other: ConflictLog) {
        self.pairs.extend(other.pairs);
    }

    pub fn contains(&self, course: &str, student_id: &str) -> bool {
        self.pairs
            .contains(&(course.to_string(), student_id.to_string()))
    }

    pub fn conflicting_courses(&self) -> BTreeSet<&str> {
        self.pairs.iter().map(|(course, _)| course.as_str()).collect()
    }

    pub fn students_with_conflicts(&self) -> BTreeSet<&str> {
        self.pairs.iter().map(|(_, student)| student.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
