use std::collections::BTreeSet;

use super::observation::CourseObservation;
use super::sequence::Token;
use crate::grades::Grade;

/// Two observations of the same course in the same semester with different grades.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseConflict {
    pub student_id: String,
    pub semester: u32,
    pub course: String,
    pub kept: Grade,
    pub rejected: Grade,
}

/// Outcome of adding an observation to a [`SemesterGroup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insertion {
    Added,
    /// Same course with the same grade was already present.
    Duplicate,
    /// Same course with a different grade; the first-seen observation was kept.
    Conflict(CourseConflict),
}

/// A student's distinct courses in one semester.
#[derive(Debug, Clone)]
pub struct SemesterGroup {
    semester: u32,
    observations: Vec<CourseObservation>,
    taken: BTreeSet<String>,
    passed: BTreeSet<String>,
}

impl SemesterGroup {
    pub fn new(semester: u32) -> Self {
        Self {
            semester,
            observations: Vec::new(),
            taken: BTreeSet::new(),
            passed: BTreeSet::new(),
        }
    }

    pub fn semester(&self) -> u32 {
        self.semester
    }

    /// Adds an observation unless its course is already present.
    ///
    /// The first observation of a course always wins; a later one with a
    /// different grade is reported as a [`CourseConflict`] and discarded.
    pub fn add(&mut self, observation: CourseObservation) -> Insertion {
        if let Some(existing) = self
            .observations
            .iter()
            .find(|o| o.course == observation.course)
        {
            if existing.grade == observation.grade {
                return Insertion::Duplicate;
            }
            return Insertion::Conflict(CourseConflict {
                student_id: observation.student_id,
                semester: self.semester,
                course: observation.course,
                kept: existing.grade,
                rejected: observation.grade,
            });
        }

        self.taken.insert(observation.course.clone());
        if observation.is_passing() {
            self.passed.insert(observation.course.clone());
        }
        self.observations.push(observation);
        Insertion::Added
    }

    /// Retained observations in insertion order.
    pub fn observations(&self) -> &[CourseObservation] {
        &self.observations
    }

    pub fn get(&self, course: &str) -> Option<&CourseObservation> {
        self.observations.iter().find(|o| o.course == course)
    }

    pub fn courses_taken(&self) -> &BTreeSet<String> {
        &self.taken
    }

    pub fn courses_passed(&self) -> &BTreeSet<String> {
        &self.passed
    }

    pub fn courses(&self, passing_only: bool) -> &BTreeSet<String> {
        if passing_only { &self.passed } else { &self.taken }
    }

    /// Observations whose course is in `listed`, in insertion order.
    ///
    /// Pass the configured mathematics set for the semester's math courses,
    /// or the remediation set for its remedial ones.
    pub fn math_courses(&self, listed: &BTreeSet<String>) -> Vec<&CourseObservation> {
        self.observations
            .iter()
            .filter(|o| listed.contains(&o.course))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Sorted course codes followed by the end-of-semester marker.
    pub fn serialize(&self, passing_only: bool) -> Vec<Token> {
        self.courses(passing_only)
            .iter()
            .cloned()
            .map(Token::Course)
            .chain(std::iter::once(Token::EndSemester))
            .collect()
    }
}
