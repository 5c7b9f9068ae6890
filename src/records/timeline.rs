use std::collections::{BTreeMap, BTreeSet};

use super::observation::CourseObservation;
use super::semester_group::{Insertion, SemesterGroup};
use super::sequence::{Sequence, Token};
use crate::terms::Season;

/// Every semester of one student's course history, keyed by semester number.
#[derive(Debug, Clone)]
pub struct StudentTimeline {
    student_id: String,
    semesters: BTreeMap<u32, SemesterGroup>,
}

impl StudentTimeline {
    pub fn new(student_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            semesters: BTreeMap::new(),
        }
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    /// Files the observation under its semester, creating the group on first use.
    pub fn insert(&mut self, observation: CourseObservation) -> Insertion {
        self.semesters
            .entry(observation.semester)
            .or_insert_with(|| SemesterGroup::new(observation.semester))
            .add(observation)
    }

    pub fn get(&self, semester: u32) -> Option<&SemesterGroup> {
        self.semesters.get(&semester)
    }

    pub fn contains(&self, semester: u32) -> bool {
        self.semesters.contains_key(&semester)
    }

    pub fn len(&self) -> usize {
        self.semesters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.semesters.is_empty()
    }

    /// Semester groups in ascending semester order. Can be called any number of times.
    pub fn ordered_semesters(&self) -> impl Iterator<Item = (u32, &SemesterGroup)> + '_ {
        self.semesters.iter().map(|(number, group)| (*number, group))
    }

    pub fn first_semester(&self) -> Option<u32> {
        self.semesters.keys().next().copied()
    }

    pub fn last_semester(&self) -> Option<u32> {
        self.semesters.keys().next_back().copied()
    }

    /// Union of course codes across all semesters.
    pub fn courses(&self, passing_only: bool) -> BTreeSet<&str> {
        self.semesters
            .values()
            .flat_map(|group| group.courses(passing_only))
            .map(String::as_str)
            .collect()
    }

    /// Serializes the timeline for the pattern miner.
    ///
    /// Without gap capture every semester that has courses is emitted in
    /// order. With gap capture, every semester from the first to the last
    /// observed one whose season is in `seasons` is visited, and a missing
    /// semester becomes `GAP -1`. Returns `None` when no course would be
    /// emitted; such students are left out of the export.
    pub fn serialize(
        &self,
        passing_only: bool,
        seasons: &BTreeSet<Season>,
        capture_gaps: bool,
    ) -> Option<Sequence> {
        let mut sequence = Sequence::default();

        if capture_gaps {
            let (first, last) = (self.first_semester()?, self.last_semester()?);
            for semester in (first..=last).filter(|n| seasons.contains(&Season::of_semester(*n))) {
                match self.semesters.get(&semester) {
                    Some(group) => {
                        if !group.courses(passing_only).is_empty() {
                            sequence.extend(group.serialize(passing_only));
                        }
                    }
                    None => sequence.extend([Token::Gap, Token::EndSemester]),
                }
            }
        } else {
            for (_, group) in self.ordered_semesters() {
                if !group.courses(passing_only).is_empty() {
                    sequence.extend(group.serialize(passing_only));
                }
            }
        }

        if sequence.course_count() == 0 {
            return None;
        }
        sequence.push(Token::EndSequence);
        Some(sequence)
    }
}
