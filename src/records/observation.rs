use serde::Serialize;

use crate::grades::Grade;

/// One student's outcome in one course in one semester.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseObservation {
    pub student_id: String,
    pub semester: u32,
    pub course: String,
    pub grade: Grade,
}

impl CourseObservation {
    /// Builds an observation, stripping all whitespace from the course code
    /// so that `"MATH 110"` and `"MATH110"` name the same course.
    pub fn new(student_id: impl Into<String>, semester: u32, course: &str, grade: Grade) -> Self {
        Self {
            student_id: student_id.into(),
            semester,
            course: course.chars().filter(|c| !c.is_whitespace()).collect(),
            grade,
        }
    }

    pub fn grade_points(&self) -> Option<f64> {
        self.grade.points()
    }

    pub fn is_passing(&self) -> bool {
        self.grade.is_passing()
    }
}
