//! Per-cohort core pathways.
//!
//! Each cohort (`<academy>-<year>`) follows a pathway of three required
//! course groups: the first-year experience, the second-year experience and
//! the capstone. Each group lists one or more interchangeable courses. A
//! pathway may also suggest elective courses for the Fall and Spring terms of
//! the first two years, keyed by semester offset 0, 2, 4 and 6.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info};

use crate::error::PipelineError;

/// Semester offsets of the four suggested-course columns.
pub const SEMESTER_OFFSETS: [u8; 4] = [0, 2, 4, 6];

/// One of the three required parts of a core pathway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoreRequirement {
    FirstYearExperience,
    SecondYearExperience,
    Capstone,
}

impl CoreRequirement {
    pub fn label(self) -> &'static str {
        match self {
            CoreRequirement::FirstYearExperience => "first_exp",
            CoreRequirement::SecondYearExperience => "second_exp",
            CoreRequirement::Capstone => "cap",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pathway {
    pub name: String,
    pub first_exp: BTreeSet<String>,
    pub second_exp: BTreeSet<String>,
    pub cap: BTreeSet<String>,
    pub semester_courses: BTreeMap<u8, Vec<String>>,
}

impl Pathway {
    /// The three required course groups, in pathway order.
    pub fn requirements(&self) -> [(CoreRequirement, &BTreeSet<String>); 3] {
        [
            (CoreRequirement::FirstYearExperience, &self.first_exp),
            (CoreRequirement::SecondYearExperience, &self.second_exp),
            (CoreRequirement::Capstone, &self.cap),
        ]
    }

    /// Every course that satisfies some part of the core pathway.
    pub fn core_courses(&self) -> BTreeSet<&str> {
        self.requirements()
            .into_iter()
            .flat_map(|(_, courses)| courses.iter().map(String::as_str))
            .collect()
    }

    /// Suggested mathematics courses as `(course, offset)` pairs in offset order.
    pub fn math_requirements<'a>(&'a self, math_courses: &BTreeSet<String>) -> Vec<(&'a str, u8)> {
        self.semester_courses
            .iter()
            .flat_map(|(offset, courses)| courses.iter().map(move |c| (c.as_str(), *offset)))
            .filter(|(course, _)| math_courses.contains(*course))
            .collect()
    }

    pub fn first_math_course<'a>(&'a self, math_courses: &BTreeSet<String>) -> Option<&'a str> {
        self.math_requirements(math_courses).first().map(|(course, _)| *course)
    }

    pub fn first_math_semester(&self, math_courses: &BTreeSet<String>) -> Option<u8> {
        self.math_requirements(math_courses).first().map(|(_, offset)| *offset)
    }
}

/// A row of the pathway definition table.
#[derive(Debug, Deserialize)]
struct PathwayRow {
    cohort: String,
    year: String,
    first_exp: String,
    second_exp: String,
    cap: String,
    semester_1: String,
    semester_2: String,
    semester_3: String,
    semester_4: String,
}

/// Splits a semicolon-delimited course list, dropping blanks.
fn split_courses(cell: &str) -> impl Iterator<Item = String> + '_ {
    cell.split(';')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
}

/// All pathways, keyed by cohort name.
#[derive(Debug, Clone, Default)]
pub struct PathwayBook {
    pathways: HashMap<String, Pathway>,
}

impl PathwayBook {
    /// Reads the pathway table at `path`.
    ///
    /// # Errors
    ///
    /// Fails with [`PipelineError::DuplicateCohort`] if a cohort appears twice,
    /// or if the file cannot be read or is missing a column.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to open pathways file {}", path.display()))?;
        let mut book = PathwayBook::default();

        for result in reader.deserialize::<PathwayRow>() {
            let row = result.with_context(|| format!("malformed row in {}", path.display()))?;
            book.insert(Pathway::from_row(row))?;
        }

        info!(path = %path.display(), cohorts = book.len(), "Pathways loaded");
        Ok(book)
    }

    /// Adds a pathway, rejecting a second definition of the same cohort.
    pub fn insert(&mut self, pathway: Pathway) -> Result<()> {
        if self.pathways.contains_key(&pathway.name) {
            return Err(PipelineError::DuplicateCohort {
                cohort: pathway.name,
            }
            .into());
        }
        debug!(cohort = %pathway.name, "Pathway registered");
        self.pathways.insert(pathway.name.clone(), pathway);
        Ok(())
    }

    pub fn get(&self, cohort: &str) -> Option<&Pathway> {
        self.pathways.get(cohort)
    }

    pub fn len(&self) -> usize {
        self.pathways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pathways.is_empty()
    }
}

impl Pathway {
    fn from_row(row: PathwayRow) -> Self {
        let electives = [row.semester_1, row.semester_2, row.semester_3, row.semester_4];
        let semester_courses = SEMESTER_OFFSETS
            .into_iter()
            .zip(electives.iter())
            .map(|(offset, cell)| (offset, split_courses(cell).collect()))
            .collect();

        Pathway {
            name: format!("{}-{}", row.cohort.trim(), row.year.trim()),
            first_exp: split_courses(&row.first_exp).collect(),
            second_exp: split_courses(&row.second_exp).collect(),
            cap: split_courses(&row.cap).collect(),
            semester_courses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "cohort,year,first_exp,second_exp,cap,semester_1,semester_2,semester_3,semester_4";

    fn write_table(rows: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        file
    }

    fn math() -> BTreeSet<String> {
        ["MATH110", "PSY171", "MATH124"].into_iter().map(String::from).collect()
    }

    #[test]
    fn test_load_parses_alternatives_and_electives() {
        let file = write_table(&[
            "HLTH,2014,HLTH100;HLTH101,HLTH200,HLTH300,MATH110;ENG114,,PSY171,",
        ]);
        let book = PathwayBook::load(file.path()).unwrap();
        let pathway = book.get("HLTH-2014").unwrap();

        assert_eq!(pathway.first_exp.len(), 2);
        assert!(pathway.first_exp.contains("HLTH101"));
        assert_eq!(pathway.semester_courses[&0], vec!["MATH110", "ENG114"]);
        assert!(pathway.semester_courses[&2].is_empty());
        assert_eq!(pathway.semester_courses[&4], vec!["PSY171"]);
        assert_eq!(
            pathway.core_courses(),
            BTreeSet::from(["HLTH100", "HLTH101", "HLTH200", "HLTH300"])
        );
    }

    #[test]
    fn test_duplicate_cohort_is_fatal() {
        let file = write_table(&[
            "HLTH,2014,HLTH100,HLTH200,HLTH300,,,,",
            "HLTH,2014,HLTH101,HLTH200,HLTH300,,,,",
        ]);
        let err = PathwayBook::load(file.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::DuplicateCohort { cohort }) if cohort == "HLTH-2014"
        ));
    }

    #[test]
    fn test_math_requirements_in_offset_order() {
        let file = write_table(&["BUS,2012,BUS100,BUS200,BUS300,ENG114,MATH124,PSY171;MATH110,"]);
        let book = PathwayBook::load(file.path()).unwrap();
        let pathway = book.get("BUS-2012").unwrap();

        assert_eq!(
            pathway.math_requirements(&math()),
            vec![("MATH124", 2), ("PSY171", 4), ("MATH110", 4)]
        );
        assert_eq!(pathway.first_math_course(&math()), Some("MATH124"));
        assert_eq!(pathway.first_math_semester(&math()), Some(2));
    }

    #[test]
    fn test_no_math_courses_is_absent_not_an_error() {
        let file = write_table(&["ART,2013,ART100,ART200,ART300,ENG114,,,"]);
        let book = PathwayBook::load(file.path()).unwrap();
        let pathway = book.get("ART-2013").unwrap();

        assert!(pathway.math_requirements(&math()).is_empty());
        assert_eq!(pathway.first_math_course(&math()), None);
        assert_eq!(pathway.first_math_semester(&math()), None);
    }
}
