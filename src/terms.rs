//! Academic terms and the sequential semester numbering used across the pipeline.
//!
//! Semesters are numbered from 1 starting with the Fall of the calendar's
//! first year, four per academic year in the order Fall, Winter, Spring,
//! Summer. Consecutive Fall/Spring terms are therefore two numbers apart.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum Season {
    Fall,
    Winter,
    Spring,
    Summer,
}

impl Season {
    /// Position within the academic year, Fall first.
    fn index(self) -> u32 {
        match self {
            Season::Fall => 0,
            Season::Winter => 1,
            Season::Spring => 2,
            Season::Summer => 3,
        }
    }

    /// The season a semester number falls in.
    pub fn of_semester(number: u32) -> Season {
        match number % 4 {
            1 => Season::Fall,
            2 => Season::Winter,
            3 => Season::Spring,
            _ => Season::Summer,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::Fall => "Fall",
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
        }
    }
}

/// A named term such as "Fall 2013".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Term {
    pub season: Season,
    pub year: i32,
}

impl Term {
    pub fn new(season: Season, year: i32) -> Self {
        Self { season, year }
    }

    /// Decodes the term from a course-enrollment export file name.
    ///
    /// Exports are named with a term prefix: `F2013…` (Fall), `WI2014…`
    /// (Winter), `S2014…` (Spring) and `SU2014…` (Summer).
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownTermPrefix`] for any other prefix.
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let unknown = || PipelineError::UnknownTermPrefix {
            file_name: file_name.to_string(),
        };

        let (season, rest) = if let Some(rest) = file_name.strip_prefix("WI") {
            (Season::Winter, rest)
        } else if let Some(rest) = file_name.strip_prefix("SU") {
            (Season::Summer, rest)
        } else if let Some(rest) = file_name.strip_prefix('F') {
            (Season::Fall, rest)
        } else if let Some(rest) = file_name.strip_prefix('S') {
            (Season::Spring, rest)
        } else {
            return Err(unknown().into());
        };

        let year = rest
            .get(..4)
            .filter(|y| y.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|y| y.parse::<i32>().ok())
            .ok_or_else(unknown)?;

        Ok(Term::new(season, year))
    }

    /// The year in which this term's academic year started.
    pub fn academic_year(&self) -> i32 {
        match self.season {
            Season::Fall => self.year,
            _ => self.year - 1,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.season.name(), self.year)
    }
}

impl FromStr for Term {
    type Err = anyhow::Error;

    /// Parses names of the form `"Spring 2014"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (season, year) = s
            .trim()
            .split_once(' ')
            .ok_or_else(|| anyhow::anyhow!("'{s}' is not a term name"))?;
        let season = match season {
            "Fall" => Season::Fall,
            "Winter" => Season::Winter,
            "Spring" => Season::Spring,
            "Summer" => Season::Summer,
            other => anyhow::bail!("unknown season '{other}' in term '{s}'"),
        };
        Ok(Term::new(season, year.trim().parse()?))
    }
}

/// The fixed chronological list of semesters covered by the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemesterCalendar {
    pub first_fall_year: i32,
    pub term_count: u32,
}

impl Default for SemesterCalendar {
    /// Fall 2009 through Fall 2017.
    fn default() -> Self {
        Self {
            first_fall_year: 2009,
            term_count: 33,
        }
    }
}

impl SemesterCalendar {
    /// The 1-based semester number of `term`, if it lies within the calendar.
    pub fn number_of(&self, term: &Term) -> Option<u32> {
        let years = term.academic_year() - self.first_fall_year;
        if years < 0 {
            return None;
        }
        let number = 1 + 4 * years as u32 + term.season.index();
        (number <= self.term_count).then_some(number)
    }

    /// Like [`number_of`](Self::number_of), failing with
    /// [`PipelineError::TermOutOfCalendar`] when the term is not covered.
    pub fn require(&self, term: &Term) -> Result<u32> {
        self.number_of(term).ok_or_else(|| {
            PipelineError::TermOutOfCalendar {
                term: term.to_string(),
            }
            .into()
        })
    }

    pub fn term_of(&self, number: u32) -> Option<Term> {
        if number == 0 || number > self.term_count {
            return None;
        }
        let offset = number - 1;
        let season = Season::of_semester(number);
        let academic_year = self.first_fall_year + (offset / 4) as i32;
        let year = match season {
            Season::Fall => academic_year,
            _ => academic_year + 1,
        };
        Some(Term::new(season, year))
    }

    /// Semester number of the Fall term in which a cohort starts.
    pub fn cohort_start(&self, cohort_year: i32) -> Result<u32> {
        self.require(&Term::new(Season::Fall, cohort_year))
    }
}
