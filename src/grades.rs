//! The fixed set of valid letter grades and the policies attached to them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A letter grade from the registrar's valid-grade enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    C,
    #[serde(rename = "C-")]
    CMinus,
    #[serde(rename = "D+")]
    DPlus,
    D,
    #[serde(rename = "D-")]
    DMinus,
    F,
    /// Incomplete
    I,
    /// Incomplete, charged
    IC,
    /// Credit
    CR,
    /// No credit
    NC,
    /// Report delayed
    RD,
    /// Report in progress
    RP,
    /// Withdraw
    W,
    /// Withdraw, unauthorized
    WU,
}

impl Grade {
    pub const ALL: [Grade; 21] = [
        Grade::APlus,
        Grade::A,
        Grade::AMinus,
        Grade::BPlus,
        Grade::B,
        Grade::BMinus,
        Grade::CPlus,
        Grade::C,
        Grade::CMinus,
        Grade::DPlus,
        Grade::D,
        Grade::DMinus,
        Grade::F,
        Grade::I,
        Grade::IC,
        Grade::CR,
        Grade::NC,
        Grade::RD,
        Grade::RP,
        Grade::W,
        Grade::WU,
    ];

    /// Parses a letter grade, returning `None` for anything outside the valid set.
    pub fn parse(letter: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.letter() == letter)
    }

    pub fn letter(self) -> &'static str {
        match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::AMinus => "A-",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::BMinus => "B-",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::CMinus => "C-",
            Grade::DPlus => "D+",
            Grade::D => "D",
            Grade::DMinus => "D-",
            Grade::F => "F",
            Grade::I => "I",
            Grade::IC => "IC",
            Grade::CR => "CR",
            Grade::NC => "NC",
            Grade::RD => "RD",
            Grade::RP => "RP",
            Grade::W => "W",
            Grade::WU => "WU",
        }
    }

    /// GPA points for the grade, or `None` for grades that do not count toward GPA.
    pub fn points(self) -> Option<f64> {
        match self {
            Grade::APlus | Grade::A => Some(4.0),
            Grade::AMinus => Some(3.7),
            Grade::BPlus => Some(3.3),
            Grade::B => Some(3.0),
            Grade::BMinus => Some(2.7),
            Grade::CPlus => Some(2.3),
            Grade::C => Some(2.0),
            Grade::CMinus => Some(1.7),
            Grade::DPlus => Some(1.3),
            Grade::D => Some(1.0),
            Grade::DMinus => Some(0.7),
            Grade::F | Grade::NC => Some(0.0),
            Grade::CR | Grade::W | Grade::WU | Grade::I | Grade::IC | Grade::RD | Grade::RP => None,
        }
    }

    /// `D-` is a valid grade but does not pass.
    pub fn is_passing(self) -> bool {
        matches!(
            self,
            Grade::APlus
                | Grade::A
                | Grade::AMinus
                | Grade::BPlus
                | Grade::B
                | Grade::BMinus
                | Grade::CPlus
                | Grade::C
                | Grade::CMinus
                | Grade::DPlus
                | Grade::D
                | Grade::CR
        )
    }

    /// Withdrawals and incompletes.
    pub fn is_incomplete(self) -> bool {
        matches!(self, Grade::W | Grade::WU | Grade::I | Grade::IC)
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

impl FromStr for Grade {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Grade::parse(s).ok_or_else(|| anyhow::anyhow!("'{s}' is not a valid grade"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_every_letter() {
        for grade in Grade::ALL {
            assert_eq!(Grade::parse(grade.letter()), Some(grade));
        }
    }

    #[test]
    fn test_parse_rejects_administrative_marks() {
        assert_eq!(Grade::parse("AU"), None);
        assert_eq!(Grade::parse(""), None);
        assert_eq!(Grade::parse("a"), None);
        assert!("NR".parse::<Grade>().is_err());
    }

    #[test]
    fn test_points() {
        assert_eq!(Grade::APlus.points(), Some(4.0));
        assert_eq!(Grade::BMinus.points(), Some(2.7));
        assert_eq!(Grade::NC.points(), Some(0.0));
        assert_eq!(Grade::W.points(), None);
        assert_eq!(Grade::CR.points(), None);
    }

    #[test]
    fn test_passing_and_incomplete_sets() {
        assert!(Grade::D.is_passing());
        assert!(Grade::CR.is_passing());
        assert!(!Grade::DMinus.is_passing());
        assert!(!Grade::F.is_passing());
        assert!(!Grade::W.is_passing());

        let incomplete: Vec<_> = Grade::ALL.into_iter().filter(|g| g.is_incomplete()).collect();
        assert_eq!(incomplete, vec![Grade::I, Grade::IC, Grade::W, Grade::WU]);
    }
}
