//! Tokens of the sequential-pattern-mining input format.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Course(String),
    /// A semester in range with no observations.
    Gap,
    /// Closes one semester's itemset (`-1`).
    EndSemester,
    /// Closes the whole sequence (`-2`).
    EndSequence,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Course(code) => f.write_str(code),
            Token::Gap => f.write_str("GAP"),
            Token::EndSemester => f.write_str("-1"),
            Token::EndSequence => f.write_str("-2"),
        }
    }
}

/// One student's serialized timeline; renders as a single space-separated line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Sequence(Vec<Token>);

impl Sequence {
    pub fn tokens(&self) -> &[Token] {
        &self.0
    }

    pub fn course_count(&self) -> usize {
        self.0
            .iter()
            .filter(|t| matches!(t, Token::Course(_)))
            .count()
    }

    pub(crate) fn extend(&mut self, tokens: impl IntoIterator<Item = Token>) {
        self.0.extend(tokens);
    }

    pub(crate) fn push(&mut self, token: Token) {
        self.0.push(token);
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, token) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{token}")?;
        }
        Ok(())
    }
}
