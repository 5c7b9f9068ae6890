mod client;
mod spmf;

pub use client::{MiningRequest, PatternMiner};
pub use spmf::SpmfMiner;

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

pub const DEFAULT_ALGORITHM: &str = "CM-SPADE";

/// A mined sequential pattern and the number of sequences containing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pattern {
    /// Semesters of the pattern, each a set of courses taken together.
    pub itemsets: Vec<Vec<String>>,
    pub support: u64,
}

impl Pattern {
    /// Parses a line like `MATH110 PSY171 -1 ENG114 -1 #SUP: 5`.
    pub fn parse(line: &str) -> Result<Self> {
        let (body, support) = line
            .split_once("#SUP:")
            .with_context(|| format!("no support in pattern line '{line}'"))?;
        let support = support
            .trim()
            .parse()
            .with_context(|| format!("bad support in pattern line '{line}'"))?;

        let mut itemsets = Vec::new();
        let mut current = Vec::new();
        for token in body.split_whitespace() {
            if token == "-1" {
                itemsets.push(std::mem::take(&mut current));
            } else {
                current.push(token.to_string());
            }
        }
        if !current.is_empty() {
            itemsets.push(current);
        }

        Ok(Self { itemsets, support })
    }

    /// Semesters covered by the pattern.
    pub fn len(&self) -> usize {
        self.itemsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itemsets.is_empty()
    }
}

/// Parses a miner output file; blank lines are ignored.
pub fn read_patterns(path: &Path) -> Result<Vec<Pattern>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(Pattern::parse)
        .collect()
}

/// Runs the miner and reads back what it found.
pub fn mine_patterns<M: PatternMiner>(miner: &M, request: &MiningRequest) -> Result<Vec<Pattern>> {
    miner.mine(request)?;
    read_patterns(&request.output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pattern_line() {
        let pattern = Pattern::parse("MATH110 PSY171 -1 ENG114 -1 #SUP: 5").unwrap();
        assert_eq!(
            pattern.itemsets,
            vec![
                vec!["MATH110".to_string(), "PSY171".to_string()],
                vec!["ENG114".to_string()]
            ]
        );
        assert_eq!(pattern.support, 5);
        assert_eq!(pattern.len(), 2);
    }

    #[test]
    fn test_parse_rejects_missing_support() {
        assert!(Pattern::parse("MATH110 -1").is_err());
        assert!(Pattern::parse("MATH110 -1 #SUP: many").is_err());
    }

    struct CannedMiner(&'static str);

    impl PatternMiner for CannedMiner {
        fn mine(&self, request: &MiningRequest) -> Result<()> {
            std::fs::write(&request.output, self.0)?;
            Ok(())
        }
    }

    #[test]
    fn test_mine_patterns_reads_output() {
        let dir = tempfile::tempdir().unwrap();
        let request = MiningRequest {
            input: dir.path().join("in.txt"),
            output: dir.path().join("out.txt"),
            min_support: "0.5".to_string(),
            algorithm: DEFAULT_ALGORITHM.to_string(),
            extra_args: Vec::new(),
        };
        let miner = CannedMiner("MATH110 -1 #SUP: 3\n\nMATH110 -1 PSY171 -1 #SUP: 2\n");

        let patterns = mine_patterns(&miner, &request).unwrap();
        assert_eq!(patterns.len(), 2);
        assert_eq!(patterns[1].support, 2);
    }
}
