use anyhow::Result;
use std::path::PathBuf;

/// One invocation of a sequential pattern miner.
#[derive(Debug, Clone, PartialEq)]
pub struct MiningRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Minimum support, either a proportion (`0.4`) or a percentage (`40%`).
    /// Passed to the miner as written.
    pub min_support: String,
    pub algorithm: String,
    /// Further algorithm parameters, passed through verbatim.
    pub extra_args: Vec<String>,
}

pub trait PatternMiner {
    /// Mines `request.input` and writes patterns to `request.output`.
    /// Returns once the output file is complete.
    fn mine(&self, request: &MiningRequest) -> Result<()>;
}
