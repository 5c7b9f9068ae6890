pub mod config;
pub mod enrollment;
pub mod error;
pub mod export;
pub mod grades;
pub mod merge;
pub mod miner;
pub mod output;
pub mod pathway;
pub mod pipeline;
pub mod progress;
pub mod records;
pub mod terms;
