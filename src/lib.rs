//! repolens - repository portfolio classification and health scoring
//!
//! Turns raw repository snapshots into a category, a curated topic list and
//! a graded health report. Rule-based classification always runs; an LLM
//! classifier can be attached as a second opinion and degrades silently to
//! the rule-only result when it is unavailable.

pub mod ai;
pub mod classifier;
pub mod config;
pub mod describe;
pub mod engine;
pub mod error;
pub mod grouping;
pub mod health;
pub mod merge;
pub mod models;
pub mod preferred;
pub mod signals;

pub use engine::{AssessOptions, Assessment, Classification, Engine};
pub use error::{EngineError, EngineResult};
pub use models::{Category, MergedClassification};
