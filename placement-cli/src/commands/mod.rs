pub mod config;
pub mod match_cmd;
pub mod output;
pub mod take;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use placement_core::AssessmentDraft;
use placement_core::memory::InMemoryQuestionBank;

/// Read and validate an assessment config file.
pub(crate) fn load_draft(path: &Path) -> Result<AssessmentDraft> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read assessment config {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid assessment config {}", path.display()))
}

/// Read a question bank file.
pub(crate) fn load_question_bank(path: &Path) -> Result<InMemoryQuestionBank> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read question bank {}", path.display()))?;
    InMemoryQuestionBank::from_json(&contents)
        .with_context(|| format!("Invalid question bank {}", path.display()))
}
