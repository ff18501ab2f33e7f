//! Assessment configuration.
//!
//! An [`AssessmentDraft`] is what an admin authors: cost, the initial
//! question spec and the branch tree. Publishing a draft turns it into an
//! [`AssessmentConfig`] with an identity and an active flag. Both validate
//! on deserialization, so invalid trees are rejected at save time rather
//! than during a test.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::branch::{
    Branch, Outcome, QuestionSpec, RawBranch, batch_size, branches_from_raw, validate_specs,
};
use crate::error::ConfigError;
use crate::types::ConfigId;

/// Admin-authored assessment definition, not yet stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawDraft")]
pub struct AssessmentDraft {
    /// Display name
    pub name: String,

    /// Coins charged to start the test
    pub cost: u64,

    /// Advisory time limit shown to the test taker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<u32>,

    /// Questions for the initial phase, drawn per level in order
    pub initial_spec: Vec<QuestionSpec>,

    /// Root of the decision tree
    pub branches: Vec<Branch>,
}

impl AssessmentDraft {
    /// Check every invariant that construction through serde enforces.
    ///
    /// Drafts built in code can bypass deserialization, so publishing
    /// validates again.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_spec.is_empty() {
            return Err(ConfigError::EmptyInitialSpec);
        }
        validate_specs(&self.initial_spec, "initialSpec")?;

        for (i, branch) in self.branches.iter().enumerate() {
            validate_branch(branch).map_err(|e| e.nested(&format!("branches[{i}]")))?;
        }
        Ok(())
    }

    /// Assign an identity. The new config starts inactive.
    #[must_use]
    pub fn into_config(self) -> AssessmentConfig {
        AssessmentConfig {
            id: ConfigId::new(),
            name: self.name,
            cost: self.cost,
            time_limit_minutes: self.time_limit_minutes,
            initial_spec: self.initial_spec,
            branches: self.branches,
            active: false,
            created_at: Utc::now(),
        }
    }
}

fn validate_branch(branch: &Branch) -> Result<(), ConfigError> {
    if let Outcome::Continue { next_spec, .. } = &branch.outcome {
        if next_spec.is_empty() {
            return Err(ConfigError::EmptyNextSpec {
                path: String::new(),
            });
        }
        validate_specs(next_spec, "nextSpec")?;
    }
    for (i, child) in branch.sub_branches.iter().enumerate() {
        validate_branch(child).map_err(|e| e.nested(&format!("subBranches[{i}]")))?;
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDraft {
    #[serde(default)]
    name: String,
    #[serde(default)]
    cost: u64,
    #[serde(default)]
    time_limit_minutes: Option<u32>,
    initial_spec: Vec<QuestionSpec>,
    #[serde(default)]
    branches: Vec<RawBranch>,
}

impl TryFrom<RawDraft> for AssessmentDraft {
    type Error = ConfigError;

    fn try_from(raw: RawDraft) -> Result<Self, Self::Error> {
        let draft = Self {
            name: raw.name,
            cost: raw.cost,
            time_limit_minutes: raw.time_limit_minutes,
            initial_spec: raw.initial_spec,
            branches: branches_from_raw(raw.branches, "branches")?,
        };
        draft.validate()?;
        Ok(draft)
    }
}

/// A stored assessment configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawConfig")]
pub struct AssessmentConfig {
    pub id: ConfigId,
    pub name: String,
    pub cost: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<u32>,
    pub initial_spec: Vec<QuestionSpec>,
    pub branches: Vec<Branch>,
    /// Exactly one stored config is active at a time
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl AssessmentConfig {
    /// Number of questions the initial phase asks for.
    #[must_use]
    pub fn total_initial_questions(&self) -> u32 {
        batch_size(&self.initial_spec)
    }

    /// Number of nodes in the branch tree.
    #[must_use]
    pub fn branch_count(&self) -> usize {
        let mut count = 0;
        for branch in &self.branches {
            branch.walk(0, &mut |_, _| count += 1);
        }
        count
    }

    /// Public summary for the "current assessment" view.
    #[must_use]
    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            id: self.id,
            name: self.name.clone(),
            cost: self.cost,
            total_questions: self.total_initial_questions(),
            time_limit_minutes: self.time_limit_minutes,
        }
    }
}

// Stored configs may omit bookkeeping fields; the draft part is validated.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(default)]
    id: Option<ConfigId>,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    draft: AssessmentDraft,
}

impl From<RawConfig> for AssessmentConfig {
    fn from(raw: RawConfig) -> Self {
        Self {
            id: raw.id.unwrap_or_default(),
            name: raw.draft.name,
            cost: raw.draft.cost,
            time_limit_minutes: raw.draft.time_limit_minutes,
            initial_spec: raw.draft.initial_spec,
            branches: raw.draft.branches,
            active: raw.active,
            created_at: raw.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// What a test taker sees before paying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSummary {
    pub id: ConfigId,
    pub name: String,
    pub cost: u64,
    pub total_questions: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<u32>,
}
