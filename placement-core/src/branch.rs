//! Branch tree nodes.
//!
//! Admins author branches as loosely-shaped JSON objects with optional
//! `resultLevel` / `nextPhase` fields. On deserialization each node is
//! converted into a [`Branch`] whose [`Outcome`] is either terminal or
//! continuing, so a node with neither (or both) cannot exist in memory.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::phase::Phase;

/// How many questions to draw from one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSpec {
    /// Difficulty level to draw from
    pub level: u32,
    /// Number of questions to draw (at least 1)
    pub count: u32,
}

impl QuestionSpec {
    /// Create a spec entry.
    #[must_use]
    pub fn new(level: u32, count: u32) -> Self {
        Self { level, count }
    }
}

/// Most questions a single phase may ask for.
pub const MAX_BATCH_QUESTIONS: u32 = 1_000;

/// Total questions a list of specs asks for, saturating at `u32::MAX`.
#[must_use]
pub fn batch_size(specs: &[QuestionSpec]) -> u32 {
    specs
        .iter()
        .fold(0_u32, |total, spec| total.saturating_add(spec.count))
}

/// Validate a list of question specs: no zero counts, and a batch total
/// of at most [`MAX_BATCH_QUESTIONS`].
pub(crate) fn validate_specs(specs: &[QuestionSpec], field: &str) -> Result<(), ConfigError> {
    if let Some(i) = specs.iter().position(|spec| spec.count == 0) {
        return Err(ConfigError::ZeroCount {
            path: format!("{field}[{i}]"),
        });
    }
    let total = batch_size(specs);
    if total > MAX_BATCH_QUESTIONS {
        return Err(ConfigError::TooManyQuestions {
            path: field.to_string(),
            total,
            max: MAX_BATCH_QUESTIONS,
        });
    }
    Ok(())
}

/// Inclusive range of correct answers, authored as `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "(u32, u32)", into = "(u32, u32)")]
pub struct CorrectRange {
    min: u32,
    max: u32,
}

impl CorrectRange {
    /// Create a range, rejecting `min > max`.
    pub fn new(min: u32, max: u32) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvertedRange {
                path: String::new(),
                min,
                max,
            });
        }
        Ok(Self { min, max })
    }

    /// Lower bound (inclusive).
    #[must_use]
    pub fn min(&self) -> u32 {
        self.min
    }

    /// Upper bound (inclusive).
    #[must_use]
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Whether `count` lies within the range.
    #[must_use]
    pub fn contains(&self, count: u32) -> bool {
        self.min <= count && count <= self.max
    }
}

impl TryFrom<(u32, u32)> for CorrectRange {
    type Error = ConfigError;

    fn try_from((min, max): (u32, u32)) -> Result<Self, Self::Error> {
        Self::new(min, max)
    }
}

impl From<CorrectRange> for (u32, u32) {
    fn from(range: CorrectRange) -> Self {
        (range.min, range.max)
    }
}

impl std::fmt::Display for CorrectRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// When a branch applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Phase whose results this branch evaluates
    pub from_phase: Phase,
    /// Correct-answer range that selects this branch
    pub correct_range: CorrectRange,
}

impl Condition {
    /// Whether a batch of `correct_count` answers in `phase` satisfies this condition.
    #[must_use]
    pub fn matches(&self, phase: Phase, correct_count: u32) -> bool {
        self.from_phase == phase && self.correct_range.contains(correct_count)
    }
}

/// What happens when a branch is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// End the session with this placement level.
    Terminal {
        /// Level awarded to the account
        result_level: u32,
    },
    /// Ask another batch of questions.
    Continue {
        /// Phase tag for the next batch
        next_phase: Phase,
        /// Questions to draw for the next batch (non-empty)
        next_spec: Vec<QuestionSpec>,
    },
}

/// A node in the assessment decision tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBranch", into = "RawBranch")]
pub struct Branch {
    /// Label shown to admins; no effect on matching
    pub name: String,
    /// Phase and range that select this branch
    pub condition: Condition,
    /// Terminal result or continuation
    pub outcome: Outcome,
    /// Fallback branches, searched only when this one does not match
    pub sub_branches: Vec<Branch>,
}

impl Branch {
    /// Build a terminal branch.
    pub fn terminal(
        name: impl Into<String>,
        from_phase: Phase,
        range: (u32, u32),
        result_level: u32,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            name: name.into(),
            condition: Condition {
                from_phase,
                correct_range: CorrectRange::try_from(range)?,
            },
            outcome: Outcome::Terminal { result_level },
            sub_branches: Vec::new(),
        })
    }

    /// Build a continuing branch.
    pub fn continuing(
        name: impl Into<String>,
        from_phase: Phase,
        range: (u32, u32),
        next_phase: Phase,
        next_spec: Vec<QuestionSpec>,
    ) -> Result<Self, ConfigError> {
        if next_spec.is_empty() {
            return Err(ConfigError::EmptyNextSpec {
                path: String::new(),
            });
        }
        validate_specs(&next_spec, "nextSpec")?;
        Ok(Self {
            name: name.into(),
            condition: Condition {
                from_phase,
                correct_range: CorrectRange::try_from(range)?,
            },
            outcome: Outcome::Continue {
                next_phase,
                next_spec,
            },
            sub_branches: Vec::new(),
        })
    }

    /// Attach fallback branches.
    #[must_use]
    pub fn with_sub_branches(mut self, sub_branches: Vec<Branch>) -> Self {
        self.sub_branches = sub_branches;
        self
    }

    /// Whether selecting this branch ends the session.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.outcome, Outcome::Terminal { .. })
    }

    /// Placement level, for terminal branches.
    #[must_use]
    pub fn result_level(&self) -> Option<u32> {
        match self.outcome {
            Outcome::Terminal { result_level } => Some(result_level),
            Outcome::Continue { .. } => None,
        }
    }

    /// Next phase, for continuing branches.
    #[must_use]
    pub fn next_phase(&self) -> Option<Phase> {
        match self.outcome {
            Outcome::Continue { next_phase, .. } => Some(next_phase),
            Outcome::Terminal { .. } => None,
        }
    }

    /// Visit this branch and all descendants in pre-order, with depth.
    pub fn walk<'a>(&'a self, depth: usize, visit: &mut impl FnMut(&'a Branch, usize)) {
        visit(self, depth);
        for child in &self.sub_branches {
            child.walk(depth + 1, visit);
        }
    }
}

/// Branch as authored, before outcome exclusivity is checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawBranch {
    #[serde(default)]
    name: String,
    condition: RawCondition,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    next_spec: Vec<QuestionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result_level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_phase: Option<Phase>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    sub_branches: Vec<RawBranch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCondition {
    from_phase: Phase,
    correct_range: (u32, u32),
}

impl TryFrom<RawBranch> for Branch {
    type Error = ConfigError;

    fn try_from(raw: RawBranch) -> Result<Self, Self::Error> {
        let (min, max) = raw.condition.correct_range;
        let correct_range = CorrectRange::new(min, max)?;

        // A terminal branch ignores any nextSpec it carries.
        let outcome = match (raw.result_level, raw.next_phase) {
            (Some(result_level), None) => Outcome::Terminal { result_level },
            (None, Some(next_phase)) => {
                if raw.next_spec.is_empty() {
                    return Err(ConfigError::EmptyNextSpec {
                        path: String::new(),
                    });
                }
                validate_specs(&raw.next_spec, "nextSpec")?;
                Outcome::Continue {
                    next_phase,
                    next_spec: raw.next_spec,
                }
            }
            (None, None) => {
                return Err(ConfigError::MissingOutcome {
                    path: String::new(),
                });
            }
            (Some(_), Some(_)) => {
                return Err(ConfigError::AmbiguousOutcome {
                    path: String::new(),
                });
            }
        };

        let sub_branches = raw
            .sub_branches
            .into_iter()
            .enumerate()
            .map(|(i, child)| {
                Branch::try_from(child).map_err(|e| e.nested(&format!("subBranches[{i}]")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: raw.name,
            condition: Condition {
                from_phase: raw.condition.from_phase,
                correct_range,
            },
            outcome,
            sub_branches,
        })
    }
}

impl From<Branch> for RawBranch {
    fn from(branch: Branch) -> Self {
        let (result_level, next_phase, next_spec) = match branch.outcome {
            Outcome::Terminal { result_level } => (Some(result_level), None, Vec::new()),
            Outcome::Continue {
                next_phase,
                next_spec,
            } => (None, Some(next_phase), next_spec),
        };
        Self {
            name: branch.name,
            condition: RawCondition {
                from_phase: branch.condition.from_phase,
                correct_range: branch.condition.correct_range.into(),
            },
            next_spec,
            result_level,
            next_phase,
            sub_branches: branch.sub_branches.into_iter().map(Into::into).collect(),
        }
    }
}

/// Convert authored branches, prefixing errors with `field[i]`.
pub(crate) fn branches_from_raw(raw: Vec<RawBranch>, field: &str) -> Result<Vec<Branch>, ConfigError> {
    raw.into_iter()
        .enumerate()
        .map(|(i, node)| Branch::try_from(node).map_err(|e| e.nested(&format!("{field}[{i}]"))))
        .collect()
}
