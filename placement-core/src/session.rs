//! Placement session orchestration.
//!
//! [`PlacementEngine`] runs one phase transition per call. No session is
//! stored between calls: the caller echoes `configId` and `phase` (and,
//! with a [`SessionSigner`], the session token) on every submission.
//!
//! ```text
//! NotStarted --start--> InPhase(initial)
//! InPhase(p) --submit, continuing branch--> InPhase(next_phase)
//! InPhase(p) --submit, terminal branch--> Terminated(result_level)
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::branch::{Branch, Outcome, QuestionSpec};
use crate::checker::is_correct;
use crate::config::{AssessmentConfig, AssessmentDraft, ConfigSummary};
use crate::error::{PlacementError, Result};
use crate::matcher::{describe_path, find_match_path};
use crate::phase::Phase;
use crate::question::{Question, QuestionView};
use crate::token::SessionSigner;
use crate::traits::{AccountLedger, AccountSnapshot, ConfigStore, QuestionSource, Rewards};
use crate::types::{AccountId, ConfigId, QuestionId};

/// Experience credited per correct answer in the final batch.
pub const EXPERIENCE_PER_CORRECT: u64 = 50;

/// Coins credited per correct answer in the final batch.
pub const COINS_PER_CORRECT: u64 = 20;

/// Rewards for finishing a test with `correct_count` correct answers.
#[must_use]
pub fn rewards_for(correct_count: u32) -> Rewards {
    let correct = u64::from(correct_count);
    Rewards {
        experience: correct * EXPERIENCE_PER_CORRECT,
        coins: correct * COINS_PER_CORRECT,
    }
}

/// Number of correct results, saturating at `u32::MAX`.
fn count_correct(results: &[QuestionResult]) -> u32 {
    results
        .iter()
        .filter(|r| r.correct)
        .fold(0_u32, |n, _| n.saturating_add(1))
}

/// Questions for one phase, as returned by start and continuing submits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseQuestions {
    pub config_id: ConfigId,
    pub phase: Phase,
    pub questions: Vec<QuestionView>,
    pub total_questions: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_minutes: Option<u32>,
    /// Present when the engine signs sessions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

/// One answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    pub answer: Value,
}

/// Answers for the current phase, with the echoed session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub config_id: ConfigId,
    pub phase: Phase,
    pub answers: Vec<SubmittedAnswer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

/// Per-question detail in a finished test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_id: QuestionId,
    pub question_type: String,
    pub submitted: Value,
    pub correct: bool,
    pub correct_answer: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// The session moves on to another phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextPhase {
    /// Questions for the next phase
    #[serde(flatten)]
    pub questions: PhaseQuestions,
    /// Correct answers in the batch just submitted
    pub correct_count: u32,
    /// Name of the branch that was selected
    pub branch_name: String,
    pub has_sub_branches: bool,
    /// Fallback branches of the selected node. Informational only: the
    /// next submit is matched against the whole tree again.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_branches: Vec<Branch>,
}

/// The session ended on a terminal branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementResult {
    pub config_id: ConfigId,
    /// Level reached by the selected terminal branch
    pub result_level: u32,
    /// Account level after the result was applied
    pub level: u32,
    pub correct_count: u32,
    pub total_questions: usize,
    pub rewards: Rewards,
    pub question_results: Vec<QuestionResult>,
    pub account: AccountSnapshot,
}

/// Result of a submit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// More questions follow.
    Continue(NextPhase),
    /// The test is over.
    Completed(PlacementResult),
}

/// Runs placement tests against external collaborators.
pub struct PlacementEngine {
    configs: Arc<dyn ConfigStore>,
    questions: Arc<dyn QuestionSource>,
    ledger: Arc<dyn AccountLedger>,
    signer: Option<SessionSigner>,
}

impl PlacementEngine {
    /// Create an engine that trusts the echoed session state.
    pub fn new(
        configs: Arc<dyn ConfigStore>,
        questions: Arc<dyn QuestionSource>,
        ledger: Arc<dyn AccountLedger>,
    ) -> Self {
        Self {
            configs,
            questions,
            ledger,
            signer: None,
        }
    }

    /// Require signed session tokens on every submit.
    #[must_use]
    pub fn with_signer(mut self, signer: SessionSigner) -> Self {
        self.signer = Some(signer);
        self
    }

    // === Admin ===

    /// Validate and store a draft, then make it the only active config.
    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn publish_config(&self, draft: AssessmentDraft) -> Result<ConfigId> {
        draft.validate()?;
        let config = draft.into_config();
        let id = config.id;
        self.configs.insert(config).await?;
        self.configs.set_active_exclusive(id).await?;
        info!(config_id = %id, "published assessment config");
        Ok(id)
    }

    /// Summary of the active config.
    pub async fn active_summary(&self) -> Result<ConfigSummary> {
        Ok(self.active_config().await?.summary())
    }

    // === Session ===

    /// Charge the test cost and hand out the initial questions.
    ///
    /// Questions are drawn before the debit, so a failed draw costs
    /// nothing; an insufficient balance fails before anything is drawn.
    #[instrument(skip(self), fields(account = %account))]
    pub async fn start(&self, account: &AccountId) -> Result<PhaseQuestions> {
        let config = self.active_config().await?;

        let snapshot = self
            .ledger
            .snapshot(account)
            .await?
            .ok_or_else(|| PlacementError::not_found("account", account))?;
        if snapshot.coins < config.cost {
            warn!(cost = config.cost, balance = snapshot.coins, "insufficient funds to start");
            return Err(PlacementError::InsufficientFunds {
                required: config.cost,
                available: snapshot.coins,
            });
        }

        let questions = self.draw(&config.initial_spec).await?;
        if config.cost > 0 {
            self.ledger.debit(account, config.cost).await?;
        }

        info!(
            config_id = %config.id,
            questions = questions.len(),
            cost = config.cost,
            "started placement test"
        );
        self.phase_questions(account, &config, Phase::Initial, &questions)
    }

    /// Score a batch and advance the session.
    #[instrument(
        skip(self, submission),
        fields(account = %account, config_id = %submission.config_id, phase = %submission.phase)
    )]
    pub async fn submit(
        &self,
        account: &AccountId,
        submission: Submission,
    ) -> Result<SubmitOutcome> {
        let config = self
            .configs
            .get_by_id(submission.config_id)
            .await?
            .ok_or_else(|| PlacementError::not_found("config", submission.config_id))?;

        if let Some(signer) = &self.signer {
            verify_session(signer, account, &submission)?;
        }

        let ids: Vec<QuestionId> = submission
            .answers
            .iter()
            .map(|a| a.question_id.clone())
            .collect();
        let resolved: HashMap<QuestionId, Question> = self
            .questions
            .get_many(&ids)
            .await?
            .into_iter()
            .map(|q| (q.id.clone(), q))
            .collect();

        let mut results = Vec::with_capacity(submission.answers.len());
        for answer in submission.answers {
            let question = resolved
                .get(&answer.question_id)
                .ok_or_else(|| PlacementError::not_found("question", &answer.question_id))?;
            results.push(QuestionResult {
                question_id: answer.question_id.clone(),
                question_type: question.kind.type_name().to_string(),
                correct: is_correct(question, &answer.answer),
                submitted: answer.answer,
                correct_answer: question.reference_answer(),
                explanation: question.explanation.clone(),
            });
        }
        let correct_count = count_correct(&results);

        let Some((path, branch)) =
            find_match_path(&config.branches, submission.phase, correct_count)
        else {
            warn!(correct_count, "no branch covers this result");
            return Err(PlacementError::NoMatchingBranch {
                phase: submission.phase,
                correct_count,
            });
        };
        debug!(
            branch = %branch.name,
            path = %describe_path(&path),
            correct_count,
            "matched branch"
        );

        match &branch.outcome {
            Outcome::Terminal { result_level } => {
                let rewards = rewards_for(correct_count);
                self.ledger.settle(account, *result_level, rewards).await?;
                let snapshot = self
                    .ledger
                    .snapshot(account)
                    .await?
                    .ok_or_else(|| PlacementError::not_found("account", account))?;

                info!(
                    result_level,
                    level = snapshot.level,
                    correct_count,
                    "placement test completed"
                );
                Ok(SubmitOutcome::Completed(PlacementResult {
                    config_id: config.id,
                    result_level: *result_level,
                    level: snapshot.level,
                    correct_count,
                    total_questions: results.len(),
                    rewards,
                    question_results: results,
                    account: snapshot,
                }))
            }
            Outcome::Continue {
                next_phase,
                next_spec,
            } => {
                let questions = self.draw(next_spec).await?;
                let phase_questions =
                    self.phase_questions(account, &config, *next_phase, &questions)?;

                info!(
                    next_phase = %next_phase,
                    questions = questions.len(),
                    "advanced to next phase"
                );
                Ok(SubmitOutcome::Continue(NextPhase {
                    questions: phase_questions,
                    correct_count,
                    branch_name: branch.name.clone(),
                    has_sub_branches: !branch.sub_branches.is_empty(),
                    sub_branches: branch.sub_branches.clone(),
                }))
            }
        }
    }

    async fn active_config(&self) -> Result<AssessmentConfig> {
        self.configs
            .get_active()
            .await?
            .ok_or(PlacementError::NoActiveConfig)
    }

    /// Fetch once per spec entry and concatenate in spec order.
    async fn draw(&self, specs: &[QuestionSpec]) -> Result<Vec<Question>> {
        let mut questions = Vec::new();
        for spec in specs {
            let batch = self.questions.fetch(spec.level, spec.count).await?;
            if batch.len() < spec.count as usize {
                warn!(
                    level = spec.level,
                    requested = spec.count,
                    returned = batch.len(),
                    "question source returned fewer questions than requested"
                );
            }
            questions.extend(batch);
        }
        Ok(questions)
    }

    fn phase_questions(
        &self,
        account: &AccountId,
        config: &AssessmentConfig,
        phase: Phase,
        questions: &[Question],
    ) -> Result<PhaseQuestions> {
        let session_token = self
            .signer
            .as_ref()
            .map(|signer| {
                signer.issue(
                    account,
                    config.id,
                    phase,
                    questions.iter().map(|q| q.id.clone()).collect(),
                )
            })
            .transpose()?;

        Ok(PhaseQuestions {
            config_id: config.id,
            phase,
            questions: questions.iter().map(Question::to_view).collect(),
            total_questions: questions.len(),
            time_limit_minutes: config.time_limit_minutes,
            session_token,
        })
    }
}

/// Check that a submission matches the session its token describes.
fn verify_session(
    signer: &SessionSigner,
    account: &AccountId,
    submission: &Submission,
) -> Result<()> {
    let token = submission
        .session_token
        .as_deref()
        .ok_or_else(|| PlacementError::InvalidSession("missing session token".to_string()))?;
    let claims = signer.verify(token)?;

    if &claims.sub != account {
        return Err(PlacementError::InvalidSession(
            "token issued to another account".to_string(),
        ));
    }
    if claims.cfg != submission.config_id {
        return Err(PlacementError::InvalidSession(
            "token issued for another config".to_string(),
        ));
    }
    if claims.phase != submission.phase {
        return Err(PlacementError::InvalidSession(format!(
            "token is for phase {}, submission is for {}",
            claims.phase, submission.phase
        )));
    }

    let issued: HashSet<&QuestionId> = claims.qids.iter().collect();
    let mut answered = HashSet::new();
    for answer in &submission.answers {
        if !issued.contains(&answer.question_id) {
            return Err(PlacementError::InvalidSession(format!(
                "question {} was not issued in this phase",
                answer.question_id
            )));
        }
        if !answered.insert(&answer.question_id) {
            return Err(PlacementError::InvalidSession(format!(
                "question {} answered more than once",
                answer.question_id
            )));
        }
    }
    Ok(())
}
