//! Question bank entries.
//!
//! Questions are owned by a [`QuestionSource`](crate::QuestionSource); the
//! engine only reads them. The JSON shape keeps the bank's field names
//! (`questionType`, `correctAnswer`, `correctOrder`).

use serde::{Deserialize, Serialize};

use crate::types::QuestionId;

/// Reference answer for option-based questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerKey {
    /// Exactly one option index is correct.
    Single(u32),
    /// A set of option indices, compared order-independently.
    Multiple(Vec<u32>),
}

/// Type-specific question content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "questionType", rename_all = "kebab-case")]
pub enum QuestionKind {
    /// Pick one or more options.
    MultipleChoice {
        options: Vec<String>,
        #[serde(rename = "correctAnswer")]
        correct_answer: AnswerKey,
    },
    /// Options about a passage; scored like multiple choice.
    ReadingComprehension {
        #[serde(default)]
        passage: String,
        options: Vec<String>,
        #[serde(rename = "correctAnswer")]
        correct_answer: AnswerKey,
    },
    /// Type the missing word.
    FillBlank {
        #[serde(rename = "correctAnswer")]
        correct_answer: String,
    },
    /// Arrange fragments into a sentence.
    SentenceOrder {
        fragments: Vec<String>,
        #[serde(rename = "correctOrder")]
        correct_order: Vec<String>,
    },
}

impl QuestionKind {
    /// Wire name of the question type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::MultipleChoice { .. } => "multiple-choice",
            Self::ReadingComprehension { .. } => "reading-comprehension",
            Self::FillBlank { .. } => "fill-blank",
            Self::SentenceOrder { .. } => "sentence-order",
        }
    }
}

/// A question as stored in the bank, including its reference answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub level: u32,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

impl Question {
    /// Client-facing view with the reference answer stripped.
    #[must_use]
    pub fn to_view(&self) -> QuestionView {
        let (options, passage, fragments, multiple_answers) = match &self.kind {
            QuestionKind::MultipleChoice {
                options,
                correct_answer,
            } => (
                Some(options.clone()),
                None,
                None,
                matches!(correct_answer, AnswerKey::Multiple(_)),
            ),
            QuestionKind::ReadingComprehension {
                passage,
                options,
                correct_answer,
            } => (
                Some(options.clone()),
                Some(passage.clone()),
                None,
                matches!(correct_answer, AnswerKey::Multiple(_)),
            ),
            QuestionKind::FillBlank { .. } => (None, None, None, false),
            QuestionKind::SentenceOrder { fragments, .. } => {
                (None, None, Some(fragments.clone()), false)
            }
        };

        QuestionView {
            id: self.id.clone(),
            level: self.level,
            question_type: self.kind.type_name().to_string(),
            prompt: self.prompt.clone(),
            options,
            passage,
            fragments,
            multiple_answers,
        }
    }

    /// Reference answer as JSON, for result reporting.
    #[must_use]
    pub fn reference_answer(&self) -> serde_json::Value {
        let value = match &self.kind {
            QuestionKind::MultipleChoice { correct_answer, .. }
            | QuestionKind::ReadingComprehension { correct_answer, .. } => {
                serde_json::to_value(correct_answer)
            }
            QuestionKind::FillBlank { correct_answer } => serde_json::to_value(correct_answer),
            QuestionKind::SentenceOrder { correct_order, .. } => serde_json::to_value(correct_order),
        };
        value.unwrap_or(serde_json::Value::Null)
    }
}

/// A question as sent to the test taker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: QuestionId,
    pub level: u32,
    pub question_type: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragments: Option<Vec<String>>,
    /// Whether more than one option may be selected
    #[serde(default)]
    pub multiple_answers: bool,
}
