//! Answer checking.
//!
//! Submitted answers arrive as untyped JSON. Checking never fails: any
//! shape that does not fit the question type is simply incorrect.

use serde_json::Value;

use crate::question::{AnswerKey, Question, QuestionKind};

/// Whether `answer` is a correct response to `question`.
#[must_use]
pub fn is_correct(question: &Question, answer: &Value) -> bool {
    match &question.kind {
        QuestionKind::MultipleChoice { correct_answer, .. }
        | QuestionKind::ReadingComprehension { correct_answer, .. } => {
            check_choice(correct_answer, answer)
        }
        QuestionKind::FillBlank { correct_answer } => check_blank(correct_answer, answer),
        QuestionKind::SentenceOrder { correct_order, .. } => check_order(correct_order, answer),
    }
}

fn check_choice(key: &AnswerKey, answer: &Value) -> bool {
    match key {
        AnswerKey::Single(expected) => option_index(answer) == Some(u64::from(*expected)),
        AnswerKey::Multiple(expected) => {
            let Some(items) = answer.as_array() else {
                return false;
            };
            let Some(mut submitted) = items.iter().map(option_index).collect::<Option<Vec<_>>>()
            else {
                return false;
            };
            let mut expected: Vec<u64> = expected.iter().map(|i| u64::from(*i)).collect();
            submitted.sort_unstable();
            expected.sort_unstable();
            submitted == expected
        }
    }
}

/// An option index: a non-negative integer, also accepted in float form (`1.0`).
fn option_index(value: &Value) -> Option<u64> {
    if let Some(index) = value.as_u64() {
        return Some(index);
    }
    let float = value.as_f64()?;
    (float.is_finite() && float >= 0.0 && float.fract() == 0.0 && float <= f64::from(u32::MAX))
        .then_some(float as u64)
}

fn check_blank(expected: &str, answer: &Value) -> bool {
    answer
        .as_str()
        .is_some_and(|s| s.trim().to_lowercase() == expected.trim().to_lowercase())
}

fn check_order(expected: &[String], answer: &Value) -> bool {
    let Some(items) = answer.as_array() else {
        return false;
    };
    items.len() == expected.len()
        && items
            .iter()
            .zip(expected)
            .all(|(item, want)| item.as_str() == Some(want.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QuestionId;
    use serde_json::json;

    fn question(kind: QuestionKind) -> Question {
        Question {
            id: QuestionId::new("q"),
            level: 1,
            prompt: "prompt".to_string(),
            explanation: None,
            kind,
        }
    }

    fn single_choice(index: u32) -> Question {
        question(QuestionKind::MultipleChoice {
            options: vec!["a".into(), "b".into(), "c".into()],
            correct_answer: AnswerKey::Single(index),
        })
    }

    fn multi_choice(indices: Vec<u32>) -> Question {
        question(QuestionKind::ReadingComprehension {
            passage: "text".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: AnswerKey::Multiple(indices),
        })
    }

    fn fill_blank(answer: &str) -> Question {
        question(QuestionKind::FillBlank {
            correct_answer: answer.to_string(),
        })
    }

    fn sentence_order(order: &[&str]) -> Question {
        question(QuestionKind::SentenceOrder {
            fragments: order.iter().rev().map(|s| s.to_string()).collect(),
            correct_order: order.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn single_choice_requires_exact_index() {
        let q = single_choice(1);
        assert!(is_correct(&q, &json!(1)));
        assert!(!is_correct(&q, &json!(2)));
    }

    #[test]
    fn single_choice_rejects_other_shapes() {
        let q = single_choice(1);
        assert!(!is_correct(&q, &json!([1])));
        assert!(!is_correct(&q, &json!("1")));
        assert!(!is_correct(&q, &json!(1.5)));
        assert!(!is_correct(&q, &json!(-1)));
        assert!(!is_correct(&q, &Value::Null));
    }

    #[test]
    fn multi_choice_is_order_independent() {
        let q = multi_choice(vec![2, 0]);
        assert!(is_correct(&q, &json!([0, 2])));
        assert!(is_correct(&q, &json!([2, 0])));
    }

    #[test]
    fn multi_choice_requires_same_set() {
        let q = multi_choice(vec![0, 2]);
        assert!(!is_correct(&q, &json!([0])));
        assert!(!is_correct(&q, &json!([0, 2, 3])));
        assert!(!is_correct(&q, &json!([0, 1])));
    }

    #[test]
    fn choice_accepts_integral_floats() {
        let single = single_choice(1);
        assert!(is_correct(&single, &json!(1.0)));
        assert!(!is_correct(&single, &json!(2.0)));
        assert!(!is_correct(&single, &json!(-1.0)));

        let multi = multi_choice(vec![2, 0]);
        assert!(is_correct(&multi, &json!([0.0, 2])));
        assert!(!is_correct(&multi, &json!([0.5, 2])));
    }

    #[test]
    fn multi_choice_rejects_non_array() {
        let q = multi_choice(vec![0, 2]);
        assert!(!is_correct(&q, &json!(0)));
        assert!(!is_correct(&q, &json!({"0": true})));
        assert!(!is_correct(&q, &json!(["0", "2"])));
    }

    #[test]
    fn fill_blank_ignores_case_and_surrounding_whitespace() {
        let q = fill_blank("đang");
        assert!(is_correct(&q, &json!(" Đang ")));
        assert!(is_correct(&q, &json!("ĐANG")));
        assert!(!is_correct(&q, &json!("dang")));
        assert!(!is_correct(&q, &json!("đa ng")));
    }

    #[test]
    fn fill_blank_rejects_non_string() {
        let q = fill_blank("4");
        assert!(!is_correct(&q, &json!(4)));
        assert!(!is_correct(&q, &json!(["4"])));
    }

    #[test]
    fn sentence_order_is_order_sensitive() {
        let q = sentence_order(&["I", "am", "here"]);
        assert!(is_correct(&q, &json!(["I", "am", "here"])));
        assert!(!is_correct(&q, &json!(["am", "I", "here"])));
        assert!(!is_correct(&q, &json!(["I", "am"])));
        assert!(!is_correct(&q, &json!(["I", "am", "here", "now"])));
    }

    #[test]
    fn sentence_order_rejects_other_shapes() {
        let q = sentence_order(&["I", "am"]);
        assert!(!is_correct(&q, &json!("I am")));
        assert!(!is_correct(&q, &json!([0, 1])));
    }
}
