//! Loading assessment configs and question banks from JSON files.

use std::fs;
use std::io::Write;

use tempfile::NamedTempFile;

use placement_core::memory::InMemoryQuestionBank;
use placement_core::{AssessmentConfig, AssessmentDraft, Phase, QuestionKind, QuestionSource};

const DEMO_ASSESSMENT: &str = include_str!("../../demos/assessment.json");
const DEMO_QUESTIONS: &str = include_str!("../../demos/questions.json");

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn parse_draft(json: &str) -> Result<AssessmentDraft, serde_json::Error> {
    serde_json::from_str(json)
}

#[test]
fn demo_assessment_parses() {
    let draft = parse_draft(DEMO_ASSESSMENT).unwrap();

    assert_eq!(draft.cost, 100);
    assert_eq!(draft.time_limit_minutes, Some(20));
    assert_eq!(draft.branches.len(), 3);
    assert_eq!(draft.branches[1].sub_branches.len(), 2);
    assert_eq!(draft.branches[1].next_phase(), Some(Phase::Followup));
    assert_eq!(draft.branches[0].result_level(), Some(1));

    let config = draft.into_config();
    assert_eq!(config.total_initial_questions(), 5);
    assert_eq!(config.branch_count(), 7);
}

#[tokio::test]
async fn demo_bank_covers_demo_assessment() {
    let bank = InMemoryQuestionBank::from_json(DEMO_QUESTIONS).unwrap();
    let draft = parse_draft(DEMO_ASSESSMENT).unwrap();

    for spec in &draft.initial_spec {
        let drawn = bank.fetch(spec.level, spec.count).await.unwrap();
        assert_eq!(drawn.len(), spec.count as usize, "level {}", spec.level);
    }
    let mut specs = Vec::new();
    for branch in &draft.branches {
        branch.walk(0, &mut |b, _| {
            if let placement_core::Outcome::Continue { next_spec, .. } = &b.outcome {
                specs.extend(next_spec.iter().copied());
            }
        });
    }
    for spec in specs {
        let drawn = bank.fetch(spec.level, spec.count).await.unwrap();
        assert_eq!(drawn.len(), spec.count as usize, "level {}", spec.level);
    }
}

#[test]
fn demo_bank_has_every_question_type() {
    let questions: Vec<placement_core::Question> = serde_json::from_str(DEMO_QUESTIONS).unwrap();

    let has = |name: &str| questions.iter().any(|q| q.kind.type_name() == name);
    assert!(has("multiple-choice"));
    assert!(has("reading-comprehension"));
    assert!(has("fill-blank"));
    assert!(has("sentence-order"));
    assert!(questions.iter().any(|q| matches!(
        &q.kind,
        QuestionKind::ReadingComprehension { passage, .. } if !passage.is_empty()
    )));
}

#[test]
fn draft_round_trips_through_file() {
    let draft = parse_draft(DEMO_ASSESSMENT).unwrap();
    let file = write_temp(&serde_json::to_string_pretty(&draft).unwrap());

    let reread = parse_draft(&fs::read_to_string(file.path()).unwrap()).unwrap();
    assert_eq!(reread, draft);
}

#[test]
fn stored_config_round_trips_through_file() {
    let config = parse_draft(DEMO_ASSESSMENT).unwrap().into_config();
    let file = write_temp(&serde_json::to_string(&config).unwrap());

    let reread: AssessmentConfig =
        serde_json::from_str(&fs::read_to_string(file.path()).unwrap()).unwrap();
    assert_eq!(reread, config);
}

#[test]
fn invalid_file_reports_branch_path() {
    let file = write_temp(
        r#"{
            "name": "broken",
            "cost": 0,
            "initialSpec": [{ "level": 1, "count": 2 }],
            "branches": [
                {
                    "condition": { "fromPhase": "initial", "correctRange": [0, 2] },
                    "nextPhase": "followup",
                    "nextSpec": [{ "level": 1, "count": 1 }],
                    "subBranches": [
                        {
                            "condition": { "fromPhase": "followup", "correctRange": [3, 1] },
                            "resultLevel": 2
                        }
                    ]
                }
            ]
        }"#,
    );

    let err = parse_draft(&fs::read_to_string(file.path()).unwrap()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("branches[0].subBranches[0]"), "{message}");
    assert!(message.contains("min greater than max"), "{message}");
}

#[test]
fn draft_without_initial_spec_entries_is_rejected() {
    let err = parse_draft(r#"{ "name": "empty", "cost": 0, "initialSpec": [], "branches": [] }"#)
        .unwrap_err();
    assert!(err.to_string().contains("initialSpec"));
}
