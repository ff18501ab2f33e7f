//! `placement validate`: check an assessment config and show its tree.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use placement_core::{
    AssessmentDraft, MAX_BATCH_QUESTIONS, Outcome, Phase, QuestionSpec, batch_size, find_match,
};

use super::load_draft;
use super::output::{
    branch_table, describe_specs, print_header_to, print_success_to, print_warning_to,
};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Assessment config JSON file
    pub file: PathBuf,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let draft = load_draft(&args.file)?;
    report_to(&mut io::stdout().lock(), &draft)?;
    Ok(())
}

/// Scores a phase can produce that no branch covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageGap {
    pub phase: Phase,
    pub questions: u32,
    pub uncovered: Vec<u32>,
}

fn bounded_batch(specs: &[QuestionSpec]) -> u32 {
    batch_size(specs).min(MAX_BATCH_QUESTIONS)
}

/// Find results that would end a session with "no matching branch".
///
/// Every phase batch size the config can produce is checked for each
/// score from zero to the batch size. Batches beyond the per-phase limit
/// are checked up to that limit.
pub fn coverage_gaps(draft: &AssessmentDraft) -> Vec<CoverageGap> {
    let mut batches = vec![(Phase::Initial, bounded_batch(&draft.initial_spec))];
    for root in &draft.branches {
        root.walk(0, &mut |branch, _| {
            if let Outcome::Continue {
                next_phase,
                next_spec,
            } = &branch.outcome
            {
                let batch = (*next_phase, bounded_batch(next_spec));
                if !batches.contains(&batch) {
                    batches.push(batch);
                }
            }
        });
    }

    batches
        .into_iter()
        .filter_map(|(phase, questions)| {
            let uncovered: Vec<u32> = (0..=questions)
                .filter(|&correct| find_match(&draft.branches, phase, correct).is_none())
                .collect();
            (!uncovered.is_empty()).then_some(CoverageGap {
                phase,
                questions,
                uncovered,
            })
        })
        .collect()
}

fn report_to<W: Write>(w: &mut W, draft: &AssessmentDraft) -> io::Result<()> {
    let title = if draft.name.is_empty() {
        "Assessment"
    } else {
        draft.name.as_str()
    };
    print_header_to(w, title)?;

    writeln!(w, "Cost:           {} coins", draft.cost)?;
    match draft.time_limit_minutes {
        Some(minutes) => writeln!(w, "Time limit:     {minutes} min")?,
        None => writeln!(w, "Time limit:     none")?,
    }
    writeln!(w, "Initial phase:  {}", describe_specs(&draft.initial_spec))?;
    writeln!(w)?;

    if draft.branches.is_empty() {
        print_warning_to(w, "No branches: every submission will fail to match")?;
    } else {
        writeln!(w, "{}", branch_table(&draft.branches))?;
    }
    writeln!(w)?;

    let gaps = coverage_gaps(draft);
    for gap in &gaps {
        let scores = gap
            .uncovered
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        print_warning_to(
            w,
            &format!(
                "{} phase ({} questions): no branch for {} correct",
                gap.phase, gap.questions, scores
            ),
        )?;
    }

    print_success_to(w, "Config is valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use placement_core::Branch;

    fn draft(branches: Vec<Branch>) -> AssessmentDraft {
        AssessmentDraft {
            name: "Check".to_string(),
            cost: 100,
            time_limit_minutes: Some(15),
            initial_spec: vec![QuestionSpec::new(1, 2), QuestionSpec::new(2, 2)],
            branches,
        }
    }

    #[test]
    fn full_coverage_has_no_gaps() {
        let draft = draft(vec![
            Branch::terminal("low", Phase::Initial, (0, 1), 1).unwrap(),
            Branch::terminal("high", Phase::Initial, (2, 4), 2).unwrap(),
        ]);

        assert!(coverage_gaps(&draft).is_empty());
    }

    #[test]
    fn gaps_are_reported_per_phase() {
        let draft = draft(vec![
            Branch::terminal("low", Phase::Initial, (0, 1), 1).unwrap(),
            Branch::continuing(
                "high",
                Phase::Initial,
                (3, 4),
                Phase::Followup,
                vec![QuestionSpec::new(3, 2)],
            )
            .unwrap()
            .with_sub_branches(vec![
                Branch::terminal("followup low", Phase::Followup, (0, 0), 2).unwrap(),
            ]),
        ]);

        let gaps = coverage_gaps(&draft);

        assert_eq!(
            gaps,
            vec![
                CoverageGap {
                    phase: Phase::Initial,
                    questions: 4,
                    uncovered: vec![2],
                },
                CoverageGap {
                    phase: Phase::Followup,
                    questions: 2,
                    uncovered: vec![1, 2],
                },
            ]
        );
    }

    #[test]
    fn oversized_batch_is_checked_up_to_the_phase_limit() {
        let mut draft = draft(vec![
            Branch::terminal("all", Phase::Initial, (0, MAX_BATCH_QUESTIONS - 1), 1).unwrap(),
        ]);
        draft.initial_spec = vec![QuestionSpec::new(1, u32::MAX), QuestionSpec::new(2, 1)];

        let gaps = coverage_gaps(&draft);

        assert_eq!(
            gaps,
            vec![CoverageGap {
                phase: Phase::Initial,
                questions: MAX_BATCH_QUESTIONS,
                uncovered: vec![MAX_BATCH_QUESTIONS],
            }]
        );
    }

    #[test]
    fn report_lists_summary_tree_and_gaps() {
        let draft = draft(vec![
            Branch::terminal("low", Phase::Initial, (0, 1), 1).unwrap(),
        ]);
        let mut output = Vec::new();

        report_to(&mut output, &draft).unwrap();
        let result = String::from_utf8(output).unwrap();

        assert!(result.contains("Check"));
        assert!(result.contains("100 coins"));
        assert!(result.contains("15 min"));
        assert!(result.contains("L1×2, L2×2"));
        assert!(result.contains("low"));
        assert!(result.contains("no branch for 2, 3, 4 correct"));
        assert!(result.contains("Config is valid"));
    }
}
