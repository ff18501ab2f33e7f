//! `placement match`: dry-run the branch matcher.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use placement_core::{Branch, Phase, describe_path, find_match_path};

use super::load_draft;
use super::output::{describe_outcome, print_error_to, print_success_to};

#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Assessment config JSON file
    pub file: PathBuf,

    /// Phase the result was submitted for (initial, followup, final)
    #[arg(long)]
    pub phase: Phase,

    /// Number of correct answers in the batch
    #[arg(long)]
    pub correct: u32,
}

pub fn run(args: MatchArgs) -> Result<()> {
    let draft = load_draft(&args.file)?;
    let matched = report_to(
        &mut io::stdout().lock(),
        &draft.branches,
        args.phase,
        args.correct,
    )?;
    if !matched {
        bail!(
            "no matching branch for phase {} with {} correct",
            args.phase,
            args.correct
        );
    }
    Ok(())
}

/// Print the branch a result selects. Returns whether one matched.
fn report_to<W: Write>(
    w: &mut W,
    branches: &[Branch],
    phase: Phase,
    correct: u32,
) -> io::Result<bool> {
    let Some((path, branch)) = find_match_path(branches, phase, correct) else {
        print_error_to(
            w,
            &format!("No branch covers {correct} correct in the {phase} phase"),
        )?;
        return Ok(false);
    };

    print_success_to(w, &format!("Matched \"{}\"", branch.name))?;
    writeln!(w, "  Path:      {}", describe_path(&path))?;
    writeln!(w, "  Condition: {} {}", branch.condition.from_phase, branch.condition.correct_range)?;
    writeln!(w, "  Outcome:   {}", describe_outcome(branch))?;
    if !branch.sub_branches.is_empty() {
        writeln!(w, "  Children:  {}", branch.sub_branches.len())?;
    }
    Ok(true)
}
