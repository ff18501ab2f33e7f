//! `placement take`: play a placement test in the terminal.
//!
//! The engine runs against in-memory collaborators seeded from the
//! settings file, so balances and levels last for a single run.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use dialoguer::console::style;
use dialoguer::{Confirm, Input, MultiSelect, Select, theme::ColorfulTheme};
use placement_core::memory::{InMemoryConfigStore, InMemoryLedger, InMemoryQuestionBank};
use placement_core::{
    AccountId, PlacementEngine, PlacementResult, QuestionView, SubmitOutcome, SubmittedAnswer,
    Submission,
};
use serde_json::{Value, json};
use tracing::info;

use super::output::{print_header_to, print_success_to};
use super::{load_draft, load_question_bank};
use crate::config::{ConfigLoader, PlacementConfig};

#[derive(Args, Debug)]
pub struct TakeArgs {
    /// Assessment config JSON (defaults to data.config_file)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Question bank JSON (defaults to data.question_bank)
    #[arg(long)]
    pub questions: Option<PathBuf>,

    /// Start without confirming the cost
    #[arg(short, long)]
    pub yes: bool,
}

/// Produces the answer to one question.
pub trait Responder {
    fn answer(&mut self, question: &QuestionView, number: usize, total: usize) -> Result<Value>;
}

pub async fn run(args: TakeArgs) -> Result<()> {
    let settings = ConfigLoader::load()?;
    let config_path = args
        .config
        .unwrap_or_else(|| settings.data.config_file.clone());
    let bank_path = args
        .questions
        .unwrap_or_else(|| settings.data.question_bank.clone());

    let draft = load_draft(&config_path)?;
    let bank = load_question_bank(&bank_path)?;
    info!(
        config = %config_path.display(),
        questions = bank.len(),
        "loaded assessment"
    );

    let engine = local_engine(&settings, bank);
    engine.publish_config(draft).await?;
    let summary = engine.active_summary().await?;

    let mut stdout = io::stdout();
    print_header_to(&mut stdout, &summary.name)?;
    writeln!(
        stdout,
        "{} questions to start, {} coins to play (balance {})",
        summary.total_questions, summary.cost, settings.account.coins
    )?;
    if let Some(minutes) = summary.time_limit_minutes {
        writeln!(stdout, "Suggested time: {minutes} min")?;
    }

    if summary.cost > 0
        && !args.yes
        && !Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Spend {} coins to start?", summary.cost))
            .default(true)
            .interact()?
    {
        writeln!(stdout, "Cancelled.")?;
        return Ok(());
    }

    let mut responder = TerminalResponder::default();
    let result = play(
        &engine,
        &settings.account.account_id(),
        &mut responder,
        &mut stdout,
    )
    .await?;
    print_result_to(&mut stdout, &result)?;
    Ok(())
}

/// Engine over in-memory collaborators holding the configured account.
fn local_engine(settings: &PlacementConfig, bank: InMemoryQuestionBank) -> PlacementEngine {
    let ledger = InMemoryLedger::with_accounts([settings.account.snapshot()]);
    let engine = PlacementEngine::new(
        Arc::new(InMemoryConfigStore::new()),
        Arc::new(bank),
        Arc::new(ledger),
    );
    match settings.session.signer() {
        Some(signer) => engine.with_signer(signer),
        None => engine,
    }
}

/// Run a whole session, phase by phase, until the engine places the account.
pub async fn play<W: Write>(
    engine: &PlacementEngine,
    account: &AccountId,
    responder: &mut dyn Responder,
    w: &mut W,
) -> Result<PlacementResult> {
    let mut batch = engine.start(account).await?;
    loop {
        writeln!(w)?;
        print_header_to(w, &format!("Phase: {}", batch.phase))?;

        let total = batch.questions.len();
        let mut answers = Vec::with_capacity(total);
        for (i, question) in batch.questions.iter().enumerate() {
            answers.push(SubmittedAnswer {
                question_id: question.id.clone(),
                answer: responder.answer(question, i + 1, total)?,
            });
        }

        let submission = Submission {
            config_id: batch.config_id,
            phase: batch.phase,
            answers,
            session_token: batch.session_token.take(),
        };
        match engine.submit(account, submission).await? {
            SubmitOutcome::Continue(next) => {
                writeln!(
                    w,
                    "{} of {} correct. Moving on to the {} phase.",
                    next.correct_count, total, next.questions.phase
                )?;
                batch = next.questions;
            }
            SubmitOutcome::Completed(result) => return Ok(result),
        }
    }
}

/// Render an answer value for display.
fn show_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(show_value).collect::<Vec<_>>().join(" "),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

fn print_result_to<W: Write>(w: &mut W, result: &PlacementResult) -> io::Result<()> {
    writeln!(w)?;
    print_header_to(w, "Results")?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").fg(Color::Cyan),
        Cell::new("Type").fg(Color::Cyan),
        Cell::new("Your answer").fg(Color::Cyan),
        Cell::new("Answer").fg(Color::Cyan),
        Cell::new("").fg(Color::Cyan),
    ]);
    for (i, row) in result.question_results.iter().enumerate() {
        let mark = if row.correct {
            Cell::new("✓").fg(Color::Green)
        } else {
            Cell::new("✗").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&row.question_type),
            Cell::new(show_value(&row.submitted)),
            Cell::new(show_value(&row.correct_answer)),
            mark,
        ]);
    }
    writeln!(w, "{table}")?;

    for (i, row) in result.question_results.iter().enumerate() {
        if !row.correct
            && let Some(explanation) = &row.explanation
        {
            writeln!(w, "  {}. {}", i + 1, style(explanation).dim())?;
        }
    }

    writeln!(w)?;
    writeln!(
        w,
        "Final phase: {} of {} correct",
        result.correct_count, result.total_questions
    )?;
    writeln!(
        w,
        "Rewards:     +{} XP, +{} coins",
        result.rewards.experience, result.rewards.coins
    )?;
    writeln!(w, "Balance:     {} coins", result.account.coins)?;
    writeln!(w)?;
    if result.level > result.result_level {
        print_success_to(
            w,
            &format!(
                "Placed at level {}. You stay at level {}.",
                result.result_level, result.level
            ),
        )
    } else {
        print_success_to(w, &format!("Placed at level {}", result.level))
    }
}

/// Asks questions with dialoguer prompts.
#[derive(Default)]
struct TerminalResponder {
    theme: ColorfulTheme,
}

impl TerminalResponder {
    /// Build the sentence one fragment at a time.
    fn order(&self, prompt: &str, fragments: &[String]) -> Result<Value> {
        println!("{prompt}");
        let mut remaining = fragments.to_vec();
        let mut ordered = Vec::with_capacity(remaining.len());
        while !remaining.is_empty() {
            let pick = Select::with_theme(&self.theme)
                .with_prompt(format!("Word {} ({})", ordered.len() + 1, ordered.join(" ")))
                .items(&remaining)
                .default(0)
                .interact()?;
            ordered.push(remaining.remove(pick));
        }
        Ok(json!(ordered))
    }
}

impl Responder for TerminalResponder {
    fn answer(&mut self, question: &QuestionView, number: usize, total: usize) -> Result<Value> {
        println!();
        println!(
            "{} {}",
            style(format!("Question {number}/{total}")).bold(),
            style(format!("level {}", question.level)).dim()
        );
        if let Some(passage) = &question.passage
            && !passage.is_empty()
        {
            println!("\n{}\n", style(passage).italic());
        }

        if let Some(options) = &question.options {
            if question.multiple_answers {
                let picked = MultiSelect::with_theme(&self.theme)
                    .with_prompt(format!("{} (space to select)", question.prompt))
                    .items(options)
                    .interact()?;
                return Ok(json!(picked));
            }
            let picked = Select::with_theme(&self.theme)
                .with_prompt(&question.prompt)
                .items(options)
                .default(0)
                .interact()?;
            return Ok(json!(picked));
        }

        if let Some(fragments) = &question.fragments {
            return self.order(&question.prompt, fragments);
        }

        let text: String = Input::with_theme(&self.theme)
            .with_prompt(&question.prompt)
            .allow_empty(true)
            .interact_text()?;
        Ok(json!(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placement_core::{Question, QuestionId};
    use std::collections::HashMap;

    const DEMO_ASSESSMENT: &str = include_str!("../../../demos/assessment.json");
    const DEMO_QUESTIONS: &str = include_str!("../../../demos/questions.json");

    /// Answers from the bank's reference answers.
    struct Scripted {
        answers: HashMap<QuestionId, Value>,
        right: bool,
        asked: usize,
    }

    impl Scripted {
        fn new(right: bool) -> Self {
            let questions: Vec<Question> = serde_json::from_str(DEMO_QUESTIONS).unwrap();
            Self {
                answers: questions
                    .iter()
                    .map(|q| (q.id.clone(), q.reference_answer()))
                    .collect(),
                right,
                asked: 0,
            }
        }
    }

    impl Responder for Scripted {
        fn answer(&mut self, question: &QuestionView, _: usize, _: usize) -> Result<Value> {
            self.asked += 1;
            if self.right {
                Ok(self.answers[&question.id].clone())
            } else {
                Ok(json!("no idea"))
            }
        }
    }

    async fn demo_engine(settings: &PlacementConfig) -> PlacementEngine {
        let engine = local_engine(
            settings,
            InMemoryQuestionBank::from_json(DEMO_QUESTIONS).unwrap(),
        );
        engine
            .publish_config(serde_json::from_str(DEMO_ASSESSMENT).unwrap())
            .await
            .unwrap();
        engine
    }

    #[tokio::test]
    async fn perfect_run_reaches_top_branch() {
        let settings = PlacementConfig::default();
        let engine = demo_engine(&settings).await;
        let mut responder = Scripted::new(true);
        let mut output = Vec::new();

        let result = play(
            &engine,
            &settings.account.account_id(),
            &mut responder,
            &mut output,
        )
        .await
        .unwrap();

        // 5 initial questions, then 3 in the final phase.
        assert_eq!(responder.asked, 8);
        assert_eq!(result.result_level, 4);
        assert_eq!(result.level, 4);
        assert_eq!(result.correct_count, 3);
        assert_eq!(result.account.coins, settings.account.coins - 100 + 60);

        let log = String::from_utf8(output).unwrap();
        assert!(log.contains("Phase: initial"));
        assert!(log.contains("Moving on to the final phase"));
    }

    #[tokio::test]
    async fn all_wrong_places_beginner() {
        let settings = PlacementConfig::default();
        let engine = demo_engine(&settings).await;
        let mut responder = Scripted::new(false);

        let result = play(
            &engine,
            &settings.account.account_id(),
            &mut responder,
            &mut Vec::new(),
        )
        .await
        .unwrap();

        assert_eq!(responder.asked, 5);
        assert_eq!(result.result_level, 1);
        assert_eq!(result.rewards.experience, 0);
        assert!(result.question_results.iter().all(|r| !r.correct));
    }

    #[tokio::test]
    async fn signed_sessions_play_through() {
        let mut settings = PlacementConfig::default();
        settings.session.sign_tokens = true;
        let engine = demo_engine(&settings).await;

        let result = play(
            &engine,
            &settings.account.account_id(),
            &mut Scripted::new(true),
            &mut Vec::new(),
        )
        .await
        .unwrap();

        assert_eq!(result.result_level, 4);
    }

    #[tokio::test]
    async fn broke_account_cannot_start() {
        let mut settings = PlacementConfig::default();
        settings.account.coins = 10;
        let engine = demo_engine(&settings).await;

        let err = play(
            &engine,
            &settings.account.account_id(),
            &mut Scripted::new(true),
            &mut Vec::new(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("insufficient funds"));
    }

    #[tokio::test]
    async fn result_report_shows_answers_and_level() {
        let settings = PlacementConfig::default();
        let engine = demo_engine(&settings).await;
        let result = play(
            &engine,
            &settings.account.account_id(),
            &mut Scripted::new(false),
            &mut Vec::new(),
        )
        .await
        .unwrap();
        let mut output = Vec::new();

        print_result_to(&mut output, &result).unwrap();
        let report = String::from_utf8(output).unwrap();

        assert!(report.contains("no idea"));
        assert!(report.contains("✗"));
        assert!(report.contains("Final phase: 0 of 5 correct"));
        assert!(report.contains("Placed at level 1"));
    }

    #[test]
    fn show_value_flattens_arrays() {
        assert_eq!(show_value(&json!(["Tên", "tôi", "là", "Lan"])), "Tên tôi là Lan");
        assert_eq!(show_value(&json!(2)), "2");
        assert_eq!(show_value(&json!("đang")), "đang");
    }
}
