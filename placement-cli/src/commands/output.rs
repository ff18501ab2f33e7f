//! Terminal output helpers shared by the commands.
//!
//! Each helper writes to any `Write` so tests can capture the output.

use std::io::{self, Write};

use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use dialoguer::console::style;
use placement_core::{Branch, Outcome, QuestionSpec};

const HEADER_WIDTH: usize = 60;

/// Draws a boxed header with the given title.
pub fn print_header_to<W: Write>(w: &mut W, title: &str) -> io::Result<()> {
    let border = "─".repeat(HEADER_WIDTH);
    writeln!(w, "┌{}┐", border)?;
    writeln!(w, "│ {:<width$} │", title, width = HEADER_WIDTH - 2)?;
    writeln!(w, "└{}┘", border)?;
    writeln!(w)?;
    Ok(())
}

/// Prints a success message with a green checkmark.
pub fn print_success_to<W: Write>(w: &mut W, message: &str) -> io::Result<()> {
    writeln!(
        w,
        "{} {}",
        style("✓").green().bold(),
        style(message).green()
    )
}

/// Prints a warning message with a yellow marker.
pub fn print_warning_to<W: Write>(w: &mut W, message: &str) -> io::Result<()> {
    writeln!(w, "{} {}", style("!").yellow().bold(), style(message).yellow())
}

/// Prints an error message with a red X.
pub fn print_error_to<W: Write>(w: &mut W, message: &str) -> io::Result<()> {
    writeln!(w, "{} {}", style("✗").red().bold(), style(message).red())
}

/// `L2×3, L3×1`
pub fn describe_specs(specs: &[QuestionSpec]) -> String {
    specs
        .iter()
        .map(|spec| format!("L{}×{}", spec.level, spec.count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// What happens when a branch is selected.
pub fn describe_outcome(branch: &Branch) -> String {
    match &branch.outcome {
        Outcome::Terminal { result_level } => format!("place at level {result_level}"),
        Outcome::Continue {
            next_phase,
            next_spec,
        } => format!("{next_phase} phase: {}", describe_specs(next_spec)),
    }
}

/// Branch tree as a table, children indented under their parent.
pub fn branch_table(branches: &[Branch]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Branch").fg(Color::Cyan),
        Cell::new("Phase").fg(Color::Cyan),
        Cell::new("Correct").fg(Color::Cyan),
        Cell::new("Outcome").fg(Color::Cyan),
    ]);

    for root in branches {
        root.walk(0, &mut |branch, depth| {
            let name = if branch.name.is_empty() {
                "(unnamed)"
            } else {
                branch.name.as_str()
            };
            let label = if depth == 0 {
                name.to_string()
            } else {
                format!("{}└ {}", "  ".repeat(depth - 1), name)
            };
            let outcome = if branch.is_terminal() {
                Cell::new(describe_outcome(branch)).fg(Color::Green)
            } else {
                Cell::new(describe_outcome(branch))
            };
            table.add_row(vec![
                Cell::new(label),
                Cell::new(branch.condition.from_phase),
                Cell::new(branch.condition.correct_range),
                outcome,
            ]);
        });
    }

    table
}
