//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, ContentArrangement, Table};
use console::{Style, Term};
use migsweep_types::{ColorChoice, OutcomeKind, RepoOutcome, RunReport};
use std::io;

/// Output renderer for CLI results
#[derive(Clone)]
pub struct OutputRenderer {
    /// Use JSON output format
    json_output: bool,
    /// Color configuration
    color_choice: ColorChoice,
    /// Terminal instance
    term: Term,
}

impl OutputRenderer {
    /// Create new output renderer
    pub fn new(json_output: bool, color_choice: ColorChoice) -> Self {
        Self {
            json_output,
            color_choice,
            term: Term::stdout(),
        }
    }

    /// Render the final run report
    pub fn render_report(&self, report: &RunReport) -> io::Result<()> {
        if self.json_output {
            self.render_json(report)
        } else {
            self.render_table(report)
        }
    }

    fn render_json(&self, report: &RunReport) -> io::Result<()> {
        let cleaned: Vec<_> = report
            .cleaned()
            .into_iter()
            .map(|(repo, pr)| serde_json::json!({ "repository": repo, "pull_request": pr.url }))
            .collect();
        let value = serde_json::json!({
            "run_id": report.run_id,
            "started_at": report.started_at,
            "finished_at": report.finished_at,
            "cleaned_count": cleaned.len(),
            "cleaned": cleaned,
            "repositories": report.entries,
        });
        let json = serde_json::to_string_pretty(&value).map_err(io::Error::other)?;
        self.term.write_line(&json)
    }

    fn render_table(&self, report: &RunReport) -> io::Result<()> {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Repository").add_attribute(Attribute::Bold),
                Cell::new("Outcome").add_attribute(Attribute::Bold),
                Cell::new("Details").add_attribute(Attribute::Bold),
            ]);

        for entry in &report.entries {
            table.add_row(vec![
                Cell::new(entry.repository.to_string()),
                self.outcome_cell(entry.outcome.kind()),
                Cell::new(outcome_details(&entry.outcome)),
            ]);
        }

        self.term.write_line(&table.to_string())?;

        let cleaned = report.cleaned();
        self.term.write_line("")?;
        self.term.write_line(&format!(
            "{} {}",
            self.bold("Cleaned repositories:"),
            cleaned.len()
        ))?;
        for (repository, pull_request) in cleaned {
            self.term
                .write_line(&format!("  {repository}: {}", pull_request.url))?;
        }

        let errors = report.count(OutcomeKind::Error);
        if errors > 0 {
            self.term.write_line(&format!(
                "{} {errors} repositories could not be processed",
                self.paint("!", Style::new().red().bold())
            ))?;
        }
        Ok(())
    }

    fn outcome_cell(&self, kind: OutcomeKind) -> Cell {
        let cell = Cell::new(kind.to_string());
        if !self.supports_color() {
            return cell;
        }
        match kind {
            OutcomeKind::CleanedAndProposed => cell.fg(Color::Green),
            OutcomeKind::CleanedNoOp => cell.fg(Color::Yellow),
            OutcomeKind::Error => cell.fg(Color::Red),
            OutcomeKind::SkippedArchived | OutcomeKind::NotRelevant => cell.fg(Color::DarkGrey),
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(text, Style::new().bold())
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.supports_color() {
            style.apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Check if color output is supported
    fn supports_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.term.features().colors_supported(),
        }
    }
}

/// Short description of an outcome for the report table
pub fn outcome_details(outcome: &RepoOutcome) -> String {
    match outcome {
        RepoOutcome::SkippedArchived | RepoOutcome::NotRelevant => String::new(),
        RepoOutcome::CleanedAndProposed {
            pull_request,
            removed,
            failures,
        } => {
            let mut text = format!("{} ({} removed", pull_request.url, removed.len());
            if !failures.is_empty() {
                text.push_str(&format!(", {} failed", failures.len()));
            }
            text.push(')');
            text
        }
        RepoOutcome::CleanedNoOp { reason, failures } => {
            if failures.is_empty() {
                reason.to_string()
            } else {
                format!("{reason} ({} failed)", failures.len())
            }
        }
        RepoOutcome::Error { message } => message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migsweep_types::{DeletionReason, DeletionRecord, NoOpReason, PullRequestRef};

    #[test]
    fn test_outcome_details() {
        let proposed = RepoOutcome::CleanedAndProposed {
            pull_request: PullRequestRef {
                number: 3,
                url: "https://github.com/clld/afbo/pull/3".into(),
            },
            removed: vec![DeletionRecord::new(
                "alembic.ini",
                DeletionReason::ConfigurationRemoval,
            )],
            failures: Vec::new(),
        };
        assert_eq!(
            outcome_details(&proposed),
            "https://github.com/clld/afbo/pull/3 (1 removed)"
        );

        let noop = RepoOutcome::CleanedNoOp {
            reason: NoOpReason::NothingToDelete,
            failures: Vec::new(),
        };
        assert_eq!(outcome_details(&noop), "nothing left to delete");
        assert!(outcome_details(&RepoOutcome::NotRelevant).is_empty());
    }

    #[test]
    fn test_plain_paint_without_color() {
        let renderer = OutputRenderer::new(false, ColorChoice::Never);
        assert_eq!(renderer.bold("x"), "x");
    }
}
