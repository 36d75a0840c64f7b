//! Event handling and progress display

use crate::logging::log_event_with_tracing;
use console::{Style, Term};
use migsweep_events::{AppEvent, GeneralEvent, SweepEvent};
use migsweep_types::OutcomeKind;

/// Prints one line per finished repository and forwards every event to tracing
pub struct EventHandler {
    term: Term,
    colors_enabled: bool,
    /// Suppress console lines, e.g. in JSON mode
    quiet: bool,
}

impl EventHandler {
    /// Create new event handler
    pub fn new(colors_enabled: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            colors_enabled,
            quiet,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, event: AppEvent) {
        log_event_with_tracing(&event);
        if self.quiet {
            return;
        }

        match event {
            AppEvent::Sweep(SweepEvent::RunStarted { candidates }) => {
                self.show_status(&format!("Checking {candidates} repositories"));
            }
            AppEvent::Sweep(SweepEvent::RepositoryFinished {
                repository,
                outcome,
                detail,
            }) => {
                let line = match detail {
                    Some(detail) => format!("{repository}: {outcome} ({detail})"),
                    None => format!("{repository}: {outcome}"),
                };
                let style = match outcome {
                    OutcomeKind::CleanedAndProposed => Style::new().green(),
                    OutcomeKind::CleanedNoOp => Style::new().yellow(),
                    OutcomeKind::Error => Style::new().red(),
                    OutcomeKind::SkippedArchived | OutcomeKind::NotRelevant => Style::new().dim(),
                };
                self.show_styled(&line, &style);
            }
            AppEvent::Sweep(SweepEvent::DeletionFailed {
                fork,
                path,
                failure,
            }) => {
                self.show_styled(
                    &format!("  could not delete {fork}:{path}: {}", failure.message),
                    &Style::new().yellow(),
                );
            }
            AppEvent::General(GeneralEvent::Warning { message, .. }) => {
                self.show_styled(&format!("warning: {message}"), &Style::new().yellow());
            }
            // Everything else only goes to the log
            _ => {}
        }
    }

    fn show_styled(&self, message: &str, style: &Style) {
        if self.colors_enabled {
            self.show_status(&style.apply_to(message).to_string());
        } else {
            self.show_status(message);
        }
    }

    /// Show status message
    fn show_status(&self, message: &str) {
        self.term.write_line(message).unwrap_or(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migsweep_types::{NoOpReason, RepoId};

    #[test]
    fn test_event_handler_accepts_all_kinds() {
        let mut handler = EventHandler::new(false, true);
        handler.handle_event(AppEvent::Sweep(SweepEvent::RunStarted { candidates: 2 }));
        handler.handle_event(AppEvent::Sweep(SweepEvent::RepositoryFinished {
            repository: RepoId::new("clld", "afbo"),
            outcome: OutcomeKind::CleanedNoOp,
            detail: Some(NoOpReason::NothingToDelete.to_string()),
        }));
        handler.handle_event(AppEvent::General(GeneralEvent::warning("careful")));
    }
}
