//! migsweep - remove deprecated Alembic migrations from GitHub repositories
//!
//! The binary parses arguments, sets up logging and configuration, checks the
//! access token and then hands the candidate repositories to the ops crate,
//! rendering its events while the run is in progress.

mod cli;
mod display;
mod error;
mod events;
mod logging;
mod setup;

use crate::cli::Cli;
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use clap::{CommandFactory, Parser};
use migsweep_config::Config;
use migsweep_events::EventReceiver;
use migsweep_ops::{OpsContextBuilder, OpsCtx};
use migsweep_types::{ColorChoice, OutputFormat, RepoId, RunReport};
use std::process;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    logging::init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting migsweep v{}", env!("CARGO_PKG_VERSION"));

    // File (or defaults), then environment, then CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli);

    let token = match Config::resolve_token(cli.token.as_deref()) {
        Ok(token) => token,
        Err(e) => {
            if !cli.global.json {
                eprintln!("{}", Cli::command().render_usage());
            }
            return Err(e.into());
        }
    };

    let session = setup::authenticate(&config, &token).await?;

    let json_output = config.general.default_output == OutputFormat::Json;
    let color = config.general.color;
    let renderer = OutputRenderer::new(json_output, color);
    let colors_enabled = match color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => console::Term::stderr().features().colors_supported(),
    };
    let mut event_handler = EventHandler::new(colors_enabled, json_output);

    let (event_sender, event_receiver) = migsweep_events::channel();
    let ctx = OpsContextBuilder::new()
        .with_host(session.host)
        .with_event_sender(event_sender)
        .with_config(config)
        .build()?;
    info!(login = %session.login, branch = %ctx.cleanup().working_branch, "context ready");

    let report = execute_with_events(ctx, cli.repos, event_receiver, &mut event_handler).await?;

    renderer.render_report(&report)?;
    info!(run_id = %report.run_id, "Run finished");
    Ok(())
}

/// Resolve the candidates and run the sweep while rendering events
async fn execute_with_events(
    ctx: OpsCtx,
    explicit: Vec<RepoId>,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<RunReport, CliError> {
    let mut sweep = Box::pin(async move {
        let candidates = migsweep_ops::resolve_candidates(&ctx, &explicit).await?;
        Ok::<_, CliError>(migsweep_ops::run(&ctx, &candidates).await)
    });

    loop {
        select! {
            result = &mut sweep => {
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                if let Some(event) = event {
                    event_handler.handle_event(event);
                }
            }
        }
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, cli: &Cli) {
    if let Some(color) = cli.global.color {
        config.general.color = color;
    }
    if cli.global.json {
        config.general.default_output = OutputFormat::Json;
    }
    // An explicit organization replaces the configured candidate list
    if let Some(org) = &cli.org {
        config.candidates.organization = Some(org.clone());
        config.candidates.repositories.clear();
    }
}
