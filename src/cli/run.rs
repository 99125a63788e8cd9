//! Run command implementation.

use super::output::{format_run_text, JsonRunResult};
use super::session::{GameArgs, Session, IDLE_TIMEOUT};
use super::{CliError, OutputFormat};
use kingsgrid::bot::Bot;
use kingsgrid::{BroadcastEvent, EngineConfig};
use std::collections::BTreeMap;
use tracing::warn;

/// How often a turn summary is printed.
const REPORT_EVERY: u32 = 50;

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the game cannot be set up or the runner dies.
pub(crate) fn execute(
    config: &EngineConfig,
    args: &GameArgs,
    format: OutputFormat,
    quiet: bool,
) -> Result<(), CliError> {
    let mut session = Session::start(config, args)?;
    let verbose = !quiet && format == OutputFormat::Text;
    if verbose {
        println!(
            "Running {} bots in `{}` on {} (seed {})",
            session.bots().len(),
            session.mode().name,
            session.map_id(),
            session.seed()
        );
    }

    // Each bot only sees its own troops exactly, which is all a summary needs.
    let mut troops: BTreeMap<String, u64> = BTreeMap::new();

    loop {
        let Some(event) = session.next_event(IDLE_TIMEOUT) else {
            warn!("cli.run.idle_timeout");
            break;
        };
        match &event {
            BroadcastEvent::MapUpdate { viewer, map, .. } => {
                if let Some(owner) = session
                    .bots()
                    .iter()
                    .find(|b| b.player_id() == viewer)
                    .and_then(Bot::owner)
                {
                    troops.insert(viewer.clone(), map.troops(owner));
                }
            }
            BroadcastEvent::TurnAdvanced { turn_number } if verbose && turn_number % REPORT_EVERY == 0 => {
                let line: Vec<String> = troops.iter().map(|(id, n)| format!("{id}={n}")).collect();
                println!("Turn {turn_number:>5}: {}", line.join(" "));
            }
            BroadcastEvent::GameEnded { .. } => break,
            BroadcastEvent::StartFailed { message } => {
                let message = format!("game could not start: {message}");
                session.finish()?;
                return Err(CliError::new(message));
            }
            _ => {}
        }
    }

    let seed = session.seed();
    let map_id = session.map_id().to_string();
    let core = session.finish()?;
    let result = JsonRunResult::from_core(&core, seed, &map_id);

    match format {
        OutputFormat::Text => {
            if verbose {
                println!();
            }
            print!("{}", format_run_text(&result));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
