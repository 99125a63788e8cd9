//! Generate command implementation.

use super::session::map_manager;
use super::{CliError, OutputFormat};
use kingsgrid::map::render_ascii;
use kingsgrid::mapgen::PlayerSlot;
use kingsgrid::{EngineConfig, MapSource};
use std::collections::BTreeSet;

/// Execute the generate command.
///
/// # Errors
///
/// Returns an error if the map cannot be resolved or serialized.
pub(crate) fn execute(
    config: &EngineConfig,
    map: Option<String>,
    players: usize,
    viewer: Option<u8>,
    format: OutputFormat,
    color: bool,
) -> Result<(), CliError> {
    if !(1..=8).contains(&players) {
        return Err(CliError::new(format!("players must be 1-8, got {players}")));
    }
    let map_id = map.unwrap_or_else(|| config.map.clone());
    let manager = map_manager(config)?;
    let mut map = manager.resolve(&map_id, &PlayerSlot::active_seats(players))?;

    if let Some(owner) = viewer {
        let owners = BTreeSet::from([owner]);
        let sight = map.sight(&owners);
        map.fog(&owners, &sight)?;
    }

    match format {
        OutputFormat::Text => {
            let info = map.info();
            println!("{} ({}x{})", info.id, map.width(), map.height());
            print!("{}", render_ascii(&map, color));
        }
        OutputFormat::Json => {
            println!("{}", map.to_json()?);
        }
    }

    Ok(())
}
