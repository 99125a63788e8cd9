//! Validate command implementation.
//!
//! Generates a batch of seeded maps in parallel and reports how many pass
//! the reachability check.

// Throughput is reported as a float
#![allow(clippy::cast_precision_loss)]

use super::output::{format_validate_text, JsonValidateResult, ValidateStats};
use super::{CliError, OutputFormat};
use indicatif::{ProgressBar, ProgressStyle};
use kingsgrid::mapgen::{check_reachability, PerlinGenerator, PlayerSlot};
use kingsgrid::{
    BlockRegistry, EngineConfig, GenerateError, GeneratorConfig, GeneratorRegistry, Size,
};
use rayon::prelude::*;
use std::time::Instant;

/// Options for the validate command.
#[derive(Debug, Clone)]
pub(crate) struct ValidateArgs {
    pub(crate) size: String,
    pub(crate) count: u64,
    pub(crate) seed: Option<u64>,
    pub(crate) players: usize,
    pub(crate) mountains: Option<f64>,
    pub(crate) castles: Option<f64>,
    pub(crate) threads: Option<usize>,
    pub(crate) format: OutputFormat,
    pub(crate) progress: bool,
}

fn parse_size(size: &str) -> Result<Size, CliError> {
    let bad = || CliError::new(format!("size must be <W>x<H>, got `{size}`"));
    let (w, h) = size.split_once('x').ok_or_else(bad)?;
    let width = w.parse::<u16>().map_err(|_| bad())?;
    let height = h.parse::<u16>().map_err(|_| bad())?;
    Ok(Size::new(width, height))
}

/// Execute the validate command.
///
/// # Errors
///
/// Returns an error for malformed arguments.
pub(crate) fn execute(config: &EngineConfig, args: &ValidateArgs) -> Result<(), CliError> {
    let size = parse_size(&args.size)?;
    let blocks = BlockRegistry::with_defaults();
    let generator = GeneratorRegistry::with_defaults(&blocks)?.get(PerlinGenerator::NAME)?;
    let slots = PlayerSlot::active_seats(args.players);

    let mut gen_config = config.generator;
    if let Some(m) = args.mountains {
        gen_config.mountain_density = m;
    }
    if let Some(c) = args.castles {
        gen_config.castle_density = c;
    }

    // Set thread pool size if specified
    if let Some(num_threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let base_seed = args.seed.unwrap_or(gen_config.seed);

    let pb = if args.progress {
        let pb = ProgressBar::new(args.count);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} maps ({per_sec})")
                .map_err(|e| CliError::new(format!("invalid progress template: {e}")))?
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();

    // Each worker folds into its own stats, merged at the end
    let stats = (0..args.count)
        .into_par_iter()
        .fold(ValidateStats::default, |mut local, i| {
            let config = GeneratorConfig {
                seed: base_seed.wrapping_add(i),
                ..gen_config
            };
            match generator.generate(size, &slots, &config) {
                Ok(map) => local.add_report(&check_reachability(&map)),
                Err(GenerateError::Unreachable { .. }) => local.add_exhausted(),
                Err(e) => local.add_failure(e.to_string()),
            }
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            local
        })
        .reduce(ValidateStats::default, |mut a, b| {
            a.merge(&b);
            a
        });

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();
    let maps_per_sec = if duration.as_secs_f64() > 0.0 {
        stats.total() as f64 / duration.as_secs_f64()
    } else {
        0.0
    };

    let result = JsonValidateResult::from_stats(&stats, size.width, size.height, args.players);
    match args.format {
        OutputFormat::Text => {
            println!();
            print!("{}", format_validate_text(&result));
            println!();
            println!("Duration: {:.2}s ({maps_per_sec:.0} maps/sec)", duration.as_secs_f64());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("30x20").unwrap(), Size::new(30, 20));
        assert!(parse_size("30").is_err());
        assert!(parse_size("ax20").is_err());
    }
}
