#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that generates and displays Gated Caves levels.

mod layout_transfer;

use std::{fs, io, path::PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use gated_caves_core::Position;
use gated_caves_rendering::{
    item_glyph, Presentation, RenderingBackend, TextBackend, TextFrame, PLAYER_GLYPH,
};
use gated_caves_system_bootstrap::{
    GenerationConfig, GenerationError, Level, LevelPipeline, Progress,
};
use gated_caves_world::{query, World};
use log::{info, warn};

use crate::layout_transfer::LevelLayout;

/// Generates inventory-gated cave levels.
#[derive(Debug, Parser)]
#[command(name = "gated-caves", version)]
struct Cli {
    /// Increases log verbosity (-v for info, -vv for debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Generates a level and prints it.
    Generate(GenerateArgs),
    /// Decodes a layout string and prints the level it holds.
    Show {
        /// Layout string produced by `generate --export`.
        layout: String,
    },
}

#[derive(Debug, Args)]
struct GenerateArgs {
    /// Seed for the run. A random seed is drawn when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// TOML file holding generation settings.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides the side length of the square map.
    #[arg(long)]
    size: Option<u32>,
    /// Overrides the chance that a cell starts out as a wall.
    #[arg(long)]
    fill: Option<f64>,
    /// Overrides the number of cave smoothing steps.
    #[arg(long)]
    cave_steps: Option<u32>,
    /// Overrides the chance that a floor cell starts out as water.
    #[arg(long)]
    water: Option<f64>,
    /// Overrides the number of water clustering steps.
    #[arg(long)]
    water_steps: Option<u32>,
    /// Overrides the chance that a wall becomes a mountain.
    #[arg(long)]
    mountain_share: Option<f64>,
    /// Overrides the number of cells a spawn point must reach.
    #[arg(long)]
    min_reachable: Option<u32>,
    /// Overrides the number of cells sampled per placement query.
    #[arg(long)]
    max_tries: Option<u32>,
    /// Prints the cave after every smoothing step.
    #[arg(long)]
    show_steps: bool,
    /// Retries with the following seeds when no spawn point is found.
    #[arg(long, default_value_t = 0)]
    retries: u32,
    /// Prints a layout string that `show` can decode.
    #[arg(long)]
    export: bool,
}

impl GenerateArgs {
    fn load_config(&self) -> Result<GenerationConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file {}", path.display()))?;
                toml::from_str(&contents)
                    .with_context(|| format!("failed to parse config file {}", path.display()))?
            }
            None => GenerationConfig::default(),
        };

        if let Some(size) = self.size {
            config.grid_size = size;
        }
        if let Some(fill) = self.fill {
            config.fill_probability = fill;
        }
        if let Some(steps) = self.cave_steps {
            config.cave_steps = steps;
        }
        if let Some(water) = self.water {
            config.water_seed_probability = water;
        }
        if let Some(steps) = self.water_steps {
            config.water_steps = steps;
        }
        if let Some(share) = self.mountain_share {
            config.mountain_share = share;
        }
        if let Some(min_reachable) = self.min_reachable {
            config.min_reachable_tiles = min_reachable;
        }
        if let Some(max_tries) = self.max_tries {
            config.max_placement_tries = max_tries;
        }

        config.validate().context("invalid generation settings")?;
        Ok(config)
    }
}

/// Entry point for the Gated Caves command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut backend = TextBackend::new(io::stdout().lock());
    match cli.command {
        CliCommand::Generate(args) => generate(&args, &mut backend),
        CliCommand::Show { layout } => show(&layout, &mut backend),
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn generate<B: RenderingBackend>(args: &GenerateArgs, backend: &mut B) -> Result<()> {
    let config = args.load_config()?;
    let first_seed = args.seed.unwrap_or_else(rand::random);

    for attempt in 0..=args.retries {
        let seed = first_seed.wrapping_add(u64::from(attempt));
        match run_pipeline(&config, seed, args.show_steps, backend)? {
            Some(level) => {
                present_level(&level, backend)?;
                if args.export {
                    let layout = LevelLayout::from_level(&level)
                        .encode()
                        .context("failed to encode layout")?;
                    println!("{layout}");
                }
                return Ok(());
            }
            None => warn!("seed {seed} produced no spawn point, trying the next seed"),
        }
    }

    anyhow::bail!(
        "no playable level after {} attempt(s) starting at seed {first_seed}",
        u64::from(args.retries) + 1
    )
}

/// Runs one pipeline. A missing spawn point is reported as `None` so the
/// caller can retry with another seed.
fn run_pipeline<B: RenderingBackend>(
    config: &GenerationConfig,
    seed: u64,
    show_steps: bool,
    backend: &mut B,
) -> Result<Option<Level>> {
    let mut pipeline = LevelPipeline::new(config.clone(), seed)
        .with_context(|| format!("failed to start generation for seed {seed}"))?;

    loop {
        match pipeline.advance() {
            Ok(Some(Progress::CaveSmoothed { iteration })) if show_steps => {
                if let Some(cave) = pipeline.cave_map() {
                    let title = format!("seed {seed}, cave step {iteration}");
                    backend.present(&Presentation::new(title, TextFrame::from_cave(cave)))?;
                }
            }
            Ok(Some(Progress::LevelReady(level))) => return Ok(Some(level)),
            Ok(Some(_)) => {}
            Ok(None) => return Ok(None),
            Err(GenerationError::SpawnNotFound { .. }) => return Ok(None),
            Err(error) => {
                return Err(error).with_context(|| format!("generation failed for seed {seed}"))
            }
        }
    }
}

fn show<B: RenderingBackend>(layout: &str, backend: &mut B) -> Result<()> {
    let level = LevelLayout::decode(layout)
        .and_then(LevelLayout::into_level)
        .context("failed to decode layout")?;
    present_level(&level, backend)
}

fn present_level<B: RenderingBackend>(level: &Level, backend: &mut B) -> Result<()> {
    let mut frame = TextFrame::from_terrain(level.tiles());
    for placement in level.items() {
        frame
            .mark(placement.position, item_glyph(placement.item))
            .context("item lies outside the level")?;
    }
    frame
        .mark(level.spawn(), PLAYER_GLYPH)
        .context("spawn lies outside the level")?;

    let world = World::new(level.clone());
    let reachable = query::reachable_tile_count(&world, tile_count(level));
    info!(
        "seed {} spawns at {} reaching {reachable} tiles on foot",
        level.seed(),
        describe(level.spawn())
    );

    let (width, height) = frame.dimensions();
    let title = format!(
        "seed {} ({width}x{height}), spawn {}, {reachable} tiles reachable on foot",
        level.seed(),
        describe(level.spawn()),
    );
    backend.present(&Presentation::new(title, frame))
}

fn tile_count(level: &Level) -> usize {
    level.tiles().cells().len()
}

fn describe(position: Position) -> String {
    format!("({}, {})", position.x(), position.y())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_args(flags: &[&str]) -> GenerateArgs {
        let mut argv = vec!["gated-caves", "generate"];
        argv.extend_from_slice(flags);
        match Cli::try_parse_from(argv).expect("arguments parse").command {
            CliCommand::Generate(args) => args,
            CliCommand::Show { .. } => panic!("expected the generate subcommand"),
        }
    }

    #[test]
    fn flags_override_the_config_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("caves.toml");
        let settings = "grid_size = 30\ncave_steps = 5\nmountain_share = 0.5\n";
        fs::write(&path, settings).expect("config written");
        let path = path.to_str().expect("utf-8 path");

        let args = generate_args(&["--config", path, "--size", "12"]);
        let config = args.load_config().expect("valid settings");

        assert_eq!(
            config,
            GenerationConfig {
                grid_size: 12,
                cave_steps: 5,
                mountain_share: 0.5,
                ..GenerationConfig::default()
            }
        );
    }

    #[test]
    fn overridden_settings_are_validated() {
        let args = generate_args(&["--fill", "1.5"]);

        assert!(args.load_config().is_err());
    }

    #[test]
    fn missing_spawns_retry_with_the_following_seeds() {
        let args = generate_args(&[
            "--seed",
            "40",
            "--size",
            "8",
            "--fill",
            "1",
            "--min-reachable",
            "1",
            "--max-tries",
            "20",
            "--retries",
            "2",
        ]);
        let mut backend = TextBackend::new(Vec::new());

        let error = generate(&args, &mut backend)
            .expect_err("solid rock never hosts a spawn");

        assert_eq!(
            error.to_string(),
            "no playable level after 3 attempt(s) starting at seed 40"
        );
        assert!(backend.into_inner().is_empty(), "nothing is presented");
    }

    #[test]
    fn playable_seed_is_presented_without_retrying() {
        let args = generate_args(&[
            "--seed",
            "40",
            "--size",
            "8",
            "--fill",
            "0",
            "--min-reachable",
            "1",
            "--retries",
            "2",
        ]);
        let mut backend = TextBackend::new(Vec::new());

        generate(&args, &mut backend).expect("open floor");

        let printed = String::from_utf8(backend.into_inner()).expect("utf-8");
        assert!(printed.starts_with("seed 40 (8x8), spawn "), "{printed}");
        assert_eq!(printed.matches("seed ").count(), 1);
        assert_eq!(printed.matches(PLAYER_GLYPH).count(), 1);
    }
}
