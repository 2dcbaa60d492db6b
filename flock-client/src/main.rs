use anyhow::{Context, Result};
use clap::Parser;
use flock_client::{run, PointerPath, RunOptions};
use flock_core::Vector2D;
use flock_shared::{FlockSettings, NeighborSearchSetting};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless runner for the hero-section flock", long_about = None)]
struct Args {
    /// Surface width in pixels
    #[arg(long, default_value = "1280")]
    width: f32,

    /// Surface height in pixels
    #[arg(long, default_value = "720")]
    height: f32,

    /// Settings JSON file (FlockSettings); flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of agents
    #[arg(short, long)]
    population: Option<usize>,

    /// Agent glyph size in pixels
    #[arg(long)]
    agent_size: Option<f32>,

    /// Use the spatial grid for neighbor search
    #[arg(long)]
    grid: bool,

    /// Frames to simulate
    #[arg(short, long, default_value = "600")]
    frames: u64,

    /// Target frames per second (0 = as fast as possible)
    #[arg(long, default_value = "0")]
    fps: u32,

    /// Seed for the initial scatter (random if omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Pointer position as x,y
    #[arg(long, value_parser = parse_point)]
    pointer: Option<Vector2D>,

    /// Move the pointer in a circle of this radius (around --pointer or the center)
    #[arg(long)]
    orbit: Option<f32>,

    /// Frames per pointer orbit
    #[arg(long, default_value = "240")]
    orbit_period: u64,

    /// Directory for SVG snapshots and stats.json
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write a snapshot every N frames
    #[arg(long)]
    snapshot_every: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn parse_point(value: &str) -> Result<Vector2D, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got '{value}'"))?;
    let x = x.trim().parse::<f32>().map_err(|e| format!("bad x: {e}"))?;
    let y = y.trim().parse::<f32>().map_err(|e| format!("bad y: {e}"))?;
    Ok(Vector2D::new(x, y))
}

impl Args {
    fn settings(&self) -> Result<FlockSettings> {
        let mut settings = match &self.config {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                FlockSettings::from_json(&json)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
            }
            None => FlockSettings::default(),
        };

        if let Some(population) = self.population {
            settings.population = population;
        }
        if let Some(agent_size) = self.agent_size {
            settings.agent_size = agent_size;
        }
        if self.grid {
            settings.neighbor_search = NeighborSearchSetting::Grid;
        }
        Ok(settings)
    }

    fn pointer_path(&self) -> PointerPath {
        let center = self
            .pointer
            .unwrap_or_else(|| Vector2D::new(self.width / 2.0, self.height / 2.0));
        match (self.orbit, self.pointer) {
            (Some(radius), _) => PointerPath::Orbit {
                center,
                radius,
                period: self.orbit_period,
            },
            (None, Some(point)) => PointerPath::Fixed(point),
            (None, None) => PointerPath::Absent,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    log::info!("Flock client starting...");
    log::info!("Surface: {}x{}", args.width, args.height);

    let settings = args.settings()?;
    let mut simulation = match args.seed {
        Some(seed) => settings.start_with_rng(args.width, args.height, &mut StdRng::seed_from_u64(seed)),
        None => settings.start(args.width, args.height),
    }
    .context("Failed to start simulation")?;

    let options = RunOptions {
        frames: args.frames,
        fps: args.fps,
        snapshot_every: args.snapshot_every,
        output: args.output.clone(),
        pointer: args.pointer_path(),
    };

    let stats = run(&mut simulation, &options).context("Run failed")?;
    simulation.stop();

    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orbit_circles_surface_center_by_default() {
        let args = Args::try_parse_from([
            "flock-client",
            "--width",
            "400",
            "--height",
            "200",
            "--orbit",
            "50",
            "--orbit-period",
            "120",
        ])
        .unwrap();

        assert_eq!(
            args.pointer_path(),
            PointerPath::Orbit {
                center: Vector2D::new(200.0, 100.0),
                radius: 50.0,
                period: 120,
            }
        );
    }

    #[test]
    fn test_pointer_without_orbit_is_fixed() {
        let args = Args::try_parse_from(["flock-client", "--pointer", "10,20"]).unwrap();

        assert_eq!(args.pointer_path(), PointerPath::Fixed(Vector2D::new(10.0, 20.0)));
    }
}
