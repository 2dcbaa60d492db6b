use crate::svg::SvgSurface;
use anyhow::{Context, Result};
use flock_core::{Color, FlockSimulation, Vector2D};
use flock_shared::FlockStats;
use std::f32::consts::TAU;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Canvas background of the hero section.
pub const HERO_BACKGROUND: Color = Color::rgb(0x15, 0x15, 0x15);

/// Scripted stand-in for mouse movement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerPath {
    Absent,
    Fixed(Vector2D),
    /// Circles `center` once every `period` frames.
    Orbit {
        center: Vector2D,
        radius: f32,
        period: u64,
    },
}

impl PointerPath {
    pub fn position(&self, frame: u64) -> Option<Vector2D> {
        match *self {
            PointerPath::Absent => None,
            PointerPath::Fixed(point) => Some(point),
            PointerPath::Orbit {
                center,
                radius,
                period,
            } => {
                let period = period.max(1);
                let angle = (frame % period) as f32 / period as f32 * TAU;
                Some(center + Vector2D::new(angle.cos(), angle.sin()) * radius)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub frames: u64,
    /// Real-time pacing; 0 runs as fast as possible.
    pub fps: u32,
    /// Write a snapshot every N frames (the last frame is always written).
    pub snapshot_every: Option<u64>,
    pub output: Option<PathBuf>,
    pub pointer: PointerPath,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            frames: 600,
            fps: 0,
            snapshot_every: None,
            output: None,
            pointer: PointerPath::Absent,
        }
    }
}

/// Draws the current flock into an SVG document.
pub fn render_svg(simulation: &FlockSimulation) -> Result<String> {
    let bounds = simulation.bounds();
    let mut surface = SvgSurface::new(bounds.width(), bounds.height()).with_background(HERO_BACKGROUND);
    simulation
        .draw(&mut surface)
        .context("Failed to draw flock")?;
    Ok(surface.to_svg())
}

pub fn write_snapshot(simulation: &FlockSimulation, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(format!("frame_{:06}.svg", simulation.frame()));
    let svg = render_svg(simulation)?;
    fs::write(&path, svg).with_context(|| format!("Failed to write {}", path.display()))?;
    log::debug!("Snapshot written to {}", path.display());
    Ok(path)
}

/// Drives the flock on a fixed frame clock: feed the pointer, tick, and
/// emit snapshots. Returns the stats after the last frame.
pub fn run(simulation: &mut FlockSimulation, options: &RunOptions) -> Result<FlockStats> {
    if let Some(dir) = &options.output {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let frame_interval = (options.fps > 0).then(|| Duration::from_secs_f64(1.0 / options.fps as f64));
    let log_every = u64::from(options.fps.max(60));
    let started = Instant::now();
    let mut last_snapshot = None;

    for _ in 0..options.frames {
        let frame_started = Instant::now();

        match options.pointer.position(simulation.frame()) {
            Some(point) => simulation.set_pointer(point.x, point.y),
            None => simulation.clear_pointer(),
        }
        simulation.tick();

        let frame = simulation.frame();
        if frame % log_every == 0 {
            let stats = FlockStats::from_simulation(simulation);
            log::info!(
                "Frame {}: mean speed {:.3}, max speed {:.3}",
                stats.frame,
                stats.mean_speed,
                stats.max_speed_observed
            );
        }

        if let (Some(dir), Some(every)) = (&options.output, options.snapshot_every) {
            if every > 0 && frame % every == 0 {
                write_snapshot(simulation, dir)?;
                last_snapshot = Some(frame);
            }
        }

        if let Some(interval) = frame_interval {
            if let Some(remaining) = interval.checked_sub(frame_started.elapsed()) {
                std::thread::sleep(remaining);
            }
        }
    }

    let elapsed = started.elapsed().as_secs_f64();
    if elapsed > 0.0 {
        log::info!(
            "Ran {} frames in {:.2}s ({:.1} FPS)",
            options.frames,
            elapsed,
            options.frames as f64 / elapsed
        );
    }

    let stats = FlockStats::from_simulation(simulation);
    if let Some(dir) = &options.output {
        if last_snapshot != Some(stats.frame) {
            write_snapshot(simulation, dir)?;
        }
        let stats_path = dir.join("stats.json");
        fs::write(&stats_path, serde_json::to_string_pretty(&stats)?)
            .with_context(|| format!("Failed to write {}", stats_path.display()))?;
    }

    Ok(stats)
}
