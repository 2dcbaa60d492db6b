//! Headless host for the hero-section flock: runs the simulation on a fixed
//! frame clock and writes SVG snapshots through the same drawing path the
//! browser canvas uses.

pub mod runner;
pub mod svg;

pub use runner::{run, render_svg, write_snapshot, PointerPath, RunOptions, HERO_BACKGROUND};
pub use svg::{SvgError, SvgSurface};
