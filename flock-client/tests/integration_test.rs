use anyhow::Result;
use flock_client::{run, PointerPath, RunOptions};
use flock_core::Vector2D;
use flock_shared::{FlockSettings, FlockStats, NeighborSearchSetting};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use tempfile::tempdir;

fn seeded_simulation(settings: &FlockSettings, seed: u64) -> Result<flock_core::FlockSimulation> {
    Ok(settings.start_with_rng(480.0, 270.0, &mut StdRng::seed_from_u64(seed))?)
}

#[test]
fn test_run_writes_snapshots_and_stats() -> Result<()> {
    let dir = tempdir()?;
    let settings = FlockSettings {
        population: 12,
        ..FlockSettings::default()
    };
    let mut simulation = seeded_simulation(&settings, 11)?;
    let options = RunOptions {
        frames: 25,
        snapshot_every: Some(10),
        output: Some(dir.path().to_path_buf()),
        pointer: PointerPath::Fixed(Vector2D::new(240.0, 135.0)),
        ..RunOptions::default()
    };

    let stats = run(&mut simulation, &options)?;

    // every 10th frame plus the final one
    for frame in [10, 20, 25] {
        let path = dir.path().join(format!("frame_{frame:06}.svg"));
        let svg = fs::read_to_string(&path)?;
        assert_eq!(svg.matches("<polygon").count(), 12, "in {}", path.display());
        assert!(svg.contains(r##"fill="#0072A7""##));
        assert!(svg.contains(r##"fill="#151515""##));
    }

    let written: FlockStats = serde_json::from_str(&fs::read_to_string(dir.path().join("stats.json"))?)?;
    assert_eq!(written, stats);
    assert_eq!(written.frame, 25);
    assert_eq!(written.population, 12);
    assert!(written.pointer_active);
    assert!(written.max_speed_observed <= 2.0);
    Ok(())
}

#[test]
fn test_final_snapshot_not_duplicated() -> Result<()> {
    let dir = tempdir()?;
    let mut simulation = seeded_simulation(&FlockSettings::default(), 5)?;
    let options = RunOptions {
        frames: 20,
        snapshot_every: Some(10),
        output: Some(dir.path().to_path_buf()),
        ..RunOptions::default()
    };

    run(&mut simulation, &options)?;

    let svgs = fs::read_dir(dir.path())?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "svg"))
        .count();
    assert_eq!(svgs, 2);
    Ok(())
}

#[test]
fn test_same_seed_gives_same_run() -> Result<()> {
    let settings = FlockSettings {
        population: 40,
        perception_radius: 40.0,
        ..FlockSettings::default()
    };
    let options = RunOptions {
        frames: 120,
        pointer: PointerPath::Orbit {
            center: Vector2D::new(240.0, 135.0),
            radius: 80.0,
            period: 60,
        },
        ..RunOptions::default()
    };

    let mut first = seeded_simulation(&settings, 99)?;
    let mut second = seeded_simulation(&settings, 99)?;
    run(&mut first, &options)?;
    run(&mut second, &options)?;

    assert_eq!(first.agents(), second.agents());
    Ok(())
}

#[test]
fn test_grid_setting_matches_exhaustive_run() -> Result<()> {
    let exhaustive = FlockSettings {
        population: 60,
        perception_radius: 30.0,
        ..FlockSettings::default()
    };
    let grid = FlockSettings {
        neighbor_search: NeighborSearchSetting::Grid,
        ..exhaustive.clone()
    };
    let options = RunOptions {
        frames: 90,
        pointer: PointerPath::Fixed(Vector2D::new(100.0, 100.0)),
        ..RunOptions::default()
    };

    let mut a = seeded_simulation(&exhaustive, 3)?;
    let mut b = seeded_simulation(&grid, 3)?;
    run(&mut a, &options)?;
    run(&mut b, &options)?;

    assert_eq!(a.agents(), b.agents());
    Ok(())
}

#[test]
fn test_settings_file_round_trip_drives_run() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("flock.json");
    fs::write(&path, r##"{"population": 7, "color": "#ff0000", "agent_size": 4.0}"##)?;

    let settings = FlockSettings::from_json(&fs::read_to_string(&path)?)?;
    let simulation = seeded_simulation(&settings, 1)?;
    let svg = flock_client::render_svg(&simulation)?;

    assert_eq!(svg.matches(r##"fill="#FF0000""##).count(), 7);
    Ok(())
}
