use flock_core::{Color, FlockConfig, FlockError, FlockSimulation, NeighborSearch};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or applying settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("malformed settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Flock(#[from] FlockError),
}

/// Neighbor search strategy as written in settings files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NeighborSearchSetting {
    #[default]
    Exhaustive,
    Grid,
}

impl From<NeighborSearchSetting> for NeighborSearch {
    fn from(setting: NeighborSearchSetting) -> Self {
        match setting {
            NeighborSearchSetting::Exhaustive => NeighborSearch::Exhaustive,
            NeighborSearchSetting::Grid => NeighborSearch::Grid,
        }
    }
}

/// Hero animation settings shared by the browser and headless hosts.
/// Fields missing from JSON take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockSettings {
    pub population: usize,
    pub agent_size: f32,
    /// `#rrggbb`
    pub color: String,
    pub max_speed: f32,
    pub perception_radius: f32,
    pub pointer_influence_radius: f32,
    pub pointer_repel_force: f32,
    pub blend_weight: f32,
    pub neighbor_search: NeighborSearchSetting,
}

impl Default for FlockSettings {
    fn default() -> Self {
        let config = FlockConfig::default();
        Self {
            population: 10,
            agent_size: 12.0,
            color: flock_core::AGENT_COLOR.to_string(),
            max_speed: config.max_speed,
            perception_radius: config.perception_radius,
            pointer_influence_radius: config.pointer_influence_radius,
            pointer_repel_force: config.pointer_repel_force,
            blend_weight: config.blend_weight,
            neighbor_search: NeighborSearchSetting::default(),
        }
    }
}

impl FlockSettings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_config(&self) -> Result<FlockConfig, SettingsError> {
        let config = FlockConfig {
            max_speed: self.max_speed,
            perception_radius: self.perception_radius,
            pointer_influence_radius: self.pointer_influence_radius,
            pointer_repel_force: self.pointer_repel_force,
            blend_weight: self.blend_weight,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn color(&self) -> Result<Color, SettingsError> {
        Ok(Color::from_hex(&self.color)?)
    }

    /// Starts a simulation on a `width` x `height` surface with these settings.
    pub fn start(&self, width: f32, height: f32) -> Result<FlockSimulation, SettingsError> {
        self.start_with_rng(width, height, &mut rand::thread_rng())
    }

    pub fn start_with_rng<R: Rng + ?Sized>(
        &self,
        width: f32,
        height: f32,
        rng: &mut R,
    ) -> Result<FlockSimulation, SettingsError> {
        let config = self.to_config()?;
        let color = self.color()?;
        let simulation =
            FlockSimulation::start_with_rng(width, height, self.population, self.agent_size, rng)?
                .with_config(config)?
                .with_color(color)
                .with_neighbor_search(self.neighbor_search.into());
        Ok(simulation)
    }
}

/// Snapshot of flock statistics for logs and status readouts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlockStats {
    pub frame: u64,
    pub population: usize,
    pub mean_speed: f32,
    pub max_speed_observed: f32,
    pub pointer_active: bool,
}

impl FlockStats {
    pub fn from_simulation(simulation: &FlockSimulation) -> Self {
        let agents = simulation.agents();
        let (total, fastest) = agents.iter().fold((0.0_f32, 0.0_f32), |(total, fastest), agent| {
            let speed = agent.velocity.magnitude();
            (total + speed, fastest.max(speed))
        });
        let mean_speed = if agents.is_empty() {
            0.0
        } else {
            total / agents.len() as f32
        };

        Self {
            frame: simulation.frame(),
            population: agents.len(),
            mean_speed,
            max_speed_observed: fastest,
            pointer_active: simulation.pointer().is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_defaults_match_hero_tuning() {
        let settings = FlockSettings::default();
        assert_eq!(settings.population, 10);
        assert_eq!(settings.agent_size, 12.0);
        assert_eq!(settings.color, "#0072A7");
        assert_eq!(settings.to_config().unwrap(), FlockConfig::default());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings =
            FlockSettings::from_json(r#"{"population": 40, "neighbor_search": "grid"}"#).unwrap();

        assert_eq!(settings.population, 40);
        assert_eq!(settings.neighbor_search, NeighborSearchSetting::Grid);
        assert_eq!(settings.max_speed, 2.0);
        assert_eq!(settings.pointer_influence_radius, 130.0);
    }

    #[test]
    fn test_malformed_json_is_reported() {
        let err = FlockSettings::from_json("{population: ").unwrap_err();
        assert!(matches!(err, SettingsError::Json(_)));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let settings = FlockSettings {
            max_speed: 0.0,
            ..FlockSettings::default()
        };
        assert!(matches!(
            settings.to_config(),
            Err(SettingsError::Flock(FlockError::InvalidConfig(_)))
        ));

        let settings = FlockSettings {
            color: "blue".into(),
            ..FlockSettings::default()
        };
        assert!(matches!(
            settings.color(),
            Err(SettingsError::Flock(FlockError::InvalidColor))
        ));
    }

    #[test]
    fn test_start_applies_settings() {
        let settings = FlockSettings {
            population: 33,
            agent_size: 6.0,
            color: "#ff8800".into(),
            max_speed: 3.0,
            neighbor_search: NeighborSearchSetting::Grid,
            ..FlockSettings::default()
        };
        let mut rng = StdRng::seed_from_u64(1);

        let sim = settings.start_with_rng(640.0, 360.0, &mut rng).unwrap();

        assert_eq!(sim.agents().len(), 33);
        assert_eq!(sim.glyph().size, 6.0);
        assert_eq!(sim.glyph().color, Color::rgb(0xff, 0x88, 0x00));
        assert_eq!(sim.config().max_speed, 3.0);
        assert_eq!(sim.neighbor_search(), NeighborSearch::Grid);
    }

    #[test]
    fn test_stats_track_speed_and_pointer() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut sim = FlockSettings::default()
            .start_with_rng(300.0, 200.0, &mut rng)
            .unwrap();
        sim.set_pointer(150.0, 100.0);
        for _ in 0..30 {
            sim.tick();
        }

        let stats = FlockStats::from_simulation(&sim);

        assert_eq!(stats.frame, 30);
        assert_eq!(stats.population, 10);
        assert!(stats.pointer_active);
        assert!(stats.mean_speed <= stats.max_speed_observed);
        assert!(stats.max_speed_observed <= sim.config().max_speed);
    }
}
