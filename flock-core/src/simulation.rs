use crate::render::{self, Color, Glyph, Surface};
use crate::spatial::NeighborGrid;
use crate::{advance, behavior, steer_all, Agent, Bounds, FlockConfig, FlockError, Vector2D};
use rand::Rng;

/// How each agent finds its neighbors during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NeighborSearch {
    /// Scan the whole population for every agent.
    #[default]
    Exhaustive,
    /// Bucket agents into a uniform grid first. Same neighbors, same
    /// results, less work on large populations.
    Grid,
}

/// The hero-section flock: a fixed population plus the pointer and surface
/// state that the host feeds in between frames.
pub struct FlockSimulation {
    agents: Vec<Agent>,
    config: FlockConfig,
    bounds: Bounds,
    pointer: Option<Vector2D>,
    glyph: Glyph,
    neighbor_search: NeighborSearch,
    grid: NeighborGrid,
    candidates: Vec<usize>,
    running: bool,
    frame: u64,
}

impl FlockSimulation {
    /// Scatters `population` agents over a `width` x `height` surface.
    pub fn start(
        width: f32,
        height: f32,
        population: usize,
        agent_size: f32,
    ) -> Result<Self, FlockError> {
        Self::start_with_rng(width, height, population, agent_size, &mut rand::thread_rng())
    }

    pub fn start_with_rng<R: Rng + ?Sized>(
        width: f32,
        height: f32,
        population: usize,
        agent_size: f32,
        rng: &mut R,
    ) -> Result<Self, FlockError> {
        let bounds = Bounds::new(width, height)?;
        let agents = (0..population)
            .map(|_| Agent::random(rng, bounds))
            .collect();
        Self::from_agents(bounds, agents, agent_size)
    }

    /// Builds a simulation from an explicit starting population.
    pub fn from_agents(bounds: Bounds, agents: Vec<Agent>, agent_size: f32) -> Result<Self, FlockError> {
        let glyph = Glyph::new(agent_size, render::AGENT_COLOR)?;
        log::info!(
            "Starting flock of {} agents on {}x{} surface",
            agents.len(),
            bounds.width(),
            bounds.height()
        );

        Ok(Self {
            agents,
            config: FlockConfig::default(),
            bounds,
            pointer: None,
            glyph,
            neighbor_search: NeighborSearch::default(),
            grid: NeighborGrid::new(),
            candidates: Vec::new(),
            running: true,
            frame: 0,
        })
    }

    pub fn with_config(mut self, config: FlockConfig) -> Result<Self, FlockError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.glyph.color = color;
        self
    }

    pub fn with_neighbor_search(mut self, neighbor_search: NeighborSearch) -> Self {
        self.neighbor_search = neighbor_search;
        self
    }

    /// Advances every agent by one frame. Does nothing once stopped.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }

        match self.neighbor_search {
            NeighborSearch::Exhaustive => steer_all(&mut self.agents, self.pointer, &self.config),
            NeighborSearch::Grid => self.steer_with_grid(),
        }
        advance(&mut self.agents, self.bounds, &self.config);

        self.frame += 1;
        log::trace!("Frame {} advanced", self.frame);
    }

    fn steer_with_grid(&mut self) {
        self.grid
            .rebuild(&self.agents, self.bounds, self.config.perception_radius);

        for i in 0..self.agents.len() {
            self.grid
                .candidates_into(self.agents[i].position, &mut self.candidates);
            let acceleration = {
                let population = &self.agents;
                let others = self
                    .candidates
                    .iter()
                    .filter(|&&j| j != i)
                    .map(|&j| &population[j]);
                behavior::steer(&population[i], others, self.pointer, &self.config)
            };
            self.agents[i].acceleration = acceleration;
        }
    }

    /// Clears the surface and draws every agent. Agent state is untouched.
    pub fn draw<S: Surface>(&self, surface: &mut S) -> Result<(), S::Error> {
        render::draw_agents(surface, &self.agents, self.bounds, &self.glyph)
    }

    /// New surface size; takes effect at the next wraparound.
    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), FlockError> {
        self.bounds = Bounds::new(width, height)?;
        log::debug!("Resized to {}x{}", width, height);
        Ok(())
    }

    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.pointer = Some(Vector2D::new(x, y));
    }

    pub fn clear_pointer(&mut self) {
        self.pointer = None;
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            log::debug!("Flock stopped after {} frames", self.frame);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn pointer(&self) -> Option<Vector2D> {
        self.pointer
    }

    pub fn config(&self) -> &FlockConfig {
        &self.config
    }

    pub fn glyph(&self) -> &Glyph {
        &self.glyph
    }

    pub fn neighbor_search(&self) -> NeighborSearch {
        self.neighbor_search
    }

    /// Number of ticks applied so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }
}
