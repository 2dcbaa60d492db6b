#![cfg_attr(not(feature = "std"), no_std)]
//! Flocking simulation behind the hero-section background animation.
//!
//! A fixed population of agents is advanced once per animation frame from
//! three local rules (alignment, cohesion, separation) plus a repulsion away
//! from the pointer, then drawn as small triangles onto any [`Surface`].

#[cfg(feature = "std")]
use rand::Rng;

mod error;
pub mod render;
#[cfg(feature = "std")]
mod simulation;
#[cfg(feature = "std")]
pub mod spatial;

pub use error::FlockError;
pub use render::{Color, Glyph, Surface, AGENT_COLOR};
#[cfg(feature = "std")]
pub use simulation::{FlockSimulation, NeighborSearch};

mod math {
    pub fn sqrt(value: f32) -> f32 {
        #[cfg(feature = "std")]
        {
            value.sqrt()
        }
        #[cfg(not(feature = "std"))]
        {
            libm::sqrtf(value)
        }
    }

    pub fn atan2(y: f32, x: f32) -> f32 {
        #[cfg(feature = "std")]
        {
            y.atan2(x)
        }
        #[cfg(not(feature = "std"))]
        {
            libm::atan2f(y, x)
        }
    }
}

/// A 2D vector used for position, velocity and acceleration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2D {
    pub x: f32,
    pub y: f32,
}

impl Vector2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn magnitude(&self) -> f32 {
        math::sqrt(self.x * self.x + self.y * self.y)
    }

    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            Self {
                x: self.x / mag,
                y: self.y / mag,
            }
        } else {
            Self::zero()
        }
    }

    /// Rescales to exactly `max` when longer than `max`. A zero vector is
    /// returned unchanged.
    pub fn limit(&self, max: f32) -> Self {
        let mag = self.magnitude();
        if !(mag > max && mag > 0.0) {
            return *self;
        }

        let mut scaled = *self * (max / mag);
        // rounding can leave the result an ulp or two above max
        for _ in 0..4 {
            if scaled.magnitude() <= max {
                break;
            }
            scaled = scaled * (1.0 - f32::EPSILON);
        }
        scaled
    }

    pub fn distance(&self, other: &Vector2D) -> f32 {
        (*self - *other).magnitude()
    }

    /// Angle in radians from the positive x axis.
    pub fn heading(&self) -> f32 {
        math::atan2(self.y, self.x)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl core::ops::Add for Vector2D {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl core::ops::Sub for Vector2D {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl core::ops::Mul<f32> for Vector2D {
    type Output = Self;

    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

impl core::ops::Div<f32> for Vector2D {
    type Output = Self;

    fn div(self, scalar: f32) -> Self {
        Self {
            x: self.x / scalar,
            y: self.y / scalar,
        }
    }
}

impl core::ops::AddAssign for Vector2D {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

/// Width and height of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    width: f32,
    height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Result<Self, FlockError> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if valid(width) && valid(height) {
            Ok(Self { width, height })
        } else {
            Err(FlockError::InvalidBounds { width, height })
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn contains(&self, point: Vector2D) -> bool {
        (0.0..self.width).contains(&point.x) && (0.0..self.height).contains(&point.y)
    }
}

/// Wraps one coordinate into `[0, extent)`: overshooting the far edge lands
/// on 0, undershooting 0 lands on the last representable value below
/// `extent`.
fn wrap_axis(value: f32, extent: f32) -> f32 {
    if value >= extent {
        0.0
    } else if value < 0.0 {
        // extent is finite and positive, so its bit pattern is > 0
        f32::from_bits(extent.to_bits() - 1)
    } else {
        value
    }
}

/// A single agent of the flock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Agent {
    pub position: Vector2D,
    pub velocity: Vector2D,
    /// Force applied during the current tick only.
    pub acceleration: Vector2D,
}

impl Agent {
    pub fn new(position: Vector2D, velocity: Vector2D) -> Self {
        Self {
            position,
            velocity,
            acceleration: Vector2D::zero(),
        }
    }

    /// Uniform position inside `bounds`, velocity uniform in `[-1, 1)` per axis.
    #[cfg(feature = "std")]
    pub fn random<R: Rng + ?Sized>(rng: &mut R, bounds: Bounds) -> Self {
        let position = Vector2D::new(
            rng.gen_range(0.0..bounds.width()),
            rng.gen_range(0.0..bounds.height()),
        );
        let velocity = Vector2D::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0));
        Self::new(position, velocity)
    }

    /// Moves with the velocity of the previous tick, then folds this tick's
    /// acceleration into the velocity and clamps its speed.
    pub fn integrate(&mut self, max_speed: f32) {
        self.position += self.velocity;
        self.velocity += self.acceleration;
        self.velocity = self.velocity.limit(max_speed);
    }

    pub fn wrap_edges(&mut self, bounds: Bounds) {
        self.position.x = wrap_axis(self.position.x, bounds.width());
        self.position.y = wrap_axis(self.position.y, bounds.height());
    }

    pub fn heading(&self) -> f32 {
        self.velocity.heading()
    }
}

/// Tuning constants shared by every agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlockConfig {
    pub max_speed: f32,
    /// Neighbors are agents strictly closer than this.
    pub perception_radius: f32,
    pub pointer_influence_radius: f32,
    /// Constant magnitude of the push away from the pointer.
    pub pointer_repel_force: f32,
    /// Single weight applied to alignment + cohesion + separation.
    pub blend_weight: f32,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            max_speed: 2.0,
            perception_radius: 10.0,
            pointer_influence_radius: 130.0,
            pointer_repel_force: 1.0,
            blend_weight: 0.02,
        }
    }
}

impl FlockConfig {
    pub fn validate(&self) -> Result<(), FlockError> {
        if !(self.max_speed.is_finite() && self.max_speed > 0.0) {
            return Err(FlockError::InvalidConfig("max_speed must be finite and positive"));
        }
        if !(self.perception_radius.is_finite() && self.perception_radius >= 0.0) {
            return Err(FlockError::InvalidConfig(
                "perception_radius must be finite and non-negative",
            ));
        }
        if !(self.pointer_influence_radius.is_finite() && self.pointer_influence_radius >= 0.0) {
            return Err(FlockError::InvalidConfig(
                "pointer_influence_radius must be finite and non-negative",
            ));
        }
        if !self.pointer_repel_force.is_finite() {
            return Err(FlockError::InvalidConfig("pointer_repel_force must be finite"));
        }
        if !self.blend_weight.is_finite() {
            return Err(FlockError::InvalidConfig("blend_weight must be finite"));
        }
        Ok(())
    }
}

/// Steering rules for a single agent
pub mod behavior {
    use super::*;

    /// Per-rule averages over an agent's neighborhood, before blending.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct FlockForces {
        pub alignment: Vector2D,
        pub cohesion: Vector2D,
        pub separation: Vector2D,
        pub neighbors: usize,
    }

    impl FlockForces {
        pub fn blend(&self, weight: f32) -> Vector2D {
            if self.neighbors == 0 {
                return Vector2D::zero();
            }
            (self.alignment + self.cohesion + self.separation) * weight
        }
    }

    /// `others` must not contain `agent` itself.
    pub fn flock_forces<'a, I>(agent: &Agent, others: I, config: &FlockConfig) -> FlockForces
    where
        I: Iterator<Item = &'a Agent>,
    {
        let mut alignment = Vector2D::zero();
        let mut cohesion = Vector2D::zero();
        let mut separation = Vector2D::zero();
        let mut count = 0usize;

        for other in others {
            if agent.position.distance(&other.position) < config.perception_radius {
                alignment += other.velocity;
                cohesion += other.position;
                separation += agent.position - other.position;
                count += 1;
            }
        }

        if count > 0 {
            let k = count as f32;
            alignment = alignment / k;
            cohesion = cohesion / k - agent.position;
            separation = separation / k;
        }

        FlockForces {
            alignment,
            cohesion,
            separation,
            neighbors: count,
        }
    }

    pub fn flock<'a, I>(agent: &Agent, others: I, config: &FlockConfig) -> Vector2D
    where
        I: Iterator<Item = &'a Agent>,
    {
        flock_forces(agent, others, config).blend(config.blend_weight)
    }

    /// Constant-magnitude push directly away from the pointer while inside
    /// the influence radius. An agent sitting exactly on the pointer gets
    /// no push.
    pub fn avoid_pointer(agent: &Agent, pointer: Vector2D, config: &FlockConfig) -> Vector2D {
        let offset = agent.position - pointer;
        let distance = offset.magnitude();
        if distance > 0.0 && distance < config.pointer_influence_radius {
            offset / distance * config.pointer_repel_force
        } else {
            Vector2D::zero()
        }
    }

    /// Full acceleration for one tick.
    pub fn steer<'a, I>(
        agent: &Agent,
        others: I,
        pointer: Option<Vector2D>,
        config: &FlockConfig,
    ) -> Vector2D
    where
        I: Iterator<Item = &'a Agent>,
    {
        let mut acceleration = flock(agent, others, config);
        if let Some(pointer) = pointer {
            acceleration += avoid_pointer(agent, pointer, config);
        }
        acceleration
    }
}

/// Recomputes every agent's acceleration against the population as it was
/// at the start of the tick, scanning the whole population for neighbors.
pub fn steer_all(agents: &mut [Agent], pointer: Option<Vector2D>, config: &FlockConfig) {
    for i in 0..agents.len() {
        let acceleration = {
            let population = &*agents;
            let others = population
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, other)| other);
            behavior::steer(&population[i], others, pointer, config)
        };
        agents[i].acceleration = acceleration;
    }
}

/// Integrates, clamps and wraps every agent using the accelerations already
/// stored on them.
pub fn advance(agents: &mut [Agent], bounds: Bounds, config: &FlockConfig) {
    for agent in agents.iter_mut() {
        agent.integrate(config.max_speed);
        agent.wrap_edges(bounds);
    }
}

/// One full tick over a slice of agents.
pub fn step(agents: &mut [Agent], bounds: Bounds, pointer: Option<Vector2D>, config: &FlockConfig) {
    steer_all(agents, pointer, config);
    advance(agents, bounds, config);
}

/// A fixed-capacity flock for targets without an allocator
pub struct FixedFlock<const N: usize> {
    agents: heapless::Vec<Agent, N>,
    pub config: FlockConfig,
    bounds: Bounds,
    pointer: Option<Vector2D>,
    pub glyph: Glyph,
}

impl<const N: usize> FixedFlock<N> {
    pub fn from_agents<I>(
        bounds: Bounds,
        config: FlockConfig,
        glyph: Glyph,
        agents: I,
    ) -> Result<Self, FlockError>
    where
        I: IntoIterator<Item = Agent>,
    {
        config.validate()?;
        glyph.validate()?;
        let mut population = heapless::Vec::new();
        for agent in agents {
            population
                .push(agent)
                .map_err(|_| FlockError::CapacityExceeded { capacity: N })?;
        }

        Ok(Self {
            agents: population,
            config,
            bounds,
            pointer: None,
            glyph,
        })
    }

    pub fn tick(&mut self) {
        step(&mut self.agents, self.bounds, self.pointer, &self.config);
    }

    pub fn draw<S: Surface>(&self, surface: &mut S) -> Result<(), S::Error> {
        render::draw_agents(surface, &self.agents, self.bounds, &self.glyph)
    }

    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), FlockError> {
        self.bounds = Bounds::new(width, height)?;
        Ok(())
    }

    pub fn set_pointer(&mut self, x: f32, y: f32) {
        self.pointer = Some(Vector2D::new(x, y));
    }

    pub fn clear_pointer(&mut self) {
        self.pointer = None;
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}
