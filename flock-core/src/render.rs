//! Drawing agents onto a host surface.
//!
//! The simulation never talks to a concrete canvas. Hosts implement
//! [`Surface`] for whatever they draw on (a browser 2D context, an SVG
//! document, a test recorder) and hand it to `draw`.

use crate::{Agent, Bounds, FlockError};
use core::fmt;

/// 8-bit RGB fill color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Fill color of the hero-section agents.
pub const AGENT_COLOR: Color = Color::rgb(0x00, 0x72, 0xA7);

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` (the leading `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self, FlockError> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(FlockError::InvalidColor);
        }
        let channel = |range: core::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| FlockError::InvalidColor)
        };
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Size and color of the triangle drawn for each agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    /// Tip length ahead of the agent; the back corners sit `size / 2` to
    /// either side, `size` behind.
    pub size: f32,
    pub color: Color,
}

impl Default for Glyph {
    fn default() -> Self {
        Self {
            size: 12.0,
            color: AGENT_COLOR,
        }
    }
}

impl Glyph {
    pub fn new(size: f32, color: Color) -> Result<Self, FlockError> {
        let glyph = Self { size, color };
        glyph.validate()?;
        Ok(glyph)
    }

    pub fn validate(&self) -> Result<(), FlockError> {
        if self.size.is_finite() && self.size > 0.0 {
            Ok(())
        } else {
            Err(FlockError::InvalidAgentSize(self.size))
        }
    }
}

/// The subset of a 2D canvas API needed to draw the flock.
pub trait Surface {
    type Error;

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> Result<(), Self::Error>;
    fn save(&mut self) -> Result<(), Self::Error>;
    fn restore(&mut self) -> Result<(), Self::Error>;
    fn translate(&mut self, x: f32, y: f32) -> Result<(), Self::Error>;
    /// Rotates the current transform by `angle` radians.
    fn rotate(&mut self, angle: f32) -> Result<(), Self::Error>;
    fn begin_path(&mut self) -> Result<(), Self::Error>;
    fn move_to(&mut self, x: f32, y: f32) -> Result<(), Self::Error>;
    fn line_to(&mut self, x: f32, y: f32) -> Result<(), Self::Error>;
    fn close_path(&mut self) -> Result<(), Self::Error>;
    fn fill(&mut self, color: Color) -> Result<(), Self::Error>;
}

/// Draws one agent as a triangle pointing along its velocity.
pub fn draw_agent<S: Surface>(surface: &mut S, agent: &Agent, glyph: &Glyph) -> Result<(), S::Error> {
    let size = glyph.size;

    surface.save()?;
    surface.translate(agent.position.x, agent.position.y)?;
    surface.rotate(agent.heading())?;

    surface.begin_path()?;
    surface.move_to(size, 0.0)?;
    surface.line_to(-size, -size / 2.0)?;
    surface.line_to(-size, size / 2.0)?;
    surface.close_path()?;
    surface.fill(glyph.color)?;

    surface.restore()
}

/// Clears the surface and draws every agent.
pub fn draw_agents<S: Surface>(
    surface: &mut S,
    agents: &[Agent],
    bounds: Bounds,
    glyph: &Glyph,
) -> Result<(), S::Error> {
    surface.clear_rect(0.0, 0.0, bounds.width(), bounds.height())?;
    for agent in agents {
        draw_agent(surface, agent, glyph)?;
    }
    Ok(())
}
