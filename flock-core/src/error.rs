use thiserror::Error;

/// Errors produced when a simulation is set up or reconfigured.
///
/// Numeric edge cases inside a tick (zero neighbors, zero distance to the
/// pointer, zero velocity) are handled in place and never show up here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlockError {
    /// Surface width or height was zero, negative or not finite.
    #[error("invalid surface bounds {width}x{height}: both must be finite and positive")]
    InvalidBounds { width: f32, height: f32 },

    /// Agent glyph size was zero, negative or not finite.
    #[error("invalid agent size {0}: must be finite and positive")]
    InvalidAgentSize(f32),

    /// A tuning constant was out of range.
    #[error("invalid flock config: {0}")]
    InvalidConfig(&'static str),

    /// A color string was not `#rrggbb`.
    #[error("invalid color: expected #rrggbb")]
    InvalidColor,

    /// A fixed-capacity flock was given more agents than it can hold.
    #[error("population exceeds fixed capacity of {capacity}")]
    CapacityExceeded { capacity: usize },
}
