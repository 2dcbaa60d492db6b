//! SVG output for headless runs.
//!
//! [`SvgSurface`] replays the canvas-style drawing calls the flock issues:
//! it keeps a transform stack, turns each filled path into a `<polygon>` in
//! surface coordinates, and serializes the lot as a standalone SVG document.

use flock_core::{Color, Surface};
use std::fmt::Write as _;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SvgError {
    #[error("restore() without a matching save()")]
    UnbalancedRestore,

    #[error("fill() on a path with fewer than three points")]
    DegeneratePath,
}

/// 2D affine transform in canvas order `[a, b, c, d, e, f]`:
/// `x' = a*x + c*y + e`, `y' = b*x + d*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Transform {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Transform {
    const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translate(&mut self, x: f32, y: f32) {
        self.e += self.a * x + self.c * y;
        self.f += self.b * x + self.d * y;
    }

    fn rotate(&mut self, angle: f32) {
        let (sin, cos) = angle.sin_cos();
        let (a, b, c, d) = (self.a, self.b, self.c, self.d);
        self.a = a * cos + c * sin;
        self.b = b * cos + d * sin;
        self.c = c * cos - a * sin;
        self.d = d * cos - b * sin;
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

pub struct SvgSurface {
    width: f32,
    height: f32,
    background: Option<Color>,
    transform: Transform,
    saved: Vec<Transform>,
    path: Vec<(f32, f32)>,
    elements: Vec<String>,
}

impl SvgSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            background: None,
            transform: Transform::IDENTITY,
            saved: Vec::new(),
            path: Vec::new(),
            elements: Vec::new(),
        }
    }

    /// Paints `color` behind everything, like the hero section's CSS
    /// background under a transparent canvas.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }

    /// Number of shapes drawn since the last full clear.
    pub fn shape_count(&self) -> usize {
        self.elements.len()
    }

    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        if let Some(background) = self.background {
            let _ = writeln!(
                out,
                r#"  <rect width="{}" height="{}" fill="{}"/>"#,
                self.width, self.height, background
            );
        }
        for element in &self.elements {
            out.push_str("  ");
            out.push_str(element);
            out.push('\n');
        }
        out.push_str("</svg>\n");
        out
    }
}

impl Surface for SvgSurface {
    type Error = SvgError;

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> Result<(), SvgError> {
        let covers_surface =
            x <= 0.0 && y <= 0.0 && x + width >= self.width && y + height >= self.height;
        if covers_surface {
            self.elements.clear();
        } else if let Some(background) = self.background {
            self.elements.push(format!(
                r#"<rect x="{x:.2}" y="{y:.2}" width="{width:.2}" height="{height:.2}" fill="{background}"/>"#
            ));
        }
        Ok(())
    }

    fn save(&mut self) -> Result<(), SvgError> {
        self.saved.push(self.transform);
        Ok(())
    }

    fn restore(&mut self) -> Result<(), SvgError> {
        self.transform = self.saved.pop().ok_or(SvgError::UnbalancedRestore)?;
        Ok(())
    }

    fn translate(&mut self, x: f32, y: f32) -> Result<(), SvgError> {
        self.transform.translate(x, y);
        Ok(())
    }

    fn rotate(&mut self, angle: f32) -> Result<(), SvgError> {
        self.transform.rotate(angle);
        Ok(())
    }

    fn begin_path(&mut self) -> Result<(), SvgError> {
        self.path.clear();
        Ok(())
    }

    fn move_to(&mut self, x: f32, y: f32) -> Result<(), SvgError> {
        // single subpath per fill is all the flock draws
        self.path.clear();
        self.path.push(self.transform.apply(x, y));
        Ok(())
    }

    fn line_to(&mut self, x: f32, y: f32) -> Result<(), SvgError> {
        self.path.push(self.transform.apply(x, y));
        Ok(())
    }

    fn close_path(&mut self) -> Result<(), SvgError> {
        Ok(())
    }

    fn fill(&mut self, color: Color) -> Result<(), SvgError> {
        if self.path.len() < 3 {
            return Err(SvgError::DegeneratePath);
        }
        let points = self
            .path
            .iter()
            .map(|(x, y)| format!("{x:.2},{y:.2}"))
            .collect::<Vec<_>>()
            .join(" ");
        self.elements
            .push(format!(r#"<polygon points="{points}" fill="{color}"/>"#));
        Ok(())
    }
}
