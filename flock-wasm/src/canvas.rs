use flock_core::{Color, Surface};
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

/// Browser 2D context as a flock drawing surface
pub struct CanvasSurface<'a> {
    context: &'a CanvasRenderingContext2d,
}

impl<'a> CanvasSurface<'a> {
    pub fn new(context: &'a CanvasRenderingContext2d) -> Self {
        Self { context }
    }
}

impl Surface for CanvasSurface<'_> {
    type Error = JsValue;

    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) -> Result<(), JsValue> {
        self.context
            .clear_rect(x as f64, y as f64, width as f64, height as f64);
        Ok(())
    }

    fn save(&mut self) -> Result<(), JsValue> {
        self.context.save();
        Ok(())
    }

    fn restore(&mut self) -> Result<(), JsValue> {
        self.context.restore();
        Ok(())
    }

    fn translate(&mut self, x: f32, y: f32) -> Result<(), JsValue> {
        self.context.translate(x as f64, y as f64)
    }

    fn rotate(&mut self, angle: f32) -> Result<(), JsValue> {
        self.context.rotate(angle as f64)
    }

    fn begin_path(&mut self) -> Result<(), JsValue> {
        self.context.begin_path();
        Ok(())
    }

    fn move_to(&mut self, x: f32, y: f32) -> Result<(), JsValue> {
        self.context.move_to(x as f64, y as f64);
        Ok(())
    }

    fn line_to(&mut self, x: f32, y: f32) -> Result<(), JsValue> {
        self.context.line_to(x as f64, y as f64);
        Ok(())
    }

    fn close_path(&mut self) -> Result<(), JsValue> {
        self.context.close_path();
        Ok(())
    }

    fn fill(&mut self, color: Color) -> Result<(), JsValue> {
        self.context.set_fill_style_str(&color.to_string());
        self.context.fill();
        Ok(())
    }
}
