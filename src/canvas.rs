use kurbo::BezPath;
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, Path2d};
use crate::render::Surface;
use crate::types::{PaintStyle, SURFACE_HEIGHT, SURFACE_WIDTH};

fn to_path_2d(path: &BezPath) -> Option<Path2d> {
    match Path2d::new_with_path_string(&path.to_svg()) {
        Ok(p) => Some(p),
        Err(err) => {
            tracing::warn!(error = ?err, "could not build canvas path");
            None
        }
    }
}

/// The browser canvas. Style setters go straight through, so invalid colours and widths are
/// ignored by the canvas itself.
impl Surface for CanvasRenderingContext2d {
    fn clear(&mut self) {
        let (width, height) = match self.canvas() {
            Some(canvas) => (canvas.width(), canvas.height()),
            None => (SURFACE_WIDTH, SURFACE_HEIGHT),
        };
        self.clear_rect(0.0, 0.0, width as f64, height as f64);
    }

    fn set_style(&mut self, style: &PaintStyle) {
        let color = JsValue::from_str(&style.color);
        self.set_fill_style(&color);
        self.set_stroke_style(&color);
        self.set_line_width(style.line_width);
    }

    fn fill(&mut self, path: &BezPath) {
        if let Some(p) = to_path_2d(path) {
            self.fill_with_path_2d(&p);
        }
    }

    fn stroke(&mut self, path: &BezPath) {
        if let Some(p) = to_path_2d(path) {
            self.stroke_with_path(&p);
        }
    }
}
