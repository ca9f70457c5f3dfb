use kurbo::{BezPath, Circle, Line, Point, Rect, Shape as _};
use thiserror::Error;
use crate::types::{PaintStyle, Shape, ShapeKind, DEFAULT_CIRCLE_RADIUS, DEFAULT_RECT_SIZE};

const CURVE_TOLERANCE: f64 = 0.1;

/// A raster target the renderer paints onto.
pub trait Surface {
    /// Erases the whole surface.
    fn clear(&mut self);
    fn set_style(&mut self, style: &PaintStyle);
    fn fill(&mut self, path: &BezPath);
    fn stroke(&mut self, path: &BezPath);
}

/// Why a shape was left unpainted.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Unrenderable {
    #[error("shape has no type")]
    MissingType,
    #[error("unknown shape type {0:?}")]
    UnknownType(String),
    #[error("missing numeric field `{0}`")]
    MissingField(&'static str),
    #[error("invalid radius {0}")]
    InvalidRadius(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outline {
    Fill(BezPath),
    Stroke(BezPath),
}

fn require(value: Option<f64>, field: &'static str) -> Result<f64, Unrenderable> {
    value.ok_or(Unrenderable::MissingField(field))
}

/// Builds the geometry a shape paints, or the reason it cannot be painted.
pub fn outline(shape: &Shape) -> Result<Outline, Unrenderable> {
    match &shape.kind {
        ShapeKind::Circle => {
            let radius = shape.radius.or(shape.size).unwrap_or(DEFAULT_CIRCLE_RADIUS);
            let x = require(shape.x, "x")?;
            let y = require(shape.y, "y")?;
            if radius < 0.0 {
                return Err(Unrenderable::InvalidRadius(radius));
            }
            Ok(Outline::Fill(Circle::new((x, y), radius).to_path(CURVE_TOLERANCE)))
        }
        ShapeKind::Rect => {
            let x = require(shape.x, "x")?;
            let y = require(shape.y, "y")?;
            let width = shape.width.unwrap_or(DEFAULT_RECT_SIZE);
            let height = shape.height.unwrap_or(DEFAULT_RECT_SIZE);
            Ok(Outline::Fill(Rect::new(x, y, x + width, y + height).to_path(CURVE_TOLERANCE)))
        }
        ShapeKind::Line => {
            let x = require(shape.x, "x")?;
            let y = require(shape.y, "y")?;
            let width = require(shape.width, "width")?;
            let height = require(shape.height, "height")?;
            Ok(Outline::Stroke(Line::new((x, y), (x + width, y + height)).to_path(CURVE_TOLERANCE)))
        }
        ShapeKind::Triangle => {
            let x = require(shape.x, "x")?;
            let y = require(shape.y, "y")?;
            let width = require(shape.width, "width")?;
            let height = require(shape.height, "height")?;
            let mut path = BezPath::new();
            path.move_to(Point::new(x, y));
            path.line_to(Point::new(x + width, y));
            path.line_to(Point::new(x + width / 2.0, y - height));
            path.close_path();
            Ok(Outline::Fill(path))
        }
        ShapeKind::Unknown(name) => Err(Unrenderable::UnknownType(name.clone())),
        ShapeKind::Untyped => Err(Unrenderable::MissingType),
    }
}

/// Repaints `surface` from scratch with `shapes`, in list order.
///
/// Shapes that cannot be painted are skipped with a warning naming their index. Style is
/// applied before the required-field check, so a skipped typed shape still leaves its style
/// on the surface.
pub fn render<S: Surface + ?Sized>(surface: &mut S, shapes: &[Shape]) {
    surface.clear();
    for (index, shape) in shapes.iter().enumerate() {
        if shape.kind == ShapeKind::Untyped {
            tracing::warn!(index, reason = %Unrenderable::MissingType, "skipping shape");
            continue;
        }
        surface.set_style(&PaintStyle::resolve(shape));
        match outline(shape) {
            Ok(Outline::Fill(path)) => surface.fill(&path),
            Ok(Outline::Stroke(path)) => surface.stroke(&path),
            Err(reason) => tracing::warn!(index, shape_type = shape.kind.as_str(), %reason, "skipping shape"),
        }
    }
}
