use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

pub const SURFACE_WIDTH: u32 = 1600;
pub const SURFACE_HEIGHT: u32 = 900;

pub const DEFAULT_COLOR: &str = "black";
pub const DEFAULT_LINE_WIDTH: f64 = 2.0;
pub const DEFAULT_CIRCLE_RADIUS: f64 = 30.0;
pub const DEFAULT_RECT_SIZE: f64 = 50.0;

/// Ordered paint list; later shapes draw over earlier ones.
pub type ShapeList = Vec<Shape>;

/// Shape discriminant, matched case-insensitively from the descriptor's `type`.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum ShapeKind {
    Circle,
    Rect,
    Line,
    Triangle,
    /// Unrecognized type, kept verbatim so it survives a save.
    Unknown(String),
    #[default]
    Untyped,
}

impl ShapeKind {
    pub fn from_type(name: &str) -> ShapeKind {
        match name.to_lowercase().as_str() {
            "circle" => ShapeKind::Circle,
            "rect" | "rectangle" => ShapeKind::Rect,
            "line" => ShapeKind::Line,
            "triangle" => ShapeKind::Triangle,
            "" => ShapeKind::Untyped,
            _ => ShapeKind::Unknown(name.to_string()),
        }
    }

    /// Descriptor `type` values that are not strings are stringified rather than dropped.
    pub fn from_value(value: &Value) -> ShapeKind {
        match value {
            Value::String(s) => ShapeKind::from_type(s),
            Value::Null => ShapeKind::Untyped,
            other => ShapeKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ShapeKind::Circle => "circle",
            ShapeKind::Rect => "rect",
            ShapeKind::Line => "line",
            ShapeKind::Triangle => "triangle",
            ShapeKind::Unknown(name) => name,
            ShapeKind::Untyped => "",
        }
    }
}

impl Serialize for ShapeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A normalized shape record. Geometry fields stay optional; whether a shape can be painted
/// is decided by the renderer, not here.
#[derive(Serialize, Clone, PartialEq, Debug, Default)]
pub struct Shape {
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    // legacy alias of radius for circles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// `None` when the descriptor carried a non-string colour; the raw value sits in `extra`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "lineWidth", skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    /// Descriptor fields this engine does not interpret, and known fields whose value had the
    /// wrong type.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Shape {
    pub fn new(kind: ShapeKind) -> Shape {
        Shape {
            kind,
            color: Some(DEFAULT_COLOR.to_string()),
            line_width: Some(DEFAULT_LINE_WIDTH),
            ..Default::default()
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Shape {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn sized(mut self, width: f64, height: f64) -> Shape {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Shape {
        self.radius = Some(radius);
        self
    }

    pub fn with_color(mut self, color: &str) -> Shape {
        self.color = Some(color.to_string());
        self
    }

    pub fn with_line_width(mut self, line_width: f64) -> Shape {
        self.line_width = Some(line_width);
        self
    }
}

/// Paint state applied to the surface before a shape is drawn.
#[derive(Clone, PartialEq, Debug)]
pub struct PaintStyle {
    pub color: String,
    pub line_width: f64,
}

impl PaintStyle {
    /// Empty colour falls back to black and a zero (or NaN) width to 2, matching the falsy
    /// fallbacks of a canvas front end. Mistyped values kept in `extra` are handed on the way
    /// a canvas would coerce them; the surface then ignores what it cannot use.
    pub fn resolve(shape: &Shape) -> PaintStyle {
        let color = match (&shape.color, shape.extra.get("color")) {
            (Some(color), _) if !color.is_empty() => color.clone(),
            (None, Some(raw)) => raw.to_string(),
            _ => DEFAULT_COLOR.to_string(),
        };
        let line_width = match (shape.line_width, shape.extra.get("lineWidth")) {
            (Some(width), _) if width != 0.0 && !width.is_nan() => width,
            (None, Some(raw)) => raw.as_str().and_then(|s| s.trim().parse().ok()).unwrap_or(f64::NAN),
            _ => DEFAULT_LINE_WIDTH,
        };
        PaintStyle { color, line_width }
    }
}

impl Default for PaintStyle {
    fn default() -> Self {
        PaintStyle { color: DEFAULT_COLOR.to_string(), line_width: 1.0 }
    }
}
