//! Shape normalization: loosely-typed descriptors from the assistant or from persisted
//! drawings become `Shape` records. Never fails. A known field whose value has the wrong
//! type does not fill its typed slot; it is carried verbatim in `extra` so a save writes it
//! back unchanged, and the renderer judges the shape later.

use serde_json::{Map, Value};
use crate::types::{Shape, ShapeKind, ShapeList, DEFAULT_COLOR, DEFAULT_LINE_WIDTH};

const GEOMETRY_FIELDS: [&str; 6] = ["x", "y", "radius", "size", "width", "height"];

pub fn normalize(raw: &Value) -> Shape {
    let empty = Map::new();
    let fields = raw.as_object().unwrap_or(&empty);
    let number = |key: &str| fields.get(key).and_then(Value::as_f64);

    let kind = fields.get("type").map(ShapeKind::from_value).unwrap_or_default();
    let size = number("size");
    let mut radius = number("radius");
    if kind == ShapeKind::Circle && !fields.contains_key("radius") {
        radius = size;
    }

    let color = match fields.get("color") {
        None | Some(Value::Null) => Some(DEFAULT_COLOR.to_string()),
        Some(Value::String(color)) => Some(color.clone()),
        Some(_) => None,
    };
    let line_width = match fields.get("lineWidth") {
        None | Some(Value::Null) => Some(DEFAULT_LINE_WIDTH),
        Some(value) => value.as_f64(),
    };

    let carried = |key: &str, value: &Value| match key {
        "type" => false,
        "color" => color.is_none(),
        "lineWidth" => line_width.is_none(),
        key if GEOMETRY_FIELDS.contains(&key) => value.as_f64().is_none(),
        _ => true,
    };
    let extra = fields
        .iter()
        .filter(|(key, value)| carried(key.as_str(), *value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Shape {
        kind,
        x: number("x"),
        y: number("y"),
        radius,
        size,
        width: number("width"),
        height: number("height"),
        color,
        line_width,
        extra,
    }
}

pub fn normalize_all<'a>(raw: impl IntoIterator<Item = &'a Value>) -> ShapeList {
    raw.into_iter().map(normalize).collect()
}
