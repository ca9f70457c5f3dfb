use std::io::Cursor;
use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use kurbo::{BezPath, PathEl, Point, Rect, Shape as _};
use palette::Srgb;
use crate::error::Result;
use crate::render::Surface;
use crate::types::PaintStyle;

const FLATTEN_TOLERANCE: f64 = 0.1;
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Resolves a CSS colour name or `#rgb`/`#rrggbb` hex code.
pub fn parse_color(css: &str) -> Option<Rgba<u8>> {
    let css = css.trim();
    let rgb: Srgb<u8> = match css.strip_prefix('#') {
        Some(hex) => hex.parse().ok()?,
        None => palette::named::from_str(&css.to_lowercase())?,
    };
    Some(Rgba([rgb.red, rgb.green, rgb.blue, 255]))
}

/// In-memory RGBA surface. Pixels are painted when their centre is covered; there is no
/// anti-aliasing, so output is exact and repeatable.
pub struct Raster {
    pixels: RgbaImage,
    color: Rgba<u8>,
    line_width: f64,
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Raster {
        Raster { pixels: RgbaImage::new(width, height), color: BLACK, line_width: 1.0 }
    }

    pub fn width(&self) -> u32 { self.pixels.width() }
    pub fn height(&self) -> u32 { self.pixels.height() }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x < self.width() && y < self.height() { Some(*self.pixels.get_pixel(x, y)) } else { None }
    }

    pub fn image(&self) -> &RgbaImage { &self.pixels }

    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut png_bytes: Vec<u8> = Vec::new();
        DynamicImage::ImageRgba8(self.pixels.clone()).write_to(&mut Cursor::new(&mut png_bytes), ImageOutputFormat::Png)?;
        Ok(png_bytes)
    }

    pub fn to_png_data_url(&self) -> Result<String> {
        let b64 = general_purpose::STANDARD.encode(self.to_png()?);
        Ok(format!("data:image/png;base64,{}", b64))
    }

    /// Pixel index range covered by `bounds`, clipped to the surface.
    fn pixel_span(&self, bounds: Rect) -> (u32, u32, u32, u32) {
        let clip = |lo: f64, hi: f64, max: u32| {
            let lo = lo.floor().max(0.0).min(max as f64) as u32;
            let hi = hi.ceil().min(max as f64).max(0.0) as u32;
            (lo, hi)
        };
        let (x0, x1) = clip(bounds.x0, bounds.x1, self.width());
        let (y0, y1) = clip(bounds.y0, bounds.y1, self.height());
        (x0, x1, y0, y1)
    }

    fn paint_where(&mut self, bounds: Rect, covered: impl Fn(Point) -> bool) {
        let (x0, x1, y0, y1) = self.pixel_span(bounds);
        for py in y0..y1 {
            for px in x0..x1 {
                if covered(Point::new(px as f64 + 0.5, py as f64 + 0.5)) {
                    self.pixels.put_pixel(px, py, self.color);
                }
            }
        }
    }
}

fn segments(path: &BezPath) -> Vec<(Point, Point)> {
    let mut segs = Vec::new();
    let mut start = Point::ZERO;
    let mut last = Point::ZERO;
    kurbo::flatten(path.iter(), FLATTEN_TOLERANCE, |el| match el {
        PathEl::MoveTo(p) => { start = p; last = p; }
        PathEl::LineTo(p) => { segs.push((last, p)); last = p; }
        PathEl::ClosePath => { segs.push((last, start)); last = start; }
        _ => {}
    });
    segs
}

/// Butt-capped coverage: the point must project onto the segment and sit within `half_width`.
fn near_segment(p: Point, (a, b): (Point, Point), half_width: f64) -> bool {
    let ab = b - a;
    let len2 = ab.hypot2();
    if len2 == 0.0 {
        return false;
    }
    let t = (p - a).dot(ab) / len2;
    if !(0.0..=1.0).contains(&t) {
        return false;
    }
    let dist = ab.cross(p - a).abs() / len2.sqrt();
    dist <= half_width
}

impl Surface for Raster {
    fn clear(&mut self) {
        for px in self.pixels.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
    }

    /// Invalid colours and widths are ignored and the previous value stays in effect.
    fn set_style(&mut self, style: &PaintStyle) {
        match parse_color(&style.color) {
            Some(color) => self.color = color,
            None => tracing::debug!(color = %style.color, "ignoring unparseable colour"),
        }
        if style.line_width.is_finite() && style.line_width > 0.0 {
            self.line_width = style.line_width;
        }
    }

    fn fill(&mut self, path: &BezPath) {
        let bounds = path.bounding_box();
        self.paint_where(bounds, |p| path.contains(p));
    }

    fn stroke(&mut self, path: &BezPath) {
        let half_width = self.line_width / 2.0;
        let segs = segments(path);
        let bounds = path.bounding_box().inflate(half_width, half_width);
        self.paint_where(bounds, |p| segs.iter().any(|&seg| near_segment(p, seg, half_width)));
    }
}
