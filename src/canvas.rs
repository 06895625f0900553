//! # Abstract Canvas Model
//!
//! The face never talks to a real display. Every frame is expressed as a sequence of
//! calls on the [`Canvas`] trait: a stack-scoped 2D raster canvas with save/restore,
//! rotate/translate, a handful of primitives and `save_layer` compositing groups.
//!
//! ## Coordinate System
//! - Origin at the top-left of the surface, `y` grows downward
//! - Positive rotation is clockwise on screen, pivoting around `(px, py)`
//! - Transforms are pre-concatenated: the last call applies first to drawn geometry
//!
//! ## Implementations
//! - [`RecordingCanvas`]: records [`DrawCommand`]s; used by tests and the JSON frame dump
//! - [`crate::raster::RasterCanvas`]: rasterizes into a layered ARGB frame buffer

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::image::Image;

/// A 32-bit ARGB color (`0xAARRGGBB`).
///
/// Serialized as a `"#AARRGGBB"` hex string so config files stay readable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0xFF00_0000);
    pub const WHITE: Color = Color(0xFFFF_FFFF);
    pub const BLUE: Color = Color(0xFF00_00FF);
    pub const TRANSPARENT: Color = Color(0x0000_0000);

    pub const fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Color(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn blue(self) -> u8 {
        self.0 as u8
    }

    /// Same RGB with the alpha channel replaced.
    pub const fn with_alpha(self, alpha: u8) -> Self {
        Color((self.0 & 0x00FF_FFFF) | ((alpha as u32) << 24))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08X}", self.0)
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let hex = value.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("invalid color {value:?}"));
        }
        let parsed =
            u32::from_str_radix(hex, 16).map_err(|_| format!("invalid color {value:?}"))?;
        match hex.len() {
            8 => Ok(Color(parsed)),
            // RGB only: opaque
            6 => Ok(Color(0xFF00_0000 | parsed)),
            _ => Err(format!("color {value:?} must be #RRGGBB or #AARRGGBB")),
        }
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// A point in surface coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Linear interpolation towards `other`; `t = 0` is `self`.
    pub fn lerp(self, other: PointF, t: f32) -> PointF {
        PointF::new(
            self.x * (1.0 - t) + other.x * t,
            self.y * (1.0 - t) + other.y * t,
        )
    }
}

/// An axis-aligned rectangle, `left <= right`, `top <= bottom`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct RectF {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl RectF {
    pub const fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Square of half-size `half` centered on `(cx, cy)`.
    pub fn centered(cx: f32, cy: f32, half: f32) -> Self {
        Self::new(cx - half, cy - half, cx + half, cy + half)
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x < self.right && y >= self.top && y < self.bottom
    }
}

/// 2D affine transform `x' = a·x + c·y + e`, `y' = b·x + d·y + f`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    pub const fn translate(dx: f32, dy: f32) -> Self {
        Self {
            e: dx,
            f: dy,
            ..Self::identity()
        }
    }

    pub const fn scale(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::identity()
        }
    }

    /// Clockwise (on screen) rotation by `degrees` around `(px, py)`.
    pub fn rotate_about(degrees: f32, px: f32, py: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let rotation = Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        };
        Self::translate(px, py)
            .pre_concat(&rotation)
            .pre_concat(&Self::translate(-px, -py))
    }

    /// `self ∘ local`: geometry is mapped by `local` first, then by `self`.
    pub fn pre_concat(&self, local: &Transform) -> Transform {
        Transform {
            a: self.a * local.a + self.c * local.b,
            b: self.b * local.a + self.d * local.b,
            c: self.a * local.c + self.c * local.d,
            d: self.b * local.c + self.d * local.d,
            e: self.a * local.e + self.c * local.f + self.e,
            f: self.b * local.e + self.d * local.f + self.f,
        }
    }

    pub fn map_point(&self, point: PointF) -> PointF {
        PointF::new(
            self.a * point.x + self.c * point.y + self.e,
            self.b * point.x + self.d * point.y + self.f,
        )
    }

    pub fn inverse(&self) -> Option<Transform> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f32::EPSILON {
            return None;
        }
        Some(Transform {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }

    /// Uniform scale factor of the transform (lengths and radii).
    pub fn scale_factor(&self) -> f32 {
        (self.a * self.d - self.b * self.c).abs().sqrt()
    }
}

/// A chain of cubic Bézier segments.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Path {
    pub start: PointF,
    /// `[control1, control2, end]` per segment; each segment starts where the last ended.
    pub segments: Vec<[PointF; 3]>,
}

impl Path {
    /// Build from `1 + 3n` points laid out start, (c1, c2, end)*.
    pub fn from_cubic_chain(points: &[PointF]) -> Self {
        let Some((&start, rest)) = points.split_first() else {
            return Self::default();
        };
        let segments = rest
            .chunks_exact(3)
            .map(|chunk| [chunk[0], chunk[1], chunk[2]])
            .collect();
        Self { start, segments }
    }

    /// Map every control point through `transform`.
    pub fn transformed(&self, transform: &Transform) -> Self {
        Self {
            start: transform.map_point(self.start),
            segments: self
                .segments
                .iter()
                .map(|seg| seg.map(|p| transform.map_point(p)))
                .collect(),
        }
    }

    /// Approximate the path as a polyline with `steps` lines per segment.
    pub fn flatten(&self, steps: usize) -> Vec<PointF> {
        let steps = steps.max(1);
        let mut points = Vec::with_capacity(1 + self.segments.len() * steps);
        points.push(self.start);
        let mut from = self.start;
        for &[c1, c2, to] in &self.segments {
            for step in 1..=steps {
                let t = step as f32 / steps as f32;
                let mt = 1.0 - t;
                let x = mt * mt * mt * from.x
                    + 3.0 * mt * mt * t * c1.x
                    + 3.0 * mt * t * t * c2.x
                    + t * t * t * to.x;
                let y = mt * mt * mt * from.y
                    + 3.0 * mt * mt * t * c1.y
                    + 3.0 * mt * t * t * c2.y
                    + t * t * t * to.y;
                points.push(PointF::new(x, y));
            }
            from = to;
        }
        points
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaintStyle {
    Fill,
    Stroke,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeCap {
    Butt,
    Round,
}

/// Porter-Duff mode used when a paint (or a layer's paint on restore) is composited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    SrcOver,
    /// Keep the destination where the source has coverage, source shows elsewhere in it.
    DstAtop,
}

/// Blurred drop shadow under a primitive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Shadow {
    pub radius: f32,
    pub dx: f32,
    pub dy: f32,
    pub color: Color,
}

/// How a primitive is drawn: color, stroke, shadow, blend and text size.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Paint {
    pub color: Color,
    pub style: PaintStyle,
    pub stroke_width: f32,
    pub cap: StrokeCap,
    pub anti_alias: bool,
    pub shadow: Option<Shadow>,
    pub blend: BlendMode,
    pub text_size: f32,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            style: PaintStyle::Fill,
            stroke_width: 0.0,
            cap: StrokeCap::Butt,
            anti_alias: false,
            shadow: None,
            blend: BlendMode::SrcOver,
            text_size: 12.0,
        }
    }
}

impl Paint {
    pub fn fill(color: Color) -> Self {
        Self {
            color,
            ..Self::default()
        }
    }

    pub fn stroke(color: Color, width: f32) -> Self {
        Self {
            color,
            style: PaintStyle::Stroke,
            stroke_width: width,
            ..Self::default()
        }
    }

    pub fn with_anti_alias(mut self, anti_alias: bool) -> Self {
        self.anti_alias = anti_alias;
        self
    }

    pub fn with_cap(mut self, cap: StrokeCap) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_shadow(mut self, shadow: Option<Shadow>) -> Self {
        self.shadow = shadow;
        self
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_text_size(mut self, text_size: f32) -> Self {
        self.text_size = text_size;
        self
    }

    pub fn set_alpha(&mut self, alpha: u8) {
        self.color = self.color.with_alpha(alpha);
    }
}

/// The drawing surface handed to the face for one frame.
///
/// `save`/`save_layer` push state and `restore` pops it; implementations must support
/// arbitrary nesting and the [`BlendMode::DstAtop`] mode on layer paints.
pub trait Canvas {
    fn save(&mut self);

    /// Start an offscreen compositing group, blended with `paint.blend` on restore.
    fn save_layer(&mut self, bounds: Option<RectF>, paint: &Paint);

    fn restore(&mut self);

    /// Current nesting depth; `0` means nothing is saved.
    fn save_count(&self) -> usize;

    fn rotate(&mut self, degrees: f32, px: f32, py: f32);

    fn translate(&mut self, dx: f32, dy: f32);

    /// Fill the whole clip with `color`.
    fn draw_color(&mut self, color: Color);

    fn draw_line(&mut self, from: PointF, to: PointF, paint: &Paint);

    fn draw_circle(&mut self, center: PointF, radius: f32, paint: &Paint);

    fn draw_oval(&mut self, oval: RectF, paint: &Paint);

    fn draw_rect(&mut self, rect: RectF, paint: &Paint);

    /// Draw `text` with its baseline-left origin at `(x, y)`.
    fn draw_text(&mut self, text: &str, x: f32, y: f32, paint: &Paint);

    fn draw_path(&mut self, path: &Path, paint: &Paint);

    fn draw_bitmap(&mut self, image: &Image, transform: Transform, paint: &Paint);

    /// Bounding box of `text` relative to its baseline origin (top is negative).
    ///
    /// The default models a monospace face: 0.55 em advance, 0.72 em cap height.
    fn measure_text(&self, text: &str, paint: &Paint) -> RectF {
        let glyphs = text.chars().count() as f32;
        let height = paint.text_size * 0.72;
        RectF::new(0.0, -height, glyphs * paint.text_size * 0.55, 0.0)
    }
}

/// One recorded canvas call.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Save,
    SaveLayer {
        bounds: Option<RectF>,
        paint: Paint,
    },
    Restore,
    Rotate {
        degrees: f32,
        px: f32,
        py: f32,
    },
    Translate {
        dx: f32,
        dy: f32,
    },
    Color {
        color: Color,
    },
    Line {
        from: PointF,
        to: PointF,
        paint: Paint,
    },
    Circle {
        center: PointF,
        radius: f32,
        paint: Paint,
    },
    Oval {
        oval: RectF,
        paint: Paint,
    },
    Rect {
        rect: RectF,
        paint: Paint,
    },
    Text {
        text: String,
        x: f32,
        y: f32,
        paint: Paint,
    },
    Path {
        path: Path,
        paint: Paint,
    },
    Bitmap {
        width: u32,
        height: u32,
        transform: Transform,
        paint: Paint,
    },
}

/// Canvas that records every call instead of drawing.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    commands: Vec<DrawCommand>,
    depth: usize,
    unbalanced_restores: usize,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }

    /// Number of `restore` calls made with nothing saved.
    pub fn unbalanced_restores(&self) -> usize {
        self.unbalanced_restores
    }

    /// Every text draw as `(text, x, y)`.
    pub fn texts(&self) -> Vec<(&str, f32, f32)> {
        self.commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::Text { text, x, y, .. } => Some((text.as_str(), *x, *y)),
                _ => None,
            })
            .collect()
    }

    /// Number of commands matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&DrawCommand) -> bool) -> usize {
        self.commands.iter().filter(|command| predicate(command)).count()
    }

    fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }
}

impl Canvas for RecordingCanvas {
    fn save(&mut self) {
        self.depth += 1;
        self.push(DrawCommand::Save);
    }

    fn save_layer(&mut self, bounds: Option<RectF>, paint: &Paint) {
        self.depth += 1;
        self.push(DrawCommand::SaveLayer {
            bounds,
            paint: paint.clone(),
        });
    }

    fn restore(&mut self) {
        if self.depth == 0 {
            self.unbalanced_restores += 1;
            return;
        }
        self.depth -= 1;
        self.push(DrawCommand::Restore);
    }

    fn save_count(&self) -> usize {
        self.depth
    }

    fn rotate(&mut self, degrees: f32, px: f32, py: f32) {
        self.push(DrawCommand::Rotate { degrees, px, py });
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.push(DrawCommand::Translate { dx, dy });
    }

    fn draw_color(&mut self, color: Color) {
        self.push(DrawCommand::Color { color });
    }

    fn draw_line(&mut self, from: PointF, to: PointF, paint: &Paint) {
        self.push(DrawCommand::Line {
            from,
            to,
            paint: paint.clone(),
        });
    }

    fn draw_circle(&mut self, center: PointF, radius: f32, paint: &Paint) {
        self.push(DrawCommand::Circle {
            center,
            radius,
            paint: paint.clone(),
        });
    }

    fn draw_oval(&mut self, oval: RectF, paint: &Paint) {
        self.push(DrawCommand::Oval {
            oval,
            paint: paint.clone(),
        });
    }

    fn draw_rect(&mut self, rect: RectF, paint: &Paint) {
        self.push(DrawCommand::Rect {
            rect,
            paint: paint.clone(),
        });
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, paint: &Paint) {
        self.push(DrawCommand::Text {
            text: text.to_string(),
            x,
            y,
            paint: paint.clone(),
        });
    }

    fn draw_path(&mut self, path: &Path, paint: &Paint) {
        self.push(DrawCommand::Path {
            path: path.clone(),
            paint: paint.clone(),
        });
    }

    fn draw_bitmap(&mut self, image: &Image, transform: Transform, paint: &Paint) {
        self.push(DrawCommand::Bitmap {
            width: image.width(),
            height: image.height(),
            transform,
            paint: paint.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn test_color_hex_parsing() {
        assert_eq!(Color::try_from("#FFC53C91".to_string()), Ok(Color(0xFFC5_3C91)));
        assert_eq!(Color::try_from("CCCCCC".to_string()), Ok(Color(0xFFCC_CCCC)));
        assert!(Color::try_from("#12345".to_string()).is_err());
        assert!(Color::try_from("#GG000000".to_string()).is_err());
        // Sign prefixes are not hex digits
        assert!(Color::try_from("#+FFFFFF".to_string()).is_err());
        assert!(Color::try_from("+FFFFFFF".to_string()).is_err());
        assert_eq!(String::from(Color::BLUE), "#FF0000FF");
    }

    #[test]
    fn test_point_lerp_hits_both_endpoints_exactly() {
        let from = PointF::new(0.25, 0.11);
        let to = PointF::new(0.07, 0.93);
        assert_eq!(from.lerp(to, 0.0), from);
        assert_eq!(from.lerp(to, 1.0), to);
        let mid = from.lerp(to, 0.5);
        assert!(close(mid.x, 0.16) && close(mid.y, 0.52));
    }

    #[test]
    fn test_color_alpha_replacement() {
        let dimmed = Color::WHITE.with_alpha(100);
        assert_eq!(dimmed.alpha(), 100);
        assert_eq!(dimmed.red(), 0xFF);
        assert_eq!(dimmed.with_alpha(255), Color::WHITE);
    }

    #[test]
    fn test_rotate_about_is_clockwise_on_screen() {
        // 12 o'clock rotated by 90 degrees around the center lands on 3 o'clock
        let rotation = Transform::rotate_about(90.0, 50.0, 50.0);
        let mapped = rotation.map_point(PointF::new(50.0, 10.0));
        assert!(close(mapped.x, 90.0), "x was {}", mapped.x);
        assert!(close(mapped.y, 50.0), "y was {}", mapped.y);
    }

    #[test]
    fn test_inverse_undoes_transform() {
        let transform = Transform::rotate_about(33.0, 10.0, 20.0)
            .pre_concat(&Transform::scale(2.0, 2.0))
            .pre_concat(&Transform::translate(3.0, -4.0));
        let inverse = transform.inverse().unwrap();
        let point = PointF::new(7.0, 11.0);
        let back = inverse.map_point(transform.map_point(point));
        assert!(close(back.x, point.x) && close(back.y, point.y));
        assert!(close(transform.scale_factor(), 2.0));
        assert!(Transform::scale(0.0, 1.0).inverse().is_none());
    }

    #[test]
    fn test_path_flatten_hits_segment_ends() {
        let points = [
            PointF::new(0.0, 0.0),
            PointF::new(1.0, 0.0),
            PointF::new(2.0, 0.0),
            PointF::new(3.0, 0.0),
            PointF::new(3.0, 1.0),
            PointF::new(3.0, 2.0),
            PointF::new(3.0, 3.0),
        ];
        let path = Path::from_cubic_chain(&points);
        assert_eq!(path.segments.len(), 2);
        let flat = path.flatten(4);
        assert_eq!(flat.len(), 9);
        assert_eq!(flat[4], PointF::new(3.0, 0.0));
        assert_eq!(*flat.last().unwrap(), PointF::new(3.0, 3.0));
    }

    #[test]
    fn test_recording_canvas_tracks_depth() {
        let mut canvas = RecordingCanvas::new();
        canvas.save();
        canvas.save_layer(None, &Paint::default());
        assert_eq!(canvas.save_count(), 2);
        canvas.restore();
        canvas.restore();
        canvas.restore();
        assert_eq!(canvas.save_count(), 0);
        assert_eq!(canvas.unbalanced_restores(), 1);
        assert_eq!(canvas.count(|c| matches!(c, DrawCommand::Restore)), 2);
    }

    #[test]
    fn test_default_text_measure_scales_with_size() {
        let canvas = RecordingCanvas::new();
        let paint = Paint::default().with_text_size(20.0);
        let bounds = canvas.measure_text("72°", &paint);
        assert!(close(bounds.width(), 3.0 * 11.0));
        assert!(close(bounds.height(), 14.4));
        assert!(bounds.top < 0.0);
    }
}
