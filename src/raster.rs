//! # Raster Canvas
//!
//! A [`Canvas`] that actually produces pixels, used by the demo host and the end-to-end
//! tests. Geometry is mapped through the current transform and rasterized with
//! `embedded-graphics` primitives into a one-bit coverage mask, which is then blended
//! with the paint color into the current ARGB layer.
//!
//! ## Layers
//! `save_layer` pushes a transparent layer; `restore` composites it onto the layer below
//! with the layer paint's blend mode. Destination-atop keeps the lower layer's color
//! wherever the restored layer has coverage and clears it elsewhere, which is how the
//! ring artwork gets tinted by the gradient beneath it.
//!
//! ## Simplifications
//! - Anti-aliasing and drop shadows are not rasterized
//! - Text uses a fixed 6×10 bitmap font regardless of `text_size`
//! - Paths are stroked as polylines

use embedded_graphics::{
    mono_font::{iso_8859_1::FONT_6X10, MonoTextStyle},
    pixelcolor::{BinaryColor, Rgb888},
    prelude::*,
    primitives::{Circle, Ellipse, Line, Polyline, PrimitiveStyle, Rectangle, Triangle},
    text::{Baseline, Text},
};
use std::convert::Infallible;

use crate::canvas::{
    BlendMode, Canvas, Color, Paint, PaintStyle, Path, PointF, RectF, StrokeCap, Transform,
};
use crate::image::Image;

/// Line segments per cubic when stroking paths.
const PATH_STEPS: usize = 8;

/// Cap height of the raster font, used for text measurement.
const FONT_CAP_HEIGHT: f32 = 7.0;

/// Luminance ramp for ASCII output, darkest first.
const ASCII_RAMP: &[u8] = b" .:-=+*#%@";

/// One-bit target that records which pixels a primitive covers.
struct CoverageMask {
    size: Size,
    covered: Vec<bool>,
}

impl CoverageMask {
    fn new(width: u32, height: u32) -> Self {
        Self {
            size: Size::new(width, height),
            covered: vec![false; width as usize * height as usize],
        }
    }
}

impl OriginDimensions for CoverageMask {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for CoverageMask {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<BinaryColor>>,
    {
        let (w, h) = (self.size.width as i32, self.size.height as i32);
        for Pixel(p, color) in pixels {
            if color != BinaryColor::On || p.x < 0 || p.y < 0 || p.x >= w || p.y >= h {
                continue;
            }
            self.covered[(p.y * w + p.x) as usize] = true;
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
struct SavedState {
    transform: Transform,
    /// Set when the save opened a layer
    layer_paint: Option<Paint>,
}

/// Layered ARGB frame buffer implementing [`Canvas`].
#[derive(Clone, Debug)]
pub struct RasterCanvas {
    width: u32,
    height: u32,
    layers: Vec<Vec<u32>>,
    stack: Vec<SavedState>,
    transform: Transform,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            layers: vec![vec![Color::TRANSPARENT.0; width as usize * height as usize]],
            stack: Vec::new(),
            transform: Transform::identity(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> RectF {
        RectF::new(0.0, 0.0, self.width as f32, self.height as f32)
    }

    /// Pixel of the base layer; layers still open are not included.
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        Color(self.layers[0][(y * self.width + x) as usize])
    }

    /// Base layer composited over opaque black.
    pub fn rgb(&self, x: u32, y: u32) -> Rgb888 {
        let color = Color(src_over(Color::BLACK.0, self.pixel(x, y).0));
        Rgb888::new(color.red(), color.green(), color.blue())
    }

    /// Push the finished frame to any RGB display.
    pub fn flush<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let pixels = (0..self.height).flat_map(|y| {
            (0..self.width).map(move |x| Pixel(Point::new(x as i32, y as i32), self.rgb(x, y)))
        });
        target.draw_iter(pixels)
    }

    /// Render the frame as ASCII art, `columns` characters wide.
    pub fn to_ascii(&self, columns: u32) -> String {
        let columns = columns.clamp(1, self.width.max(1));
        let step = self.width as f32 / columns as f32;
        // Terminal cells are about twice as tall as wide
        let rows = ((self.height as f32 / (step * 2.0)).round() as u32).max(1);
        let mut out = String::with_capacity(((columns + 1) * rows) as usize);
        for row in 0..rows {
            let y = ((row as f32 + 0.5) * step * 2.0).min(self.height as f32 - 1.0) as u32;
            for column in 0..columns {
                let x = ((column as f32 + 0.5) * step).min(self.width as f32 - 1.0) as u32;
                let rgb = self.rgb(x, y);
                let luma = 0.213 * rgb.r() as f32 + 0.715 * rgb.g() as f32 + 0.072 * rgb.b() as f32;
                let index = ((luma / 256.0) * ASCII_RAMP.len() as f32) as usize;
                out.push(ASCII_RAMP[index.min(ASCII_RAMP.len() - 1)] as char);
            }
            out.push('\n');
        }
        out
    }

    fn top_layer(&mut self) -> &mut Vec<u32> {
        let index = self.layers.len() - 1;
        &mut self.layers[index]
    }

    fn is_axis_aligned(&self) -> bool {
        self.transform.b.abs() < 1e-6 && self.transform.c.abs() < 1e-6
    }

    fn map(&self, point: PointF) -> Point {
        let mapped = self.transform.map_point(point);
        Point::new(mapped.x.round() as i32, mapped.y.round() as i32)
    }

    fn scaled_width(&self, paint: &Paint) -> u32 {
        (paint.stroke_width * self.transform.scale_factor()).round().max(1.0) as u32
    }

    fn style(&self, paint: &Paint) -> PrimitiveStyle<BinaryColor> {
        match paint.style {
            PaintStyle::Fill => PrimitiveStyle::with_fill(BinaryColor::On),
            PaintStyle::Stroke => PrimitiveStyle::with_stroke(BinaryColor::On, self.scaled_width(paint)),
        }
    }

    /// Rasterize `shape` and blend `color` wherever it has coverage.
    fn stamp<S>(&mut self, shapes: &[S], color: Color)
    where
        S: Drawable<Color = BinaryColor>,
    {
        let mut mask = CoverageMask::new(self.width, self.height);
        for shape in shapes {
            shape.draw(&mut mask).ok();
        }
        let layer = self.top_layer();
        for (pixel, covered) in layer.iter_mut().zip(mask.covered) {
            if covered {
                *pixel = src_over(*pixel, color.0);
            }
        }
    }

    fn round_caps(&mut self, points: &[Point], paint: &Paint) {
        if paint.cap != StrokeCap::Round || points.is_empty() {
            return;
        }
        let diameter = self.scaled_width(paint);
        let caps: Vec<_> = points
            .iter()
            .map(|&p| {
                Circle::with_center(p, diameter).into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            })
            .collect();
        self.stamp(&caps, paint.color);
    }
}

impl Canvas for RasterCanvas {
    fn save(&mut self) {
        self.stack.push(SavedState {
            transform: self.transform,
            layer_paint: None,
        });
    }

    fn save_layer(&mut self, _bounds: Option<RectF>, paint: &Paint) {
        self.stack.push(SavedState {
            transform: self.transform,
            layer_paint: Some(paint.clone()),
        });
        self.layers
            .push(vec![Color::TRANSPARENT.0; self.width as usize * self.height as usize]);
    }

    fn restore(&mut self) {
        let Some(state) = self.stack.pop() else {
            return;
        };
        self.transform = state.transform;
        let Some(paint) = state.layer_paint else {
            return;
        };
        let Some(layer) = self.layers.pop() else {
            return;
        };
        let alpha = paint.color.alpha();
        let dst = self.top_layer();
        for (d, &s) in dst.iter_mut().zip(layer.iter()) {
            let s = scale_alpha(s, alpha);
            *d = match paint.blend {
                BlendMode::SrcOver => src_over(*d, s),
                BlendMode::DstAtop => dst_atop(*d, s),
            };
        }
    }

    fn save_count(&self) -> usize {
        self.stack.len()
    }

    fn rotate(&mut self, degrees: f32, px: f32, py: f32) {
        self.transform = self
            .transform
            .pre_concat(&Transform::rotate_about(degrees, px, py));
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.transform = self.transform.pre_concat(&Transform::translate(dx, dy));
    }

    fn draw_color(&mut self, color: Color) {
        for pixel in self.top_layer().iter_mut() {
            *pixel = src_over(*pixel, color.0);
        }
    }

    fn draw_line(&mut self, from: PointF, to: PointF, paint: &Paint) {
        let (a, b) = (self.map(from), self.map(to));
        let line = Line::new(a, b).into_styled(PrimitiveStyle::with_stroke(
            BinaryColor::On,
            self.scaled_width(paint),
        ));
        self.stamp(&[line], paint.color);
        self.round_caps(&[a, b], paint);
    }

    fn draw_circle(&mut self, center: PointF, radius: f32, paint: &Paint) {
        let diameter = (radius * 2.0 * self.transform.scale_factor()).round().max(1.0) as u32;
        let circle = Circle::with_center(self.map(center), diameter).into_styled(self.style(paint));
        self.stamp(&[circle], paint.color);
    }

    fn draw_oval(&mut self, oval: RectF, paint: &Paint) {
        let scale = self.transform.scale_factor();
        let size = Size::new(
            (oval.width() * scale).round().max(1.0) as u32,
            (oval.height() * scale).round().max(1.0) as u32,
        );
        let center = self.map(PointF::new(oval.center_x(), oval.center_y()));
        let ellipse = Ellipse::with_center(center, size).into_styled(self.style(paint));
        self.stamp(&[ellipse], paint.color);
    }

    fn draw_rect(&mut self, rect: RectF, paint: &Paint) {
        if self.is_axis_aligned() {
            let top_left = self.map(PointF::new(rect.left, rect.top));
            let bottom_right = self.map(PointF::new(rect.right, rect.bottom));
            let shape = Rectangle::with_corners(top_left, bottom_right).into_styled(self.style(paint));
            self.stamp(&[shape], paint.color);
            return;
        }
        let corners = [
            self.map(PointF::new(rect.left, rect.top)),
            self.map(PointF::new(rect.right, rect.top)),
            self.map(PointF::new(rect.right, rect.bottom)),
            self.map(PointF::new(rect.left, rect.bottom)),
        ];
        match paint.style {
            PaintStyle::Fill => {
                let fill = PrimitiveStyle::with_fill(BinaryColor::On);
                let halves = [
                    Triangle::new(corners[0], corners[1], corners[2]).into_styled(fill),
                    Triangle::new(corners[0], corners[2], corners[3]).into_styled(fill),
                ];
                self.stamp(&halves, paint.color);
            }
            PaintStyle::Stroke => {
                let outline = [corners[0], corners[1], corners[2], corners[3], corners[0]];
                let style = PrimitiveStyle::with_stroke(BinaryColor::On, self.scaled_width(paint));
                self.stamp(&[Polyline::new(&outline).into_styled(style)], paint.color);
            }
        }
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, paint: &Paint) {
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        let origin = self.map(PointF::new(x, y));
        let label = Text::with_baseline(text, origin, style, Baseline::Alphabetic);
        self.stamp(&[label], paint.color);
    }

    fn draw_path(&mut self, path: &Path, paint: &Paint) {
        let points: Vec<Point> = path
            .flatten(PATH_STEPS)
            .into_iter()
            .map(|p| self.map(p))
            .collect();
        let style = PrimitiveStyle::with_stroke(BinaryColor::On, self.scaled_width(paint));
        self.stamp(&[Polyline::new(&points).into_styled(style)], paint.color);
        if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
            self.round_caps(&[first, last], paint);
        }
    }

    fn draw_bitmap(&mut self, image: &Image, transform: Transform, paint: &Paint) {
        let Some(inverse) = self.transform.pre_concat(&transform).inverse() else {
            return;
        };
        let (width, height) = (self.width, self.height);
        let alpha = paint.color.alpha();
        let layer = self.top_layer();
        for y in 0..height {
            for x in 0..width {
                let src = inverse.map_point(PointF::new(x as f32 + 0.5, y as f32 + 0.5));
                if src.x < 0.0 || src.y < 0.0 {
                    continue;
                }
                let (sx, sy) = (src.x as u32, src.y as u32);
                if sx >= image.width() || sy >= image.height() {
                    continue;
                }
                let index = (y * width + x) as usize;
                layer[index] = src_over(layer[index], scale_alpha(image.pixel(sx, sy).0, alpha));
            }
        }
    }

    fn measure_text(&self, text: &str, _paint: &Paint) -> RectF {
        let advance = FONT_6X10.character_size.width + FONT_6X10.character_spacing;
        let width = text.chars().count() as f32 * advance as f32;
        RectF::new(0.0, -FONT_CAP_HEIGHT, width, 0.0)
    }
}

fn premultiply(argb: u32) -> [f32; 4] {
    let c = Color(argb);
    let a = c.alpha() as f32 / 255.0;
    [
        a,
        c.red() as f32 / 255.0 * a,
        c.green() as f32 / 255.0 * a,
        c.blue() as f32 / 255.0 * a,
    ]
}

fn unpremultiply([a, r, g, b]: [f32; 4]) -> u32 {
    if a <= 0.0 {
        return Color::TRANSPARENT.0;
    }
    let channel = |v: f32| ((v / a) * 255.0).round().clamp(0.0, 255.0) as u8;
    Color::from_argb((a * 255.0).round().clamp(0.0, 255.0) as u8, channel(r), channel(g), channel(b)).0
}

fn scale_alpha(argb: u32, alpha: u8) -> u32 {
    if alpha == u8::MAX {
        return argb;
    }
    let c = Color(argb);
    c.with_alpha(((c.alpha() as u32 * alpha as u32) / 255) as u8).0
}

/// Porter-Duff source-over.
fn src_over(dst: u32, src: u32) -> u32 {
    let (d, s) = (premultiply(dst), premultiply(src));
    let inv = 1.0 - s[0];
    unpremultiply([
        s[0] + d[0] * inv,
        s[1] + d[1] * inv,
        s[2] + d[2] * inv,
        s[3] + d[3] * inv,
    ])
}

/// Porter-Duff destination-atop: `αo = αs`, `Co = αs·Cd + (1 − αd)·Cs`.
fn dst_atop(dst: u32, src: u32) -> u32 {
    let (d, s) = (premultiply(dst), premultiply(src));
    let inv_dst = 1.0 - d[0];
    unpremultiply([
        s[0],
        s[0] * d[1] + inv_dst * s[1],
        s[0] * d[2] + inv_dst * s[2],
        s[0] * d[3] + inv_dst * s[3],
    ])
}
