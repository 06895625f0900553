//! # Bézier Digit Glyphs
//!
//! Each decimal digit is drawn as one open chain of four cubic Bézier segments, thirteen
//! control points in a unit box. Because every digit has the same number of points, any
//! two digits can be morphed into each other by interpolating the points pairwise; that is
//! what makes a digit rollover animate instead of snap.
//!
//! [`DigitGlyphRenderer`] strokes a [`GlyphShape`] into a `width × height` box centered
//! on an anchor. Its stroke paint is supplied through [`DigitGlyphRendererBuilder`] and is
//! validated on `build()`: a glyph without a usable stroke paint is a configuration error,
//! not something to paper over at draw time.

use crate::canvas::{Canvas, Paint, PaintStyle, Path, PointF, StrokeCap, Transform};
use crate::error::FaceError;

/// Control points per glyph: one start point plus three per cubic segment.
pub const GLYPH_POINTS: usize = 13;

/// A digit outline in unit-box coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlyphShape(pub [PointF; GLYPH_POINTS]);

const fn p(x: f32, y: f32) -> PointF {
    PointF::new(x, y)
}

#[rustfmt::skip]
const DIGITS: [[PointF; GLYPH_POINTS]; 10] = [
    // 0
    [p(0.5, 0.0), p(0.78, 0.0), p(1.0, 0.22), p(1.0, 0.5), p(1.0, 0.78), p(0.78, 1.0), p(0.5, 1.0),
     p(0.22, 1.0), p(0.0, 0.78), p(0.0, 0.5), p(0.0, 0.22), p(0.22, 0.0), p(0.5, 0.0)],
    // 1
    [p(0.25, 0.2), p(0.35, 0.13), p(0.45, 0.07), p(0.55, 0.0), p(0.55, 0.11), p(0.55, 0.22), p(0.55, 0.33),
     p(0.55, 0.44), p(0.55, 0.55), p(0.55, 0.66), p(0.55, 0.77), p(0.55, 0.88), p(0.55, 1.0)],
    // 2
    [p(0.08, 0.28), p(0.08, -0.02), p(0.92, -0.04), p(0.92, 0.3), p(0.92, 0.5), p(0.4, 0.7), p(0.05, 1.0),
     p(0.2, 1.0), p(0.35, 1.0), p(0.5, 1.0), p(0.65, 1.0), p(0.8, 1.0), p(0.95, 1.0)],
    // 3
    [p(0.08, 0.1), p(0.3, -0.05), p(0.9, 0.0), p(0.85, 0.25), p(0.8, 0.45), p(0.5, 0.48), p(0.4, 0.48),
     p(0.6, 0.48), p(1.0, 0.55), p(0.95, 0.75), p(0.9, 1.02), p(0.3, 1.05), p(0.05, 0.9)],
    // 4
    [p(0.7, 1.0), p(0.7, 0.66), p(0.7, 0.33), p(0.7, 0.0), p(0.48, 0.22), p(0.25, 0.45), p(0.02, 0.68),
     p(0.33, 0.68), p(0.66, 0.68), p(0.98, 0.68), p(0.98, 0.68), p(0.98, 0.68), p(0.98, 0.68)],
    // 5
    [p(0.9, 0.0), p(0.65, 0.0), p(0.4, 0.0), p(0.15, 0.0), p(0.12, 0.15), p(0.1, 0.3), p(0.08, 0.45),
     p(0.4, 0.3), p(0.95, 0.35), p(0.95, 0.7), p(0.95, 1.05), p(0.3, 1.05), p(0.05, 0.88)],
    // 6
    [p(0.85, 0.05), p(0.5, -0.05), p(0.05, 0.2), p(0.05, 0.65), p(0.05, 1.05), p(0.95, 1.05), p(0.95, 0.68),
     p(0.95, 0.35), p(0.2, 0.3), p(0.08, 0.6), p(0.08, 0.6), p(0.08, 0.6), p(0.08, 0.6)],
    // 7
    [p(0.02, 0.0), p(0.35, 0.0), p(0.65, 0.0), p(0.98, 0.0), p(0.75, 0.3), p(0.5, 0.65), p(0.3, 1.0),
     p(0.3, 1.0), p(0.3, 1.0), p(0.3, 1.0), p(0.3, 1.0), p(0.3, 1.0), p(0.3, 1.0)],
    // 8
    [p(0.5, 0.47), p(0.05, 0.42), p(0.1, 0.0), p(0.5, 0.0), p(0.9, 0.0), p(0.95, 0.42), p(0.5, 0.47),
     p(0.0, 0.52), p(0.02, 1.0), p(0.5, 1.0), p(0.98, 1.0), p(1.0, 0.52), p(0.5, 0.47)],
    // 9
    [p(0.92, 0.4), p(0.8, 0.7), p(0.05, 0.7), p(0.08, 0.35), p(0.08, -0.05), p(0.92, -0.05), p(0.92, 0.35),
     p(0.92, 0.6), p(0.85, 0.85), p(0.6, 1.0), p(0.45, 1.05), p(0.25, 1.0), p(0.15, 0.92)],
];

impl GlyphShape {
    /// Outline of `digit`; values above 9 use their last decimal digit.
    pub fn digit(digit: u8) -> Self {
        GlyphShape(DIGITS[(digit % 10) as usize])
    }

    /// Pointwise interpolation; `t = 0` is `self`, `t = 1` is `other`.
    pub fn lerp(&self, other: &GlyphShape, t: f32) -> GlyphShape {
        let mut points = self.0;
        for (point, target) in points.iter_mut().zip(other.0.iter()) {
            *point = point.lerp(*target, t);
        }
        GlyphShape(points)
    }

    pub fn to_path(&self) -> Path {
        Path::from_cubic_chain(&self.0)
    }
}

/// Strokes digit outlines into a fixed-size box.
#[derive(Clone, Debug, PartialEq)]
pub struct DigitGlyphRenderer {
    width: u32,
    height: u32,
    paint: Paint,
}

impl DigitGlyphRenderer {
    pub fn builder() -> DigitGlyphRendererBuilder {
        DigitGlyphRendererBuilder::default()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn paint(&self) -> &Paint {
        &self.paint
    }

    /// Ambient frames draw without anti-aliasing.
    pub fn set_anti_alias(&mut self, anti_alias: bool) {
        self.paint.anti_alias = anti_alias;
    }

    /// Stroke `shape` centered on `(anchor_x, anchor_y)`.
    pub fn render(&self, canvas: &mut dyn Canvas, shape: &GlyphShape, anchor_x: f32, anchor_y: f32) {
        let width = self.width as f32;
        let height = self.height as f32;
        // Snap the box origin to whole pixels like a laid-out view would
        let left = (anchor_x - width / 2.0).trunc();
        let top = (anchor_y - height / 2.0).trunc();
        let placement =
            Transform::translate(left, top).pre_concat(&Transform::scale(width, height));
        canvas.draw_path(&shape.to_path().transformed(&placement), &self.paint);
    }
}

/// Builder for [`DigitGlyphRenderer`].
#[derive(Clone, Debug, Default)]
pub struct DigitGlyphRendererBuilder {
    size: Option<(u32, u32)>,
    paint: Option<Paint>,
}

impl DigitGlyphRendererBuilder {
    /// Glyph box in pixels.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }

    /// The stroke paint every glyph is drawn with.
    pub fn stroke_paint(mut self, paint: Paint) -> Self {
        self.paint = Some(paint);
        self
    }

    pub fn build(self) -> Result<DigitGlyphRenderer, FaceError> {
        let (width, height) = self
            .size
            .ok_or_else(|| FaceError::GlyphConfig("glyph box size is required".to_string()))?;
        if width == 0 || height == 0 {
            return Err(FaceError::GlyphConfig(format!(
                "glyph box must be non-empty, got {width}x{height}"
            )));
        }
        let mut paint = self
            .paint
            .ok_or_else(|| FaceError::GlyphConfig("stroke paint is required".to_string()))?;
        if paint.style != PaintStyle::Stroke {
            return Err(FaceError::GlyphConfig(
                "glyph paint must use the stroke style".to_string(),
            ));
        }
        if !(paint.stroke_width.is_finite() && paint.stroke_width > 0.0) {
            return Err(FaceError::GlyphConfig(format!(
                "glyph stroke width must be positive, got {}",
                paint.stroke_width
            )));
        }
        paint.cap = StrokeCap::Round;
        Ok(DigitGlyphRenderer {
            width,
            height,
            paint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Color, DrawCommand, RecordingCanvas};

    fn stroke() -> Paint {
        Paint::stroke(Color(0xFFCCCCCC), 2.0).with_anti_alias(true)
    }

    #[test]
    fn test_every_digit_has_a_shape() {
        for digit in 0..10 {
            let shape = GlyphShape::digit(digit);
            assert_eq!(shape.to_path().segments.len(), 4);
        }
        assert_eq!(GlyphShape::digit(13), GlyphShape::digit(3));
        assert_ne!(GlyphShape::digit(1), GlyphShape::digit(7));
    }

    #[test]
    fn test_lerp_endpoints_and_midpoint() {
        let zero = GlyphShape::digit(0);
        let one = GlyphShape::digit(1);
        assert_eq!(zero.lerp(&one, 0.0), zero);
        assert_eq!(zero.lerp(&one, 1.0), one);
        let mid = zero.lerp(&one, 0.5);
        assert!((mid.0[0].x - (0.5 + 0.25) / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_builder_requires_stroke_paint() {
        let err = DigitGlyphRenderer::builder().size(6, 11).build().unwrap_err();
        assert!(err.to_string().contains("stroke paint is required"));
    }

    #[test]
    fn test_builder_rejects_fill_paint_and_zero_width() {
        let fill = DigitGlyphRenderer::builder()
            .size(6, 11)
            .stroke_paint(Paint::fill(Color::WHITE))
            .build();
        assert!(matches!(fill, Err(FaceError::GlyphConfig(_))));

        let hairline = DigitGlyphRenderer::builder()
            .size(6, 11)
            .stroke_paint(Paint::stroke(Color::WHITE, 0.0))
            .build();
        assert!(matches!(hairline, Err(FaceError::GlyphConfig(_))));

        let empty = DigitGlyphRenderer::builder()
            .size(0, 11)
            .stroke_paint(stroke())
            .build();
        assert!(matches!(empty, Err(FaceError::GlyphConfig(_))));
    }

    #[test]
    fn test_render_places_glyph_box_on_anchor() {
        let renderer = DigitGlyphRenderer::builder()
            .size(10, 20)
            .stroke_paint(stroke())
            .build()
            .unwrap();
        let mut canvas = RecordingCanvas::new();
        renderer.render(&mut canvas, &GlyphShape::digit(7), 50.0, 40.0);

        let DrawCommand::Path { path, paint } = &canvas.commands()[0] else {
            panic!("expected a path");
        };
        assert_eq!(paint.color, Color(0xFFCCCCCC));
        assert_eq!(paint.cap, StrokeCap::Round);
        // Digit 7 starts at the top-left of its box: (45, 30)
        assert!((path.start.x - 45.2).abs() < 1e-4);
        assert!((path.start.y - 30.0).abs() < 1e-4);
        // and ends at (0.3, 1.0) of the box
        let end = path.segments.last().unwrap()[2];
        assert!((end.x - 48.0).abs() < 1e-4);
        assert!((end.y - 50.0).abs() < 1e-4);
    }
}
