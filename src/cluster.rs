//! Two-digit time fields (hours, minutes, seconds) built from independent digit tweens.
//!
//! Each decimal place follows its own digit (`value / 10`, `value % 10`). On a rollover
//! such as 59 → 00 both places animate at once and the intermediate pair can read as
//! neither value; that is accepted cosmetic behavior.

use crate::canvas::{Canvas, PointF};
use crate::config::AnimationConfig;
use crate::glyph::DigitGlyphRenderer;
use crate::tween::{DigitTween, TweenUpdate};

/// The time component a cluster displays.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeField {
    Hours,
    Minutes,
    Seconds,
}

/// Tens and ones tweens plus the renderer that draws them.
#[derive(Clone, Debug)]
pub struct DigitCluster {
    field: TimeField,
    tens: DigitTween,
    ones: DigitTween,
    glyph: Option<DigitGlyphRenderer>,
}

impl DigitCluster {
    pub fn new(field: TimeField, animation: &AnimationConfig) -> Self {
        Self {
            field,
            tens: DigitTween::new(animation.digit_tween_ms, animation.easing),
            ones: DigitTween::new(animation.digit_tween_ms, animation.easing),
            glyph: None,
        }
    }

    pub fn field(&self) -> TimeField {
        self.field
    }

    /// Split a two-digit value into `(tens, ones)`.
    pub fn digits(value: u8) -> (u8, u8) {
        (value / 10, value % 10)
    }

    /// Install the renderer for the current surface size. Tween state is kept.
    pub fn set_renderer(&mut self, glyph: DigitGlyphRenderer) {
        self.glyph = Some(glyph);
    }

    pub fn renderer(&self) -> Option<&DigitGlyphRenderer> {
        self.glyph.as_ref()
    }

    pub fn renderer_mut(&mut self) -> Option<&mut DigitGlyphRenderer> {
        self.glyph.as_mut()
    }

    /// Logical `(tens, ones)` currently shown, if anything has been pushed yet.
    pub fn displayed(&self) -> Option<(u8, u8)> {
        Some((self.tens.displayed()?, self.ones.displayed()?))
    }

    /// Push this frame's value. Returns whether anything changed and needs a redraw.
    ///
    /// With `animate == false` (ambient) changes snap instead of starting a morph.
    pub fn push(&mut self, value: u8, now_ms: i64, animate: bool) -> bool {
        let (tens, ones) = Self::digits(value);
        let apply = |tween: &mut DigitTween, digit: u8| -> TweenUpdate {
            if animate {
                tween.update(digit, now_ms)
            } else {
                tween.snap(digit)
            }
        };
        let tens_update = apply(&mut self.tens, tens);
        let ones_update = apply(&mut self.ones, ones);
        tens_update.is_dirty() || ones_update.is_dirty()
    }

    pub fn is_animating(&self, now_ms: i64) -> bool {
        self.tens.is_animating(now_ms) || self.ones.is_animating(now_ms)
    }

    /// Draw both digits centered on their anchors. Returns whether a morph is still running.
    pub fn render(
        &mut self,
        canvas: &mut dyn Canvas,
        tens_anchor: PointF,
        ones_anchor: PointF,
        now_ms: i64,
    ) -> bool {
        if let Some(glyph) = &self.glyph {
            glyph.render(canvas, &self.tens.shape(now_ms), tens_anchor.x, tens_anchor.y);
            glyph.render(canvas, &self.ones.shape(now_ms), ones_anchor.x, ones_anchor.y);
        }
        let tens_running = self.tens.advance(now_ms);
        let ones_running = self.ones.advance(now_ms);
        tens_running || ones_running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Color, DrawCommand, Paint, RecordingCanvas};
    use crate::tween::Easing;

    fn cluster() -> DigitCluster {
        DigitCluster::new(
            TimeField::Minutes,
            &AnimationConfig {
                digit_tween_ms: 300,
                easing: Easing::Linear,
            },
        )
    }

    #[test]
    fn test_digit_split() {
        assert_eq!(DigitCluster::digits(7), (0, 7));
        assert_eq!(DigitCluster::digits(42), (4, 2));
        assert_eq!(DigitCluster::digits(59), (5, 9));
    }

    #[test]
    fn test_push_reports_changes_only() {
        let mut cluster = cluster();
        assert!(cluster.push(7, 0, true));
        assert_eq!(cluster.displayed(), Some((0, 7)));
        assert!(!cluster.is_animating(0));
        assert!(!cluster.push(7, 100, true));
        assert!(cluster.push(8, 200, true));
        assert!(cluster.is_animating(200));
    }

    #[test]
    fn test_rollover_animates_each_place_independently() {
        let mut cluster = cluster();
        cluster.push(59, 0, true);
        assert!(cluster.push(0, 1_000, true));
        assert_eq!(cluster.displayed(), Some((0, 0)));
        assert!(cluster.tens.is_animating(1_000));
        assert!(cluster.ones.is_animating(1_000));
    }

    #[test]
    fn test_ambient_push_snaps() {
        let mut cluster = cluster();
        cluster.push(10, 0, true);
        assert!(cluster.push(11, 60_000, false));
        assert!(!cluster.is_animating(60_000));
    }

    #[test]
    fn test_render_without_renderer_draws_nothing() {
        let mut cluster = cluster();
        cluster.push(12, 0, true);
        let mut canvas = RecordingCanvas::new();
        let running = cluster.render(&mut canvas, PointF::new(10.0, 10.0), PointF::new(20.0, 10.0), 0);
        assert!(!running);
        assert!(canvas.commands().is_empty());
    }

    #[test]
    fn test_render_draws_two_glyphs_and_finishes_morph() {
        let mut cluster = cluster();
        cluster.set_renderer(
            DigitGlyphRenderer::builder()
                .size(6, 11)
                .stroke_paint(Paint::stroke(Color::WHITE, 1.0))
                .build()
                .unwrap(),
        );
        cluster.push(3, 0, true);
        cluster.push(4, 1_000, true);

        let mut canvas = RecordingCanvas::new();
        assert!(cluster.render(&mut canvas, PointF::new(10.0, 10.0), PointF::new(20.0, 10.0), 1_100));
        assert_eq!(canvas.count(|c| matches!(c, DrawCommand::Path { .. })), 2);

        let mut canvas = RecordingCanvas::new();
        assert!(!cluster.render(&mut canvas, PointF::new(10.0, 10.0), PointF::new(20.0, 10.0), 1_300));
    }
}
