//! # Digit Tweens
//!
//! A [`DigitTween`] separates the digit that is logically current from the outline that
//! is actually drawn. When the logical value changes, the tween morphs the drawn outline
//! towards the new digit over a fixed duration instead of snapping.
//!
//! ## Invariants
//! - At most one interpolation is in flight per tween
//! - Retargeting mid-flight starts the new interpolation from the *current interpolated*
//!   outline and numeric position, so rapid changes never jump
//! - Pushing the value that is already current is a no-op: it neither restarts nor
//!   extends a running interpolation
//!
//! Time is passed in explicitly as wall-clock milliseconds; the tween never reads a clock.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

use crate::glyph::GlyphShape;

/// Progress curve applied to linear time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    /// Slow start and end: `cos((t + 1)π) / 2 + 0.5`
    AccelerateDecelerate,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Easing::Linear => t,
            Easing::AccelerateDecelerate => ((t + 1.0) * PI).cos() / 2.0 + 0.5,
        }
    }
}

/// What an [`DigitTween::update`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TweenUpdate {
    /// Same value; nothing changed
    Unchanged,
    /// First value (or ambient): shown immediately
    Snapped,
    /// An interpolation towards the new value started
    Started,
}

impl TweenUpdate {
    /// Whether the frame must be redrawn because of this update.
    pub fn is_dirty(self) -> bool {
        self != TweenUpdate::Unchanged
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Interpolation {
    from_shape: GlyphShape,
    from_position: f32,
    start_ms: i64,
}

/// One animated decimal digit.
#[derive(Clone, Debug, PartialEq)]
pub struct DigitTween {
    displayed: Option<u8>,
    interpolation: Option<Interpolation>,
    duration_ms: i64,
    easing: Easing,
}

impl DigitTween {
    pub fn new(duration_ms: u32, easing: Easing) -> Self {
        Self {
            displayed: None,
            interpolation: None,
            duration_ms: i64::from(duration_ms.max(1)),
            easing,
        }
    }

    /// The logical value, `None` before the first update.
    pub fn displayed(&self) -> Option<u8> {
        self.displayed
    }

    /// Push the current logical value at time `now_ms`.
    pub fn update(&mut self, value: u8, now_ms: i64) -> TweenUpdate {
        let Some(current) = self.displayed else {
            return self.snap(value);
        };
        if current == value {
            return TweenUpdate::Unchanged;
        }
        let interpolation = Interpolation {
            from_shape: self.shape(now_ms),
            from_position: self.position(now_ms),
            start_ms: now_ms,
        };
        self.displayed = Some(value);
        self.interpolation = Some(interpolation);
        TweenUpdate::Started
    }

    /// Show `value` immediately, cancelling any interpolation.
    pub fn snap(&mut self, value: u8) -> TweenUpdate {
        if self.displayed == Some(value) && self.interpolation.is_none() {
            return TweenUpdate::Unchanged;
        }
        self.displayed = Some(value);
        self.interpolation = None;
        TweenUpdate::Snapped
    }

    /// Linear progress of the in-flight interpolation in `[0, 1]`; `1` when idle.
    pub fn progress(&self, now_ms: i64) -> f32 {
        match &self.interpolation {
            Some(interpolation) => {
                let elapsed = (now_ms - interpolation.start_ms).max(0);
                (elapsed as f32 / self.duration_ms as f32).min(1.0)
            }
            None => 1.0,
        }
    }

    pub fn is_animating(&self, now_ms: i64) -> bool {
        self.progress(now_ms) < 1.0
    }

    /// Numeric interpolated value, e.g. `4.5` halfway through a 3→6 morph.
    pub fn position(&self, now_ms: i64) -> f32 {
        let target = f32::from(self.displayed.unwrap_or(0));
        match &self.interpolation {
            Some(interpolation) if self.is_animating(now_ms) => {
                let eased = self.easing.apply(self.progress(now_ms));
                interpolation.from_position + (target - interpolation.from_position) * eased
            }
            _ => target,
        }
    }

    /// Outline to draw at `now_ms`.
    pub fn shape(&self, now_ms: i64) -> GlyphShape {
        let target = GlyphShape::digit(self.displayed.unwrap_or(0));
        match &self.interpolation {
            Some(interpolation) if self.is_animating(now_ms) => {
                let eased = self.easing.apply(self.progress(now_ms));
                interpolation.from_shape.lerp(&target, eased)
            }
            _ => target,
        }
    }

    /// Drop a finished interpolation. Returns whether one is still running.
    pub fn advance(&mut self, now_ms: i64) -> bool {
        if self.interpolation.is_some() && !self.is_animating(now_ms) {
            self.interpolation = None;
        }
        self.interpolation.is_some()
    }
}
