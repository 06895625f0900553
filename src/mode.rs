//! # Display Mode State
//!
//! [`ModeState`] holds everything the host imposes on the face from outside: ambient,
//! the two ambient capability flags, mute, visibility and the peek card. Each setter
//! applies one notification and returns a [`Transition`] telling the engine what
//! follow-up work the change needs (restyle, redraw, timer rearm, timezone refresh).
//!
//! ## Rendering Policy
//! | ambient | low-bit or burn-in | layers                                   | seconds |
//! |---------|--------------------|------------------------------------------|---------|
//! | yes     | yes                | flat background fill                     | no      |
//! | yes     | no                 | grayscale background and overlays        | no      |
//! | no      | any                | full color, destination-atop compositing | yes     |
//!
//! Paint styling is derived by the pure [`derive_render_style`], so leaving ambient
//! restores every paint exactly as it was.

use log::{debug, warn};
use serde::Serialize;

use crate::canvas::{BlendMode, Color, Paint, RectF, Shadow, StrokeCap};
use crate::config::StyleConfig;

/// Follow-up work required after a mode notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Transition {
    /// Paints must be re-derived
    pub restyle: bool,
    /// One redraw must be requested
    pub redraw: bool,
    /// The frame scheduler must re-evaluate arming
    pub rearm: bool,
    /// The cached timezone must be re-read
    pub refresh_timezone: bool,
    /// Start (`Some(true)`) or stop (`Some(false)`) listening for timezone changes
    pub listen_timezone: Option<bool>,
}

impl Transition {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// Which background layers a frame may draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerPolicy {
    FlatFill,
    Grayscale,
    FullColor,
}

/// Externally imposed display state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModeState {
    ambient: bool,
    low_bit_ambient: bool,
    burn_in_protection: bool,
    muted: bool,
    visible: bool,
    peek_card_bounds: Option<RectF>,
    properties_latched: bool,
}

impl ModeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ambient(&self) -> bool {
        self.ambient
    }

    pub fn low_bit_ambient(&self) -> bool {
        self.low_bit_ambient
    }

    pub fn burn_in_protection(&self) -> bool {
        self.burn_in_protection
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn peek_card_bounds(&self) -> Option<RectF> {
        self.peek_card_bounds
    }

    pub fn properties_latched(&self) -> bool {
        self.properties_latched
    }

    /// Record the display capabilities. Only the first notification is honored.
    pub fn set_properties(&mut self, low_bit_ambient: bool, burn_in_protection: bool) -> Transition {
        if self.properties_latched {
            if (low_bit_ambient, burn_in_protection) != (self.low_bit_ambient, self.burn_in_protection) {
                warn!(
                    "Ignoring capability change to low_bit={} burn_in={}: already latched as low_bit={} burn_in={}",
                    low_bit_ambient, burn_in_protection, self.low_bit_ambient, self.burn_in_protection
                );
            }
            return Transition::none();
        }
        self.low_bit_ambient = low_bit_ambient;
        self.burn_in_protection = burn_in_protection;
        self.properties_latched = true;
        debug!(
            "Display capabilities: low_bit={} burn_in={}",
            low_bit_ambient, burn_in_protection
        );
        Transition::none()
    }

    pub fn set_ambient(&mut self, ambient: bool) -> Transition {
        if self.ambient == ambient {
            return Transition::none();
        }
        self.ambient = ambient;
        Transition {
            restyle: true,
            redraw: true,
            rearm: true,
            ..Transition::none()
        }
    }

    pub fn set_visible(&mut self, visible: bool) -> Transition {
        if self.visible == visible {
            return Transition::none();
        }
        self.visible = visible;
        if visible {
            Transition {
                redraw: true,
                rearm: true,
                refresh_timezone: true,
                listen_timezone: Some(true),
                ..Transition::none()
            }
        } else {
            Transition {
                rearm: true,
                listen_timezone: Some(false),
                ..Transition::none()
            }
        }
    }

    /// Mute only dims the hands; it never touches the timer.
    pub fn set_muted(&mut self, muted: bool) -> Transition {
        if self.muted == muted {
            return Transition::none();
        }
        self.muted = muted;
        Transition {
            restyle: true,
            redraw: true,
            ..Transition::none()
        }
    }

    /// An empty rectangle clears the peek card.
    pub fn set_peek_card_bounds(&mut self, bounds: RectF) -> Transition {
        let bounds = (!bounds.is_empty()).then_some(bounds);
        if self.peek_card_bounds == bounds {
            return Transition::none();
        }
        self.peek_card_bounds = bounds;
        Transition {
            redraw: self.ambient,
            ..Transition::none()
        }
    }

    pub fn layer_policy(&self) -> LayerPolicy {
        match (self.ambient, self.low_bit_ambient || self.burn_in_protection) {
            (true, true) => LayerPolicy::FlatFill,
            (true, false) => LayerPolicy::Grayscale,
            (false, _) => LayerPolicy::FullColor,
        }
    }

    /// The once-a-second timer only runs while visible and interactive.
    pub fn timer_should_run(&self) -> bool {
        self.visible && !self.ambient
    }
}

/// Every paint a frame is drawn with.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderStyle {
    pub hour: Paint,
    pub minute: Paint,
    pub second: Paint,
    /// Ticks, center circle and complication text
    pub tick_and_circle: Paint,
    /// Hand markers and complication discs
    pub lump: Paint,
    /// Background fill and bitmap paint
    pub background: Paint,
    /// Layer paint that composites the ring over the gradient
    pub composite: Paint,
    pub hour_digit: Color,
    pub minor_digit: Color,
    /// Digit glyph anti-aliasing
    pub anti_alias: bool,
}

/// Derive the paints for the given mode. Pure: the same inputs give the same paints.
pub fn derive_render_style(config: &StyleConfig, ambient: bool, muted: bool) -> RenderStyle {
    let shadow = (!ambient).then_some(Shadow {
        radius: config.shadow_radius,
        dx: 0.0,
        dy: 0.0,
        color: config.shadow_color,
    });
    let (hand_color, highlight_color) = if ambient {
        (config.ambient_color, config.ambient_color)
    } else {
        (config.hand_color, config.highlight_color)
    };
    let hand = |color: Color, width: f32, muted_alpha: u8| {
        let mut paint = Paint::stroke(color, width)
            .with_anti_alias(!ambient)
            .with_cap(StrokeCap::Round)
            .with_shadow(shadow);
        if muted {
            paint.set_alpha(muted_alpha);
        }
        paint
    };

    RenderStyle {
        hour: hand(hand_color, config.hour_stroke_width, config.muted_hand_alpha),
        minute: hand(hand_color, config.minute_stroke_width, config.muted_hand_alpha),
        second: hand(highlight_color, config.second_stroke_width, config.muted_second_alpha),
        tick_and_circle: Paint::stroke(hand_color, config.second_stroke_width)
            .with_anti_alias(!ambient)
            .with_shadow(shadow),
        lump: Paint::fill(config.lump_color).with_anti_alias(!ambient),
        background: Paint::fill(config.background_color),
        composite: Paint::fill(Color::BLACK).with_blend(BlendMode::DstAtop),
        hour_digit: config.hour_digit_color,
        minor_digit: config.minor_digit_color,
        anti_alias: !ambient,
    }
}
