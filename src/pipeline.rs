//! # Render Pipeline
//!
//! One call to [`RenderPipeline::render`] draws one frame onto an abstract [`Canvas`]:
//!
//! 1. Push the sampled time into the hour, minute and (interactive only) second clusters
//! 2. Draw the background picked by the [`FramePlan`]
//! 3. Optional tick marks and the ambient peek-card backdrop
//! 4. Each hand in its own save/rotate/restore scope: stroke, marker, upright digits
//! 5. Close any compositing layers, then draw the complications on top
//!
//! ## Full-Color Layering
//! ```text
//! cosmos, bokeh
//! save_layer(background)
//!   gradient
//!   save_layer(destination-atop)
//!     ring, hands
//!   restore
//! restore
//! complications
//! ```
//! The two-layer group is only opened when both the gradient and the ring are available;
//! otherwise whatever layers exist are drawn directly. A missing image never fails a frame.

use log::{debug, info, trace, warn};
use serde::Serialize;
use std::collections::HashMap;

use crate::canvas::{Canvas, Color, Paint, PointF, RectF, Transform};
use crate::cluster::{DigitCluster, TimeField};
use crate::complication::ComplicationSet;
use crate::config::{AnimationConfig, FaceConfig, StyleConfig};
use crate::error::FaceError;
use crate::geometry::{endpoint, HandAngles, HandLengths, LUMP_ORBIT, LUMP_RADIUS};
use crate::glyph::DigitGlyphRenderer;
use crate::image::{Image, ImageLoader, ResourceId};
use crate::mode::{derive_render_style, LayerPolicy, ModeState, RenderStyle};
use crate::time::TimeSample;

/// Resources that have a grayscale copy for ambient frames.
const GRAYSCALE_LAYERS: [ResourceId; 3] =
    [ResourceId::Cosmos, ResourceId::Bokeh, ResourceId::PinkRing];

/// Horizontal offset of each digit from its marker, as a fraction of the radius.
const DIGIT_OFFSET: f32 = 0.03;

/// How the background of a frame is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "color", rename_all = "snake_case")]
pub enum BackgroundPlan {
    FlatFill(Color),
    Grayscale,
    Layered,
}

/// What one frame draws, chosen from the mode state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FramePlan {
    pub background: BackgroundPlan,
    pub draw_seconds: bool,
    pub draw_ticks: bool,
    /// Backdrop rectangle behind the peek card (ambient only)
    pub peek_card_backdrop: Option<RectF>,
    pub animate_digits: bool,
}

impl FramePlan {
    pub fn select(mode: &ModeState, style: &StyleConfig) -> Self {
        let background = match mode.layer_policy() {
            LayerPolicy::FlatFill => BackgroundPlan::FlatFill(style.background_color),
            LayerPolicy::Grayscale => BackgroundPlan::Grayscale,
            LayerPolicy::FullColor => BackgroundPlan::Layered,
        };
        let ambient = mode.is_ambient();
        Self {
            background,
            draw_seconds: !ambient,
            draw_ticks: style.draw_ticks,
            peek_card_backdrop: if ambient { mode.peek_card_bounds() } else { None },
            animate_digits: !ambient,
        }
    }
}

/// Everything derived from the surface size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SurfaceLayout {
    pub width: u32,
    pub height: u32,
    pub center: PointF,
    pub radius: f32,
    pub hand_lengths: HandLengths,
    /// Digit glyph box `(width, height)` in pixels
    pub glyph_box: (u32, u32),
    pub glyph_stroke: f32,
}

impl SurfaceLayout {
    pub fn new(width: u32, height: u32) -> Result<Self, FaceError> {
        if width == 0 || height == 0 {
            return Err(FaceError::InvalidSurface(width, height));
        }
        let center = PointF::new(width as f32 / 2.0, height as f32 / 2.0);
        let radius = center.x.min(center.y);
        let char_width = (width as f32 * 0.03).round().max(1.0);
        let char_height = (char_width * 1.9).round();
        let stroke = (width as f32 * 0.005).round().max(1.0);
        Ok(Self {
            width,
            height,
            center,
            radius,
            hand_lengths: HandLengths::for_radius(radius),
            glyph_box: (char_width as u32, char_height as u32),
            glyph_stroke: stroke,
        })
    }

    pub fn bounds(&self) -> RectF {
        RectF::new(0.0, 0.0, self.width as f32, self.height as f32)
    }
}

/// Outcome of one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameReport {
    pub plan: FramePlan,
    pub angles: HandAngles,
    pub layers_drawn: Vec<ResourceId>,
    pub layers_skipped: Vec<ResourceId>,
    pub complications_drawn: usize,
    /// A cluster showed a new value this frame (snapped or started a morph)
    pub digits_changed: bool,
    /// A digit morph is still running and needs another frame
    pub animating: bool,
    /// Nothing was drawn because the surface is not known yet
    pub skipped: bool,
}

impl FrameReport {
    fn new(plan: FramePlan, angles: HandAngles) -> Self {
        Self {
            plan,
            angles,
            layers_drawn: Vec::new(),
            layers_skipped: Vec::new(),
            complications_drawn: 0,
            digits_changed: false,
            animating: false,
            skipped: false,
        }
    }
}

/// Per-frame drawing and the caches it needs.
#[derive(Debug)]
pub struct RenderPipeline {
    style_config: StyleConfig,
    style: RenderStyle,
    layout: Option<SurfaceLayout>,
    images: HashMap<ResourceId, Image>,
    grayscale: HashMap<ResourceId, Image>,
    hours: DigitCluster,
    minutes: DigitCluster,
    seconds: DigitCluster,
}

impl RenderPipeline {
    pub fn new(config: &FaceConfig) -> Self {
        let animation: &AnimationConfig = &config.animation;
        Self {
            style_config: config.style.clone(),
            style: derive_render_style(&config.style, false, false),
            layout: None,
            images: HashMap::new(),
            grayscale: HashMap::new(),
            hours: DigitCluster::new(TimeField::Hours, animation),
            minutes: DigitCluster::new(TimeField::Minutes, animation),
            seconds: DigitCluster::new(TimeField::Seconds, animation),
        }
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    pub fn style_config(&self) -> &StyleConfig {
        &self.style_config
    }

    pub fn layout(&self) -> Option<&SurfaceLayout> {
        self.layout.as_ref()
    }

    pub fn cluster(&self, field: TimeField) -> &DigitCluster {
        match field {
            TimeField::Hours => &self.hours,
            TimeField::Minutes => &self.minutes,
            TimeField::Seconds => &self.seconds,
        }
    }

    pub fn has_image(&self, id: ResourceId) -> bool {
        self.images.contains_key(&id)
    }

    pub fn has_grayscale(&self, id: ResourceId) -> bool {
        self.grayscale.contains_key(&id)
    }

    /// Re-derive every paint for the current mode.
    pub fn restyle(&mut self, ambient: bool, muted: bool) {
        self.style = derive_render_style(&self.style_config, ambient, muted);
        let anti_alias = self.style.anti_alias;
        for cluster in [&mut self.hours, &mut self.minutes, &mut self.seconds] {
            if let Some(glyph) = cluster.renderer_mut() {
                glyph.set_anti_alias(anti_alias);
            }
        }
    }

    /// Rebuild every size-derived cache: layout, glyph renderers and scaled images.
    pub fn on_surface_changed<L: ImageLoader + ?Sized>(
        &mut self,
        width: u32,
        height: u32,
        loader: &L,
        want_grayscale: bool,
    ) -> Result<(), FaceError> {
        let layout = SurfaceLayout::new(width, height)?;
        info!(
            "Surface {}x{}: radius {:.1}, glyph box {}x{}",
            width, height, layout.radius, layout.glyph_box.0, layout.glyph_box.1
        );

        let (box_width, box_height) = layout.glyph_box;
        let glyph = |color: Color| {
            DigitGlyphRenderer::builder()
                .size(box_width, box_height)
                .stroke_paint(
                    Paint::stroke(color, layout.glyph_stroke).with_anti_alias(self.style.anti_alias),
                )
                .build()
        };
        let hour_glyph = glyph(self.style.hour_digit)?;
        let minor_glyph = glyph(self.style.minor_digit)?;
        self.hours.set_renderer(hour_glyph);
        self.minutes.set_renderer(minor_glyph.clone());
        self.seconds.set_renderer(minor_glyph);

        self.images.clear();
        self.grayscale.clear();
        for id in ResourceId::ALL {
            match loader
                .decode(id)
                .and_then(|image| loader.scale(&image, width, height))
            {
                Ok(image) if image.is_empty() => warn!("Layer {:?} unavailable: no pixels", id),
                Ok(image) => {
                    self.images.insert(id, image);
                }
                Err(e) => warn!("Layer {:?} unavailable: {}", id, e),
            }
        }
        if want_grayscale {
            for id in GRAYSCALE_LAYERS {
                let Some(image) = self.images.get(&id) else {
                    continue;
                };
                match loader.to_grayscale(image) {
                    Ok(gray) => {
                        self.grayscale.insert(id, gray);
                    }
                    Err(e) => warn!("Grayscale {:?} unavailable: {}", id, e),
                }
            }
        }

        self.layout = Some(layout);
        Ok(())
    }

    /// Draw one frame. `now_ms` is the wall-clock reading `sample` was taken from.
    pub fn render(
        &mut self,
        canvas: &mut dyn Canvas,
        bounds: RectF,
        mode: &ModeState,
        sample: &TimeSample,
        now_ms: i64,
        complications: &ComplicationSet,
    ) -> FrameReport {
        let plan = FramePlan::select(mode, &self.style_config);
        let angles = HandAngles::from_sample(sample);
        let mut report = FrameReport::new(plan, angles);

        let Some(layout) = self.layout else {
            warn!("Skipping frame: surface size not known yet");
            report.skipped = true;
            return report;
        };
        if bounds.is_empty() {
            debug!("Skipping frame: empty clip bounds");
            report.skipped = true;
            return report;
        }
        trace!(
            "Frame {:02}:{:02}:{:02}.{:03} plan {:?}",
            sample.hour12,
            sample.minute,
            sample.second,
            sample.millisecond,
            plan.background
        );

        let animate = plan.animate_digits;
        let mut changed = push_digits(&mut self.hours, sample.hour12, now_ms, animate);
        changed |= push_digits(&mut self.minutes, sample.minute, now_ms, animate);
        if plan.draw_seconds {
            changed |= push_digits(&mut self.seconds, sample.second, now_ms, animate);
        }
        report.digits_changed = changed;

        let open_layers = self.draw_background(canvas, &layout, plan.background, &mut report);

        if plan.draw_ticks {
            self.draw_ticks(canvas, &layout);
        }
        if let Some(card) = plan.peek_card_backdrop {
            canvas.draw_rect(card, &self.style.background);
        }

        let mut animating = false;
        if plan.draw_seconds {
            animating |= self.draw_hand(canvas, &layout, TimeField::Seconds, angles.seconds, now_ms);
        }
        animating |= self.draw_hand(canvas, &layout, TimeField::Minutes, angles.minutes, now_ms);
        animating |= self.draw_hand(canvas, &layout, TimeField::Hours, angles.hours, now_ms);
        if self.style_config.hand_strokes {
            canvas.draw_circle(
                layout.center,
                self.style_config.center_circle_radius,
                &self.style.tick_and_circle,
            );
        }

        for _ in 0..open_layers {
            canvas.restore();
        }

        let text_paint = self
            .style
            .tick_and_circle
            .clone()
            .with_text_size(layout.radius / 10.0);
        report.complications_drawn = complications.draw(canvas, &self.style.lump, &text_paint);
        report.animating = animating;
        report
    }

    /// Returns how many layers were opened and must be restored after the hands.
    fn draw_background(
        &self,
        canvas: &mut dyn Canvas,
        layout: &SurfaceLayout,
        background: BackgroundPlan,
        report: &mut FrameReport,
    ) -> usize {
        match background {
            BackgroundPlan::FlatFill(color) => {
                canvas.draw_color(color);
                0
            }
            BackgroundPlan::Grayscale => {
                for id in GRAYSCALE_LAYERS {
                    self.draw_layer(canvas, layout, &self.grayscale, id, report);
                }
                0
            }
            BackgroundPlan::Layered => {
                self.draw_layer(canvas, layout, &self.images, ResourceId::Cosmos, report);
                self.draw_layer(canvas, layout, &self.images, ResourceId::Bokeh, report);
                let composited = self.has_image(ResourceId::Gradient)
                    && self.has_image(ResourceId::PinkRing);
                if composited {
                    canvas.save_layer(None, &self.style.background);
                    self.draw_layer(canvas, layout, &self.images, ResourceId::Gradient, report);
                    canvas.save_layer(None, &self.style.composite);
                    self.draw_layer(canvas, layout, &self.images, ResourceId::PinkRing, report);
                    2
                } else {
                    self.draw_layer(canvas, layout, &self.images, ResourceId::Gradient, report);
                    self.draw_layer(canvas, layout, &self.images, ResourceId::PinkRing, report);
                    0
                }
            }
        }
    }

    fn draw_layer(
        &self,
        canvas: &mut dyn Canvas,
        layout: &SurfaceLayout,
        cache: &HashMap<ResourceId, Image>,
        id: ResourceId,
        report: &mut FrameReport,
    ) {
        let Some(image) = cache.get(&id) else {
            trace!("Layer {:?} skipped", id);
            report.layers_skipped.push(id);
            return;
        };
        let transform = Transform::scale(
            layout.width as f32 / image.width().max(1) as f32,
            layout.height as f32 / image.height().max(1) as f32,
        );
        canvas.draw_bitmap(image, transform, &self.style.background);
        report.layers_drawn.push(id);
    }

    fn draw_ticks(&self, canvas: &mut dyn Canvas, layout: &SurfaceLayout) {
        let outer = layout.radius;
        let inner = outer - 10.0;
        for tick in 0..12 {
            let angle = tick as f32 * 30.0;
            canvas.draw_line(
                endpoint(angle, inner, layout.center),
                endpoint(angle, outer, layout.center),
                &self.style.tick_and_circle,
            );
        }
    }

    /// Stroke, marker and upright digits of one hand. Returns whether its digits still morph.
    fn draw_hand(
        &mut self,
        canvas: &mut dyn Canvas,
        layout: &SurfaceLayout,
        field: TimeField,
        angle: f32,
        now_ms: i64,
    ) -> bool {
        let PointF { x: cx, y: cy } = layout.center;
        let (paint, length, cluster) = match field {
            TimeField::Hours => (&self.style.hour, layout.hand_lengths.hour, &mut self.hours),
            TimeField::Minutes => (&self.style.minute, layout.hand_lengths.minute, &mut self.minutes),
            TimeField::Seconds => (&self.style.second, layout.hand_lengths.second, &mut self.seconds),
        };

        canvas.save();
        canvas.rotate(angle, cx, cy);
        if self.style_config.hand_strokes {
            canvas.draw_line(layout.center, PointF::new(cx, cy - length), paint);
        }
        canvas.translate(0.0, -layout.radius * LUMP_ORBIT);
        canvas.draw_circle(layout.center, layout.radius * LUMP_RADIUS, &self.style.lump);
        // Undo the rotation around the marker so digits stay upright
        canvas.rotate(-angle, cx, cy);
        let offset = layout.radius * DIGIT_OFFSET;
        let running = cluster.render(
            canvas,
            PointF::new(cx - offset, cy),
            PointF::new(cx + offset, cy),
            now_ms,
        );
        canvas.restore();
        running
    }
}

/// Push one field's value, noting when the cluster moves to a new value.
fn push_digits(cluster: &mut DigitCluster, value: u8, now_ms: i64, animate: bool) -> bool {
    let changed = cluster.push(value, now_ms, animate);
    if changed {
        trace!("{:?} digits now {:02}", cluster.field(), value);
    }
    changed
}
