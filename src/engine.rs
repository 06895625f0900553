//! # Watch Face Engine
//!
//! [`Engine`] is the one object a host drives. It owns the mode state, the frame
//! scheduler, the render pipeline and the complication slots, and it is only ever called
//! from one thread: notifications, timer ticks and frame renders never overlap.
//!
//! ## Host Contract
//! - Forward every platform notification to the matching `on_*` method
//! - When the [`PlatformTimer`] fires, call [`Engine::on_timer_fired`]
//! - Before painting, call [`Engine::take_redraw_request`]; any number of
//!   [`Engine::invalidate`] calls between two paints coalesce into one
//! - Call [`Engine::destroy`] once at teardown

use log::{debug, info};

use crate::canvas::{Canvas, RectF};
use crate::complication::{ComplicationData, ComplicationSet};
use crate::config::FaceConfig;
use crate::error::FaceError;
use crate::image::ImageLoader;
use crate::mode::{ModeState, Transition};
use crate::pipeline::{FrameReport, RenderPipeline};
use crate::scheduler::{FrameScheduler, PlatformTimer};
use crate::time::{Clock, TimeSample};

/// Host "do not disturb" level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterruptionFilter {
    All,
    Priority,
    Alarms,
    /// Nothing interrupts; the face dims its hands
    None,
}

/// Touch gesture stage reported by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapType {
    Touch,
    TouchCancel,
    Tap,
}

/// The watch face, driven by explicit host calls.
#[derive(Debug)]
pub struct Engine<C: Clock, T: PlatformTimer, L: ImageLoader> {
    clock: C,
    loader: L,
    mode: ModeState,
    scheduler: FrameScheduler<T>,
    pipeline: RenderPipeline,
    complications: ComplicationSet,
    redraw_requested: bool,
    listening_timezone: bool,
    destroyed: bool,
}

impl<C: Clock, T: PlatformTimer, L: ImageLoader> Engine<C, T, L> {
    pub fn new(config: &FaceConfig, clock: C, timer: T, loader: L) -> Result<Self, FaceError> {
        config.validate()?;
        Ok(Self {
            clock,
            loader,
            mode: ModeState::new(),
            scheduler: FrameScheduler::new(timer),
            pipeline: RenderPipeline::new(config),
            complications: ComplicationSet::new(),
            redraw_requested: false,
            listening_timezone: false,
            destroyed: false,
        })
    }

    pub fn mode(&self) -> &ModeState {
        &self.mode
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    pub fn complications(&self) -> &ComplicationSet {
        &self.complications
    }

    pub fn scheduler(&self) -> &FrameScheduler<T> {
        &self.scheduler
    }

    pub fn timer_mut(&mut self) -> &mut T {
        self.scheduler.timer_mut()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Whether timezone change notifications are currently honored.
    pub fn is_listening_for_timezone(&self) -> bool {
        self.listening_timezone
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Rebuild every size-derived cache.
    pub fn on_surface_size_changed(&mut self, width: u32, height: u32) -> Result<(), FaceError> {
        let want_grayscale = !(self.mode.low_bit_ambient() || self.mode.burn_in_protection());
        self.pipeline
            .on_surface_changed(width, height, &self.loader, want_grayscale)?;
        self.complications
            .layout(width as f32 / 2.0, height as f32 / 2.0);
        self.invalidate();
        Ok(())
    }

    pub fn on_properties_changed(&mut self, low_bit_ambient: bool, burn_in_protection: bool) {
        let transition = self.mode.set_properties(low_bit_ambient, burn_in_protection);
        self.apply(transition);
    }

    pub fn on_ambient_mode_changed(&mut self, ambient: bool) {
        info!("Ambient mode {}", if ambient { "on" } else { "off" });
        let transition = self.mode.set_ambient(ambient);
        self.apply(transition);
    }

    pub fn on_visibility_changed(&mut self, visible: bool) {
        debug!("Visibility changed: {}", visible);
        let transition = self.mode.set_visible(visible);
        self.apply(transition);
    }

    pub fn on_mute_changed(&mut self, muted: bool) {
        let transition = self.mode.set_muted(muted);
        self.apply(transition);
    }

    pub fn on_interruption_filter_changed(&mut self, filter: InterruptionFilter) {
        self.on_mute_changed(filter == InterruptionFilter::None);
    }

    /// Taps carry no behavior yet; the face just repaints.
    pub fn on_tap_event(&mut self, tap: TapType, x: i32, y: i32) {
        debug!("Tap {:?} at ({}, {})", tap, x, y);
        self.invalidate();
    }

    pub fn on_peek_card_bounds_changed(&mut self, bounds: RectF) {
        let transition = self.mode.set_peek_card_bounds(bounds);
        self.apply(transition);
    }

    pub fn on_complication_data_update(&mut self, id: u32, data: ComplicationData) {
        if self.complications.on_data_update(id, data) {
            self.invalidate();
        }
    }

    /// Only honored while visible.
    pub fn on_time_zone_changed(&mut self) {
        if !self.listening_timezone {
            debug!("Ignoring timezone change while not listening");
            return;
        }
        self.clock.refresh_timezone();
        info!("Timezone refreshed to {}", self.clock.offset());
        self.invalidate();
    }

    /// The host's once-a-minute tick.
    pub fn on_time_tick(&mut self) {
        self.invalidate();
    }

    pub fn on_timer_fired(&mut self) {
        let now = self.clock.now_millis();
        if self.scheduler.on_tick(now, self.mode.timer_should_run()) {
            self.invalidate();
        }
    }

    /// Draw one frame with the current state. Requests another frame while digits morph.
    pub fn render_frame(&mut self, canvas: &mut dyn Canvas, bounds: RectF) -> FrameReport {
        let now = self.clock.now_millis();
        let sample = TimeSample::from_epoch_millis(now, self.clock.offset());
        let report = self.pipeline.render(
            canvas,
            bounds,
            &self.mode,
            &sample,
            now,
            &self.complications,
        );
        if report.animating {
            self.invalidate();
        }
        report
    }

    /// Ask for a repaint. Requests coalesce until [`Engine::take_redraw_request`].
    pub fn invalidate(&mut self) {
        if !self.destroyed {
            self.redraw_requested = true;
        }
    }

    pub fn redraw_requested(&self) -> bool {
        self.redraw_requested
    }

    /// Read and clear the pending redraw request.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    /// Stop the timer and timezone listening for good.
    pub fn destroy(&mut self) {
        info!("Engine destroyed");
        self.scheduler.shutdown();
        self.listening_timezone = false;
        self.redraw_requested = false;
        self.destroyed = true;
    }

    fn apply(&mut self, transition: Transition) {
        if transition.restyle {
            self.pipeline
                .restyle(self.mode.is_ambient(), self.mode.is_muted());
        }
        if let Some(listen) = transition.listen_timezone {
            self.listening_timezone = listen && !self.destroyed;
        }
        if transition.refresh_timezone {
            self.clock.refresh_timezone();
        }
        if transition.rearm {
            self.scheduler.rearm(self.mode.timer_should_run());
        }
        if transition.redraw {
            self.invalidate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::RecordingCanvas;
    use crate::image::ProceduralImageLoader;
    use crate::scheduler::ManualTimer;
    use crate::time::ManualClock;
    use chrono::FixedOffset;
    use std::time::Duration;

    type TestEngine = Engine<ManualClock, ManualTimer, ProceduralImageLoader>;

    fn engine() -> TestEngine {
        Engine::new(
            &FaceConfig::default(),
            ManualClock::at_hms_milli(10, 10, 30, 250),
            ManualTimer::new(),
            ProceduralImageLoader::new(16),
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = FaceConfig::default();
        config.animation.digit_tween_ms = 0;
        let result = Engine::new(
            &config,
            ManualClock::new(0),
            ManualTimer::new(),
            ProceduralImageLoader::new(4),
        );
        assert!(matches!(result, Err(FaceError::Config(_))));
    }

    #[test]
    fn test_becoming_visible_arms_timer_and_redraws() {
        let mut engine = engine();
        engine.on_visibility_changed(true);
        assert!(engine.scheduler().is_armed());
        assert_eq!(engine.scheduler().timer().pending_count(), 1);
        assert!(engine.is_listening_for_timezone());
        assert!(engine.take_redraw_request());
        assert!(!engine.take_redraw_request());
    }

    #[test]
    fn test_timer_fire_reschedules_on_second_boundary() {
        let mut engine = engine();
        engine.on_visibility_changed(true);
        engine.take_redraw_request();
        assert!(engine.timer_mut().fire());
        engine.on_timer_fired();
        assert!(engine.take_redraw_request());
        assert_eq!(
            engine.scheduler().timer().pending_delay(),
            Some(Duration::from_millis(750))
        );
    }

    #[test]
    fn test_ambient_disarms_and_back_rearms() {
        let mut engine = engine();
        engine.on_visibility_changed(true);
        engine.on_ambient_mode_changed(true);
        assert!(!engine.scheduler().is_armed());
        assert_eq!(engine.scheduler().timer().pending_count(), 0);
        engine.on_ambient_mode_changed(false);
        assert_eq!(engine.scheduler().timer().pending_count(), 1);
    }

    #[test]
    fn test_mute_redraws_without_touching_timer() {
        let mut engine = engine();
        engine.on_visibility_changed(true);
        engine.take_redraw_request();
        let scheduled = engine.scheduler().timer().scheduled_total();
        engine.on_interruption_filter_changed(InterruptionFilter::None);
        assert!(engine.mode().is_muted());
        assert!(engine.take_redraw_request());
        assert_eq!(engine.scheduler().timer().scheduled_total(), scheduled);
        assert_eq!(engine.pipeline().style().hour.color.alpha(), 100);
        engine.on_interruption_filter_changed(InterruptionFilter::All);
        assert_eq!(engine.pipeline().style().hour.color.alpha(), 255);
        // Only a filter that lets nothing through mutes the face
        for filter in [InterruptionFilter::Priority, InterruptionFilter::Alarms] {
            engine.on_interruption_filter_changed(filter);
            assert!(!engine.mode().is_muted());
        }
    }

    #[test]
    fn test_timezone_changes_only_while_visible() {
        let mut engine = engine();
        let plus_one = FixedOffset::east_opt(3600).unwrap();
        engine.clock_mut().set_system_offset(plus_one);
        engine.on_time_zone_changed();
        assert_ne!(engine.clock().offset(), plus_one);

        engine.on_visibility_changed(true);
        assert_eq!(engine.clock().offset(), plus_one);

        let plus_two = FixedOffset::east_opt(7200).unwrap();
        engine.clock_mut().set_system_offset(plus_two);
        engine.take_redraw_request();
        engine.on_time_zone_changed();
        assert_eq!(engine.clock().offset(), plus_two);
        assert!(engine.take_redraw_request());
    }

    #[test]
    fn test_tap_only_redraws() {
        let mut engine = engine();
        engine.on_tap_event(TapType::Tap, 10, 20);
        assert!(engine.take_redraw_request());
        assert_eq!(engine.scheduler().timer().scheduled_total(), 0);
    }

    #[test]
    fn test_peek_card_redraws_only_in_ambient() {
        let mut engine = engine();
        let card = RectF::new(0.0, 80.0, 100.0, 100.0);
        engine.on_peek_card_bounds_changed(card);
        assert!(!engine.take_redraw_request());
        assert_eq!(engine.mode().peek_card_bounds(), Some(card));

        engine.on_ambient_mode_changed(true);
        engine.take_redraw_request();
        engine.on_peek_card_bounds_changed(RectF::new(0.0, 0.0, 0.0, 0.0));
        assert!(engine.take_redraw_request());
        assert_eq!(engine.mode().peek_card_bounds(), None);
    }

    #[test]
    fn test_surface_change_lays_out_complications() {
        let mut engine = engine();
        engine.on_surface_size_changed(200, 200).unwrap();
        let region = engine.complications().slots()[0].region;
        assert!((region.width() - 40.0).abs() < 1e-3);
        let layout = engine.pipeline().layout().unwrap();
        assert_eq!((layout.width, layout.height), (200, 200));
        assert_eq!(layout.radius, 100.0);
        assert!(engine.take_redraw_request());
    }

    #[test]
    fn test_render_before_surface_is_skipped() {
        let mut engine = engine();
        let mut canvas = RecordingCanvas::new();
        let report = engine.render_frame(&mut canvas, RectF::new(0.0, 0.0, 10.0, 10.0));
        assert!(report.skipped);
    }

    #[test]
    fn test_destroy_stops_everything() {
        let mut engine = engine();
        engine.on_visibility_changed(true);
        assert!(!engine.is_destroyed());
        engine.destroy();
        assert!(engine.is_destroyed());
        assert_eq!(engine.scheduler().timer().pending_count(), 0);
        engine.on_ambient_mode_changed(true);
        engine.on_ambient_mode_changed(false);
        assert_eq!(engine.scheduler().timer().pending_count(), 0);
        assert!(!engine.take_redraw_request());
        assert!(!engine.is_listening_for_timezone());
    }
}
