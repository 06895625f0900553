//! # Lerp Face Core Library
//!
//! This library draws an analog watch face whose hands carry animated two-digit readouts.
//! It is built for small always-on displays, where the face must lower its own rendering
//! fidelity when the display drops into a battery-saving ambient mode.
//!
//! ## Design Philosophy
//!
//! ### Host-Agnostic
//! The face never touches a real display, timer or clock. Every collaborator is a trait:
//! - [`canvas::Canvas`]: the drawing surface, one frame at a time
//! - [`image::ImageLoader`]: decodes, scales and desaturates the background artwork
//! - [`scheduler::PlatformTimer`]: a one-shot timer the host fires back into the engine
//! - [`time::Clock`]: wall-clock milliseconds plus a cached timezone
//!
//! ### Single-Threaded
//! One [`Engine`] owns all state and is driven by explicit method calls from one thread.
//! Redraw requests coalesce into a flag, and the scheduler cancels before it schedules, so
//! there is never more than one tick pending.
//!
//! ### Frame Timing
//! - **Interactive**: one tick per wall-clock second, aligned to second boundaries,
//!   plus continuous frames while a digit morph is running
//! - **Ambient**: no timer at all; the host's once-a-minute tick repaints the face
//!
//! ## Module Map
//! - [`geometry`]: time → hand angles and endpoints
//! - [`tween`], [`glyph`], [`cluster`]: animated Bézier digit readouts
//! - [`mode`]: ambient/interactive state machine and paint derivation
//! - [`scheduler`]: second-aligned self-rearming timer
//! - [`complication`]: the two short-text dials
//! - [`pipeline`]: one frame, in compositing order
//! - [`engine`]: the host-facing entry point
//! - [`raster`]: an `embedded-graphics` backed canvas for real pixels

pub mod canvas;
pub mod cluster;
pub mod complication;
pub mod config;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod glyph;
pub mod image;
pub mod mode;
pub mod pipeline;
pub mod raster;
pub mod scheduler;
pub mod time;
pub mod tween;

pub use canvas::{Canvas, Color, Paint, PointF, RecordingCanvas, RectF};
pub use complication::{ComplicationData, ComplicationKind};
pub use config::FaceConfig;
pub use engine::{Engine, InterruptionFilter, TapType};
pub use error::FaceError;
pub use geometry::HandAngles;
pub use pipeline::{BackgroundPlan, FramePlan, FrameReport};
pub use time::TimeSample;
