//! # Error Types
//!
//! Every fallible library call returns [`FaceError`]. Most failures in the face are
//! recoverable and never reach this type at all: an image that fails to decode simply
//! drops its layer from the frame. What remains here are the failures a host must see:
//! configuration problems and a digit-glyph renderer that cannot be built.

use crate::image::ResourceId;
use std::io;
use thiserror::Error;

/// Errors that can occur while configuring or constructing the face.
#[derive(Error, Debug)]
pub enum FaceError {
    /// An image resource could not be decoded, scaled or converted.
    ///
    /// The engine treats this as "layer unavailable"; it is logged and the layer skipped.
    #[error("image resource {0:?} unavailable: {1}")]
    ResourceUnavailable(ResourceId, String),

    /// The digit glyph renderer was declared with an unusable stroke paint or box size.
    ///
    /// Rendering cannot proceed without a correct glyph paint, so this aborts construction.
    #[error("digit glyph configuration error: {0}")]
    GlyphConfig(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An image with no pixels was asked to be resampled.
    #[error("cannot scale a {0}x{1} image to {2}x{3}")]
    EmptyImage(u32, u32, u32, u32),

    /// The surface reported by the host cannot be drawn on.
    #[error("surface size {0}x{1} is not drawable")]
    InvalidSurface(u32, u32),

    /// Config file operations failed (permissions, missing directory)
    #[error("config IO: {0}")]
    Io(#[from] io::Error),

    /// Config file contents are not valid TOML for [`crate::config::FaceConfig`]
    #[error("config parse: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be serialized back to TOML
    #[error("config serialize: {0}")]
    Serialize(#[from] toml::ser::Error),
}
