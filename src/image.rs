//! # Image Service
//!
//! Bitmap decoding is owned by the host; the face only needs an [`ImageLoader`] that can
//! hand back an [`Image`] per [`ResourceId`], scale it and desaturate it. Every one of
//! those steps may fail, and a failure only removes the affected layer from the frame.
//!
//! [`ProceduralImageLoader`] synthesizes the four face resources so the demo host and
//! tests run without any image files.

use serde::Serialize;

use crate::canvas::Color;
use crate::error::FaceError;

/// The bitmap resources a full-color frame is composed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceId {
    /// Base photographic background
    Cosmos,
    /// Soft-focus overlay drawn over the base
    Bokeh,
    /// Color gradient that tints the ring through destination-atop compositing
    Gradient,
    /// Ring artwork; also the source of the ambient grayscale background
    PinkRing,
}

impl ResourceId {
    pub const ALL: [ResourceId; 4] = [
        ResourceId::Cosmos,
        ResourceId::Bokeh,
        ResourceId::Gradient,
        ResourceId::PinkRing,
    ];
}

/// An ARGB raster, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Image {
    /// Wrap `pixels`; `None` when the buffer does not match `width × height`.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> Option<Self> {
        (pixels.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self {
            width,
            height,
            pixels: vec![color.0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        Color(self.pixels[(y * self.width + x) as usize])
    }

    /// No pixels at all; such an image cannot be sampled or scaled.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Nearest-neighbour resample to `width × height`. `None` if either side is empty.
    pub fn scaled(&self, width: u32, height: u32) -> Option<Image> {
        if self.is_empty() || width == 0 || height == 0 {
            return None;
        }
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            let src_y = (y as u64 * self.height as u64 / height as u64) as u32;
            for x in 0..width {
                let src_x = (x as u64 * self.width as u64 / width as u64) as u32;
                pixels.push(self.pixel(src_x, src_y).0);
            }
        }
        Some(Image {
            width,
            height,
            pixels,
        })
    }

    /// Saturation-zero copy, alpha preserved.
    pub fn grayscale(&self) -> Image {
        let pixels = self
            .pixels
            .iter()
            .map(|&argb| {
                let color = Color(argb);
                let luma = 0.213 * color.red() as f32
                    + 0.715 * color.green() as f32
                    + 0.072 * color.blue() as f32;
                let level = luma.round().clamp(0.0, 255.0) as u8;
                Color::from_argb(color.alpha(), level, level, level).0
            })
            .collect();
        Image {
            width: self.width,
            height: self.height,
            pixels,
        }
    }
}

/// Source of face bitmaps.
///
/// Only [`ImageLoader::decode`] is required; scaling and grayscale conversion default to
/// the in-crate implementations on [`Image`].
pub trait ImageLoader {
    fn decode(&self, id: ResourceId) -> Result<Image, FaceError>;

    fn scale(&self, image: &Image, width: u32, height: u32) -> Result<Image, FaceError> {
        image
            .scaled(width, height)
            .ok_or(FaceError::EmptyImage(image.width(), image.height(), width, height))
    }

    fn to_grayscale(&self, image: &Image) -> Result<Image, FaceError> {
        Ok(image.grayscale())
    }
}

/// Generates the face artwork mathematically at a fixed square resolution.
#[derive(Clone, Debug)]
pub struct ProceduralImageLoader {
    size: u32,
    missing: Vec<ResourceId>,
}

impl ProceduralImageLoader {
    pub fn new(size: u32) -> Self {
        Self {
            size: size.max(1),
            missing: Vec::new(),
        }
    }

    /// Make `id` fail to decode, as a corrupt or absent resource would.
    pub fn without(mut self, id: ResourceId) -> Self {
        self.missing.push(id);
        self
    }

    fn render(&self, id: ResourceId) -> Image {
        let size = self.size;
        let half = size as f32 / 2.0;
        let mut pixels = Vec::with_capacity(size as usize * size as usize);
        for y in 0..size {
            for x in 0..size {
                let nx = (x as f32 + 0.5 - half) / half;
                let ny = (y as f32 + 0.5 - half) / half;
                let color = match id {
                    ResourceId::Cosmos => cosmos_pixel(x, y, y as f32 / size as f32),
                    ResourceId::Bokeh => bokeh_pixel(nx, ny),
                    ResourceId::Gradient => gradient_pixel(nx, ny),
                    ResourceId::PinkRing => ring_pixel(nx, ny),
                };
                pixels.push(color.0);
            }
        }
        Image {
            width: size,
            height: size,
            pixels,
        }
    }
}

impl ImageLoader for ProceduralImageLoader {
    fn decode(&self, id: ResourceId) -> Result<Image, FaceError> {
        if self.missing.contains(&id) {
            return Err(FaceError::ResourceUnavailable(
                id,
                "resource not bundled".to_string(),
            ));
        }
        Ok(self.render(id))
    }
}

fn star_hash(x: u32, y: u32) -> u32 {
    let mut h = x.wrapping_mul(73_856_093) ^ y.wrapping_mul(19_349_663);
    h ^= h >> 13;
    h.wrapping_mul(0x5bd1_e995)
}

fn cosmos_pixel(x: u32, y: u32, depth: f32) -> Color {
    if star_hash(x, y) % 89 == 0 {
        return Color::from_argb(0xFF, 0xF0, 0xF0, 0xFF);
    }
    let r = (18.0 + 40.0 * depth) as u8;
    let b = (60.0 - 30.0 * depth) as u8;
    Color::from_argb(0xFF, r, 8, b)
}

fn bokeh_pixel(nx: f32, ny: f32) -> Color {
    const SPOTS: [(f32, f32, f32); 4] = [
        (-0.45, -0.35, 0.22),
        (0.5, -0.1, 0.16),
        (-0.1, 0.55, 0.2),
        (0.35, 0.45, 0.12),
    ];
    let coverage = SPOTS
        .iter()
        .map(|&(cx, cy, r)| {
            let d = ((nx - cx).powi(2) + (ny - cy).powi(2)).sqrt();
            (1.0 - d / r).clamp(0.0, 1.0)
        })
        .fold(0.0_f32, f32::max);
    Color::from_argb((coverage * 110.0) as u8, 0xFF, 0xB8, 0xE0)
}

fn gradient_pixel(nx: f32, ny: f32) -> Color {
    let t = ((nx + ny) / 4.0 + 0.5).clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t) as u8;
    Color::from_argb(0xFF, lerp(0xC5, 0xF3), lerp(0x3C, 0x9C), lerp(0x91, 0x4A))
}

fn ring_pixel(nx: f32, ny: f32) -> Color {
    let d = (nx * nx + ny * ny).sqrt();
    let edge = (0.1 - (d - 0.88).abs()) / 0.03;
    let alpha = (edge.clamp(0.0, 1.0) * 255.0) as u8;
    Color::from_argb(alpha, 0xFF, 0xD6, 0xEC)
}
