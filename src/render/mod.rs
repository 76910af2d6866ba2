//! CPU compositing of clip layers, the legibility overlay, and kinetic captions.

pub mod cpu;
pub mod text;

/// One rendered output frame, tightly packed row-major RGBA8.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

pub use cpu::{ClipLayer, FrameCompositor, OVERLAY_STOPS};
pub use text::{CaptionFont, CaptionTypesetter};
