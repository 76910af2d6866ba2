//! Reelsmith composes vertical short-form videos from a narration track, stock clips and a
//! script.
//!
//! The engine is session-oriented:
//!
//! - Prepare a [`ShortSession`] from a [`Script`], raw narration PCM and clip locators
//! - Run it against a [`FrameClock`] into an [`EncoderSink`], or preview single frames
//! - Or drive the whole production flow with [`produce_short`]
#![forbid(unsafe_code)]

pub mod animation;
pub mod assets;
pub mod audio;
pub mod captions;
pub mod config;
pub mod effects;
pub mod encode;
pub mod foundation;
pub mod pipeline;
pub mod render;
pub mod script;
pub mod session;

pub use crate::foundation::core::{Affine, Canvas, Fps, FrameIndex, Point, Rect, Rgba8, Vec2};
pub use crate::foundation::error::{ReelError, ReelResult, UpstreamStage};

pub use crate::assets::clips::{ClipOpener, ClipSource, FfmpegClipOpener, SolidClip};
pub use crate::audio::music::{FfmpegTrackLoader, MusicLibrary, MusicStatus, TrackLoader};
pub use crate::captions::timing::{CaptionWord, active_caption, allocate_captions};
pub use crate::config::RenderConfig;
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{EncoderSink, InMemorySink, SinkConfig};
pub use crate::pipeline::{
    FallbackFootage, FootageProvider, NarrationSynthesizer, PipelineStatus, ProducedShort,
    Providers, ScriptProvider, ShortRequest, Uploader, produce_short,
};
pub use crate::render::{CaptionFont, CaptionTypesetter, FrameRGBA};
pub use crate::script::{Mood, Script};
pub use crate::session::clock::{FrameClock, RealtimeClock, VirtualClock};
pub use crate::session::control::{CancelToken, NoProgress, ProgressSink};
pub use crate::session::render_loop::{
    Collaborators, RenderInputs, RenderOutput, RenderReport, ShortSession, render_short,
};
