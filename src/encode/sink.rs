use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::FrameRGBA;

/// Interleaved f32 audio layout of the windows passed with each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Configuration provided to an [`EncoderSink`] before the first frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    /// Target video bit rate in bits per second.
    pub video_bitrate: u32,
    pub audio: AudioFormat,
}

impl SinkConfig {
    pub fn validate(&self) -> ReelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::validation("sink width/height must be non-zero"));
        }
        if self.video_bitrate == 0 {
            return Err(ReelError::validation("sink video bitrate must be non-zero"));
        }
        if self.audio.sample_rate == 0 || self.audio.channels == 0 {
            return Err(ReelError::validation(
                "sink audio sample_rate/channels must be non-zero",
            ));
        }
        Ok(())
    }
}

/// Consumes frames with the mixed audio produced since the previous frame.
///
/// Ordering contract: `push_frame` is called with consecutive `FrameIndex` values from 0, one per
/// `1/fps` tick. The concatenation of all audio windows is the contiguous mix from time zero.
pub trait EncoderSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()>;
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA, audio: &[f32]) -> ReelResult<()>;
    /// Finalize and return the encoded byte stream.
    fn finish(&mut self) -> ReelResult<Vec<u8>>;
}

/// Records everything it receives; `finish` returns the raw frames back to back.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    audio: Vec<f32>,
    window_lens: Vec<usize>,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    /// Every audio sample received, in order.
    pub fn audio(&self) -> &[f32] {
        &self.audio
    }

    /// Length of each per-frame audio window.
    pub fn window_lens(&self) -> &[usize] {
        &self.window_lens
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl EncoderSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        cfg.validate()?;
        self.cfg = Some(cfg);
        self.frames.clear();
        self.audio.clear();
        self.window_lens.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA, audio: &[f32]) -> ReelResult<()> {
        if self.cfg.is_none() {
            return Err(ReelError::encode("in-memory sink not started"));
        }
        if let Some((last, _)) = self.frames.last()
            && idx <= *last
        {
            return Err(ReelError::encode("sink received out-of-order frame index"));
        }
        self.frames.push((idx, frame.clone()));
        self.audio.extend_from_slice(audio);
        self.window_lens.push(audio.len());
        Ok(())
    }

    fn finish(&mut self) -> ReelResult<Vec<u8>> {
        if self.cfg.is_none() {
            return Err(ReelError::encode("in-memory sink not started"));
        }
        self.finished = true;
        Ok(self
            .frames
            .iter()
            .flat_map(|(_, f)| f.data.iter().copied())
            .collect())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
