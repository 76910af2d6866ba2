use std::path::{Path, PathBuf};

use crate::{
    audio::{mix::MIX_SAMPLE_RATE, music::MusicLibrary, pcm::NARRATION_SAMPLE_RATE},
    captions::style::CaptionStyle,
    foundation::core::{Canvas, Fps},
    foundation::error::{ReelError, ReelResult},
};

/// Engine settings. Every field has a default, so partial JSON files are valid.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub canvas: Canvas,
    pub fps: u32,
    /// Target video bit rate in bits per second.
    pub video_bitrate: u32,
    pub clip_duration_secs: f64,
    pub transition_secs: f64,
    /// Time rendered past the end of the narration.
    pub tail_secs: f64,
    pub clip_ready_timeout_ms: u64,
    pub narration_sample_rate: u32,
    pub mix_sample_rate: u32,
    pub narration_gain: f32,
    pub music_gain: f32,
    pub music_enabled: bool,
    pub music: MusicLibrary,
    pub caption: CaptionStyle,
    pub caption_font: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::PORTRAIT,
            fps: 30,
            video_bitrate: 5_000_000,
            clip_duration_secs: 3.0,
            transition_secs: 0.5,
            tail_secs: 1.0,
            clip_ready_timeout_ms: 3000,
            narration_sample_rate: NARRATION_SAMPLE_RATE,
            mix_sample_rate: MIX_SAMPLE_RATE,
            narration_gain: 1.0,
            music_gain: 0.15,
            music_enabled: true,
            music: MusicLibrary::default(),
            caption: CaptionStyle::default(),
            caption_font: None,
        }
    }
}

impl RenderConfig {
    pub fn fps(&self) -> ReelResult<Fps> {
        Fps::new(self.fps, 1)
    }

    pub fn clip_ready_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.clip_ready_timeout_ms)
    }

    pub fn validate(&self) -> ReelResult<()> {
        self.canvas.validate()?;
        self.fps()?;
        if self.video_bitrate == 0 {
            return Err(ReelError::validation("video_bitrate must be > 0"));
        }
        for (name, v) in [
            ("clip_duration_secs", self.clip_duration_secs),
            ("transition_secs", self.transition_secs),
        ] {
            if !v.is_finite() || v <= 0.0 {
                return Err(ReelError::validation(format!(
                    "{name} must be finite and > 0"
                )));
            }
        }
        if self.transition_secs >= self.clip_duration_secs {
            return Err(ReelError::validation(
                "transition_secs must be shorter than clip_duration_secs",
            ));
        }
        if !self.tail_secs.is_finite() || self.tail_secs < 0.0 {
            return Err(ReelError::validation("tail_secs must be finite and >= 0"));
        }
        if self.narration_sample_rate == 0 || self.mix_sample_rate == 0 {
            return Err(ReelError::validation("sample rates must be > 0"));
        }
        for (name, g) in [
            ("narration_gain", self.narration_gain),
            ("music_gain", self.music_gain),
        ] {
            if !g.is_finite() || g < 0.0 {
                return Err(ReelError::validation(format!(
                    "{name} must be finite and >= 0"
                )));
            }
        }
        if !self.caption.font_size.is_finite() || self.caption.font_size <= 0.0 {
            return Err(ReelError::validation("caption.font_size must be > 0"));
        }
        if !self.caption.stroke_width.is_finite() || self.caption.stroke_width < 0.0 {
            return Err(ReelError::validation("caption.stroke_width must be >= 0"));
        }
        Ok(())
    }

    pub fn from_json_str(s: &str) -> ReelResult<Self> {
        let cfg: Self = serde_json::from_str(s).map_err(|e| ReelError::serde(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: &Path) -> ReelResult<Self> {
        use anyhow::Context as _;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
