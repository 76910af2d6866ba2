use std::{path::Path, sync::Arc};

use crate::{
    assets::media::AudioPcm,
    audio::pcm::NarrationAudio,
    foundation::error::{ReelError, ReelResult},
};

/// Output rate of the mix handed to the encoder.
pub const MIX_SAMPLE_RATE: u32 = 48_000;
/// Output channel count of the mix.
pub const MIX_CHANNELS: u16 = 2;

#[derive(Clone, Debug)]
struct MixSource {
    label: &'static str,
    gain: f32,
    looped: bool,
    source_sample_rate: u32,
    source_channels: u16,
    source_interleaved_f32: Arc<Vec<f32>>,
}

/// Fixed two-source routing: narration plus optional looping music into one stereo output.
///
/// The graph is wired once and consumed by [`MixGraph::start`]; it cannot be reconfigured after.
#[derive(Clone, Debug)]
pub struct MixGraph {
    sample_rate: u32,
    total_samples: u64,
    sources: Vec<MixSource>,
}

impl MixGraph {
    /// Empty graph producing `total_secs` of output at `sample_rate`.
    pub fn new(sample_rate: u32, total_secs: f64) -> ReelResult<Self> {
        if sample_rate == 0 {
            return Err(ReelError::validation("mix sample rate must be > 0"));
        }
        if !total_secs.is_finite() || total_secs <= 0.0 {
            return Err(ReelError::validation(
                "mix duration must be finite and > 0",
            ));
        }
        Ok(Self {
            sample_rate,
            total_samples: secs_to_sample(total_secs, sample_rate),
            sources: Vec::new(),
        })
    }

    /// Route the narration, played once from time zero.
    pub fn with_narration(mut self, narration: &NarrationAudio, gain: f32) -> Self {
        self.sources.push(MixSource {
            label: "narration",
            gain,
            looped: false,
            source_sample_rate: narration.sample_rate,
            source_channels: 1,
            source_interleaved_f32: narration.samples.clone(),
        });
        self
    }

    /// Route a background track, looped for the whole output.
    pub fn with_music(mut self, music: &AudioPcm, gain: f32) -> Self {
        self.sources.push(MixSource {
            label: "music",
            gain,
            looped: true,
            source_sample_rate: music.sample_rate,
            source_channels: music.channels,
            source_interleaved_f32: music.interleaved_f32.clone(),
        });
        self
    }

    pub fn has_music(&self) -> bool {
        self.sources.iter().any(|s| s.label == "music")
    }

    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    /// Start all sources at logical time zero and render the full interleaved mix.
    pub fn start(self) -> MixedAudio {
        let frames = self.total_samples as usize;
        let channels = usize::from(MIX_CHANNELS);
        let mut out = vec![0.0f32; frames * channels];

        for src in &self.sources {
            mix_source_into(&mut out, src, self.sample_rate, frames);
        }

        for s in &mut out {
            *s = s.clamp(-1.0, 1.0);
        }
        tracing::debug!(
            sources = self.sources.len(),
            frames,
            sample_rate = self.sample_rate,
            "audio mix rendered"
        );

        MixedAudio {
            sample_rate: self.sample_rate,
            channels: MIX_CHANNELS,
            interleaved_f32: out,
        }
    }
}

fn mix_source_into(out: &mut [f32], src: &MixSource, sample_rate: u32, frames: usize) {
    let data = src.source_interleaved_f32.as_ref();
    let src_channels = usize::from(src.source_channels.max(1));
    let src_frames = data.len() / src_channels;
    if src_frames == 0 || src.source_sample_rate == 0 || src.gain == 0.0 {
        return;
    }

    let step = f64::from(src.source_sample_rate) / f64::from(sample_rate);
    let channels = usize::from(MIX_CHANNELS);
    for dst_frame in 0..frames {
        let mut src_pos = dst_frame as f64 * step;
        if src.looped {
            src_pos %= src_frames as f64;
        }
        let src_frame0 = src_pos.floor() as usize;
        if src_frame0 >= src_frames {
            break;
        }
        let src_frame1 = if src.looped {
            (src_frame0 + 1) % src_frames
        } else {
            (src_frame0 + 1).min(src_frames - 1)
        };
        let frac = (src_pos - src_frame0 as f64) as f32;

        let (l, r) = if src_channels == 1 {
            let v0 = data[src_frame0];
            let v1 = data[src_frame1];
            let v = v0 + ((v1 - v0) * frac);
            (v, v)
        } else {
            let i0 = src_frame0 * src_channels;
            let i1 = src_frame1 * src_channels;
            (
                data[i0] + ((data[i1] - data[i0]) * frac),
                data[i0 + 1] + ((data[i1 + 1] - data[i0 + 1]) * frac),
            )
        };

        let dst = dst_frame * channels;
        out[dst] += l * src.gain;
        out[dst + 1] += r * src.gain;
    }
}

/// Rendered stereo mix, sliced into per-frame windows by the render loop.
#[derive(Clone, Debug)]
pub struct MixedAudio {
    pub sample_rate: u32,
    pub channels: u16,
    pub interleaved_f32: Vec<f32>,
}

impl MixedAudio {
    /// Number of sample frames (one sample per channel).
    pub fn total_frames(&self) -> u64 {
        (self.interleaved_f32.len() / usize::from(self.channels.max(1))) as u64
    }

    /// Sample-frame position for `secs`, clamped to the mix length.
    pub fn frame_at(&self, secs: f64) -> u64 {
        secs_to_sample(secs.max(0.0), self.sample_rate).min(self.total_frames())
    }

    /// Interleaved samples for sample frames `[start, end)`, clamped to the mix.
    pub fn window(&self, start: u64, end: u64) -> &[f32] {
        let total = self.total_frames();
        let start = start.min(total) as usize;
        let end = end.clamp(start as u64, total) as usize;
        let ch = usize::from(self.channels.max(1));
        &self.interleaved_f32[start * ch..end * ch]
    }
}

fn secs_to_sample(secs: f64, sample_rate: u32) -> u64 {
    (secs * f64::from(sample_rate)).round().max(0.0) as u64
}

pub fn write_mix_to_f32le_file(samples_interleaved: &[f32], out_path: &Path) -> ReelResult<()> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ReelError::encode(format!(
                "failed to create audio mix output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        ReelError::encode(format!(
            "failed to write mixed audio file '{}': {e}",
            out_path.display()
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
