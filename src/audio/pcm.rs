use std::sync::Arc;

use crate::foundation::error::{ReelError, ReelResult};

/// Sample rate the narration synthesizer always emits.
pub const NARRATION_SAMPLE_RATE: u32 = 24_000;

/// Decoded mono narration. Its duration bounds the whole production.
#[derive(Clone, Debug)]
pub struct NarrationAudio {
    pub sample_rate: u32,
    /// Mono samples normalized to `[-1.0, 1.0]`.
    pub samples: Arc<Vec<f32>>,
}

impl NarrationAudio {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Decode signed 16-bit little-endian mono PCM.
///
/// A dangling odd byte is dropped. An empty result means synthesis failed upstream and is
/// reported as [`ReelError::FatalInput`].
pub fn decode_pcm_s16le(bytes: &[u8], sample_rate: u32) -> ReelResult<NarrationAudio> {
    if sample_rate == 0 {
        return Err(ReelError::validation("narration sample rate must be > 0"));
    }

    let even_len = bytes.len() - (bytes.len() % 2);
    let samples = bytes[..even_len]
        .chunks_exact(2)
        .map(|c| f32::from(i16::from_le_bytes([c[0], c[1]])) / 32768.0)
        .collect::<Vec<_>>();

    let audio = NarrationAudio {
        sample_rate,
        samples: Arc::new(samples),
    };
    if audio.duration_secs() <= 0.0 {
        return Err(ReelError::fatal_input(
            "narration audio has zero duration (voice generation failed)",
        ));
    }
    Ok(audio)
}

#[cfg(test)]
#[path = "../../tests/unit/audio/pcm.rs"]
mod tests;
