use std::{collections::BTreeMap, ffi::OsStr};

use crate::{
    assets::media::{self, AudioPcm},
    foundation::error::{ReelError, ReelResult},
    script::Mood,
};

/// Built-in mood → background track table.
pub const DEFAULT_TRACKS: [(Mood, &str); 4] = [
    (
        Mood::Energetic,
        "https://cdn.pixabay.com/download/audio/2022/05/27/audio_1808fbf07a.mp3",
    ),
    (
        Mood::Scary,
        "https://cdn.pixabay.com/download/audio/2022/01/18/audio_d0a13f69d2.mp3",
    ),
    (
        Mood::Dramatic,
        "https://cdn.pixabay.com/download/audio/2022/03/24/audio_344db72820.mp3",
    ),
    (
        Mood::Calm,
        "https://cdn.pixabay.com/download/audio/2022/05/17/audio_370213d2f3.mp3",
    ),
];

/// Mood → track locator table with an energetic fallback.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct MusicLibrary {
    tracks: BTreeMap<Mood, String>,
}

impl Default for MusicLibrary {
    fn default() -> Self {
        Self {
            tracks: DEFAULT_TRACKS
                .iter()
                .map(|(m, url)| (*m, (*url).to_string()))
                .collect(),
        }
    }
}

impl MusicLibrary {
    pub fn empty() -> Self {
        Self {
            tracks: BTreeMap::new(),
        }
    }

    pub fn with_track(mut self, mood: Mood, locator: impl Into<String>) -> Self {
        self.tracks.insert(mood, locator.into());
        self
    }

    /// Locator for `mood`, falling back to the energetic track when unmapped.
    pub fn track_for(&self, mood: Mood) -> Option<&str> {
        self.tracks
            .get(&mood)
            .or_else(|| self.tracks.get(&Mood::Energetic))
            .map(String::as_str)
    }
}

/// Fetches and decodes a background track to interleaved stereo f32 at `sample_rate`.
pub trait TrackLoader {
    fn load(&self, locator: &str, sample_rate: u32) -> ReelResult<AudioPcm>;
}

impl<F> TrackLoader for F
where
    F: Fn(&str, u32) -> ReelResult<AudioPcm>,
{
    fn load(&self, locator: &str, sample_rate: u32) -> ReelResult<AudioPcm> {
        self(locator, sample_rate)
    }
}

/// Decodes through the system `ffmpeg`, which also handles http(s) locators.
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegTrackLoader;

impl TrackLoader for FfmpegTrackLoader {
    fn load(&self, locator: &str, sample_rate: u32) -> ReelResult<AudioPcm> {
        media::decode_audio_f32_stereo(OsStr::new(locator), sample_rate)
    }
}

/// Outcome of background music selection, reported alongside the render.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MusicStatus {
    /// Music turned off by configuration.
    Disabled,
    Loaded { mood: Mood, locator: String },
    /// Fetch or decode failed; the render continues with narration only.
    Unavailable {
        locator: Option<String>,
        reason: String,
    },
}

impl MusicStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

/// Resolve and load the track for `mood`. Never fails: problems become [`MusicStatus::Unavailable`].
pub fn load_background_music(
    library: &MusicLibrary,
    loader: &dyn TrackLoader,
    mood: Mood,
    sample_rate: u32,
) -> (Option<AudioPcm>, MusicStatus) {
    let Some(locator) = library.track_for(mood) else {
        tracing::warn!(%mood, "no background track configured");
        return (
            None,
            MusicStatus::Unavailable {
                locator: None,
                reason: "no track configured".to_string(),
            },
        );
    };

    let loaded = loader.load(locator, sample_rate).and_then(|pcm| {
        if pcm.frames() == 0 {
            Err(ReelError::media("background track decoded to zero samples"))
        } else {
            Ok(pcm)
        }
    });

    match loaded {
        Ok(pcm) => {
            tracing::debug!(%mood, locator, frames = pcm.frames(), "background music loaded");
            (
                Some(pcm),
                MusicStatus::Loaded {
                    mood,
                    locator: locator.to_string(),
                },
            )
        }
        Err(e) => {
            tracing::warn!(%mood, locator, error = %e, "no music loaded");
            (
                None,
                MusicStatus::Unavailable {
                    locator: Some(locator.to_string()),
                    reason: e.to_string(),
                },
            )
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/music.rs"]
mod tests;
