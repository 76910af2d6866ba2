//! End-to-end production of one short: script, footage, narration, render, upload.
//!
//! Every external service sits behind a trait so hosts can plug in their own clients. Provider
//! failures surface as [`ReelError::Upstream`] tagged with the failing stage; nothing is retried.

pub mod footage;

pub use footage::{FALLBACK_FOOTAGE, FallbackFootage, FootageProvider, NoFootageSearch};

use crate::{
    assets::clips::ClipOpener,
    audio::music::TrackLoader,
    config::RenderConfig,
    encode::sink::EncoderSink,
    foundation::error::{ReelError, ReelResult, UpstreamStage},
    render::text::CaptionFont,
    script::Script,
    session::{
        clock::FrameClock,
        control::{CancelToken, ProgressSink, announce},
        render_loop::{Collaborators, RenderInputs, RenderReport, render_short},
    },
};

/// Script generation for a niche and target language.
pub trait ScriptProvider {
    fn generate(&self, niche: &str, language: &str) -> anyhow::Result<Script>;
}

impl<F> ScriptProvider for F
where
    F: Fn(&str, &str) -> anyhow::Result<Script>,
{
    fn generate(&self, niche: &str, language: &str) -> anyhow::Result<Script> {
        self(niche, language)
    }
}

/// Text to speech. Output is 24 kHz mono signed 16-bit little-endian PCM.
pub trait NarrationSynthesizer {
    fn synthesize(&self, text: &str) -> anyhow::Result<Vec<u8>>;
}

impl<F> NarrationSynthesizer for F
where
    F: Fn(&str) -> anyhow::Result<Vec<u8>>,
{
    fn synthesize(&self, text: &str) -> anyhow::Result<Vec<u8>> {
        self(text)
    }
}

/// Metadata published alongside the finished video.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct UploadMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

impl UploadMetadata {
    pub fn from_script(script: &Script) -> Self {
        Self {
            title: script.title.clone(),
            description: script.description.clone(),
            tags: script.tags.clone(),
        }
    }
}

/// Delivery of the encoded video. Returns an identifier for the published item.
pub trait Uploader {
    fn upload(&self, video: &[u8], metadata: &UploadMetadata) -> anyhow::Result<String>;
}

impl<F> Uploader for F
where
    F: Fn(&[u8], &UploadMetadata) -> anyhow::Result<String>,
{
    fn upload(&self, video: &[u8], metadata: &UploadMetadata) -> anyhow::Result<String> {
        self(video, metadata)
    }
}

/// Coarse stage of a production run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStatus {
    Idle,
    GeneratingScript,
    FetchingVideos,
    GeneratingVoiceover,
    RenderingVideo,
    Uploading,
    Completed,
    Error,
}

impl PipelineStatus {
    /// `true` once a run can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

/// Receives every [`PipelineStatus`] transition.
pub trait StatusObserver {
    fn on_status(&mut self, status: PipelineStatus);
}

impl<F> StatusObserver for F
where
    F: FnMut(PipelineStatus),
{
    fn on_status(&mut self, status: PipelineStatus) {
        self(status)
    }
}

/// What to produce.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShortRequest {
    pub niche: String,
    pub language: String,
    /// Passed to the footage provider. `None` typically means fallback footage.
    pub footage_credential: Option<String>,
}

impl ShortRequest {
    pub fn new(niche: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            niche: niche.into(),
            language: language.into(),
            footage_credential: None,
        }
    }

    pub fn with_footage_credential(mut self, credential: impl Into<String>) -> Self {
        self.footage_credential = Some(credential.into());
        self
    }
}

/// External services plus the render backend for one run.
pub struct Providers<'a> {
    pub script: &'a dyn ScriptProvider,
    pub footage: &'a dyn FootageProvider,
    pub narration: &'a dyn NarrationSynthesizer,
    pub uploader: &'a dyn Uploader,
    pub clips: &'a dyn ClipOpener,
    pub music: &'a dyn TrackLoader,
    pub caption_font: CaptionFont,
    pub clock: &'a mut dyn FrameClock,
    pub sink: &'a mut dyn EncoderSink,
    pub status: Option<&'a mut dyn StatusObserver>,
}

/// Result of a completed production run.
#[derive(Debug)]
pub struct ProducedShort {
    pub script: Script,
    pub clip_locators: Vec<String>,
    pub report: RenderReport,
    /// Identifier returned by the uploader.
    pub delivery: String,
}

struct StatusTracker<'a> {
    observer: Option<&'a mut dyn StatusObserver>,
}

impl StatusTracker<'_> {
    fn set(&mut self, status: PipelineStatus) {
        tracing::debug!(?status, "pipeline status");
        if let Some(observer) = self.observer.as_deref_mut() {
            observer.on_status(status);
        }
    }
}

fn check_cancel(cancel: &CancelToken) -> ReelResult<()> {
    if cancel.is_cancelled() {
        return Err(ReelError::Cancelled);
    }
    Ok(())
}

/// Run the five production steps in order.
///
/// Reports `Error` to the status observer on any failure and `Completed` after the upload.
#[tracing::instrument(skip_all, fields(niche = %request.niche, language = %request.language))]
pub fn produce_short(
    request: &ShortRequest,
    providers: Providers<'_>,
    config: &RenderConfig,
    progress: &mut dyn ProgressSink,
    cancel: &CancelToken,
) -> ReelResult<ProducedShort> {
    let Providers {
        script: script_provider,
        footage,
        narration,
        uploader,
        clips,
        music,
        caption_font,
        clock,
        sink,
        status,
    } = providers;
    let mut tracker = StatusTracker { observer: status };

    let result = (|| -> ReelResult<ProducedShort> {
        check_cancel(cancel)?;
        tracker.set(PipelineStatus::GeneratingScript);
        announce(
            progress,
            &format!("Step 1: Generating Script ({})...", request.niche),
        );
        let script = script_provider
            .generate(&request.niche, &request.language)
            .map_err(|e| ReelError::upstream(UpstreamStage::Script, e))?;
        announce(progress, &format!("Script: \"{}\"", script.title));

        check_cancel(cancel)?;
        tracker.set(PipelineStatus::FetchingVideos);
        announce(
            progress,
            &format!(
                "Step 2: Fetching clips for [{}]...",
                script.visual_keywords.join(", ")
            ),
        );
        let clip_locators = footage
            .search(&script.visual_keywords, request.footage_credential.as_deref())
            .map_err(|e| ReelError::upstream(UpstreamStage::Footage, e))?;

        check_cancel(cancel)?;
        tracker.set(PipelineStatus::GeneratingVoiceover);
        announce(progress, "Step 3: Generating AI Voiceover...");
        let pcm = narration
            .synthesize(&script.narration_text())
            .map_err(|e| ReelError::upstream(UpstreamStage::Narration, e))?;

        tracker.set(PipelineStatus::RenderingVideo);
        announce(progress, "Step 4: Rendering Final Video...");
        let output = render_short(
            RenderInputs {
                script: &script,
                narration_pcm: &pcm,
                clip_locators: &clip_locators,
            },
            config,
            Collaborators {
                clips,
                music,
                caption_font,
            },
            clock,
            sink,
            progress,
            cancel,
        )?;

        check_cancel(cancel)?;
        tracker.set(PipelineStatus::Uploading);
        announce(progress, "Step 5: Uploading...");
        let delivery = uploader
            .upload(&output.bytes, &UploadMetadata::from_script(&script))
            .map_err(|e| ReelError::upstream(UpstreamStage::Upload, e))?;
        announce(progress, "Upload complete");

        Ok(ProducedShort {
            script,
            clip_locators,
            report: output.report,
            delivery,
        })
    })();

    match &result {
        Ok(_) => tracker.set(PipelineStatus::Completed),
        Err(err) => {
            tracing::error!(error = %err, "production run failed");
            progress.report(&format!("Error: {err}"));
            tracker.set(PipelineStatus::Error);
        }
    }
    result
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/mod.rs"]
mod tests;
