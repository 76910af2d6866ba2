use std::{cell::RefCell, time::Duration};

use super::*;
use crate::{
    assets::{
        clips::{ClipSource, SolidClip},
        media::AudioPcm,
    },
    encode::sink::InMemorySink,
    render::text::CaptionFont,
    foundation::core::{Canvas, Fps},
    script::Mood,
    session::{clock::VirtualClock, control::NoProgress},
};

fn config() -> RenderConfig {
    RenderConfig {
        canvas: Canvas {
            width: 32,
            height: 56,
        },
        ..RenderConfig::default()
    }
}

fn scripted(_niche: &str, language: &str) -> anyhow::Result<Script> {
    Ok(Script {
        title: format!("Secrets ({language})"),
        description: "desc".into(),
        hook: "Stop!".into(),
        body: "You won't".into(),
        cta: "believe this.".into(),
        tags: vec!["shorts".into()],
        visual_keywords: vec!["neon".into(), "city".into()],
        mood: Mood::Scary,
        ..Script::default()
    })
}

fn voice(text: &str) -> anyhow::Result<Vec<u8>> {
    assert_eq!(text, "Stop! You won't believe this.");
    Ok(vec![0u8; 4_800 * 2])
}

fn solid(locator: &str, _t: Duration) -> ReelResult<Box<dyn ClipSource>> {
    Ok(Box::new(SolidClip::new(locator, 16, 16, [0, 0, 255, 255])))
}

fn no_music(_locator: &str, _rate: u32) -> ReelResult<AudioPcm> {
    Err(ReelError::media("offline"))
}

struct Harness {
    uploads: RefCell<Vec<(usize, UploadMetadata)>>,
}

impl Harness {
    fn new() -> Self {
        Self {
            uploads: RefCell::new(Vec::new()),
        }
    }

    fn run(
        &self,
        script: &dyn ScriptProvider,
        narration: &dyn NarrationSynthesizer,
        cancel: &CancelToken,
    ) -> (ReelResult<ProducedShort>, Vec<PipelineStatus>, Vec<String>) {
        let footage = FallbackFootage::builtin();
        let uploader = |video: &[u8], meta: &UploadMetadata| -> anyhow::Result<String> {
            self.uploads.borrow_mut().push((video.len(), meta.clone()));
            Ok("video-123".to_string())
        };
        let mut clock = VirtualClock::new(Fps::new(30, 1).unwrap());
        let mut sink = InMemorySink::new();
        let mut statuses = Vec::new();
        let mut observer = |s: PipelineStatus| statuses.push(s);
        let mut messages = Vec::new();
        let mut progress = |m: &str| messages.push(m.to_string());

        let result = produce_short(
            &ShortRequest::new("Mystery", "Hindi"),
            Providers {
                script,
                footage: &footage,
                narration,
                uploader: &uploader,
                clips: &solid,
                music: &no_music,
                caption_font: CaptionFont::Disabled,
                clock: &mut clock,
                sink: &mut sink,
                status: Some(&mut observer),
            },
            &config(),
            &mut progress,
            cancel,
        );
        (result, statuses, messages)
    }
}

#[test]
fn full_run_renders_and_uploads() {
    let harness = Harness::new();
    let (result, statuses, messages) = harness.run(&scripted, &voice, &CancelToken::new());
    let produced = result.unwrap();

    assert_eq!(produced.delivery, "video-123");
    assert_eq!(produced.clip_locators.len(), FALLBACK_FOOTAGE.len());
    assert_eq!(produced.report.clips_loaded, 4);
    assert_eq!(produced.report.captions, 5);
    assert!(matches!(
        produced.report.music,
        crate::audio::music::MusicStatus::Unavailable { .. }
    ));

    assert_eq!(
        statuses,
        [
            PipelineStatus::GeneratingScript,
            PipelineStatus::FetchingVideos,
            PipelineStatus::GeneratingVoiceover,
            PipelineStatus::RenderingVideo,
            PipelineStatus::Uploading,
            PipelineStatus::Completed,
        ]
    );
    assert_eq!(messages[0], "Step 1: Generating Script (Mystery)...");
    assert_eq!(messages[2], "Step 2: Fetching clips for [neon, city]...");
    assert!(messages.iter().any(|m| m == "Rendering Video..."));

    let uploads = harness.uploads.borrow();
    assert_eq!(uploads.len(), 1);
    assert!(uploads[0].0 > 0);
    assert_eq!(uploads[0].1.title, "Secrets (Hindi)");
    assert_eq!(uploads[0].1.tags, ["shorts"]);
}

#[test]
fn script_failure_is_upstream_and_stops_early() {
    let harness = Harness::new();
    let failing = |_n: &str, _l: &str| -> anyhow::Result<Script> { anyhow::bail!("quota") };
    let (result, statuses, messages) = harness.run(&failing, &voice, &CancelToken::new());
    let err = result.unwrap_err();
    assert!(matches!(
        err,
        ReelError::Upstream {
            stage: UpstreamStage::Script,
            ..
        }
    ));
    assert_eq!(
        statuses,
        [PipelineStatus::GeneratingScript, PipelineStatus::Error]
    );
    assert!(messages.last().unwrap().starts_with("Error: "));
    assert!(harness.uploads.borrow().is_empty());
}

#[test]
fn narration_failure_is_upstream() {
    let harness = Harness::new();
    let failing = |_t: &str| -> anyhow::Result<Vec<u8>> { anyhow::bail!("tts down") };
    let (result, _, _) = harness.run(&scripted, &failing, &CancelToken::new());
    assert!(matches!(
        result.unwrap_err(),
        ReelError::Upstream {
            stage: UpstreamStage::Narration,
            ..
        }
    ));
}

#[test]
fn empty_narration_is_fatal_input() {
    let harness = Harness::new();
    let silent = |_t: &str| -> anyhow::Result<Vec<u8>> { Ok(Vec::new()) };
    let (result, statuses, _) = harness.run(&scripted, &silent, &CancelToken::new());
    assert!(result.unwrap_err().is_fatal_input());
    assert_eq!(statuses.last(), Some(&PipelineStatus::Error));
    assert!(harness.uploads.borrow().is_empty());
}

#[test]
fn cancelled_before_start() {
    let harness = Harness::new();
    let cancel = CancelToken::new();
    cancel.cancel();
    let (result, statuses, _) = harness.run(&scripted, &voice, &cancel);
    assert!(matches!(result.unwrap_err(), ReelError::Cancelled));
    assert_eq!(statuses, [PipelineStatus::Error]);
}

#[test]
fn upload_failure_is_upstream() {
    let footage = FallbackFootage::builtin();
    let uploader = |_v: &[u8], _m: &UploadMetadata| -> anyhow::Result<String> {
        anyhow::bail!("token expired")
    };
    let mut clock = VirtualClock::new(Fps::new(30, 1).unwrap());
    let mut sink = InMemorySink::new();
    let err = produce_short(
        &ShortRequest::new("Tech", "English").with_footage_credential(""),
        Providers {
            script: &scripted,
            footage: &footage,
            narration: &voice,
            uploader: &uploader,
            clips: &solid,
            music: &no_music,
            caption_font: CaptionFont::Disabled,
            clock: &mut clock,
            sink: &mut sink,
            status: None,
        },
        &config(),
        &mut NoProgress,
        &CancelToken::new(),
    )
    .unwrap_err();
    assert!(err.is_upstream());
    assert!(err.to_string().contains("token expired"));
    assert!(sink.is_finished());
}

#[test]
fn terminal_statuses() {
    assert!(PipelineStatus::Completed.is_terminal());
    assert!(PipelineStatus::Error.is_terminal());
    assert!(!PipelineStatus::Uploading.is_terminal());
    assert_eq!(
        serde_json::to_string(&PipelineStatus::GeneratingVoiceover).unwrap(),
        "\"GENERATING_VOICEOVER\""
    );
}
