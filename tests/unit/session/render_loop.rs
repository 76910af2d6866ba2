use std::{sync::Arc, time::Duration};

use super::*;
use crate::{
    assets::{
        clips::{ClipSource, SolidClip},
        media::AudioPcm,
    },
    encode::sink::InMemorySink,
    foundation::core::Canvas,
    render::text::CaptionFont,
    session::clock::VirtualClock,
};

fn test_config() -> RenderConfig {
    RenderConfig {
        canvas: Canvas {
            width: 32,
            height: 56,
        },
        ..RenderConfig::default()
    }
}

fn pcm(samples: usize, value: i16) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples * 2);
    for _ in 0..samples {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

fn solid_opener(locator: &str, _t: Duration) -> ReelResult<Box<dyn ClipSource>> {
    if locator.starts_with("dead") {
        return Err(ReelError::media("never became ready"));
    }
    Ok(Box::new(SolidClip::new(locator, 64, 36, [200, 40, 40, 255])))
}

fn steady_music(_locator: &str, sample_rate: u32) -> ReelResult<AudioPcm> {
    Ok(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32: Arc::new(vec![0.5; 2 * 1000]),
    })
}

fn broken_music(_locator: &str, _sample_rate: u32) -> ReelResult<AudioPcm> {
    Err(ReelError::media("HTTP 503"))
}

fn script() -> Script {
    Script {
        hook: "Stop!".into(),
        body: "You won't".into(),
        cta: "believe this.".into(),
        ..Script::default()
    }
}

fn locators(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

struct Run {
    result: ReelResult<RenderOutput>,
    sink: InMemorySink,
    messages: Vec<String>,
}

fn run_with(
    narration: &[u8],
    clips: &[String],
    music: &dyn TrackLoader,
    cancel: &CancelToken,
) -> Run {
    let script = script();
    let mut sink = InMemorySink::new();
    let mut messages = Vec::new();
    let mut clock = VirtualClock::new(Fps::new(30, 1).unwrap());
    let result = {
        let mut progress = |m: &str| messages.push(m.to_string());
        render_short(
            RenderInputs {
                script: &script,
                narration_pcm: narration,
                clip_locators: clips,
            },
            &test_config(),
            Collaborators {
                clips: &solid_opener,
                music,
                caption_font: CaptionFont::Disabled,
            },
            &mut clock,
            &mut sink,
            &mut progress,
            cancel,
        )
    };
    Run {
        result,
        sink,
        messages,
    }
}

#[test]
fn emits_frames_until_narration_plus_tail() {
    // 0.51 s of narration -> bound 1.51 s -> frames at k/30 for k in 0..=45.
    let run = run_with(
        &pcm(12_240, 0),
        &locators(&["a", "b"]),
        &steady_music,
        &CancelToken::new(),
    );
    let out = run.result.unwrap();
    assert_eq!(out.report.frames, 46);
    assert_eq!(run.sink.frames().len(), 46);
    assert!((out.report.elapsed_bound_secs - 1.51).abs() < 1e-9);
    assert_eq!(out.report.clips_loaded, 2);
    assert!(out.report.music.is_loaded());
    assert_eq!(out.report.captions, 5);

    let indices: Vec<u64> = run.sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(indices, (0..46).collect::<Vec<_>>());
    let frame = &run.sink.frames()[0].1;
    assert_eq!((frame.width, frame.height), (32, 56));

    // Audio windows are contiguous and cover the whole mix.
    assert_eq!(run.sink.audio().len(), 72_480 * 2);
    assert!((run.sink.audio()[1000] - 0.075).abs() < 1e-6);
    assert_eq!(out.bytes.len(), 46 * 32 * 56 * 4);
}

#[test]
fn progress_messages_follow_the_stages() {
    let run = run_with(
        &pcm(2_400, 0),
        &locators(&["a"]),
        &steady_music,
        &CancelToken::new(),
    );
    assert!(run.result.is_ok());
    assert_eq!(
        run.messages,
        [
            PROGRESS_ANALYZING,
            PROGRESS_BUFFERING,
            PROGRESS_RENDERING,
            PROGRESS_FINALIZING
        ]
    );
}

#[test]
fn silent_narration_is_fatal_before_any_frame() {
    let run = run_with(&[], &locators(&["a"]), &steady_music, &CancelToken::new());
    assert!(run.result.unwrap_err().is_fatal_input());
    assert!(run.sink.config().is_none());
    assert_eq!(run.messages, [PROGRESS_ANALYZING]);
}

#[test]
fn no_loadable_clips_is_fatal_before_any_frame() {
    let run = run_with(
        &pcm(2_400, 0),
        &locators(&["dead-1", "dead-2"]),
        &steady_music,
        &CancelToken::new(),
    );
    assert!(run.result.unwrap_err().is_fatal_input());
    assert!(run.sink.frames().is_empty());
    assert!(run.sink.config().is_none());
}

#[test]
fn music_failure_yields_narration_only() {
    let run = run_with(
        &pcm(4_800, 16_384),
        &locators(&["a"]),
        &broken_music,
        &CancelToken::new(),
    );
    let out = run.result.unwrap();
    assert!(matches!(out.report.music, MusicStatus::Unavailable { .. }));
    let audio = run.sink.audio();
    // 0.2 s of narration at 0.5, then silence for the tail.
    assert!((audio[2] - 0.5).abs() < 1e-6);
    assert!((audio[9_000 * 2] - 0.5).abs() < 1e-6);
    assert_eq!(audio[audio.len() - 1], 0.0);
}

#[test]
fn skipped_clips_are_reported() {
    let run = run_with(
        &pcm(2_400, 0),
        &locators(&["a", "dead", "b"]),
        &steady_music,
        &CancelToken::new(),
    );
    let out = run.result.unwrap();
    assert_eq!(out.report.clips_loaded, 2);
    assert_eq!(out.report.clips_skipped, ["dead"]);
}

#[test]
fn precancelled_run_never_starts_the_sink() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let run = run_with(&pcm(2_400, 0), &locators(&["a"]), &steady_music, &cancel);
    assert!(matches!(run.result.unwrap_err(), ReelError::Cancelled));
    assert!(run.sink.config().is_none());
}

struct CancellingClock {
    inner: VirtualClock,
    cancel: CancelToken,
    after: u64,
}

impl FrameClock for CancellingClock {
    fn start(&mut self) {
        self.inner.start();
    }

    fn now(&mut self) -> f64 {
        self.inner.now()
    }

    fn wait_next_frame(&mut self) {
        self.inner.wait_next_frame();
        if self.inner.frames_elapsed() == self.after {
            self.cancel.cancel();
        }
    }
}

#[test]
fn cancellation_stops_at_the_next_frame_boundary() {
    let script = script();
    let narration = pcm(24_000, 0);
    let clips = locators(&["a"]);
    let cancel = CancelToken::new();
    let mut clock = CancellingClock {
        inner: VirtualClock::new(Fps::new(30, 1).unwrap()),
        cancel: cancel.clone(),
        after: 3,
    };
    let mut sink = InMemorySink::new();
    let err = render_short(
        RenderInputs {
            script: &script,
            narration_pcm: &narration,
            clip_locators: &clips,
        },
        &test_config(),
        Collaborators {
            clips: &solid_opener,
            music: &steady_music,
            caption_font: CaptionFont::Disabled,
        },
        &mut clock,
        &mut sink,
        &mut crate::session::control::NoProgress,
        &cancel,
    )
    .unwrap_err();
    assert!(matches!(err, ReelError::Cancelled));
    assert_eq!(sink.frames().len(), 3);
    assert!(!sink.is_finished());
}

#[test]
fn preview_frame_matches_the_loop() {
    let script = script();
    let narration = pcm(12_000, 0);
    let clips = locators(&["a", "b", "c"]);
    let prepare = || {
        ShortSession::prepare(
            RenderInputs {
                script: &script,
                narration_pcm: &narration,
                clip_locators: &clips,
            },
            &test_config(),
            Collaborators {
                clips: &solid_opener,
                music: &broken_music,
                caption_font: CaptionFont::Disabled,
            },
            &mut crate::session::control::NoProgress,
        )
        .unwrap()
    };

    let mut preview = prepare();
    assert_eq!(preview.captions().len(), 5);
    assert!((preview.bound_secs() - 1.5).abs() < 1e-9);
    let fps = Fps::new(30, 1).unwrap();
    let still = preview.render_frame_at(fps.frames_to_secs(10)).unwrap();
    assert!(preview.render_frame_at(-1.0).is_err());

    let mut sink = InMemorySink::new();
    prepare()
        .run(
            &mut VirtualClock::new(fps),
            &mut sink,
            &mut crate::session::control::NoProgress,
            &CancelToken::new(),
        )
        .unwrap();
    assert_eq!(sink.frames()[10].1.data, still.data);
}

/// Advances `step` frame ticks per wait, like a realtime clock behind schedule.
struct SkippingClock {
    fps: Fps,
    tick: u64,
    step: u64,
}

impl FrameClock for SkippingClock {
    fn start(&mut self) {
        self.tick = 0;
    }

    fn now(&mut self) -> f64 {
        self.fps.frames_to_secs(self.tick)
    }

    fn wait_next_frame(&mut self) {
        self.tick += self.step;
    }
}

#[test]
fn skipped_ticks_repeat_the_previous_frame() {
    let script = script();
    // 1.99 s narration -> bound 2.99 s -> renders at even ticks 0..=88.
    let narration = pcm(47_760, 0);
    let clips = locators(&["a", "b"]);
    let config = test_config();
    let fps = Fps::new(30, 1).unwrap();
    let mut clock = SkippingClock {
        fps,
        tick: 0,
        step: 2,
    };
    let mut sink = InMemorySink::new();
    let out = render_short(
        RenderInputs {
            script: &script,
            narration_pcm: &narration,
            clip_locators: &clips,
        },
        &config,
        Collaborators {
            clips: &solid_opener,
            music: &steady_music,
            caption_font: CaptionFont::Disabled,
        },
        &mut clock,
        &mut sink,
        &mut crate::session::control::NoProgress,
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(out.report.frames, 89);
    assert_eq!(out.report.frames_repeated, 44);
    let indices: Vec<u64> = sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(indices, (0..89).collect::<Vec<_>>());
    assert_eq!(sink.frames()[1].1.data, sink.frames()[0].1.data);

    let video_secs = out.report.frames as f64 / fps.as_f64();
    let audio_secs = sink.audio().len() as f64 / 2.0 / f64::from(config.mix_sample_rate);
    assert!(
        (video_secs - audio_secs).abs() <= fps.frame_duration_secs(),
        "video {video_secs} s vs audio {audio_secs} s"
    );
}

#[test]
fn default_font_draws_the_active_caption() {
    if CaptionTypesetter::system_sans_serif(72.0).is_err() {
        eprintln!("skipping: no system font installed");
        return;
    }
    let config = RenderConfig {
        canvas: Canvas {
            width: 180,
            height: 320,
        },
        ..RenderConfig::default()
    };
    let narration = pcm(48_000, 0);
    let clips = locators(&["a"]);
    let frame_for = |hook: &str| {
        let script = Script {
            hook: hook.into(),
            ..Script::default()
        };
        let mut session = ShortSession::prepare(
            RenderInputs {
                script: &script,
                narration_pcm: &narration,
                clip_locators: &clips,
            },
            &config,
            Collaborators {
                clips: &solid_opener,
                music: &broken_music,
                caption_font: CaptionFont::default(),
            },
            &mut crate::session::control::NoProgress,
        )
        .unwrap();
        let has_caption = session.plan_at(1.0).caption.is_some();
        (has_caption, session.render_frame_at(1.0).unwrap())
    };

    let (captioned, with_word) = frame_for("SUBSCRIBE");
    let (uncaptioned, without) = frame_for("");
    assert!(captioned);
    assert!(!uncaptioned);
    assert_ne!(with_word.data, without.data);
}
