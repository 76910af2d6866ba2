use crate::{
    assets::clips::{ClipOpener, LoadedClips, load_clips},
    audio::{
        mix::{MIX_CHANNELS, MixGraph},
        music::{MusicStatus, TrackLoader, load_background_music},
        pcm::{NarrationAudio, decode_pcm_s16le},
    },
    captions::timing::{CaptionWord, allocate_captions},
    config::RenderConfig,
    effects::transitions::ClipSchedule,
    encode::sink::{AudioFormat, EncoderSink, SinkConfig},
    foundation::core::{Fps, FrameIndex},
    foundation::error::{ReelError, ReelResult},
    render::{ClipLayer, FrameCompositor, FrameRGBA, text::{CaptionFont, CaptionTypesetter}},
    script::Script,
    session::{
        clock::FrameClock,
        control::{CancelToken, ProgressSink, announce},
        planner::{FramePlan, FramePlanner},
    },
};

pub const PROGRESS_ANALYZING: &str = "Analyzing Voiceover...";
pub const PROGRESS_BUFFERING: &str = "Buffering Video Clips...";
pub const PROGRESS_RENDERING: &str = "Rendering Video...";
pub const PROGRESS_FINALIZING: &str = "Finalizing Video...";

/// Inputs of one render: the script, raw narration PCM, and clip locators in order.
#[derive(Clone, Copy, Debug)]
pub struct RenderInputs<'a> {
    pub script: &'a Script,
    /// Signed 16-bit little-endian mono PCM at the configured narration rate.
    pub narration_pcm: &'a [u8],
    pub clip_locators: &'a [String],
}

/// Collaborators used while preparing a session.
pub struct Collaborators<'a> {
    pub clips: &'a dyn ClipOpener,
    pub music: &'a dyn TrackLoader,
    /// `System` uses `RenderConfig::caption_font` when set, else the host sans-serif.
    pub caption_font: CaptionFont,
}

/// Recoverable outcomes of a completed render.
#[derive(Clone, Debug, serde::Serialize)]
pub struct RenderReport {
    pub frames: u64,
    /// Frame slots the clock skipped, filled with the previous picture.
    pub frames_repeated: u64,
    /// Narration duration plus tail.
    pub elapsed_bound_secs: f64,
    pub narration_secs: f64,
    pub clips_loaded: usize,
    pub clips_skipped: Vec<String>,
    pub music: MusicStatus,
    pub captions: usize,
}

#[derive(Debug)]
pub struct RenderOutput {
    pub bytes: Vec<u8>,
    pub report: RenderReport,
}

/// A short with all inputs decoded, timed, and loaded, ready for its frame loop.
pub struct ShortSession {
    config: RenderConfig,
    fps: Fps,
    narration: NarrationAudio,
    bound_secs: f64,
    clips: LoadedClips,
    planner: FramePlanner,
    compositor: FrameCompositor,
    mix: MixGraph,
    music: MusicStatus,
}

impl ShortSession {
    /// Run every up-front stage: decode, caption timing, music, mix wiring, clip loading.
    #[tracing::instrument(skip_all, fields(clips = inputs.clip_locators.len()))]
    pub fn prepare(
        inputs: RenderInputs<'_>,
        config: &RenderConfig,
        collaborators: Collaborators<'_>,
        progress: &mut dyn ProgressSink,
    ) -> ReelResult<Self> {
        config.validate()?;
        let fps = config.fps()?;

        announce(progress, PROGRESS_ANALYZING);
        let narration = decode_pcm_s16le(inputs.narration_pcm, config.narration_sample_rate)?;
        let narration_secs = narration.duration_secs();
        let bound_secs = narration_secs + config.tail_secs;

        let captions = allocate_captions(&inputs.script.narration_text(), narration_secs);
        tracing::debug!(words = captions.len(), narration_secs, "captions allocated");
        let caption_font = match (collaborators.caption_font, config.caption_font.as_deref()) {
            (CaptionFont::System, Some(path)) => CaptionFont::Loaded(
                CaptionTypesetter::from_font_file(path, config.caption.font_size)?,
            ),
            (font, _) => font,
        };
        let captions_disabled = caption_font.is_disabled();
        let typesetter = caption_font.resolve(config.caption.font_size);
        if typesetter.is_none() && !captions_disabled && !captions.is_empty() {
            tracing::warn!("no caption font available, captions will not be drawn");
        }

        let (music_pcm, music) = if config.music_enabled {
            load_background_music(
                &config.music,
                collaborators.music,
                inputs.script.mood,
                config.mix_sample_rate,
            )
        } else {
            (None, MusicStatus::Disabled)
        };

        let mut mix = MixGraph::new(config.mix_sample_rate, bound_secs)?
            .with_narration(&narration, config.narration_gain);
        if let Some(pcm) = music_pcm.as_ref() {
            mix = mix.with_music(pcm, config.music_gain);
        }
        tracing::debug!(music = mix.has_music(), samples = mix.total_samples(), "mix wired");

        announce(progress, PROGRESS_BUFFERING);
        let clips = load_clips(
            collaborators.clips,
            inputs.clip_locators,
            config.clip_ready_timeout(),
        )?;

        let schedule = ClipSchedule::new(
            clips.len(),
            config.clip_duration_secs,
            config.transition_secs,
        )?;
        let planner = FramePlanner::new(config.canvas, schedule, clips.dimensions(), captions)?;
        let compositor =
            FrameCompositor::new(config.canvas, config.caption, typesetter)?;

        Ok(Self {
            config: config.clone(),
            fps,
            narration,
            bound_secs,
            clips,
            planner,
            compositor,
            mix,
            music,
        })
    }

    pub fn captions(&self) -> &[CaptionWord] {
        self.planner.captions()
    }

    pub fn narration_secs(&self) -> f64 {
        self.narration.duration_secs()
    }

    /// The loop stops at the first frame whose elapsed time reaches this.
    pub fn bound_secs(&self) -> f64 {
        self.bound_secs
    }

    pub fn music_status(&self) -> &MusicStatus {
        &self.music
    }

    pub fn plan_at(&self, elapsed: f64) -> FramePlan {
        self.planner.plan(elapsed)
    }

    /// Compose the frame shown at `elapsed`, outside of any sink.
    pub fn render_frame_at(&mut self, elapsed: f64) -> ReelResult<FrameRGBA> {
        if !elapsed.is_finite() || elapsed < 0.0 {
            return Err(ReelError::validation("elapsed must be finite and >= 0"));
        }
        let plan = self.planner.plan(elapsed);
        self.compose(&plan)
    }

    fn compose(&mut self, plan: &FramePlan) -> ReelResult<FrameRGBA> {
        let mut layers = Vec::with_capacity(plan.layers.len());
        for planned in &plan.layers {
            let frame = self.clips.clips[planned.clip].frame_at(plan.elapsed)?;
            layers.push(ClipLayer {
                clip: planned.clip,
                transform: planned.transform(frame.width, frame.height),
                opacity: planned.opacity(),
                frame,
            });
        }
        self.compositor.compose(&layers, plan.caption.as_ref())
    }

    /// Drive the frame loop to completion and finalize the sink.
    ///
    /// Audio and the clock start together. Each frame checks `cancel` first, then stops once
    /// elapsed time reaches the bound. Frames land on the tick slot of their elapsed time; slots
    /// a slow clock skipped repeat the previous picture, so video length tracks audio length.
    #[tracing::instrument(skip_all, fields(bound_secs = self.bound_secs))]
    pub fn run(
        mut self,
        clock: &mut dyn FrameClock,
        sink: &mut dyn EncoderSink,
        progress: &mut dyn ProgressSink,
        cancel: &CancelToken,
    ) -> ReelResult<RenderOutput> {
        if cancel.is_cancelled() {
            return Err(ReelError::Cancelled);
        }

        sink.begin(SinkConfig {
            width: self.config.canvas.width,
            height: self.config.canvas.height,
            fps: self.fps,
            video_bitrate: self.config.video_bitrate,
            audio: AudioFormat {
                sample_rate: self.config.mix_sample_rate,
                channels: MIX_CHANNELS,
            },
        })?;

        announce(progress, PROGRESS_RENDERING);
        let mixed = self.mix.clone().start();
        clock.start();

        let frame_secs = self.fps.frame_duration_secs();
        let mut frames = 0u64;
        let mut repeated = 0u64;
        let mut audio_cursor = 0u64;
        let mut last_elapsed = 0.0f64;
        let mut last_frame: Option<FrameRGBA> = None;
        loop {
            if cancel.is_cancelled() {
                tracing::info!(frames, "render cancelled");
                return Err(ReelError::Cancelled);
            }
            let elapsed = clock.now().max(last_elapsed);
            if elapsed >= self.bound_secs {
                break;
            }
            last_elapsed = elapsed;

            let plan = self.planner.plan(elapsed);
            let frame = self.compose(&plan)?;

            let slot = self.fps.tick_at(elapsed).max(frames);
            if slot > frames {
                tracing::debug!(from = frames, to = slot, "clock skipped frame slots");
            }
            let held = last_frame.as_ref().unwrap_or(&frame);
            while frames < slot {
                let end = mixed
                    .frame_at(self.fps.frames_to_secs(frames + 1))
                    .max(audio_cursor);
                sink.push_frame(FrameIndex(frames), held, mixed.window(audio_cursor, end))?;
                audio_cursor = end;
                frames += 1;
                repeated += 1;
            }

            let audio_end = mixed.frame_at(elapsed + frame_secs).max(audio_cursor);
            let window = mixed.window(audio_cursor, audio_end);
            audio_cursor = audio_end;

            sink.push_frame(FrameIndex(frames), &frame, window)?;
            frames += 1;
            last_frame = Some(frame);
            clock.wait_next_frame();
        }

        announce(progress, PROGRESS_FINALIZING);
        let bytes = sink.finish()?;

        let report = RenderReport {
            frames,
            frames_repeated: repeated,
            elapsed_bound_secs: self.bound_secs,
            narration_secs: self.narration.duration_secs(),
            clips_loaded: self.clips.len(),
            clips_skipped: self
                .clips
                .skipped
                .iter()
                .map(|s| s.locator.clone())
                .collect(),
            music: self.music,
            captions: self.planner.captions().len(),
        };
        tracing::info!(
            frames,
            bytes = bytes.len(),
            clips = report.clips_loaded,
            music = report.music.is_loaded(),
            "render complete"
        );
        Ok(RenderOutput { bytes, report })
    }
}

/// Prepare and run a short in one call.
pub fn render_short(
    inputs: RenderInputs<'_>,
    config: &RenderConfig,
    collaborators: Collaborators<'_>,
    clock: &mut dyn FrameClock,
    sink: &mut dyn EncoderSink,
    progress: &mut dyn ProgressSink,
    cancel: &CancelToken,
) -> ReelResult<RenderOutput> {
    let session = ShortSession::prepare(inputs, config, collaborators, progress)?;
    session.run(clock, sink, progress, cancel)
}

#[cfg(test)]
#[path = "../../tests/unit/session/render_loop.rs"]
mod tests;
