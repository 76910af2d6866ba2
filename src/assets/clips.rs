use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    time::Duration,
};

use crate::{
    assets::media::{self, ProcessHandle, VideoFrameStream},
    effects::ken_burns::MAX_MOTION_SCALE,
    foundation::core::{Canvas, Fps},
    foundation::error::{ReelError, ReelResult},
};

/// How long a clip may take to produce its first frame before it is skipped.
pub const CLIP_READY_TIMEOUT: Duration = Duration::from_millis(3000);

/// One decoded picture of a clip, premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct ClipFrame {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
    /// Bumped whenever the pixels change, so renderers can cache uploads.
    pub generation: u64,
}

/// A loaded, muted, endlessly looping visual source.
pub trait ClipSource {
    fn locator(&self) -> &str;

    /// Native pixel dimensions of the frames this source yields.
    fn dimensions(&self) -> (u32, u32);

    /// Frame shown `t` seconds after playback started. `t` never decreases between calls.
    fn frame_at(&mut self, t: f64) -> ReelResult<ClipFrame>;
}

/// Resolves a locator into a ready [`ClipSource`], waiting at most `ready_timeout`.
pub trait ClipOpener {
    fn open(&self, locator: &str, ready_timeout: Duration) -> ReelResult<Box<dyn ClipSource>>;
}

impl<F> ClipOpener for F
where
    F: Fn(&str, Duration) -> ReelResult<Box<dyn ClipSource>>,
{
    fn open(&self, locator: &str, ready_timeout: Duration) -> ReelResult<Box<dyn ClipSource>> {
        self(locator, ready_timeout)
    }
}

/// A locator dropped during loading.
#[derive(Clone, Debug)]
pub struct SkippedClip {
    pub locator: String,
    pub reason: String,
}

/// Ordered set of clips that became ready. Order drives transitions and motion seeds.
pub struct LoadedClips {
    pub clips: Vec<Box<dyn ClipSource>>,
    pub skipped: Vec<SkippedClip>,
}

impl LoadedClips {
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn dimensions(&self) -> Vec<(u32, u32)> {
        self.clips.iter().map(|c| c.dimensions()).collect()
    }
}

/// Open every locator in order, one at a time.
///
/// Sources that error or miss the ready deadline are skipped. No usable source at all is
/// [`ReelError::FatalInput`].
pub fn load_clips(
    opener: &dyn ClipOpener,
    locators: &[String],
    ready_timeout: Duration,
) -> ReelResult<LoadedClips> {
    let mut clips = Vec::with_capacity(locators.len());
    let mut skipped = Vec::new();

    for locator in locators {
        match opener.open(locator, ready_timeout) {
            Ok(clip) => {
                let (w, h) = clip.dimensions();
                tracing::debug!(locator = %locator, width = w, height = h, "clip ready");
                clips.push(clip);
            }
            Err(e) => {
                tracing::warn!(locator = %locator, error = %e, "skipping clip");
                skipped.push(SkippedClip {
                    locator: locator.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if clips.is_empty() {
        return Err(ReelError::fatal_input(format!(
            "failed to load background footage ({} locator(s) tried)",
            locators.len()
        )));
    }
    Ok(LoadedClips { clips, skipped })
}

/// The process doing a clip's loading work, killed once the caller stops waiting.
#[derive(Clone, Debug, Default)]
pub(crate) struct LoadWatch {
    current: Arc<Mutex<Option<ProcessHandle>>>,
    abandoned: Arc<AtomicBool>,
}

impl LoadWatch {
    pub(crate) fn track(&self, process: ProcessHandle) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(process.clone());
        if self.is_abandoned() {
            process.kill();
        }
    }

    /// Kill the tracked process and any process tracked later.
    pub(crate) fn abandon(&self) {
        self.abandoned.store(true, Ordering::SeqCst);
        let current = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(process) = current {
            process.kill();
        }
    }

    pub(crate) fn is_abandoned(&self) -> bool {
        self.abandoned.load(Ordering::SeqCst)
    }
}

/// Opens clips through the system `ffmpeg`/`ffprobe` binaries.
#[derive(Clone, Copy, Debug)]
pub struct FfmpegClipOpener {
    pub canvas: Canvas,
    pub fps: Fps,
}

impl ClipOpener for FfmpegClipOpener {
    #[tracing::instrument(skip(self))]
    fn open(&self, locator: &str, ready_timeout: Duration) -> ReelResult<Box<dyn ClipSource>> {
        let (tx, rx) = mpsc::channel();
        let owned = locator.to_string();
        let canvas = self.canvas;
        let fps = self.fps;
        let watch = LoadWatch::default();
        let worker = watch.clone();

        std::thread::spawn(move || {
            let result = (|| -> ReelResult<VideoFrameStream> {
                let info = media::probe_video_watched(&owned, &|p| worker.track(p))?;
                tracing::debug!(
                    source_fps = info.source_fps(),
                    duration_sec = info.duration_sec,
                    "clip probed"
                );
                if worker.is_abandoned() {
                    return Err(ReelError::media("clip load abandoned"));
                }
                let (w, h) = decode_size(info.width, info.height, canvas);
                let mut stream = VideoFrameStream::spawn(&owned, w, h, fps)?;
                worker.track(stream.process());
                stream.read_next()?;
                Ok(stream)
            })();
            let _ = tx.send(result);
        });

        let stream = match rx.recv_timeout(ready_timeout) {
            Ok(result) => result?,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                watch.abandon();
                return Err(ReelError::media(format!(
                    "clip not ready within {} ms",
                    ready_timeout.as_millis()
                )));
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(ReelError::media("clip loader thread exited unexpectedly"));
            }
        };

        Ok(Box::new(FfmpegClip::new(locator.to_string(), stream, fps)))
    }
}

/// Decode size that still covers `canvas` at the largest motion scale, never upscaled.
pub fn decode_size(width: u32, height: u32, canvas: Canvas) -> (u32, u32) {
    let (sw, sh) = (f64::from(width), f64::from(height));
    let needed = (canvas.w() / sw).max(canvas.h() / sh) * MAX_MOTION_SCALE;
    if needed >= 1.0 {
        return (width, height);
    }
    let even = |v: f64| (((v / 2.0).ceil() as u32) * 2).max(2);
    (even(sw * needed), even(sh * needed))
}

struct FfmpegClip {
    locator: String,
    stream: VideoFrameStream,
    fps: Fps,
    current: ClipFrame,
    stalled: bool,
}

impl FfmpegClip {
    fn new(locator: String, stream: VideoFrameStream, fps: Fps) -> Self {
        let (width, height) = stream.dimensions();
        let current = ClipFrame {
            width,
            height,
            rgba8_premul: Arc::new(stream.current_rgba().to_vec()),
            generation: stream.frames_read(),
        };
        Self {
            locator,
            stream,
            fps,
            current,
            stalled: false,
        }
    }
}

impl ClipSource for FfmpegClip {
    fn locator(&self) -> &str {
        &self.locator
    }

    fn dimensions(&self) -> (u32, u32) {
        self.stream.dimensions()
    }

    fn frame_at(&mut self, t: f64) -> ReelResult<ClipFrame> {
        let index = self.fps.secs_to_frames_floor(t);
        if self.stalled || index < self.stream.frames_read() {
            return Ok(self.current.clone());
        }
        if let Err(e) = self.stream.advance_to(index) {
            // Hold the last picture rather than failing the whole render.
            tracing::warn!(locator = %self.locator, error = %e, "clip stalled, holding last frame");
            self.stalled = true;
            return Ok(self.current.clone());
        }
        self.current = ClipFrame {
            width: self.current.width,
            height: self.current.height,
            rgba8_premul: Arc::new(self.stream.current_rgba().to_vec()),
            generation: self.stream.frames_read(),
        };
        Ok(self.current.clone())
    }
}

/// Single-color source, for previews and tests.
#[derive(Clone, Debug)]
pub struct SolidClip {
    locator: String,
    frame: ClipFrame,
}

impl SolidClip {
    pub fn new(locator: impl Into<String>, width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let premul = crate::foundation::core::Rgba8::new(rgba[0], rgba[1], rgba[2], rgba[3])
            .to_premul();
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&premul);
        }
        Self {
            locator: locator.into(),
            frame: ClipFrame {
                width,
                height,
                rgba8_premul: Arc::new(data),
                generation: 0,
            },
        }
    }
}

impl ClipSource for SolidClip {
    fn locator(&self) -> &str {
        &self.locator
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    fn frame_at(&mut self, _t: f64) -> ReelResult<ClipFrame> {
        Ok(self.frame.clone())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/clips.rs"]
mod tests;
