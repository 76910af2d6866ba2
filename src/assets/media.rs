use std::{
    ffi::OsStr,
    io::{BufReader, Read as _},
    process::{Child, ChildStdout, Command, Stdio},
    sync::{Arc, Mutex, PoisonError},
};

use crate::foundation::{
    core::Fps,
    error::{ReelError, ReelResult},
};

/// Stream facts reported by `ffprobe` for a clip locator (file path or URL).
#[derive(Clone, Debug)]
pub struct VideoSourceInfo {
    pub locator: String,
    pub width: u32,
    pub height: u32,
    pub fps_num: u32,
    pub fps_den: u32,
    pub duration_sec: f64,
}

/// Interleaved f32 PCM.
#[derive(Clone, Debug)]
pub struct AudioPcm {
    pub sample_rate: u32,
    pub channels: u16,
    pub interleaved_f32: Arc<Vec<f32>>,
}

impl AudioPcm {
    pub fn frames(&self) -> usize {
        self.interleaved_f32.len() / usize::from(self.channels.max(1))
    }
}

impl VideoSourceInfo {
    pub fn source_fps(&self) -> f64 {
        if self.fps_den == 0 {
            0.0
        } else {
            f64::from(self.fps_num) / f64::from(self.fps_den)
        }
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    tool_available("ffmpeg")
}

pub fn is_ffprobe_on_path() -> bool {
    tool_available("ffprobe")
}

fn tool_available(bin: &str) -> bool {
    Command::new(bin)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// A spawned `ffmpeg`/`ffprobe` process that another thread can kill.
#[derive(Clone, Debug)]
pub struct ProcessHandle(Arc<Mutex<Child>>);

impl ProcessHandle {
    pub fn from_child(child: Child) -> Self {
        Self(Arc::new(Mutex::new(child)))
    }

    /// Kill and reap the process. Calling it again is a no-op.
    pub fn kill(&self) {
        let mut child = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = child.kill();
        let _ = child.wait();
    }

    pub fn has_exited(&self) -> bool {
        let mut child = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        matches!(child.try_wait(), Ok(Some(_)))
    }

    fn wait_success(&self) -> ReelResult<bool> {
        let mut child = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        child
            .wait()
            .map(|s| s.success())
            .map_err(|e| ReelError::media(format!("wait for ffprobe: {e}")))
    }
}

pub fn probe_video(locator: &str) -> ReelResult<VideoSourceInfo> {
    probe_video_watched(locator, &|_| {})
}

/// [`probe_video`], handing the running `ffprobe` to `watch` before its output is read.
pub fn probe_video_watched(
    locator: &str,
    watch: &dyn Fn(ProcessHandle),
) -> ReelResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let mut child = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(locator)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ReelError::media(format!("failed to run ffprobe: {e}")))?;
    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| ReelError::media("failed to open ffprobe stdout (unexpected)"))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| ReelError::media("failed to open ffprobe stderr (unexpected)"))?;
    let process = ProcessHandle::from_child(child);
    watch(process.clone());

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    // A killed probe closes both pipes, so these reads end early.
    let _ = stdout_pipe.read_to_end(&mut stdout);
    let _ = stderr_pipe.read_to_end(&mut stderr);
    if !process.wait_success()? {
        return Err(ReelError::media(format!(
            "ffprobe failed for '{locator}': {}",
            String::from_utf8_lossy(&stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&stdout)
        .map_err(|e| ReelError::media(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ReelError::media(format!("no video stream found in '{locator}'")))?;
    let width = video_stream
        .width
        .ok_or_else(|| ReelError::media("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| ReelError::media("missing video height from ffprobe"))?;
    if width == 0 || height == 0 {
        return Err(ReelError::media(format!(
            "video stream in '{locator}' has zero size"
        )));
    }

    let (fps_num, fps_den) = parse_ff_ratio(video_stream.r_frame_rate.as_deref().unwrap_or("0/1"))
        .ok_or_else(|| ReelError::media("invalid video r_frame_rate"))?;
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(VideoSourceInfo {
        locator: locator.to_string(),
        width,
        height,
        fps_num,
        fps_den,
        duration_sec,
    })
}

/// Decode the audio of any ffmpeg-readable locator to interleaved stereo f32.
pub fn decode_audio_f32_stereo(locator: &OsStr, sample_rate: u32) -> ReelResult<AudioPcm> {
    let out = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(locator)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| ReelError::media(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        return Err(ReelError::media(format!(
            "ffmpeg audio decode failed for '{}': {}",
            locator.to_string_lossy(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    if !out.stdout.len().is_multiple_of(4) {
        return Err(ReelError::media(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    let pcm = out
        .stdout
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect::<Vec<_>>();

    Ok(AudioPcm {
        sample_rate,
        channels: 2,
        interleaved_f32: Arc::new(pcm),
    })
}

/// Endless RGBA8 frame stream of a looping, muted clip, resampled to a fixed rate.
pub struct VideoFrameStream {
    process: ProcessHandle,
    stdout: BufReader<ChildStdout>,
    width: u32,
    height: u32,
    frame: Vec<u8>,
    frames_read: u64,
}

impl VideoFrameStream {
    /// Spawn the decoder. Output frames are `width`×`height` at `fps`.
    pub fn spawn(locator: &str, width: u32, height: u32, fps: Fps) -> ReelResult<Self> {
        if width == 0 || height == 0 {
            return Err(ReelError::media("decode size must be non-zero"));
        }
        let filter = format!("fps={}/{},scale={width}:{height}", fps.num, fps.den);
        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-stream_loop", "-1", "-i"])
            .arg(locator)
            .args([
                "-an", "-vf", &filter, "-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                ReelError::media(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ReelError::media("failed to open ffmpeg stdout (unexpected)"))?;

        Ok(Self {
            process: ProcessHandle::from_child(child),
            stdout: BufReader::new(stdout),
            width,
            height,
            frame: vec![0u8; width as usize * height as usize * 4],
            frames_read: 0,
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The decoder process; killing it ends the stream.
    pub fn process(&self) -> ProcessHandle {
        self.process.clone()
    }

    /// Number of frames pulled so far; the current frame has index `frames_read - 1`.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Pull the next frame into the current-frame buffer.
    pub fn read_next(&mut self) -> ReelResult<()> {
        self.stdout
            .read_exact(&mut self.frame)
            .map_err(|e| ReelError::media(format!("video decode stream ended: {e}")))?;
        self.frames_read += 1;
        Ok(())
    }

    /// Read forward until frame `index` is current. Earlier indices keep the current frame.
    pub fn advance_to(&mut self, index: u64) -> ReelResult<()> {
        while self.frames_read <= index {
            self.read_next()?;
        }
        Ok(())
    }

    /// Current frame, straight RGBA8 (opaque for video sources).
    pub fn current_rgba(&self) -> &[u8] {
        &self.frame
    }
}

impl Drop for VideoFrameStream {
    fn drop(&mut self) {
        self.process.kill();
    }
}

fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.parse::<u32>().ok()?;
    let b = parts.next()?.parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
