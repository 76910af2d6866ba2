use super::*;
use crate::encode::sink::AudioFormat;

fn ffmpeg_tools_available() -> bool {
    is_ffmpeg_on_path()
}

#[test]
fn flatten_premul_over_black_produces_expected_rgb() {
    let src = vec![128u8, 0u8, 0u8, 128u8];
    let mut dst = vec![0u8; 4];
    flatten_to_opaque_rgba8(&mut dst, &src, true, [0, 0, 0, 255]).unwrap();
    assert_eq!(dst, vec![128u8, 0u8, 0u8, 255u8]);
}

#[test]
fn flatten_straight_over_black_produces_expected_rgb() {
    let src = vec![255u8, 0u8, 0u8, 128u8];
    let mut dst = vec![0u8; 4];
    flatten_to_opaque_rgba8(&mut dst, &src, false, [0, 0, 0, 255]).unwrap();
    assert_eq!(dst, vec![128u8, 0u8, 0u8, 255u8]);
}

#[test]
fn flatten_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(flatten_to_opaque_rgba8(&mut dst, &[0u8; 4], true, [0, 0, 0, 255]).is_err());
}

#[test]
fn push_before_begin_is_an_error() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::default()).unwrap();
    let frame = FrameRGBA {
        width: 2,
        height: 2,
        data: vec![0; 16],
        premultiplied: true,
    };
    assert!(sink.push_frame(FrameIndex(0), &frame, &[]).is_err());
    assert!(sink.finish().is_err());
}

#[test]
fn encodes_short_clip_with_audio() {
    if !ffmpeg_tools_available() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::default()).unwrap();
    sink.begin(SinkConfig {
        width: 16,
        height: 16,
        fps: Fps::new(30, 1).unwrap(),
        video_bitrate: 5_000_000,
        audio: AudioFormat {
            sample_rate: 48_000,
            channels: 2,
        },
    })
    .unwrap();
    let frame = FrameRGBA {
        width: 16,
        height: 16,
        data: vec![200; 16 * 16 * 4],
        premultiplied: true,
    };
    let window = vec![0.0f32; 1600 * 2];
    for i in 0..10 {
        sink.push_frame(FrameIndex(i), &frame, &window).unwrap();
    }
    let bytes = sink.finish().unwrap();
    assert!(bytes.len() > 100);
    assert_eq!(&bytes[4..8], b"ftyp");
}
