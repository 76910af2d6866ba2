use super::*;

fn narration(samples: Vec<f32>, sample_rate: u32) -> NarrationAudio {
    NarrationAudio {
        sample_rate,
        samples: Arc::new(samples),
    }
}

#[test]
fn narration_plays_once_then_silence() {
    let mix = MixGraph::new(4, 2.0)
        .unwrap()
        .with_narration(&narration(vec![0.5; 4], 4), 1.0)
        .start();
    assert_eq!(mix.total_frames(), 8);
    let s = &mix.interleaved_f32;
    assert!((s[0] - 0.5).abs() < 1e-6);
    assert!((s[1] - 0.5).abs() < 1e-6);
    assert!((s[6] - 0.5).abs() < 1e-6);
    assert_eq!(s[8], 0.0);
    assert_eq!(s[15], 0.0);
}

#[test]
fn music_loops_at_its_gain() {
    let music = AudioPcm {
        sample_rate: 4,
        channels: 2,
        interleaved_f32: Arc::new(vec![1.0, -1.0, 1.0, -1.0]),
    };
    let mix = MixGraph::new(4, 3.0).unwrap().with_music(&music, 0.15).start();
    assert_eq!(mix.total_frames(), 12);
    for frame in mix.interleaved_f32.chunks_exact(2) {
        assert!((frame[0] - 0.15).abs() < 1e-6);
        assert!((frame[1] + 0.15).abs() < 1e-6);
    }
}

#[test]
fn sources_sum_and_clamp() {
    let music = AudioPcm {
        sample_rate: 4,
        channels: 1,
        interleaved_f32: Arc::new(vec![1.0; 4]),
    };
    let graph = MixGraph::new(4, 1.0)
        .unwrap()
        .with_narration(&narration(vec![0.95; 4], 4), 1.0)
        .with_music(&music, 0.15);
    assert!(graph.has_music());
    let mix = graph.start();
    assert!(mix.interleaved_f32.iter().all(|&s| s == 1.0));
}

#[test]
fn narration_is_resampled_to_mix_rate() {
    let mix = MixGraph::new(8, 1.0)
        .unwrap()
        .with_narration(&narration(vec![0.0, 1.0, 0.0, 1.0], 4), 1.0)
        .start();
    // 4 Hz source at 8 Hz output interpolates halfway points.
    assert!((mix.interleaved_f32[2] - 0.5).abs() < 1e-6);
    assert!((mix.interleaved_f32[4] - 1.0).abs() < 1e-6);
}

#[test]
fn windows_clamp_to_mix_length() {
    let mix = MixGraph::new(10, 1.0)
        .unwrap()
        .with_narration(&narration(vec![0.1; 10], 10), 1.0)
        .start();
    assert_eq!(mix.window(0, 4).len(), 8);
    assert_eq!(mix.window(8, 50).len(), 4);
    assert!(mix.window(20, 30).is_empty());
    assert_eq!(mix.frame_at(0.55), 6);
    assert_eq!(mix.frame_at(99.0), 10);
}

#[test]
fn rejects_bad_graph_parameters() {
    assert!(MixGraph::new(0, 1.0).is_err());
    assert!(MixGraph::new(48_000, 0.0).is_err());
    assert!(MixGraph::new(48_000, f64::NAN).is_err());
}
