//! Encoder sinks consuming `(frame, audio window)` pairs.

/// `ffmpeg`-based MP4 sink.
pub mod ffmpeg;
/// Sink contract and the in-memory sink.
pub mod sink;
