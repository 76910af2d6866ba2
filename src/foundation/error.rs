/// Convenience result type used across reelsmith.
pub type ReelResult<T> = Result<T, ReelError>;

/// Pipeline stage owned by an external collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpstreamStage {
    /// Script generation from a niche/language prompt.
    Script,
    /// Stock footage discovery.
    Footage,
    /// Narration speech synthesis.
    Narration,
    /// Delivery of the finished video.
    Upload,
}

impl std::fmt::Display for UpstreamStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Script => "script",
            Self::Footage => "footage",
            Self::Narration => "narration",
            Self::Upload => "upload",
        };
        f.write_str(s)
    }
}

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Invalid configuration or caller-provided data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Input that makes the run impossible (silent narration, no usable footage).
    #[error("fatal input: {0}")]
    FatalInput(String),

    /// Probing, decoding or reading media failed.
    #[error("media error: {0}")]
    Media(String),

    /// The encoder sink failed to accept or finalize output.
    #[error("encode error: {0}")]
    Encode(String),

    /// An external collaborator failed; passed through unchanged.
    #[error("{stage} provider failed: {source}")]
    Upstream {
        /// Stage that failed.
        stage: UpstreamStage,
        /// Provider error.
        #[source]
        source: anyhow::Error,
    },

    /// The run was cancelled through its cancellation token.
    #[error("render cancelled")]
    Cancelled,

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::FatalInput`] value.
    pub fn fatal_input(msg: impl Into<String>) -> Self {
        Self::FatalInput(msg.into())
    }

    /// Build a [`ReelError::Media`] value.
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }

    /// Build a [`ReelError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`ReelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Wrap a collaborator failure for `stage`.
    pub fn upstream(stage: UpstreamStage, source: impl Into<anyhow::Error>) -> Self {
        Self::Upstream {
            stage,
            source: source.into(),
        }
    }

    /// `true` for errors that abort a run because its inputs are unusable.
    pub fn is_fatal_input(&self) -> bool {
        matches!(self, Self::FatalInput(_))
    }

    /// `true` for errors raised by an external collaborator.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
