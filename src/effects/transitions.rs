use crate::{
    animation::ease::Ease,
    foundation::core::{Affine, Canvas},
    foundation::error::{ReelError, ReelResult},
};

/// How the incoming clip enters over the outgoing one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// Enters from below the frame.
    SlideUp,
    /// Enters from the right edge.
    SlideLeft,
    /// Fades in while growing from 85% about the frame center.
    CrossZoom,
}

/// Transform and opacity applied on top of the incoming clip's own placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionLayer {
    pub transform: Affine,
    pub opacity: f32,
}

const CROSS_ZOOM_FROM: f64 = 0.85;

impl TransitionKind {
    pub const ALL: [TransitionKind; 3] = [Self::SlideUp, Self::SlideLeft, Self::CrossZoom];

    /// Kind used when clip `next` enters.
    pub fn for_next_clip(next: usize) -> Self {
        Self::ALL[next % Self::ALL.len()]
    }

    pub fn layer(self, eased: f64, canvas: Canvas) -> TransitionLayer {
        let e = eased.clamp(0.0, 1.0);
        match self {
            Self::SlideUp => slide_up(e, canvas),
            Self::SlideLeft => slide_left(e, canvas),
            Self::CrossZoom => cross_zoom(e, canvas),
        }
    }
}

fn slide_up(e: f64, canvas: Canvas) -> TransitionLayer {
    TransitionLayer {
        transform: Affine::translate((0.0, canvas.h() * (1.0 - e))),
        opacity: 1.0,
    }
}

fn slide_left(e: f64, canvas: Canvas) -> TransitionLayer {
    TransitionLayer {
        transform: Affine::translate((canvas.w() * (1.0 - e), 0.0)),
        opacity: 1.0,
    }
}

fn cross_zoom(e: f64, canvas: Canvas) -> TransitionLayer {
    let scale = CROSS_ZOOM_FROM + (1.0 - CROSS_ZOOM_FROM) * e;
    let c = canvas.center().to_vec2();
    TransitionLayer {
        transform: Affine::translate(c) * Affine::scale(scale) * Affine::translate(-c),
        opacity: e as f32,
    }
}

/// Which clip(s) are on screen at a moment of the cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClipState {
    Display {
        clip: usize,
        /// Ken Burns progress of `clip`, in `[0, 1)`.
        progress: f64,
    },
    Transition {
        from: usize,
        to: usize,
        kind: TransitionKind,
        /// Ken Burns progress of `from`; `to` is pinned at 0.
        progress: f64,
        /// Linear progress through the transition window.
        linear: f64,
        eased: f64,
    },
}

impl ClipState {
    /// Clip drawn as the base layer.
    pub fn base_clip(&self) -> usize {
        match *self {
            Self::Display { clip, .. } => clip,
            Self::Transition { from, .. } => from,
        }
    }

    pub fn base_progress(&self) -> f64 {
        match *self {
            Self::Display { progress, .. } | Self::Transition { progress, .. } => progress,
        }
    }

    pub fn is_transition(&self) -> bool {
        matches!(self, Self::Transition { .. })
    }
}

/// Fixed-length cyclic schedule over an ordered clip set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipSchedule {
    clip_count: usize,
    clip_duration: f64,
    transition_duration: f64,
}

impl ClipSchedule {
    pub fn new(clip_count: usize, clip_duration: f64, transition_duration: f64) -> ReelResult<Self> {
        if clip_count == 0 {
            return Err(ReelError::fatal_input("clip schedule needs at least one clip"));
        }
        if !clip_duration.is_finite() || clip_duration <= 0.0 {
            return Err(ReelError::validation("clip duration must be finite and > 0"));
        }
        if !transition_duration.is_finite()
            || transition_duration <= 0.0
            || transition_duration >= clip_duration
        {
            return Err(ReelError::validation(
                "transition duration must be > 0 and shorter than the clip duration",
            ));
        }
        Ok(Self {
            clip_count,
            clip_duration,
            transition_duration,
        })
    }

    pub fn clip_count(&self) -> usize {
        self.clip_count
    }

    /// Length of one pass over every clip.
    pub fn cycle_secs(&self) -> f64 {
        self.clip_count as f64 * self.clip_duration
    }

    pub fn state_at(&self, elapsed: f64) -> ClipState {
        let normalized = elapsed.max(0.0).rem_euclid(self.cycle_secs());
        let current = ((normalized / self.clip_duration).floor() as usize) % self.clip_count;
        let next = (current + 1) % self.clip_count;
        let clip_time = normalized.rem_euclid(self.clip_duration);
        let progress = clip_time / self.clip_duration;

        let window_start = self.clip_duration - self.transition_duration;
        if clip_time > window_start {
            let linear = ((clip_time - window_start) / self.transition_duration).clamp(0.0, 1.0);
            ClipState::Transition {
                from: current,
                to: next,
                kind: TransitionKind::for_next_clip(next),
                progress,
                linear,
                eased: Ease::Smoothstep.apply(linear),
            }
        } else {
            ClipState::Display {
                clip: current,
                progress,
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/transitions.rs"]
mod tests;
