use crate::{
    captions::{
        style::KineticCaption,
        timing::{CaptionWord, active_caption},
    },
    effects::{
        ken_burns::{KenBurns, Placement},
        transitions::{ClipSchedule, ClipState, TransitionLayer},
    },
    foundation::core::{Affine, Canvas},
    foundation::error::{ReelError, ReelResult},
};

/// One clip to draw and where.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlannedClip {
    pub clip: usize,
    pub placement: Placement,
    /// Present only for the incoming clip of a transition.
    pub transition: Option<TransitionLayer>,
}

impl PlannedClip {
    /// Source pixel space → canvas space, including any transition transform.
    pub fn transform(&self, src_width: u32, src_height: u32) -> Affine {
        let base = self.placement.to_affine(src_width, src_height);
        match self.transition {
            Some(layer) => layer.transform * base,
            None => base,
        }
    }

    pub fn opacity(&self) -> f32 {
        self.transition.map_or(1.0, |l| l.opacity)
    }
}

/// Everything decided for one frame, before any pixels are touched.
#[derive(Clone, Debug, PartialEq)]
pub struct FramePlan {
    pub elapsed: f64,
    pub state: ClipState,
    /// Bottom to top.
    pub layers: Vec<PlannedClip>,
    pub caption: Option<KineticCaption>,
}

/// Pure mapping from elapsed time to a [`FramePlan`].
#[derive(Clone, Debug)]
pub struct FramePlanner {
    canvas: Canvas,
    schedule: ClipSchedule,
    clip_dims: Vec<(u32, u32)>,
    motions: Vec<KenBurns>,
    captions: Vec<CaptionWord>,
}

impl FramePlanner {
    pub fn new(
        canvas: Canvas,
        schedule: ClipSchedule,
        clip_dims: Vec<(u32, u32)>,
        captions: Vec<CaptionWord>,
    ) -> ReelResult<Self> {
        if clip_dims.len() != schedule.clip_count() {
            return Err(ReelError::validation(format!(
                "planner got {} clip sizes for a {}-clip schedule",
                clip_dims.len(),
                schedule.clip_count()
            )));
        }
        let motions = (0..clip_dims.len())
            .map(|i| KenBurns::for_clip(i as u64))
            .collect();
        Ok(Self {
            canvas,
            schedule,
            clip_dims,
            motions,
            captions,
        })
    }

    pub fn captions(&self) -> &[CaptionWord] {
        &self.captions
    }

    pub fn schedule(&self) -> &ClipSchedule {
        &self.schedule
    }

    fn place(&self, clip: usize, progress: f64) -> Placement {
        let (w, h) = self.clip_dims[clip];
        self.motions[clip].placement(w, h, self.canvas, progress)
    }

    pub fn plan(&self, elapsed: f64) -> FramePlan {
        let state = self.schedule.state_at(elapsed);

        let mut layers = Vec::with_capacity(2);
        layers.push(PlannedClip {
            clip: state.base_clip(),
            placement: self.place(state.base_clip(), state.base_progress()),
            transition: None,
        });
        if let ClipState::Transition { to, kind, eased, .. } = state {
            layers.push(PlannedClip {
                clip: to,
                // The incoming clip has not started its own motion yet.
                placement: self.place(to, 0.0),
                transition: Some(kind.layer(eased, self.canvas)),
            });
        }

        let caption = active_caption(&self.captions, elapsed).map(|w| KineticCaption::at(w, elapsed));

        FramePlan {
            elapsed,
            state,
            layers,
            caption,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/planner.rs"]
mod tests;
