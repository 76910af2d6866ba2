use crate::foundation::{
    core::{Affine, Canvas, Rect},
    math::seeded_unit,
};

/// Cover scale multiplier leaving room to pan without exposing the background.
pub const COVER_SLACK: f64 = 1.25;
/// Zoom travel over one clip, relative to the baseline scale.
pub const ZOOM_RANGE: f64 = 0.10;
/// Share of the overscan used for panning.
pub const PAN_FRACTION: f64 = 0.4;
/// Largest scale relative to plain cover that a placement can reach.
pub const MAX_MOTION_SCALE: f64 = COVER_SLACK * (1.0 + ZOOM_RANGE);

/// Motion variant of one clip, derived from its index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KenBurns {
    pub zoom_in: bool,
    /// +1 or -1.
    pub pan_x: i8,
    /// +1 or -1.
    pub pan_y: i8,
}

/// Where a source of a given size lands on the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Maps source pixel space onto the placement rectangle.
    pub fn to_affine(&self, src_width: u32, src_height: u32) -> Affine {
        Affine::translate((self.x, self.y))
            * Affine::scale_non_uniform(
                self.width / f64::from(src_width.max(1)),
                self.height / f64::from(src_height.max(1)),
            )
    }

    pub fn covers(&self, canvas: Canvas) -> bool {
        let eps = 1e-9;
        self.x <= eps
            && self.y <= eps
            && self.x + self.width >= canvas.w() - eps
            && self.y + self.height >= canvas.h() - eps
    }
}

impl KenBurns {
    pub fn for_clip(seed: u64) -> Self {
        let dir = |offset| if seeded_unit(seed, offset) > 0.5 { 1 } else { -1 };
        Self {
            zoom_in: seeded_unit(seed, 1) > 0.5,
            pan_x: dir(2),
            pan_y: dir(3),
        }
    }

    /// Placement of a `src_width`×`src_height` source at clip progress `progress`.
    pub fn placement(
        &self,
        src_width: u32,
        src_height: u32,
        canvas: Canvas,
        progress: f64,
    ) -> Placement {
        let (sw, sh) = (f64::from(src_width.max(1)), f64::from(src_height.max(1)));
        let p = progress.clamp(0.0, 1.0);

        let base = (canvas.w() / sw).max(canvas.h() / sh) * COVER_SLACK;
        let travel = base * ZOOM_RANGE;
        let scale = if self.zoom_in {
            base + p * travel
        } else {
            base + travel - p * travel
        };

        let width = sw * scale;
        let height = sh * scale;
        let max_pan_x = (width - canvas.w()) * PAN_FRACTION;
        let max_pan_y = (height - canvas.h()) * PAN_FRACTION;

        Placement {
            x: (canvas.w() - width) / 2.0 + p * max_pan_x * f64::from(self.pan_x),
            y: (canvas.h() - height) / 2.0 + p * max_pan_y * f64::from(self.pan_y),
            width,
            height,
        }
    }
}

/// Ken Burns placement for clip `seed`.
pub fn ken_burns_placement(
    seed: u64,
    src_width: u32,
    src_height: u32,
    canvas: Canvas,
    progress: f64,
) -> Placement {
    KenBurns::for_clip(seed).placement(src_width, src_height, canvas, progress)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/ken_burns.rs"]
mod tests;
