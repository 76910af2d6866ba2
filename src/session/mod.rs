//! The frame loop: clocking, per-frame planning, and the render entry points.

pub mod clock;
pub mod control;
pub mod planner;
pub mod render_loop;
