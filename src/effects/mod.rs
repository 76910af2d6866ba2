//! Per-clip camera motion and clip-boundary transitions.

pub mod ken_burns;
pub mod transitions;
