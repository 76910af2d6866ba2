//! Caption timing and kinetic styling.

pub mod style;
pub mod timing;
