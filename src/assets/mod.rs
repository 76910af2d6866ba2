pub mod clips;
pub mod media;
