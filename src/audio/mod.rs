pub mod mix;
pub mod music;
pub mod pcm;
