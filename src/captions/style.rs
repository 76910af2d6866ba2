use crate::{
    animation::ease::Ease,
    captions::timing::CaptionWord,
    foundation::core::{Affine, Canvas, Rgba8, Vec2},
};

/// Latin keywords that get the shaking accent treatment, compared letters-only.
pub const VIRAL_WORDS: [&str; 9] = [
    "SUBSCRIBE", "LIKE", "WARNING", "STOP", "MONEY", "SECRET", "FACT", "CRAZY", "WTF",
];

/// Hindi equivalents of the viral keywords, compared against the whole word.
pub const VIRAL_WORDS_NON_LATIN: [&str; 4] = ["सब्सक्राइब", "लाइक", "पैसा", "सच"];

pub const PRONOUNS: [&str; 4] = ["YOU", "I", "WE", "THEY"];

const WOBBLE_DEG: f64 = 3.0;
const WOBBLE_RATE: f64 = 3.0;
const SHAKE_DEG: f64 = 8.0;
const SHAKE_RATE: f64 = 40.0;
/// Fraction of the word interval spent popping in.
const POP_IN_SPEED: f64 = 2.5;

/// Font metrics for the caption layer.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CaptionStyle {
    pub font_size: f32,
    pub stroke_width: f64,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_size: 72.0,
            stroke_width: 15.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    Viral,
    Pronoun,
    Plain,
}

impl Emphasis {
    /// Classify an uppercased caption.
    pub fn classify(upper: &str) -> Self {
        let letters: String = upper.chars().filter(|c| c.is_ascii_alphabetic()).collect();
        if VIRAL_WORDS.contains(&letters.as_str()) {
            return Self::Viral;
        }
        if VIRAL_WORDS_NON_LATIN.contains(&upper) {
            return Self::Viral;
        }
        if PRONOUNS.contains(&letters.as_str()) {
            return Self::Pronoun;
        }
        Self::Plain
    }

    pub fn paint(self) -> TextPaint {
        match self {
            Self::Viral => TextPaint {
                fill: Rgba8::opaque(0xFF, 0x00, 0x33),
                outline: Rgba8::BLACK,
                glitch: Some(GlitchLayer {
                    color: Rgba8::opaque(0, 255, 255).with_alpha_f32(0.5),
                    offset: Vec2::new(-4.0, 0.0),
                }),
            },
            Self::Pronoun => TextPaint {
                fill: Rgba8::opaque(0x00, 0xF0, 0xFF),
                outline: Rgba8::BLACK,
                glitch: None,
            },
            Self::Plain => TextPaint {
                fill: Rgba8::WHITE,
                outline: Rgba8::BLACK.with_alpha_f32(0.8),
                glitch: None,
            },
        }
    }
}

/// Extra fill pass drawn over the main fill, shifted in text space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GlitchLayer {
    pub color: Rgba8,
    pub offset: Vec2,
}

/// Outline-then-fill colors for one caption.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextPaint {
    pub fill: Rgba8,
    pub outline: Rgba8,
    pub glitch: Option<GlitchLayer>,
}

/// Fully resolved caption for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct KineticCaption {
    /// Trimmed, uppercased text.
    pub text: String,
    pub scale: f64,
    /// Wobble plus shake, radians.
    pub rotation: f64,
    pub emphasis: Emphasis,
}

impl KineticCaption {
    /// Style `word` as seen at elapsed time `t`.
    pub fn at(word: &CaptionWord, t: f64) -> Self {
        let text = word.text.trim().to_uppercase();
        let progress = word.progress_at(t);
        let scale = Ease::OutElastic.apply((progress * POP_IN_SPEED).min(1.0));

        let emphasis = Emphasis::classify(&text);
        let mut rotation = (t * WOBBLE_RATE).sin() * WOBBLE_DEG.to_radians();
        if emphasis == Emphasis::Viral {
            rotation += ((t * SHAKE_RATE).sin() * SHAKE_DEG).to_radians();
        }

        Self {
            text,
            scale,
            rotation,
            emphasis,
        }
    }

    /// Maps text space (origin at the text's center) to canvas space.
    pub fn transform(&self, canvas: Canvas) -> Affine {
        Affine::translate(canvas.center().to_vec2())
            * Affine::scale(self.scale)
            * Affine::rotate(self.rotation)
    }

    pub fn paint(&self) -> TextPaint {
        self.emphasis.paint()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/captions/style.rs"]
mod tests;
