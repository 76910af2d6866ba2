//! Script model produced by the script provider and read by the engine.

use std::fmt;

/// Coarse emotional tag used to pick background music.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Energetic,
    Scary,
    Calm,
    Dramatic,
}

impl Mood {
    pub const ALL: [Mood; 4] = [Mood::Energetic, Mood::Scary, Mood::Calm, Mood::Dramatic];

    pub fn as_str(self) -> &'static str {
        match self {
            Mood::Energetic => "energetic",
            Mood::Scary => "scary",
            Mood::Calm => "calm",
            Mood::Dramatic => "dramatic",
        }
    }

    /// Case-insensitive parse; anything unknown is [`Mood::Energetic`].
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "scary" => Mood::Scary,
            "calm" => Mood::Calm,
            "dramatic" => Mood::Dramatic,
            _ => Mood::Energetic,
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> serde::Deserialize<'de> for Mood {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Mood::parse_lenient(&s))
    }
}

/// A generated short-form script. Immutable once produced.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Script {
    pub topic: String,
    pub title: String,
    pub description: String,
    pub hook: String,
    pub body: String,
    pub cta: String,
    pub tags: Vec<String>,
    pub visual_keywords: Vec<String>,
    pub mood: Mood,
}

impl Script {
    /// Text sent to the narration synthesizer and used for caption timing.
    pub fn narration_text(&self) -> String {
        format!("{} {} {}", self.hook, self.body, self.cta)
    }

    pub fn from_json_str(s: &str) -> crate::ReelResult<Self> {
        serde_json::from_str(s).map_err(|e| crate::ReelError::serde(e.to_string()))
    }
}

#[cfg(test)]
#[path = "../tests/unit/script.rs"]
mod tests;
