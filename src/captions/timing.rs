/// One narration word and the interval it is on screen.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionWord {
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
}

impl CaptionWord {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_time && t <= self.end_time
    }

    /// Linear progress through the interval; 1.0 for degenerate intervals.
    pub fn progress_at(&self, t: f64) -> f64 {
        let d = self.duration();
        if d <= 0.0 {
            return 1.0;
        }
        (t - self.start_time) / d
    }
}

const SENTENCE_END: [char; 4] = ['.', '!', '?', '।'];

/// Relative on-screen time of a raw token.
///
/// `1 + 0.15 * clean_len`, plus 2 for a comma and 3 for a sentence-ending mark, where the
/// clean form keeps only Unicode letters and digits.
pub fn token_weight(raw: &str) -> f64 {
    let clean_len = raw.chars().filter(|c| c.is_alphanumeric()).count();
    let mut weight = 1.0 + 0.15 * clean_len as f64;
    if raw.contains(',') {
        weight += 2.0;
    }
    if raw.contains(SENTENCE_END) {
        weight += 3.0;
    }
    weight
}

/// Partition `[0, total_secs]` among the whitespace-separated tokens of `text`.
///
/// Intervals are contiguous. The last one ends exactly at `total_secs`. Empty text yields no
/// captions.
pub fn allocate_captions(text: &str, total_secs: f64) -> Vec<CaptionWord> {
    let tokens: Vec<(&str, f64)> = text
        .split_whitespace()
        .map(|t| (t, token_weight(t)))
        .collect();
    if tokens.is_empty() {
        return Vec::new();
    }

    let total_weight: f64 = tokens.iter().map(|(_, w)| w).sum();
    let per_unit = total_secs / total_weight;

    let last = tokens.len() - 1;
    let mut cursor = 0.0;
    let mut out = Vec::with_capacity(tokens.len());
    for (i, (token, weight)) in tokens.into_iter().enumerate() {
        let end = if i == last {
            total_secs
        } else {
            cursor + weight * per_unit
        };
        out.push(CaptionWord {
            text: token.to_string(),
            start_time: cursor,
            end_time: end,
        });
        cursor = end;
    }
    out
}

/// First caption whose closed interval contains `t`.
pub fn active_caption(captions: &[CaptionWord], t: f64) -> Option<&CaptionWord> {
    // Intervals are sorted and contiguous; find the first that has not ended yet.
    let idx = captions.partition_point(|c| c.end_time < t);
    captions.get(idx).filter(|c| c.contains(t))
}

#[cfg(test)]
#[path = "../../tests/unit/captions/timing.rs"]
mod tests;
