/// Generic clips used when no footage search is possible.
pub const FALLBACK_FOOTAGE: [&str; 4] = [
    "https://cdn.pixabay.com/vimeo/328940142/neon-21368.mp4?width=720&hash=85e8392131238682057790858e39145695861110",
    "https://cdn.pixabay.com/vimeo/382103328/particles-31367.mp4?width=720&hash=ef410651859c76b00b0051e5058721c5b8e96720",
    "https://cdn.pixabay.com/vimeo/452367154/network-47206.mp4?width=720&hash=d1e2e921d7023158022806307374007604500570",
    "https://cdn.pixabay.com/vimeo/518606403/cloud-65778.mp4?width=720&hash=648f322316e6f9d3434676518175787784013063",
];

/// Stock footage search: `(keywords, credential)` to clip locators in display order.
pub trait FootageProvider {
    fn search(&self, keywords: &[String], credential: Option<&str>) -> anyhow::Result<Vec<String>>;
}

impl<F> FootageProvider for F
where
    F: Fn(&[String], Option<&str>) -> anyhow::Result<Vec<String>>,
{
    fn search(&self, keywords: &[String], credential: Option<&str>) -> anyhow::Result<Vec<String>> {
        self(keywords, credential)
    }
}

/// Provider that has no search backend at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoFootageSearch;

impl FootageProvider for NoFootageSearch {
    fn search(&self, _keywords: &[String], _credential: Option<&str>) -> anyhow::Result<Vec<String>> {
        anyhow::bail!("no footage search backend configured")
    }
}

/// Wraps a provider so that a search never fails and never comes back empty.
///
/// A missing credential skips the inner provider entirely. Provider errors and empty results
/// are logged and replaced by the fallback list.
#[derive(Clone, Debug)]
pub struct FallbackFootage<P = NoFootageSearch> {
    inner: P,
    fallback: Vec<String>,
}

impl FallbackFootage<NoFootageSearch> {
    /// Fallback list only.
    pub fn builtin() -> Self {
        Self::new(NoFootageSearch)
    }
}

impl<P: FootageProvider> FallbackFootage<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            fallback: FALLBACK_FOOTAGE.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the fallback list. An empty list keeps the built-in one.
    pub fn with_fallback(mut self, fallback: Vec<String>) -> Self {
        if !fallback.is_empty() {
            self.fallback = fallback;
        }
        self
    }

    pub fn fallback(&self) -> &[String] {
        &self.fallback
    }

    /// Locators for `keywords`; always non-empty.
    pub fn fetch(&self, keywords: &[String], credential: Option<&str>) -> Vec<String> {
        let Some(credential) = credential.filter(|c| !c.trim().is_empty()) else {
            tracing::warn!("no footage credential provided, using fallback footage");
            return self.fallback.clone();
        };
        match self.inner.search(keywords, Some(credential)) {
            Ok(found) if !found.is_empty() => {
                tracing::debug!(clips = found.len(), "footage search succeeded");
                found
            }
            Ok(_) => {
                tracing::warn!(?keywords, "footage search returned nothing, using fallback footage");
                self.fallback.clone()
            }
            Err(err) => {
                tracing::warn!(error = %err, "footage search failed, using fallback footage");
                self.fallback.clone()
            }
        }
    }
}

impl<P: FootageProvider> FootageProvider for FallbackFootage<P> {
    fn search(&self, keywords: &[String], credential: Option<&str>) -> anyhow::Result<Vec<String>> {
        Ok(self.fetch(keywords, credential))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/footage.rs"]
mod tests;
