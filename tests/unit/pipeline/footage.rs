use std::cell::Cell;

use super::*;

fn keywords() -> Vec<String> {
    vec!["neon".to_string(), "city".to_string()]
}

#[test]
fn builtin_has_four_generic_clips() {
    let footage = FallbackFootage::builtin();
    assert_eq!(footage.fallback().len(), 4);
    assert!(footage.fallback().iter().all(|l| l.ends_with(".mp4") || l.contains(".mp4?")));
}

#[test]
fn missing_credential_skips_the_provider() {
    let calls = Cell::new(0u32);
    let provider = |_k: &[String], _c: Option<&str>| -> anyhow::Result<Vec<String>> {
        calls.set(calls.get() + 1);
        Ok(vec!["found.mp4".to_string()])
    };
    let footage = FallbackFootage::new(provider);
    assert_eq!(footage.fetch(&keywords(), None), footage.fallback());
    assert_eq!(footage.fetch(&keywords(), Some("  ")), footage.fallback());
    assert_eq!(calls.get(), 0);
}

#[test]
fn provider_results_pass_through() {
    let provider = |k: &[String], c: Option<&str>| -> anyhow::Result<Vec<String>> {
        assert_eq!(c, Some("key"));
        Ok(k.iter().map(|w| format!("{w}.mp4")).collect())
    };
    let footage = FallbackFootage::new(provider);
    assert_eq!(footage.fetch(&keywords(), Some("key")), ["neon.mp4", "city.mp4"]);
}

#[test]
fn failure_or_empty_result_falls_back() {
    let failing = |_k: &[String], _c: Option<&str>| -> anyhow::Result<Vec<String>> {
        anyhow::bail!("HTTP 429")
    };
    let empty = |_k: &[String], _c: Option<&str>| -> anyhow::Result<Vec<String>> { Ok(Vec::new()) };

    let a = FallbackFootage::new(failing);
    assert_eq!(a.fetch(&keywords(), Some("key")), a.fallback());
    let b = FallbackFootage::new(empty).with_fallback(vec!["local.mp4".to_string()]);
    assert_eq!(b.search(&keywords(), Some("key")).unwrap(), ["local.mp4"]);
}

#[test]
fn empty_override_keeps_builtin_list() {
    let footage = FallbackFootage::builtin().with_fallback(Vec::new());
    assert_eq!(footage.fallback().len(), FALLBACK_FOOTAGE.len());
}
