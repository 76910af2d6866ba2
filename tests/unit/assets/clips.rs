use super::*;

fn solid_opener(locator: &str, _timeout: Duration) -> ReelResult<Box<dyn ClipSource>> {
    if locator.starts_with("bad") {
        return Err(ReelError::media(format!("cannot open {locator}")));
    }
    Ok(Box::new(SolidClip::new(locator, 8, 6, [10, 20, 30, 255])))
}

fn locs(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn skips_failed_sources_and_keeps_order() {
    let loaded = load_clips(
        &solid_opener,
        &locs(&["a", "bad-1", "b", "bad-2", "c"]),
        CLIP_READY_TIMEOUT,
    )
    .unwrap();
    let order: Vec<&str> = loaded.clips.iter().map(|c| c.locator()).collect();
    assert_eq!(order, ["a", "b", "c"]);
    assert_eq!(loaded.skipped.len(), 2);
    assert_eq!(loaded.skipped[0].locator, "bad-1");
    assert!(loaded.skipped[1].reason.contains("bad-2"));
    assert_eq!(loaded.dimensions(), vec![(8, 6); 3]);
}

#[test]
fn empty_result_is_fatal() {
    let err = load_clips(&solid_opener, &locs(&["bad-a", "bad-b"]), CLIP_READY_TIMEOUT)
        .err()
        .unwrap();
    assert!(err.is_fatal_input());

    let err = load_clips(&solid_opener, &[], CLIP_READY_TIMEOUT).err().unwrap();
    assert!(err.is_fatal_input());
}

#[test]
fn opener_receives_the_ready_timeout() {
    let opener = |locator: &str, timeout: Duration| -> ReelResult<Box<dyn ClipSource>> {
        assert_eq!(timeout, Duration::from_millis(3000));
        Ok(Box::new(SolidClip::new(locator, 2, 2, [0, 0, 0, 255])))
    };
    let loaded = load_clips(&opener, &locs(&["x"]), CLIP_READY_TIMEOUT).unwrap();
    assert_eq!(loaded.len(), 1);
}

#[test]
fn solid_clip_premultiplies() {
    let mut clip = SolidClip::new("s", 2, 1, [255, 0, 0, 128]);
    let frame = clip.frame_at(12.0).unwrap();
    assert_eq!(frame.rgba8_premul.as_slice(), &[128, 0, 0, 128, 128, 0, 0, 128]);
}

#[test]
fn decode_size_never_upscales_and_stays_even() {
    let canvas = Canvas {
        width: 540,
        height: 960,
    };
    assert_eq!(decode_size(640, 360, canvas), (640, 360));

    let (w, h) = decode_size(3840, 2160, canvas);
    assert!(w < 3840 && h < 2160);
    assert!(w.is_multiple_of(2) && h.is_multiple_of(2));
    let cover = (f64::from(canvas.width) / f64::from(w)).max(f64::from(canvas.height) / f64::from(h));
    assert!(cover * MAX_MOTION_SCALE <= 1.0 + 1e-3);
}

fn sleeper() -> Option<ProcessHandle> {
    std::process::Command::new("sleep")
        .arg("30")
        .spawn()
        .ok()
        .map(ProcessHandle::from_child)
}

#[test]
fn abandoning_a_load_kills_its_process() {
    let Some(process) = sleeper() else {
        eprintln!("skipping: `sleep` not available");
        return;
    };
    let watch = LoadWatch::default();
    watch.track(process.clone());
    assert!(!process.has_exited());
    watch.abandon();
    assert!(watch.is_abandoned());
    assert!(process.has_exited());
}

#[test]
fn process_tracked_after_abandon_is_killed_at_once() {
    let Some(process) = sleeper() else {
        eprintln!("skipping: `sleep` not available");
        return;
    };
    let watch = LoadWatch::default();
    watch.abandon();
    watch.track(process.clone());
    assert!(process.has_exited());
}
