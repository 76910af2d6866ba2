use super::*;

fn schedule(n: usize) -> ClipSchedule {
    ClipSchedule::new(n, 3.0, 0.5).unwrap()
}

#[test]
fn kind_is_next_index_mod_three() {
    let kinds: Vec<_> = (0..7).map(TransitionKind::for_next_clip).collect();
    use TransitionKind::*;
    assert_eq!(
        kinds,
        [SlideUp, SlideLeft, CrossZoom, SlideUp, SlideLeft, CrossZoom, SlideUp]
    );
}

#[test]
fn transition_window_opens_after_display_time() {
    let s = schedule(5);
    assert_eq!(s.cycle_secs(), 15.0);

    match s.state_at(2.5) {
        ClipState::Display { clip, .. } => assert_eq!(clip, 0),
        other => panic!("2.5s should still be display, got {other:?}"),
    }
    assert!(!s.state_at(2.4).is_transition());

    match s.state_at(2.7) {
        ClipState::Transition { from, to, kind, .. } => {
            assert_eq!((from, to), (0, 1));
            assert_eq!(kind, TransitionKind::SlideLeft);
        }
        other => panic!("2.7s should be a transition, got {other:?}"),
    }
}

#[test]
fn cycles_through_clips() {
    let s = schedule(3);
    assert_eq!(s.state_at(0.0).base_clip(), 0);
    assert_eq!(s.state_at(3.1).base_clip(), 1);
    assert_eq!(s.state_at(6.1).base_clip(), 2);
    assert_eq!(s.state_at(9.1).base_clip(), 0);
    match s.state_at(8.9) {
        ClipState::Transition { from, to, kind, .. } => {
            assert_eq!((from, to), (2, 0));
            assert_eq!(kind, TransitionKind::SlideUp);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn single_clip_transitions_into_itself() {
    let s = schedule(1);
    match s.state_at(2.9) {
        ClipState::Transition { from, to, kind, .. } => {
            assert_eq!((from, to), (0, 0));
            assert_eq!(kind, TransitionKind::SlideUp);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn progress_and_easing() {
    let s = schedule(2);
    let st = s.state_at(1.5);
    assert!((st.base_progress() - 0.5).abs() < 1e-12);

    match s.state_at(2.75) {
        ClipState::Transition {
            progress,
            linear,
            eased,
            ..
        } => {
            assert!((progress - 2.75 / 3.0).abs() < 1e-12);
            assert!((linear - 0.5).abs() < 1e-9);
            assert!((eased - 0.5).abs() < 1e-9);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn layers_end_at_identity() {
    let canvas = Canvas::PORTRAIT;
    for kind in TransitionKind::ALL {
        let end = kind.layer(1.0, canvas);
        assert_eq!(end.opacity, 1.0);
        let p = end.transform * kurbo::Point::new(12.0, 34.0);
        assert!((p.x - 12.0).abs() < 1e-9 && (p.y - 34.0).abs() < 1e-9, "{kind:?}");
    }
}

#[test]
fn layers_start_offscreen_or_shrunk() {
    let canvas = Canvas::PORTRAIT;
    let up = TransitionKind::SlideUp.layer(0.0, canvas).transform * kurbo::Point::ORIGIN;
    assert_eq!((up.x, up.y), (0.0, 960.0));
    let left = TransitionKind::SlideLeft.layer(0.0, canvas).transform * kurbo::Point::ORIGIN;
    assert_eq!((left.x, left.y), (540.0, 0.0));

    let zoom = TransitionKind::CrossZoom.layer(0.0, canvas);
    assert_eq!(zoom.opacity, 0.0);
    let center = zoom.transform * canvas.center();
    assert!((center.x - 270.0).abs() < 1e-9 && (center.y - 480.0).abs() < 1e-9);
    let corner = zoom.transform * kurbo::Point::ORIGIN;
    assert!((corner.x - 270.0 * 0.15).abs() < 1e-9);
}

#[test]
fn rejects_bad_schedules() {
    assert!(ClipSchedule::new(0, 3.0, 0.5).unwrap_err().is_fatal_input());
    assert!(ClipSchedule::new(2, 0.0, 0.5).is_err());
    assert!(ClipSchedule::new(2, 3.0, 3.0).is_err());
    assert!(ClipSchedule::new(2, 3.0, 0.0).is_err());
}
