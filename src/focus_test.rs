// Unit tests for focus-signal arbitration

use super::*;

fn gain(target: &str, source: SignalSource, at_ms: f64) -> FocusSignal {
    FocusSignal {
        target: Some(target.to_string()),
        frame: None,
        source,
        at_ms,
        to_trigger: false,
    }
}

fn blur(at_ms: f64, to_trigger: bool) -> FocusSignal {
    FocusSignal {
        target: None,
        frame: None,
        source: SignalSource::Blur,
        at_ms,
        to_trigger,
    }
}

#[test]
fn test_no_signals_no_active_field() {
    assert_eq!(arbitrate(&[], 1000.0), None);
}

#[test]
fn test_most_recent_signal_wins() {
    let signals = vec![
        gain("#first", SignalSource::Focus, 100.0),
        gain("#second", SignalSource::Click, 200.0),
    ];
    let active = arbitrate(&signals, 300.0).unwrap();
    assert_eq!(active.selector, "#second");
}

#[test]
fn test_timestamp_tie_breaks_by_source_priority() {
    // Same instant: focus beats mutation regardless of queue order
    let signals = vec![
        gain("#styled", SignalSource::Mutation, 100.0),
        gain("#focused", SignalSource::Focus, 100.0),
    ];
    let active = arbitrate(&signals, 200.0).unwrap();
    assert_eq!(active.selector, "#focused");

    let reversed = vec![
        gain("#focused", SignalSource::Focus, 100.0),
        gain("#styled", SignalSource::Mutation, 100.0),
    ];
    let active = arbitrate(&reversed, 200.0).unwrap();
    assert_eq!(active.selector, "#focused");
}

#[test]
fn test_poll_confirms_when_nothing_newer() {
    let signals = vec![
        gain("#field", SignalSource::Mutation, 100.0),
        gain("#field", SignalSource::Poll, 600.0),
    ];
    let active = arbitrate(&signals, 700.0).unwrap();
    assert_eq!(active.selector, "#field");
}

#[test]
fn test_blur_clears_after_grace() {
    let signals = vec![
        gain("#field", SignalSource::Focus, 100.0),
        blur(200.0, false),
    ];
    // Within the grace period the field stays active
    let active = arbitrate(&signals, 200.0 + BLUR_GRACE_MS - 1.0);
    assert_eq!(active.unwrap().selector, "#field");
    // After the grace period the field is cleared
    assert_eq!(arbitrate(&signals, 200.0 + BLUR_GRACE_MS + 1.0), None);
}

#[test]
fn test_trailing_blur_expires_against_the_wall_clock() {
    // No signals arrive after the blur; evaluated at the wall clock the
    // grace period still runs out and the field clears
    let blurred_at = now_ms() - BLUR_GRACE_MS - 50.0;
    let signals = vec![
        gain("#field", SignalSource::Focus, blurred_at - 100.0),
        blur(blurred_at, false),
    ];
    assert_eq!(arbitrate(&signals, now_ms()), None);
}

#[test]
fn test_now_ms_is_on_the_page_clock_scale() {
    // Date.now() scale: milliseconds since the epoch
    assert!(now_ms() > 1.6e12);
}

#[test]
fn test_blur_to_trigger_keeps_field_active() {
    // Focus moved to the trigger control: the click must register before
    // the button disappears, so the field stays active
    let signals = vec![
        gain("#field", SignalSource::Focus, 100.0),
        blur(200.0, true),
    ];
    let active = arbitrate(&signals, 10_000.0).unwrap();
    assert_eq!(active.selector, "#field");
}

#[test]
fn test_refocus_after_blur_wins() {
    let signals = vec![
        gain("#first", SignalSource::Focus, 100.0),
        blur(200.0, false),
        gain("#second", SignalSource::Click, 300.0),
    ];
    let active = arbitrate(&signals, 10_000.0).unwrap();
    assert_eq!(active.selector, "#second");
}

#[test]
fn test_frame_carried_through() {
    let mut signal = gain("#inner", SignalSource::Focus, 100.0);
    signal.frame = Some(2);
    let active = arbitrate(&[signal], 200.0).unwrap();
    assert_eq!(active.frame, Some(2));
}

#[test]
fn test_signal_deserializes_from_page_json() {
    let json = r##"{
        "target": "#email",
        "frame": null,
        "source": "mousedown",
        "at_ms": 1700000000000.0,
        "to_trigger": false
    }"##;
    let signal: FocusSignal = serde_json::from_str(json).unwrap();
    assert_eq!(signal.source, SignalSource::Mousedown);
    assert_eq!(signal.target.as_deref(), Some("#email"));
}
