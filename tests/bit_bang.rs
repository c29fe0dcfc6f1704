//! Host-level tests for the bit-banged strip line.

#[expect(dead_code, reason = "Each test binary uses a subset of the shared doubles")]
mod common;

use common::{Event, Timeline, TimelineDelay, TimelinePin};
use knob_strip::gpio::{BitBangLine, OutputLine, PinClaims, Ws2812Timing};

fn new_line<'a>(claims: &'a PinClaims, timeline: &Timeline) -> BitBangLine<'a, TimelinePin, TimelineDelay> {
    BitBangLine::new(
        claims.claim(0).unwrap(),
        TimelinePin(timeline.clone()),
        TimelineDelay(timeline.clone()),
        Ws2812Timing::default(),
    )
    .unwrap()
}

#[test]
fn new_line_starts_low() {
    let claims = PinClaims::new();
    let timeline = Timeline::default();
    let line = new_line(&claims, &timeline);

    assert_eq!(line.pin(), 0);
    assert_eq!(timeline.borrow().as_slice(), &[Event::Low]);
}

#[test]
fn bits_follow_pulse_widths() {
    let claims = PinClaims::new();
    let timeline = Timeline::default();
    let mut line = new_line(&claims, &timeline);
    timeline.borrow_mut().clear();

    line.write_bit(true).unwrap();
    line.write_bit(false).unwrap();
    assert_eq!(
        timeline.borrow().as_slice(),
        &[
            Event::High,
            Event::WaitNs(800),
            Event::Low,
            Event::WaitNs(450),
            Event::High,
            Event::WaitNs(400),
            Event::Low,
            Event::WaitNs(850),
        ]
    );
}

#[test]
fn latch_holds_low_past_reset() {
    let claims = PinClaims::new();
    let timeline = Timeline::default();
    let mut line = new_line(&claims, &timeline);
    timeline.borrow_mut().clear();

    line.latch().unwrap();
    assert_eq!(
        timeline.borrow().as_slice(),
        &[Event::Low, Event::WaitNs(55_000)]
    );
}

#[test]
fn custom_timing_is_used() {
    let claims = PinClaims::new();
    let timeline = Timeline::default();
    let timing = Ws2812Timing {
        zero_high_ns: 300,
        zero_low_ns: 900,
        one_high_ns: 600,
        one_low_ns: 600,
        reset_us: 280,
    };
    let mut line = BitBangLine::new(
        claims.claim(4).unwrap(),
        TimelinePin(timeline.clone()),
        TimelineDelay(timeline.clone()),
        timing,
    )
    .unwrap();
    assert_eq!(line.timing(), timing);
    timeline.borrow_mut().clear();

    line.write_bit(false).unwrap();
    line.latch().unwrap();
    assert_eq!(
        timeline.borrow().as_slice(),
        &[
            Event::High,
            Event::WaitNs(300),
            Event::Low,
            Event::WaitNs(900),
            Event::Low,
            Event::WaitNs(280_000),
        ]
    );
}

#[test]
fn dropping_the_line_frees_its_pin() {
    let claims = PinClaims::new();
    let timeline = Timeline::default();
    let line = new_line(&claims, &timeline);
    assert!(claims.is_claimed(0));

    let (_pin, _delay) = line.into_parts();
    assert!(!claims.is_claimed(0));
}
