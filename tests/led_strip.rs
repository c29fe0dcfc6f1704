//! Host-level tests for the LED strip driver against a recording output line.

#[expect(dead_code, reason = "Each test binary uses a subset of the shared doubles")]
mod common;

use common::{RecordingLines, LAST_PIN};
use knob_strip::gpio::PinClaims;
use knob_strip::led_strip::{RgbOrder, max_brightness_for_current};
use knob_strip::{BLACK, Error, LedStrip, StripState, rgb};
use smart_leds::SmartLedsWrite;

type Strip<'a> = LedStrip<common::RecordingLine<'a>, 8>;

fn new_strip<'a>(lines: &mut RecordingLines<'a>, num_pixels: usize) -> Strip<'a> {
    LedStrip::new(lines, 0, num_pixels).unwrap()
}

#[test]
fn new_strip_is_dark_after_one_transmission() {
    let claims = PinClaims::new();
    let mut lines = RecordingLines::new(&claims);
    let strip = new_strip(&mut lines, 5);

    assert_eq!(strip.state(), StripState::Ready);
    assert_eq!(strip.len(), 5);
    assert_eq!(strip.pin(), Some(0));
    assert!(strip.pixels().iter().all(|pixel| *pixel == BLACK));

    let wire = lines.wire();
    let wire = wire.borrow();
    assert_eq!(wire.frames().len(), 1);
    assert_eq!(wire.frames()[0], vec![0; 15]);
    assert!(claims.is_claimed(0));
}

#[test]
fn zero_pixels_is_rejected_before_claiming() {
    let claims = PinClaims::new();
    let mut lines = RecordingLines::new(&claims);

    let result = Strip::new(&mut lines, 0, 0);
    assert!(matches!(result, Err(Error::InvalidConfiguration)));
    assert!(matches!(Strip::new(&mut lines, 0, 9), Err(Error::InvalidConfiguration)));
    assert!(!claims.is_claimed(0));
    assert_eq!(lines.wire().borrow().bit_count(), 0);
}

#[test]
fn set_pixel_clamps_and_show_sends_wire_order() {
    let claims = PinClaims::new();
    let mut lines = RecordingLines::new(&claims);
    let mut strip = new_strip(&mut lines, 5);

    strip.set_pixel(0, 300, -10, 128).unwrap();
    assert_eq!(strip.pixel(0), Some(rgb(255, 0, 128)));
    // Nothing is committed until show.
    assert_eq!(lines.wire().borrow().frames().len(), 1);

    strip.show().unwrap();
    let wire = lines.wire();
    let wire = wire.borrow();
    assert_eq!(wire.frames().len(), 2);
    let frame = wire.last_frame().unwrap();
    assert_eq!(frame.len(), 5 * 3);
    // Green, red, blue.
    assert_eq!(&frame[..3], &[0, 255, 128]);
    assert!(frame[3..].iter().all(|byte| *byte == 0));
}

#[test]
fn bits_go_out_msb_first() {
    let claims = PinClaims::new();
    let mut lines = RecordingLines::new(&claims);
    let mut strip = new_strip(&mut lines, 1);

    strip.set_pixel(0, 0x01, 0x80, 0xA5).unwrap();
    strip.show().unwrap();

    let wire = lines.wire();
    assert_eq!(wire.borrow().last_frame().unwrap(), &[0x80, 0x01, 0xA5]);
    assert_eq!(wire.borrow().bit_count(), 2 * 24);
}

#[test]
fn color_order_is_a_type_parameter() {
    let claims = PinClaims::new();
    let mut lines = RecordingLines::new(&claims);
    let mut strip = LedStrip::<_, 4, RgbOrder>::new(&mut lines, 3, 2).unwrap();

    strip.set_pixel(1, 10, 20, 30).unwrap();
    strip.show().unwrap();
    assert_eq!(strip.pixel(1), Some(rgb(10, 20, 30)));
    assert_eq!(
        lines.wire().borrow().last_frame().unwrap(),
        &[0, 0, 0, 10, 20, 30]
    );
}

#[test]
fn out_of_range_index_is_reported_and_harmless() {
    let claims = PinClaims::new();
    let mut lines = RecordingLines::new(&claims);
    let mut strip = new_strip(&mut lines, 5);
    strip.set_pixel(2, 7, 7, 7).unwrap();
    let before = strip.pixels().to_vec();

    assert_eq!(strip.set_pixel(5, 1, 1, 1), Err(Error::IndexOutOfRange { len: 5 }));
    assert_eq!(strip.set_pixel(-1, 1, 1, 1), Err(Error::IndexOutOfRange { len: 5 }));
    assert_eq!(strip.set_pixel(u64::MAX, 1, 1, 1), Err(Error::IndexOutOfRange { len: 5 }));
    assert_eq!(strip.pixels(), before.as_slice());
    assert_eq!(strip.state(), StripState::Ready);
}

#[test]
fn set_pixel_five_on_five_pixels_leaves_all_dark() {
    let claims = PinClaims::new();
    let mut lines = RecordingLines::new(&claims);
    let mut strip = new_strip(&mut lines, 5);

    assert_eq!(strip.set_pixel(5, 1, 1, 1), Err(Error::IndexOutOfRange { len: 5 }));
    assert!(strip.pixels().iter().all(|pixel| *pixel == BLACK));
}

#[test]
fn fill_all_sets_every_pixel_for_any_length() {
    let claims = PinClaims::new();
    let mut lines = RecordingLines::new(&claims);
    for num_pixels in 1..=8 {
        let mut strip = new_strip(&mut lines, num_pixels);
        strip.fill_all(-5, 64, 1_000).unwrap();
        assert_eq!(strip.len(), num_pixels);
        assert!(strip.pixels().iter().all(|pixel| *pixel == rgb(0, 64, 255)));
    }
}

#[test]
fn clear_matches_fill_all_black() {
    let claims = PinClaims::new();
    let mut lines = RecordingLines::new(&claims);
    let mut cleared = new_strip(&mut lines, 4);
    cleared.fill_all(9, 8, 7).unwrap();
    cleared.clear().unwrap();
    let cleared_pixels = cleared.pixels().to_vec();
    cleared.release().unwrap();

    let mut filled = new_strip(&mut lines, 4);
    filled.fill_all(9, 8, 7).unwrap();
    filled.fill_all(0, 0, 0).unwrap();
    assert_eq!(filled.pixels(), cleared_pixels.as_slice());
}

#[test]
fn release_turns_off_frees_pin_and_is_idempotent() {
    let claims = PinClaims::new();
    let mut lines = RecordingLines::new(&claims);
    let mut strip = new_strip(&mut lines, 3);
    strip.fill_all(255, 255, 255).unwrap();
    strip.show().unwrap();

    strip.release().unwrap();
    assert_eq!(strip.state(), StripState::Released);
    assert_eq!(strip.pin(), None);
    assert!(!claims.is_claimed(0));

    let wire = lines.wire();
    let frames_after_release = wire.borrow().frames().len();
    assert_eq!(wire.borrow().last_frame().unwrap(), &[0; 9]);

    strip.release().unwrap();
    assert_eq!(wire.borrow().frames().len(), frames_after_release);
}

#[test]
fn every_operation_after_release_fails() {
    let claims = PinClaims::new();
    let mut lines = RecordingLines::new(&claims);
    let mut strip = new_strip(&mut lines, 3);
    strip.release().unwrap();
    let bits = lines.wire().borrow().bit_count();

    assert_eq!(strip.set_pixel(0, 1, 2, 3), Err(Error::UseAfterRelease));
    assert_eq!(strip.fill_all(1, 2, 3), Err(Error::UseAfterRelease));
    assert_eq!(strip.clear(), Err(Error::UseAfterRelease));
    assert_eq!(strip.show(), Err(Error::UseAfterRelease));
    assert_eq!(strip.write([rgb(1, 2, 3)]), Err(Error::UseAfterRelease));
    assert_eq!(lines.wire().borrow().bit_count(), bits);
}

#[test]
fn dropping_the_strip_releases_it() {
    let claims = PinClaims::new();
    let mut lines = RecordingLines::new(&claims);
    {
        let mut strip = new_strip(&mut lines, 2);
        strip.fill_all(1, 1, 1).unwrap();
        strip.show().unwrap();
    }
    assert!(!claims.is_claimed(0));
    assert_eq!(lines.wire().borrow().last_frame().unwrap(), &[0; 6]);
}

#[test]
fn pin_cannot_be_claimed_twice() {
    let claims = PinClaims::new();
    let mut lines = RecordingLines::new(&claims);
    let mut first = new_strip(&mut lines, 2);

    assert!(matches!(
        Strip::new(&mut lines, 0, 2),
        Err(Error::PeripheralUnavailable { pin: 0 })
    ));
    // Still only the first strip's frame.
    assert_eq!(lines.wire().borrow().frames().len(), 1);

    first.release().unwrap();
    assert!(Strip::new(&mut lines, 0, 2).is_ok());
}

#[test]
fn pins_the_platform_lacks_are_unavailable() {
    let claims = PinClaims::new();
    let mut lines = RecordingLines::new(&claims);
    let pin = LAST_PIN + 1;
    assert!(matches!(
        Strip::new(&mut lines, pin, 2),
        Err(Error::PeripheralUnavailable { pin: 30 })
    ));
}

#[test]
fn failed_first_frame_gives_the_pin_back() {
    let claims = PinClaims::new();
    let mut lines = RecordingLines::new(&claims);
    lines.wire().borrow_mut().set_failing(true);

    assert!(matches!(Strip::new(&mut lines, 0, 2), Err(Error::Transmission)));
    assert!(!claims.is_claimed(0));
    assert!(lines.wire().borrow().frames().is_empty());
}

#[test]
fn failed_show_is_reported_not_retried() {
    let claims = PinClaims::new();
    let mut lines = RecordingLines::new(&claims);
    let mut strip = new_strip(&mut lines, 2);
    strip.set_pixel(1, 0, 0, 9).unwrap();

    let wire = lines.wire();
    wire.borrow_mut().set_failing(true);
    assert_eq!(strip.show(), Err(Error::Transmission));
    assert_eq!(strip.state(), StripState::Ready);
    assert_eq!(wire.borrow().frames().len(), 1);

    wire.borrow_mut().set_failing(false);
    strip.show().unwrap();
    assert_eq!(wire.borrow().last_frame().unwrap(), &[0, 0, 0, 0, 0, 9]);
}

#[test]
fn release_gives_the_pin_back_even_if_the_last_frame_fails() {
    let claims = PinClaims::new();
    let mut lines = RecordingLines::new(&claims);
    let mut strip = new_strip(&mut lines, 2);
    lines.wire().borrow_mut().set_failing(true);

    assert_eq!(strip.release(), Err(Error::Transmission));
    assert_eq!(strip.state(), StripState::Released);
    assert!(!claims.is_claimed(0));
    assert_eq!(strip.release(), Ok(()));
}

#[test]
fn smart_leds_write_overwrites_leading_pixels_and_shows() {
    let claims = PinClaims::new();
    let mut lines = RecordingLines::new(&claims);
    let mut strip = new_strip(&mut lines, 3);
    strip.fill_all(1, 1, 1).unwrap();

    strip.write([rgb(10, 0, 0), rgb(0, 20, 0)]).unwrap();
    assert_eq!(strip.pixels(), &[rgb(10, 0, 0), rgb(0, 20, 0), rgb(1, 1, 1)]);
    assert_eq!(
        lines.wire().borrow().last_frame().unwrap(),
        &[0, 10, 0, 20, 0, 0, 1, 1, 1]
    );

    // Extra colors are ignored.
    strip.write([rgb(5, 5, 5); 7]).unwrap();
    assert_eq!(strip.pixels(), &[rgb(5, 5, 5); 3]);
}

#[test]
fn brightness_cap_scales_only_the_wire() {
    let claims = PinClaims::new();
    let mut lines = RecordingLines::new(&claims);
    let mut strip = new_strip(&mut lines, 1).with_max_brightness(128);
    assert_eq!(strip.max_brightness(), 128);

    strip.set_pixel(0, 255, 100, 0).unwrap();
    strip.show().unwrap();
    assert_eq!(strip.pixel(0), Some(rgb(255, 100, 0)));
    // 100 * 128 / 255 = 50.
    assert_eq!(lines.wire().borrow().last_frame().unwrap(), &[50, 128, 0]);

    strip.set_max_brightness(max_brightness_for_current(strip.len(), 1_000));
    strip.show().unwrap();
    assert_eq!(lines.wire().borrow().last_frame().unwrap(), &[100, 255, 0]);
}
