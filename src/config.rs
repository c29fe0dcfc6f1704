//! Compile-time settings for the knob-strip demo.
//!
//! `build.rs` exports `KNOB_STRIP_PIN` and `KNOB_STRIP_LEN` (overridable from the
//! environment at build time); everything else is a plain constant.

/// GPIO number of the strip's data line.
pub const STRIP_PIN: u8 = parse_u8(env!("KNOB_STRIP_PIN"));

/// Number of pixels on the strip.
pub const STRIP_LEN: usize = parse_usize(env!("KNOB_STRIP_LEN"));

/// Static capacity of the firmware's pixel buffer.
pub const MAX_STRIP_LEN: usize = 64;

const _: () = assert!(STRIP_LEN >= 1, "KNOB_STRIP_LEN must be at least 1");
const _: () = assert!(STRIP_LEN <= MAX_STRIP_LEN, "KNOB_STRIP_LEN exceeds MAX_STRIP_LEN");

/// Button GPIO (wired to ground, internal pull-up).
pub const BUTTON_PIN: u8 = 12;

/// Knob (potentiometer) GPIO; ADC0 on the RP2040.
pub const KNOB_PIN: u8 = 26;

/// LCD I2C data and clock GPIOs.
pub const LCD_SDA_PIN: u8 = 4;
pub const LCD_SCL_PIN: u8 = 5;

/// Character LCD geometry.
pub const LCD_ROWS: u8 = 2;
pub const LCD_COLUMNS: usize = 16;

/// Default PCF8574 backpack address.
pub const LCD_I2C_ADDRESS: u8 = 0x27;

/// Delay between two polls of the knob and button.
pub const POLL_INTERVAL_MS: u32 = 100;

/// Holding the button this long stops the firmware's control loop.
pub const HOLD_TO_STOP_MS: u32 = 5_000;

/// Full-scale reading of the RP2040's 12-bit ADC.
pub const RP_ADC_MAX: u16 = 4095;

/// Parses a decimal `u8` at compile time.
///
/// # Panics
/// On an empty string, a non-digit, or a value above 255.
#[must_use]
pub const fn parse_u8(text: &str) -> u8 {
    let value = parse_usize(text);
    assert!(value <= 255, "value does not fit in u8");
    #[expect(clippy::cast_possible_truncation, reason = "Checked above")]
    let narrowed = value as u8;
    narrowed
}

/// Parses a decimal `usize` at compile time.
///
/// # Panics
/// On an empty string, a non-digit, or overflow.
#[must_use]
#[expect(
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing,
    clippy::cast_lossless,
    reason = "Index is bounded by the loop; digits are checked before subtracting"
)]
pub const fn parse_usize(text: &str) -> usize {
    let bytes = text.as_bytes();
    assert!(!bytes.is_empty(), "empty number");
    let mut value: usize = 0;
    let mut i = 0;
    while i < bytes.len() {
        let byte = bytes[i];
        assert!(byte.is_ascii_digit(), "not a decimal digit");
        let Some(shifted) = value.checked_mul(10) else {
            panic!("number too large");
        };
        let Some(next) = shifted.checked_add((byte - b'0') as usize) else {
            panic!("number too large");
        };
        value = next;
        i += 1;
    }
    value
}
