//! Output lines for single-wire LED strips.
//!
//! A strip talks to hardware through two seams:
//!
//! - [`LineAllocator`] hands out exclusive [`OutputLine`]s by GPIO number, backed by a
//!   [`PinClaims`] registry so the same pin can never be driven by two strips.
//! - [`OutputLine`] is the bit-level write primitive the strip's `show` serializes into.
//!
//! [`BitBangLine`] implements [`OutputLine`] on top of any `embedded-hal` output pin and
//! nanosecond delay. On the Pico the line is a PIO state machine instead; the clock and
//! FIFO arithmetic it needs ([`pio_clock_divider_bits`], [`pio_latch_wait_us`],
//! [`BitPacker`]) lives here so it can be checked off-target.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use portable_atomic::{AtomicU64, Ordering};

use crate::{Error, Result};

/// Registry of claimed GPIO numbers (0..=63), one bit per pin.
///
/// Usable from a `static`:
///
/// ```
/// use knob_strip::gpio::PinClaims;
///
/// static CLAIMS: PinClaims = PinClaims::new();
///
/// let first = CLAIMS.claim(2)?;
/// assert!(CLAIMS.claim(2).is_err());
/// drop(first);
/// assert!(CLAIMS.claim(2).is_ok());
/// # Ok::<(), knob_strip::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct PinClaims {
    claimed: AtomicU64,
}

impl PinClaims {
    /// An empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            claimed: AtomicU64::new(0),
        }
    }

    /// Claims `pin` until the returned guard is dropped.
    ///
    /// # Errors
    /// [`Error::PeripheralUnavailable`] if the pin is already claimed or above 63.
    pub fn claim(&self, pin: u8) -> Result<PinClaim<'_>> {
        let mask = pin_mask(pin)?;
        let previous = self.claimed.fetch_or(mask, Ordering::AcqRel);
        if previous & mask != 0 {
            return Err(Error::PeripheralUnavailable { pin });
        }
        debug!("GPIO {} claimed", pin);
        Ok(PinClaim { claims: self, pin })
    }

    /// Whether `pin` is currently claimed.
    #[must_use]
    pub fn is_claimed(&self, pin: u8) -> bool {
        pin_mask(pin).is_ok_and(|mask| self.claimed.load(Ordering::Acquire) & mask != 0)
    }
}

fn pin_mask(pin: u8) -> Result<u64> {
    1u64.checked_shl(u32::from(pin))
        .ok_or(Error::PeripheralUnavailable { pin })
}

/// Exclusive ownership of one GPIO number; released on drop.
#[derive(Debug)]
pub struct PinClaim<'a> {
    claims: &'a PinClaims,
    pin: u8,
}

impl PinClaim<'_> {
    /// The claimed GPIO number.
    #[must_use]
    pub const fn pin(&self) -> u8 {
        self.pin
    }
}

impl Drop for PinClaim<'_> {
    fn drop(&mut self) {
        if let Ok(mask) = pin_mask(self.pin) {
            self.claims.claimed.fetch_and(!mask, Ordering::AcqRel);
            debug!("GPIO {} released", self.pin);
        }
    }
}

/// A claimed data line that can clock out a single-wire LED frame one bit at a time.
///
/// A frame is a run of [`write_bit`](Self::write_bit) calls ended by [`latch`](Self::latch).
/// The protocol has no framing: a gap longer than the reset threshold between two bits
/// ends the frame early, so callers keep the whole frame inside one critical section.
pub trait OutputLine {
    /// GPIO number of the line.
    fn pin(&self) -> u8;

    /// Sends one protocol bit.
    ///
    /// # Errors
    /// [`Error::Transmission`] if the line could not be driven.
    fn write_bit(&mut self, bit: bool) -> Result<()>;

    /// Holds the line low past the reset threshold so the strip latches the frame.
    ///
    /// # Errors
    /// [`Error::Transmission`] if the line could not be driven.
    fn latch(&mut self) -> Result<()>;
}

/// Platform GPIO allocator: turns a GPIO number into an exclusive [`OutputLine`].
pub trait LineAllocator {
    /// The line type handed out.
    type Line: OutputLine;

    /// Claims `pin` as a digital output.
    ///
    /// # Errors
    /// [`Error::PeripheralUnavailable`] if the pin is taken or cannot be an output.
    fn claim(&mut self, pin: u8) -> Result<Self::Line>;
}

/// Pulse widths of the single-wire protocol, in nanoseconds (reset in microseconds).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ws2812Timing {
    pub zero_high_ns: u32,
    pub zero_low_ns: u32,
    pub one_high_ns: u32,
    pub one_low_ns: u32,
    pub reset_us: u32,
}

impl Ws2812Timing {
    /// WS2812B datasheet values with a reset gap comfortably above 50 µs.
    pub const WS2812B: Self = Self {
        zero_high_ns: 400,
        zero_low_ns: 850,
        one_high_ns: 800,
        one_low_ns: 450,
        reset_us: 55,
    };

    /// High and low time for one bit.
    #[must_use]
    pub const fn pulse(&self, bit: bool) -> (u32, u32) {
        if bit {
            (self.one_high_ns, self.one_low_ns)
        } else {
            (self.zero_high_ns, self.zero_low_ns)
        }
    }
}

impl Default for Ws2812Timing {
    fn default() -> Self {
        Self::WS2812B
    }
}

/// Protocol bit rate.
pub const WS2812_BIT_HZ: u32 = 800_000;

/// PIO state-machine cycles per protocol bit (high, data, and low phases).
pub const PIO_CYCLES_PER_BIT: u32 = 10;

const WS2812_BIT_NS: u32 = 1_000_000_000 / WS2812_BIT_HZ;

/// Raw bits of the PIO clock divider (16.8 fixed point) that runs the state machine at
/// [`PIO_CYCLES_PER_BIT`] cycles per protocol bit from a `sys_hz` system clock.
///
/// ```
/// use knob_strip::gpio::pio_clock_divider_bits;
///
/// // 125 MHz / 8 MHz = 15.625
/// assert_eq!(pio_clock_divider_bits(125_000_000), 15 * 256 + 160);
/// ```
#[must_use]
#[expect(clippy::arithmetic_side_effects, reason = "u32 operands widened to u64")]
pub fn pio_clock_divider_bits(sys_hz: u32) -> u32 {
    let pio_hz = u64::from(WS2812_BIT_HZ) * u64::from(PIO_CYCLES_PER_BIT);
    let bits = (u64::from(sys_hz) << 8) / pio_hz;
    u32::try_from(bits).unwrap_or(u32::MAX)
}

/// Microseconds to keep the line idle once the PIO FIFO is empty: the last byte is still
/// shifting out of the state machine, then the reset gap follows.
#[must_use]
pub fn pio_latch_wait_us(reset_us: u32) -> u32 {
    let shift_out_us = WS2812_BIT_NS.saturating_mul(8).div_ceil(1_000);
    reset_us.saturating_add(shift_out_us)
}

/// Packs protocol bits MSB-first into PIO FIFO words, one byte per word.
///
/// The state machine shifts left with an 8-bit pull threshold, so each byte sits in the
/// top of its word.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BitPacker {
    byte: u8,
    filled: u8,
}

impl BitPacker {
    #[must_use]
    pub const fn new() -> Self {
        Self { byte: 0, filled: 0 }
    }

    /// Adds one bit; returns the FIFO word once eight bits are in.
    #[expect(clippy::arithmetic_side_effects, reason = "Bit operations")]
    pub fn push(&mut self, bit: bool) -> Option<u32> {
        self.byte = (self.byte << 1) | u8::from(bit);
        self.filled = self.filled.saturating_add(1);
        (self.filled == 8).then(|| self.take())
    }

    /// Pads a partial byte with zero bits and returns it, or `None` if nothing is pending.
    pub fn flush(&mut self) -> Option<u32> {
        if self.filled == 0 {
            return None;
        }
        let missing = 8u8.saturating_sub(self.filled);
        self.byte = self.byte.checked_shl(u32::from(missing)).unwrap_or(0);
        Some(self.take())
    }

    /// Bits waiting for a full byte.
    #[must_use]
    pub const fn pending(&self) -> u8 {
        self.filled
    }

    #[expect(clippy::arithmetic_side_effects, reason = "Bit operations")]
    fn take(&mut self) -> u32 {
        let word = u32::from(self.byte) << 24;
        *self = Self::new();
        word
    }
}

/// Bit-banged [`OutputLine`] over an `embedded-hal` output pin.
///
/// Holds the [`PinClaim`] for its pin, so dropping the line frees the pin.
pub struct BitBangLine<'a, P, D> {
    claim: PinClaim<'a>,
    pin: P,
    delay: D,
    timing: Ws2812Timing,
}

impl<'a, P, D> BitBangLine<'a, P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    /// Wraps an already-configured output pin; drives it low.
    ///
    /// # Errors
    /// [`Error::Transmission`] if the pin cannot be driven low.
    pub fn new(claim: PinClaim<'a>, pin: P, delay: D, timing: Ws2812Timing) -> Result<Self> {
        let mut line = Self {
            claim,
            pin,
            delay,
            timing,
        };
        line.pin.set_low().map_err(|_| Error::Transmission)?;
        Ok(line)
    }

    /// The protocol timing in use.
    #[must_use]
    pub const fn timing(&self) -> Ws2812Timing {
        self.timing
    }

    /// Gives back the pin and delay; the claim is released.
    pub fn into_parts(self) -> (P, D) {
        (self.pin, self.delay)
    }
}

impl<P, D> OutputLine for BitBangLine<'_, P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    fn pin(&self) -> u8 {
        self.claim.pin()
    }

    fn write_bit(&mut self, bit: bool) -> Result<()> {
        let (high_ns, low_ns) = self.timing.pulse(bit);
        self.pin.set_high().map_err(|_| Error::Transmission)?;
        self.delay.delay_ns(high_ns);
        self.pin.set_low().map_err(|_| Error::Transmission)?;
        self.delay.delay_ns(low_ns);
        Ok(())
    }

    fn latch(&mut self) -> Result<()> {
        self.pin.set_low().map_err(|_| Error::Transmission)?;
        self.delay.delay_us(self.timing.reset_us);
        Ok(())
    }
}
