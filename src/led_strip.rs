//! A device abstraction for WS2812-style LED strips on a single data line.
//! See [`LedStrip`] for the main usage example.

use core::marker::PhantomData;

use smart_leds::SmartLedsWrite;

use crate::gpio::{LineAllocator, OutputLine};
use crate::pixel_buffer::{PixelBuffer, Rgb};
use crate::{Error, Result};

/// Current drawn by one pixel at full white, used by [`max_brightness_for_current`].
pub const MILLIAMPS_PER_PIXEL: u32 = 60;

/// Channel order expected on the wire by a given LED part.
///
/// The pixel buffer always stores RGB; reordering happens only while serializing.
pub trait ColorOrder {
    /// The three channel bytes in transmission order.
    fn channels(color: Rgb) -> [u8; 3];
}

/// Green, red, blue: WS2812B and most clones.
#[derive(Clone, Copy, Debug, Default)]
pub struct GrbOrder;

/// Red, green, blue: WS2811 and some APA106 parts.
#[derive(Clone, Copy, Debug, Default)]
pub struct RgbOrder;

/// Blue, red, green: a few WS2811 strip variants.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrgOrder;

impl ColorOrder for GrbOrder {
    fn channels(color: Rgb) -> [u8; 3] {
        [color.g, color.r, color.b]
    }
}

impl ColorOrder for RgbOrder {
    fn channels(color: Rgb) -> [u8; 3] {
        [color.r, color.g, color.b]
    }
}

impl ColorOrder for BrgOrder {
    fn channels(color: Rgb) -> [u8; 3] {
        [color.b, color.r, color.g]
    }
}

/// Lifecycle of an [`LedStrip`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StripState {
    /// Owns its line; every operation is allowed.
    Ready,
    /// Line given back; only reads and `release` are allowed.
    Released,
}

/// A device abstraction for WS2812-style LED strips.
///
/// Mutations only touch the in-memory buffer; nothing reaches the LEDs until
/// [`show`](Self::show). The strip is dark right after [`new`](Self::new) and again
/// after [`release`](Self::release) (or drop).
///
/// # Example
/// ```no_run
/// # use knob_strip::gpio::LineAllocator;
/// use knob_strip::led_strip::LedStrip;
/// use knob_strip::Result;
///
/// fn glow<A: LineAllocator>(lines: &mut A) -> Result<()> {
///     let mut strip = LedStrip::<A::Line, 8>::new(lines, 0, 5)?;
///     strip.set_pixel(0, 300, -10, 128)?; // stored as (255, 0, 128)
///     strip.fill_all(0, 0, 32)?;
///     strip.show()?;
///     strip.release()
/// }
/// ```
pub struct LedStrip<L, const MAX: usize, O = GrbOrder>
where
    L: OutputLine,
    O: ColorOrder,
{
    pixels: PixelBuffer<MAX>,
    line: Option<L>,
    max_brightness: u8,
    _order: PhantomData<O>,
}

impl<L, const MAX: usize, O> LedStrip<L, MAX, O>
where
    L: OutputLine,
    O: ColorOrder,
{
    /// Claims `pin`, then commits an all-off frame.
    ///
    /// # Errors
    /// - [`Error::InvalidConfiguration`] if `num_pixels` is zero or above `MAX`; no pin is
    ///   claimed in that case.
    /// - [`Error::PeripheralUnavailable`] if the pin cannot be claimed.
    /// - [`Error::Transmission`] if the first frame fails; the pin is released again.
    pub fn new<A>(lines: &mut A, pin: u8, num_pixels: usize) -> Result<Self>
    where
        A: LineAllocator<Line = L>,
    {
        let pixels = PixelBuffer::new(num_pixels)?;
        let line = lines.claim(pin)?;
        let mut strip = Self {
            pixels,
            line: Some(line),
            max_brightness: u8::MAX,
            _order: PhantomData,
        };
        if let Err(err) = strip.show() {
            // Give the pin back without a second attempt at the frame.
            strip.line = None;
            return Err(err);
        }
        info!("LED strip ready on GPIO {} with {} pixels", pin, num_pixels);
        Ok(strip)
    }

    /// Caps every channel at serialization time; the buffer keeps full values.
    #[must_use]
    pub fn with_max_brightness(mut self, max_brightness: u8) -> Self {
        self.max_brightness = max_brightness;
        self
    }

    /// See [`with_max_brightness`](Self::with_max_brightness). Takes effect on the next `show`.
    pub fn set_max_brightness(&mut self, max_brightness: u8) {
        self.max_brightness = max_brightness;
    }

    /// The current brightness cap (255 = none).
    #[must_use]
    pub const fn max_brightness(&self) -> u8 {
        self.max_brightness
    }

    /// Stores a clamped color at `index`; does not commit.
    ///
    /// # Errors
    /// - [`Error::UseAfterRelease`] once released.
    /// - [`Error::IndexOutOfRange`] if `index` is not in `0..len`; nothing changes.
    pub fn set_pixel<I>(&mut self, index: I, r: i32, g: i32, b: i32) -> Result<()>
    where
        I: TryInto<usize>,
    {
        self.ensure_ready()?;
        self.pixels.set(index, r, g, b)
    }

    /// Sets every pixel to the same clamped color; does not commit.
    ///
    /// # Errors
    /// [`Error::UseAfterRelease`] once released.
    pub fn fill_all(&mut self, r: i32, g: i32, b: i32) -> Result<()> {
        self.ensure_ready()?;
        self.pixels.fill(r, g, b);
        Ok(())
    }

    /// Turns every pixel off in the buffer; does not commit.
    ///
    /// # Errors
    /// [`Error::UseAfterRelease`] once released.
    pub fn clear(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.pixels.clear();
        Ok(())
    }

    /// Sends the whole buffer to the strip and latches it.
    ///
    /// Blocks for the full frame (about 30 µs per pixel plus the reset gap) inside a
    /// critical section, since any pause longer than the reset threshold would cut the
    /// frame short. A failed frame is reported, not retried.
    ///
    /// # Errors
    /// - [`Error::UseAfterRelease`] once released.
    /// - [`Error::Transmission`] if the line fails mid-frame.
    pub fn show(&mut self) -> Result<()> {
        let line = self.line.as_mut().ok_or(Error::UseAfterRelease)?;
        let max_brightness = self.max_brightness;
        let pixels = self.pixels.as_slice();
        critical_section::with(|_| transmit::<L, O>(line, pixels, max_brightness))
            .inspect_err(|_| error!("LED strip frame failed"))
    }

    /// Turns the strip off and gives its line back. Calling it again does nothing.
    ///
    /// # Errors
    /// [`Error::Transmission`] if the all-off frame fails; the line is released anyway.
    pub fn release(&mut self) -> Result<()> {
        if self.line.is_none() {
            return Ok(());
        }
        self.pixels.clear();
        let result = self.show();
        if let Some(line) = self.line.take() {
            info!("LED strip on GPIO {} released", line.pin());
        }
        result
    }

    /// `Ready` until [`release`](Self::release).
    #[must_use]
    pub const fn state(&self) -> StripState {
        if self.line.is_some() {
            StripState::Ready
        } else {
            StripState::Released
        }
    }

    /// GPIO number of the data line, or `None` once released.
    #[must_use]
    pub fn pin(&self) -> Option<u8> {
        self.line.as_ref().map(OutputLine::pin)
    }

    /// Number of pixels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Always `false`: a strip has at least one pixel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Buffered color at `index` (not necessarily shown yet).
    #[must_use]
    pub fn pixel(&self, index: usize) -> Option<Rgb> {
        self.pixels.get(index)
    }

    /// Buffered colors in strip order.
    #[must_use]
    pub fn pixels(&self) -> &[Rgb] {
        self.pixels.as_slice()
    }

    const fn ensure_ready(&self) -> Result<()> {
        if self.line.is_some() {
            Ok(())
        } else {
            Err(Error::UseAfterRelease)
        }
    }
}

impl<L, const MAX: usize, O> Drop for LedStrip<L, MAX, O>
where
    L: OutputLine,
    O: ColorOrder,
{
    fn drop(&mut self) {
        if self.release().is_err() {
            warn!("LED strip could not be turned off while dropping");
        }
    }
}

impl<L, const MAX: usize, O> SmartLedsWrite for LedStrip<L, MAX, O>
where
    L: OutputLine,
    O: ColorOrder,
{
    type Error = Error;
    type Color = Rgb;

    /// Overwrites the leading pixels from `iterator`, then shows the whole strip.
    fn write<T, I>(&mut self, iterator: T) -> Result<()>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        self.ensure_ready()?;
        self.pixels.overwrite(iterator.into_iter().map(Into::into));
        self.show()
    }
}

fn transmit<L, O>(line: &mut L, pixels: &[Rgb], max_brightness: u8) -> Result<()>
where
    L: OutputLine,
    O: ColorOrder,
{
    for pixel in pixels {
        for byte in O::channels(*pixel) {
            let byte = scale_brightness(byte, max_brightness);
            for shift in (0..u8::BITS).rev() {
                line.write_bit((byte >> shift) & 1 == 1)?;
            }
        }
    }
    line.latch()?;
    trace!("LED strip frame sent ({} pixels)", pixels.len());
    Ok(())
}

/// Computes a max brightness value given a current budget (mA) and strip length.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    reason = "Strips are far shorter than u32::MAX; the quotient is checked against 255"
)]
pub const fn max_brightness_for_current(len: usize, max_current_ma: u32) -> u8 {
    let worst_case_ma = (len as u32).saturating_mul(MILLIAMPS_PER_PIXEL);
    if worst_case_ma == 0 {
        return u8::MAX;
    }
    let scaled = max_current_ma.saturating_mul(255) / worst_case_ma;
    if scaled > 255 { u8::MAX } else { scaled as u8 }
}

#[inline]
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_lossless,
    reason = "Product / 255 fits in u8"
)]
const fn scale_brightness(value: u8, brightness: u8) -> u8 {
    ((value as u16 * brightness as u16) / 255) as u8
}
