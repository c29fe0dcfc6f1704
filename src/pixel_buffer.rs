//! An owned, fixed-length buffer of pixel colors.
//!
//! [`PixelBuffer`] only validates and stores colors; it never touches hardware.
//! Channel values arrive as signed integers so callers can pass the result of
//! arithmetic on sensor readings directly: anything outside `0..=255` is
//! clamped, never rejected. Indices, on the other hand, are checked and an
//! out-of-range index is reported as [`Error::IndexOutOfRange`].

use heapless::Vec;
use smart_leds::RGB8;

use crate::{Error, Result};

/// RGB color representation re-exported from `smart_leds`.
pub type Rgb = RGB8;

/// All channels off.
pub const BLACK: Rgb = rgb(0, 0, 0);

/// Builds a color from three in-range channels.
#[must_use]
pub const fn rgb(r: u8, g: u8, b: u8) -> Rgb {
    Rgb { r, g, b }
}

/// Pins a channel value to `0..=255`.
#[must_use]
pub fn clamp_channel(value: i32) -> u8 {
    u8::try_from(value.clamp(0, i32::from(u8::MAX))).unwrap_or(u8::MAX)
}

/// Builds a color from three possibly out-of-range channels.
#[must_use]
pub fn clamped_rgb(r: i32, g: i32, b: i32) -> Rgb {
    rgb(clamp_channel(r), clamp_channel(g), clamp_channel(b))
}

/// A fixed-length sequence of [`Rgb`] pixels with room for at most `MAX`.
///
/// The length is chosen at construction and never changes afterwards.
///
/// ```
/// use knob_strip::pixel_buffer::{PixelBuffer, rgb};
///
/// let mut pixels = PixelBuffer::<8>::new(5)?;
/// pixels.set(0, 300, -10, 128)?;
/// assert_eq!(pixels.get(0), Some(rgb(255, 0, 128)));
/// assert!(pixels.set(5, 1, 1, 1).is_err());
/// # Ok::<(), knob_strip::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer<const MAX: usize> {
    pixels: Vec<Rgb, MAX>,
}

impl<const MAX: usize> PixelBuffer<MAX> {
    /// Creates `num_pixels` pixels, all off.
    ///
    /// # Errors
    /// [`Error::InvalidConfiguration`] if `num_pixels` is zero or larger than `MAX`.
    pub fn new(num_pixels: usize) -> Result<Self> {
        if num_pixels == 0 {
            return Err(Error::InvalidConfiguration);
        }
        let mut pixels = Vec::new();
        pixels
            .resize(num_pixels, BLACK)
            .map_err(|()| Error::InvalidConfiguration)?;
        Ok(Self { pixels })
    }

    /// Number of pixels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Always `false`: a buffer holds at least one pixel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Stores a clamped color at `index`.
    ///
    /// Any integer type works as an index; negative values are out of range.
    ///
    /// # Errors
    /// [`Error::IndexOutOfRange`] if `index` is not in `0..len`. The buffer is left untouched.
    pub fn set<I>(&mut self, index: I, r: i32, g: i32, b: i32) -> Result<()>
    where
        I: TryInto<usize>,
    {
        let len = self.len();
        let slot = index
            .try_into()
            .ok()
            .and_then(|index| self.pixels.get_mut(index))
            .ok_or(Error::IndexOutOfRange { len })?;
        *slot = clamped_rgb(r, g, b);
        Ok(())
    }

    /// The color at `index`, if in range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Rgb> {
        self.pixels.get(index).copied()
    }

    /// Sets every pixel to the same clamped color.
    pub fn fill(&mut self, r: i32, g: i32, b: i32) {
        self.pixels.fill(clamped_rgb(r, g, b));
    }

    /// Turns every pixel off.
    pub fn clear(&mut self) {
        self.pixels.fill(BLACK);
    }

    /// Copies colors into the leading pixels, in order.
    ///
    /// Colors past the end are ignored; pixels past the last color keep their value.
    /// Returns how many pixels were written.
    pub fn overwrite<T>(&mut self, colors: T) -> usize
    where
        T: IntoIterator<Item = Rgb>,
    {
        self.pixels
            .iter_mut()
            .zip(colors)
            .map(|(slot, color)| *slot = color)
            .count()
    }

    /// Read-only view of the pixels in strip order.
    #[must_use]
    pub fn as_slice(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Iterates over the pixels in strip order.
    pub fn iter(&self) -> core::slice::Iter<'_, Rgb> {
        self.pixels.iter()
    }
}

impl<'a, const MAX: usize> IntoIterator for &'a PixelBuffer<MAX> {
    type Item = &'a Rgb;
    type IntoIter = core::slice::Iter<'a, Rgb>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
