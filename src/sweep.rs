//! Strip self-test: pixel 0 ramps up through white while pixels 1, 2 and 3 ramp
//! through red, green and blue.
//!
//! [`run_sweep`] leaves the strip dark afterwards even when a frame fails.

use embedded_hal::delay::DelayNs;

use crate::gpio::OutputLine;
use crate::led_strip::{ColorOrder, LedStrip};
use crate::pixel_buffer::{Rgb, rgb};
use crate::{Error, Result};

/// Level increase between frames.
pub const SWEEP_STEP: u8 = 10;

/// Pause after each frame.
pub const SWEEP_FRAME_MS: u32 = 100;

/// Levels the sweep shows, `0, 10, ..., 250`.
pub fn sweep_levels() -> impl Iterator<Item = u8> {
    (0..u8::MAX).step_by(usize::from(SWEEP_STEP))
}

/// Pixel colors for one frame of the sweep.
#[must_use]
pub const fn sweep_frame(level: u8) -> [(usize, Rgb); 4] {
    [
        (1, rgb(level, 0, 0)),
        (2, rgb(0, level, 0)),
        (3, rgb(0, 0, level)),
        (0, rgb(level, level, level)),
    ]
}

/// Clears the strip, shows every sweep frame [`SWEEP_FRAME_MS`] apart, then clears it
/// again. Pixels past the end of a short strip are skipped.
///
/// The final clear runs whatever happened before it. The first error wins.
///
/// # Errors
/// [`Error::UseAfterRelease`] on a released strip, and transmission errors.
pub fn run_sweep<L, const MAX: usize, O>(
    strip: &mut LedStrip<L, MAX, O>,
    delay: &mut impl DelayNs,
) -> Result<()>
where
    L: OutputLine,
    O: ColorOrder,
{
    info!("Sweep test on {} pixels", strip.len());
    let outcome = strip
        .clear()
        .and_then(|()| strip.show())
        .and_then(|()| sweep_levels().try_for_each(|level| show_frame(strip, delay, level)));
    if let Err(err) = outcome {
        error!("Sweep test stopped: {}", err);
    }
    let cleared = strip.clear().and_then(|()| strip.show());
    outcome.and(cleared)
}

fn show_frame<L, const MAX: usize, O>(
    strip: &mut LedStrip<L, MAX, O>,
    delay: &mut impl DelayNs,
    level: u8,
) -> Result<()>
where
    L: OutputLine,
    O: ColorOrder,
{
    for (index, color) in sweep_frame(level) {
        match strip.set_pixel(
            index,
            i32::from(color.r),
            i32::from(color.g),
            i32::from(color.b),
        ) {
            Ok(()) | Err(Error::IndexOutOfRange { .. }) => {}
            Err(err) => return Err(err),
        }
    }
    strip.show()?;
    trace!("sweep level {}", level);
    delay.delay_ms(SWEEP_FRAME_MS);
    Ok(())
}
