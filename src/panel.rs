//! The knob-and-button control panel: reads the sensors, mirrors them on a
//! character display and lights one strip pixel while the button is held.
//!
//! [`Panel`] owns every peripheral it touches; there is no shared global state.
//! [`Panel::run`] polls until a [`StopSignal`] is raised, from outside or by a long
//! button press. It always turns the strip off and releases it on the way out, whether
//! the loop stopped cleanly or a sensor or display error cut it short.

use core::fmt::{self, Write as _};
use core::iter;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use heapless::String;
use portable_atomic::{AtomicBool, Ordering};

use crate::config;
use crate::gpio::OutputLine;
use crate::led_strip::{ColorOrder, GrbOrder, LedStrip};
use crate::pixel_buffer::{BLACK, Rgb, rgb};
use crate::{Error, Result};

/// Widest HD44780 line.
pub const LINE_CAPACITY: usize = 40;

/// An analog knob (potentiometer).
pub trait Potentiometer {
    /// Raw ADC reading, `0..=adc_max` for the platform.
    ///
    /// # Errors
    /// [`Error::SensorRead`] if the conversion fails.
    fn read_raw(&mut self) -> Result<u16>;
}

/// A character display the panel writes to.
pub trait TextDisplay {
    /// Blanks the display and homes the cursor.
    ///
    /// # Errors
    /// [`Error::Display`] on I/O failure.
    fn clear(&mut self) -> Result<()>;

    /// Moves the cursor.
    ///
    /// # Errors
    /// [`Error::Display`] on I/O failure.
    fn set_cursor(&mut self, row: u8, col: u8) -> Result<()>;

    /// Writes text at the cursor.
    ///
    /// # Errors
    /// [`Error::Display`] on I/O failure.
    fn write_str(&mut self, text: &str) -> Result<()>;
}

/// A flag that asks [`Panel::run`] to stop after the current poll.
///
/// Safe to raise from an interrupt handler through a `static`.
#[derive(Debug, Default)]
pub struct StopSignal {
    raised: AtomicBool,
}

impl StopSignal {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            raised: AtomicBool::new(false),
        }
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.raised.store(false, Ordering::Release);
    }
}

/// Runtime settings of a [`Panel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanelConfig {
    /// Pixel lit while the button is held.
    pub pixel_index: usize,
    /// Knob reading that maps to full brightness.
    pub adc_max: u16,
    /// Color at full brightness.
    pub tint: Rgb,
    pub poll_interval_ms: u32,
    /// Display width; status lines are padded to it.
    pub columns: usize,
    /// Splash screen shown by [`Panel::greet`].
    pub banner: &'static str,
    /// Two-line wiring legend shown after the banner.
    pub legend: [&'static str; 2],
    /// Text left on the display after shutdown.
    pub farewell: &'static str,
    /// Holding the button this long raises the stop signal; `None` never does.
    pub hold_to_stop_ms: Option<u32>,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            pixel_index: 0,
            adc_max: 1023,
            tint: rgb(255, 0, 0),
            poll_interval_ms: config::POLL_INTERVAL_MS,
            columns: config::LCD_COLUMNS,
            banner: "Knob strip demo",
            legend: ["LCD:I2C RGB:GP0", "KNOB:A0 BTN:GP12"],
            farewell: "Goodbye",
            hold_to_stop_ms: None,
        }
    }
}

/// One poll's worth of sensor state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    pub raw: u16,
    pub pressed: bool,
    /// `raw` scaled to `0..=255`.
    pub level: u8,
}

/// Scales a knob reading to a channel level, `0..=255`.
///
/// Readings above `adc_max` count as full scale.
#[must_use]
pub fn level_for_reading(raw: u16, adc_max: u16) -> u8 {
    let max = u32::from(adc_max.max(1));
    let raw = u32::from(raw).min(max);
    u8::try_from(raw.saturating_mul(255) / max).unwrap_or(u8::MAX)
}

/// `tint` dimmed to `level`.
#[must_use]
pub fn tint_at_level(tint: Rgb, level: u8) -> Rgb {
    let dim = |channel: u8| {
        u8::try_from(u16::from(channel) * u16::from(level) / 255).unwrap_or(u8::MAX)
    };
    rgb(dim(tint.r), dim(tint.g), dim(tint.b))
}

/// Formats `args` and pads (or truncates) the result to `columns` characters.
///
/// # Errors
/// [`Error::Format`] if the text or the padded line does not fit [`LINE_CAPACITY`] bytes.
pub fn padded_line(args: fmt::Arguments<'_>, columns: usize) -> Result<String<LINE_CAPACITY>> {
    let mut text: String<LINE_CAPACITY> = String::new();
    text.write_fmt(args)?;
    let mut line = String::new();
    for ch in text.chars().chain(iter::repeat(' ')).take(columns) {
        line.push(ch).map_err(|()| Error::Format)?;
    }
    Ok(line)
}

/// Owns the sensors, the display and the strip for the lifetime of the demo.
pub struct Panel<P, B, D, L, const MAX: usize, O = GrbOrder>
where
    L: OutputLine,
    O: ColorOrder,
{
    knob: P,
    button: B,
    display: D,
    strip: LedStrip<L, MAX, O>,
    config: PanelConfig,
    held_ms: u32,
}

impl<P, B, D, L, const MAX: usize, O> Panel<P, B, D, L, MAX, O>
where
    P: Potentiometer,
    B: InputPin,
    D: TextDisplay,
    L: OutputLine,
    O: ColorOrder,
{
    /// Takes ownership of everything the loop needs.
    ///
    /// The button is read as pressed when low (wired to ground with a pull-up).
    pub fn new(
        knob: P,
        button: B,
        display: D,
        strip: LedStrip<L, MAX, O>,
        config: PanelConfig,
    ) -> Self {
        Self {
            knob,
            button,
            display,
            strip,
            config,
            held_ms: 0,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &PanelConfig {
        &self.config
    }

    #[must_use]
    pub const fn strip(&self) -> &LedStrip<L, MAX, O> {
        &self.strip
    }

    #[must_use]
    pub const fn display(&self) -> &D {
        &self.display
    }

    /// Shows the banner for a second, then the wiring legend for two, then clears.
    ///
    /// # Errors
    /// [`Error::Display`] on display failure.
    pub fn greet(&mut self, delay: &mut impl DelayNs) -> Result<()> {
        self.display.clear()?;
        self.display.write_str(self.config.banner)?;
        delay.delay_ms(1_000);

        self.display.clear()?;
        for (row, text) in (0u8..).zip(self.config.legend) {
            self.display.set_cursor(row, 0)?;
            self.display.write_str(text)?;
        }
        delay.delay_ms(2_000);
        self.display.clear()
    }

    /// Reads the knob and button, refreshes the display and shows the strip.
    ///
    /// A pixel index outside the strip is logged and otherwise ignored.
    ///
    /// # Errors
    /// Sensor, display and transmission errors, and [`Error::UseAfterRelease`] after
    /// [`shutdown`](Self::shutdown).
    pub fn step(&mut self) -> Result<Reading> {
        let raw = self.knob.read_raw()?;
        let pressed = self.button.is_low().map_err(|_| Error::SensorRead)?;
        let level = level_for_reading(raw, self.config.adc_max);
        let reading = Reading {
            raw,
            pressed,
            level,
        };

        self.render(&reading)?;

        let color = if pressed {
            tint_at_level(self.config.tint, level)
        } else {
            BLACK
        };
        match self.strip.set_pixel(
            self.config.pixel_index,
            i32::from(color.r),
            i32::from(color.g),
            i32::from(color.b),
        ) {
            Ok(()) => {}
            Err(Error::IndexOutOfRange { len }) => {
                warn!(
                    "Pixel {} is outside the {}-pixel strip",
                    self.config.pixel_index,
                    len
                );
            }
            Err(err) => return Err(err),
        }
        self.strip.show()?;
        trace!("raw={} pressed={} level={}", raw, pressed, level);
        Ok(reading)
    }

    /// Greets, then polls every `poll_interval_ms` until `stop` is raised, either from
    /// outside or by holding the button for `hold_to_stop_ms`.
    ///
    /// [`shutdown`](Self::shutdown) runs on every exit. The first error wins.
    ///
    /// # Errors
    /// Whatever [`greet`](Self::greet), [`step`](Self::step) or the shutdown report.
    pub fn run(&mut self, delay: &mut impl DelayNs, stop: &StopSignal) -> Result<()> {
        let outcome = self.poll_until(delay, stop);
        if let Err(err) = outcome {
            error!("Control loop stopped: {}", err);
        }
        let teardown = self.shutdown();
        outcome.and(teardown)
    }

    /// Turns the strip off, releases it, and leaves the farewell text on the display.
    ///
    /// # Errors
    /// The strip's error if its final frame fails, else any display error.
    pub fn shutdown(&mut self) -> Result<()> {
        let released = self.strip.release();
        let farewell = self
            .display
            .clear()
            .and_then(|()| self.display.write_str(self.config.farewell));
        info!("Panel shut down");
        released.and(farewell)
    }

    fn poll_until(&mut self, delay: &mut impl DelayNs, stop: &StopSignal) -> Result<()> {
        self.greet(delay)?;
        while !stop.is_raised() {
            let reading = self.step()?;
            delay.delay_ms(self.config.poll_interval_ms);
            if self.held_long_enough(reading.pressed) {
                info!("Button held for {} ms, stopping", self.held_ms);
                stop.raise();
            }
        }
        Ok(())
    }

    fn held_long_enough(&mut self, pressed: bool) -> bool {
        let Some(limit) = self.config.hold_to_stop_ms else {
            return false;
        };
        self.held_ms = if pressed {
            self.held_ms.saturating_add(self.config.poll_interval_ms)
        } else {
            0
        };
        self.held_ms >= limit
    }

    fn render(&mut self, reading: &Reading) -> Result<()> {
        let columns = self.config.columns;
        let knob_line = padded_line(format_args!("pot: {}", reading.raw), columns)?;
        let state = if reading.pressed { "pressed" } else { "released" };
        let button_line = padded_line(format_args!("button: {state}"), columns)?;

        self.display.set_cursor(0, 0)?;
        self.display.write_str(&knob_line)?;
        self.display.set_cursor(1, 0)?;
        self.display.write_str(&button_line)
    }
}
