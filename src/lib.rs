//! A knob, a button, a character LCD and a WS2812 strip.
//!
//! The core is [`LedStrip`]: a fixed-length [`PixelBuffer`] plus an exclusive data line.
//! Colors are staged with [`LedStrip::set_pixel`], [`LedStrip::fill_all`] and
//! [`LedStrip::clear`], then committed with [`LedStrip::show`]. [`panel::Panel`] wires the
//! strip to the sensors and display for the demo firmware; [`sweep`] is the strip
//! self-test behind the `strip-sweep` firmware.
//!
//! Hardware sits behind the [`gpio::LineAllocator`], [`gpio::OutputLine`],
//! [`panel::Potentiometer`] and [`panel::TextDisplay`] traits; the `board` feature adds
//! the Raspberry Pi Pico implementations.
#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to every module below.
mod fmt;

pub mod char_lcd;
pub mod config;
mod error;
pub mod gpio;
pub mod led_strip;
pub mod panel;
pub mod pixel_buffer;
pub mod sweep;

#[cfg(feature = "board")]
pub mod board;

pub use error::{Error, Result};
pub use led_strip::{ColorOrder, GrbOrder, LedStrip, StripState};
pub use pixel_buffer::{BLACK, PixelBuffer, Rgb, rgb};
