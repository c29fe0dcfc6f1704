//! Host test doubles for the strip's output line, pins, delays, sensors and display.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use knob_strip::gpio::{LineAllocator, OutputLine, PinClaim, PinClaims};
use knob_strip::panel::{Potentiometer, StopSignal, TextDisplay};
use knob_strip::{Error, Result};

/// Highest pin the recording allocator hands out, like a Pico.
pub const LAST_PIN: u8 = 29;

/// Everything the recording lines have put on the wire.
#[derive(Debug, Default)]
pub struct Wire {
    frames: Vec<Vec<u8>>,
    bits: Vec<bool>,
    bit_count: usize,
    failing: bool,
}

impl Wire {
    /// Latched frames, one byte per channel in wire order.
    pub fn frames(&self) -> &[Vec<u8>] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&[u8]> {
        self.frames.last().map(Vec::as_slice)
    }

    /// Total bits written, latched or not.
    pub fn bit_count(&self) -> usize {
        self.bit_count
    }

    /// Makes every following write and latch fail.
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    fn write_bit(&mut self, bit: bool) -> Result<()> {
        if self.failing {
            return Err(Error::Transmission);
        }
        self.bits.push(bit);
        self.bit_count += 1;
        Ok(())
    }

    fn latch(&mut self) -> Result<()> {
        if self.failing {
            return Err(Error::Transmission);
        }
        let bytes = self
            .bits
            .chunks(8)
            .map(|chunk| chunk.iter().fold(0u8, |byte, bit| (byte << 1) | u8::from(*bit)))
            .collect();
        self.frames.push(bytes);
        self.bits.clear();
        Ok(())
    }
}

pub type SharedWire = Rc<RefCell<Wire>>;

/// [`LineAllocator`] whose lines record into one shared [`Wire`].
pub struct RecordingLines<'a> {
    claims: &'a PinClaims,
    wire: SharedWire,
}

impl<'a> RecordingLines<'a> {
    pub fn new(claims: &'a PinClaims) -> Self {
        Self {
            claims,
            wire: SharedWire::default(),
        }
    }

    pub fn wire(&self) -> SharedWire {
        Rc::clone(&self.wire)
    }
}

impl<'a> LineAllocator for RecordingLines<'a> {
    type Line = RecordingLine<'a>;

    fn claim(&mut self, pin: u8) -> Result<Self::Line> {
        if pin > LAST_PIN {
            return Err(Error::PeripheralUnavailable { pin });
        }
        Ok(RecordingLine {
            claim: self.claims.claim(pin)?,
            wire: Rc::clone(&self.wire),
        })
    }
}

pub struct RecordingLine<'a> {
    claim: PinClaim<'a>,
    wire: SharedWire,
}

impl OutputLine for RecordingLine<'_> {
    fn pin(&self) -> u8 {
        self.claim.pin()
    }

    fn write_bit(&mut self, bit: bool) -> Result<()> {
        self.wire.borrow_mut().write_bit(bit)
    }

    fn latch(&mut self) -> Result<()> {
        self.wire.borrow_mut().latch()
    }
}

/// A level change or a wait, in the order they happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    High,
    Low,
    WaitNs(u32),
}

pub type Timeline = Rc<RefCell<Vec<Event>>>;

/// Output pin that logs its level changes into a [`Timeline`].
pub struct TimelinePin(pub Timeline);

impl ErrorType for TimelinePin {
    type Error = Infallible;
}

impl OutputPin for TimelinePin {
    fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
        self.0.borrow_mut().push(Event::Low);
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
        self.0.borrow_mut().push(Event::High);
        Ok(())
    }
}

/// Delay that logs its waits into a [`Timeline`] instead of sleeping.
pub struct TimelineDelay(pub Timeline);

impl DelayNs for TimelineDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().push(Event::WaitNs(ns));
    }
}

/// Delay that returns at once and raises `stop` after `polls` waits of `poll_ms`.
pub struct StopAfter<'a> {
    stop: &'a StopSignal,
    poll_ms: u32,
    polls: usize,
    pub waits_ms: Vec<u32>,
}

impl<'a> StopAfter<'a> {
    pub fn new(stop: &'a StopSignal, poll_ms: u32, polls: usize) -> Self {
        Self {
            stop,
            poll_ms,
            polls,
            waits_ms: Vec::new(),
        }
    }
}

impl DelayNs for StopAfter<'_> {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.waits_ms.push(ms);
        if ms == self.poll_ms {
            self.polls = self.polls.saturating_sub(1);
            if self.polls == 0 {
                self.stop.raise();
            }
        }
    }
}

/// Knob that plays back readings, then repeats the last good one.
pub struct ScriptedKnob {
    readings: VecDeque<Result<u16>>,
    last: u16,
}

impl ScriptedKnob {
    pub fn new(readings: impl IntoIterator<Item = Result<u16>>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
            last: 0,
        }
    }

    pub fn steady(raw: u16) -> Self {
        Self::new([Ok(raw)])
    }
}

impl Potentiometer for ScriptedKnob {
    fn read_raw(&mut self) -> Result<u16> {
        match self.readings.pop_front() {
            Some(reading) => {
                if let Ok(raw) = reading {
                    self.last = raw;
                }
                reading
            }
            None => Ok(self.last),
        }
    }
}

/// Active-low button that plays back pressed states, then holds the last one.
pub struct ScriptedButton {
    pressed: VecDeque<bool>,
    last: bool,
}

impl ScriptedButton {
    pub fn new(pressed: impl IntoIterator<Item = bool>) -> Self {
        Self {
            pressed: pressed.into_iter().collect(),
            last: false,
        }
    }

    pub fn held() -> Self {
        Self::new([true])
    }

    pub fn idle() -> Self {
        Self::new([false])
    }

    fn next_pressed(&mut self) -> bool {
        if let Some(pressed) = self.pressed.pop_front() {
            self.last = pressed;
        }
        self.last
    }
}

impl ErrorType for ScriptedButton {
    type Error = Infallible;
}

impl InputPin for ScriptedButton {
    fn is_high(&mut self) -> core::result::Result<bool, Self::Error> {
        Ok(!self.next_pressed())
    }

    fn is_low(&mut self) -> core::result::Result<bool, Self::Error> {
        Ok(self.next_pressed())
    }
}

/// Character display kept in memory.
pub struct MemoryDisplay {
    rows: Vec<Vec<char>>,
    cursor: (usize, usize),
    pub clears: usize,
}

impl MemoryDisplay {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows: vec![vec![' '; columns]; rows],
            cursor: (0, 0),
            clears: 0,
        }
    }

    /// Row text with trailing blanks removed.
    pub fn row(&self, row: usize) -> String {
        self.rows[row].iter().collect::<String>().trim_end().to_owned()
    }

    /// Row text exactly as shown, blanks included.
    pub fn raw_row(&self, row: usize) -> String {
        self.rows[row].iter().collect()
    }
}

impl TextDisplay for MemoryDisplay {
    fn clear(&mut self) -> Result<()> {
        for row in &mut self.rows {
            row.fill(' ');
        }
        self.cursor = (0, 0);
        self.clears += 1;
        Ok(())
    }

    fn set_cursor(&mut self, row: u8, col: u8) -> Result<()> {
        self.cursor = (usize::from(row), usize::from(col));
        Ok(())
    }

    fn write_str(&mut self, text: &str) -> Result<()> {
        let (row, mut col) = self.cursor;
        if let Some(cells) = self.rows.get_mut(row) {
            for ch in text.chars() {
                if let Some(cell) = cells.get_mut(col) {
                    *cell = ch;
                }
                col += 1;
            }
        }
        self.cursor = (row, col);
        Ok(())
    }
}
