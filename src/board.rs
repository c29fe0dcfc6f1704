//! Raspberry Pi Pico adapters: the PIO-driven strip line and the knob ADC.

use embassy_rp::adc::{self, Adc};
use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::peripherals;
use embassy_rp::pio::program::{Assembler, JmpCondition, OutDestination, SetDestination, SideSet};
use embassy_rp::pio::{
    self, Common, Config, FifoJoin, Instance, LoadedProgram, ShiftConfig, ShiftDirection,
    StateMachine,
};
use embassy_time::{Duration, block_for};
use fixed::types::U24F8;

use crate::gpio::{
    BitPacker, LineAllocator, OutputLine, PIO_CYCLES_PER_BIT, PinClaim, PinClaims,
    Ws2812Timing, pio_clock_divider_bits, pio_latch_wait_us,
};
use crate::panel::Potentiometer;
use crate::{Error, Result};

/// Highest user GPIO on the RP2040 and RP2350A.
pub const MAX_GPIO: u8 = 29;

const T1: u8 = 2;
const T2: u8 = 5;
const T3: u8 = 3;
const CYCLES_PER_BIT: u32 = (T1 + T2 + T3) as u32;

const _: () = assert!(CYCLES_PER_BIT == PIO_CYCLES_PER_BIT);

/// Loads the single-wire LED program: every bit starts high for `T1` cycles, stays high
/// for `T2` more if it is a one, and ends low for `T3`.
fn load_ws2812_program<'d, PIO: Instance>(common: &mut Common<'d, PIO>) -> LoadedProgram<'d, PIO> {
    let side_set = SideSet::new(false, 1, false);
    let mut assembler: Assembler<32> = Assembler::new_with_side_set(side_set);

    let mut wrap_target = assembler.label();
    let mut wrap_source = assembler.label();
    let mut do_zero = assembler.label();
    assembler.set_with_side_set(SetDestination::PINDIRS, 1, 0);
    assembler.bind(&mut wrap_target);
    // Stalls here, line low, while the FIFO is empty.
    assembler.out_with_delay_and_side_set(OutDestination::X, 1, T3 - 1, 0);
    assembler.jmp_with_delay_and_side_set(JmpCondition::XIsZero, &mut do_zero, T1 - 1, 1);
    assembler.jmp_with_delay_and_side_set(JmpCondition::Always, &mut wrap_target, T2 - 1, 1);
    assembler.bind(&mut do_zero);
    assembler.nop_with_delay_and_side_set(T2 - 1, 0);
    assembler.bind(&mut wrap_source);

    let program = assembler.assemble_with_wrap(wrap_source, wrap_target);
    common.load_program(&program)
}

/// Hands GPIO `pin` to the PIO block.
///
/// Callers must hold the pin's claim.
#[expect(unsafe_code, reason = "The caller's claim makes this the pin's only owner")]
fn pio_pin<PIO: Instance>(
    common: &mut Common<'static, PIO>,
    pin: u8,
) -> Option<pio::Pin<'static, PIO>> {
    macro_rules! by_number {
        ($($n:literal => $name:ident),* $(,)?) => {
            match pin {
                $($n => Some(common.make_pio_pin(unsafe { peripherals::$name::steal() })),)*
                _ => None,
            }
        };
    }
    by_number!(
        0 => PIN_0, 1 => PIN_1, 2 => PIN_2, 3 => PIN_3, 4 => PIN_4, 5 => PIN_5,
        6 => PIN_6, 7 => PIN_7, 8 => PIN_8, 9 => PIN_9, 10 => PIN_10, 11 => PIN_11,
        12 => PIN_12, 13 => PIN_13, 14 => PIN_14, 15 => PIN_15, 16 => PIN_16, 17 => PIN_17,
        18 => PIN_18, 19 => PIN_19, 20 => PIN_20, 21 => PIN_21, 22 => PIN_22, 23 => PIN_23,
        24 => PIN_24, 25 => PIN_25, 26 => PIN_26, 27 => PIN_27, 28 => PIN_28, 29 => PIN_29,
    )
}

/// A strip data line clocked out by a PIO state machine.
///
/// The CPU only feeds bytes into the TX FIFO; the state machine owns the pulse timing.
/// Dropping the line stops the state machine and frees the pin.
pub struct PicoLine<PIO: Instance + 'static, const S: usize> {
    claim: PinClaim<'static>,
    sm: StateMachine<'static, PIO, S>,
    _pin: pio::Pin<'static, PIO>,
    packer: BitPacker,
    latch_wait_us: u32,
}

impl<PIO: Instance, const S: usize> PicoLine<PIO, S> {
    fn push_word(&mut self, word: u32) {
        let tx = self.sm.tx();
        while !tx.try_push(word) {}
    }
}

impl<PIO: Instance, const S: usize> OutputLine for PicoLine<PIO, S> {
    fn pin(&self) -> u8 {
        self.claim.pin()
    }

    fn write_bit(&mut self, bit: bool) -> Result<()> {
        if let Some(word) = self.packer.push(bit) {
            self.push_word(word);
        }
        Ok(())
    }

    fn latch(&mut self) -> Result<()> {
        if let Some(word) = self.packer.flush() {
            self.push_word(word);
        }
        while !self.sm.tx().empty() {}
        block_for(Duration::from_micros(u64::from(self.latch_wait_us)));
        Ok(())
    }
}

impl<PIO: Instance, const S: usize> Drop for PicoLine<PIO, S> {
    fn drop(&mut self) {
        self.sm.set_enable(false);
    }
}

/// The platform line allocator: claims a pin in `claims`, then wires it to one PIO
/// state machine running the LED program.
///
/// Owns a single state machine, so it serves one strip. Pins used elsewhere in the
/// firmware must be claimed in the same registry first.
pub struct PicoLines<PIO: Instance + 'static, const S: usize> {
    claims: &'static PinClaims,
    common: Common<'static, PIO>,
    program: LoadedProgram<'static, PIO>,
    sm: Option<StateMachine<'static, PIO, S>>,
    reset_us: u32,
}

impl<PIO: Instance, const S: usize> PicoLines<PIO, S> {
    /// Loads the LED program into `common`; `sm` will drive the strip.
    #[must_use]
    pub fn new(
        claims: &'static PinClaims,
        mut common: Common<'static, PIO>,
        sm: StateMachine<'static, PIO, S>,
    ) -> Self {
        let program = load_ws2812_program(&mut common);
        Self {
            claims,
            common,
            program,
            sm: Some(sm),
            reset_us: Ws2812Timing::WS2812B.reset_us,
        }
    }

    /// Overrides the latch gap, for strips that need more than the WS2812B's.
    #[must_use]
    pub const fn with_reset_us(mut self, reset_us: u32) -> Self {
        self.reset_us = reset_us;
        self
    }
}

impl<PIO: Instance, const S: usize> LineAllocator for PicoLines<PIO, S> {
    type Line = PicoLine<PIO, S>;

    fn claim(&mut self, pin: u8) -> Result<Self::Line> {
        if pin > MAX_GPIO || self.sm.is_none() {
            return Err(Error::PeripheralUnavailable { pin });
        }
        let claim = self.claims.claim(pin)?;
        let out_pin =
            pio_pin(&mut self.common, pin).ok_or(Error::PeripheralUnavailable { pin })?;
        let mut sm = self.sm.take().ok_or(Error::PeripheralUnavailable { pin })?;

        let mut cfg = Config::default();
        cfg.set_out_pins(&[&out_pin]);
        cfg.set_set_pins(&[&out_pin]);
        cfg.use_program(&self.program, &[&out_pin]);
        cfg.clock_divider = U24F8::from_bits(pio_clock_divider_bits(clk_sys_freq()));
        cfg.fifo_join = FifoJoin::TxOnly;
        cfg.shift_out = ShiftConfig {
            auto_fill: true,
            threshold: 8,
            direction: ShiftDirection::Left,
        };
        sm.set_config(&cfg);
        sm.set_enable(true);

        Ok(PicoLine {
            claim,
            sm,
            _pin: out_pin,
            packer: BitPacker::new(),
            latch_wait_us: pio_latch_wait_us(self.reset_us),
        })
    }
}

/// Potentiometer on one of the ADC inputs, read in blocking mode.
pub struct PicoKnob<'d> {
    adc: Adc<'d, adc::Blocking>,
    channel: adc::Channel<'d>,
}

impl<'d> PicoKnob<'d> {
    #[must_use]
    pub const fn new(adc: Adc<'d, adc::Blocking>, channel: adc::Channel<'d>) -> Self {
        Self { adc, channel }
    }
}

impl Potentiometer for PicoKnob<'_> {
    fn read_raw(&mut self) -> Result<u16> {
        self.adc
            .blocking_read(&mut self.channel)
            .map_err(|_| Error::SensorRead)
    }
}
