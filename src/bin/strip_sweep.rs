//! Strip self-test firmware.
//!
//! Ramps pixel 0 through white and pixels 1 to 3 through red, green and blue, then turns
//! the strip off and releases it.
#![no_std]
#![no_main]

use defmt::info;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::{self, Pio};
use embassy_time::Delay;
use knob_strip::Result;
use knob_strip::board::PicoLines;
use knob_strip::config::{MAX_STRIP_LEN, STRIP_LEN, STRIP_PIN};
use knob_strip::gpio::PinClaims;
use knob_strip::led_strip::LedStrip;
use knob_strip::sweep::run_sweep;
use panic_probe as _;

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => pio::InterruptHandler<PIO0>;
});

static PIN_CLAIMS: PinClaims = PinClaims::new();

#[embassy_executor::main]
pub async fn main(_spawner: Spawner) -> ! {
    if let Err(err) = inner_main() {
        panic!("{err}");
    }
    info!("Sweep test done");
    loop {
        cortex_m::asm::wfi();
    }
}

fn inner_main() -> Result<()> {
    let p = embassy_rp::init(embassy_rp::config::Config::default());
    let Pio { common, sm0, .. } = Pio::new(p.PIO0, Irqs);

    let mut lines = PicoLines::new(&PIN_CLAIMS, common, sm0);
    let mut strip = LedStrip::<_, MAX_STRIP_LEN>::new(&mut lines, STRIP_PIN, STRIP_LEN)?;

    let outcome = run_sweep(&mut strip, &mut Delay);
    let released = strip.release();
    outcome.and(released)
}
