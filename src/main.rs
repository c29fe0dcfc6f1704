//! Knob-and-button NeoPixel demo.
//!
//! Runs on a Raspberry Pi Pico. While the button is held, the first pixel glows red
//! with a brightness that follows the knob; the LCD shows both readings. Holding the
//! button for five seconds turns the strip off and stops the demo.
#![no_std]
#![no_main]

use defmt::info;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::adc::{self, Adc};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::{self, Pio};
use embassy_time::Delay;
use knob_strip::board::{PicoKnob, PicoLines};
use knob_strip::char_lcd::CharLcd;
use knob_strip::config::{
    BUTTON_PIN, HOLD_TO_STOP_MS, KNOB_PIN, LCD_I2C_ADDRESS, LCD_SCL_PIN, LCD_SDA_PIN, MAX_STRIP_LEN, RP_ADC_MAX,
    STRIP_LEN, STRIP_PIN,
};
use knob_strip::gpio::PinClaims;
use knob_strip::led_strip::LedStrip;
use knob_strip::panel::{Panel, PanelConfig, StopSignal};
use knob_strip::Result;
use panic_probe as _;

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => pio::InterruptHandler<PIO0>;
});

static PIN_CLAIMS: PinClaims = PinClaims::new();
static STOP: StopSignal = StopSignal::new();

#[embassy_executor::main]
pub async fn main(_spawner: Spawner) -> ! {
    if let Err(err) = inner_main() {
        panic!("{err}");
    }
    info!("Demo stopped");
    loop {
        cortex_m::asm::wfi();
    }
}

fn inner_main() -> Result<()> {
    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // Reserve the sensor and display pins so no strip can take them.
    let _reserved = (
        PIN_CLAIMS.claim(BUTTON_PIN)?,
        PIN_CLAIMS.claim(KNOB_PIN)?,
        PIN_CLAIMS.claim(LCD_SDA_PIN)?,
        PIN_CLAIMS.claim(LCD_SCL_PIN)?,
    );

    let Pio { common, sm0, .. } = Pio::new(p.PIO0, Irqs);
    let mut lines = PicoLines::new(&PIN_CLAIMS, common, sm0);
    let strip = LedStrip::<_, MAX_STRIP_LEN>::new(&mut lines, STRIP_PIN, STRIP_LEN)?;

    let button = Input::new(p.PIN_12, Pull::Up);
    let knob = PicoKnob::new(
        Adc::new_blocking(p.ADC, adc::Config::default()),
        adc::Channel::new_pin(p.PIN_26, Pull::None),
    );
    let i2c = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c::Config::default());
    let lcd = CharLcd::new_with_address(i2c, Delay, LCD_I2C_ADDRESS)?;

    let config = PanelConfig {
        adc_max: RP_ADC_MAX,
        legend: [
            concat!("RGB:GP", env!("KNOB_STRIP_PIN"), " LCD:4/5"),
            "KNOB:26 BTN:12",
        ],
        hold_to_stop_ms: Some(HOLD_TO_STOP_MS),
        ..PanelConfig::default()
    };
    info!("Starting panel with {} pixels on GPIO {}", STRIP_LEN, STRIP_PIN);

    let mut panel = Panel::new(knob, button, lcd, strip, config);
    panel.run(&mut Delay, &STOP)
}
