//! LCD Display driver for HD44780-compatible displays with PCF8574 I2C backpack

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::panel::TextDisplay;
use crate::{Error, Result};

/// Most common PCF8574 backpack address; some boards use 0x3F.
pub const DEFAULT_ADDRESS: u8 = 0x27;

// PCF8574 pin mapping: P0=RS, P1=RW, P2=E, P3=Backlight, P4-P7=Data
const LCD_BACKLIGHT: u8 = 0x08;
const LCD_ENABLE: u8 = 0x04;
const LCD_RS: u8 = 0x01;

const CMD_CLEAR: u8 = 0x01;
const CMD_HOME: u8 = 0x02;
const CMD_ENTRY_INCREMENT: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_DISPLAY_OFF: u8 = 0x08;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

/// DDRAM start address of each row (20x4 layout; 16x2 uses the first two).
const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

/// Character LCD Display with I2C interface (HD44780 + PCF8574 backpack)
pub struct CharLcd<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
}

impl<I2C, D> CharLcd<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Create a new LCD instance with default I2C address (0x27) and initialize it
    ///
    /// # Errors
    /// [`Error::Display`] if the backpack does not acknowledge.
    pub fn new(i2c: I2C, delay: D) -> Result<Self> {
        Self::new_with_address(i2c, delay, DEFAULT_ADDRESS)
    }

    /// Create a new LCD instance with custom I2C address and initialize it
    ///
    /// # Errors
    /// [`Error::Display`] if the backpack does not acknowledge.
    pub fn new_with_address(i2c: I2C, delay: D, address: u8) -> Result<Self> {
        let mut lcd = Self {
            i2c,
            delay,
            address,
        };
        lcd.init()?;
        Ok(lcd)
    }

    /// Gives back the bus and delay.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    #[expect(clippy::arithmetic_side_effects, reason = "Bit operations")]
    fn write_nibble(&mut self, nibble: u8, rs: bool) -> Result<()> {
        let rs_bit = if rs { LCD_RS } else { 0 };
        let data = (nibble << 4) | LCD_BACKLIGHT | rs_bit;

        // Write with enable high
        self.i2c
            .write(self.address, &[data | LCD_ENABLE])
            .map_err(|_| Error::Display)?;
        self.delay.delay_us(1);

        // Write with enable low
        self.i2c
            .write(self.address, &[data])
            .map_err(|_| Error::Display)?;
        self.delay.delay_us(50);
        Ok(())
    }

    fn write_byte(&mut self, byte: u8, rs: bool) -> Result<()> {
        self.write_nibble(byte >> 4, rs)?;
        self.write_nibble(byte & 0x0F, rs)
    }

    fn command(&mut self, command: u8) -> Result<()> {
        self.write_byte(command, false)
    }

    fn init(&mut self) -> Result<()> {
        self.delay.delay_ms(50);

        // Initialize in 4-bit mode
        self.write_nibble(0x03, false)?;
        self.delay.delay_ms(5);
        self.write_nibble(0x03, false)?;
        self.delay.delay_us(150);
        self.write_nibble(0x03, false)?;
        self.write_nibble(0x02, false)?;

        self.command(CMD_FUNCTION_4BIT_2LINE)?;
        self.command(CMD_DISPLAY_ON)?;
        self.clear()?;
        self.command(CMD_ENTRY_INCREMENT)?;
        debug!("LCD at I2C address {} initialized", self.address);
        Ok(())
    }

    /// Clear the display
    ///
    /// # Errors
    /// [`Error::Display`] on bus failure.
    pub fn clear(&mut self) -> Result<()> {
        self.command(CMD_CLEAR)?;
        self.delay.delay_ms(2);
        Ok(())
    }

    /// Return cursor to home position (0, 0)
    ///
    /// # Errors
    /// [`Error::Display`] on bus failure.
    pub fn home(&mut self) -> Result<()> {
        self.command(CMD_HOME)?;
        self.delay.delay_ms(2);
        Ok(())
    }

    /// Set cursor position; rows past the fourth wrap to the first.
    ///
    /// # Errors
    /// [`Error::Display`] on bus failure.
    pub fn set_cursor(&mut self, row: u8, col: u8) -> Result<()> {
        let offset = ROW_OFFSETS
            .get(usize::from(row))
            .copied()
            .unwrap_or_default();
        self.command(CMD_SET_DDRAM | offset.wrapping_add(col))
    }

    /// Write text at the cursor; non-ASCII characters show as `?`.
    ///
    /// # Errors
    /// [`Error::Display`] on bus failure.
    pub fn print(&mut self, text: &str) -> Result<()> {
        for ch in text.chars() {
            let byte = u8::try_from(ch).ok().filter(u8::is_ascii).unwrap_or(b'?');
            self.write_byte(byte, true)?;
        }
        Ok(())
    }

    /// Turn display on
    ///
    /// # Errors
    /// [`Error::Display`] on bus failure.
    pub fn display_on(&mut self) -> Result<()> {
        self.command(CMD_DISPLAY_ON)
    }

    /// Turn display off (contents are kept)
    ///
    /// # Errors
    /// [`Error::Display`] on bus failure.
    pub fn display_off(&mut self) -> Result<()> {
        self.command(CMD_DISPLAY_OFF)
    }
}

impl<I2C, D> TextDisplay for CharLcd<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    fn clear(&mut self) -> Result<()> {
        Self::clear(self)
    }

    fn set_cursor(&mut self, row: u8, col: u8) -> Result<()> {
        Self::set_cursor(self, row, col)
    }

    fn write_str(&mut self, text: &str) -> Result<()> {
        self.print(text)
    }
}
