//! SSD1306 128×32 status panel.

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};
use pedal_link::config;
use pedal_link::StatusView;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

/// Buffered 128×32 SSD1306 on whatever blocking I²C bus the board provides.
pub type Display<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x32, BufferedGraphicsMode<DisplaySize128x32>>;

/// Height of one text row (FONT_6X10 plus a one-pixel gap).
const LINE_HEIGHT: i32 = 11;

/// Bring the panel up blank. Fails if the controller does not answer.
pub fn init<I2C>(i2c: I2C) -> Result<Display<I2C>, pedal_link::Error>
where
    I2C: embedded_hal::i2c::I2c,
{
    let interface = I2CDisplayInterface::new_custom_address(i2c, config::DISPLAY_I2C_ADDRESS);
    let mut display = Ssd1306::new(interface, DisplaySize128x32, DisplayRotation::Rotate0)
        .into_buffered_graphics_mode();
    display.init().map_err(|_| pedal_link::Error::Display)?;
    display.clear_buffer();
    display.flush().map_err(|_| pedal_link::Error::Display)?;
    Ok(display)
}

fn text_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(BinaryColor::On)
        .build()
}

fn inverted_style() -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(BinaryColor::Off)
        .build()
}

fn row(index: i32) -> Point {
    Point::new(0, index * LINE_HEIGHT)
}

/// Render the status panel: pedal state, link state, pump address.
///
/// The link row is drawn inverted while the pump is unreachable.
pub fn draw_status<I2C>(display: &mut Display<I2C>, view: StatusView, peer_label: &str)
where
    I2C: embedded_hal::i2c::I2c,
{
    display.clear_buffer();

    let _ = Text::with_baseline(view.pedal_label(), row(0), text_style(), Baseline::Top)
        .draw(display);

    if view.link_alert() {
        let _ = Rectangle::new(row(1), Size::new(config::DISPLAY_WIDTH, LINE_HEIGHT as u32))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(display);
        let _ = Text::with_baseline(view.link_label(), row(1), inverted_style(), Baseline::Top)
            .draw(display);
    } else {
        let _ = Text::with_baseline(view.link_label(), row(1), text_style(), Baseline::Top)
            .draw(display);
    }

    let _ = Text::with_baseline(peer_label, row(2), text_style(), Baseline::Top).draw(display);

    let _ = display.flush();
}
