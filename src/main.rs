// Include the pre-converted logo image binary data (generated at build time)
const LOGO_IMAGE: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/logo.bin"));

// Erase frames before new content, fewer leave ghosts of the old image
const CLEAR_PASSES: usize = 2;

// https://docs.esp-rs.org/esp-idf-svc/esp_idf_svc/
#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use esp_idf_svc::hal::delay::Delay;
    use esp_idf_svc::hal::gpio::AnyIOPin;
    use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::prelude::*;

    use ed060xc3::{PanelController, PinAssignment};

    // It is necessary to call this function once. Otherwise some patches to the runtime
    // implemented by esp-idf-sys might not link properly. See https://github.com/esp-rs/esp-idf-template/issues/71
    esp_idf_svc::sys::link_patches();

    // Bind the log crate to the ESP Logging facilities
    esp_idf_svc::log::EspLogger::initialize_default();

    let peripherals = Peripherals::take().context("Could not take peripherals")?;
    let pins = PinAssignment::BOARD;
    pins.validate().context("Invalid panel pin assignment")?;

    log::info!("Configuring power IC I2C on SDA {} / SCL {}", pins.sda, pins.scl);
    // SAFETY: the assignment was validated, nothing else in this firmware
    // claims these GPIOs
    let (sda, scl) = unsafe {
        (
            AnyIOPin::new(i32::from(pins.sda)),
            AnyIOPin::new(i32::from(pins.scl)),
        )
    };
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        sda,
        scl,
        &I2cConfig::new().baudrate(100.kHz().into()),
    )
    .context("Could not create I2C driver")?;

    // SAFETY: as above
    let lines = unsafe { ed060xc3::esp32::panel_pins(&pins) }
        .map_err(|e| anyhow::anyhow!("Could not claim panel pins: {:?}", e))?;

    let mut panel = PanelController::new(pins, lines, i2c, Delay::default())
        .context("Could not create panel controller")?;

    panel.enable().context("Panel power-up failed")?;

    let shown = show(&mut panel);
    // Rails must come down even if drawing failed
    panel.disable().context("Panel power-down failed")?;
    shown?;

    // Dropping the I2C driver shuts it down and frees SDA/SCL
    let (_lines, i2c, _delay) = panel.release();
    drop(i2c);

    log::info!("Done, panel unpowered");
    Ok(())
}

#[cfg(target_os = "espidf")]
fn show<P, D, I2C, DELAY>(
    panel: &mut ed060xc3::PanelController<P, D, I2C, DELAY>,
) -> anyhow::Result<()>
where
    P: ed060xc3::DirectionalPin,
    D: ed060xc3::WideGpioPort,
    I2C: embedded_hal::i2c::I2c,
    DELAY: embedded_hal::delay::DelayNs,
{
    use core::convert::Infallible;

    use anyhow::Context;
    use embedded_graphics::mono_font::{iso_8859_15::FONT_10X20, MonoTextStyle};
    use embedded_graphics::pixelcolor::BinaryColor;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
    use embedded_graphics::{prelude::*, text::Text};

    use ed060xc3::{Band, BandRenderer, PackedBitmap};

    log::info!("Clearing panel, {} passes", CLEAR_PASSES);
    panel.clear(CLEAR_PASSES).context("Clear failed")?;

    if LOGO_IMAGE.is_empty() {
        log::warn!("Logo image not available (logo.png not found at build time)");

        let style = MonoTextStyle::new(&FONT_10X20, BinaryColor::On); // On = black pixels
        let mut banner = BandRenderer::new(|band: &mut Band| {
            Rectangle::new(Point::new(20, 20), Size::new(984, 718))
                .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 4))
                .draw(band)?;
            Text::new("ED060XC3", Point::new(60, 80), style).draw(band)?;
            Text::new("1024 x 758, parallel bus", Point::new(60, 110), style).draw(band)?;
            Ok::<(), Infallible>(())
        });
        panel
            .draw(&mut banner, false)
            .map_err(|e| anyhow::anyhow!("Banner draw failed: {}", e))?;
    } else {
        log::info!("Logo image embedded, size: {} bytes", LOGO_IMAGE.len());
        let mut logo = PackedBitmap::new(LOGO_IMAGE).context("Logo has the wrong size")?;
        panel
            .draw(&mut logo, false)
            .map_err(|e| anyhow::anyhow!("Logo draw failed: {}", e))?;
    }

    log::info!("Frame shown");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    let logo = ed060xc3::PackedBitmap::new(LOGO_IMAGE);
    println!(
        "ed060xc3 firmware only runs on ESP-IDF targets; logo: {}, {} clear passes",
        match logo {
            Ok(_) => "embedded".to_string(),
            Err(e) => format!("not usable ({})", e),
        },
        CLEAR_PASSES,
    );
    Ok(())
}
