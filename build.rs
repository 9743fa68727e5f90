use image::imageops::FilterType;
use std::env;
use std::fs;
use std::path::Path;

// Panel geometry, rows top to bottom
const PANEL_WIDTH: u32 = 1024;
const PANEL_HEIGHT: u32 = 758;

// 0-255, pixels darker than this become black
const THRESHOLD: u8 = 128;

/// Convert a PNG image to the packed 1 bit per pixel format the panel
/// driver reads: MSB is the leftmost pixel, a set bit is black.
///
/// The image is scaled to fit the panel keeping its aspect ratio and centered
/// on a white background. A missing input produces an empty file.
fn convert_image_to_binary(
    input_path: &str,
    output_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed={}", input_path);

    if !Path::new(input_path).exists() {
        println!(
            "cargo:warning=Image file '{}' not found, embedding no logo",
            input_path
        );
        fs::write(output_path, b"")?;
        return Ok(());
    }

    let img = image::open(input_path)?;

    // Fit inside the panel without distorting
    let scale = f32::min(
        PANEL_WIDTH as f32 / img.width() as f32,
        PANEL_HEIGHT as f32 / img.height() as f32,
    );
    let new_width = ((img.width() as f32 * scale) as u32).clamp(1, PANEL_WIDTH);
    let new_height = ((img.height() as f32 * scale) as u32).clamp(1, PANEL_HEIGHT);
    let gray = img
        .resize_exact(new_width, new_height, FilterType::Lanczos3)
        .to_luma8();

    let offset_x = (PANEL_WIDTH - new_width) / 2;
    let offset_y = (PANEL_HEIGHT - new_height) / 2;

    let bytes_per_row = PANEL_WIDTH.div_ceil(8);
    let mut buffer = vec![0u8; (bytes_per_row * PANEL_HEIGHT) as usize];

    for (ix, iy, pixel) in gray.enumerate_pixels() {
        if pixel[0] >= THRESHOLD {
            continue;
        }
        let (x, y) = (ix + offset_x, iy + offset_y);
        buffer[(y * bytes_per_row + x / 8) as usize] |= 0x80 >> (x % 8);
    }

    fs::write(output_path, &buffer)?;
    println!(
        "cargo:warning=Logo {}x{} -> {}x{} at ({}, {}), {} bytes",
        img.width(),
        img.height(),
        new_width,
        new_height,
        offset_x,
        offset_y,
        buffer.len()
    );
    Ok(())
}

fn main() {
    // ESP-IDF link arguments only make sense for the firmware target, the
    // driver library and its tests build on the host
    if env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }

    let Ok(out_dir) = env::var("OUT_DIR") else {
        println!("cargo:warning=OUT_DIR not set, cannot embed logo");
        return;
    };
    let logo_output = Path::new(&out_dir).join("logo.bin");

    if let Err(e) = convert_image_to_binary("logo.png", &logo_output) {
        println!("cargo:warning=Failed to convert logo.png: {}", e);
        // An empty file makes the firmware fall back to its text banner
        if let Err(e) = fs::write(&logo_output, b"") {
            println!("cargo:warning=Could not write {}: {}", logo_output.display(), e);
        }
    }

    println!("cargo:rerun-if-changed=logo.png");
}
