//! Generates the 8-bit sRGB decoding table used by `color::lut`.

use std::fmt::Write as _;
use std::path::PathBuf;

/// sRGB electro-optical transfer function (IEC 61966-2-1), input in 0..=1
fn decode_srgb(encoded: f64) -> f64 {
    if encoded <= 0.04045 {
        encoded / 12.92
    } else {
        ((encoded + 0.055) / 1.055).powf(2.4)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut table = String::from(
        "/// Linear light for every 8-bit sRGB channel value\n\
         pub static SRGB8_TO_LINEAR: [f64; 256] = [\n",
    );
    for row in (0u16..256).collect::<Vec<_>>().chunks(4) {
        table.push_str("   ");
        for &value in row {
            write!(table, " {:.17},", decode_srgb(f64::from(value) / 255.0))?;
        }
        table.push('\n');
    }
    table.push_str("];\n");

    let out = PathBuf::from(std::env::var("OUT_DIR")?).join("gamma_lut.rs");
    std::fs::write(out, table)?;

    println!("cargo::rerun-if-changed=build.rs");
    Ok(())
}
