use super::command;

use image::{GenericImageView, Pixel, Rgba};

/// Pins of the print head. The raster lines always cover all of them.
pub const LINE_PINS: usize = 720;

/// Bytes of one raster line.
pub const LINE_BYTES: usize = LINE_PINS / 8;

/// Red is at least this bright ...
const RED_MIN: u8 = 0xc0;

/// ... while green and blue stay below this.
const RED_OTHER_MAX: u8 = 0x40;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Black marks on any tape
    #[default]
    Monochrome,

    /// Black and red marks on two-color tape
    RedBlack,
}

/// Only opaque, pure black pixels are printed. Anti-aliased grays count as background.
fn is_black(pix: Rgba<u8>) -> bool {
    let [r, g, b, a] = pix.0;
    a != 0 && r == 0 && g == 0 && b == 0
}

fn is_red(pix: Rgba<u8>) -> bool {
    let [r, g, b, a] = pix.0;
    a != 0 && r >= RED_MIN && g < RED_OTHER_MAX && b < RED_OTHER_MAX
}

/// Packs bits MSB first into a fixed buffer and drops whatever does not fit.
struct BitWriter<'a> {
    output: &'a mut [u8],
    bit_idx: usize,
}

impl<'a> BitWriter<'a> {
    pub fn new(output: &'a mut [u8]) -> Self {
        Self { output, bit_idx: 0 }
    }

    pub fn skip(&mut self, bits: usize) {
        self.bit_idx = self.bit_idx.saturating_add(bits);
    }

    /// Returns `false` once the buffer is full.
    pub fn write_bit(&mut self, bit: bool) -> bool {
        let Some(byte) = self.output.get_mut(self.bit_idx / 8) else {
            return false;
        };

        *byte |= (bit as u8) << (7 - self.bit_idx % 8);
        self.bit_idx += 1;

        true
    }
}

fn push_line(data: &mut Vec<u8>, header: [u8; 2], line: &[u8; LINE_BYTES]) {
    data.extend_from_slice(&header);
    data.push(LINE_BYTES as u8);
    data.extend_from_slice(line);
}

/// Convert an image into raster lines.
///
/// Every line starts `margin_pins` into the print head and samples the image row from back to
/// front, as the printer sees the label mirrored. Pixels beyond the print head are dropped.
///
/// With a non-zero `length_pins`, exactly that many lines are produced: taller images are cut,
/// shorter ones are padded with blank lines. Otherwise every image row becomes one line.
pub fn encode<I>(image: &I, margin_pins: u32, length_pins: u32, mode: ColorMode) -> Vec<u8>
where
    I: GenericImageView,
    I::Pixel: Pixel<Subpixel = u8>,
{
    let (width, height) = image.dimensions();
    let lines = if length_pins == 0 {
        height
    } else {
        length_pins
    };

    let planes = match mode {
        ColorMode::Monochrome => 1,
        ColorMode::RedBlack => 2,
    };

    let mut data = Vec::with_capacity(lines as usize * planes * (3 + LINE_BYTES));
    let mut black = [0u8; LINE_BYTES];
    let mut red = [0u8; LINE_BYTES];

    for y in 0..lines {
        // Zero the lines.
        black.fill(0);
        red.fill(0);

        if y < height {
            let mut black_writer = BitWriter::new(&mut black);
            let mut red_writer = BitWriter::new(&mut red);

            black_writer.skip(margin_pins as usize);
            red_writer.skip(margin_pins as usize);

            // Sample the row from back to front.
            for x in (0..width).rev() {
                let pix = image.get_pixel(x, y).to_rgba();

                if !black_writer.write_bit(is_black(pix)) {
                    break;
                }

                if mode == ColorMode::RedBlack {
                    red_writer.write_bit(is_red(pix));
                }
            }
        }

        match mode {
            ColorMode::Monochrome => push_line(&mut data, command::RASTER_LINE, &black),
            ColorMode::RedBlack => {
                push_line(&mut data, command::RASTER_LINE_BLACK, &black);
                push_line(&mut data, command::RASTER_LINE_RED, &red);
            }
        }
    }

    data
}
