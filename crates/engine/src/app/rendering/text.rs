use super::Canvas;

pub const GLYPH_WIDTH: i32 = 3;
pub const GLYPH_HEIGHT: i32 = 5;

/// 3x5 bitmap glyphs for printable ASCII, starting at `' '`. Each entry packs
/// five 3-bit rows, top row in the highest bits.
const ASCII_GLYPHS: [u16; 95] = [
    0x0000, 0x2482, 0x5A00, 0x5F7D, 0x7DDF, 0x52A5, 0x2AAB, 0x2400,
    0x1491, 0x4494, 0x0AA8, 0x05D0, 0x0014, 0x01C0, 0x0002, 0x12A4,
    0x7B6F, 0x2C97, 0x73E7, 0x73CF, 0x5BC9, 0x79CF, 0x79EF, 0x7292,
    0x7BEF, 0x7BCF, 0x0410, 0x0414, 0x1511, 0x0E38, 0x4454, 0x72C2,
    0x7BE7, 0x2BED, 0x6BAE, 0x7927, 0x6B6E, 0x79A7, 0x79A4, 0x796F,
    0x5BED, 0x7497, 0x726F, 0x5BAD, 0x4927, 0x5FED, 0x5FFD, 0x7B6F,
    0x6BA4, 0x7B79, 0x6BAD, 0x79CF, 0x7492, 0x5B6F, 0x5B6A, 0x5BFD,
    0x5AAD, 0x5A92, 0x72A7, 0x6926, 0x4889, 0x324B, 0x2A00, 0x0007,
    0x4400, 0x0E7F, 0x49AE, 0x0F27, 0x13EF, 0x0FA7, 0x39A4, 0x0F79,
    0x49AD, 0x2092, 0x106A, 0x4BAD, 0x4927, 0x0DED, 0x0D6D, 0x0F6F,
    0x0D74, 0x0F79, 0x0D64, 0x0F8F, 0x2E93, 0x0B6F, 0x0B6A, 0x0B7A,
    0x0A95, 0x0B79, 0x0E57, 0x3593, 0x2492, 0x64D6, 0x0780,
];

const FALLBACK_CHAR: char = '?';

fn glyph_bits(ch: char) -> u16 {
    let index = |ch: char| (ch as usize).checked_sub(' ' as usize);
    index(ch)
        .and_then(|index| ASCII_GLYPHS.get(index))
        .or_else(|| index(FALLBACK_CHAR).and_then(|index| ASCII_GLYPHS.get(index)))
        .copied()
        .unwrap_or(0)
}

fn row_bits(bits: u16, row: i32) -> u16 {
    (bits >> ((GLYPH_HEIGHT - 1 - row) * GLYPH_WIDTH)) & 0b111
}

pub fn glyph_advance(scale: i32) -> i32 {
    (GLYPH_WIDTH + 1) * scale.max(1)
}

pub fn line_height(scale: i32) -> i32 {
    (GLYPH_HEIGHT + 2) * scale.max(1)
}

pub fn text_width(text: &str, scale: i32) -> i32 {
    let count = text.chars().count() as i32;
    if count == 0 {
        return 0;
    }
    count * glyph_advance(scale) - scale.max(1)
}

/// Draws `text` with its top-left at `(x, y)`. Unsupported characters render as `?`.
pub fn draw_text(canvas: &mut Canvas<'_>, mut x: i32, y: i32, text: &str, scale: i32, color: [u8; 4]) {
    let scale = scale.max(1);
    for ch in text.chars() {
        let bits = if ch == ' ' { 0 } else { glyph_bits(ch) };
        for row in 0..GLYPH_HEIGHT {
            let bits_row = row_bits(bits, row);
            for col in 0..GLYPH_WIDTH {
                if bits_row & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                canvas.fill_rect(x + col * scale, y + row * scale, scale, scale, color);
            }
        }
        x += glyph_advance(scale);
    }
}

pub fn draw_text_centered(canvas: &mut Canvas<'_>, center_x: i32, y: i32, text: &str, scale: i32, color: [u8; 4]) {
    let left = center_x - text_width(text, scale) / 2;
    draw_text(canvas, left, y, text, scale, color);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glyph_table_covers_printable_ascii() {
        for ch in ' '..='~' {
            let index = ch as usize - ' ' as usize;
            assert!(index < ASCII_GLYPHS.len(), "missing glyph for {ch:?}");
        }
        assert_ne!(glyph_bits('A'), 0);
        assert_eq!(glyph_bits('\u{e9}'), glyph_bits('?'));
    }

    #[test]
    fn zero_glyph_rows_decode_top_first() {
        // '0' is a box: full top and bottom rows, sides in between.
        let bits = glyph_bits('0');
        assert_eq!(row_bits(bits, 0), 0b111);
        assert_eq!(row_bits(bits, 2), 0b101);
        assert_eq!(row_bits(bits, 4), 0b111);
    }

    #[test]
    fn text_draws_scaled_pixels() {
        let mut frame = vec![0u8; 16 * 16 * 4];
        let mut canvas = Canvas::new(&mut frame, 16, 16);
        draw_text(&mut canvas, 0, 0, "1", 2, [255, 255, 255, 255]);
        // '1' has its top pixel in the middle column.
        assert_eq!(canvas.pixel(2, 0), Some([255, 255, 255, 255]));
        assert_eq!(canvas.pixel(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn width_excludes_trailing_gap() {
        assert_eq!(text_width("", 3), 0);
        assert_eq!(text_width("AB", 1), 7);
    }
}
