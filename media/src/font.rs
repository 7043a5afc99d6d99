//! Bitmap font glyph store, incremental UTF-8 decoding, and halo dilation.

use std::collections::HashMap;
use std::sync::OnceLock;

use thiserror::Error;

use crate::frame::Frame;
use crate::queue::plot;

/// A single monochrome glyph bitmap: one bit per pixel, row-major, MSB
/// first within each byte.
#[derive(Clone, Debug)]
pub struct Glyph {
    width: u32,
    height: u32,
    bits: Vec<u8>,
}

impl Glyph {
    fn bit(&self, x: u32, y: u32) -> bool {
        let idx = (y * self.width + x) as usize;
        let byte = self.bits[idx / 8];
        byte & (0x80 >> (idx % 8)) != 0
    }
}

/// A loaded set of glyphs, keyed by Unicode code point.
///
/// Three code points are special-cased rather than stored: `'\t'` advances
/// to the next multiple of [`Font::tab_width`], `'\n'` starts a new text
/// line, and `' '` (space) always advances by [`Font::space_width`] even if
/// no glyph bitmap was loaded for it.
#[derive(Clone, Debug, Default)]
pub struct Font {
    glyphs: HashMap<char, Glyph>,
    cell_width: u32,
    cell_height: u32,
}

impl Font {
    /// Constructs an empty font with the given advance-cell dimensions.
    #[must_use]
    pub fn new(cell_width: u32, cell_height: u32) -> Self {
        Self {
            glyphs: HashMap::new(),
            cell_width,
            cell_height,
        }
    }

    /// Parses glyphs from the line-oriented text format:
    /// `<hex-codepoint>:<bits>` per glyph, one glyph per line, blank lines
    /// and `#`-prefixed lines ignored. `bits` is 32 hex digits for a
    /// narrow 8×16 glyph or 64 hex digits for a wide 16×16 glyph; any other
    /// length is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] if a non-blank, non-comment line
    /// doesn't parse as `codepoint:bits`, or `bits` isn't 32 or 64 hex
    /// digits.
    pub fn load(&mut self, text: &str) -> Result<(), Error> {
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (cp, bits) = line.split_once(':').ok_or(Error::Malformed)?;

            let cp = u32::from_str_radix(cp, 16).map_err(|_| Error::Malformed)?;
            let ch = char::from_u32(cp).ok_or(Error::Malformed)?;
            let bytes = decode_hex(bits).ok_or(Error::Malformed)?;
            let (width, height) = match bytes.len() {
                16 => (8, 16),
                32 => (16, 16),
                _ => return Err(Error::Malformed),
            };
            self.glyphs.insert(ch, Glyph { width, height, bits: bytes });
        }
        Ok(())
    }

    /// The built-in retained font: 7-segment-style digit glyphs (`'0'..='9'`)
    /// at 8×16, loaded through [`Font::load`] in the same on-disk format a
    /// caller-supplied font uses. Every other code point falls back to
    /// [`Font::bad_glyph`] at draw time — a caller wanting full alphanumeric
    /// coverage loads its own glyph table over this one.
    #[must_use]
    pub fn builtin() -> Font {
        let mut font = Font::new(8, 16);
        font.load(&builtin_digits_source()).expect("built-in digit glyphs are well-formed");
        font
    }

    /// The fixed placeholder glyph drawn for a code point with no loaded
    /// bitmap: a hollow box outlining the glyph cell.
    #[must_use]
    pub fn bad_glyph(&self) -> Glyph {
        Glyph {
            width: self.cell_width,
            height: self.cell_height,
            bits: box_outline_bits(self.cell_width, self.cell_height),
        }
    }

    /// Width, in pixels, a `'\t'` advances to the next multiple of.
    #[must_use]
    pub fn tab_width(&self) -> u32 {
        self.cell_width * 8
    }

    /// Width, in pixels, a bare space advances by.
    #[must_use]
    pub fn space_width(&self) -> u32 {
        self.cell_width
    }

    /// Row height, in pixels, a `'\n'` advances by.
    #[must_use]
    pub fn line_height(&self) -> u32 {
        self.cell_height
    }

    fn glyph(&self, ch: char) -> Option<&Glyph> {
        self.glyphs.get(&ch)
    }

    /// Produces a dilated ("halo") variant of every loaded glyph: a glyph
    /// is lit in the halo if any of its eight neighbors (or itself) is lit
    /// in the source, minus the pixels the source itself already lights
    /// (so halo and glyph can be drawn as two non-overlapping passes, halo
    /// first in a contrasting color, then the glyph on top).
    #[must_use]
    pub fn halo(&self) -> Font {
        let mut out = self.clone();
        for glyph in out.glyphs.values_mut() {
            *glyph = dilate_glyph(glyph);
        }
        out
    }
}

/// Dilates `glyph` with a 3×3 cross (including the center), then masks out
/// the pixels the source itself already lights, leaving only the 1-pixel
/// halo ring. Dilation never reaches outside the glyph's own cell.
fn dilate_glyph(glyph: &Glyph) -> Glyph {
    let mut bits = vec![0u8; glyph.bits.len()];
    for y in 0..glyph.height {
        for x in 0..glyph.width {
            let mut lit = false;
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    let (nx, ny) = (x as i32 + dx, y as i32 + dy);
                    if nx < 0 || ny < 0 || nx as u32 >= glyph.width || ny as u32 >= glyph.height {
                        continue;
                    }
                    if glyph.bit(nx as u32, ny as u32) {
                        lit = true;
                    }
                }
            }
            let halo_only = lit && !glyph.bit(x, y);
            if halo_only {
                let idx = (y * glyph.width + x) as usize;
                bits[idx / 8] |= 0x80 >> (idx % 8);
            }
        }
    }
    Glyph {
        width: glyph.width,
        height: glyph.height,
        bits,
    }
}

/// Packs a row-major `width*height` boolean grid into MSB-first bytes, the
/// layout [`Glyph::bit`] expects.
fn pack_bits(width: u32, height: u32, lit: &[bool]) -> Vec<u8> {
    let mut bits = vec![0u8; ((width * height) as usize).div_ceil(8)];
    for (idx, &on) in lit.iter().enumerate() {
        if on {
            bits[idx / 8] |= 0x80 >> (idx % 8);
        }
    }
    bits
}

/// A hollow rectangle the full size of the cell, the "tofu" box drawn for
/// any code point with no loaded glyph.
fn box_outline_bits(width: u32, height: u32) -> Vec<u8> {
    let mut lit = vec![false; (width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            let border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
            if border {
                lit[(y * width + x) as usize] = true;
            }
        }
    }
    pack_bits(width, height, &lit)
}

/// Segment flags in `top, top_left, top_right, middle, bottom_left,
/// bottom_right, bottom` order, the classic 7-segment-display encoding for
/// `'0'..='9'`.
const DIGIT_SEGMENTS: [[bool; 7]; 10] = [
    [true, true, true, false, true, true, true],
    [false, false, true, false, false, true, false],
    [true, false, true, true, true, false, true],
    [true, false, true, true, false, true, true],
    [false, true, true, true, false, true, false],
    [true, true, false, true, false, true, true],
    [true, true, false, true, true, true, true],
    [true, false, true, false, false, true, false],
    [true, true, true, true, true, true, true],
    [true, true, true, true, false, true, true],
];

/// Renders one digit's segment flags onto an 8×16 boolean grid.
fn seven_segment_bits(segments: [bool; 7]) -> Vec<u8> {
    let (width, height) = (8u32, 16u32);
    let mut lit = vec![false; (width * height) as usize];
    let mut fill = |x0: u32, x1: u32, y0: u32, y1: u32| {
        for y in y0..y1 {
            for x in x0..x1 {
                lit[(y * width + x) as usize] = true;
            }
        }
    };
    let [top, top_left, top_right, middle, bottom_left, bottom_right, bottom] = segments;
    if top {
        fill(2, 6, 1, 3);
    }
    if top_left {
        fill(1, 3, 2, 8);
    }
    if top_right {
        fill(5, 7, 2, 8);
    }
    if middle {
        fill(2, 6, 7, 9);
    }
    if bottom_left {
        fill(1, 3, 8, 14);
    }
    if bottom_right {
        fill(5, 7, 8, 14);
    }
    if bottom {
        fill(2, 6, 13, 15);
    }
    pack_bits(width, height, &lit)
}

/// The built-in digit glyphs, in [`Font::load`]'s `codepoint:bits` format.
fn builtin_digits_source() -> String {
    let mut source = String::new();
    for (digit, segments) in DIGIT_SEGMENTS.iter().enumerate() {
        let ch = char::from_digit(digit as u32, 10).expect("0..=9 are valid decimal digits");
        let bits = seven_segment_bits(*segments);
        source.push_str(&format!("{:x}:{}\n", ch as u32, encode_hex(&bits)));
    }
    source
}

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

/// An error loading a bitmap font definition.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum Error {
    /// A glyph line didn't match `codepoint:bits`.
    #[error("malformed glyph definition")]
    Malformed,
}

/// The retained, loaded default font, built once on first use.
fn default_font() -> &'static Font {
    static FONT: OnceLock<Font> = OnceLock::new();
    FONT.get_or_init(Font::builtin)
}

/// Draws `text` at `(x, y)` using the retained default font, blending `fg`
/// onto lit pixels and `bg` onto unlit ones (the caller passes an alpha of
/// `0xFF` for `bg` to skip background fill entirely). `halo`, if given, is
/// a `(color, alpha)` pair drawn into the 1-pixel dilation ring around each
/// glyph (see [`Font::halo`]). `double_w`/`double_h` each double the glyph's
/// emitted pixels along that axis.
#[allow(clippy::too_many_arguments)]
pub(crate) fn draw_text(
    frame: &mut Frame<'_>,
    x: i32,
    y: i32,
    text: &str,
    fg: u32,
    bg: u32,
    alpha: u8,
    halo: Option<(u32, u8)>,
    double_w: bool,
    double_h: bool,
) {
    let font = default_font();
    let mut cursor_x = x;
    let mut cursor_y = y;
    let mut decoder = Utf8Decoder::new();
    for byte in text.bytes() {
        let ch = match decoder.push(byte) {
            Ok(Step::Pending) => continue,
            Ok(Step::Char(ch)) => ch,
            // `text` is already a valid `&str`; a decode error here can't
            // happen, but drop the byte rather than panic if it ever did.
            Err(_) => continue,
        };
        match ch {
            '\n' => {
                cursor_x = x;
                cursor_y += font.line_height() as i32 * scale(double_h);
                continue;
            }
            '\t' => {
                let advance = font.tab_width() as i32 * scale(double_w);
                cursor_x += advance - (cursor_x - x) % advance;
                continue;
            }
            ' ' => {
                cursor_x += font.space_width() as i32 * scale(double_w);
                continue;
            }
            _ => {}
        }

        let glyph = font.glyph(ch).cloned().unwrap_or_else(|| font.bad_glyph());
        let dilated = halo.map(|_| dilate_glyph(&glyph));
        for gy in 0..glyph.height {
            for gx in 0..glyph.width {
                let (color, a) = if glyph.bit(gx, gy) {
                    (fg, alpha)
                } else if let (Some((halo_color, halo_alpha)), Some(dilated)) = (halo, &dilated) {
                    if dilated.bit(gx, gy) {
                        (halo_color, halo_alpha)
                    } else {
                        (bg, alpha)
                    }
                } else {
                    (bg, alpha)
                };
                plot_scaled(
                    frame,
                    cursor_x + gx as i32 * scale(double_w),
                    cursor_y + gy as i32 * scale(double_h),
                    color,
                    a,
                    double_w,
                    double_h,
                );
            }
        }
        cursor_x += glyph.width as i32 * scale(double_w);
    }
}

fn scale(doubled: bool) -> i32 {
    if doubled {
        2
    } else {
        1
    }
}

/// Plots one source pixel, duplicated into a 2×1/1×2/2×2 block when
/// `double_w`/`double_h` request it.
fn plot_scaled(frame: &mut Frame<'_>, x: i32, y: i32, color: u32, alpha: u8, double_w: bool, double_h: bool) {
    let width = if double_w { 2 } else { 1 };
    let height = if double_h { 2 } else { 1 };
    for dy in 0..height {
        for dx in 0..width {
            plot(frame, x + dx, y + dy, color, alpha);
        }
    }
}

/// Incremental UTF-8 decoder state.
///
/// Feeds one byte at a time via [`Utf8Decoder::push`], accepting exactly
/// well-formed UTF-8: overlong encodings, surrogate code points, and
/// truncated sequences at end-of-input are all rejected rather than
/// silently replaced.
#[derive(Clone, Copy, Debug, Default)]
pub struct Utf8Decoder {
    /// Code point accumulated so far.
    acc: u32,
    /// Bytes still expected to complete the current sequence.
    remaining: u8,
    /// Lower bound the finished code point must meet (rejects overlong
    /// encodings).
    lower_bound: u32,
}

/// The result of feeding one byte to a [`Utf8Decoder`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
    /// The sequence is still incomplete; feed another byte.
    Pending,
    /// A full, valid code point was decoded.
    Char(char),
}

impl Utf8Decoder {
    /// Constructs a fresh decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the next byte of input.
    ///
    /// # Errors
    ///
    /// Returns [`Utf8Error::Malformed`] on any byte that can't legally
    /// continue or start a UTF-8 sequence.
    pub fn push(&mut self, byte: u8) -> Result<Step, Utf8Error> {
        if self.remaining == 0 {
            let (len, first_bits, lower_bound) = match byte {
                0x00..=0x7F => (0, u32::from(byte), 0),
                0xC2..=0xDF => (1, u32::from(byte & 0x1F), 0x80),
                0xE0..=0xEF => (2, u32::from(byte & 0x0F), 0x800),
                0xF0..=0xF4 => (3, u32::from(byte & 0x07), 0x1_0000),
                _ => return Err(Utf8Error::Malformed),
            };
            if len == 0 {
                return Ok(Step::Char(char::from_u32(first_bits).ok_or(Utf8Error::Malformed)?));
            }
            self.acc = first_bits;
            self.remaining = len;
            self.lower_bound = lower_bound;
            return Ok(Step::Pending);
        }

        if byte & 0xC0 != 0x80 {
            return Err(Utf8Error::Malformed);
        }
        self.acc = (self.acc << 6) | u32::from(byte & 0x3F);
        self.remaining -= 1;
        if self.remaining > 0 {
            return Ok(Step::Pending);
        }

        if self.acc < self.lower_bound || (0xD800..=0xDFFF).contains(&self.acc) {
            return Err(Utf8Error::Malformed);
        }
        let ch = char::from_u32(self.acc).ok_or(Utf8Error::Malformed)?;
        *self = Self::default();
        Ok(Step::Char(ch))
    }
}

/// An error decoding a UTF-8 byte stream.
#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum Utf8Error {
    /// The byte stream is not well-formed UTF-8.
    #[error("malformed utf-8 sequence")]
    Malformed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ascii() {
        let mut dec = Utf8Decoder::new();
        assert_eq!(dec.push(b'A').unwrap(), Step::Char('A'));
    }

    #[test]
    fn decodes_multibyte() {
        let mut dec = Utf8Decoder::new();
        // "é" = U+00E9 = 0xC3 0xA9
        assert_eq!(dec.push(0xC3).unwrap(), Step::Pending);
        assert_eq!(dec.push(0xA9).unwrap(), Step::Char('\u{E9}'));
    }

    #[test]
    fn rejects_overlong_encoding() {
        let mut dec = Utf8Decoder::new();
        // Overlong encoding of U+002F ('/') as two bytes.
        assert_eq!(dec.push(0xC0).unwrap_err(), Utf8Error::Malformed);
    }

    #[test]
    fn rejects_surrogate_code_point() {
        let mut dec = Utf8Decoder::new();
        // U+D800 encoded as three bytes: 0xED 0xA0 0x80.
        assert_eq!(dec.push(0xED).unwrap(), Step::Pending);
        assert_eq!(dec.push(0xA0).unwrap_err(), Utf8Error::Malformed);
    }

    #[test]
    fn rejects_truncated_continuation() {
        let mut dec = Utf8Decoder::new();
        assert_eq!(dec.push(0xE0).unwrap(), Step::Pending);
        assert_eq!(dec.push(b'A').unwrap_err(), Utf8Error::Malformed);
    }

    #[test]
    fn load_and_query_glyph() {
        let mut font = Font::new(8, 16);
        // 8x16 glyph, leftmost column lit on every row.
        let bits = "80".repeat(16);
        font.load(&format!("41:{bits}")).unwrap();
        let glyph = font.glyph('A').unwrap();
        assert!(glyph.bit(0, 0));
        assert!(!glyph.bit(1, 0));
    }

    #[test]
    fn load_rejects_bad_bit_length() {
        let mut font = Font::new(8, 16);
        assert_eq!(font.load("41:aabb").unwrap_err(), Error::Malformed);
    }

    #[test]
    fn halo_excludes_original_glyph_pixels() {
        let (width, height) = (8u32, 16u32);
        let mut lit = vec![false; (width * height) as usize];
        lit[(8 * width + 4) as usize] = true;
        let bits = pack_bits(width, height, &lit);
        let mut font = Font::new(width, height);
        font.load(&format!("41:{}", encode_hex(&bits))).unwrap();
        let halo = font.halo();
        let orig = font.glyph('A').unwrap();
        let dilated = halo.glyph('A').unwrap();
        for y in 0..height {
            for x in 0..width {
                if orig.bit(x, y) {
                    assert!(!dilated.bit(x, y), "halo must not overlap source glyph");
                }
            }
        }
        assert!(dilated.bit(4, 7), "halo should light the pixel directly above the source pixel");
    }

    #[test]
    fn builtin_font_has_digit_glyphs() {
        let font = Font::builtin();
        let glyph = font.glyph('5').expect("digit glyphs are built in");
        let any_lit = (0..glyph.height).flat_map(|y| (0..glyph.width).map(move |x| (x, y))).any(|(x, y)| glyph.bit(x, y));
        assert!(any_lit);
    }

    #[test]
    fn bad_glyph_is_hollow_box() {
        let font = Font::new(4, 4);
        let glyph = font.bad_glyph();
        assert!(glyph.bit(0, 0));
        assert!(glyph.bit(3, 3));
        assert!(!glyph.bit(1, 1));
        assert!(!glyph.bit(2, 2));
    }

    #[test]
    fn draw_text_renders_known_glyph_pixels() {
        let mut frame = Frame::new(8, 16);
        draw_text(&mut frame, 0, 0, "0", 0x00FF_FFFF, 0, 0, None, false, false);
        let lit = (0..frame.height())
            .flat_map(|y| (0..frame.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| frame.rowptr(y)[x] == 0x00FF_FFFF)
            .count();
        assert!(lit > 0, "drawing a known glyph must light at least one pixel");
    }

    #[test]
    fn draw_text_unknown_codepoint_draws_bad_glyph() {
        let mut frame = Frame::new(8, 16);
        draw_text(&mut frame, 0, 0, "\u{1F600}", 0x00FF_FFFF, 0, 0, None, false, false);
        let lit = (0..frame.height())
            .flat_map(|y| (0..frame.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| frame.rowptr(y)[x] == 0x00FF_FFFF)
            .count();
        assert!(lit > 0, "an unmapped code point must still draw the bad-glyph box");
    }

    #[test]
    fn draw_text_halo_is_disjoint_from_glyph_pixels() {
        let mut frame = Frame::new(8, 16);
        let fg = 0x00FF_FFFF;
        let halo_color = 0x0000_FF00;
        draw_text(&mut frame, 0, 0, "0", fg, 0, 0, Some((halo_color, 0)), false, false);
        let mut fg_count = 0;
        let mut halo_count = 0;
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                let pixel = frame.rowptr(y)[x];
                if pixel == fg {
                    fg_count += 1;
                }
                if pixel == halo_color {
                    halo_count += 1;
                }
            }
        }
        assert!(fg_count > 0);
        assert!(halo_count > 0);
    }

    #[test]
    fn draw_text_doubling_quadruples_lit_pixel_count() {
        let count = |frame: &Frame<'_>| -> usize {
            (0..frame.height())
                .flat_map(|y| (0..frame.width()).map(move |x| (x, y)))
                .filter(|&(x, y)| frame.rowptr(y)[x] == 0x00FF_FFFF)
                .count()
        };
        let mut single = Frame::new(16, 32);
        draw_text(&mut single, 0, 0, "0", 0x00FF_FFFF, 0, 0, None, false, false);
        let mut doubled = Frame::new(16, 32);
        draw_text(&mut doubled, 0, 0, "0", 0x00FF_FFFF, 0, 0, None, true, true);
        assert_eq!(count(&doubled), count(&single) * 4);
    }
}
