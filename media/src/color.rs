//! Premultiplied color and alpha blending.
//!
//! Alpha follows the lsnes convention: `0` is fully opaque, `0xFF` is fully
//! transparent (the inverse of the usual convention), matching §4.2.

use std::str::FromStr;

use chex::Color as Rgb;

/// A color plus alpha, with the blending halves precomputed.
///
/// `apply(pixel)` computes `(color * (256 - mix) + pixel * mix) / 256`
/// componentwise, in two parallel 8.8-fixed-point lanes (the `00RR00BB` /
/// `00GG0000`-style packing below keeps the red/blue and green channels from
/// overflowing into one another during the multiply). `mix` stretches the
/// 8-bit `alpha` (`0..=255`) to a `0..=256` pixel weight via `a + (a >> 7)`,
/// the usual fixed-point trick to land exactly on both endpoints: `alpha=0`
/// gives `mix=0` (opaque overwrite by the stored color), `alpha=0xFF` gives
/// `mix=256` (no-op, the pixel passes through unchanged).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Premultiplied {
    /// Original 24-bit `0x00RRGGBB` color.
    rgb: u32,
    /// Alpha: `0` = opaque, `0xFF` = transparent.
    alpha: u8,
    /// Pixel weight in `0..=256`, stretched from `alpha`.
    mix: u32,
    /// `(color & 0x00FF00FF) * (256 - mix)`, the red/blue lane's additive term.
    premul_hi: u32,
    /// `((color >> 8) & 0x00FF00FF) * (256 - mix)`, the green lane's additive term.
    premul_lo: u32,
}

impl Premultiplied {
    /// Constructs a `Premultiplied` color from a 24-bit RGB value and alpha.
    #[must_use]
    pub fn new(rgb: u32, alpha: u8) -> Self {
        let rgb = rgb & 0x00FF_FFFF;
        let a = u32::from(alpha);
        let mix = a + (a >> 7);
        let weight = 256 - mix;
        let premul_hi = (rgb & 0x00FF_00FF) * weight;
        let premul_lo = ((rgb >> 8) & 0x00FF_00FF) * weight;
        Self {
            rgb,
            alpha,
            mix,
            premul_hi,
            premul_lo,
        }
    }

    /// The original (non-premultiplied) 24-bit RGB value.
    #[must_use]
    pub fn rgb(&self) -> u32 {
        self.rgb
    }

    /// The alpha channel (`0` opaque, `0xFF` transparent).
    #[must_use]
    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    /// Blends this color onto `pixel`, a 24-bit `0x00RRGGBB` value.
    ///
    /// At `alpha == 0` this returns `self.rgb()` unchanged from the caller's
    /// perspective only after a full overwrite: `apply` is opaque-overwrite
    /// at `alpha=0` and a no-op at `alpha=0xFF` (testable property 4).
    #[must_use]
    pub fn apply(&self, pixel: u32) -> u32 {
        let pixel = pixel & 0x00FF_FFFF;
        let hi = ((pixel & 0x00FF_00FF) * self.mix).wrapping_add(self.premul_hi);
        let lo = (((pixel >> 8) & 0x00FF_00FF) * self.mix).wrapping_add(self.premul_lo);
        // Recombine: `hi`/`lo` each hold per-channel sums in the 0..=0xFFFF
        // range per byte lane; divide by 256 (shift) to fold the fixed-point
        // fraction back down, then re-interleave the lanes.
        let hi = (hi >> 8) & 0x00FF_00FF;
        let lo = ((lo >> 8) & 0x00FF_00FF) << 8;
        hi | lo
    }
}

/// Parses a script-facing color argument.
///
/// Accepts either a bare 32-bit ARGB integer, a `"#RRGGBB[AA]"` hex string
/// (delegated to [`chex`]), or (reserved for callers with a name table) a
/// color name. This crate only implements the first two forms; a caller
/// wiring up named colors should fall back to its own table before reaching
/// for [`parse_color`].
///
/// # Errors
///
/// Returns an error if `s` is neither a bare integer nor a `#RRGGBB[AA]`
/// hex string.
pub fn parse_color(s: &str) -> Result<(u32, u8), Error> {
    if let Some(hex) = s.strip_prefix('#') {
        let (rgb_part, alpha) = match hex.len() {
            6 => (hex, 0),
            8 => {
                let (rgb, a) = hex.split_at(6);
                (rgb, u8::from_str_radix(a, 16).map_err(|_| Error::Malformed)?)
            }
            _ => return Err(Error::Malformed),
        };
        let rgb = Rgb::from_str(&format!("#{rgb_part}")).map_err(|_| Error::Malformed)?;
        return Ok((u32::from(rgb), alpha));
    }
    if let Ok(argb) = s.parse::<u32>() {
        let alpha = ((argb >> 24) & 0xFF) as u8;
        return Ok((argb & 0x00FF_FFFF, alpha));
    }
    Err(Error::Malformed)
}

/// An error parsing a script-facing color argument.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// Neither a bare integer nor a recognized hex form.
    #[error("malformed color argument")]
    Malformed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_zero_is_opaque_overwrite() {
        let c = Premultiplied::new(0x112233, 0);
        assert_eq!(c.apply(0xAABBCC), 0x112233);
    }

    #[test]
    fn alpha_max_is_no_op() {
        let c = Premultiplied::new(0x112233, 0xFF);
        assert_eq!(c.apply(0xAABBCC), 0xAABBCC);
    }

    #[test]
    fn parse_hex_rgb() {
        assert_eq!(parse_color("#ff0000").unwrap(), (0x00FF_0000, 0));
    }

    #[test]
    fn parse_hex_rgba() {
        assert_eq!(parse_color("#ff000080").unwrap(), (0x00FF_0000, 0x80));
    }

    #[test]
    fn parse_bare_argb() {
        assert_eq!(parse_color("16711680").unwrap(), (0x00FF_0000, 0));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_color("not-a-color").is_err());
    }
}
