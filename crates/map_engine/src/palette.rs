//! Deterministic community colors.
//!
//! A community's fill is a pure function of its name: the name is folded
//! into a 32-bit integer with `h = h * 31 + code_unit` (wrapping) over its
//! UTF-16 code units and reduced into a fixed palette. Ordering, restarts and
//! locale never change the result.

use std::fmt;

use crate::config::PALETTE_SIZE;

/// An sRGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.is_ascii() {
            return None;
        }
        match digits.len() {
            6 => {
                let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
                let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
                let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
                Some(Self::new(r, g, b))
            }
            3 => {
                let mut channels = [0u8; 3];
                for (slot, ch) in channels.iter_mut().zip(digits.chars()) {
                    let v = ch.to_digit(16)? as u8;
                    *slot = v * 17;
                }
                Some(Self::new(channels[0], channels[1], channels[2]))
            }
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Twenty visually distinct hues, mid-saturation so borders stay readable.
pub const COMMUNITY_PALETTE: [Rgb; PALETTE_SIZE] = [
    Rgb::new(0xe6, 0x19, 0x4b), // red
    Rgb::new(0x3c, 0xb4, 0x4b), // green
    Rgb::new(0xff, 0xc1, 0x07), // amber
    Rgb::new(0x43, 0x63, 0xd8), // blue
    Rgb::new(0xf5, 0x82, 0x31), // orange
    Rgb::new(0x91, 0x1e, 0xb4), // purple
    Rgb::new(0x42, 0xd4, 0xf4), // cyan
    Rgb::new(0xf0, 0x32, 0xe6), // magenta
    Rgb::new(0xbf, 0xef, 0x45), // lime
    Rgb::new(0xfa, 0xbe, 0xd4), // pink
    Rgb::new(0x46, 0x99, 0x90), // teal
    Rgb::new(0xdc, 0xbe, 0xff), // lavender
    Rgb::new(0x9a, 0x63, 0x24), // brown
    Rgb::new(0x80, 0x00, 0x00), // maroon
    Rgb::new(0xaa, 0xff, 0xc3), // mint
    Rgb::new(0x80, 0x80, 0x00), // olive
    Rgb::new(0xff, 0xd8, 0xb1), // apricot
    Rgb::new(0x00, 0x00, 0x75), // navy
    Rgb::new(0x5c, 0x6b, 0xc0), // indigo
    Rgb::new(0x26, 0xa6, 0x9a), // sea green
];

/// Polynomial string hash over UTF-16 code units, 32-bit wraparound.
pub fn name_hash(name: &str) -> i32 {
    name.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32))
}

/// Fill color for a community name.
pub fn color_for(name: &str) -> Rgb {
    let index = name_hash(name).unsigned_abs() as usize % PALETTE_SIZE;
    COMMUNITY_PALETTE[index]
}

/// Scale every channel toward zero by `darken` (clamped to `0..=1`).
/// `darken == 0` returns the input unchanged.
pub fn border_for(color: Rgb, darken: f32) -> Rgb {
    let keep = 1.0 - darken.clamp(0.0, 1.0);
    let scale = |c: u8| (c as f32 * keep).round().clamp(0.0, 255.0) as u8;
    Rgb::new(scale(color.r), scale(color.g), scale(color.b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_same_name_same_color() {
        for name in ["Arcadia", "Paradise Valley", "Ahwatukee Foothills", ""] {
            assert_eq!(color_for(name), color_for(&name.to_string()));
        }
    }

    #[test]
    fn test_hash_matches_known_values() {
        // Fixed points of the 31-polynomial; these must never drift between builds.
        assert_eq!(name_hash(""), 0);
        assert_eq!(name_hash("a"), 97);
        assert_eq!(name_hash("ab"), 97 * 31 + 98);
    }

    #[test]
    fn test_hash_wraps_instead_of_overflowing() {
        let long = "Scottsdale Ranch Estates at McCormick".repeat(8);
        let _ = color_for(&long);
    }

    #[test]
    fn test_large_sample_is_deterministic_and_spread() {
        let names: Vec<String> = (0..500).map(|i| format!("Community {i}")).collect();
        let first: Vec<Rgb> = names.iter().map(|n| color_for(n)).collect();
        let second: Vec<Rgb> = names.iter().rev().map(|n| color_for(n)).collect();
        let second: Vec<Rgb> = second.into_iter().rev().collect();
        assert_eq!(first, second);

        let distinct: HashSet<Rgb> = first.into_iter().collect();
        assert!(
            distinct.len() > PALETTE_SIZE / 2,
            "500 names should touch most of the palette, got {}",
            distinct.len()
        );
    }

    #[test]
    fn test_palette_entries_distinct() {
        let distinct: HashSet<Rgb> = COMMUNITY_PALETTE.iter().copied().collect();
        assert_eq!(distinct.len(), PALETTE_SIZE);
    }

    #[test]
    fn test_border_zero_darken_is_identity() {
        let c = Rgb::new(200, 100, 50);
        assert_eq!(border_for(c, 0.0), c);
    }

    #[test]
    fn test_border_darkens_each_channel() {
        let c = Rgb::new(200, 100, 40);
        assert_eq!(border_for(c, 0.35), Rgb::new(130, 65, 26));
        assert_eq!(border_for(c, 1.0), Rgb::new(0, 0, 0));
    }

    #[test]
    fn test_hex_round_trip_and_short_form() {
        assert_eq!(Rgb::from_hex("#e6194b"), Some(Rgb::new(0xe6, 0x19, 0x4b)));
        assert_eq!(Rgb::from_hex("fff"), Some(Rgb::new(255, 255, 255)));
        assert_eq!(Rgb::new(1, 2, 3).to_hex(), "#010203");
        assert_eq!(Rgb::from_hex("#12345"), None);
    }
}
