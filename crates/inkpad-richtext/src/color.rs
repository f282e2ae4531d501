//! Packed ARGB color values as used by the `[color:#AARRGGBB]` markup tags.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A packed `0xAARRGGBB` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0xFF00_0000);

    /// Parses a `#AARRGGBB` hex string.
    ///
    /// Returns `None` on anything else; callers in the decoder degrade to
    /// [`Color::BLACK`] rather than failing the parse.
    pub fn parse(hex: &str) -> Option<Color> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Color)
    }

    /// Serializes back to the uppercase `#AARRGGBB` form the markup stores.
    pub fn to_hex(self) -> String {
        format!("#{:08X}", self.0)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
