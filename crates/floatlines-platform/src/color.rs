use std::fmt;
use std::str::FromStr;

use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 8-bit straight-alpha RGBA color, written as a CSS hex string in config files.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseColorError {
    #[error("color `{0}` must start with '#'")]
    MissingHash(String),
    #[error("color `{0}` must have 3, 4, 6 or 8 hex digits")]
    BadLength(String),
    #[error("color `{input}` contains non-hex digit '{digit}'")]
    BadDigit { input: String, digit: char },
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Channels in `0.0..=1.0`, alpha not applied.
    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        )
    }

    /// Channels in `0.0..=1.0` with color multiplied by alpha.
    pub fn premultiplied(self) -> Vec4 {
        let v = self.to_vec4();
        Vec4::new(v.x * v.w, v.y * v.w, v.z * v.w, v.w)
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let digits = trimmed
            .strip_prefix('#')
            .ok_or_else(|| ParseColorError::MissingHash(input.to_string()))?;
        let mut nibbles = Vec::with_capacity(8);
        for digit in digits.chars() {
            let value = digit.to_digit(16).ok_or_else(|| ParseColorError::BadDigit {
                input: input.to_string(),
                digit,
            })?;
            nibbles.push(value as u8);
        }
        let channel = |hi: u8, lo: u8| hi << 4 | lo;
        match nibbles.as_slice() {
            [r, g, b] => Ok(Color::rgb(*r * 17, *g * 17, *b * 17)),
            [r, g, b, a] => Ok(Color::rgba(*r * 17, *g * 17, *b * 17, *a * 17)),
            [r1, r0, g1, g0, b1, b0] => Ok(Color::rgb(
                channel(*r1, *r0),
                channel(*g1, *g0),
                channel(*b1, *b0),
            )),
            [r1, r0, g1, g0, b1, b0, a1, a0] => Ok(Color::rgba(
                channel(*r1, *r0),
                channel(*g1, *g0),
                channel(*b1, *b0),
                channel(*a1, *a0),
            )),
            _ => Err(ParseColorError::BadLength(input.to_string())),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ParseColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("#ff0000", Color::rgb(255, 0, 0))]
    #[case("#00FF00", Color::rgb(0, 255, 0))]
    #[case("#fff", Color::rgb(255, 255, 255))]
    #[case("#0008", Color::rgba(0, 0, 0, 136))]
    #[case(" #12345678 ", Color::rgba(0x12, 0x34, 0x56, 0x78))]
    fn parses_css_hex(#[case] input: &str, #[case] expected: Color) {
        assert_eq!(input.parse::<Color>().unwrap(), expected);
    }

    #[rstest]
    #[case("ff0000")]
    #[case("#ff00")]
    #[case("#ff00000")]
    #[case("#gg0000")]
    #[case("#")]
    fn rejects_malformed(#[case] input: &str) {
        assert!(input.parse::<Color>().is_err());
    }

    #[test]
    fn hex_output_drops_opaque_alpha() {
        assert_eq!(Color::rgb(233, 69, 245).to_hex(), "#e945f5");
        assert_eq!(Color::rgba(1, 2, 3, 4).to_hex(), "#01020304");
    }

    #[test]
    fn premultiplied_scales_by_alpha() {
        let half_red = Color::rgba(255, 0, 0, 51).premultiplied();
        assert!((half_red.x - 0.2).abs() < 1e-6);
        assert!((half_red.w - 0.2).abs() < 1e-6);
        assert_eq!(half_red.y, 0.0);
    }

    #[test]
    fn serde_uses_hex_strings() {
        let colors: Vec<Color> = serde_json::from_str(r##"["#ff0000", "#00ff00"]"##).unwrap();
        assert_eq!(colors, vec![Color::rgb(255, 0, 0), Color::rgb(0, 255, 0)]);
        assert_eq!(
            serde_json::to_string(&colors[0]).unwrap(),
            r##""#ff0000""##
        );
        assert!(serde_json::from_str::<Color>(r#""red""#).is_err());
    }
}
