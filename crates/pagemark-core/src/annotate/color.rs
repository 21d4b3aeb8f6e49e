//! Colour values for ink and stamps.

use std::fmt;
use std::str::FromStr;

use crate::error::AnnotationError;

/// Straight (non-premultiplied) RGBA colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255, a: 255 };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Result<Self, AnnotationError> {
        let invalid = || AnnotationError::Color(hex.to_string());
        let digits = hex.trim().trim_start_matches('#');
        if !digits.is_ascii() {
            return Err(invalid());
        }

        let byte = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());
        match digits.len() {
            3 => {
                let mut channels = [0u8; 3];
                for (slot, i) in channels.iter_mut().zip(0..3) {
                    *slot = byte(&digits[i..i + 1])? * 17;
                }
                Ok(Self::rgb(channels[0], channels[1], channels[2]))
            }
            6 | 8 => {
                let a = if digits.len() == 8 { byte(&digits[6..8])? } else { 255 };
                Ok(Self::new(
                    byte(&digits[0..2])?,
                    byte(&digits[2..4])?,
                    byte(&digits[4..6])?,
                    a,
                ))
            }
            _ => Err(invalid()),
        }
    }

    /// Same colour with alpha scaled by `alpha` (0.0 - 1.0).
    pub fn with_alpha(self, alpha: f32) -> Self {
        let a = (self.a as f32 * alpha.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    /// Channels in 0.0 - 1.0.
    pub fn to_normalized(&self) -> (f32, f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        )
    }

    pub(crate) fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Color {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(Color::from_hex("#0ea5e9").unwrap(), Color::rgb(0x0e, 0xa5, 0xe9));
        assert_eq!(Color::from_hex("fff").unwrap(), Color::WHITE);
        assert_eq!(Color::from_hex("#11223380").unwrap(), Color::new(0x11, 0x22, 0x33, 0x80));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "#12", "#zzzzzz", "#12345", "#ééé"] {
            assert!(Color::from_hex(bad).is_err(), "{bad} should fail");
        }
    }

    #[test]
    fn test_with_alpha_and_display() {
        let c = Color::rgb(255, 0, 0).with_alpha(0.2);
        assert_eq!(c.a, 51);
        assert_eq!(c.to_string(), "#ff000033");
        assert_eq!(Color::BLACK.to_string(), "#000000");
    }
}
