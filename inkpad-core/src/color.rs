//! Straight (non-premultiplied) 8-bit RGBA color, persisted as a `#rrggbbaa` hex string.

#[repr(C)]
#[derive(Copy, Clone, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}
impl Color {
    pub const TRANSPARENT: Self = Self::from_rgba8(0, 0, 0, 0);
    pub const BLACK: Self = Self::from_rgba8(0, 0, 0, 255);
    pub const WHITE: Self = Self::from_rgba8(255, 255, 255, 255);
    #[must_use]
    pub const fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
    #[must_use]
    pub fn to_array(self) -> [u8; 4] {
        bytemuck::cast(self)
    }
    #[must_use]
    pub fn is_transparent(self) -> bool {
        self.a == 0
    }
    /// Parse `#rgb`, `#rrggbb`, or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Result<Self, ColorParseError> {
        let digits = hex.strip_prefix('#').ok_or(ColorParseError::MissingHash)?;
        let nibble = |c: u8| -> Result<u8, ColorParseError> {
            (c as char)
                .to_digit(16)
                .map(|d| d as u8)
                .ok_or(ColorParseError::BadDigit)
        };
        let bytes = digits.as_bytes();
        match bytes.len() {
            3 => {
                let mut rgb = [0u8; 3];
                for (out, &c) in rgb.iter_mut().zip(bytes) {
                    let n = nibble(c)?;
                    *out = n << 4 | n;
                }
                Ok(Self::from_rgba8(rgb[0], rgb[1], rgb[2], 255))
            }
            6 | 8 => {
                let mut rgba = [255u8; 4];
                for (out, pair) in rgba.iter_mut().zip(bytes.chunks_exact(2)) {
                    *out = nibble(pair[0])? << 4 | nibble(pair[1])?;
                }
                Ok(Self::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]))
            }
            _ => Err(ColorParseError::BadLength),
        }
    }
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}
impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}
impl std::fmt::Debug for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("color must start with '#'")]
    MissingHash,
    #[error("color must have 3, 6, or 8 hex digits")]
    BadLength,
    #[error("invalid hex digit")]
    BadDigit,
}

impl serde::Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
impl<'de> serde::Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::{Color, ColorParseError};
    #[test]
    fn parse_forms() {
        assert_eq!(Color::from_hex("#fff"), Ok(Color::WHITE));
        assert_eq!(Color::from_hex("#000000"), Ok(Color::BLACK));
        assert_eq!(
            Color::from_hex("#11223344"),
            Ok(Color::from_rgba8(0x11, 0x22, 0x33, 0x44))
        );
        assert_eq!(Color::from_hex("fff"), Err(ColorParseError::MissingHash));
        assert_eq!(Color::from_hex("#ffff"), Err(ColorParseError::BadLength));
        assert_eq!(Color::from_hex("#ggg"), Err(ColorParseError::BadDigit));
    }
    #[test]
    fn hex_is_lossless() {
        let color = Color::from_rgba8(1, 128, 254, 7);
        assert_eq!(Color::from_hex(&color.to_hex()), Ok(color));
    }
}
