use crate::core::Rgba8Premul;
use serde::{Deserialize, Serialize};

/// Straight-alpha RGBA8 color as descriptors carry it.
///
/// Deserializes from `#RRGGBB` / `#RRGGBBAA` hex strings (the form the
/// original template data uses), from an `{r,g,b,a}` object, or from a
/// `[r,g,b]` / `[r,g,b,a]` array with 0-255 channels. Serializes back as a
/// hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_premul(self) -> Rgba8Premul {
        Rgba8Premul::from_straight_rgba(self.r, self.g, self.b, self.a)
    }

    pub fn to_hex_string(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl std::str::FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex(s)
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex_string())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            RgbaObj {
                r: u8,
                g: u8,
                b: u8,
                #[serde(default = "opaque")]
                a: u8,
            },
            Arr(Vec<u8>),
        }

        fn opaque() -> u8 {
            255
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => parse_hex(&s).map_err(serde::de::Error::custom),
            Repr::RgbaObj { r, g, b, a } => Ok(Self::rgba(r, g, b, a)),
            Repr::Arr(v) => {
                if v.len() == 3 {
                    Ok(Self::rgb(v[0], v[1], v[2]))
                } else if v.len() == 4 {
                    Ok(Self::rgba(v[0], v[1], v[2], v[3]))
                } else {
                    Err(serde::de::Error::custom(
                        "rgba array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                    ))
                }
            }
        }
    }
}

fn parse_hex(s: &str) -> Result<Color, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);
    // Length is in bytes; slicing below needs every byte to be one char.
    if !s.is_ascii() {
        return Err("hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned());
    }

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    match s.len() {
        6 => Ok(Color::rgb(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
        )),
        8 => Ok(Color::rgba(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            hex_byte(&s[6..8])?,
        )),
        _ => Err("hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_hex_rgb_and_rgba() {
        let c: Color = serde_json::from_value(json!("#ff0000")).unwrap();
        assert_eq!(c, Color::rgb(255, 0, 0));

        let c: Color = serde_json::from_value(json!("#0000FF80")).unwrap();
        assert_eq!(c, Color::rgba(0, 0, 255, 128));

        let c: Color = serde_json::from_value(json!("0369A1")).unwrap();
        assert_eq!(c, Color::rgb(0x03, 0x69, 0xA1));
    }

    #[test]
    fn parses_rgba_object_and_array() {
        let c: Color = serde_json::from_value(json!({"r": 10, "g": 20, "b": 30})).unwrap();
        assert_eq!(c, Color::rgb(10, 20, 30));

        let c: Color = serde_json::from_value(json!([10, 20, 30, 40])).unwrap();
        assert_eq!(c, Color::rgba(10, 20, 30, 40));
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!(serde_json::from_value::<Color>(json!("#12345")).is_err());
        assert!(serde_json::from_value::<Color>(json!("#gg0000")).is_err());
    }

    #[test]
    fn rejects_non_ascii_hex_without_panicking() {
        // "€€" is six bytes; byte slicing must not split the multibyte chars.
        assert!(serde_json::from_value::<Color>(json!("€€")).is_err());
        assert!("€€".parse::<Color>().is_err());
        assert!("#€€".parse::<Color>().is_err());
    }

    #[test]
    fn serializes_as_hex() {
        assert_eq!(
            serde_json::to_value(Color::rgb(255, 255, 255)).unwrap(),
            json!("#ffffff")
        );
        assert_eq!(
            serde_json::to_value(Color::rgba(0, 0, 0, 128)).unwrap(),
            json!("#00000080")
        );
    }

    #[test]
    fn premultiplies_straight_alpha() {
        let p = Color::rgba(255, 128, 0, 128).to_premul();
        assert_eq!((p.r, p.g, p.b, p.a), (128, 64, 0, 128));
    }
}
