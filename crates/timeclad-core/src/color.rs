use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An sRGB color as written in records and config files (`#rgb`, `#rrggbb` or `none`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    rgb: Option<[u8; 3]>,
}

impl Color {
    pub const NONE: Color = Color { rgb: None };

    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            rgb: Some([red, green, blue]),
        }
    }

    pub fn is_none(&self) -> bool {
        self.rgb.is_none()
    }

    pub fn components(&self) -> Option<[u8; 3]> {
        self.rgb
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::rgb(0, 0, 0)
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        if raw.eq_ignore_ascii_case("none") {
            return Ok(Self::NONE);
        }
        let invalid = || Error::InvalidColor {
            value: s.to_string(),
        };
        let hex = raw.strip_prefix('#').ok_or_else(invalid)?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
        match hex.len() {
            3 => {
                let mut out = [0u8; 3];
                for (slot, i) in out.iter_mut().zip(0..3) {
                    let v = channel(&hex[i..=i])?;
                    *slot = (v << 4) | v;
                }
                Ok(Self { rgb: Some(out) })
            }
            6 => Ok(Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rgb {
            None => f.write_str("none"),
            Some([r, g, b]) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}
