use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::foundation::error::{ReelError, ReelResult};

/// Pixel dimensions of a source image or of the output canvas.
///
/// Both sides are strictly positive. Ordering is by width, then height, which keeps
/// tallies keyed by resolution deterministic.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    width: u32,
    height: u32,
}

impl Resolution {
    pub const HD_720: Self = Self {
        width: 1280,
        height: 720,
    };

    pub fn new(width: u32, height: u32) -> ReelResult<Self> {
        if width == 0 || height == 0 {
            return Err(ReelError::config(format!(
                "resolution must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    pub fn width(self) -> u32 {
        self.width
    }

    pub fn height(self) -> u32 {
        self.height
    }

    pub fn ratio(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn is_even(self) -> bool {
        self.width.is_multiple_of(2) && self.height.is_multiple_of(2)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| ReelError::config(format!("resolution \"{s}\" must look like WxH")))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|_| ReelError::config(format!("invalid resolution component \"{v}\"")))
        };
        Self::new(parse(w)?, parse(h)?)
    }
}

impl TryFrom<String> for Resolution {
    type Error = ReelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Resolution> for String {
    fn from(r: Resolution) -> Self {
        r.to_string()
    }
}

/// Opaque 8-bit sRGB color, written as `#RRGGBB` in configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, 255])
    }

    /// Rec. 601 luma, the same weights `image` uses for `to_luma8`.
    pub fn luma(self) -> u8 {
        let y = 299 * u32::from(self.r) + 587 * u32::from(self.g) + 114 * u32::from(self.b);
        ((y + 500) / 1000) as u8
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb8 {
    type Err = ReelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        let t = t.strip_prefix('#').unwrap_or(t);
        if t.len() != 6 || !t.is_ascii() {
            return Err(ReelError::config(format!(
                "color \"{s}\" must be #RRGGBB (case-insensitive)"
            )));
        }
        let byte = |pair: &str| {
            u8::from_str_radix(pair, 16)
                .map_err(|_| ReelError::config(format!("invalid hex byte \"{pair}\"")))
        };
        Ok(Self::new(byte(&t[0..2])?, byte(&t[2..4])?, byte(&t[4..6])?))
    }
}

impl TryFrom<String> for Rgb8 {
    type Error = ReelError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Rgb8> for String {
    fn from(c: Rgb8) -> Self {
        c.to_hex()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
