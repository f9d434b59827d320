//! Color model: RGB value type, HSV views, palette lookup, blending and the
//! temperature heat-map.
//!
//! Temperature mapping (clamped to 0..=100 °C):
//!   0   → blue   (0, 0, 255)
//!   50  → yellow (255, 255, 0)
//!   100 → red    (255, 0, 0)

use serde::{Deserialize, Serialize};

/// An RGB color. Channels are `u8`, so every value is within [0, 255] by
/// construction; wider inputs go through [`Color::clamped`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawColor")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Wire shape of a color as found in profile documents. Channels are read
/// as plain integers and clamped, missing channels read as 0.
#[derive(Deserialize)]
struct RawColor {
    #[serde(default)]
    r: i64,
    #[serde(default)]
    g: i64,
    #[serde(default)]
    b: i64,
}

impl From<RawColor> for Color {
    fn from(raw: RawColor) -> Self {
        Color::clamped(raw.r, raw.g, raw.b)
    }
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);
    pub const RED: Color = Color::new(255, 0, 0);
    pub const BLUE: Color = Color::new(0, 0, 255);
    pub const CYAN: Color = Color::new(0, 255, 255);
    pub const YELLOW: Color = Color::new(255, 255, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from arbitrary integers, clamping each channel to [0, 255].
    pub fn clamped(r: i64, g: i64, b: i64) -> Self {
        let c = |v: i64| v.clamp(0, 255) as u8;
        Self::new(c(r), c(g), c(b))
    }

    /// Build a color from hue (degrees, wrapped into 0..360), saturation and
    /// value (both 0..=255).
    pub fn from_hsv(hue: u16, saturation: u8, value: u8) -> Self {
        let h = f64::from(hue % 360);
        let s = f64::from(saturation) / 255.0;
        let v = f64::from(value) / 255.0;

        let chroma = v * s;
        let x = chroma * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let m = v - chroma;

        let (r, g, b) = match (h / 60.0) as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };

        let to_channel = |c: f64| ((c + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Self::new(to_channel(r), to_channel(g), to_channel(b))
    }

    /// HSV view: (hue 0..360, saturation 0..=255, value 0..=255).
    /// Achromatic colors report hue 0.
    pub fn to_hsv(self) -> (u16, u8, u8) {
        let r = f64::from(self.r);
        let g = f64::from(self.g);
        let b = f64::from(self.b);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let saturation = if max == 0.0 { 0.0 } else { delta * 255.0 / max };

        let hue = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * (((g - b) / delta) % 6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        let hue = if hue < 0.0 { hue + 360.0 } else { hue };

        ((hue.round() as u16) % 360, saturation.round() as u8, max as u8)
    }

    pub fn hue(self) -> u16 {
        self.to_hsv().0
    }

    pub fn saturation(self) -> u8 {
        self.to_hsv().1
    }

    pub fn value(self) -> u8 {
        self.to_hsv().2
    }

    /// Lowercase `#rrggbb` form.
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Parse `#rrggbb` (the leading `#` is optional).
    pub fn parse_hex(s: &str) -> Option<Self> {
        let digits = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Palette lookup. Case-sensitive; unknown names yield white.
    pub fn from_name(name: &str) -> Self {
        Self::lookup(name).unwrap_or(Color::WHITE)
    }

    /// Palette lookup without the white fallback.
    pub fn lookup(name: &str) -> Option<Self> {
        PALETTE
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| *c)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.hex())
    }
}

/// Named colors offered to the user.
const PALETTE: &[(&str, Color)] = &[
    ("Red", Color::new(255, 0, 0)),
    ("Green", Color::new(0, 255, 0)),
    ("Blue", Color::new(0, 0, 255)),
    ("Yellow", Color::new(255, 255, 0)),
    ("Cyan", Color::new(0, 255, 255)),
    ("Magenta", Color::new(255, 0, 255)),
    ("White", Color::new(255, 255, 255)),
    ("Black", Color::new(0, 0, 0)),
    ("Orange", Color::new(255, 165, 0)),
    ("Purple", Color::new(128, 0, 128)),
    ("Pink", Color::new(255, 192, 203)),
    ("Turquoise", Color::new(64, 224, 208)),
    ("Brown", Color::new(165, 42, 42)),
    ("Gray", Color::new(128, 128, 128)),
];

/// Names of every palette entry, in palette order.
pub fn available_color_names() -> Vec<&'static str> {
    PALETTE.iter().map(|(n, _)| *n).collect()
}

/// Linear per-channel blend. `ratio <= 0` returns `from` and `ratio >= 1`
/// returns `to` exactly; in between each channel is rounded to nearest.
pub fn interpolate(from: Color, to: Color, ratio: f64) -> Color {
    if ratio <= 0.0 {
        return from;
    }
    if ratio >= 1.0 {
        return to;
    }
    let mix = |a: u8, b: u8| {
        (f64::from(a) * (1.0 - ratio) + f64::from(b) * ratio).round() as i64
    };
    Color::clamped(mix(from.r, to.r), mix(from.g, to.g), mix(from.b, to.b))
}

/// Heat-map color for a temperature in °C.
pub fn from_temperature(temperature: i32) -> Color {
    let t = temperature.clamp(0, 100);
    if t < 50 {
        interpolate(Color::BLUE, Color::YELLOW, f64::from(t) / 50.0)
    } else {
        interpolate(Color::YELLOW, Color::RED, f64::from(t - 50) / 50.0)
    }
}
