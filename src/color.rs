use log::warn;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Linear RGB triple, components nominally in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Returned for any color string that isn't `#RRGGBB`.
pub const MAGENTA: Rgb = Rgb::new(1.0, 0.0, 1.0);

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub const fn splat(v: f64) -> Self {
        Self::new(v, v, v)
    }

    /// Parse `#RRGGBB` (the `#` is optional, hex digits are case-insensitive).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self::new(
            byte(0)? as f64 / 255.0,
            byte(2)? as f64 / 255.0,
            byte(4)? as f64 / 255.0,
        ))
    }

    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_rgb8();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        let q = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b)]
    }

    pub fn mix(self, other: Rgb, t: f64) -> Rgb {
        Rgb::new(
            self.r * (1.0 - t) + other.r * t,
            self.g * (1.0 - t) + other.g * t,
            self.b * (1.0 - t) + other.b * t,
        )
    }

    pub fn scale(self, k: f64) -> Rgb {
        Rgb::new(self.r * k, self.g * k, self.b * k)
    }

    pub fn offset(self, v: f64) -> Rgb {
        Rgb::new(self.r + v, self.g + v, self.b + v)
    }

    pub fn clamp01(self) -> Rgb {
        Rgb::new(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
        )
    }

    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }
}

/// Parse a hex color, falling back to magenta so a bad string never
/// stops the render.
pub fn hex_to_rgb(hex: &str) -> Rgb {
    Rgb::from_hex(hex).unwrap_or_else(|| {
        warn!("malformed color {hex:?}, using magenta");
        MAGENTA
    })
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(hex_to_rgb(&s))
    }
}

/// The four ramp control colors, darkest first.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Palette {
    pub dark: Rgb,
    pub mid: Rgb,
    pub bright: Rgb,
    pub accent: Rgb,
}

/// Piecewise-linear ramp dark -> mid -> bright -> accent.
///
/// The last segment divides by 0.34 rather than 0.33; the slope change at
/// 0.66 is intentional. `n` is expected in [0, 1].
pub fn color_ramp(n: f64, p: &Palette) -> Rgb {
    if n < 0.33 {
        p.dark.mix(p.mid, n / 0.33)
    } else if n < 0.66 {
        p.mid.mix(p.bright, (n - 0.33) / 0.33)
    } else {
        p.bright.mix(p.accent, (n - 0.66) / 0.34)
    }
}

/// Named palette, stored as the hex strings the settings surface shows.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Preset {
    pub name: &'static str,
    #[serde(rename = "colorDark")]
    pub dark: &'static str,
    #[serde(rename = "colorMid")]
    pub mid: &'static str,
    #[serde(rename = "colorBright")]
    pub bright: &'static str,
    #[serde(rename = "colorAccent")]
    pub accent: &'static str,
}

impl Preset {
    const fn new(
        name: &'static str,
        dark: &'static str,
        mid: &'static str,
        bright: &'static str,
        accent: &'static str,
    ) -> Self {
        Self { name, dark, mid, bright, accent }
    }

    pub fn palette(&self) -> Palette {
        Palette {
            dark: hex_to_rgb(self.dark),
            mid: hex_to_rgb(self.mid),
            bright: hex_to_rgb(self.bright),
            accent: hex_to_rgb(self.accent),
        }
    }

    /// Case-insensitive lookup by name.
    pub fn find(name: &str) -> Option<&'static Preset> {
        PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

pub const PRESETS: [Preset; 12] = [
    Preset::new("Neon", "#0a0515", "#581c87", "#ec4899", "#06b6d4"),
    Preset::new("Flame", "#0c0a09", "#7c2d12", "#f97316", "#fbbf24"),
    Preset::new("Ocean", "#020617", "#1e3a8a", "#3b82f6", "#67e8f9"),
    Preset::new("Gold", "#0f0c06", "#78350f", "#f59e0b", "#fef3c7"),
    Preset::new("Aurora", "#022c22", "#065f46", "#10b981", "#a78bfa"),
    Preset::new("Violet", "#1a0a1a", "#86198f", "#d946ef", "#f0abfc"),
    Preset::new("Sunset", "#1a0a0f", "#9d174d", "#fb7185", "#fcd34d"),
    Preset::new("Forest", "#0a1a0f", "#166534", "#22c55e", "#86efac"),
    Preset::new("Midnight", "#030712", "#1e1b4b", "#6366f1", "#c4b5fd"),
    Preset::new("Glacier", "#0c1929", "#155e75", "#22d3ee", "#ecfeff"),
    Preset::new("Rose", "#1a0a10", "#881337", "#f43f5e", "#fda4af"),
    Preset::new("Ember", "#1c0a05", "#9a3412", "#ea580c", "#fed7aa"),
];
