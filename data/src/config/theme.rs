use enum_map::{Enum, EnumMap, enum_map};
use feed::Direction;
use iced_core::Color;
use palette::Srgb;
use serde::{Deserialize, Serialize};

/// What a theme color is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum)]
pub enum Role {
    Background,
    Bullish,
    Bearish,
}

impl From<Direction> for Role {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Bullish => Role::Bullish,
            Direction::Bearish => Role::Bearish,
        }
    }
}

const PRESETS: [&str; 3] = ["flowsurface", "dark", "light"];

/// Chart colors, loaded once and never changed afterwards.
///
/// In JSON a theme is either a preset name or an object of hex colors:
///
/// ```json
/// { "Background": "#181616", "Candle": { "Bullish": "#51CDA0", "Bearish": "#C0504D" } }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    preset: Option<&'static str>,
    colors: EnumMap<Role, Color>,
}

/// Object form of a custom theme
#[derive(Serialize, Deserialize)]
struct SerTheme {
    #[serde(rename = "Background")]
    background: String,
    #[serde(rename = "Candle")]
    candle: SerCandle,
}

#[derive(Serialize, Deserialize)]
struct SerCandle {
    #[serde(rename = "Bullish")]
    bullish: String,
    #[serde(rename = "Bearish")]
    bearish: String,
}

impl Default for Theme {
    fn default() -> Self {
        default_theme()
    }
}

/// Default palette (Flowsurface)
pub fn default_theme() -> Theme {
    Theme {
        preset: Some("flowsurface"),
        colors: enum_map! {
            Role::Background => Color::from_rgb8(24, 22, 22),
            Role::Bullish => Color::from_rgb8(81, 205, 160),
            Role::Bearish => Color::from_rgb8(192, 80, 77),
        },
    }
}

impl Theme {
    pub fn custom(background: Color, bullish: Color, bearish: Color) -> Self {
        Self {
            preset: None,
            colors: enum_map! {
                Role::Background => background,
                Role::Bullish => bullish,
                Role::Bearish => bearish,
            },
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        let (preset, background, bullish, bearish) = match name {
            "flowsurface" => return Some(default_theme()),
            "dark" => (
                PRESETS[1],
                Color::from_rgb8(32, 34, 37),
                Color::from_rgb8(38, 166, 154),
                Color::from_rgb8(239, 83, 80),
            ),
            "light" => (
                PRESETS[2],
                Color::from_rgb8(250, 250, 250),
                Color::from_rgb8(8, 153, 129),
                Color::from_rgb8(242, 54, 69),
            ),
            _ => return None,
        };

        Some(Self {
            preset: Some(preset),
            ..Self::custom(background, bullish, bearish)
        })
    }

    /// Preset name, `None` for a custom palette
    pub fn name(&self) -> Option<&str> {
        self.preset
    }

    pub fn color(&self, role: Role) -> Color {
        self.colors[role]
    }

    pub fn background(&self) -> Color {
        self.colors[Role::Background]
    }

    pub fn candle(&self, direction: Direction) -> Color {
        self.colors[Role::from(direction)]
    }
}

impl std::ops::Index<Role> for Theme {
    type Output = Color;

    fn index(&self, role: Role) -> &Color {
        &self.colors[role]
    }
}

impl Serialize for Theme {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if let Some(name) = self.preset {
            return name.serialize(serializer);
        }

        SerTheme {
            background: color_to_hex(self.colors[Role::Background]),
            candle: SerCandle {
                bullish: color_to_hex(self.colors[Role::Bullish]),
                bearish: color_to_hex(self.colors[Role::Bearish]),
            },
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Theme {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value =
            serde_json::Value::deserialize(deserializer).map_err(serde::de::Error::custom)?;

        if let Some(s) = value.as_str() {
            return Theme::preset(s).ok_or_else(|| {
                serde::de::Error::custom(format!(
                    "Invalid theme: {s}, expected one of {}",
                    PRESETS.join(", ")
                ))
            });
        }

        let serialized = SerTheme::deserialize(value).map_err(serde::de::Error::custom)?;

        let parse = |hex: &str| {
            hex_to_color(hex)
                .ok_or_else(|| serde::de::Error::custom(format!("Invalid hex color: {hex}")))
        };

        Ok(Theme::custom(
            parse(&serialized.background)?,
            parse(&serialized.candle.bullish)?,
            parse(&serialized.candle.bearish)?,
        ))
    }
}

/// Parses `#rrggbb` (or the short `#rgb` form) into an opaque color
pub fn hex_to_color(hex: &str) -> Option<Color> {
    if !hex.starts_with('#') {
        return None;
    }

    let rgb: Srgb<u8> = hex.parse().ok()?;

    Some(Color::from_rgb8(rgb.red, rgb.green, rgb.blue))
}

pub fn color_to_hex(color: Color) -> String {
    use std::fmt::Write;

    let mut hex = String::with_capacity(9);

    let [r, g, b, a] = color.into_rgba8();

    let _ = write!(&mut hex, "#{r:02X}{g:02X}{b:02X}");

    if a < u8::MAX {
        let _ = write!(&mut hex, "{a:02X}");
    }

    hex
}
