//! Maps free-text condition descriptions onto a small glyph vocabulary.

use serde::{Deserialize, Serialize};

/// Icon categories shown by the dashboard. Serialized as the glyph itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Icon {
    #[serde(rename = "⛈️")]
    Thunder,
    #[serde(rename = "🌩️")]
    Storm,
    #[serde(rename = "❄️")]
    Snow,
    #[serde(rename = "🌧️")]
    Rain,
    #[serde(rename = "🌦️")]
    LightRain,
    #[serde(rename = "☁️")]
    Overcast,
    #[default]
    #[serde(rename = "⛅")]
    PartlyCloudy,
    #[serde(rename = "🌫️")]
    Fog,
    #[serde(rename = "☀️")]
    Clear,
}

impl Icon {
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Thunder => "⛈️",
            Self::Storm => "🌩️",
            Self::Snow => "❄️",
            Self::Rain => "🌧️",
            Self::LightRain => "🌦️",
            Self::Overcast => "☁️",
            Self::PartlyCloudy => "⛅",
            Self::Fog => "🌫️",
            Self::Clear => "☀️",
        }
    }
}

impl std::fmt::Display for Icon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.glyph())
    }
}

/// Keyword table, checked top to bottom; the first hit wins.
///
/// Severe weather sits first so that "thundersnow" stays a thunder icon.
const RULES: &[(&[&str], Icon)] = &[
    (&["thunder"], Icon::Thunder),
    (&["storm"], Icon::Storm),
    (&["snow", "sleet", "ice"], Icon::Snow),
    (&["rain", "drizzle", "shower"], Icon::Rain),
    (&["overcast"], Icon::Overcast),
    (&["cloud"], Icon::PartlyCloudy),
    (&["fog", "mist", "haze"], Icon::Fog),
    (&["clear", "sun"], Icon::Clear),
];

/// Case-insensitive keyword classification of a condition description.
pub fn classify(text: &str) -> Icon {
    let lower = text.to_lowercase();
    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, icon)| *icon)
        .unwrap_or_default()
}

/// Description for sources that only report numbers (NASA POWER).
pub fn describe(temp_c: f64, precip_mm: f64) -> &'static str {
    if precip_mm > 2.0 {
        "Rain"
    } else if precip_mm > 0.5 {
        "Light Rain"
    } else if temp_c > 30.0 {
        "Hot"
    } else if temp_c > 25.0 {
        "Warm"
    } else if temp_c > 15.0 {
        "Mild"
    } else if temp_c > 5.0 {
        "Cool"
    } else {
        "Cold"
    }
}

/// Icon counterpart of [`describe`].
pub fn icon_for(temp_c: f64, precip_mm: f64) -> Icon {
    if precip_mm > 2.0 {
        Icon::Rain
    } else if precip_mm > 0.5 {
        Icon::LightRain
    } else if temp_c > 30.0 {
        Icon::Clear
    } else if temp_c > 20.0 {
        Icon::PartlyCloudy
    } else if temp_c > 10.0 {
        Icon::Overcast
    } else {
        Icon::Snow
    }
}
