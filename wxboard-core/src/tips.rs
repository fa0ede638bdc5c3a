//! One-line advice shown next to the current conditions.

use crate::model::CurrentConditions;

/// m/s
const WINDY: f64 = 12.0;

pub fn weather_tip(current: Option<&CurrentConditions>) -> &'static str {
    let Some(current) = current else {
        return "Enjoy your day!";
    };

    let t = current.temperature;
    let desc = current.description.to_lowercase();
    let has = |word: &str| desc.contains(word);

    if has("thunder") || has("storm") {
        return "⚡ Stormy: stay indoors and keep devices charged.";
    }
    if has("hail") {
        return "🧊 Hail possible: protect your car and watch the skies.";
    }
    if has("snow") {
        return if t <= -5.0 {
            "❄️ Deep freeze: bundle up heavy."
        } else {
            "❄️ Snowy: layer up and tread carefully."
        };
    }
    if has("sleet") {
        return "🌨️ Sleet: extra slippery underfoot.";
    }
    if has("fog") || has("mist") || has("haze") {
        return "🌫️ Low visibility: drive slow and keep lights on.";
    }

    let precip = current.precipitation;
    if has("rain") || has("drizzle") || precip > 0.2 {
        return if precip > 5.0 {
            "🌧️ Heavy rain: carry an umbrella and wear waterproofs."
        } else if precip > 1.0 {
            "🌦️ Showers likely: umbrella recommended."
        } else {
            "☔ Light drizzle: pack a compact umbrella."
        };
    }

    if current.wind_speed >= WINDY {
        return "💨 Windy: secure loose items and hold onto your hat!";
    }

    let clearish = has("clear") || has("sun");
    match t {
        t if t >= 40.0 => "🔥 Extreme heat: limit sun and hydrate nonstop.",
        t if t >= 35.0 => "🥵 Very hot: seek shade, wear SPF, sip water often.",
        t if t >= 29.0 && clearish => "😎 Sunny and warm: light layers and sunscreen.",
        t if t >= 29.0 => "😎 Warm: stay cool and hydrated.",
        t if t >= 24.0 && clearish => "🌞 Pleasant and bright: great day for a stroll.",
        t if t >= 24.0 => "🙂 Mild and comfy: enjoy your day.",
        t if t >= 17.0 && clearish => "🌤️ Pleasant: light jacket optional.",
        t if t >= 17.0 => "🌥️ Mild: carry a light layer just in case.",
        t if t >= 11.0 && clearish => "🌤️ Cool sunshine: grab a sweater.",
        t if t >= 11.0 => "☁️ Cool: wear a light jacket.",
        t if t >= 6.0 && clearish => "🌤️ Bright but chilly: layer up.",
        t if t >= 6.0 => "🌥️ Chilly: jacket recommended.",
        t if t >= 1.0 => "🧥 Cold: coat, hat, and warm layers advised.",
        t if t >= -9.0 => "🥶 Very cold: bundle up well.",
        _ => "🧊 Bitter cold: limit time outdoors and stay warm.",
    }
}
