// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Color types and conversion between hex input, the device's native
//! 16-bit HSBK encoding, and the outward status payload.
//!
//! These are pure functions with no shared state. Malformed hex input
//! fails with [`ParseError::InvalidHexColor`]; the caller logs and drops
//! the command without side effects.

use std::fmt;

use crate::error::ParseError;

/// Color in the device's native 16-bit HSBK encoding.
///
/// Hue covers the full circle in 65536 steps, saturation and brightness
/// are 16-bit fractions, and kelvin is the color temperature carried
/// through unchanged.
///
/// # Examples
///
/// ```
/// use lifxbridge::types::DeviceColor;
///
/// let red = DeviceColor::from_hex("#FF0000", 0).unwrap();
/// assert_eq!(red.hue, 0);
/// assert_eq!(red.saturation, u16::MAX);
/// assert_eq!(red.brightness, u16::MAX);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DeviceColor {
    /// Hue scaled so that 65536 steps cover 360 degrees.
    pub hue: u16,
    /// Saturation as a 16-bit fraction.
    pub saturation: u16,
    /// Brightness as a 16-bit fraction.
    pub brightness: u16,
    /// Color temperature in kelvin, passed through unchanged.
    pub kelvin: u16,
}

impl DeviceColor {
    /// Parses a hex color string into the native encoding.
    ///
    /// Accepts `#RRGGBB`, `RRGGBB`, `#RGB` and `RGB`. The hue is scaled
    /// to the device's 16-bit range (`round(hue / 360 * 65536) mod 65536`),
    /// saturation and value to 16-bit fractions. The requested kelvin is
    /// applied unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidHexColor`] if the string is malformed.
    pub fn from_hex(hex: &str, kelvin: u16) -> Result<Self, ParseError> {
        let (r, g, b) = parse_hex_rgb(hex)?;
        let (hue_deg, sat_frac, val_frac) = rgb_to_hsv(r, g, b);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let hue = ((hue_deg / 360.0 * 65536.0).round() as u32 % 65536) as u16;

        Ok(Self {
            hue,
            saturation: scale_fraction(sat_frac),
            brightness: scale_fraction(val_frac),
            kelvin,
        })
    }

    /// Converts an integer percentage (0-100) to a 16-bit fraction.
    ///
    /// Values above 100 saturate at the maximum.
    #[must_use]
    pub fn fraction_from_percent(percent: u16) -> u16 {
        scale_fraction(f64::from(percent.min(100)) / 100.0)
    }

    /// Returns a copy with the kelvin channel replaced.
    #[must_use]
    pub const fn with_kelvin(mut self, kelvin: u16) -> Self {
        self.kelvin = kelvin;
        self
    }
}

impl fmt::Display for DeviceColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsbk({}, {}, {}, {}K)",
            self.hue, self.saturation, self.brightness, self.kelvin
        )
    }
}

/// Outward color representation published on state changes.
///
/// Hue and saturation are downscaled to 8 bits, brightness to an integer
/// percentage, and kelvin passes through unchanged.
///
/// # Examples
///
/// ```
/// use lifxbridge::types::{ColorPayload, DeviceColor};
///
/// let color = DeviceColor::from_hex("#FF0000", 3500).unwrap();
/// let payload = ColorPayload::from(&color);
/// assert_eq!(payload.brightness, 100);
/// assert_eq!(payload.kelvin, 3500);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ColorPayload {
    /// Hue downscaled to 8 bits.
    pub hue: u8,
    /// Saturation downscaled to 8 bits.
    pub saturation: u8,
    /// Brightness as an integer percentage (0-100).
    pub brightness: u8,
    /// Color temperature in kelvin.
    pub kelvin: u16,
}

impl From<&DeviceColor> for ColorPayload {
    fn from(color: &DeviceColor) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let hue = (color.hue >> 8) as u8;
        #[allow(clippy::cast_possible_truncation)]
        let saturation = (color.saturation >> 8) as u8;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let brightness = (f64::from(color.brightness) / f64::from(u16::MAX) * 100.0).round() as u8;

        Self {
            hue,
            saturation,
            brightness,
            kelvin: color.kelvin,
        }
    }
}

/// Scales a fraction in `[0, 1]` to the 16-bit range.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale_fraction(fraction: f64) -> u16 {
    (fraction.clamp(0.0, 1.0) * f64::from(u16::MAX)).round() as u16
}

/// Parses `#RRGGBB`, `RRGGBB`, `#RGB` or `RGB` into 8-bit channels.
fn parse_hex_rgb(hex: &str) -> Result<(u8, u8, u8), ParseError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    let invalid = || ParseError::InvalidHexColor(hex.to_string());

    match digits.len() {
        3 => {
            let mut chars = digits.chars();
            let mut channel = || {
                chars
                    .next()
                    .and_then(|c| c.to_digit(16))
                    .map(|v| {
                        #[allow(clippy::cast_possible_truncation)]
                        let v = v as u8;
                        v * 17 // expand 0-F to 0-255
                    })
                    .ok_or_else(invalid)
            };
            Ok((channel()?, channel()?, channel()?))
        }
        6 => {
            let pair = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
            };
            Ok((pair(0..2)?, pair(2..4)?, pair(4..6)?))
        }
        _ => Err(invalid()),
    }
}

/// Converts 8-bit RGB to (hue degrees, saturation fraction, value fraction).
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = f64::from(r) / 255.0;
    let g = f64::from(g) / 255.0;
    let b = f64::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    (hue, saturation, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hex_red() {
        let color = DeviceColor::from_hex("#FF0000", 0).unwrap();
        assert_eq!(color.hue, 0);
        assert_eq!(color.saturation, u16::MAX);
        assert_eq!(color.brightness, u16::MAX);
        assert_eq!(color.kelvin, 0);
    }

    #[test]
    fn from_hex_green_hue() {
        let color = DeviceColor::from_hex("00FF00", 0).unwrap();
        // 120 degrees scaled to the 16-bit circle
        let expected = (120.0_f64 / 360.0 * 65536.0).round() as u16;
        assert_eq!(color.hue, expected);
    }

    #[test]
    fn from_hex_short_form() {
        let long = DeviceColor::from_hex("#FF6600", 0).unwrap();
        let short = DeviceColor::from_hex("#F60", 0).unwrap();
        assert_eq!(long, short);
    }

    #[test]
    fn from_hex_applies_kelvin() {
        let color = DeviceColor::from_hex("#FFFFFF", 3500).unwrap();
        assert_eq!(color.kelvin, 3500);
        assert_eq!(color.saturation, 0);
    }

    #[test]
    fn from_hex_rejects_malformed() {
        assert!(DeviceColor::from_hex("#12345", 0).is_err());
        assert!(DeviceColor::from_hex("red", 0).is_err());
        assert!(DeviceColor::from_hex("#GG0000", 0).is_err());
        assert!(DeviceColor::from_hex("", 0).is_err());
    }

    #[test]
    fn fraction_from_percent_bounds() {
        assert_eq!(DeviceColor::fraction_from_percent(0), 0);
        assert_eq!(DeviceColor::fraction_from_percent(100), u16::MAX);
        // over-range saturates
        assert_eq!(DeviceColor::fraction_from_percent(250), u16::MAX);
    }

    #[test]
    fn fraction_from_percent_midpoint() {
        let half = DeviceColor::fraction_from_percent(50);
        assert_eq!(half, 32768); // round(0.5 * 65535)
    }

    #[test]
    fn payload_downscales() {
        let color = DeviceColor {
            hue: 0xABCD,
            saturation: 0x1234,
            brightness: u16::MAX,
            kelvin: 2700,
        };
        let payload = ColorPayload::from(&color);
        assert_eq!(payload.hue, 0xAB);
        assert_eq!(payload.saturation, 0x12);
        assert_eq!(payload.brightness, 100);
        assert_eq!(payload.kelvin, 2700);
    }

    #[test]
    fn red_round_trip_within_one_degree() {
        let color = DeviceColor::from_hex("#FF0000", 0).unwrap();
        let payload = ColorPayload::from(&color);

        // 8-bit hue back to degrees; red should land within 1 degree of 0
        let degrees = f64::from(payload.hue) / 256.0 * 360.0;
        assert!(degrees < 1.0, "hue drifted to {degrees}");
        assert_eq!(payload.saturation, 0xFF);
        assert_eq!(payload.brightness, 100);
    }

    #[test]
    fn optional_color_equality() {
        let a = DeviceColor::from_hex("#336699", 3000).unwrap();
        let b = DeviceColor::from_hex("#336699", 3000).unwrap();

        assert_eq!(None::<DeviceColor>, None::<DeviceColor>);
        assert_ne!(Some(a), None);
        assert_eq!(Some(a), Some(b));
        assert_ne!(Some(a), Some(b.with_kelvin(4000)));
    }

    #[test]
    fn payload_serializes_as_object() {
        let payload = ColorPayload {
            hue: 10,
            saturation: 255,
            brightness: 80,
            kelvin: 3500,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"hue": 10, "saturation": 255, "brightness": 80, "kelvin": 3500})
        );
    }
}
