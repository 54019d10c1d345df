//! Hex colour parsing and sRGB transfer functions
//!
//! Scene colours are authored as `#rrggbb` sRGB strings. Lighting happens in
//! linear space, so every colour is converted before it reaches a uniform.

use std::str::FromStr;

use crate::error::{HauntedError, Result};

/// An sRGB-encoded colour with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Srgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Srgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rrggbb` or `rrggbb`
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(HauntedError::Color(hex.to_string()));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|_| HauntedError::Color(hex.to_string()))
        };

        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Linear RGB, the space all lighting is computed in
    pub fn to_linear(self) -> [f32; 3] {
        [
            srgb_to_linear(self.r),
            srgb_to_linear(self.g),
            srgb_to_linear(self.b),
        ]
    }

    /// Linear colour scaled by an intensity, as packed into light uniforms
    pub fn to_linear_scaled(self, intensity: f32) -> [f32; 3] {
        let [r, g, b] = self.to_linear();
        [r * intensity, g * intensity, b * intensity]
    }

    /// Clear colour for a render pass targeting an sRGB surface
    pub fn to_wgpu(self) -> wgpu::Color {
        let [r, g, b] = self.to_linear();
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        }
    }
}

impl FromStr for Srgb {
    type Err = HauntedError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

/// Shorthand for [`Srgb::from_hex`]
pub fn parse_hex(hex: &str) -> Result<Srgb> {
    Srgb::from_hex(hex)
}

pub fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.0773993808
    } else {
        (c * 0.9478672986 + 0.0521327014).powf(2.4)
    }
}

pub fn linear_to_srgb(c: f32) -> f32 {
    if c < 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(0.41666) - 0.055
    }
}
