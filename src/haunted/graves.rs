//! Procedural grave placement
//!
//! Graves are scattered in an annulus around the house: a uniform angle,
//! a uniform radius inside the band, and a small random tilt so the rows
//! look neglected.

use std::f32::consts::PI;

use cgmath::Vector3;
use rand::Rng;

use crate::config::GraveConfig;

/// Height of a grave's centre above the floor
pub const GRAVE_HEIGHT: f32 = 0.3;

/// Annulus that graves are placed in
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraveBand {
    pub min_radius: f32,
    pub radius_span: f32,
}

impl GraveBand {
    pub fn new(min_radius: f32, radius_span: f32) -> Self {
        Self {
            min_radius,
            radius_span,
        }
    }

    pub fn max_radius(&self) -> f32 {
        self.min_radius + self.radius_span
    }
}

impl Default for GraveBand {
    fn default() -> Self {
        Self::new(3.0, 6.0)
    }
}

impl From<&GraveConfig> for GraveBand {
    fn from(config: &GraveConfig) -> Self {
        Self::new(config.min_radius, config.radius_span)
    }
}

/// One generated grave
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravePlacement {
    pub angle: f32,
    pub radius: f32,
    pub position: Vector3<f32>,
    pub rotation_y: f32,
    pub rotation_z: f32,
}

/// Places a single grave
///
/// Draws four uniform samples in a fixed order: angle, radius, Y tilt, Z tilt.
pub fn place_grave<R: Rng + ?Sized>(rng: &mut R, band: GraveBand, jitter: f32) -> GravePlacement {
    let angle = rng.random::<f32>() * PI * 2.0;
    let mut radius = band.min_radius + rng.random::<f32>() * band.radius_span;
    // f32 rounding can land exactly on the open upper bound
    if radius >= band.max_radius() && band.max_radius() > 0.0 {
        radius = f32::from_bits(band.max_radius().to_bits() - 1);
    }

    let position = Vector3::new(angle.sin() * radius, GRAVE_HEIGHT, angle.cos() * radius);

    let rotation_y = (rng.random::<f32>() - 0.5) * jitter;
    let rotation_z = (rng.random::<f32>() - 0.5) * jitter;

    GravePlacement {
        angle,
        radius,
        position,
        rotation_y,
        rotation_z,
    }
}

pub fn generate_graves<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    band: GraveBand,
    jitter: f32,
) -> Vec<GravePlacement> {
    (0..count).map(|_| place_grave(rng, band, jitter)).collect()
}
