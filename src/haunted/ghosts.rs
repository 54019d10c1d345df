//! Ghost flight paths
//!
//! Each ghost is a coloured point light that circles the house. The paths are
//! closed-form functions of elapsed time, so a frame can be evaluated at any
//! instant without integrating state.

use cgmath::Vector3;

use crate::color::Srgb;

pub const GHOST_INTENSITY: f32 = 6.0;
pub const GHOST_DISTANCE: f32 = 3.0;

/// The three ghosts of the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ghost {
    One,
    Two,
    Three,
}

impl Ghost {
    pub const ALL: [Ghost; 3] = [Ghost::One, Ghost::Two, Ghost::Three];

    /// Name of the point light that carries this ghost
    pub fn light_name(self) -> &'static str {
        match self {
            Ghost::One => "ghost1",
            Ghost::Two => "ghost2",
            Ghost::Three => "ghost3",
        }
    }

    pub fn color(self) -> Srgb {
        match self {
            Ghost::One => Srgb::new(1.0, 0.0, 1.0),
            Ghost::Two => Srgb::new(0.0, 1.0, 1.0),
            Ghost::Three => Srgb::new(1.0, 1.0, 0.0),
        }
    }

    /// Position after `t` seconds
    pub fn position(self, t: f32) -> Vector3<f32> {
        match self {
            Ghost::One => {
                let angle = t * 0.5;
                Vector3::new(angle.cos() * 4.0, (t * 3.0).sin(), angle.sin() * 4.0)
            }
            Ghost::Two => {
                let angle = -t * 0.3;
                Vector3::new(
                    angle.cos() * 5.0,
                    (t * 4.0).sin() + (t * 2.5).sin(),
                    angle.sin() * 5.0,
                )
            }
            Ghost::Three => {
                let angle = -t * 0.18;
                Vector3::new(
                    angle.cos() * (7.0 + (t * 0.32).sin()),
                    (t * 3.0).sin() + (t * 2.0).sin(),
                    angle.sin() * (7.0 + (t * 0.5).sin()),
                )
            }
        }
    }
}
