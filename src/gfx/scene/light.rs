//! Lights, shadow settings and fog
//!
//! Colours are stored as authored (sRGB) and converted when packed into the
//! global uniform. Intensities use physical units: point lights fall off with
//! the inverse square of distance and reach zero at `distance`.

use cgmath::{perspective, Deg, InnerSpace, Matrix4, Point3, Vector3};

use crate::color::Srgb;
use crate::gfx::camera::orbit_camera::OPENGL_TO_WGPU_MATRIX;

use super::scene::GroupId;

/// Shadow map parameters for a single light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    pub map_size: u32,
    pub near: f32,
    pub far: f32,
}

impl ShadowSettings {
    pub const DIRECTIONAL: ShadowSettings = ShadowSettings {
        map_size: 512,
        near: 0.5,
        far: 500.0,
    };

    pub const POINT: ShadowSettings = ShadowSettings {
        map_size: 512,
        near: 0.5,
        far: 500.0,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Srgb,
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: Srgb::new(1.0, 1.0, 1.0),
            intensity: 0.0,
        }
    }
}

/// Infinitely distant light shining from `position` towards `target`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Srgb,
    pub intensity: f32,
    pub position: Vector3<f32>,
    pub target: Vector3<f32>,
    pub cast_shadow: bool,
    pub shadow: ShadowSettings,
    /// Half-width of the orthographic shadow frustum
    pub shadow_extent: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: Srgb::new(1.0, 1.0, 1.0),
            intensity: 0.0,
            position: Vector3::new(0.0, 1.0, 0.0),
            target: Vector3::new(0.0, 0.0, 0.0),
            cast_shadow: false,
            shadow: ShadowSettings::DIRECTIONAL,
            shadow_extent: 5.0,
        }
    }
}

impl DirectionalLight {
    /// Unit vector from the surface towards the light
    pub fn direction(&self) -> Vector3<f32> {
        let dir = self.position - self.target;
        if dir.magnitude2() > 0.0 {
            dir.normalize()
        } else {
            Vector3::unit_y()
        }
    }

    pub fn shadow_view_proj(&self) -> Matrix4<f32> {
        let eye = Point3::new(self.position.x, self.position.y, self.position.z);
        let target = Point3::new(self.target.x, self.target.y, self.target.z);
        let up = if self.direction().y.abs() > 0.99 {
            Vector3::unit_z()
        } else {
            Vector3::unit_y()
        };
        let view = Matrix4::look_at_rh(eye, target, up);
        let e = self.shadow_extent;
        let proj = cgmath::ortho(-e, e, -e, e, self.shadow.near, self.shadow.far);
        OPENGL_TO_WGPU_MATRIX * proj * view
    }
}

/// Omnidirectional light with a finite range
#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    pub name: String,
    pub color: Srgb,
    pub intensity: f32,
    /// Range cutoff; zero means unlimited
    pub distance: f32,
    pub decay: f32,
    /// Position relative to `group`, or world space if ungrouped
    pub position: Vector3<f32>,
    pub group: Option<GroupId>,
    pub cast_shadow: bool,
    pub shadow: ShadowSettings,
}

impl PointLight {
    pub fn new(name: &str, color: Srgb, intensity: f32, distance: f32) -> Self {
        Self {
            name: name.to_string(),
            color,
            intensity,
            distance,
            decay: 2.0,
            position: Vector3::new(0.0, 0.0, 0.0),
            group: None,
            cast_shadow: false,
            shadow: ShadowSettings::POINT,
        }
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Vector3::new(x, y, z);
        self
    }

    pub fn in_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    pub fn with_shadow(mut self, map_size: u32, far: f32) -> Self {
        self.cast_shadow = true;
        self.shadow.map_size = map_size;
        self.shadow.far = far;
        self
    }

    /// View-projection for each cube face, indexed like [`cube_faces`]
    pub fn face_view_projs(&self, world_position: Vector3<f32>) -> [Matrix4<f32>; 6] {
        let proj =
            OPENGL_TO_WGPU_MATRIX * perspective(Deg(90.0), 1.0, self.shadow.near, self.shadow.far);
        let eye = Point3::new(world_position.x, world_position.y, world_position.z);
        cube_faces().map(|(dir, up)| proj * Matrix4::look_to_rh(eye, dir, up))
    }
}

/// Cube face look directions and up vectors: +X, -X, +Y, -Y, +Z, -Z
pub fn cube_faces() -> [(Vector3<f32>, Vector3<f32>); 6] {
    let (x, y, z) = (Vector3::unit_x(), Vector3::unit_y(), Vector3::unit_z());
    [(x, y), (-x, y), (y, z), (-y, -z), (z, y), (-z, y)]
}

/// Linear fog over view-space depth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Srgb,
    pub near: f32,
    pub far: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::Vector4;

    #[test]
    fn moon_direction_points_at_light() {
        let moon = DirectionalLight {
            position: Vector3::new(4.0, 5.0, -2.0),
            ..Default::default()
        };
        let d = moon.direction();
        assert_relative_eq!(d.magnitude(), 1.0, epsilon = 1e-6);
        assert!(d.x > 0.0 && d.y > 0.0 && d.z < 0.0);
    }

    #[test]
    fn directional_shadow_projects_origin_inside_clip_volume() {
        let moon = DirectionalLight {
            position: Vector3::new(4.0, 5.0, -2.0),
            cast_shadow: true,
            ..Default::default()
        };
        let clip = moon.shadow_view_proj() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn directional_shadow_keeps_house_and_floor_in_depth_range() {
        let moon = DirectionalLight {
            position: Vector3::new(4.0, 5.0, -2.0),
            cast_shadow: true,
            ..Default::default()
        };
        let matrix = moon.shadow_view_proj();
        // Roof tip, a wall corner and a floor point near the light
        for point in [
            Vector4::new(0.0, 3.5, 0.0, 1.0),
            Vector4::new(-2.0, 0.0, 2.0, 1.0),
            Vector4::new(3.0, 0.0, -1.0, 1.0),
        ] {
            let clip = matrix * point;
            let ndc = clip.truncate() / clip.w;
            assert!(ndc.z > 0.0 && ndc.z < 1.0, "{point:?} -> {ndc:?}");
        }
    }

    #[test]
    fn directional_depth_grows_away_from_the_light() {
        let moon = DirectionalLight {
            position: Vector3::new(4.0, 5.0, -2.0),
            cast_shadow: true,
            ..Default::default()
        };
        let depth = |p: Vector4<f32>| {
            let clip = moon.shadow_view_proj() * p;
            clip.z / clip.w
        };
        let towards_light = Vector4::new(0.8, 1.0, -0.4, 1.0);
        assert!(depth(towards_light) < depth(Vector4::new(0.0, 0.0, 0.0, 1.0)));
    }

    #[test]
    fn each_face_frustum_covers_its_major_axis() {
        let light = PointLight::new("test", Srgb::new(1.0, 1.0, 1.0), 1.0, 7.0)
            .with_shadow(256, 7.0);
        let origin = Vector3::new(0.0, 1.0, 0.0);
        let matrices = light.face_view_projs(origin);

        let samples = [
            Vector3::new(2.0, 0.3, -0.5),
            Vector3::new(-1.0, 0.2, 0.1),
            Vector3::new(0.1, 3.0, 0.2),
            Vector3::new(0.3, -2.0, 0.4),
            Vector3::new(0.2, 0.1, 1.5),
            Vector3::new(-0.4, 0.6, -4.0),
        ];
        for (face, offset) in samples.into_iter().enumerate() {
            let world = (origin + offset).extend(1.0);
            let clip = matrices[face] * world;
            let ndc = clip.truncate() / clip.w;
            assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0, "face {face}: {ndc:?}");
            assert!(ndc.z >= 0.0 && ndc.z <= 1.0, "face {face}: {ndc:?}");
        }
    }

    #[test]
    fn point_shadow_depth_spans_near_to_far() {
        let light = PointLight::new("test", Srgb::new(1.0, 1.0, 1.0), 1.0, 7.0)
            .with_shadow(256, 7.0);
        let matrices = light.face_view_projs(Vector3::new(0.0, 0.0, 0.0));
        // +X face
        let at = |x: f32| {
            let clip = matrices[0] * Vector4::new(x, 0.0, 0.0, 1.0);
            clip.z / clip.w
        };
        assert_relative_eq!(at(light.shadow.near), 0.0, epsilon = 1e-5);
        assert_relative_eq!(at(light.shadow.far), 1.0, epsilon = 1e-4);
    }
}
