//! Global uniform bindings for camera and scene data
//!
//! Everything shared by all objects in a frame: camera matrices, every light,
//! fog and the light-space matrices used to look up shadow maps. Bound to
//! group 0 in the main pipelines.

use cgmath::Matrix4;

use crate::{
    gfx::scene::Scene,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Point lights beyond this count are ignored by the renderer
pub const MAX_POINT_LIGHTS: usize = 4;

/// One shadow layer per cube face of every point light
pub const POINT_SHADOW_LAYERS: usize = MAX_POINT_LIGHTS * 6;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightUniform {
    /// World position (xyz) and range cutoff (w)
    pub position: [f32; 4],
    /// Linear colour times intensity (rgb) and decay exponent (a)
    pub color: [f32; 4],
    /// casts shadow, first layer, unused, unused
    pub shadow: [f32; 4],
}

/// Global uniform buffer content structure
///
/// MUST match the `Globals` struct in the shaders exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    /// Linear colour times intensity
    pub ambient: [f32; 4],
    /// Unit vector towards the light (xyz), casts shadow (w)
    pub directional_direction: [f32; 4],
    pub directional_color: [f32; 4],
    pub directional_view_proj: [[f32; 4]; 4],
    pub fog_color: [f32; 4],
    /// near, far, enabled, unused
    pub fog_params: [f32; 4],
    /// point light count, unused x3
    pub counts: [u32; 4],
    pub point_lights: [PointLightUniform; MAX_POINT_LIGHTS],
    pub point_shadow_view_proj: [[[f32; 4]; 4]; POINT_SHADOW_LAYERS],
}

impl GlobalUniform {
    /// Packs the current state of `scene` for upload
    pub fn from_scene(scene: &Scene) -> Self {
        let camera = scene.camera_manager.uniform();
        let identity: [[f32; 4]; 4] = Matrix4::from_scale(1.0).into();

        let ambient = scene.ambient.color.to_linear_scaled(scene.ambient.intensity);

        let moon = &scene.directional;
        let direction = moon.direction();
        let directional_color = moon.color.to_linear_scaled(moon.intensity);

        let (fog_color, fog_params) = match &scene.fog {
            Some(fog) => {
                let [r, g, b] = fog.color.to_linear();
                ([r, g, b, 1.0], [fog.near, fog.far, 1.0, 0.0])
            }
            None => ([0.0; 4], [0.0; 4]),
        };

        let mut point_lights = [PointLightUniform::default(); MAX_POINT_LIGHTS];
        let mut point_shadow_view_proj = [identity; POINT_SHADOW_LAYERS];
        let active = scene.point_lights.iter().take(MAX_POINT_LIGHTS);

        for (index, light) in active.enumerate() {
            let position = scene.point_light_world_position(light);
            let [r, g, b] = light.color.to_linear_scaled(light.intensity);
            let first_layer = index * 6;

            point_lights[index] = PointLightUniform {
                position: [position.x, position.y, position.z, light.distance],
                color: [r, g, b, light.decay],
                shadow: [light.cast_shadow as u32 as f32, first_layer as f32, 0.0, 0.0],
            };

            if light.cast_shadow {
                for (face, matrix) in light.face_view_projs(position).into_iter().enumerate() {
                    point_shadow_view_proj[first_layer + face] = matrix.into();
                }
            }
        }

        Self {
            view_proj: camera.view_proj,
            view: camera.view,
            camera_position: camera.view_position,
            ambient: [ambient[0], ambient[1], ambient[2], 1.0],
            directional_direction: direction.extend(moon.cast_shadow as u32 as f32).into(),
            directional_color: [
                directional_color[0],
                directional_color[1],
                directional_color[2],
                1.0,
            ],
            directional_view_proj: moon.shadow_view_proj().into(),
            fog_color,
            fog_params,
            counts: [scene.point_lights.len().min(MAX_POINT_LIGHTS) as u32, 0, 0, 0],
            point_lights,
            point_shadow_view_proj,
        }
    }

    /// Light-space matrix for a shadow layer; layer 0..24 are point faces
    pub fn point_shadow_matrix(&self, layer: usize) -> Matrix4<f32> {
        self.point_shadow_view_proj[layer].into()
    }

    pub fn directional_shadow_matrix(&self) -> Matrix4<f32> {
        self.directional_view_proj.into()
    }
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUniform>;

/// Manages bind group layouts and bind groups for global uniforms
///
/// This is bound to slot 0 in the main render pipelines.
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl GlobalBindings {
    /// Sets up the layout; the bind group is created by `create_bind_group()`
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group Layout");

        GlobalBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    pub fn create_bind_group(&mut self, device: &wgpu::Device, ubo: &GlobalUBO) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .create(device, "Global Bind Group"),
        );
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    /// Returns the bind group, if `create_bind_group()` has run
    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Srgb;
    use crate::config::CameraConfig;
    use crate::gfx::camera::CameraManager;
    use crate::gfx::scene::{AmbientLight, Fog, PointLight, Transform};
    use approx::assert_relative_eq;

    fn scene() -> Scene {
        Scene::new(CameraManager::from_config(&CameraConfig::default(), 1.5))
    }

    #[test]
    fn uniform_size_is_a_multiple_of_sixteen() {
        assert_eq!(std::mem::size_of::<PointLightUniform>(), 48);
        assert_eq!(std::mem::size_of::<GlobalUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<GlobalUniform>(), 2032);
    }

    #[test]
    fn ambient_is_linear_times_intensity() {
        let mut scene = scene();
        scene.set_ambient(AmbientLight {
            color: Srgb::new(1.0, 1.0, 1.0),
            intensity: 0.12,
        });
        let uniform = GlobalUniform::from_scene(&scene);
        assert_relative_eq!(uniform.ambient[0], 0.12, epsilon = 1e-6);
    }

    #[test]
    fn point_lights_use_world_positions_and_layers() {
        let mut scene = scene();
        let house = scene.add_group("house", Transform::from_translation(0.0, 1.0, 0.0));
        scene.add_point_light(
            PointLight::new("a", Srgb::new(1.0, 1.0, 1.0), 2.0, 3.0).at(1.0, 0.0, 0.0),
        );
        scene.add_point_light(
            PointLight::new("b", Srgb::new(1.0, 0.0, 0.0), 3.0, 7.0)
                .at(0.0, 2.2, 2.7)
                .in_group(house)
                .with_shadow(256, 7.0),
        );

        let uniform = GlobalUniform::from_scene(&scene);
        assert_eq!(uniform.counts[0], 2);

        let b = uniform.point_lights[1];
        assert_relative_eq!(b.position[1], 3.2, epsilon = 1e-6);
        assert_eq!(b.position[3], 7.0);
        assert_eq!(b.color[3], 2.0);
        assert_relative_eq!(b.color[0], 3.0, epsilon = 1e-6);
        assert_eq!(b.shadow, [1.0, 6.0, 0.0, 0.0]);
        assert_eq!(uniform.point_lights[0].shadow[0], 0.0);

        // Face layers for the shadowed light hold real projections
        let identity: [[f32; 4]; 4] = Matrix4::from_scale(1.0).into();
        assert_eq!(uniform.point_shadow_view_proj[0], identity);
        assert_ne!(uniform.point_shadow_view_proj[6], identity);
    }

    #[test]
    fn extra_point_lights_are_dropped() {
        let mut scene = scene();
        for i in 0..6 {
            let light = PointLight::new(&format!("l{i}"), Srgb::new(1.0, 1.0, 1.0), 1.0, 1.0);
            scene.add_point_light(light);
        }
        assert_eq!(GlobalUniform::from_scene(&scene).counts[0], MAX_POINT_LIGHTS as u32);
    }

    #[test]
    fn fog_is_flagged_when_present() {
        let mut scene = scene();
        assert_eq!(GlobalUniform::from_scene(&scene).fog_params[2], 0.0);

        scene.set_fog(Fog {
            color: Srgb::from_hex("#262827").unwrap(),
            near: 1.0,
            far: 15.0,
        });
        let uniform = GlobalUniform::from_scene(&scene);
        assert_eq!(uniform.fog_params, [1.0, 15.0, 1.0, 0.0]);
        assert!(uniform.fog_color[0] < 0.03);
    }
}
