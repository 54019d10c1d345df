//! Depth maps for the moon and the point lights
//!
//! The directional light renders into one 2D depth texture. Point lights use
//! cube shadows stored as six layers each of a depth array; every layer is
//! rendered with the matching face matrix from the global uniform.

use cgmath::Matrix4;

use crate::gfx::resources::{
    global_bindings::{GlobalUniform, POINT_SHADOW_LAYERS},
    texture_resource::TextureResource,
};
use crate::gfx::scene::{object::DrawObject, Scene};
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

/// Light-space matrix for a single shadow pass
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShadowPassUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// A shadow pass: which layer to render and with what matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShadowTarget {
    Directional,
    PointFace { layer: usize },
}

impl ShadowTarget {
    /// Index into the per-pass uniform buffers
    pub fn slot(self) -> usize {
        match self {
            ShadowTarget::Directional => 0,
            ShadowTarget::PointFace { layer } => 1 + layer,
        }
    }
}

/// Passes needed this frame, in render order
pub fn shadow_targets(scene: &Scene) -> Vec<ShadowTarget> {
    let mut targets = Vec::new();
    if scene.directional.cast_shadow {
        targets.push(ShadowTarget::Directional);
    }
    for (index, light) in scene.point_lights.iter().take(POINT_SHADOW_LAYERS / 6).enumerate() {
        if light.cast_shadow {
            targets.extend((0..6).map(|face| ShadowTarget::PointFace { layer: index * 6 + face }));
        }
    }
    targets
}

/// Largest point shadow map requested by the scene
pub fn point_map_size(scene: &Scene) -> u32 {
    scene
        .point_lights
        .iter()
        .filter(|light| light.cast_shadow)
        .map(|light| light.shadow.map_size)
        .max()
        .unwrap_or(256)
}

pub struct ShadowMaps {
    directional: TextureResource,
    // Owns the layers behind `point_layer_views` and the sampled array view
    _point: TextureResource,
    point_layer_views: Vec<wgpu::TextureView>,
    directional_size: u32,
    point_size: u32,

    pass_layout: BindGroupLayoutWithDesc,
    pass_ubos: Vec<UniformBuffer<ShadowPassUniform>>,
    pass_bind_groups: Vec<wgpu::BindGroup>,

    sample_layout: BindGroupLayoutWithDesc,
    sample_bind_group: wgpu::BindGroup,
}

impl ShadowMaps {
    pub fn new(device: &wgpu::Device, directional_size: u32, point_size: u32) -> Self {
        let pass_layout = BindGroupLayoutBuilder::new()
            .next_binding_vertex(binding_types::uniform())
            .create(device, "Shadow Pass Bind Group Layout");

        let pass_ubos: Vec<_> = (0..=POINT_SHADOW_LAYERS)
            .map(|_| UniformBuffer::<ShadowPassUniform>::new(device))
            .collect();
        let pass_bind_groups = pass_ubos
            .iter()
            .map(|ubo| {
                BindGroupBuilder::new(&pass_layout)
                    .resource(ubo.binding_resource())
                    .create(device, "Shadow Pass Bind Group")
            })
            .collect();

        let sample_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::depth_texture_2d())
            .next_binding_fragment(binding_types::depth_texture_2d_array())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Comparison))
            .create(device, "Shadow Sample Bind Group Layout");

        let (directional, point, point_layer_views) =
            Self::create_maps(device, directional_size, point_size);
        let sample_bind_group =
            Self::create_sample_bind_group(device, &sample_layout, &directional, &point);

        Self {
            directional,
            _point: point,
            point_layer_views,
            directional_size,
            point_size,
            pass_layout,
            pass_ubos,
            pass_bind_groups,
            sample_layout,
            sample_bind_group,
        }
    }

    fn create_maps(
        device: &wgpu::Device,
        directional_size: u32,
        point_size: u32,
    ) -> (TextureResource, TextureResource, Vec<wgpu::TextureView>) {
        let directional = TextureResource::create_depth_texture(
            device,
            directional_size,
            directional_size,
            "Directional Shadow Map",
        );
        let point = TextureResource::create_shadow_array(
            device,
            point_size,
            POINT_SHADOW_LAYERS as u32,
            "Point Shadow Maps",
        );
        let views = (0..POINT_SHADOW_LAYERS as u32).map(|layer| point.layer_view(layer)).collect();
        (directional, point, views)
    }

    fn create_sample_bind_group(
        device: &wgpu::Device,
        layout: &BindGroupLayoutWithDesc,
        directional: &TextureResource,
        point: &TextureResource,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(layout)
            .texture(&directional.view)
            .texture(&point.view)
            .sampler(&directional.sampler)
            .create(device, "Shadow Sample Bind Group")
    }

    /// Recreates the maps when the scene asks for different resolutions
    pub fn ensure_sizes(&mut self, device: &wgpu::Device, directional_size: u32, point_size: u32) {
        if directional_size == self.directional_size && point_size == self.point_size {
            return;
        }

        log::info!("Shadow maps resized: directional {directional_size}, point {point_size}");
        let (directional, point, views) = Self::create_maps(device, directional_size, point_size);
        self.sample_bind_group =
            Self::create_sample_bind_group(device, &self.sample_layout, &directional, &point);
        self.directional = directional;
        self._point = point;
        self.point_layer_views = views;
        self.directional_size = directional_size;
        self.point_size = point_size;
    }

    pub fn pass_layout(&self) -> &wgpu::BindGroupLayout {
        &self.pass_layout.layout
    }

    pub fn sample_layout(&self) -> &wgpu::BindGroupLayout {
        &self.sample_layout.layout
    }

    pub fn sample_bind_group(&self) -> &wgpu::BindGroup {
        &self.sample_bind_group
    }

    fn target_view(&self, target: ShadowTarget) -> &wgpu::TextureView {
        match target {
            ShadowTarget::Directional => &self.directional.view,
            ShadowTarget::PointFace { layer } => &self.point_layer_views[layer],
        }
    }

    fn target_matrix(globals: &GlobalUniform, target: ShadowTarget) -> Matrix4<f32> {
        match target {
            ShadowTarget::Directional => globals.directional_shadow_matrix(),
            ShadowTarget::PointFace { layer } => globals.point_shadow_matrix(layer),
        }
    }

    /// Records one depth pass per target, drawing every shadow caster
    pub fn render(
        &mut self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        pipeline: &wgpu::RenderPipeline,
        scene: &Scene,
        globals: &GlobalUniform,
    ) {
        let targets = shadow_targets(scene);

        for &target in &targets {
            let view_proj: [[f32; 4]; 4] = Self::target_matrix(globals, target).into();
            self.pass_ubos[target.slot()].update_content(queue, ShadowPassUniform { view_proj });
        }

        for target in targets {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Depth Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.target_view(target),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            shadow_pass.set_pipeline(pipeline);
            shadow_pass.set_bind_group(0, &self.pass_bind_groups[target.slot()], &[]);

            for object in scene.objects.iter().filter(|o| o.visible && o.cast_shadow) {
                if let Some(bind_group) = object.get_bind_group() {
                    shadow_pass.set_bind_group(1, bind_group, &[]);
                    shadow_pass.draw_object(object);
                }
            }
        }
    }
}
