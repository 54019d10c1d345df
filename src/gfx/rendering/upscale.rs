//! Offscreen scene target for capped pixel ratios
//!
//! The surface always matches the window. When the scene is rendered at a
//! smaller size it goes into an offscreen texture first, which is then
//! stretched over the surface before the overlay is drawn.

use crate::gfx::resources::texture_resource::TextureResource;
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
};

/// Whether the scene needs its own target instead of drawing to the surface
pub fn needs_offscreen(render_size: (u32, u32), surface_size: (u32, u32)) -> bool {
    render_size != surface_size
}

struct SceneTarget {
    color: TextureResource,
    bind_group: wgpu::BindGroup,
}

pub struct Upscaler {
    layout: BindGroupLayoutWithDesc,
    format: wgpu::TextureFormat,
    target: Option<SceneTarget>,
}

impl Upscaler {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Upscale Bind Group Layout");

        Self {
            layout,
            format,
            target: None,
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout.layout
    }

    /// Creates or drops the offscreen target for the new sizes
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        render_size: (u32, u32),
        surface_size: (u32, u32),
    ) {
        if !needs_offscreen(render_size, surface_size) {
            if self.target.take().is_some() {
                log::debug!("Scene renders straight to the surface");
            }
            return;
        }

        let (width, height) = render_size;
        let color = TextureResource::create_render_target(
            device,
            width,
            height,
            self.format,
            "Scene Target",
        );
        let bind_group = BindGroupBuilder::new(&self.layout)
            .texture(&color.view)
            .sampler(&color.sampler)
            .create(device, "Upscale Bind Group");
        log::debug!(
            "Scene renders at {width}x{height}, scaled to {}x{}",
            surface_size.0,
            surface_size.1
        );
        self.target = Some(SceneTarget { color, bind_group });
    }

    /// Offscreen view to draw the scene into, if one is in use
    pub fn target_view(&self) -> Option<&wgpu::TextureView> {
        self.target.as_ref().map(|target| &target.color.view)
    }

    /// Stretches the offscreen target over `surface_view`; no-op without one
    pub fn blit(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        pipeline: &wgpu::RenderPipeline,
        surface_view: &wgpu::TextureView,
    ) {
        let Some(target) = self.target.as_ref() else {
            return;
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Upscale Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &target.bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}
