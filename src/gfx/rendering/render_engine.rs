//! WGPU-based rendering engine for the haunted house
//!
//! Owns the surface, device and every frame-level GPU resource. A frame is
//! a series of depth passes into the shadow maps followed by one main pass
//! that draws opaque objects, then transparent ones. A scene rendered below
//! the window's resolution is then stretched over the surface, and the UI
//! overlay goes on top at full resolution.

use std::sync::Arc;
use wgpu::TextureFormat;

use crate::error::{HauntedError, Result};
use crate::gfx::{
    camera::Viewport,
    resources::{
        global_bindings::{GlobalBindings, GlobalUBO, GlobalUniform},
        material::MaterialBindings,
        texture_resource::TextureResource,
    },
    scene::{
        object::{DrawObject, Object, ObjectBindings},
        Scene,
    },
};

use super::pipeline_manager::{PipelineConfig, PipelineManager};
use super::shadow_maps::{point_map_size, ShadowMaps};
use super::upscale::Upscaler;

const DEFAULT_POINT_SHADOW_SIZE: u32 = 256;

const PBR_SHADER: &str = include_str!("pbr.wgsl");
const SHADOW_SHADER: &str = include_str!("shadow_pass.wgsl");
const UPSCALE_SHADER: &str = include_str!("upscale.wgsl");

/// How the frame loop should react to a failed surface acquire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceRecovery {
    /// Surface was reconfigured, the next frame should succeed
    Reconfigure,
    /// Drop this frame and carry on
    Skip,
    /// Unrecoverable, shut down
    Exit,
}

impl SurfaceRecovery {
    pub fn for_error(error: &wgpu::SurfaceError) -> Self {
        match error {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceRecovery::Reconfigure,
            wgpu::SurfaceError::OutOfMemory => SurfaceRecovery::Exit,
            _ => SurfaceRecovery::Skip,
        }
    }
}

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    // Scene resolution; differs from the surface when the pixel ratio is capped
    render_size: (u32, u32),
    depth_texture: TextureResource,
    upscaler: Upscaler,
    format: TextureFormat,
    pub pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    object_bindings: ObjectBindings,
    material_bindings: MaterialBindings,
    shadow_maps: ShadowMaps,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// Picks an sRGB surface format when one exists so the shaders can write
    /// linear colour, then builds the depth buffer, shadow maps and every
    /// pipeline up front. `width` and `height` are the window's physical size;
    /// the scene renders at that size until [`RenderEngine::set_render_size`].
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let max_dimension = device.limits().max_texture_dimension_2d;
        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or(HauntedError::NoSurfaceFormat)?;
        if !format.is_srgb() {
            log::warn!("No sRGB surface format available, colours will look dark ({format:?})");
        }

        let supports_immediate = surface_capabilities
            .present_modes
            .contains(&wgpu::PresentMode::Immediate);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.clamp(1, max_dimension),
            height: height.clamp(1, max_dimension),
            present_mode: present_mode(vsync, supports_immediate),
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let render_size = (config.width, config.height);
        let depth_texture = TextureResource::create_depth_texture(
            &device,
            config.width,
            config.height,
            "depth_texture",
        );
        let upscaler = Upscaler::new(&device, format);

        let global_ubo = GlobalUBO::new(&device);
        let mut global_bindings = GlobalBindings::new(&device);
        global_bindings.create_bind_group(&device, &global_ubo);

        let object_bindings = ObjectBindings::new(&device);
        let material_bindings = MaterialBindings::new(&device);
        let shadow_maps = ShadowMaps::new(&device, 512, DEFAULT_POINT_SHADOW_SIZE);

        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let mut pipeline_manager = PipelineManager::new(device.clone());
        pipeline_manager.load_shader("pbr", PBR_SHADER);
        pipeline_manager.load_shader("shadow", SHADOW_SHADER);
        pipeline_manager.load_shader("upscale", UPSCALE_SHADER);

        pipeline_manager.register_pipeline(
            "Shadow",
            PipelineConfig::default()
                .with_label("Shadow Pipeline")
                .with_shader("shadow")
                .with_bind_group_layouts(vec![
                    shadow_maps.pass_layout().clone(),
                    object_bindings.bind_group_layout().clone(),
                ])
                .with_vertex_only()
                .with_cull_mode(Some(wgpu::Face::Front))
                .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                .with_depth_bias(2, 2.0),
        );

        let main_layouts = vec![
            global_bindings.bind_group_layout().clone(),
            object_bindings.bind_group_layout().clone(),
            material_bindings.bind_group_layout().clone(),
            shadow_maps.sample_layout().clone(),
        ];

        pipeline_manager.register_pipeline(
            "PBR",
            PipelineConfig::default()
                .with_label("PBR Pipeline")
                .with_shader("pbr")
                .with_bind_group_layouts(main_layouts.clone())
                .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                .with_color_target(format, Some(wgpu::BlendState::REPLACE)),
        );

        pipeline_manager.register_pipeline(
            "Transparent",
            PipelineConfig::default()
                .with_label("Transparent Pipeline")
                .with_shader("pbr")
                .with_bind_group_layouts(main_layouts)
                .with_depth_stencil(TextureResource::DEPTH_FORMAT)
                .with_color_target(format, Some(wgpu::BlendState::ALPHA_BLENDING)),
        );

        pipeline_manager.register_pipeline(
            "Upscale",
            PipelineConfig::default()
                .with_label("Upscale Pipeline")
                .with_shader("upscale")
                .with_bind_group_layouts(vec![upscaler.bind_group_layout().clone()])
                .with_generated_vertices()
                .with_cull_mode(None)
                .with_color_target(format, Some(wgpu::BlendState::REPLACE)),
        );

        pipeline_manager
            .create_all_pipelines()
            .map_err(|errors| HauntedError::Pipeline(errors.join("; ")))?;
        let stats = pipeline_manager.get_stats();
        log::info!(
            "Render engine ready: {}x{} {:?}, {} pipelines from {} shaders",
            config.width,
            config.height,
            format,
            stats.total_pipelines,
            stats.loaded_shaders
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            render_size,
            depth_texture,
            upscaler,
            format,
            pipeline_manager,
            global_ubo,
            global_bindings,
            object_bindings,
            material_bindings,
            shadow_maps,
        })
    }

    /// Uploads meshes, object uniforms and materials of `scene`
    pub fn init_scene(&mut self, scene: &mut Scene) {
        scene.init_gpu_resources(
            &self.device,
            &self.queue,
            &self.object_bindings,
            &self.material_bindings,
        );
    }

    /// Renders one frame of `scene`, with an optional overlay drawn last
    ///
    /// The overlay callback receives the encoder and the surface view after
    /// the scene has been drawn (and, with a capped pixel ratio, scaled) into it.
    pub fn render_frame<F>(
        &mut self,
        scene: &mut Scene,
        ui_callback: Option<F>,
    ) -> std::result::Result<(), wgpu::SurfaceError>
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let surface_texture = self.surface.get_current_texture()?;
        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        scene.update_all_transforms(&self.queue);
        let globals = GlobalUniform::from_scene(scene);
        self.global_ubo.update_content(&self.queue, globals);

        let directional_size = scene.directional.shadow.map_size;
        self.shadow_maps
            .ensure_sizes(&self.device, directional_size, point_map_size(scene));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // PASS 1: one depth pass per shadow map layer
        if let Some(shadow_pipeline) = self.pipeline_manager.get_pipeline("Shadow") {
            self.shadow_maps
                .render(&self.queue, &mut encoder, shadow_pipeline, scene, &globals);
        }

        // PASS 2: opaque objects, then transparent ones back to front
        let scene_view = self.upscaler.target_view().unwrap_or(&surface_texture_view);
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: scene_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(scene.clear_color.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(global_bind_group) = self.global_bindings.bind_group() {
                render_pass.set_bind_group(0, global_bind_group, &[]);
            }
            render_pass.set_bind_group(3, self.shadow_maps.sample_bind_group(), &[]);

            let (transparent, opaque): (Vec<&Object>, Vec<&Object>) = scene
                .objects
                .iter()
                .filter(|o| o.visible)
                .partition(|o| scene.get_material_for_object(o).transparent);

            if let Some(pipeline) = self.pipeline_manager.get_pipeline("PBR") {
                render_pass.set_pipeline(pipeline);
                for object in opaque {
                    draw_with_material(&mut render_pass, scene, object);
                }
            }

            if let Some(pipeline) = self.pipeline_manager.get_pipeline("Transparent") {
                render_pass.set_pipeline(pipeline);
                for object in sort_back_to_front(scene, transparent) {
                    draw_with_material(&mut render_pass, scene, object);
                }
            }
        }

        // PASS 3: stretch an offscreen scene over the surface
        if let Some(pipeline) = self.pipeline_manager.get_pipeline("Upscale") {
            self.upscaler.blit(&mut encoder, pipeline, &surface_texture_view);
        }

        // PASS 4: UI overlay
        if let Some(ui_callback) = ui_callback {
            ui_callback(&self.device, &self.queue, &mut encoder, &surface_texture_view);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
        Ok(())
    }

    /// Applies the recovery for a failed frame and reports it
    pub fn recover(&mut self, error: &wgpu::SurfaceError) -> SurfaceRecovery {
        let recovery = SurfaceRecovery::for_error(error);
        match recovery {
            SurfaceRecovery::Reconfigure => {
                log::warn!("Surface {error}, reconfiguring");
                self.surface.configure(&self.device, &self.config);
            }
            SurfaceRecovery::Skip => log::error!("Dropped frame: {error}"),
            SurfaceRecovery::Exit => log::error!("Surface error {error}, shutting down"),
        }
        recovery
    }

    /// Largest texture side the device accepts
    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    /// Resizes the surface to the window and the scene to the viewport's render size
    pub fn apply_viewport(&mut self, viewport: &Viewport) {
        self.resize(viewport.physical_width, viewport.physical_height);
        self.set_render_size(viewport.render_width, viewport.render_height);
    }

    /// Reconfigures the surface to the window's physical size; zero sizes are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let max_dimension = self.max_texture_dimension();
        let (width, height) = (width.min(max_dimension), height.min(max_dimension));
        if width == self.config.width && height == self.config.height {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        log::debug!("Surface resized to {width}x{height}");

        self.upscaler
            .resize(&self.device, self.render_size, (width, height));
    }

    /// Sets the resolution the scene is drawn at; zero sizes are ignored
    pub fn set_render_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        let max_dimension = self.max_texture_dimension();
        let render_size = (width.min(max_dimension), height.min(max_dimension));
        if render_size == self.render_size {
            return;
        }

        self.render_size = render_size;
        self.depth_texture = TextureResource::create_depth_texture(
            &self.device,
            render_size.0,
            render_size.1,
            "depth_texture",
        );
        self.upscaler
            .resize(&self.device, render_size, (self.config.width, self.config.height));
    }

    /// Size of the surface, which is also the size the overlay is drawn at
    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

fn present_mode(vsync: bool, supports_immediate: bool) -> wgpu::PresentMode {
    if vsync || !supports_immediate {
        wgpu::PresentMode::Fifo
    } else {
        wgpu::PresentMode::Immediate
    }
}

fn draw_with_material<'a, 'b: 'a>(
    render_pass: &mut wgpu::RenderPass<'a>,
    scene: &'b Scene,
    object: &'b Object,
) {
    let material = scene.get_material_for_object(object);
    let (Some(object_bind_group), Some(material_bind_group)) =
        (object.get_bind_group(), material.get_bind_group())
    else {
        log::debug!(
            "Skipping '{}' - material '{}' has no GPU resources",
            object.name,
            material.name
        );
        return;
    };

    render_pass.set_bind_group(1, object_bind_group, &[]);
    render_pass.set_bind_group(2, material_bind_group, &[]);
    render_pass.draw_object(object);
}

/// Orders objects by decreasing distance from the camera eye
fn sort_back_to_front<'a>(scene: &Scene, mut objects: Vec<&'a Object>) -> Vec<&'a Object> {
    let eye = scene.camera_manager.camera.eye;
    let depth = |object: &Object| {
        let world = scene.object_world_matrix(object);
        let dx = world.w.x - eye.x;
        let dy = world.w.y - eye.y;
        let dz = world.w.z - eye.z;
        dx * dx + dy * dy + dz * dz
    };
    objects.sort_by(|a, b| depth(b).total_cmp(&depth(a)));
    objects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::gfx::camera::CameraManager;
    use crate::gfx::geometry::generate_plane;
    use crate::gfx::scene::Transform;

    fn validate_wgsl(name: &str, source: &str) {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|e| panic!("{name} failed to parse:\n{}", e.emit_to_string(source)));
        let flags = naga::valid::ValidationFlags::all();
        naga::valid::Validator::new(flags, naga::valid::Capabilities::default())
            .validate(&module)
            .unwrap_or_else(|e| panic!("{name} failed validation: {e:?}"));
    }

    fn entry_points(source: &str) -> Vec<(naga::ShaderStage, String)> {
        let module = naga::front::wgsl::parse_str(source).unwrap();
        module
            .entry_points
            .iter()
            .map(|entry| (entry.stage, entry.name.clone()))
            .collect()
    }

    #[test]
    fn shaders_validate() {
        validate_wgsl("pbr.wgsl", PBR_SHADER);
        validate_wgsl("shadow_pass.wgsl", SHADOW_SHADER);
        validate_wgsl("upscale.wgsl", UPSCALE_SHADER);
    }

    #[test]
    fn shaders_expose_pipeline_entry_points() {
        let vertex = (naga::ShaderStage::Vertex, "vs_main".to_string());
        let fragment = (naga::ShaderStage::Fragment, "fs_main".to_string());

        let pbr = entry_points(PBR_SHADER);
        assert!(pbr.contains(&vertex) && pbr.contains(&fragment));
        let upscale = entry_points(UPSCALE_SHADER);
        assert!(upscale.contains(&vertex) && upscale.contains(&fragment));
        assert_eq!(entry_points(SHADOW_SHADER), vec![vertex]);
    }

    #[test]
    fn surface_errors_map_to_recoveries() {
        let recovery = |error| SurfaceRecovery::for_error(&error);
        assert_eq!(recovery(wgpu::SurfaceError::Lost), SurfaceRecovery::Reconfigure);
        assert_eq!(recovery(wgpu::SurfaceError::Outdated), SurfaceRecovery::Reconfigure);
        assert_eq!(recovery(wgpu::SurfaceError::OutOfMemory), SurfaceRecovery::Exit);
        assert_eq!(recovery(wgpu::SurfaceError::Timeout), SurfaceRecovery::Skip);
    }

    #[test]
    fn immediate_only_when_supported() {
        assert_eq!(present_mode(true, true), wgpu::PresentMode::Fifo);
        assert_eq!(present_mode(false, true), wgpu::PresentMode::Immediate);
        assert_eq!(present_mode(false, false), wgpu::PresentMode::Fifo);
    }

    #[test]
    fn transparent_objects_sort_far_first() {
        let mut scene = Scene::new(CameraManager::from_config(&CameraConfig::default(), 1.5));
        let plane = generate_plane(1.0, 1.0, 1, 1);
        let near = Transform::from_translation(3.0, 1.5, 4.0);
        let far = Transform::from_translation(-6.0, 0.0, -6.0);
        scene.add_object(Object::from_geometry("near", &plane).with_transform(near));
        scene.add_object(Object::from_geometry("far", &plane).with_transform(far));

        let sorted = sort_back_to_front(&scene, scene.objects.iter().collect());
        assert_eq!(sorted[0].name, "far");
        assert_eq!(sorted[1].name, "near");
    }
}
