//! Material system for PBR rendering
//!
//! Metal/rough materials with optional texture maps. Materials are stored in
//! MaterialManager and objects reference them by name; each material owns one
//! bind group holding its uniform, sampler and seven map slots.

use std::collections::HashMap;
use wgpu::Device;

use super::texture_loader::{ColorSpace, Placeholder, TextureImage, TextureSampling};
use super::texture_resource::TextureResource;
use crate::color::Srgb;
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

/// Material ID for referencing materials
pub type MaterialId = String;

/// Texture slots of a standard material, in binding order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapSlot {
    Color,
    AmbientOcclusion,
    Normal,
    Roughness,
    Metalness,
    Alpha,
    Displacement,
}

impl MapSlot {
    pub const COUNT: usize = 7;

    pub const ALL: [MapSlot; Self::COUNT] = [
        MapSlot::Color,
        MapSlot::AmbientOcclusion,
        MapSlot::Normal,
        MapSlot::Roughness,
        MapSlot::Metalness,
        MapSlot::Alpha,
        MapSlot::Displacement,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Bit set in `MaterialUniform::flags[0]` when the slot holds a map
    pub fn bit(self) -> u32 {
        1 << self.index()
    }

    pub fn color_space(self) -> ColorSpace {
        match self {
            MapSlot::Color => ColorSpace::Srgb,
            _ => ColorSpace::Linear,
        }
    }

    /// Texel that leaves the shading unchanged when sampled
    pub fn placeholder(self) -> Placeholder {
        match self {
            MapSlot::Normal => Placeholder::FlatNormal,
            MapSlot::Displacement => Placeholder::Black,
            _ => Placeholder::White,
        }
    }
}

/// GPU uniform data for materials
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    /// Linear RGB plus opacity
    pub base_color: [f32; 4],
    /// roughness, metalness, displacement scale, displacement bias
    pub params: [f32; 4],
    /// UV repeat (xy) and offset (zw)
    pub uv_transform: [f32; 4],
    /// map bitmask, transparent flag, unused, unused
    pub flags: [u32; 4],
}

type MaterialUBO = UniformBuffer<MaterialUniform>;

/// Bind group layout shared by every material
pub struct MaterialBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
}

impl MaterialBindings {
    pub fn new(device: &Device) -> Self {
        // Displacement is sampled in the vertex stage, so everything is
        // visible to both stages.
        let mut builder = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .next_binding_rendering(binding_types::sampler(wgpu::SamplerBindingType::Filtering));
        for _ in MapSlot::ALL {
            builder = builder.next_binding_rendering(binding_types::texture_2d());
        }

        MaterialBindings {
            bind_group_layout: builder.create(device, "Material Bind Group Layout"),
        }
    }

    pub fn create_bind_group(
        &self,
        device: &Device,
        ubo: &MaterialUBO,
        sampler: &wgpu::Sampler,
        views: [&wgpu::TextureView; MapSlot::COUNT],
        label: &str,
    ) -> wgpu::BindGroup {
        let mut builder = BindGroupBuilder::new(&self.bind_group_layout)
            .resource(ubo.binding_resource())
            .sampler(sampler);
        for view in views {
            builder = builder.texture(view);
        }
        builder.create(device, label)
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }
}

struct MaterialGpu {
    ubo: MaterialUBO,
    bind_group: wgpu::BindGroup,
    // Keeps uploaded maps alive for the bind group
    _textures: Vec<TextureResource>,
    _sampler: wgpu::Sampler,
}

/// Physically based metal/rough material
///
/// Defaults match a standard material: white, fully rough, non-metallic,
/// opaque, no maps.
pub struct Material {
    pub name: String,
    pub base_color: Srgb,
    pub opacity: f32,
    pub roughness: f32,
    pub metalness: f32,
    pub displacement_scale: f32,
    pub displacement_bias: f32,
    pub transparent: bool,
    pub sampling: TextureSampling,

    maps: [Option<TextureImage>; MapSlot::COUNT],
    map_mask: u32,

    // GPU resources - shared by all objects using this material
    gpu: Option<MaterialGpu>,
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default")
    }
}

impl Material {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            base_color: Srgb::new(1.0, 1.0, 1.0),
            opacity: 1.0,
            roughness: 1.0,
            metalness: 0.0,
            displacement_scale: 1.0,
            displacement_bias: 0.0,
            transparent: false,
            sampling: TextureSampling::default(),
            maps: Default::default(),
            map_mask: 0,
            gpu: None,
        }
    }

    pub fn with_color(mut self, color: Srgb) -> Self {
        self.base_color = color;
        self
    }

    /// Assigns a texture to `slot`, replacing any previous one
    pub fn with_map(mut self, slot: MapSlot, image: TextureImage) -> Self {
        self.maps[slot.index()] = Some(image);
        self.map_mask |= slot.bit();
        self
    }

    pub fn with_displacement(mut self, image: TextureImage, scale: f32) -> Self {
        self.displacement_scale = scale;
        self.with_map(MapSlot::Displacement, image)
    }

    pub fn with_transparency(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    pub fn with_sampling(mut self, sampling: TextureSampling) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn has_map(&self, slot: MapSlot) -> bool {
        self.map_mask & slot.bit() != 0
    }

    pub fn map_mask(&self) -> u32 {
        self.map_mask
    }

    pub fn uniform(&self) -> MaterialUniform {
        let [r, g, b] = self.base_color.to_linear();
        MaterialUniform {
            base_color: [r, g, b, self.opacity],
            params: [
                self.roughness,
                self.metalness,
                self.displacement_scale,
                self.displacement_bias,
            ],
            uv_transform: [self.sampling.repeat[0], self.sampling.repeat[1], 0.0, 0.0],
            flags: [self.map_mask, self.transparent as u32, 0, 0],
        }
    }

    /// Uploads maps on first call, then keeps the uniform in sync
    pub fn update_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        bindings: &MaterialBindings,
        fallbacks: &FallbackTextures,
    ) {
        let uniform = self.uniform();

        if let Some(gpu) = &mut self.gpu {
            gpu.ubo.update_content(queue, uniform);
            return;
        }

        let ubo = MaterialUBO::new_with_data(device, &uniform);
        let sampler = TextureResource::create_sampler(device, self.sampling, &self.name);

        let mut textures = Vec::new();
        let mut slot_texture = [None; MapSlot::COUNT];
        for slot in MapSlot::ALL {
            if let Some(image) = self.maps[slot.index()].take() {
                slot_texture[slot.index()] = Some(textures.len());
                textures.push(TextureResource::from_image(device, queue, &image, self.sampling));
            }
        }

        let views = MapSlot::ALL.map(|slot| match slot_texture[slot.index()] {
            Some(i) => &textures[i].view,
            None => fallbacks.view_for(slot),
        });

        let bind_group = bindings.create_bind_group(
            device,
            &ubo,
            &sampler,
            views,
            &format!("Material Bind Group: {}", self.name),
        );

        log::debug!(
            "Material '{}' uploaded with {} map(s), transparent: {}",
            self.name,
            textures.len(),
            self.transparent
        );

        self.gpu = Some(MaterialGpu {
            ubo,
            bind_group,
            _textures: textures,
            _sampler: sampler,
        });
    }

    /// Gets the bind group for rendering
    pub fn get_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().map(|gpu| &gpu.bind_group)
    }
}

/// 1x1 textures bound to empty map slots
pub struct FallbackTextures {
    white: TextureResource,
    black: TextureResource,
    flat_normal: TextureResource,
}

impl FallbackTextures {
    pub fn new(device: &Device, queue: &wgpu::Queue) -> Self {
        let upload = |placeholder: Placeholder| {
            let image = TextureImage::placeholder(
                &format!("Fallback {placeholder:?}"),
                placeholder,
                ColorSpace::Linear,
            );
            TextureResource::from_image(device, queue, &image, TextureSampling::default())
        };

        Self {
            white: upload(Placeholder::White),
            black: upload(Placeholder::Black),
            flat_normal: upload(Placeholder::FlatNormal),
        }
    }

    pub fn view_for(&self, slot: MapSlot) -> &wgpu::TextureView {
        match slot.placeholder() {
            Placeholder::White => &self.white.view,
            Placeholder::Black => &self.black.view,
            Placeholder::FlatNormal => &self.flat_normal.view,
        }
    }
}

/// Manages all materials in the engine
///
/// Objects reference materials by ID rather than storing material data
/// directly, so GPU resources are shared between objects.
pub struct MaterialManager {
    materials: HashMap<MaterialId, Material>,
    default_material_id: MaterialId,
    fallbacks: Option<FallbackTextures>,
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialManager {
    /// Creates a new material manager with a default material
    pub fn new() -> Self {
        let mut materials = HashMap::new();
        materials.insert("default".to_string(), Material::default());

        Self {
            materials,
            default_material_id: "default".to_string(),
            fallbacks: None,
        }
    }

    /// Adds a material, replacing any material with the same name
    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = material.name.clone();
        if self.materials.insert(id.clone(), material).is_some() {
            log::warn!("Material '{id}' replaced");
        }
        id
    }

    pub fn get_material(&self, id: &str) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn get_default_material(&self) -> &Material {
        &self.materials[&self.default_material_id]
    }

    /// Gets material for an object with fallback to default
    pub fn get_material_for_object(&self, material_id: Option<&MaterialId>) -> &Material {
        material_id
            .and_then(|id| self.get_material(id))
            .unwrap_or_else(|| self.get_default_material())
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Updates GPU resources for all materials
    ///
    /// Fallback textures are created on the first call.
    pub fn update_all_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        bindings: &MaterialBindings,
    ) {
        let fallbacks = self
            .fallbacks
            .get_or_insert_with(|| FallbackTextures::new(device, queue));

        for material in self.materials.values_mut() {
            material.update_gpu_resources(device, queue, bindings, fallbacks);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn defaults_match_a_standard_material() {
        let material = Material::new("plain");
        let uniform = material.uniform();
        assert_eq!(uniform.base_color, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(uniform.params, [1.0, 0.0, 1.0, 0.0]);
        assert_eq!(uniform.uv_transform, [1.0, 1.0, 0.0, 0.0]);
        assert_eq!(uniform.flags, [0, 0, 0, 0]);
    }

    #[test]
    fn uniform_layout_is_std140_friendly() {
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 64);
    }

    #[test]
    fn map_bits_are_distinct() {
        let mask = MapSlot::ALL.iter().fold(0u32, |acc, slot| {
            assert_eq!(acc & slot.bit(), 0);
            acc | slot.bit()
        });
        assert_eq!(mask, 0b111_1111);
    }

    #[test]
    fn only_colour_maps_are_srgb() {
        for slot in MapSlot::ALL {
            let expected = if slot == MapSlot::Color {
                ColorSpace::Srgb
            } else {
                ColorSpace::Linear
            };
            assert_eq!(slot.color_space(), expected);
        }
        assert_eq!(MapSlot::Normal.placeholder(), Placeholder::FlatNormal);
        assert_eq!(MapSlot::Displacement.placeholder(), Placeholder::Black);
        assert_eq!(MapSlot::AmbientOcclusion.placeholder(), Placeholder::White);
    }

    #[test]
    fn door_like_material_flags() {
        let white =
            |label| TextureImage::placeholder(label, Placeholder::White, ColorSpace::Linear);
        let door = Material::new("door")
            .with_map(MapSlot::Color, white("color"))
            .with_map(MapSlot::Alpha, white("alpha"))
            .with_displacement(white("height"), 0.1)
            .with_transparency(true);

        assert!(door.has_map(MapSlot::Alpha));
        assert!(!door.has_map(MapSlot::Normal));

        let uniform = door.uniform();
        assert_eq!(
            uniform.flags[0],
            MapSlot::Color.bit() | MapSlot::Alpha.bit() | MapSlot::Displacement.bit()
        );
        assert_eq!(uniform.flags[1], 1);
        assert_relative_eq!(uniform.params[2], 0.1);
    }

    #[test]
    fn base_colour_is_linearised() {
        let roof = Material::new("roof").with_color(Srgb::from_hex("#b35f45").unwrap());
        let uniform = roof.uniform();
        let expected = Srgb::from_hex("#b35f45").unwrap().to_linear();
        assert_relative_eq!(uniform.base_color[0], expected[0]);
        assert_relative_eq!(uniform.base_color[1], expected[1]);
        assert_relative_eq!(uniform.base_color[2], expected[2]);
        assert!(uniform.base_color[1] < 0.2);
    }

    #[test]
    fn repeat_reaches_the_uniform() {
        let grass = Material::new("grass").with_sampling(TextureSampling::repeating(8.0, 8.0));
        assert_eq!(grass.uniform().uv_transform, [8.0, 8.0, 0.0, 0.0]);
    }

    #[test]
    fn manager_falls_back_to_default() {
        let mut manager = MaterialManager::new();
        let id = manager.add_material(Material::new("grave"));

        assert_eq!(manager.len(), 2);
        assert_eq!(manager.get_material_for_object(Some(&id)).name, "grave");
        assert_eq!(
            manager.get_material_for_object(Some(&"missing".to_string())).name,
            "default"
        );
        assert_eq!(manager.get_material_for_object(None).name, "default");
    }
}
