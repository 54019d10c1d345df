use cgmath::Matrix4;
use wgpu::{util::DeviceExt, Device};

use super::scene::GroupId;
use super::transform::{normal_matrix, Transform};
use super::vertex::Vertex3D;
use crate::gfx::geometry::GeometryData;
use crate::gfx::resources::material::MaterialId;
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex3D>, indices: Vec<u32>) -> Self {
        let index_count = indices.len() as u32;
        Self {
            vertices,
            indices,
            vertex_buffer: None,
            index_buffer: None,
            index_count,
        }
    }

    pub fn from_geometry(geometry: &GeometryData) -> Self {
        let (vertices, indices) = geometry.to_scene_format();
        Self::new(vertices, indices)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn init_gpu_resources(&mut self, device: &Device, label: &str) {
        self.vertex_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.index_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }
}

/// Per-object uniform: world matrix, normal matrix and shading flags
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    /// receive_shadow, unused x3
    pub flags: [u32; 4],
}

impl ObjectUniform {
    pub fn new(world: Matrix4<f32>, receive_shadow: bool) -> Self {
        Self {
            model: world.into(),
            normal: normal_matrix(&world).into(),
            flags: [receive_shadow as u32, 0, 0, 0],
        }
    }
}

type ObjectUBO = UniformBuffer<ObjectUniform>;

/// Bind group layout shared by every object (group 1 in all pipelines)
pub struct ObjectBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
}

impl ObjectBindings {
    pub fn new(device: &Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Object Bind Group Layout");

        Self { bind_group_layout }
    }

    pub fn create_bind_group(
        &self,
        device: &Device,
        ubo: &ObjectUBO,
        label: &str,
    ) -> wgpu::BindGroup {
        BindGroupBuilder::new(&self.bind_group_layout)
            .resource(ubo.binding_resource())
            .create(device, label)
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }
}

// GPU resources struct to hold the uniform buffer and bind group
pub struct ObjectGpuResources {
    pub ubo: ObjectUBO,
    pub bind_group: wgpu::BindGroup,
}

pub struct Object {
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub transform: Transform,
    pub group: Option<GroupId>,
    pub material_id: Option<MaterialId>,
    pub visible: bool,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub gpu_resources: Option<ObjectGpuResources>, // None until init_gpu_resources called
}

impl Object {
    /// Create a new Object with identity transformation
    pub fn new(name: &str, meshes: Vec<Mesh>) -> Self {
        Self {
            name: name.to_string(),
            meshes,
            transform: Transform::default(),
            group: None,
            material_id: None,
            visible: true,
            cast_shadow: false,
            receive_shadow: false,
            gpu_resources: None,
        }
    }

    pub fn from_geometry(name: &str, geometry: &GeometryData) -> Self {
        Self::new(name, vec![Mesh::from_geometry(geometry)])
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn in_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    pub fn with_material(mut self, material_id: impl Into<MaterialId>) -> Self {
        self.material_id = Some(material_id.into());
        self
    }

    pub fn casting_shadow(mut self) -> Self {
        self.cast_shadow = true;
        self
    }

    pub fn receiving_shadow(mut self) -> Self {
        self.receive_shadow = true;
        self
    }

    /// Upload the world matrix to the GPU if resources exist
    pub fn update_transform(&mut self, queue: &wgpu::Queue, world: Matrix4<f32>) {
        let uniform = ObjectUniform::new(world, self.receive_shadow);
        if let Some(gpu_resources) = &mut self.gpu_resources {
            gpu_resources.ubo.update_content(queue, uniform);
        }
    }

    /// Get the object bind group for rendering
    pub fn get_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu_resources.as_ref().map(|res| &res.bind_group)
    }

    pub fn init_gpu_resources(
        &mut self,
        device: &Device,
        bindings: &ObjectBindings,
        world: Matrix4<f32>,
    ) {
        for mesh in &mut self.meshes {
            mesh.init_gpu_resources(device, &self.name);
        }

        let ubo = ObjectUBO::new_with_data(device, &ObjectUniform::new(world, self.receive_shadow));
        let label = format!("Object Bind Group: {}", self.name);
        let bind_group = bindings.create_bind_group(device, &ubo, &label);

        log::debug!(
            "Object '{}' uploaded: {} mesh(es), {} triangles",
            self.name,
            self.meshes.len(),
            self.triangle_count()
        );

        self.gpu_resources = Some(ObjectGpuResources { ubo, bind_group });
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.index_count as usize / 3).sum()
    }
}

pub trait DrawObject<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
    fn draw_object(&mut self, object: &'a Object);
}

impl<'a, 'b> DrawObject<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        let (Some(vertex_buffer), Some(index_buffer)) = (&mesh.vertex_buffer, &mesh.index_buffer)
        else {
            return; // Skip drawing if not uploaded
        };

        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, 0..1);
    }

    fn draw_object(&mut self, object: &'b Object) {
        for mesh in &object.meshes {
            self.draw_mesh(mesh);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_box;
    use cgmath::{SquareMatrix, Vector3};

    #[test]
    fn mesh_from_box_geometry() {
        let mesh = Mesh::from_geometry(&generate_box(0.6, 0.8, 0.2));
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.index_count(), 36);
    }

    #[test]
    fn builder_sets_shadow_flags() {
        let grave = Object::from_geometry("grave", &generate_box(0.6, 0.8, 0.2))
            .in_group(1)
            .with_material("grave")
            .casting_shadow();

        assert!(grave.cast_shadow);
        assert!(!grave.receive_shadow);
        assert_eq!(grave.group, Some(1));
        assert_eq!(grave.material_id.as_deref(), Some("grave"));
        assert_eq!(grave.triangle_count(), 12);
    }

    #[test]
    fn object_uniform_carries_receive_flag() {
        let world = Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0));
        let uniform = ObjectUniform::new(world, true);
        assert_eq!(uniform.flags[0], 1);
        assert_eq!(uniform.model[3], [1.0, 2.0, 3.0, 1.0]);

        let identity: [[f32; 4]; 4] = Matrix4::<f32>::identity().into();
        assert_eq!(uniform.normal, identity);
    }
}
