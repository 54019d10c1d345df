use cgmath::{Matrix4, SquareMatrix, Vector3};
use wgpu::Device;

use crate::color::Srgb;
use crate::gfx::{
    camera::camera_utils::CameraManager,
    resources::{
        global_bindings::MAX_POINT_LIGHTS,
        material::{Material, MaterialBindings, MaterialId, MaterialManager},
    },
};

use super::light::{AmbientLight, DirectionalLight, Fog, PointLight};
use super::object::{Object, ObjectBindings};
use super::transform::Transform;

/// Index of a group in [`Scene::groups`]
pub type GroupId = usize;

/// A named parent transform shared by several objects and lights
#[derive(Debug, Clone)]
pub struct Group {
    pub name: String,
    pub transform: Transform,
}

/// Main scene containing objects, materials, lights and camera
pub struct Scene {
    pub camera_manager: CameraManager,
    pub objects: Vec<Object>,
    pub groups: Vec<Group>,
    pub material_manager: MaterialManager, // Centralized material storage
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    pub point_lights: Vec<PointLight>,
    pub fog: Option<Fog>,
    pub clear_color: Srgb,
}

impl Scene {
    /// Creates a new scene with the given camera manager
    pub fn new(camera_manager: CameraManager) -> Self {
        Self {
            camera_manager,
            objects: Vec::new(),
            groups: Vec::new(),
            material_manager: MaterialManager::new(), // Initialize with default material
            ambient: AmbientLight::default(),
            directional: DirectionalLight::default(),
            point_lights: Vec::new(),
            fog: None,
            clear_color: Srgb::new(0.0, 0.0, 0.0),
        }
    }

    pub fn add_group(&mut self, name: &str, transform: Transform) -> GroupId {
        self.groups.push(Group {
            name: name.to_string(),
            transform,
        });
        self.groups.len() - 1
    }

    pub fn group_id(&self, name: &str) -> Option<GroupId> {
        self.groups.iter().position(|group| group.name == name)
    }

    /// Adds an object, renaming it if the name is already taken
    pub fn add_object(&mut self, mut object: Object) -> usize {
        object.name = self.ensure_unique_name(&object.name);
        if let Some(group) = object.group {
            if group >= self.groups.len() {
                log::warn!("Object '{}' refers to unknown group {group}", object.name);
                object.group = None;
            }
        }
        self.objects.push(object);
        self.objects.len() - 1
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.material_manager.add_material(material)
    }

    pub fn add_point_light(&mut self, light: PointLight) -> usize {
        log::debug!(
            "Point light '{}' intensity {} distance {}",
            light.name,
            light.intensity,
            light.distance
        );
        if self.point_lights.len() >= MAX_POINT_LIGHTS {
            log::warn!(
                "Point light '{}' exceeds the limit of {MAX_POINT_LIGHTS} and will not be rendered",
                light.name
            );
        }
        self.point_lights.push(light);
        self.point_lights.len() - 1
    }

    pub fn set_ambient(&mut self, ambient: AmbientLight) {
        self.ambient = ambient;
    }

    pub fn set_directional(&mut self, directional: DirectionalLight) {
        self.directional = directional;
    }

    pub fn set_fog(&mut self, fog: Fog) {
        self.fog = Some(fog);
    }

    pub fn set_clear_color(&mut self, color: Srgb) {
        self.clear_color = color;
    }

    pub fn point_light_mut(&mut self, name: &str) -> Option<&mut PointLight> {
        self.point_lights.iter_mut().find(|light| light.name == name)
    }

    pub fn point_light(&self, name: &str) -> Option<&PointLight> {
        self.point_lights.iter().find(|light| light.name == name)
    }

    pub fn group_matrix(&self, group: Option<GroupId>) -> Matrix4<f32> {
        group
            .and_then(|id| self.groups.get(id))
            .map(|group| group.transform.matrix())
            .unwrap_or_else(Matrix4::identity)
    }

    pub fn object_world_matrix(&self, object: &Object) -> Matrix4<f32> {
        self.group_matrix(object.group) * object.transform.matrix()
    }

    pub fn point_light_world_position(&self, light: &PointLight) -> Vector3<f32> {
        let world = self.group_matrix(light.group) * light.position.extend(1.0);
        world.truncate()
    }

    /// Initializes GPU resources for all objects and materials
    ///
    /// Must be called after the GPU context is available and before rendering.
    pub fn init_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        object_bindings: &ObjectBindings,
        material_bindings: &MaterialBindings,
    ) {
        let worlds: Vec<_> = self.objects.iter().map(|o| self.object_world_matrix(o)).collect();
        for (object, world) in self.objects.iter_mut().zip(worlds) {
            object.init_gpu_resources(device, object_bindings, world);
        }

        self.material_manager
            .update_all_gpu_resources(device, queue, material_bindings);

        let stats = self.get_statistics();
        log::info!(
            "Scene uploaded: {} objects, {} materials, {} triangles, {} point lights",
            stats.object_count,
            stats.material_count,
            stats.total_triangles,
            stats.point_light_count
        );
    }

    /// Updates all object transforms and syncs to GPU
    pub fn update_all_transforms(&mut self, queue: &wgpu::Queue) {
        let worlds: Vec<_> = self.objects.iter().map(|o| self.object_world_matrix(o)).collect();
        for (object, world) in self.objects.iter_mut().zip(worlds) {
            object.update_transform(queue, world);
        }
    }

    /// Gets material for rendering an object
    pub fn get_material_for_object(&self, object: &Object) -> &Material {
        self.material_manager
            .get_material_for_object(object.material_id.as_ref())
    }

    pub fn get_object_by_name(&self, name: &str) -> Option<&Object> {
        self.objects.iter().find(|obj| obj.name == name)
    }

    /// Gets statistics about the scene
    pub fn get_statistics(&self) -> SceneStatistics {
        SceneStatistics {
            object_count: self.objects.len(),
            group_count: self.groups.len(),
            material_count: self.material_manager.len(),
            point_light_count: self.point_lights.len(),
            shadow_caster_count: self.objects.iter().filter(|o| o.cast_shadow).count(),
            total_triangles: self.objects.iter().map(Object::triangle_count).sum(),
        }
    }

    pub fn ensure_unique_name(&self, desired_name: &str) -> String {
        let mut counter = 0;
        let mut test_name = desired_name.to_string();

        while self.objects.iter().any(|obj| obj.name == test_name) {
            counter += 1;
            test_name = format!("{} ({})", desired_name, counter);
        }

        test_name
    }
}

/// Scene statistics for debugging and UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneStatistics {
    pub object_count: usize,
    pub group_count: usize,
    pub material_count: usize,
    pub point_light_count: usize,
    pub shadow_caster_count: usize,
    pub total_triangles: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::gfx::geometry::generate_box;
    use approx::assert_relative_eq;

    fn scene() -> Scene {
        Scene::new(CameraManager::from_config(&CameraConfig::default(), 1.5))
    }

    #[test]
    fn objects_inherit_group_transform() {
        let mut scene = scene();
        let house = scene.add_group("house", Transform::from_translation(0.0, 1.0, 0.0));
        let index = scene.add_object(
            Object::from_geometry("walls", &generate_box(4.0, 2.5, 4.0))
                .in_group(house)
                .with_transform(Transform::from_translation(0.0, 1.25, 0.0)),
        );

        let world = scene.object_world_matrix(&scene.objects[index]);
        assert_relative_eq!(world.w.y, 2.25);
    }

    #[test]
    fn unknown_group_is_dropped() {
        let mut scene = scene();
        let stray = Object::from_geometry("stray", &generate_box(1.0, 1.0, 1.0)).in_group(7);
        let index = scene.add_object(stray);
        assert_eq!(scene.objects[index].group, None);
    }

    #[test]
    fn duplicate_names_are_made_unique() {
        let mut scene = scene();
        scene.add_object(Object::from_geometry("bush", &generate_box(1.0, 1.0, 1.0)));
        let second = scene.add_object(Object::from_geometry("bush", &generate_box(1.0, 1.0, 1.0)));
        assert_eq!(scene.objects[second].name, "bush (1)");
    }

    #[test]
    fn grouped_light_world_position() {
        let mut scene = scene();
        let house = scene.add_group("house", Transform::from_translation(1.0, 0.0, 0.0));
        scene.add_point_light(
            PointLight::new("door", Srgb::new(1.0, 0.5, 0.3), 3.0, 7.0)
                .at(0.0, 2.2, 2.7)
                .in_group(house),
        );

        let light = scene.point_light("door").unwrap();
        let position = scene.point_light_world_position(light);
        assert_relative_eq!(position.x, 1.0);
        assert_relative_eq!(position.y, 2.2);
        assert_relative_eq!(position.z, 2.7);
    }

    #[test]
    fn point_lights_are_found_by_name() {
        let mut scene = scene();
        scene.add_point_light(PointLight::new("ghost1", Srgb::new(1.0, 0.0, 1.0), 6.0, 3.0));
        scene.point_light_mut("ghost1").unwrap().position = Vector3::new(4.0, 0.0, 0.0);

        assert_eq!(scene.point_light("ghost1").unwrap().position.x, 4.0);
        assert!(scene.point_light_mut("ghost9").is_none());
    }

    #[test]
    fn statistics_count_everything() {
        let mut scene = scene();
        let graves = scene.add_group("graves", Transform::default());
        for i in 0..3 {
            scene.add_object(
                Object::from_geometry(&format!("grave_{i}"), &generate_box(0.6, 0.8, 0.2))
                    .in_group(graves)
                    .casting_shadow(),
            );
        }
        scene.add_material(Material::new("grave"));

        let stats = scene.get_statistics();
        assert_eq!(stats.object_count, 3);
        assert_eq!(stats.group_count, 1);
        assert_eq!(stats.material_count, 2);
        assert_eq!(stats.shadow_caster_count, 3);
        assert_eq!(stats.total_triangles, 36);
    }
}
