//! The haunted house scene
//!
//! [`build_scene`] lays out everything once: a textured house with a door
//! light and bushes, a ring of randomly placed graves, a grass floor, a
//! moonlit sky and three ghost lights. Afterwards only the ghosts (see
//! [`animation`]) and the camera move.

pub mod animation;
pub mod ghosts;
pub mod graves;

use std::f32::consts::PI;

use rand::Rng;

use crate::color::parse_hex;
use crate::config::SceneConfig;
use crate::error::Result;
use crate::gfx::{
    geometry::{generate_box, generate_cone, generate_plane, generate_sphere},
    resources::{
        material::{MapSlot, Material},
        texture_loader::{TextureImage, TextureLoader, TextureSampling},
    },
    scene::{AmbientLight, DirectionalLight, Fog, Object, PointLight, Scene, Transform},
};

pub use animation::{HauntedAnimation, SceneAnimation};
pub use ghosts::{Ghost, GHOST_DISTANCE, GHOST_INTENSITY};
pub use graves::{generate_graves, GraveBand, GravePlacement};

pub const FOG_COLOR: &str = "#262827";
pub const FOG_NEAR: f32 = 1.0;
pub const FOG_FAR: f32 = 15.0;

pub const ROOF_COLOR: &str = "#b35f45";
pub const BUSH_COLOR: &str = "#89c854";
pub const GRAVE_COLOR: &str = "#b2b6b1";
pub const DOOR_LIGHT_COLOR: &str = "#ff7d46";
pub const MOON_COLOR: &str = "#b0d5ff";

pub const AMBIENT_INTENSITY: f32 = 0.12;
pub const MOON_INTENSITY: f32 = 0.26;

/// Shadow resolution and far plane shared by every point light
pub const POINT_SHADOW_SIZE: u32 = 256;
pub const POINT_SHADOW_FAR: f32 = 7.0;

const WALL_HEIGHT: f32 = 2.5;
const ROOF_HEIGHT: f32 = 1.0;

/// Bush placements as (position, uniform scale, casts shadow)
const BUSHES: [([f32; 3], f32, bool); 4] = [
    ([0.8, 0.2, 2.2], 0.5, true),
    ([1.4, 0.1, 2.1], 0.25, true),
    ([-0.8, 0.1, 2.2], 0.4, true),
    ([-1.0, 0.05, 2.6], 0.15, false),
];

fn load_map(loader: &TextureLoader, set: &str, file: &str, slot: MapSlot) -> TextureImage {
    loader.load_or_placeholder(&format!("{set}/{file}.jpg"), slot.color_space(), slot.placeholder())
}

fn door_material(loader: &TextureLoader) -> Material {
    let map = |file, slot| load_map(loader, "door", file, slot);
    Material::new("door")
        .with_map(MapSlot::Color, map("color", MapSlot::Color))
        .with_map(MapSlot::Alpha, map("alpha", MapSlot::Alpha))
        .with_map(MapSlot::AmbientOcclusion, map("ambientOcclusion", MapSlot::AmbientOcclusion))
        .with_displacement(map("height", MapSlot::Displacement), 0.1)
        .with_map(MapSlot::Normal, map("normal", MapSlot::Normal))
        .with_map(MapSlot::Metalness, map("metalness", MapSlot::Metalness))
        .with_map(MapSlot::Roughness, map("roughness", MapSlot::Roughness))
        .with_transparency(true)
}

/// Colour, AO, normal and roughness maps from one texture set
fn surface_material(loader: &TextureLoader, name: &str, set: &str) -> Material {
    let map = |file, slot| load_map(loader, set, file, slot);
    Material::new(name)
        .with_map(MapSlot::Color, map("color", MapSlot::Color))
        .with_map(MapSlot::AmbientOcclusion, map("ambientOcclusion", MapSlot::AmbientOcclusion))
        .with_map(MapSlot::Normal, map("normal", MapSlot::Normal))
        .with_map(MapSlot::Roughness, map("roughness", MapSlot::Roughness))
}

/// Populates `scene` with the haunted house
///
/// Textures that fail to load are replaced by neutral placeholders, so this
/// only fails on malformed colour constants.
pub fn build_scene<R: Rng + ?Sized>(
    scene: &mut Scene,
    config: &SceneConfig,
    loader: &TextureLoader,
    rng: &mut R,
) -> Result<()> {
    let fog_color = parse_hex(FOG_COLOR)?;
    scene.set_fog(Fog {
        color: fog_color,
        near: FOG_NEAR,
        far: FOG_FAR,
    });
    scene.set_clear_color(fog_color);

    let door = scene.add_material(door_material(loader));
    let bricks = scene.add_material(surface_material(loader, "bricks", "bricks"));
    let grass = scene.add_material(
        surface_material(loader, "grass", "grass")
            .with_sampling(TextureSampling::repeating(8.0, 8.0)),
    );
    let roof = scene.add_material(Material::new("roof").with_color(parse_hex(ROOF_COLOR)?));
    let bush = scene.add_material(Material::new("bush").with_color(parse_hex(BUSH_COLOR)?));
    let grave = scene.add_material(Material::new("grave").with_color(parse_hex(GRAVE_COLOR)?));

    // House
    let house = scene.add_group("house", Transform::default());

    scene.add_object(
        Object::from_geometry("walls", &generate_box(4.0, WALL_HEIGHT, 4.0))
            .with_transform(Transform::from_translation(0.0, WALL_HEIGHT / 2.0, 0.0))
            .in_group(house)
            .with_material(bricks)
            .casting_shadow(),
    );

    scene.add_object(
        Object::from_geometry("roof", &generate_cone(3.5, ROOF_HEIGHT, 4))
            .with_transform(
                Transform::from_translation(0.0, WALL_HEIGHT + ROOF_HEIGHT / 2.0, 0.0)
                    .with_rotation(0.0, PI * 0.25, 0.0),
            )
            .in_group(house)
            .with_material(roof),
    );

    scene.add_object(
        Object::from_geometry("door", &generate_plane(2.2, 2.2, 100, 100))
            .with_transform(Transform::from_translation(0.0, 1.0, 2.0 + 0.01))
            .in_group(house)
            .with_material(door),
    );

    let bush_geometry = generate_sphere(1.0, 16, 16);
    for (i, ([x, y, z], scale, casts)) in BUSHES.into_iter().enumerate() {
        let mut object = Object::from_geometry(&format!("bush{}", i + 1), &bush_geometry)
            .with_transform(Transform::from_translation(x, y, z).with_uniform_scale(scale))
            .in_group(house)
            .with_material(bush.clone());
        if casts {
            object = object.casting_shadow();
        }
        scene.add_object(object);
    }

    scene.add_point_light(
        PointLight::new("door", parse_hex(DOOR_LIGHT_COLOR)?, 3.0, 7.0)
            .at(0.0, 2.2, 2.7)
            .in_group(house)
            .with_shadow(POINT_SHADOW_SIZE, POINT_SHADOW_FAR),
    );

    // Graves
    let graves_group = scene.add_group("graves", Transform::default());
    let grave_geometry = generate_box(0.6, 0.8, 0.2);
    let placements = generate_graves(
        rng,
        config.graves.count,
        GraveBand::from(&config.graves),
        config.graves.jitter,
    );
    for (i, placement) in placements.iter().enumerate() {
        let p = placement.position;
        scene.add_object(
            Object::from_geometry(&format!("grave{i}"), &grave_geometry)
                .with_transform(
                    Transform::from_translation(p.x, p.y, p.z).with_rotation(
                        0.0,
                        placement.rotation_y,
                        placement.rotation_z,
                    ),
                )
                .in_group(graves_group)
                .with_material(grave.clone())
                .casting_shadow(),
        );
    }
    log::debug!("Placed {} graves", placements.len());

    // Floor
    scene.add_object(
        Object::from_geometry("floor", &generate_plane(20.0, 20.0, 1, 1))
            .with_transform(Transform::default().with_rotation(-PI * 0.5, 0.0, 0.0))
            .with_material(grass)
            .receiving_shadow(),
    );

    // Lights
    let moon_color = parse_hex(MOON_COLOR)?;
    scene.set_ambient(AmbientLight {
        color: moon_color,
        intensity: AMBIENT_INTENSITY,
    });
    scene.set_directional(DirectionalLight {
        color: moon_color,
        intensity: MOON_INTENSITY,
        position: cgmath::Vector3::new(4.0, 5.0, -2.0),
        cast_shadow: true,
        ..DirectionalLight::default()
    });

    for ghost in Ghost::ALL {
        let start = ghost.position(0.0);
        scene.add_point_light(
            PointLight::new(ghost.light_name(), ghost.color(), GHOST_INTENSITY, GHOST_DISTANCE)
                .at(start.x, start.y, start.z)
                .with_shadow(POINT_SHADOW_SIZE, POINT_SHADOW_FAR),
        );
    }

    let stats = scene.get_statistics();
    log::info!(
        "Haunted house built: {} objects ({} cast shadows), {} point lights",
        stats.object_count,
        stats.shadow_caster_count,
        stats.point_light_count
    );
    Ok(())
}
