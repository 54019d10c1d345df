//! Per-frame scene updates
//!
//! The ghosts are the only animated part of the scene. Their positions are
//! closed-form in elapsed time, so an update only needs the clock.

use imgui::Ui;

use crate::clock::Clock;
use crate::gfx::scene::Scene;

use super::ghosts::Ghost;

/// Something that drives a scene forward frame by frame
pub trait SceneAnimation {
    /// Advances the scene to `elapsed` seconds since start
    fn update(&mut self, elapsed: f32, scene: &mut Scene);

    /// Builds this animation's controls; called only when the overlay is on
    fn render_ui(&mut self, _ui: &Ui, _scene: &mut Scene) {}
}

/// Moves the ghost lights and eases the camera
pub struct HauntedAnimation {
    clock: Clock,
    ghosts: Vec<Ghost>,
}

impl HauntedAnimation {
    pub fn new() -> Self {
        Self {
            clock: Clock::start(),
            ghosts: Ghost::ALL.to_vec(),
        }
    }

    /// Updates the scene to the current wall-clock time
    pub fn tick(&mut self, scene: &mut Scene) {
        let elapsed = self.clock.elapsed();
        self.update(elapsed, scene);
    }
}

impl Default for HauntedAnimation {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneAnimation for HauntedAnimation {
    fn update(&mut self, elapsed: f32, scene: &mut Scene) {
        for ghost in &self.ghosts {
            match scene.point_light_mut(ghost.light_name()) {
                Some(light) => light.position = ghost.position(elapsed),
                None => log::debug!("No light named '{}' in scene", ghost.light_name()),
            }
        }

        scene.camera_manager.update();
    }

    fn render_ui(&mut self, ui: &Ui, scene: &mut Scene) {
        ui.window("Lights")
            .size([320.0, 220.0], imgui::Condition::FirstUseEver)
            .position([10.0, 10.0], imgui::Condition::FirstUseEver)
            .build(|| {
                ui.slider("Ambient intensity", 0.0, 1.0, &mut scene.ambient.intensity);

                ui.separator();
                ui.text("Moon");
                let moon = &mut scene.directional;
                ui.slider("Intensity", 0.0, 1.0, &mut moon.intensity);
                ui.slider("X", -5.0, 5.0, &mut moon.position.x);
                ui.slider("Y", -5.0, 5.0, &mut moon.position.y);
                ui.slider("Z", -5.0, 5.0, &mut moon.position.z);

                ui.separator();
                ui.text(format!("Elapsed: {:.1}s", self.clock.elapsed()));
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Srgb;
    use crate::config::CameraConfig;
    use crate::gfx::camera::CameraManager;
    use crate::gfx::scene::PointLight;
    use approx::assert_relative_eq;

    fn scene_with_ghosts() -> Scene {
        let mut scene = Scene::new(CameraManager::from_config(&CameraConfig::default(), 1.5));
        for ghost in Ghost::ALL {
            scene.add_point_light(PointLight::new(ghost.light_name(), ghost.color(), 6.0, 3.0));
        }
        scene
    }

    #[test]
    fn ghosts_follow_their_curves() {
        let mut scene = scene_with_ghosts();
        let mut animation = HauntedAnimation::new();
        animation.update(2.5, &mut scene);

        for ghost in Ghost::ALL {
            let light = scene.point_light(ghost.light_name()).unwrap();
            let expected = ghost.position(2.5);
            assert_relative_eq!(light.position.x, expected.x);
            assert_relative_eq!(light.position.y, expected.y);
            assert_relative_eq!(light.position.z, expected.z);
        }
    }

    #[test]
    fn other_lights_are_left_alone() {
        let mut scene = scene_with_ghosts();
        scene.add_point_light(
            PointLight::new("door", Srgb::new(1.0, 0.5, 0.3), 3.0, 7.0).at(0.0, 2.2, 2.7),
        );

        HauntedAnimation::new().update(10.0, &mut scene);
        let door = scene.point_light("door").unwrap();
        assert_eq!(door.position, cgmath::Vector3::new(0.0, 2.2, 2.7));
    }

    #[test]
    fn update_runs_camera_damping() {
        let mut scene = scene_with_ghosts();
        scene.camera_manager.controller.rotate(100.0, 0.0);
        let yaw_before = scene.camera_manager.camera.yaw;

        HauntedAnimation::new().update(0.0, &mut scene);
        assert!(scene.camera_manager.camera.yaw != yaw_before);
    }

    #[test]
    fn missing_ghost_lights_do_not_panic() {
        let mut scene = Scene::new(CameraManager::from_config(&CameraConfig::default(), 1.5));
        HauntedAnimation::new().update(1.0, &mut scene);
        assert!(scene.point_lights.is_empty());
    }
}
