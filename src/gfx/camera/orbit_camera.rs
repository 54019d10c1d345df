use super::camera_utils::{convert_matrix4_to_array, Camera, CameraUniform};
use crate::config::CameraConfig;
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Y-up camera orbiting `target` on a sphere of radius `distance`
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub bounds: OrbitCameraBounds,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera for OrbitCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }
}

impl OrbitCamera {
    pub fn new(distance: f32, pitch: f32, yaw: f32, target: Vector3<f32>, aspect: f32) -> Self {
        let mut camera = Self {
            distance,
            pitch,
            yaw,
            eye: Vector3::zero(), // Will be auto-calculated in `update()` nevertheless.
            target,
            up: Vector3::unit_y(),
            bounds: OrbitCameraBounds::default(),
            aspect,
            fovy: Deg(75.0).into(),
            znear: 0.1,
            zfar: 100.0,
        };
        camera.update();
        camera
    }

    /// Places the camera at `eye` looking at `target`
    pub fn from_position(eye: Vector3<f32>, target: Vector3<f32>, aspect: f32) -> Self {
        let offset = eye - target;
        let distance = offset.magnitude();
        if distance <= f32::EPSILON {
            return Self::new(1.0, 0.0, 0.0, target, aspect);
        }

        let pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();
        let yaw = offset.x.atan2(offset.z);
        Self::new(distance, pitch, yaw, target, aspect)
    }

    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        let mut camera =
            Self::from_position(config.position.into(), config.target.into(), aspect);
        camera.fovy = Deg(config.fov_degrees).into();
        camera.znear = config.near;
        camera.zfar = config.far;
        camera
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.clamp(
            self.bounds.min_distance.unwrap_or(f32::EPSILON),
            self.bounds.max_distance.unwrap_or(f32::MAX),
        );
        self.update();
    }

    /// Multiplies the orbit radius, as a dolly in or out
    pub fn scale_distance(&mut self, factor: f32) {
        self.set_distance(self.distance * factor);
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(self.bounds.min_pitch, self.bounds.max_pitch);
        self.update();
    }

    pub fn add_pitch(&mut self, delta: f32) {
        self.set_pitch(self.pitch + delta);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        let mut bounded_yaw = yaw;
        if let Some(min_yaw) = self.bounds.min_yaw {
            bounded_yaw = bounded_yaw.max(min_yaw);
        }
        if let Some(max_yaw) = self.bounds.max_yaw {
            bounded_yaw = bounded_yaw.min(max_yaw);
        }
        self.yaw = bounded_yaw;
        self.update();
    }

    pub fn add_yaw(&mut self, delta: f32) {
        self.set_yaw(self.yaw + delta);
    }

    /// Camera right and up axes in world space
    pub fn screen_axes(&self) -> (Vector3<f32>, Vector3<f32>) {
        let forward = (self.target - self.eye).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward).normalize();
        (right, up)
    }

    /// Moves the focus point (and with it the eye) by a world-space offset
    pub fn translate_target(&mut self, offset: Vector3<f32>) {
        self.target += offset;
        self.update();
    }

    /// Updates the camera after changing `distance`, `pitch`, `yaw` or `target`.
    fn update(&mut self) {
        self.eye =
            calculate_cartesian_eye_position(self.pitch, self.yaw, self.distance, self.target);
    }

    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(Point3::from_vec(self.eye), Point3::from_vec(self.target), self.up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view_position: [self.eye.x, self.eye.y, self.eye.z, 1.0],
            view_proj: convert_matrix4_to_array(self.build_view_projection_matrix()),
            view: convert_matrix4_to_array(self.view_matrix()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitCameraBounds {
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub min_yaw: Option<f32>,
    pub max_yaw: Option<f32>,
}

impl Default for OrbitCameraBounds {
    fn default() -> Self {
        Self {
            min_distance: None,
            max_distance: None,
            min_pitch: -std::f32::consts::FRAC_PI_2 + 1e-3,
            max_pitch: std::f32::consts::FRAC_PI_2 - 1e-3,
            min_yaw: None,
            max_yaw: None,
        }
    }
}

fn calculate_cartesian_eye_position(
    pitch: f32,
    yaw: f32,
    distance: f32,
    target: Vector3<f32>,
) -> Vector3<f32> {
    Vector3::new(
        distance * yaw.sin() * pitch.cos(),
        distance * pitch.sin(),
        distance * yaw.cos() * pitch.cos(),
    ) + target
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn from_position_round_trips_the_eye() {
        let camera = OrbitCamera::from_position(Vector3::new(4.0, 2.0, 5.0), Vector3::zero(), 1.5);
        assert_relative_eq!(camera.distance, 45f32.sqrt(), epsilon = 1e-5);
        assert_relative_eq!(camera.eye.x, 4.0, epsilon = 1e-4);
        assert_relative_eq!(camera.eye.y, 2.0, epsilon = 1e-4);
        assert_relative_eq!(camera.eye.z, 5.0, epsilon = 1e-4);
    }

    #[test]
    fn config_sets_projection() {
        let camera = OrbitCamera::from_config(&CameraConfig::default(), 1.5);
        assert_relative_eq!(Deg::from(camera.fovy).0, 75.0, epsilon = 1e-4);
        assert_eq!(camera.znear, 0.1);
        assert_eq!(camera.zfar, 100.0);
        assert_eq!(camera.up, Vector3::unit_y());
    }

    #[test]
    fn resize_updates_aspect_and_ignores_zero() {
        let mut camera =
            OrbitCamera::from_position(Vector3::new(0.0, 0.0, 5.0), Vector3::zero(), 1.0);
        camera.resize_projection(1200, 800);
        assert_relative_eq!(camera.aspect, 1.5);
        camera.resize_projection(0, 800);
        assert_relative_eq!(camera.aspect, 1.5);
    }

    #[test]
    fn pitch_is_clamped_below_the_pole() {
        let mut camera =
            OrbitCamera::from_position(Vector3::new(0.0, 0.0, 5.0), Vector3::zero(), 1.0);
        camera.add_pitch(10.0);
        assert!(camera.pitch < std::f32::consts::FRAC_PI_2);
        assert!(camera.eye.y < 5.0);
    }

    #[test]
    fn translating_target_keeps_the_offset() {
        let mut camera =
            OrbitCamera::from_position(Vector3::new(4.0, 2.0, 5.0), Vector3::zero(), 1.0);
        camera.translate_target(Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(camera.eye.x, 5.0, epsilon = 1e-4);
        assert_relative_eq!(camera.target.x, 1.0);
    }

    #[test]
    fn origin_projects_to_screen_centre() {
        let camera = OrbitCamera::from_position(Vector3::new(4.0, 2.0, 5.0), Vector3::zero(), 1.5);
        let clip = camera.build_view_projection_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-5);
        let depth = clip.z / clip.w;
        assert!((0.0..1.0).contains(&depth));
    }

    fn looking_down_negative_z() -> OrbitCamera {
        OrbitCamera::from_position(Vector3::new(0.0, 0.0, 5.0), Vector3::zero(), 1.5)
    }

    fn project(camera: &OrbitCamera, point: Vector3<f32>) -> Vector3<f32> {
        let clip = camera.build_view_projection_matrix() * point.extend(1.0);
        clip.truncate() / clip.w
    }

    #[test]
    fn frustum_top_edge_maps_to_ndc_top() {
        let camera = looking_down_negative_z();
        let half_fov = Rad::from(Deg(37.5f32)).0;
        for depth in [1.0f32, 5.0, 50.0] {
            let edge = Vector3::new(0.0, depth * half_fov.tan(), 5.0 - depth);
            let ndc = project(&camera, edge);
            assert_relative_eq!(ndc.y, 1.0, epsilon = 1e-4);
            assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn near_and_far_planes_map_to_zero_and_one() {
        let camera = looking_down_negative_z();
        let near = project(&camera, Vector3::new(0.0, 0.0, 5.0 - camera.znear));
        let far = project(&camera, Vector3::new(0.0, 0.0, 5.0 - camera.zfar));
        assert_relative_eq!(near.z, 0.0, epsilon = 1e-5);
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn wgpu_correction_remaps_depth_only() {
        let near = OPENGL_TO_WGPU_MATRIX * Vector4::new(0.3, -0.2, -1.0, 1.0);
        assert_eq!(near, Vector4::new(0.3, -0.2, 0.0, 1.0));
        let far = OPENGL_TO_WGPU_MATRIX * Vector4::new(0.0, 0.0, 1.0, 1.0);
        assert_eq!(far, Vector4::new(0.0, 0.0, 1.0, 1.0));
    }
}
