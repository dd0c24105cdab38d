// First-person gallery camera.
//
// Camera model:
//   - A position and an orientation quaternion (camera looks down its local -Z)
//   - A desired look-at point chosen by the navigation controller every tick
//   - A smoothed look-at point that chases the desired one
//   - Orientation slerps toward "looking at the smoothed point"
//
// The camera never moves itself; navigation.rs owns every write to position.

use glam::{Mat3, Mat4, Quat, Vec2, Vec3};

use super::picking::Ray;

pub struct CameraState {
    pub position: Vec3,
    pub orientation: Quat,

    /// Smoothed point the camera is turning toward.
    look_at: Vec3,
    /// Point the controller wants to look at this tick.
    look_at_desired: Vec3,

    /// Vertical field of view in radians
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl CameraState {
    pub fn new(position: Vec3, look_at: Vec3, fov: f32) -> Self {
        let mut camera = Self {
            position,
            orientation: Quat::IDENTITY,
            look_at,
            look_at_desired: look_at,
            fov,
            near: 0.1,
            far: 1000.0,
        };
        camera.face(look_at);
        camera
    }

    /// Unit vector the camera is looking along.
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    #[cfg(test)]
    pub fn look_at(&self) -> Vec3 {
        self.look_at
    }

    #[cfg(test)]
    pub fn look_at_desired(&self) -> Vec3 {
        self.look_at_desired
    }

    pub fn set_look_desired(&mut self, target: Vec3) {
        self.look_at_desired = target;
    }

    /// Pin both the smoothed and desired look-at to `target`.
    pub fn snap_look(&mut self, target: Vec3) {
        self.look_at = target;
        self.look_at_desired = target;
    }

    /// Turn instantly to look at `target`.
    pub fn face(&mut self, target: Vec3) {
        if let Some(q) = look_rotation(self.position, target) {
            self.orientation = q;
        }
    }

    /// One tick of look smoothing: blend the look-at point toward the desired
    /// one, then slerp the orientation toward it.
    pub fn smooth_look(&mut self, blend: f32, slerp: f32) {
        self.look_at = self.look_at.lerp(self.look_at_desired, blend.clamp(0.0, 1.0));
        if let Some(q) = look_rotation(self.position, self.look_at) {
            self.orientation = self.orientation.slerp(q, slerp.clamp(0.0, 1.0)).normalize();
        }
    }

    /// View matrix: inverse of the camera's world transform.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position).inverse()
    }

    /// Perspective projection matrix.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect.max(1e-3), self.near, self.far)
    }

    /// Combined view-projection matrix ready to upload to the GPU.
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Ray from the eye through a pointer position given in window pixels
    /// (origin top-left).
    pub fn screen_ray(&self, pointer: Vec2, viewport: Vec2) -> Ray {
        let ndc = Vec2::new(
            pointer.x / viewport.x.max(1.0) * 2.0 - 1.0,
            1.0 - pointer.y / viewport.y.max(1.0) * 2.0,
        );
        let inv = self.view_projection(viewport.x.max(1.0) / viewport.y.max(1.0)).inverse();
        // wgpu clip space: depth 0 at the near plane
        let near = inv.project_point3(ndc.extend(0.0));
        let far = inv.project_point3(ndc.extend(1.0));
        Ray::new(self.position, (far - near).normalize_or(self.forward()))
    }
}

/// Orientation of a camera at `eye` looking at `target` with +Y up.
/// `None` when the direction is degenerate (target on the eye or straight up/down).
pub fn look_rotation(eye: Vec3, target: Vec3) -> Option<Quat> {
    let forward = (target - eye).try_normalize()?;
    let right = forward.cross(Vec3::Y).try_normalize()?;
    let up = right.cross(forward);
    Some(Quat::from_mat3(&Mat3::from_cols(right, up, -forward)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn new_camera_faces_its_target() {
        let cam = CameraState::new(Vec3::new(0.0, 2.0, 10.0), Vec3::new(0.0, 2.0, 0.0), 1.3);
        assert!(close(cam.forward(), Vec3::NEG_Z));
    }

    #[test]
    fn look_rotation_handles_sideways_and_degenerate() {
        let q = look_rotation(Vec3::ZERO, Vec3::X).unwrap();
        assert!(close(q * Vec3::NEG_Z, Vec3::X));
        assert!(close(q * Vec3::Y, Vec3::Y));
        assert!(look_rotation(Vec3::ZERO, Vec3::ZERO).is_none());
        assert!(look_rotation(Vec3::ZERO, Vec3::Y).is_none());
    }

    #[test]
    fn smoothing_converges_without_snapping() {
        let mut cam = CameraState::new(Vec3::ZERO, Vec3::NEG_Z, 1.3);
        cam.set_look_desired(Vec3::new(10.0, 0.0, 0.0));
        cam.smooth_look(0.3, 0.25);
        let after_one = cam.forward();
        assert!(!close(after_one, Vec3::NEG_Z));
        assert!(!close(after_one, Vec3::X));
        for _ in 0..200 {
            cam.smooth_look(0.3, 0.25);
        }
        assert!(close(cam.forward(), Vec3::X));
    }

    #[test]
    fn centre_of_screen_ray_points_forward() {
        let cam = CameraState::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(0.0, 2.0, -5.0), 1.3);
        let ray = cam.screen_ray(Vec2::new(640.0, 360.0), Vec2::new(1280.0, 720.0));
        assert!(close(ray.direction, Vec3::NEG_Z));
        // Pointer on the right half of the screen aims to the right.
        let right = cam.screen_ray(Vec2::new(1200.0, 360.0), Vec2::new(1280.0, 720.0));
        assert!(right.direction.x > 0.0);
    }
}
