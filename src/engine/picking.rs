// Ray casting against artwork hit volumes.
//
// Each artwork's hit volume is the world-space AABB of its frame. Only
// artworks currently marked visible take part, so culled artworks can never
// be hovered or selected.

use bevy_ecs::prelude::*;
use glam::Vec3;

use super::components::{Artwork, DisplaySize, Transform, Visible};
use super::corridor::{CANVAS_OFFSET, FRAME_PAD};

/// Near limit for the "look straight ahead" ray.
pub const AHEAD_RAY_NEAR: f32 = 0.1;
/// Far limit for the "look straight ahead" ray.
pub const AHEAD_RAY_FAR: f32 = 50.0;
/// Fallback selection ignores artworks more than this far behind the camera.
pub const BEHIND_TOLERANCE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center_half_extents(center: Vec3, half: Vec3) -> Self {
        Self { min: center - half, max: center + half }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit length.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction: direction.normalize_or_zero() }
    }

    /// Distance along the ray to the first point inside `aabb` (slab test).
    /// Returns 0 when the origin is already inside.
    pub fn intersect_aabb(&self, aabb: &Aabb) -> Option<f32> {
        let mut t_min = 0.0_f32;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let o = self.origin[axis];
            let d = self.direction[axis];
            let (lo, hi) = (aabb.min[axis], aabb.max[axis]);
            if d.abs() < 1e-8 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d;
            let (mut t0, mut t1) = ((lo - o) * inv, (hi - o) * inv);
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

/// World AABB of a framed artwork. Canvases hang on side walls, so the
/// canvas width runs along Z and the frame depth along X.
pub fn artwork_bounds(transform: &Transform, size: &DisplaySize) -> Aabb {
    let local_half = Vec3::new(
        (size.width + FRAME_PAD) / 2.0,
        (size.height + FRAME_PAD) / 2.0,
        CANVAS_OFFSET,
    );
    // Rotate the local extents; abs() keeps an axis-aligned box for any yaw.
    let m = glam::Mat3::from_quat(transform.rotation);
    let world_half = Vec3::new(
        m.row(0).abs().dot(local_half),
        m.row(1).abs().dot(local_half),
        m.row(2).abs().dot(local_half),
    );
    Aabb::from_center_half_extents(transform.position, world_half)
}

/// Nearest visible artwork hit by `ray` within `[near, far]`.
pub fn pick(world: &mut World, ray: &Ray, near: f32, far: f32) -> Option<Entity> {
    let mut query = world.query_filtered::<(Entity, &Transform, &DisplaySize, &Visible), With<Artwork>>();
    query
        .iter(world)
        .filter(|(_, _, _, visible)| visible.0)
        .filter_map(|(entity, transform, size, _)| {
            ray.intersect_aabb(&artwork_bounds(transform, size))
                .filter(|t| *t >= near && *t <= far)
                .map(|t| (entity, t))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(entity, _)| entity)
}

/// Keyboard "view nearest": whatever the camera looks straight at, otherwise
/// the artwork closest in Z that is not well behind the camera.
pub fn nearest_ahead(world: &mut World, eye: Vec3, forward: Vec3) -> Option<Entity> {
    if let Some(hit) = pick(world, &Ray::new(eye, forward), AHEAD_RAY_NEAR, AHEAD_RAY_FAR) {
        return Some(hit);
    }
    let mut query = world.query_filtered::<(Entity, &Transform), With<Artwork>>();
    query
        .iter(world)
        .map(|(entity, transform)| (entity, transform.position.z - eye.z))
        .filter(|(_, dz)| *dz > -BEHIND_TOLERANCE)
        .min_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
        .map(|(entity, _)| entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::components::WallSide;
    use crate::engine::corridor::wall_rotation;

    fn spawn_art(world: &mut World, index: usize, side: WallSide, z: f32, visible: bool) -> Entity {
        world
            .spawn((
                Artwork {
                    index,
                    title: format!("#{index}"),
                    artist: String::new(),
                    description: String::new(),
                    side,
                },
                Transform { position: Vec3::new(side.sign() * 2.78, 2.3, z), rotation: wall_rotation(side) },
                DisplaySize { width: 3.6, height: 2.4 },
                Visible(visible),
            ))
            .id()
    }

    #[test]
    fn slab_test_hits_and_misses() {
        let aabb = Aabb::from_center_half_extents(Vec3::new(0.0, 0.0, -5.0), Vec3::ONE);
        let hit = Ray::new(Vec3::ZERO, Vec3::NEG_Z).intersect_aabb(&aabb);
        assert!((hit.unwrap() - 4.0).abs() < 1e-5);
        assert!(Ray::new(Vec3::ZERO, Vec3::Z).intersect_aabb(&aabb).is_none());
        assert!(Ray::new(Vec3::new(3.0, 0.0, 0.0), Vec3::NEG_Z).intersect_aabb(&aabb).is_none());
    }

    #[test]
    fn side_wall_bounds_run_along_z() {
        let t = Transform { position: Vec3::new(2.78, 2.3, 0.0), rotation: wall_rotation(WallSide::Right) };
        let b = artwork_bounds(&t, &DisplaySize { width: 3.6, height: 2.4 });
        assert!((b.max.z - b.min.z - 3.8).abs() < 1e-4);
        assert!((b.max.x - b.min.x - 2.0 * CANVAS_OFFSET).abs() < 1e-4);
        assert!((b.center() - t.position).length() < 1e-5);
    }

    #[test]
    fn pick_returns_nearest_visible_hit() {
        let mut world = World::new();
        let near = spawn_art(&mut world, 0, WallSide::Right, -5.0, true);
        let _far = spawn_art(&mut world, 2, WallSide::Right, -10.0, true);
        // Ray from the left side of the corridor sweeping toward the right wall
        let ray = Ray::new(Vec3::new(-2.0, 2.3, 0.0), Vec3::new(4.78, 0.0, -5.0));
        assert_eq!(pick(&mut world, &ray, 0.0, 100.0), Some(near));
    }

    #[test]
    fn invisible_artworks_cannot_be_picked() {
        let mut world = World::new();
        spawn_art(&mut world, 0, WallSide::Right, -5.0, false);
        let ray = Ray::new(Vec3::new(-2.0, 2.3, -5.0), Vec3::X);
        assert_eq!(pick(&mut world, &ray, 0.0, 100.0), None);
    }

    #[test]
    fn nearest_ahead_falls_back_to_closest_z() {
        let mut world = World::new();
        let _behind = spawn_art(&mut world, 0, WallSide::Right, 7.0, true);
        let slightly_behind = spawn_art(&mut world, 1, WallSide::Left, 1.5, true);
        let _ahead = spawn_art(&mut world, 2, WallSide::Right, -6.0, true);
        // Looking straight down the corridor: the ray hits nothing.
        let eye = Vec3::new(0.0, 2.0, 3.0);
        assert_eq!(nearest_ahead(&mut world, eye, Vec3::NEG_Z), Some(slightly_behind));
    }

    #[test]
    fn nearest_ahead_prefers_what_the_camera_faces() {
        let mut world = World::new();
        let faced = spawn_art(&mut world, 0, WallSide::Right, -20.0, true);
        let _close = spawn_art(&mut world, 1, WallSide::Left, 0.0, true);
        let eye = Vec3::new(0.0, 2.3, -20.0);
        assert_eq!(nearest_ahead(&mut world, eye, Vec3::X), Some(faced));
    }
}
