// Distance culling and texture LOD.
//
// Both passes look only at Z distance to the camera: the corridor is narrow,
// so X/Y offsets never matter. Thresholds have no hysteresis; an object
// sitting exactly on a boundary can flip back and forth under float noise.

use bevy_ecs::prelude::*;
use std::collections::HashMap;

use super::components::{Artwork, Canvas, FillLightOf, Light, LightKind, LodTier, Transform, Visible};

#[derive(Debug, Clone, Copy)]
pub struct CullParams {
    pub activation_radius: f32,
    pub point_light_radius_bonus: f32,
}

/// Within `radius` (inclusive) along Z.
pub fn within(z: f32, camera_z: f32, radius: f32) -> bool {
    (z - camera_z).abs() <= radius
}

pub fn lod_for_distance(distance: f32, high_distance: f32) -> LodTier {
    if distance < high_distance { LodTier::High } else { LodTier::Low }
}

/// Show or hide artworks and lights by Z distance. Returns how many
/// artworks are visible.
pub fn cull(world: &mut World, camera_z: f32, params: &CullParams) -> usize {
    let mut artwork_visibility = HashMap::new();
    let mut artworks = world.query_filtered::<(Entity, &Transform, &mut Visible), With<Artwork>>();
    for (entity, transform, mut visible) in artworks.iter_mut(world) {
        let vis = within(transform.position.z, camera_z, params.activation_radius);
        if visible.0 != vis {
            visible.0 = vis;
        }
        artwork_visibility.insert(entity, vis);
    }

    let mut lights = world.query::<(&Transform, &Light, Option<&FillLightOf>, &mut Visible)>();
    for (transform, light, owner, mut visible) in lights.iter_mut(world) {
        let vis = match (light.kind, owner) {
            (LightKind::Fill, Some(owner)) => artwork_visibility.get(&owner.0).copied().unwrap_or(false),
            (LightKind::Point, _) => within(
                transform.position.z,
                camera_z,
                params.activation_radius + params.point_light_radius_bonus,
            ),
            _ => within(transform.position.z, camera_z, params.activation_radius),
        };
        if visible.0 != vis {
            visible.0 = vis;
        }
    }

    artwork_visibility.values().filter(|v| **v).count()
}

/// Switch procedural canvases between their low and high textures.
/// Culled artworks keep whatever tier they had; image canvases never change.
pub fn update_lod(world: &mut World, camera_z: f32, high_distance: f32) {
    let mut query = world.query_filtered::<(&Transform, &Visible, &mut Canvas), With<Artwork>>();
    for (transform, visible, mut canvas) in query.iter_mut(world) {
        if !visible.0 {
            continue;
        }
        let desired = lod_for_distance((transform.position.z - camera_z).abs(), high_distance);
        if canvas.tier().is_some_and(|tier| tier != desired) {
            if let Canvas::Procedural { tier, .. } = &mut *canvas {
                *tier = desired;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::components::{Color, DisplaySize, ImageState, WallSide};
    use glam::Vec3;
    use image::RgbaImage;
    use std::sync::Arc;

    const PARAMS: CullParams = CullParams { activation_radius: 24.0, point_light_radius_bonus: 6.0 };

    fn artwork(index: usize) -> Artwork {
        Artwork {
            index,
            title: String::new(),
            artist: String::new(),
            description: String::new(),
            side: WallSide::for_index(index),
        }
    }

    fn procedural() -> Canvas {
        Canvas::Procedural {
            low: Arc::new(RgbaImage::new(1, 1)),
            high: Arc::new(RgbaImage::new(2, 2)),
            tier: LodTier::Low,
        }
    }

    fn spawn(world: &mut World, index: usize, z: f32, canvas: Canvas) -> Entity {
        world
            .spawn((
                artwork(index),
                Transform::from_position(Vec3::new(2.78, 2.3, z)),
                DisplaySize { width: 1.0, height: 1.0 },
                Visible(true),
                canvas,
            ))
            .id()
    }

    fn light(world: &mut World, kind: LightKind, z: f32, owner: Option<Entity>) -> Entity {
        let mut e = world.spawn((
            Transform::from_position(Vec3::new(0.0, 7.0, z)),
            Light { kind, color: Color::WHITE, intensity: 1.0, range: 10.0 },
            Visible(true),
        ));
        if let Some(owner) = owner {
            e.insert(FillLightOf(owner));
        }
        e.id()
    }

    fn tier(world: &World, e: Entity) -> Option<LodTier> {
        world.get::<Canvas>(e).and_then(Canvas::tier)
    }

    fn visible(world: &World, e: Entity) -> bool {
        world.get::<Visible>(e).is_some_and(|v| v.0)
    }

    #[test]
    fn lod_switches_around_the_threshold() {
        let eps = 1e-3;
        assert_eq!(lod_for_distance(15.0 - eps, 15.0), LodTier::High);
        assert_eq!(lod_for_distance(15.0 + eps, 15.0), LodTier::Low);

        let mut world = World::new();
        let near = spawn(&mut world, 0, -(15.0 - eps), procedural());
        let far = spawn(&mut world, 1, 15.0 + eps, procedural());
        update_lod(&mut world, 0.0, 15.0);
        assert_eq!(tier(&world, near), Some(LodTier::High));
        assert_eq!(tier(&world, far), Some(LodTier::Low));

        // Walking away drops it back.
        update_lod(&mut world, 20.0, 15.0);
        assert_eq!(tier(&world, near), Some(LodTier::Low));
    }

    #[test]
    fn image_canvases_have_a_single_tier() {
        let mut world = World::new();
        let img = Canvas::Image { source: "a.png".into(), state: ImageState::Ready(Arc::new(RgbaImage::new(1, 1))) };
        let e = spawn(&mut world, 0, 0.0, img);
        update_lod(&mut world, 0.0, 15.0);
        assert_eq!(tier(&world, e), None);
    }

    #[test]
    fn beyond_activation_radius_is_hidden() {
        let mut world = World::new();
        let inside = spawn(&mut world, 0, 24.0, procedural());
        let outside = spawn(&mut world, 1, -24.5, procedural());
        let count = cull(&mut world, 0.0, &PARAMS);
        assert_eq!(count, 1);
        assert!(visible(&world, inside));
        assert!(!visible(&world, outside));
    }

    #[test]
    fn culled_artworks_keep_their_tier() {
        let mut world = World::new();
        let e = spawn(&mut world, 0, 30.0, procedural());
        cull(&mut world, 0.0, &PARAMS);
        // Distance 30 would want Low anyway; force High to prove it is untouched.
        if let Some(mut canvas) = world.get_mut::<Canvas>(e) {
            if let Canvas::Procedural { tier, .. } = &mut *canvas {
                *tier = LodTier::High;
            }
        }
        update_lod(&mut world, 0.0, 15.0);
        assert_eq!(tier(&world, e), Some(LodTier::High));
    }

    #[test]
    fn lights_use_their_own_radius_and_fill_lights_follow_owner() {
        let mut world = World::new();
        let art = spawn(&mut world, 0, 26.0, procedural());
        let point = light(&mut world, LightKind::Point, 28.0, None);
        let spot = light(&mut world, LightKind::Spot, 28.0, None);
        // Fill light slightly nearer than its artwork; it still follows the artwork.
        let fill = light(&mut world, LightKind::Fill, 23.0, Some(art));

        cull(&mut world, 0.0, &PARAMS);
        assert!(visible(&world, point));
        assert!(!visible(&world, spot));
        assert!(!visible(&world, art));
        assert!(!visible(&world, fill));
    }
}
