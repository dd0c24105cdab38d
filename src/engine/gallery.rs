// The gallery aggregate: corridor, ECS world, camera and navigation, owned
// in one place and advanced by tick(). Nothing here touches the GPU; the
// renderer reads a SceneSnapshot.

use bevy_ecs::prelude::*;
use glam::{Mat4, Vec3};
use image::RgbaImage;
use std::sync::Arc;

use super::assets::{TextureLoaded, TextureLoader};
use super::camera::CameraState;
use super::components::*;
use super::config::GalleryConfig;
use super::corridor::{
    self, CANVAS_OFFSET, Corridor, FRAME_PAD, LayoutParams, compute_display_size, layout_artworks,
    procedural_display_size,
};
use super::error::{GalleryError, GalleryResult};
use super::input::FrameInput;
use super::manifest::{self, ArtworkRecord};
use super::navigation::{MoveIntent, NavEvent, NavParams, Navigator, SelectTarget, ViewMode};
use super::picking;
use super::procedural::{HIGH_RES, LOW_RES, generate_artwork_texture};
use super::tween::{TweenId, TweenOutcome};
use super::visibility::{self, CullParams};

pub const ROOM_KEY: &str = "galeria";

/// Size given to an image artwork until its pixels arrive.
const PENDING_IMAGE_SIZE: DisplaySize = DisplaySize { width: 1.0, height: 1.0 };

/// What the surrounding UI is told about an artwork.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtworkInfo {
    pub entity: Entity,
    pub index: usize,
    pub title: String,
    pub artist: String,
    pub description: String,
    /// File path or URL of the artwork image; `None` for generated canvases.
    pub image_source: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomInfo {
    pub key: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GalleryEvent {
    SelectionChanged(Option<ArtworkInfo>),
    RoomChanged(RoomInfo),
    TweenFinished { id: TweenId, outcome: TweenOutcome },
}

/// One lit box: corridor surfaces and artwork frames.
#[derive(Debug, Clone, Copy)]
pub struct BoxDraw {
    pub model: Mat4,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSlot {
    Image,
    Low,
    High,
}

#[derive(Debug, Clone)]
pub struct CanvasDraw {
    pub entity: Entity,
    pub slot: TextureSlot,
    pub image: Arc<RgbaImage>,
    pub model: Mat4,
}

#[derive(Debug, Clone, Copy)]
pub struct LightDraw {
    pub position: Vec3,
    pub color: Color,
    pub intensity: f32,
    pub range: f32,
}

/// Plain data for one rendered frame.
#[derive(Debug, Default)]
pub struct SceneSnapshot {
    pub boxes: Vec<BoxDraw>,
    pub canvases: Vec<CanvasDraw>,
    /// Visible lights, nearest to the camera first.
    pub lights: Vec<LightDraw>,
}

pub struct GalleryState {
    pub config: GalleryConfig,
    pub corridor: Corridor,
    pub world: World,
    pub camera: CameraState,
    pub nav: Navigator,
    loader: TextureLoader,
    events: Vec<GalleryEvent>,
    hovered: Option<Entity>,
    visible_artworks: usize,
}

impl GalleryState {
    pub fn new(config: GalleryConfig) -> Self {
        let corridor = Corridor::new(config.corridor_length, config.corridor_width, config.wall_height);
        let camera = CameraState::new(
            config.initial_position,
            config.initial_look_at,
            config.fov_degrees.to_radians(),
        );
        let nav = Navigator::new(nav_params(&config), corridor);
        let loader = TextureLoader::new(config.max_texture_edge);

        let mut gallery = Self {
            config,
            corridor,
            world: World::new(),
            camera,
            nav,
            loader,
            events: Vec::new(),
            hovered: None,
            visible_artworks: 0,
        };
        gallery.spawn_corridor_lights();
        gallery
    }

    fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            end_margin: self.config.end_margin,
            frame_depth: self.config.frame_depth,
            wall_gap: self.config.wall_gap,
            art_bottom_margin: self.config.art_bottom_margin,
        }
    }

    fn spawn_corridor_lights(&mut self) {
        for position in self.corridor.point_light_positions() {
            self.world.spawn((
                Transform::from_position(position),
                Light { kind: LightKind::Point, color: Color::WHITE, intensity: 0.8, range: 30.0 },
                Visible(true),
            ));
        }
        for position in self.corridor.track_spot_positions() {
            self.world.spawn((
                Transform::from_position(position),
                Light { kind: LightKind::Spot, color: Color::WHITE, intensity: 1.3, range: 22.0 },
                Visible(true),
            ));
        }
    }

    // ========================================================================
    // ARTWORKS
    // ========================================================================

    /// Load the manifest from the configured candidates and hang its
    /// artworks. A manifest that cannot be loaded leaves the gallery empty.
    pub fn load_from_manifest(&mut self) -> usize {
        match manifest::load_manifest(&self.config.asset_root, &self.config.manifest_paths) {
            Ok((records, source)) => {
                log::info!("Loaded {} artworks from {}", records.len(), source);
                self.load_artworks(&records)
            }
            Err(err) => {
                log::error!("Gallery starts empty: {}", err);
                0
            }
        }
    }

    /// Lay out and spawn one entity per record. Returns the number spawned.
    pub fn load_artworks(&mut self, records: &[ArtworkRecord]) -> usize {
        let sizes: Vec<DisplaySize> = records
            .iter()
            .map(|r| match (&r.image, r.size) {
                (None, explicit) => procedural_display_size(explicit),
                (Some(_), Some(explicit)) => procedural_display_size(Some(explicit)),
                (Some(_), None) => PENDING_IMAGE_SIZE,
            })
            .collect();
        let slots = layout_artworks(&sizes, &self.corridor, &self.layout_params());

        for ((record, slot), size) in records.iter().zip(&slots).zip(&sizes) {
            let transform = Transform { position: slot.position, rotation: slot.rotation };
            let image_source = record
                .image
                .as_deref()
                .map(|reference| manifest::resolve_image(&self.config.asset_root, reference, &self.config.image_dirs));
            let canvas = match &image_source {
                Some(source) => Canvas::Image { source: source.describe(), state: ImageState::Pending },
                None => {
                    let seed = slot.index as u64;
                    Canvas::Procedural {
                        low: Arc::new(generate_artwork_texture(seed, LOW_RES)),
                        high: Arc::new(generate_artwork_texture(seed, HIGH_RES)),
                        tier: LodTier::Low,
                    }
                }
            };

            let entity = self
                .world
                .spawn((
                    Artwork {
                        index: slot.index,
                        title: record.title.clone(),
                        artist: record.artist.clone(),
                        description: record.description.clone(),
                        side: slot.side,
                    },
                    transform,
                    *size,
                    Visible(true),
                    canvas,
                    Highlight::new(),
                ))
                .id();

            // Image artworks get their fill light once the real size is known.
            match image_source {
                Some(source) => self.loader.request(entity, source),
                None => self.spawn_fill_light(entity, &transform, size),
            }
        }

        if !slots.is_empty() {
            self.refresh_lighting();
        }
        self.update_visibility();
        slots.len()
    }

    /// Soft light just in front of the canvas, aimed back at it.
    fn spawn_fill_light(&mut self, artwork: Entity, transform: &Transform, size: &DisplaySize) {
        let local = Vec3::new(0.0, size.height * 0.15, 0.55);
        self.world.spawn((
            Transform::from_position(transform.position + transform.rotation * local),
            Light { kind: LightKind::Fill, color: Color::WHITE, intensity: 2.0, range: 3.5 },
            FillLightOf(artwork),
            Visible(true),
        ));
    }

    /// Replace the ceiling spots with one spot per artwork, above its wall.
    pub fn refresh_lighting(&mut self) {
        let mut spots = self.world.query::<(Entity, &Light)>();
        let old: Vec<Entity> = spots
            .iter(&self.world)
            .filter(|(_, light)| light.kind == LightKind::Spot)
            .map(|(entity, _)| entity)
            .collect();
        for entity in old {
            self.world.despawn(entity);
        }

        let mut artworks = self.world.query::<(&Artwork, &Transform)>();
        let positions: Vec<Vec3> = artworks
            .iter(&self.world)
            .map(|(art, t)| self.corridor.artwork_spot_position(art.side, t.position.z))
            .collect();
        for position in positions {
            self.world.spawn((
                Transform::from_position(position),
                Light { kind: LightKind::Spot, color: Color::from_hex(0xfff1e0), intensity: 2.4, range: 18.0 },
                Visible(true),
            ));
        }
    }

    /// Apply finished image loads. Size, height and fill light of an artwork
    /// change together here, on the tick thread.
    pub fn apply_texture_loads(&mut self, loads: Vec<TextureLoaded>) {
        let params = self.layout_params();
        for loaded in loads {
            let entity = loaded.entity;
            let (state, size) = match loaded.result {
                Ok(image) => {
                    log::debug!("Loaded {} ({}x{})", loaded.source, image.source_width, image.source_height);
                    let size = compute_display_size(image.source_width, image.source_height);
                    (ImageState::Ready(image.image), Some(size))
                }
                Err(err) => {
                    log::warn!("Artwork image unavailable, showing empty frame: {}", err);
                    (ImageState::Failed, None)
                }
            };

            match self.world.get_mut::<Canvas>(entity) {
                Some(mut canvas) => {
                    if let Canvas::Image { state: current, .. } = &mut *canvas {
                        *current = state;
                    }
                }
                None => continue,
            }

            let Some(size) = size else {
                continue;
            };
            if let Some(mut current) = self.world.get_mut::<DisplaySize>(entity) {
                *current = size;
            }
            let transform = match self.world.get_mut::<Transform>(entity) {
                Some(mut transform) => {
                    transform.position.y = corridor::slot_height(size, &params);
                    *transform
                }
                None => continue,
            };
            self.spawn_fill_light(entity, &transform, &size);
        }
    }

    pub fn artwork_count(&mut self) -> usize {
        self.world.query::<&Artwork>().iter(&self.world).count()
    }

    pub fn visible_artworks(&self) -> usize {
        self.visible_artworks
    }

    pub fn pending_loads(&self) -> usize {
        self.loader.in_flight()
    }

    pub fn artwork_info(&self, entity: Entity) -> Option<ArtworkInfo> {
        let art = self.world.get::<Artwork>(entity)?;
        let image_source = match self.world.get::<Canvas>(entity) {
            Some(Canvas::Image { source, .. }) => Some(source.clone()),
            _ => None,
        };
        Some(ArtworkInfo {
            entity,
            index: art.index,
            title: art.title.clone(),
            artist: art.artist.clone(),
            description: art.description.clone(),
            image_source,
        })
    }

    // ========================================================================
    // CONTROL OPERATIONS
    // ========================================================================

    /// Fly to an artwork. Supersedes any flight in progress.
    pub fn select_artwork(&mut self, entity: Entity) -> Option<TweenId> {
        let transform = *self.world.get::<Transform>(entity)?;
        let size = *self.world.get::<DisplaySize>(entity)?;
        let side = self.world.get::<Artwork>(entity)?.side;
        let center = picking::artwork_bounds(&transform, &size).center();

        let (id, events) = self.nav.select(&mut self.camera, SelectTarget { artwork: entity, center, side });
        self.push_nav_events(events);
        self.set_hovered(None);
        let info = self.artwork_info(entity);
        self.events.push(GalleryEvent::SelectionChanged(info));
        Some(id)
    }

    /// Leave the current artwork. No-op when nothing is selected.
    pub fn deselect(&mut self) -> Option<TweenId> {
        let (id, events) = self.nav.deselect(&mut self.camera)?;
        self.push_nav_events(events);
        self.events.push(GalleryEvent::SelectionChanged(None));
        Some(id)
    }

    pub fn reset_camera(&mut self) {
        let had_selection = self.nav.selected().is_some();
        let events = self.nav.reset(&mut self.camera);
        self.push_nav_events(events);
        if had_selection {
            self.events.push(GalleryEvent::SelectionChanged(None));
        }
    }

    /// There is a single room; switching to it only re-announces it.
    pub fn change_room(&mut self, key: &str) -> GalleryResult<RoomInfo> {
        if key != ROOM_KEY {
            return Err(GalleryError::UnknownRoom(key.to_string()));
        }
        let info = RoomInfo {
            key: ROOM_KEY.to_string(),
            name: "Galería".to_string(),
            description: "Gallery corridor with white walls and a grey floor.".to_string(),
        };
        self.events.push(GalleryEvent::RoomChanged(info.clone()));
        Ok(info)
    }

    pub fn selected(&self) -> Option<Entity> {
        self.nav.selected()
    }

    pub fn selected_info(&self) -> Option<ArtworkInfo> {
        self.selected().and_then(|e| self.artwork_info(e))
    }

    pub fn hovered(&self) -> Option<Entity> {
        self.hovered
    }

    pub fn mode(&self) -> &ViewMode {
        self.nav.mode()
    }

    pub fn drain_events(&mut self) -> Vec<GalleryEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // FRAME UPDATE
    // ========================================================================

    /// Advance the gallery by one processed frame.
    pub fn tick(&mut self, input: &FrameInput, dt: f32) {
        let loads = self.loader.drain();
        self.apply_texture_loads(loads);

        self.nav.apply_movement(&mut self.camera, MoveIntent { forward: input.forward, back: input.back }, dt);
        self.update_visibility();

        if input.reset_camera {
            self.reset_camera();
        }
        if input.deselect {
            self.deselect();
        }
        if input.select_nearest && !self.nav.is_input_locked() {
            let (eye, forward) = (self.camera.position, self.camera.forward());
            if let Some(entity) = picking::nearest_ahead(&mut self.world, eye, forward) {
                self.select_artwork(entity);
            }
        }
        // Clicking another artwork while locked flies straight to it.
        if let Some(pointer) = input.click {
            if !self.nav.is_tweening() {
                if let Some(entity) = self.pick_at(pointer, input) {
                    self.select_artwork(entity);
                }
            }
        }
        // Re-cast every frame: walking can cull what sits under a still pointer.
        let hit = match input.hover {
            Some(pointer) if !self.nav.is_input_locked() => self.pick_at(pointer, input),
            _ => None,
        };
        self.set_hovered(hit);

        let mut highlights = self.world.query::<&mut Highlight>();
        for mut highlight in highlights.iter_mut(&mut self.world) {
            highlight.advance(dt);
        }

        let events = self.nav.tick(&mut self.camera, dt);
        self.push_nav_events(events);
        self.nav.update_look(&mut self.camera);
    }

    fn update_visibility(&mut self) {
        let z = self.camera.position.z;
        let params = CullParams {
            activation_radius: self.config.activation_radius,
            point_light_radius_bonus: self.config.point_light_radius_bonus,
        };
        self.visible_artworks = visibility::cull(&mut self.world, z, &params);
        visibility::update_lod(&mut self.world, z, self.config.lod_high_distance);
    }

    fn pick_at(&mut self, pointer: glam::Vec2, input: &FrameInput) -> Option<Entity> {
        let ray = self.camera.screen_ray(pointer, input.viewport);
        picking::pick(&mut self.world, &ray, self.camera.near, self.camera.far)
    }

    fn set_hovered(&mut self, hovered: Option<Entity>) {
        if self.hovered == hovered {
            return;
        }
        if let Some(previous) = self.hovered {
            if let Some(mut h) = self.world.get_mut::<Highlight>(previous) {
                h.set_hovered(false);
            }
        }
        if let Some(current) = hovered {
            if let Some(mut h) = self.world.get_mut::<Highlight>(current) {
                h.set_hovered(true);
            }
        }
        self.hovered = hovered;
    }

    fn push_nav_events(&mut self, events: Vec<NavEvent>) {
        for event in events {
            match event {
                NavEvent::TweenFinished { id, outcome } => {
                    self.events.push(GalleryEvent::TweenFinished { id, outcome });
                }
                NavEvent::Locked(entity) => log::debug!("View locked on {:?}", entity),
                NavEvent::Released => log::debug!("View released"),
            }
        }
    }

    // ========================================================================
    // RENDER EXTRACTION
    // ========================================================================

    /// Collect what the renderer needs for this frame.
    pub fn scene_snapshot(&mut self) -> SceneSnapshot {
        let mut snapshot = SceneSnapshot::default();

        for surface in self.corridor.surfaces() {
            snapshot.boxes.push(BoxDraw {
                model: Mat4::from_scale_rotation_translation(surface.size, glam::Quat::IDENTITY, surface.center),
                color: surface.color,
            });
        }

        let frame_depth = self.config.frame_depth;
        let frame_color = Color::from_hex(0x111111);
        let mut artworks =
            self.world.query::<(Entity, &Transform, &DisplaySize, &Visible, &Canvas, &Highlight)>();
        for (entity, transform, size, visible, canvas, highlight) in artworks.iter(&self.world) {
            if !visible.0 {
                continue;
            }
            let group = Mat4::from_scale_rotation_translation(
                Vec3::splat(highlight.scale()),
                transform.rotation,
                transform.position,
            );
            snapshot.boxes.push(BoxDraw {
                model: group * Mat4::from_scale(Vec3::new(size.width + FRAME_PAD, size.height + FRAME_PAD, frame_depth)),
                color: frame_color,
            });
            if let Some(image) = canvas.active_image() {
                let slot = match canvas.tier() {
                    None => TextureSlot::Image,
                    Some(LodTier::Low) => TextureSlot::Low,
                    Some(LodTier::High) => TextureSlot::High,
                };
                snapshot.canvases.push(CanvasDraw {
                    entity,
                    slot,
                    image: Arc::clone(image),
                    model: group
                        * Mat4::from_translation(Vec3::new(0.0, 0.0, CANVAS_OFFSET))
                        * Mat4::from_scale(Vec3::new(size.width, size.height, 1.0)),
                });
            }
        }

        let eye = self.camera.position;
        let mut lights = self.world.query::<(&Transform, &Light, &Visible)>();
        snapshot.lights = lights
            .iter(&self.world)
            .filter(|(_, _, visible)| visible.0)
            .map(|(t, light, _)| LightDraw {
                position: t.position,
                color: light.color,
                intensity: light.intensity,
                range: light.range,
            })
            .collect();
        snapshot
            .lights
            .sort_by(|a, b| a.position.distance_squared(eye).total_cmp(&b.position.distance_squared(eye)));

        snapshot
    }
}

fn nav_params(config: &GalleryConfig) -> NavParams {
    NavParams {
        eye_height: config.eye_height,
        move_speed: config.move_speed,
        look_radius: config.look_radius,
        look_blend: config.look_blend,
        orientation_slerp: config.orientation_slerp,
        tween_duration: config.tween_duration,
        wall_clearance: config.wall_clearance,
        travel_margin: config.travel_margin,
        initial_position: config.initial_position,
        initial_look_at: config.initial_look_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    const DT: f32 = 1.0 / 60.0;
    const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

    fn record(title: &str) -> ArtworkRecord {
        ArtworkRecord {
            title: title.to_string(),
            artist: "Anon".to_string(),
            description: String::new(),
            image: None,
            size: None,
        }
    }

    fn gallery_with(n: usize) -> GalleryState {
        let mut config = GalleryConfig::default();
        config.asset_root = std::env::temp_dir().join("gallery-walk-test-missing");
        let mut gallery = GalleryState::new(config);
        let records: Vec<_> = (0..n).map(|i| record(&format!("Piece {i}"))).collect();
        gallery.load_artworks(&records);
        gallery
    }

    fn artworks_by_index(gallery: &mut GalleryState) -> Vec<(Entity, Artwork, Transform)> {
        let mut q = gallery.world.query::<(Entity, &Artwork, &Transform)>();
        let mut v: Vec<_> = q.iter(&gallery.world).map(|(e, a, t)| (e, a.clone(), *t)).collect();
        v.sort_by_key(|(_, a, _)| a.index);
        v
    }

    fn input() -> FrameInput {
        FrameInput { viewport: VIEWPORT, ..Default::default() }
    }

    fn run(gallery: &mut GalleryState, frames: usize) {
        for _ in 0..frames {
            gallery.tick(&input(), DT);
        }
    }

    /// Window pixel position of a world point for the current camera.
    fn screen_point(gallery: &GalleryState, p: Vec3) -> Vec2 {
        let ndc = gallery.camera.view_projection(VIEWPORT.x / VIEWPORT.y).project_point3(p);
        Vec2::new((ndc.x + 1.0) / 2.0 * VIEWPORT.x, (1.0 - ndc.y) / 2.0 * VIEWPORT.y)
    }

    fn centre_of(gallery: &GalleryState, e: Entity) -> Vec3 {
        let t = gallery.world.get::<Transform>(e).unwrap();
        let s = gallery.world.get::<DisplaySize>(e).unwrap();
        picking::artwork_bounds(t, s).center()
    }

    #[test]
    fn four_artworks_alternate_walls_evenly() {
        let mut gallery = gallery_with(4);
        let arts = artworks_by_index(&mut gallery);
        let sides: Vec<_> = arts.iter().map(|(_, a, _)| a.side).collect();
        assert_eq!(sides, vec![WallSide::Right, WallSide::Left, WallSide::Right, WallSide::Left]);
        assert!((arts[0].2.position.z + 38.0).abs() < 1e-4);
        assert!((arts[3].2.position.z - 38.0).abs() < 1e-4);
    }

    #[test]
    fn single_artwork_is_centred() {
        let mut gallery = gallery_with(1);
        let arts = artworks_by_index(&mut gallery);
        assert_eq!(arts[0].2.position.z, 0.0);
    }

    #[test]
    fn lighting_follows_artworks() {
        let mut gallery = gallery_with(3);
        let mut q = gallery.world.query::<&Light>();
        let spots = q.iter(&gallery.world).filter(|l| l.kind == LightKind::Spot).count();
        let fills = q.iter(&gallery.world).filter(|l| l.kind == LightKind::Fill).count();
        assert_eq!(spots, 3);
        assert_eq!(fills, 3);
    }

    #[test]
    fn every_artwork_is_framed_from_the_opposite_wall() {
        let mut gallery = gallery_with(6);
        for (entity, art, _) in artworks_by_index(&mut gallery) {
            gallery.select_artwork(entity);
            run(&mut gallery, 120);
            let expected = art.side.opposite().sign() * (3.0 - 0.35);
            assert!((gallery.camera.position.x - expected).abs() < 1e-5);
            gallery.deselect();
            run(&mut gallery, 120);
        }
    }

    #[test]
    fn rapid_double_select_ends_at_second_destination() {
        let mut gallery = gallery_with(4);
        let arts = artworks_by_index(&mut gallery);
        let (a, b) = (arts[1].0, arts[2].0);

        let id_a = gallery.select_artwork(a).unwrap();
        run(&mut gallery, 10);
        let id_b = gallery.select_artwork(b).unwrap();
        run(&mut gallery, 120);

        let dest_b = gallery.nav.framing_position(&SelectTarget {
            artwork: b,
            center: centre_of(&gallery, b),
            side: WallSide::Right,
        });
        assert_eq!(gallery.camera.position, dest_b);
        assert_eq!(gallery.selected(), Some(b));

        let events = gallery.drain_events();
        assert!(events.contains(&GalleryEvent::TweenFinished { id: id_a, outcome: TweenOutcome::Superseded }));
        assert!(events.contains(&GalleryEvent::TweenFinished { id: id_b, outcome: TweenOutcome::Completed }));
        assert!(!events.contains(&GalleryEvent::TweenFinished { id: id_a, outcome: TweenOutcome::Completed }));
    }

    #[test]
    fn escape_deselects_and_notifies() {
        let mut gallery = gallery_with(2);
        let arts = artworks_by_index(&mut gallery);
        gallery.select_artwork(arts[0].0);
        run(&mut gallery, 90);
        gallery.drain_events();

        gallery.tick(&FrameInput { deselect: true, ..input() }, DT);
        run(&mut gallery, 90);
        let events = gallery.drain_events();
        assert!(events.contains(&GalleryEvent::SelectionChanged(None)));
        assert_eq!(gallery.camera.position.x, 0.0);
        assert_eq!(gallery.camera.position.y, 2.0);
        assert!(matches!(gallery.mode(), ViewMode::FreeRoam));
    }

    #[test]
    fn space_selects_nearest_but_not_while_locked() {
        let mut gallery = gallery_with(3);
        let arts = artworks_by_index(&mut gallery);
        // Camera at z=10 looking down the centre line hits nothing; the
        // fallback takes the closest artwork with dz > -2, here z=38.
        gallery.tick(&FrameInput { select_nearest: true, ..input() }, DT);
        assert_eq!(gallery.selected(), Some(arts[2].0));
        run(&mut gallery, 90);

        gallery.tick(&FrameInput { select_nearest: true, ..input() }, DT);
        assert_eq!(gallery.selected(), Some(arts[2].0));
        assert!(matches!(gallery.mode(), ViewMode::Locked { .. }));
    }

    #[test]
    fn clicking_a_visible_artwork_selects_it() {
        let mut gallery = gallery_with(3);
        let arts = artworks_by_index(&mut gallery);
        let middle = arts[1].0;
        let point = screen_point(&gallery, centre_of(&gallery, middle));
        gallery.tick(&FrameInput { click: Some(point), ..input() }, DT);
        assert_eq!(gallery.selected(), Some(middle));
        let events = gallery.drain_events();
        assert!(matches!(&events[0], GalleryEvent::SelectionChanged(Some(info)) if info.title == "Piece 1"));
    }

    #[test]
    fn culled_artworks_ignore_clicks_and_hover() {
        let mut gallery = gallery_with(3);
        let arts = artworks_by_index(&mut gallery);
        let far = arts[0].0; // z = -38, camera at z = 10
        assert_eq!(gallery.world.get::<Visible>(far), Some(&Visible(false)));

        let point = screen_point(&gallery, centre_of(&gallery, far));
        gallery.tick(&FrameInput { hover: Some(point), click: Some(point), ..input() }, DT);
        assert_eq!(gallery.selected(), None);
        assert_eq!(gallery.hovered(), None);
    }

    #[test]
    fn hover_highlights_until_pointer_leaves() {
        let mut gallery = gallery_with(3);
        let middle = artworks_by_index(&mut gallery)[1].0;
        let point = screen_point(&gallery, centre_of(&gallery, middle));
        gallery.tick(&FrameInput { hover: Some(point), ..input() }, DT);
        assert_eq!(gallery.hovered(), Some(middle));
        for _ in 0..30 {
            gallery.tick(&FrameInput { hover: Some(point), ..input() }, DT);
        }
        assert!(gallery.world.get::<Highlight>(middle).unwrap().scale() > 1.0);

        gallery.tick(&FrameInput { hover: Some(Vec2::new(640.0, 700.0)), ..input() }, DT);
        assert_eq!(gallery.hovered(), None);
    }

    #[test]
    fn walking_away_drops_hover_under_a_still_pointer() {
        let mut gallery = gallery_with(3);
        let middle = artworks_by_index(&mut gallery)[1].0;
        let point = screen_point(&gallery, centre_of(&gallery, middle));
        gallery.tick(&FrameInput { hover: Some(point), ..input() }, DT);
        assert_eq!(gallery.hovered(), Some(middle));

        for _ in 0..180 {
            gallery.tick(&FrameInput { back: true, hover: Some(point), ..input() }, DT);
        }
        assert_eq!(gallery.world.get::<Visible>(middle), Some(&Visible(false)));
        assert_eq!(gallery.hovered(), None);
    }

    #[test]
    fn pointer_outside_the_window_clears_hover() {
        let mut gallery = gallery_with(3);
        let middle = artworks_by_index(&mut gallery)[1].0;
        let point = screen_point(&gallery, centre_of(&gallery, middle));
        gallery.tick(&FrameInput { hover: Some(point), ..input() }, DT);
        assert_eq!(gallery.hovered(), Some(middle));
        gallery.tick(&input(), DT);
        assert_eq!(gallery.hovered(), None);
    }

    #[test]
    fn free_roam_walk_stays_on_the_centre_line() {
        let mut gallery = gallery_with(4);
        for _ in 0..600 {
            gallery.tick(&FrameInput { forward: true, ..input() }, DT);
            let p = gallery.camera.position;
            assert_eq!((p.x, p.y), (0.0, 2.0));
            assert!(p.z >= -37.5 && p.z <= 37.5);
        }
        assert_eq!(gallery.camera.position.z, -37.5);
    }

    #[test]
    fn reset_returns_home_and_clears_selection() {
        let mut gallery = gallery_with(2);
        let first = artworks_by_index(&mut gallery)[0].0;
        gallery.select_artwork(first);
        run(&mut gallery, 30);
        gallery.drain_events();
        gallery.tick(&FrameInput { reset_camera: true, ..input() }, DT);
        assert_eq!(gallery.camera.position, Vec3::new(0.0, 2.0, 10.0));
        assert!(gallery.drain_events().contains(&GalleryEvent::SelectionChanged(None)));
    }

    #[test]
    fn selected_info_tracks_flight_lock_and_return() {
        let mut gallery = gallery_with(2);
        let second = artworks_by_index(&mut gallery)[1].0;
        assert_eq!(gallery.selected_info(), None);

        gallery.select_artwork(second);
        run(&mut gallery, 5);
        assert!(matches!(gallery.mode(), ViewMode::Tweening { .. }));
        let info = gallery.selected_info().unwrap();
        assert_eq!((info.entity, info.index, info.title.as_str()), (second, 1, "Piece 1"));

        run(&mut gallery, 120);
        assert!(matches!(gallery.mode(), ViewMode::Locked { .. }));
        assert_eq!(gallery.selected_info(), Some(info));

        gallery.deselect();
        assert_eq!(gallery.selected_info(), None);
        run(&mut gallery, 120);
        assert_eq!(gallery.selected_info(), None);
    }

    #[test]
    fn room_changes() {
        let mut gallery = gallery_with(0);
        let info = gallery.change_room(ROOM_KEY).unwrap();
        assert_eq!(gallery.drain_events(), vec![GalleryEvent::RoomChanged(info)]);
        assert!(matches!(gallery.change_room("attic"), Err(GalleryError::UnknownRoom(_))));
    }

    #[test]
    fn missing_manifest_leaves_an_empty_but_working_gallery() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = GalleryConfig::default();
        config.asset_root = dir.path().to_path_buf();
        let mut gallery = GalleryState::new(config);
        assert_eq!(gallery.load_from_manifest(), 0);
        gallery.tick(&FrameInput { forward: true, select_nearest: true, ..input() }, DT);
        assert_eq!(gallery.selected(), None);
        // Track spots stay when there is nothing to light.
        let mut q = gallery.world.query::<&Light>();
        assert_eq!(q.iter(&gallery.world).filter(|l| l.kind == LightKind::Spot).count(), 10);
    }

    #[test]
    fn image_load_resizes_and_rehangs_the_artwork() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("assets/images")).unwrap();
        RgbaImage::from_pixel(300, 600, image::Rgba([200, 100, 50, 255]))
            .save(dir.path().join("assets/images/tall.png"))
            .unwrap();
        let mut config = GalleryConfig::default();
        config.asset_root = dir.path().to_path_buf();
        let mut gallery = GalleryState::new(config);
        let mut tall = record("Tall");
        tall.image = Some("tall.png".into());
        let mut broken = record("Broken");
        broken.image = Some("missing.png".into());
        gallery.load_artworks(&[tall, broken]);

        let done = gallery.loader.wait_all();
        gallery.apply_texture_loads(done);

        let arts = artworks_by_index(&mut gallery);
        let (tall_e, broken_e) = (arts[0].0, arts[1].0);
        let size = *gallery.world.get::<DisplaySize>(tall_e).unwrap();
        assert!((size.height - 4.8).abs() < 1e-4 && (size.width - 2.4).abs() < 1e-4);
        let y = gallery.world.get::<Transform>(tall_e).unwrap().position.y;
        assert!((y - (1.1 + 2.4)).abs() < 1e-4);
        assert!(matches!(
            gallery.world.get::<Canvas>(tall_e),
            Some(Canvas::Image { state: ImageState::Ready(_), .. })
        ));

        assert!(matches!(
            gallery.world.get::<Canvas>(broken_e),
            Some(Canvas::Image { state: ImageState::Failed, .. })
        ));
        assert_eq!(*gallery.world.get::<DisplaySize>(broken_e).unwrap(), PENDING_IMAGE_SIZE);

        let mut q = gallery.world.query::<&FillLightOf>();
        let owners: Vec<Entity> = q.iter(&gallery.world).map(|f| f.0).collect();
        assert_eq!(owners, vec![tall_e]);

        let info = gallery.artwork_info(tall_e).unwrap();
        assert!(info.image_source.unwrap().ends_with("tall.png"));
        let mut generated = gallery_with(1);
        let only = artworks_by_index(&mut generated)[0].0;
        assert_eq!(generated.artwork_info(only).unwrap().image_source, None);
    }

    #[test]
    fn snapshot_skips_culled_artworks() {
        let mut gallery = gallery_with(3);
        let snapshot = gallery.scene_snapshot();
        // Only the z=0 artwork is within reach of the camera at z=10.
        assert_eq!(snapshot.canvases.len(), 1);
        assert_eq!(snapshot.boxes.len(), gallery.corridor.surfaces().len() + 1);
        let eye = gallery.camera.position;
        for pair in snapshot.lights.windows(2) {
            assert!(pair[0].position.distance(eye) <= pair[1].position.distance(eye));
        }
    }
}
