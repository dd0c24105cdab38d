// Camera navigation state machine.
//
//   FreeRoam ──select──▶ Tweening(FlyTo) ──done──▶ Locked
//   Locked ──deselect──▶ Tweening(FlyFrom) ──done──▶ FreeRoam
//   Locked ──select other──▶ Tweening(FlyTo)
//
// At most one tween exists. Starting a new one supersedes the old one: the
// old tween is reported as Superseded and the new one starts from wherever
// the camera currently is, with the full duration.

use bevy_ecs::entity::Entity;
use glam::Vec3;

use super::camera::CameraState;
use super::components::WallSide;
use super::corridor::{Corridor, TravelRange};
use super::tween::{Ease, Tween, TweenId, TweenOutcome};

/// Tuning for the controller, normally copied from `GalleryConfig`.
#[derive(Debug, Clone, Copy)]
pub struct NavParams {
    pub eye_height: f32,
    pub move_speed: f32,
    pub look_radius: f32,
    pub look_blend: f32,
    pub orientation_slerp: f32,
    pub tween_duration: f32,
    pub wall_clearance: f32,
    pub travel_margin: f32,
    pub initial_position: Vec3,
    pub initial_look_at: Vec3,
}

/// Hold-to-move key state for one tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveIntent {
    pub forward: bool,
    pub back: bool,
}

/// The artwork being flown to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectTarget {
    pub artwork: Entity,
    /// World-space centre of the artwork's bounds.
    pub center: Vec3,
    pub side: WallSide,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TweenPurpose {
    FlyTo(SelectTarget),
    FlyFrom,
}

#[derive(Debug, Clone)]
pub enum ViewMode {
    FreeRoam,
    Tweening { tween: Tween<Vec3>, purpose: TweenPurpose },
    Locked { target: SelectTarget },
}

impl ViewMode {
    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::FreeRoam => "free roam",
            ViewMode::Tweening { purpose: TweenPurpose::FlyTo(_), .. } => "flying to artwork",
            ViewMode::Tweening { purpose: TweenPurpose::FlyFrom, .. } => "returning",
            ViewMode::Locked { .. } => "viewing artwork",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NavEvent {
    TweenFinished { id: TweenId, outcome: TweenOutcome },
    /// Fly-to finished; the view is now locked on this artwork.
    Locked(Entity),
    /// Fly-from finished; free movement is back.
    Released,
}

pub struct Navigator {
    pub params: NavParams,
    corridor: Corridor,
    mode: ViewMode,
    next_tween_id: u64,
}

impl Navigator {
    pub fn new(params: NavParams, corridor: Corridor) -> Self {
        Self { params, corridor, mode: ViewMode::FreeRoam, next_tween_id: 1 }
    }

    pub fn mode(&self) -> &ViewMode {
        &self.mode
    }

    /// True while movement, hover and click input are ignored.
    pub fn is_input_locked(&self) -> bool {
        !matches!(self.mode, ViewMode::FreeRoam)
    }

    pub fn is_tweening(&self) -> bool {
        matches!(self.mode, ViewMode::Tweening { .. })
    }

    /// The artwork the view is locked on or flying to.
    pub fn selected(&self) -> Option<Entity> {
        match &self.mode {
            ViewMode::Locked { target } => Some(target.artwork),
            ViewMode::Tweening { purpose: TweenPurpose::FlyTo(target), .. } => Some(target.artwork),
            _ => None,
        }
    }

    pub fn travel_range(&self) -> Option<TravelRange> {
        self.corridor.travel_range(self.params.travel_margin)
    }

    /// Integrate W/S into a Z step. Only in free roam. X and Y stay pinned to
    /// the centre line and eye height, and Z to the travel range.
    pub fn apply_movement(&self, camera: &mut CameraState, intent: MoveIntent, dt: f32) {
        if !matches!(self.mode, ViewMode::FreeRoam) {
            return;
        }
        camera.position.x = 0.0;
        camera.position.y = self.params.eye_height;
        let Some(range) = self.travel_range() else {
            return;
        };
        let mut dz = 0.0;
        if intent.forward {
            dz -= self.params.move_speed * dt;
        }
        if intent.back {
            dz += self.params.move_speed * dt;
        }
        camera.position.z = range.clamp(camera.position.z + dz);
    }

    /// Camera position that frames `target` from across the corridor.
    pub fn framing_position(&self, target: &SelectTarget) -> Vec3 {
        let x = target.side.opposite().sign() * (self.corridor.width / 2.0 - self.params.wall_clearance);
        Vec3::new(x, target.center.y, target.center.z)
    }

    /// Position the fly-from tween returns to.
    pub fn release_position(&self, camera: &CameraState) -> Vec3 {
        let z = match self.travel_range() {
            Some(range) => range.clamp(camera.position.z),
            None => camera.position.z,
        };
        Vec3::new(0.0, self.params.eye_height, z)
    }

    /// Start flying to `target`. Works from every state; an in-flight tween
    /// is superseded.
    pub fn select(&mut self, camera: &mut CameraState, target: SelectTarget) -> (TweenId, Vec<NavEvent>) {
        let events = self.supersede();
        let destination = self.framing_position(&target);
        camera.face(target.center);
        camera.snap_look(target.center);
        let tween = self.start_tween(camera.position, destination);
        let id = tween.id;
        log::debug!("Fly-to {:?} -> {:?} (tween {})", camera.position, destination, id.0);
        self.mode = ViewMode::Tweening { tween, purpose: TweenPurpose::FlyTo(target) };
        (id, events)
    }

    /// Leave the artwork view. Acts when locked or while flying to an
    /// artwork; a no-op otherwise.
    pub fn deselect(&mut self, camera: &mut CameraState) -> Option<(TweenId, Vec<NavEvent>)> {
        let committed = matches!(
            self.mode,
            ViewMode::Locked { .. } | ViewMode::Tweening { purpose: TweenPurpose::FlyTo(_), .. }
        );
        if !committed {
            return None;
        }
        let events = self.supersede();
        let destination = self.release_position(camera);
        let tween = self.start_tween(camera.position, destination);
        let id = tween.id;
        log::debug!("Fly-from {:?} -> {:?} (tween {})", camera.position, destination, id.0);
        self.mode = ViewMode::Tweening { tween, purpose: TweenPurpose::FlyFrom };
        Some((id, events))
    }

    /// Back to the initial pose in free roam, cancelling any tween.
    pub fn reset(&mut self, camera: &mut CameraState) -> Vec<NavEvent> {
        let events = self.supersede();
        self.mode = ViewMode::FreeRoam;
        camera.position = self.params.initial_position;
        camera.snap_look(self.params.initial_look_at);
        camera.face(self.params.initial_look_at);
        events
    }

    /// Advance the active tween by `dt`. Completion transitions happen here.
    pub fn tick(&mut self, camera: &mut CameraState, dt: f32) -> Vec<NavEvent> {
        let ViewMode::Tweening { tween, purpose } = &mut self.mode else {
            return Vec::new();
        };
        camera.position = tween.advance(dt);
        let (id, destination, done, purpose) = (tween.id, tween.to, tween.is_finished(), *purpose);

        match purpose {
            TweenPurpose::FlyTo(target) => camera.snap_look(target.center),
            TweenPurpose::FlyFrom => {
                let ahead = self.forward_look_point(camera.position);
                camera.snap_look(ahead);
            }
        }
        if !done {
            return Vec::new();
        }

        camera.position = destination;
        let finished = NavEvent::TweenFinished { id, outcome: TweenOutcome::Completed };
        match purpose {
            TweenPurpose::FlyTo(target) => {
                log::debug!("Locked on artwork {:?}", target.artwork);
                self.mode = ViewMode::Locked { target };
                vec![finished, NavEvent::Locked(target.artwork)]
            }
            TweenPurpose::FlyFrom => {
                log::debug!("Back to free roam at z={:.2}", camera.position.z);
                self.mode = ViewMode::FreeRoam;
                vec![finished, NavEvent::Released]
            }
        }
    }

    /// Choose this tick's desired look-at and run look smoothing.
    pub fn update_look(&self, camera: &mut CameraState) {
        match &self.mode {
            ViewMode::FreeRoam => {
                let ahead = self.forward_look_point(camera.position);
                camera.set_look_desired(ahead);
            }
            ViewMode::Locked { target } => camera.snap_look(target.center),
            ViewMode::Tweening { .. } => {}
        }
        camera.smooth_look(self.params.look_blend, self.params.orientation_slerp);
    }

    /// A point `look_radius` down the corridor at eye height.
    fn forward_look_point(&self, position: Vec3) -> Vec3 {
        let mut p = position + Vec3::NEG_Z * self.params.look_radius;
        p.y = self.params.eye_height;
        p
    }

    fn start_tween(&mut self, from: Vec3, to: Vec3) -> Tween<Vec3> {
        let id = TweenId(self.next_tween_id);
        self.next_tween_id += 1;
        Tween::new(id, from, to, self.params.tween_duration, Ease::CubicInOut)
    }

    fn supersede(&mut self) -> Vec<NavEvent> {
        match &self.mode {
            ViewMode::Tweening { tween, .. } => {
                log::debug!("Tween {} superseded", tween.id.0);
                vec![NavEvent::TweenFinished { id: tween.id, outcome: TweenOutcome::Superseded }]
            }
            _ => Vec::new(),
        }
    }
}
