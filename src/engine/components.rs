// ECS components for gallery entities.
// Artworks and lights are entities; the corridor itself is static data (see corridor.rs).

use bevy_ecs::prelude::*;
use glam::{Quat, Vec3};
use image::RgbaImage;
use std::sync::Arc;

use super::tween::{Ease, Tween, TweenId};

/// Position and orientation of an entity in world space
#[derive(Component, Debug, Clone, Copy)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self { position, rotation: Quat::IDENTITY }
    }
}

/// Linear RGB color
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0 };

    /// 0xRRGGBB
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// Which corridor wall an artwork hangs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WallSide {
    Left,
    Right,
}

impl WallSide {
    /// Even manifest indices hang on the right wall.
    pub fn for_index(index: usize) -> Self {
        if index % 2 == 0 { WallSide::Right } else { WallSide::Left }
    }

    /// +1 for the right wall (positive X), -1 for the left.
    pub fn sign(self) -> f32 {
        match self {
            WallSide::Left => -1.0,
            WallSide::Right => 1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            WallSide::Left => WallSide::Right,
            WallSide::Right => WallSide::Left,
        }
    }
}

/// Identity of one artwork. Never removed once spawned.
#[derive(Component, Debug, Clone)]
pub struct Artwork {
    /// Position in the manifest.
    pub index: usize,
    pub title: String,
    pub artist: String,
    pub description: String,
    pub side: WallSide,
}

/// Canvas size in world units, frame border excluded.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct DisplaySize {
    pub width: f32,
    pub height: f32,
}

/// Written every tick by the culling pass.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Visible(pub bool);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LodTier {
    Low,
    High,
}

#[derive(Debug, Clone)]
pub enum ImageState {
    Pending,
    Ready(Arc<RgbaImage>),
    Failed,
}

/// What is painted on an artwork's canvas.
#[derive(Component, Debug, Clone)]
pub enum Canvas {
    /// Loaded from a file or URL. Single resolution.
    Image { source: String, state: ImageState },
    /// Generated at startup in two resolutions; the tier follows camera distance.
    Procedural {
        low: Arc<RgbaImage>,
        high: Arc<RgbaImage>,
        tier: LodTier,
    },
}

impl Canvas {
    /// `None` for image canvases, which have no tiers.
    pub fn tier(&self) -> Option<LodTier> {
        match self {
            Canvas::Image { .. } => None,
            Canvas::Procedural { tier, .. } => Some(*tier),
        }
    }

    /// The texture currently shown, if any.
    pub fn active_image(&self) -> Option<&Arc<RgbaImage>> {
        match self {
            Canvas::Image { state: ImageState::Ready(img), .. } => Some(img),
            Canvas::Image { .. } => None,
            Canvas::Procedural { low, high, tier } => Some(match tier {
                LodTier::Low => low,
                LodTier::High => high,
            }),
        }
    }
}

/// Hover emphasis: the framed artwork scales up slightly while pointed at.
#[derive(Component, Debug, Clone)]
pub struct Highlight {
    pub hovered: bool,
    tween: Tween<f32>,
}

impl Highlight {
    pub const HOVER_SCALE: f32 = 1.1;
    pub const DURATION: f32 = 0.3;

    pub fn new() -> Self {
        Self {
            hovered: false,
            tween: Tween::new(TweenId(0), 1.0, 1.0, 0.0, Ease::QuadOut),
        }
    }

    pub fn set_hovered(&mut self, hovered: bool) {
        if self.hovered == hovered {
            return;
        }
        self.hovered = hovered;
        let target = if hovered { Self::HOVER_SCALE } else { 1.0 };
        self.tween = Tween::new(TweenId(0), self.tween.value(), target, Self::DURATION, Ease::QuadOut);
    }

    pub fn advance(&mut self, dt: f32) {
        self.tween.advance(dt);
    }

    pub fn scale(&self) -> f32 {
        self.tween.value()
    }
}

impl Default for Highlight {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    /// Ambient corridor fill hanging from the ceiling.
    Point,
    /// Ceiling spot aimed at a wall or an artwork.
    Spot,
    /// Soft spot in front of one artwork; shown and hidden with it.
    Fill,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Light {
    pub kind: LightKind,
    pub color: Color,
    pub intensity: f32,
    pub range: f32,
}

/// Marks a fill light as belonging to an artwork entity.
#[derive(Component, Debug, Clone, Copy)]
pub struct FillLightOf(pub Entity);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sides_alternate_starting_right() {
        let sides: Vec<_> = (0..4).map(WallSide::for_index).collect();
        assert_eq!(sides, vec![WallSide::Right, WallSide::Left, WallSide::Right, WallSide::Left]);
    }

    #[test]
    fn image_canvas_has_no_tier_until_loaded() {
        let canvas = Canvas::Image { source: "a.png".into(), state: ImageState::Pending };
        assert_eq!(canvas.tier(), None);
        assert!(canvas.active_image().is_none());
    }

    #[test]
    fn highlight_eases_toward_hover_scale() {
        let mut h = Highlight::new();
        h.set_hovered(true);
        h.advance(0.1);
        assert!(h.scale() > 1.0 && h.scale() < Highlight::HOVER_SCALE);
        h.advance(1.0);
        assert_eq!(h.scale(), Highlight::HOVER_SCALE);
        h.set_hovered(false);
        h.advance(1.0);
        assert_eq!(h.scale(), 1.0);
    }
}
