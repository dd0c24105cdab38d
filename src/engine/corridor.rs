// Corridor geometry and artwork layout.
//
// The corridor runs along Z, centred on the origin, floor at Y=0.
// Walls sit at X = ±width/2. Artworks alternate walls by manifest index and
// are spread evenly between the two end margins.

use glam::{Quat, Vec3};

use super::components::{Color, DisplaySize, WallSide};

pub const WALL_THICKNESS: f32 = 0.2;
/// Border added around the canvas on each axis by the frame.
pub const FRAME_PAD: f32 = 0.2;
/// Distance of the canvas in front of the frame centre (local +Z).
pub const CANVAS_OFFSET: f32 = 0.06;

// Display size rules for images (world units)
const LONG_EDGE: f32 = 1.6;
const MAX_EDGE: f32 = 10.0;
const MIN_EDGE: f32 = 0.5;
const SIZE_SCALE: f32 = 3.0;
const DEFAULT_PROCEDURAL_SIZE: [f32; 2] = [1.2, 0.8];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Corridor {
    pub length: f32,
    pub width: f32,
    pub wall_height: f32,
}

/// One axis-aligned box of static corridor geometry.
#[derive(Debug, Clone, Copy)]
pub struct Surface {
    pub center: Vec3,
    pub size: Vec3,
    pub color: Color,
}

/// Legal camera Z interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelRange {
    pub min: f32,
    pub max: f32,
}

impl TravelRange {
    pub fn clamp(&self, z: f32) -> f32 {
        z.clamp(self.min, self.max)
    }
}

impl Corridor {
    pub fn new(length: f32, width: f32, wall_height: f32) -> Self {
        Self {
            length: length.max(0.0),
            width: width.max(0.0),
            wall_height: wall_height.max(0.0),
        }
    }

    pub fn half_length(&self) -> f32 {
        self.length / 2.0
    }

    /// `[-half + margin, half - margin]`, or `None` when the corridor is too
    /// short to leave any room to travel.
    pub fn travel_range(&self, margin: f32) -> Option<TravelRange> {
        let half = self.half_length() - margin;
        if half < 0.0 {
            None
        } else {
            Some(TravelRange { min: -half, max: half })
        }
    }

    /// Floor, ceiling, side walls, end caps and the ceiling light track.
    pub fn surfaces(&self) -> Vec<Surface> {
        let (len, w, h) = (self.length, self.width, self.wall_height);
        let half = self.half_length();
        let wall = Color::from_hex(0xf2f2f2);
        let mut surfaces = vec![
            // Floor: concrete grey
            Surface {
                center: Vec3::new(0.0, -0.05, 0.0),
                size: Vec3::new(w, 0.1, len),
                color: Color::from_hex(0xbdbdbd),
            },
            // Ceiling
            Surface {
                center: Vec3::new(0.0, h + 0.05, 0.0),
                size: Vec3::new(w, 0.1, len),
                color: Color::WHITE,
            },
            Surface {
                center: Vec3::new(-w / 2.0, h / 2.0, 0.0),
                size: Vec3::new(WALL_THICKNESS, h, len),
                color: wall,
            },
            Surface {
                center: Vec3::new(w / 2.0, h / 2.0, 0.0),
                size: Vec3::new(WALL_THICKNESS, h, len),
                color: wall,
            },
            Surface {
                center: Vec3::new(0.0, h / 2.0, -half),
                size: Vec3::new(w, h, WALL_THICKNESS),
                color: wall,
            },
            Surface {
                center: Vec3::new(0.0, h / 2.0, half),
                size: Vec3::new(w, h, WALL_THICKNESS),
                color: wall,
            },
        ];
        let track_length = len - 6.0;
        if track_length > 0.0 {
            surfaces.push(Surface {
                center: Vec3::new(0.0, h - 0.6, 0.0),
                size: Vec3::new(0.15, 0.05, track_length),
                color: Color::from_hex(0x2b2b2b),
            });
        }
        surfaces
    }

    /// Five ambient fill lights hung down the centre line.
    pub fn point_light_positions(&self) -> Vec<Vec3> {
        let extent = self.half_length() * 0.75;
        let y = (self.wall_height - 1.0).max(0.0);
        (0..5)
            .map(|i| Vec3::new(0.0, y, -extent + i as f32 * extent / 2.0))
            .collect()
    }

    /// Spots along the ceiling track, used until artworks get their own.
    pub fn track_spot_positions(&self) -> Vec<Vec3> {
        let track_length = (self.length - 6.0).max(0.0);
        let count = ((self.length / 8.0).floor() as usize).max(6);
        let start = -track_length / 2.0;
        let step = track_length / (count - 1) as f32;
        let y = (self.wall_height - 0.5).max(0.0);
        (0..count)
            .map(|i| Vec3::new(0.0, y, start + i as f32 * step))
            .collect()
    }

    /// Ceiling spot directly above an artwork, just off its wall.
    pub fn artwork_spot_position(&self, side: WallSide, z: f32) -> Vec3 {
        Vec3::new(
            side.sign() * (self.width / 2.0 - 0.35),
            (self.wall_height - 0.3).max(0.0),
            z,
        )
    }
}

/// Layout knobs, normally copied from `GalleryConfig`.
#[derive(Debug, Clone, Copy)]
pub struct LayoutParams {
    pub end_margin: f32,
    pub frame_depth: f32,
    pub wall_gap: f32,
    pub art_bottom_margin: f32,
}

/// Where one artwork hangs.
#[derive(Debug, Clone, Copy)]
pub struct ArtworkSlot {
    pub index: usize,
    pub side: WallSide,
    pub position: Vec3,
    pub rotation: Quat,
}

/// Centre height that puts the artwork's bottom edge `art_bottom_margin` above the floor.
pub fn slot_height(size: DisplaySize, params: &LayoutParams) -> f32 {
    params.art_bottom_margin + size.height * 0.5
}

/// Rotation that turns the canvas (local +Z) to face into the corridor.
pub fn wall_rotation(side: WallSide) -> Quat {
    match side {
        WallSide::Left => Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        WallSide::Right => Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2),
    }
}

/// Distribute artworks of the given sizes along the corridor.
pub fn layout_artworks(sizes: &[DisplaySize], corridor: &Corridor, params: &LayoutParams) -> Vec<ArtworkSlot> {
    let n = sizes.len();
    let half = corridor.half_length();
    let x_inner = corridor.width / 2.0 - (params.frame_depth + params.wall_gap);
    let start_z = -half + params.end_margin;
    let spacing = if n > 1 {
        2.0 * (half - params.end_margin) / (n - 1) as f32
    } else {
        0.0
    };

    sizes
        .iter()
        .enumerate()
        .map(|(index, size)| {
            let side = WallSide::for_index(index);
            // A lone artwork hangs at mid-corridor rather than at the first slot.
            let z = if n == 1 { 0.0 } else { start_z + index as f32 * spacing };
            ArtworkSlot {
                index,
                side,
                position: Vec3::new(side.sign() * x_inner, slot_height(*size, params), z),
                rotation: wall_rotation(side),
            }
        })
        .collect()
}

/// Canvas size for an image of `px_w` x `px_h` pixels: aspect preserved,
/// long edge scaled to a fixed length, both edges clamped.
pub fn compute_display_size(px_w: u32, px_h: u32) -> DisplaySize {
    let aspect = (px_w as f32 / (px_h.max(1)) as f32).max(0.1);

    let (mut w, mut h);
    if aspect >= 1.0 {
        w = LONG_EDGE.min(MAX_EDGE);
        h = w / aspect;
        if h > MAX_EDGE {
            h = MAX_EDGE;
            w = h * aspect;
        }
    } else {
        h = LONG_EDGE.min(MAX_EDGE);
        w = h * aspect;
        if w > MAX_EDGE {
            w = MAX_EDGE;
            h = w / aspect;
        }
    }
    w = w.max(MIN_EDGE);
    h = h.max(MIN_EDGE);

    DisplaySize {
        width: (w * SIZE_SCALE).min(MAX_EDGE),
        height: (h * SIZE_SCALE).min(MAX_EDGE),
    }
}

/// Canvas size for a generated artwork, from an explicit manifest size or the default.
pub fn procedural_display_size(explicit: Option<[f32; 2]>) -> DisplaySize {
    let [w, h] = explicit.unwrap_or(DEFAULT_PROCEDURAL_SIZE);
    DisplaySize {
        width: (w.max(0.0) * SIZE_SCALE).min(MAX_EDGE),
        height: (h.max(0.0) * SIZE_SCALE).min(MAX_EDGE),
    }
}
