// Gallery tuning constants.
// Every field has a default, so a RON file only needs the values it overrides.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::ConfigError;

/// Environment variable consulted when no config path is given on the command line.
pub const CONFIG_ENV_VAR: &str = "GALLERY_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    // ── Corridor ────────────────────────────────────────────────────────────
    pub corridor_length: f32,
    pub corridor_width: f32,
    pub wall_height: f32,

    // ── Layout ──────────────────────────────────────────────────────────────
    /// Distance from each end cap to the first/last artwork slot.
    pub end_margin: f32,
    pub frame_depth: f32,
    /// Gap between the wall surface and the back of a frame.
    pub wall_gap: f32,
    /// Height of the bottom edge of every artwork above the floor.
    pub art_bottom_margin: f32,

    // ── Camera & navigation ─────────────────────────────────────────────────
    pub eye_height: f32,
    /// Camera Z is kept this far from each end of the corridor.
    pub travel_margin: f32,
    /// World units per second while W/S is held.
    pub move_speed: f32,
    /// Distance ahead of the camera of the free-roam look-at point.
    pub look_radius: f32,
    /// Per-tick blend of the look-at point toward its desired value.
    pub look_blend: f32,
    /// Per-tick slerp factor of the camera orientation.
    pub orientation_slerp: f32,
    /// Duration of fly-to / fly-from animations in seconds.
    pub tween_duration: f32,
    /// Distance kept between the camera and the opposite wall while viewing an artwork.
    pub wall_clearance: f32,
    pub initial_position: Vec3,
    pub initial_look_at: Vec3,
    pub fov_degrees: f32,

    // ── Visibility & LOD ────────────────────────────────────────────────────
    /// Objects further than this along Z from the camera are not drawn.
    pub activation_radius: f32,
    /// Extra activation radius for ambient point lights.
    pub point_light_radius_bonus: f32,
    /// Procedural artworks closer than this use their high resolution texture.
    pub lod_high_distance: f32,

    // ── Frame loop ──────────────────────────────────────────────────────────
    /// Maximum processed frames per second. 0 disables the cap.
    pub fps_cap: u32,

    // ── Assets ──────────────────────────────────────────────────────────────
    pub asset_root: PathBuf,
    /// Manifest locations, tried in order. Relative entries resolve against `asset_root`.
    pub manifest_paths: Vec<String>,
    /// Directories searched, in order, for bare image filenames.
    pub image_dirs: Vec<String>,
    /// Decoded images larger than this on either edge are downscaled.
    pub max_texture_edge: u32,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            corridor_length: 80.0,
            corridor_width: 6.0,
            wall_height: 8.0,

            end_margin: 2.0,
            frame_depth: 0.1,
            wall_gap: 0.12,
            art_bottom_margin: 1.1,

            eye_height: 2.0,
            travel_margin: 2.5,
            move_speed: 10.0,
            look_radius: 10.0,
            look_blend: 0.3,
            orientation_slerp: 0.25,
            tween_duration: 1.0,
            wall_clearance: 0.35,
            initial_position: Vec3::new(0.0, 2.0, 10.0),
            initial_look_at: Vec3::new(0.0, 2.0, 0.0),
            fov_degrees: 75.0,

            activation_radius: 24.0,
            point_light_radius_bonus: 6.0,
            lod_high_distance: 15.0,

            fps_cap: 60,

            asset_root: PathBuf::from("."),
            manifest_paths: vec!["artworks.json".into(), "assets/artworks.json".into()],
            image_dirs: vec!["assets/images".into(), "images".into()],
            max_texture_edge: 2048,
        }
    }
}

impl GalleryConfig {
    /// Load from a RON file, or return defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron(&text).map_err(|message| ConfigError::Parse {
            path: path.display().to_string(),
            message,
        })
    }

    pub fn from_ron(text: &str) -> Result<Self, String> {
        ron::from_str(text).map_err(|e| e.to_string())
    }

    /// First CLI argument, falling back to the `GALLERY_CONFIG` environment variable.
    pub fn path_from_env() -> Option<PathBuf> {
        std::env::args_os()
            .nth(1)
            .map(PathBuf::from)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_path_gives_defaults() {
        let config = GalleryConfig::load(None).unwrap();
        assert_eq!(config.corridor_length, 80.0);
        assert_eq!(config.fps_cap, 60);
        assert_eq!(config.manifest_paths.len(), 2);
    }

    #[test]
    fn partial_ron_overrides_only_named_fields() {
        let config = GalleryConfig::from_ron("(corridor_length: 40.0, fps_cap: 0)").unwrap();
        assert_eq!(config.corridor_length, 40.0);
        assert_eq!(config.fps_cap, 0);
        assert_eq!(config.corridor_width, 6.0);
        assert_eq!(config.move_speed, 10.0);
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = GalleryConfig::load(Some(&dir.path().join("nope.ron"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "(corridor_length: \"long\")").unwrap();
        let err = GalleryConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
