// Engine module: gallery state, navigation and the wgpu front end.
// Everything except renderer/debug_overlay/input runs without a window.

pub mod assets;
pub mod camera;
pub mod components;
pub mod config;
pub mod corridor;
pub mod debug_overlay;
pub mod error;
pub mod frame;
pub mod gallery;
pub mod input;
pub mod manifest;
pub mod mesh;
pub mod navigation;
pub mod picking;
pub mod procedural;
pub mod renderer;
pub mod tween;
pub mod visibility;

// Re-export commonly used items
pub use config::GalleryConfig;
pub use error::{GalleryError, GalleryResult};
pub use gallery::{GalleryEvent, GalleryState};
