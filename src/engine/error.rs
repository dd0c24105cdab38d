// Error types for the gallery.
// Library code propagates these; main.rs decides what is fatal.

use thiserror::Error;

/// Result type for top-level gallery operations
pub type GalleryResult<T> = Result<T, GalleryError>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    Parse { path: String, message: String },
}

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("manifest not found: {0}")]
    NotFound(String),

    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest request failed for {url}: {message}")]
    Http { url: String, message: String },

    #[error("malformed manifest {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no manifest could be loaded (tried: {})", attempts.join("; "))]
    Exhausted { attempts: Vec<String> },
}

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("failed to read image {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("image request failed for {url}: {message}")]
    Http { url: String, message: String },

    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to create render surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible graphics adapter found")]
    NoAdapter,

    #[error("failed to acquire graphics device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("unknown room: {0}")]
    UnknownRoom(String),

    #[error("window error: {0}")]
    Window(String),
}
