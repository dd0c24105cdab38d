// Background image loading.
//
// Each request decodes on its own worker thread and posts the result to a
// channel. The frame loop drains the channel at the start of a tick, so
// artwork state is only ever written from the main thread.

use bevy_ecs::entity::Entity;
use image::RgbaImage;
use std::io::Read;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use super::error::AssetError;
use super::manifest::ImageSource;

/// A decoded image plus the pixel size of the original file.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub image: Arc<RgbaImage>,
    /// Dimensions before any downscaling; these drive the display aspect.
    pub source_width: u32,
    pub source_height: u32,
}

#[derive(Debug)]
pub struct TextureLoaded {
    pub entity: Entity,
    pub source: String,
    pub result: Result<LoadedImage, AssetError>,
}

pub struct TextureLoader {
    tx: Sender<TextureLoaded>,
    rx: Receiver<TextureLoaded>,
    max_edge: u32,
    in_flight: usize,
}

impl TextureLoader {
    pub fn new(max_edge: u32) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx, max_edge: max_edge.max(1), in_flight: 0 }
    }

    pub fn request(&mut self, entity: Entity, source: ImageSource) {
        let tx = self.tx.clone();
        let max_edge = self.max_edge;
        self.in_flight += 1;
        std::thread::spawn(move || {
            let result = load_image(&source, max_edge);
            // The receiver only goes away on shutdown.
            let _ = tx.send(TextureLoaded { entity, source: source.describe(), result });
        });
    }

    /// Everything that finished since the last call.
    pub fn drain(&mut self) -> Vec<TextureLoaded> {
        let done: Vec<_> = self.rx.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(done.len());
        done
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Block until every outstanding request has finished. Test helper.
    #[cfg(test)]
    pub fn wait_all(&mut self) -> Vec<TextureLoaded> {
        let mut done = Vec::new();
        while self.in_flight > 0 {
            match self.rx.recv() {
                Ok(loaded) => {
                    self.in_flight -= 1;
                    done.push(loaded);
                }
                Err(_) => break,
            }
        }
        done
    }
}

pub fn load_image(source: &ImageSource, max_edge: u32) -> Result<LoadedImage, AssetError> {
    let bytes = read_bytes(source)?;
    let decoded = image::load_from_memory(&bytes).map_err(|e| AssetError::Decode { path: source.describe(), source: e })?;
    let (source_width, source_height) = (decoded.width(), decoded.height());
    let decoded = if source_width > max_edge || source_height > max_edge {
        decoded.thumbnail(max_edge, max_edge)
    } else {
        decoded
    };
    Ok(LoadedImage {
        image: Arc::new(decoded.to_rgba8()),
        source_width,
        source_height,
    })
}

fn read_bytes(source: &ImageSource) -> Result<Vec<u8>, AssetError> {
    match source {
        ImageSource::File(path) => std::fs::read(path).map_err(|e| AssetError::Io { path: path.display().to_string(), source: e }),
        ImageSource::Url(url) => {
            let response = ureq::get(url)
                .call()
                .map_err(|e| AssetError::Http { url: url.clone(), message: e.to_string() })?;
            let mut bytes = Vec::new();
            response
                .into_reader()
                .read_to_end(&mut bytes)
                .map_err(|e| AssetError::Io { path: url.clone(), source: e })?;
            Ok(bytes)
        }
    }
}
