// Artwork manifest loading and image path resolution.
//
// The manifest is a JSON array of records. Several candidate locations are
// tried in order; the first one that loads and parses wins. There are no
// retries: a candidate that fails is simply skipped.

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};

use super::error::ManifestError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtworkRecord {
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub description: String,
    /// Filename, relative path, or URL. Absent for generated artworks.
    #[serde(default)]
    pub image: Option<String>,
    /// Explicit display size (width, height) before scaling.
    #[serde(default)]
    pub size: Option<[f32; 2]>,
}

/// Where an image is fetched from once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    File(PathBuf),
    Url(String),
}

impl ImageSource {
    pub fn describe(&self) -> String {
        match self {
            ImageSource::File(path) => path.display().to_string(),
            ImageSource::Url(url) => url.clone(),
        }
    }
}

pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Try each candidate in order and return the first manifest that parses,
/// together with the candidate it came from.
pub fn load_manifest(root: &Path, candidates: &[String]) -> Result<(Vec<ArtworkRecord>, String), ManifestError> {
    let mut attempts = Vec::new();
    for candidate in candidates {
        match load_candidate(root, candidate) {
            Ok(records) => return Ok((records, candidate.clone())),
            Err(err) => {
                log::warn!("Manifest candidate {} unavailable: {}", candidate, err);
                attempts.push(err.to_string());
            }
        }
    }
    Err(ManifestError::Exhausted { attempts })
}

fn load_candidate(root: &Path, candidate: &str) -> Result<Vec<ArtworkRecord>, ManifestError> {
    let text = if is_url(candidate) {
        fetch_text(candidate)?
    } else {
        let path = root.join(candidate.trim_start_matches('/'));
        std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ManifestError::NotFound(path.display().to_string())
            } else {
                ManifestError::Io { path: path.display().to_string(), source }
            }
        })?
    };
    parse_manifest(&text, candidate)
}

pub fn parse_manifest(text: &str, origin: &str) -> Result<Vec<ArtworkRecord>, ManifestError> {
    serde_json::from_str(text).map_err(|source| ManifestError::Malformed { path: origin.to_string(), source })
}

fn fetch_text(url: &str) -> Result<String, ManifestError> {
    let response = ureq::get(url).call().map_err(|e| match e {
        ureq::Error::Status(404, _) => ManifestError::NotFound(url.to_string()),
        ureq::Error::Status(code, _) => ManifestError::Http { url: url.to_string(), message: format!("HTTP {code}") },
        other => ManifestError::Http { url: url.to_string(), message: other.to_string() },
    })?;
    let mut text = String::new();
    response
        .into_reader()
        .read_to_string(&mut text)
        .map_err(|source| ManifestError::Io { path: url.to_string(), source })?;
    Ok(text)
}

/// Resolve a manifest image reference.
///
/// - URLs are used as-is.
/// - A bare filename is looked up in each search dir in order; if none has
///   it, the first search dir is assumed.
/// - Anything with a `/` is taken relative to the asset root.
pub fn resolve_image(root: &Path, reference: &str, search_dirs: &[String]) -> ImageSource {
    if is_url(reference) {
        return ImageSource::Url(reference.to_string());
    }

    if !reference.contains('/') {
        for dir in search_dirs {
            let candidate = root.join(dir).join(reference);
            if candidate.is_file() {
                return ImageSource::File(candidate);
            }
        }
        let default_dir = search_dirs.first().map(String::as_str).unwrap_or("");
        return ImageSource::File(root.join(default_dir).join(reference));
    }

    ImageSource::File(root.join(reference.trim_start_matches('/')))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONE: &str = r#"[{"title": "Dawn", "artist": "A. Painter", "description": "Warm", "image": "dawn.png"}]"#;

    fn dirs() -> Vec<String> {
        vec!["assets/images".into(), "images".into()]
    }

    #[test]
    fn optional_fields_default() {
        let records = parse_manifest(r#"[{"title": "Untitled"}]"#, "inline").unwrap();
        assert_eq!(records[0].artist, "");
        assert_eq!(records[0].image, None);
        assert_eq!(records[0].size, None);
    }

    #[test]
    fn primary_path_wins_when_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("artworks.json"), ONE).unwrap();
        let candidates = vec!["artworks.json".to_string(), "assets/artworks.json".to_string()];
        let (records, source) = load_manifest(dir.path(), &candidates).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(source, "artworks.json");
    }

    #[test]
    fn falls_back_when_primary_is_missing_or_malformed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();
        std::fs::write(dir.path().join("assets/artworks.json"), ONE).unwrap();
        let candidates = vec!["artworks.json".to_string(), "assets/artworks.json".to_string()];

        let (_, source) = load_manifest(dir.path(), &candidates).unwrap();
        assert_eq!(source, "assets/artworks.json");

        std::fs::write(dir.path().join("artworks.json"), "{ not json").unwrap();
        let (records, source) = load_manifest(dir.path(), &candidates).unwrap();
        assert_eq!(source, "assets/artworks.json");
        assert_eq!(records[0].title, "Dawn");
    }

    #[test]
    fn every_candidate_failing_is_exhausted() {
        let dir = tempfile::tempdir().unwrap();
        let candidates = vec!["a.json".to_string(), "b.json".to_string()];
        match load_manifest(dir.path(), &candidates) {
            Err(ManifestError::Exhausted { attempts }) => assert_eq!(attempts.len(), 2),
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[test]
    fn bare_filename_searches_dirs_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("images")).unwrap();
        std::fs::write(dir.path().join("images/dawn.png"), b"x").unwrap();

        let found = resolve_image(dir.path(), "dawn.png", &dirs());
        assert_eq!(found, ImageSource::File(dir.path().join("images/dawn.png")));

        // Not present anywhere: default to the first search dir.
        let missing = resolve_image(dir.path(), "dusk.png", &dirs());
        assert_eq!(missing, ImageSource::File(dir.path().join("assets/images/dusk.png")));
    }

    #[test]
    fn paths_and_urls() {
        let root = Path::new("/srv/gallery");
        assert_eq!(
            resolve_image(root, "/images/a.jpg", &dirs()),
            ImageSource::File(PathBuf::from("/srv/gallery/images/a.jpg"))
        );
        assert_eq!(
            resolve_image(root, "https://example.org/a.jpg", &dirs()),
            ImageSource::Url("https://example.org/a.jpg".into())
        );
    }
}
