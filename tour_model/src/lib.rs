//! Scene model shared by the tour viewer and its tooling.
//!
//! Tour content arrives from an external property store as loosely shaped
//! JSON. This crate accepts both shapes the store is known to produce, drops
//! the hotspots that cannot be honoured, and hands back an immutable [`Tour`]
//! that the viewer can index without further validation.

use std::{fs, io, path::Path};

use serde::Serialize;
use thiserror::Error;

pub mod catalog;
pub mod data;

pub use catalog::PropertyCatalog;
pub use data::{NormalizedTour, TourData, TourIssue};

/// Percentage coordinates of a hotspot relative to the displayed image box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HotspotPosition {
    pub x: f32,
    pub y: f32,
}

impl HotspotPosition {
    pub const MIN: f32 = 0.0;
    pub const MAX: f32 = 100.0;

    pub fn new(x: f32, y: f32) -> Option<Self> {
        let valid = |value: f32| value.is_finite() && (Self::MIN..=Self::MAX).contains(&value);
        if valid(x) && valid(y) {
            Some(Self { x, y })
        } else {
            None
        }
    }

    /// Position as fractions of the image box (0..=1).
    pub fn as_fraction(&self) -> (f32, f32) {
        (self.x / Self::MAX, self.y / Self::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HotspotKind {
    SceneLink { target: usize },
    InfoNote { description: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hotspot {
    pub position: HotspotPosition,
    pub kind: HotspotKind,
    pub label: Option<String>,
}

impl Hotspot {
    pub fn scene_link(x: f32, y: f32, target: usize) -> Self {
        Self {
            position: HotspotPosition { x, y },
            kind: HotspotKind::SceneLink { target },
            label: None,
        }
    }

    pub fn info_note(x: f32, y: f32, description: impl Into<String>) -> Self {
        Self {
            position: HotspotPosition { x, y },
            kind: HotspotKind::InfoNote {
                description: description.into(),
            },
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Accessible name for the hotspot control. Falls back to a description of
    /// what activating it does when the content carries no label.
    pub fn accessible_label(&self, scenes: &[Scene]) -> String {
        if let Some(label) = self.label.as_deref() {
            return label.to_string();
        }
        match &self.kind {
            HotspotKind::SceneLink { target } => match scenes.get(*target) {
                Some(scene) => format!("Go to {}", scene.title),
                None => format!("Go to scene {}", target + 1),
            },
            HotspotKind::InfoNote { description } => description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub title: String,
    pub image: String,
    /// Insertion order doubles as z-order for overlapping markers.
    pub hotspots: Vec<Hotspot>,
}

impl Scene {
    pub fn new(title: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            image: image.into(),
            hotspots: Vec::new(),
        }
    }

    pub fn with_hotspot(mut self, hotspot: Hotspot) -> Self {
        self.hotspots.push(hotspot);
        self
    }
}

/// Ordered scene collection for one property. An empty tour is the
/// "unavailable" state rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tour {
    scenes: Vec<Scene>,
}

impl Tour {
    /// Builds a tour from already validated scenes. Scene links pointing past
    /// the end are removed here as well so the invariant holds for every
    /// constructed tour, not only for ones that went through [`TourData`].
    pub fn new(scenes: Vec<Scene>) -> Self {
        let mut scenes = scenes;
        let len = scenes.len();
        for (scene_index, scene) in scenes.iter_mut().enumerate() {
            scene.hotspots.retain(|hotspot| match hotspot.kind {
                HotspotKind::SceneLink { target } if target >= len => {
                    log::warn!(
                        "dropping hotspot in scene {scene_index}: link target {target} outside {len} scenes"
                    );
                    false
                }
                _ => true,
            });
        }
        Self { scenes }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        !self.scenes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn scene(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }
}

#[derive(Debug, Error)]
pub enum TourError {
    #[error("reading tour data {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("parsing tour data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse and normalize tour JSON in either accepted shape.
pub fn parse_tour_json(contents: &str) -> Result<NormalizedTour, TourError> {
    let data: TourData = serde_json::from_str(contents)?;
    Ok(data.normalize())
}

pub fn load_tour_file(path: &Path) -> Result<NormalizedTour, TourError> {
    let contents = fs::read_to_string(path).map_err(|source| TourError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_tour_json(&contents)
}
