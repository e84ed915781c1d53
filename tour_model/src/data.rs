//! Raw tour payloads as the property store serves them, plus the
//! normalization pass into [`Tour`].
//!
//! Two shapes circulate: a scene tree (`scenes[].hotspots[]`) and a flat
//! layout (`images[]` with a separate `hotspots[]` list whose entries name
//! their owning scene). Both collapse into the same scene model.
//!
//! Hotspot entries stay as raw JSON until normalization so one badly typed
//! entry costs only that hotspot.

use std::fmt;

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use thiserror::Error;

use crate::{Hotspot, HotspotKind, HotspotPosition, Scene, Tour};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TourData {
    SceneTree(SceneTreeData),
    Flat(FlatTourData),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneTreeData {
    pub scenes: Vec<RawScene>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawScene {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "panoramicImage", alias = "panoramic_image")]
    pub image: Option<String>,
    #[serde(default)]
    pub hotspots: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHotspot {
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: Option<String>,
    #[serde(default, alias = "targetScene", alias = "target_scene")]
    pub target: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "title")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlatTourData {
    pub images: Vec<FlatImage>,
    #[serde(default)]
    pub hotspots: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FlatImage {
    Url(String),
    Entry {
        #[serde(alias = "src")]
        url: String,
        #[serde(default)]
        title: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlatHotspot {
    #[serde(default, alias = "sceneIndex", alias = "scene_index", alias = "image")]
    pub scene: Option<i64>,
    #[serde(flatten)]
    pub hotspot: RawHotspot,
}

/// Content problems found while normalizing. None of these abort loading; the
/// offending hotspot (or image reference) is dropped and reported.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("scene link targets scene {target} but the tour has {scene_count} scenes")]
    LinkOutOfRange { target: i64, scene_count: usize },
    #[error("scene link is missing its target scene")]
    MissingTarget,
    #[error("info note has no description")]
    MissingDescription,
    #[error("unknown hotspot type '{0}'")]
    UnknownKind(String),
    #[error("hotspot position is missing")]
    MissingPosition,
    #[error("hotspot position ({x}, {y}) is outside 0-100")]
    InvalidPosition { x: f32, y: f32 },
    #[error("hotspot refers to scene {scene} which does not exist")]
    UnknownOwnerScene { scene: i64 },
    #[error("scene has no image reference")]
    MissingImage,
    #[error("hotspot entry is malformed: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TourIssue {
    /// Scene the problem was found in, when it could be attributed to one.
    pub scene: Option<usize>,
    /// Position of the hotspot in its source list.
    pub hotspot: Option<usize>,
    pub error: ConfigurationError,
}

impl fmt::Display for TourIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.scene, self.hotspot) {
            (Some(scene), Some(hotspot)) => {
                write!(f, "scene {scene} hotspot {hotspot}: {}", self.error)
            }
            (Some(scene), None) => write!(f, "scene {scene}: {}", self.error),
            (None, Some(hotspot)) => write!(f, "hotspot {hotspot}: {}", self.error),
            (None, None) => write!(f, "{}", self.error),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NormalizedTour {
    pub tour: Tour,
    pub issues: Vec<TourIssue>,
}

impl TourData {
    pub fn scene_count(&self) -> usize {
        match self {
            TourData::SceneTree(tree) => tree.scenes.len(),
            TourData::Flat(flat) => flat.images.len(),
        }
    }

    pub fn normalize(&self) -> NormalizedTour {
        let mut issues = Vec::new();
        let scenes = match self {
            TourData::SceneTree(tree) => normalize_tree(tree, &mut issues),
            TourData::Flat(flat) => normalize_flat(flat, &mut issues),
        };
        for issue in &issues {
            log::warn!("tour content: {issue}");
        }
        NormalizedTour {
            tour: Tour::new(scenes),
            issues,
        }
    }
}

fn normalize_tree(tree: &SceneTreeData, issues: &mut Vec<TourIssue>) -> Vec<Scene> {
    let scene_count = tree.scenes.len();
    tree.scenes
        .iter()
        .enumerate()
        .map(|(scene_index, raw)| {
            let image = raw.image.clone().unwrap_or_else(|| {
                issues.push(TourIssue {
                    scene: Some(scene_index),
                    hotspot: None,
                    error: ConfigurationError::MissingImage,
                });
                String::new()
            });
            let title = raw
                .title
                .clone()
                .unwrap_or_else(|| default_scene_title(scene_index));
            let mut scene = Scene::new(title, image);
            for (hotspot_index, raw_hotspot) in raw.hotspots.iter().enumerate() {
                let converted = decode_entry::<RawHotspot>(raw_hotspot)
                    .and_then(|raw_hotspot| convert_hotspot(&raw_hotspot, scene_count));
                match converted {
                    Ok(hotspot) => scene.hotspots.push(hotspot),
                    Err(error) => issues.push(TourIssue {
                        scene: Some(scene_index),
                        hotspot: Some(hotspot_index),
                        error,
                    }),
                }
            }
            scene
        })
        .collect()
}

fn normalize_flat(flat: &FlatTourData, issues: &mut Vec<TourIssue>) -> Vec<Scene> {
    let scene_count = flat.images.len();
    let mut scenes: Vec<Scene> = flat
        .images
        .iter()
        .enumerate()
        .map(|(index, image)| match image {
            FlatImage::Url(url) => Scene::new(default_scene_title(index), url.clone()),
            FlatImage::Entry { url, title } => Scene::new(
                title.clone().unwrap_or_else(|| default_scene_title(index)),
                url.clone(),
            ),
        })
        .collect();

    for (hotspot_index, entry) in flat.hotspots.iter().enumerate() {
        let flat_hotspot = match decode_entry::<FlatHotspot>(entry) {
            Ok(flat_hotspot) => flat_hotspot,
            Err(error) => {
                issues.push(TourIssue {
                    scene: None,
                    hotspot: Some(hotspot_index),
                    error,
                });
                continue;
            }
        };
        let owner = match flat_hotspot.scene {
            Some(scene) if scene >= 0 && (scene as usize) < scene_count => scene as usize,
            Some(scene) => {
                issues.push(TourIssue {
                    scene: None,
                    hotspot: Some(hotspot_index),
                    error: ConfigurationError::UnknownOwnerScene { scene },
                });
                continue;
            }
            None => {
                issues.push(TourIssue {
                    scene: None,
                    hotspot: Some(hotspot_index),
                    error: ConfigurationError::UnknownOwnerScene { scene: -1 },
                });
                continue;
            }
        };
        match convert_hotspot(&flat_hotspot.hotspot, scene_count) {
            Ok(hotspot) => scenes[owner].hotspots.push(hotspot),
            Err(error) => issues.push(TourIssue {
                scene: Some(owner),
                hotspot: Some(hotspot_index),
                error,
            }),
        }
    }
    scenes
}

fn decode_entry<T: DeserializeOwned>(entry: &Value) -> Result<T, ConfigurationError> {
    T::deserialize(entry).map_err(|err| ConfigurationError::Malformed(err.to_string()))
}

fn default_scene_title(index: usize) -> String {
    format!("View {}", index + 1)
}

fn convert_hotspot(raw: &RawHotspot, scene_count: usize) -> Result<Hotspot, ConfigurationError> {
    let (x, y) = match (raw.x, raw.y) {
        (Some(x), Some(y)) => (x, y),
        _ => return Err(ConfigurationError::MissingPosition),
    };
    let position =
        HotspotPosition::new(x, y).ok_or(ConfigurationError::InvalidPosition { x, y })?;

    let kind_name = match raw.kind.as_deref() {
        Some(name) => name.trim().to_ascii_lowercase(),
        None if raw.target.is_some() => "scene".to_string(),
        None => "info".to_string(),
    };

    let kind = match kind_name.as_str() {
        "scene" | "link" | "navigation" => {
            let target = raw.target.ok_or(ConfigurationError::MissingTarget)?;
            if target < 0 || target as usize >= scene_count {
                return Err(ConfigurationError::LinkOutOfRange {
                    target,
                    scene_count,
                });
            }
            HotspotKind::SceneLink {
                target: target as usize,
            }
        }
        "info" | "note" => {
            let description = raw
                .description
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .ok_or(ConfigurationError::MissingDescription)?;
            HotspotKind::InfoNote {
                description: description.to_string(),
            }
        }
        other => return Err(ConfigurationError::UnknownKind(other.to_string())),
    };

    Ok(Hotspot {
        position,
        kind,
        label: raw.label.clone(),
    })
}
