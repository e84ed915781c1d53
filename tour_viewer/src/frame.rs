//! Headless description of what the viewer should paint for its current
//! state. Renderers (the window front end, the PNG snapshot, the transcript
//! printer) consume this instead of reaching into the session.

use tour_model::{HotspotKind, HotspotPosition};

use crate::platform::Platform;
use crate::presentation::LoadState;
use crate::rotation::Rotation;
use crate::session::{TourViewer, ViewerMode};

pub const UNAVAILABLE_MESSAGE: &str = "Virtual tour not available for this property";
pub const LOADING_MESSAGE: &str = "Loading virtual tour...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerIcon {
    /// Scene link arrow.
    Arrow,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HotspotMarker {
    pub index: usize,
    pub position: HotspotPosition,
    pub icon: MarkerIcon,
    pub label: String,
    pub focused: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneTab {
    pub index: usize,
    pub title: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneFrame {
    pub title: String,
    pub image: String,
    /// "2 of 5" style position indicator.
    pub counter: String,
    pub rotation: Rotation,
    pub loading: bool,
    pub error: Option<String>,
    pub markers: Vec<HotspotMarker>,
    pub show_previous: bool,
    pub show_next: bool,
    /// Scene selector strip; empty for single-scene tours.
    pub tabs: Vec<SceneTab>,
    pub show_controls: bool,
    pub fullscreen: bool,
    pub auto_rotate: bool,
    pub dragging: bool,
    pub display_height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerFrame {
    Placeholder { message: String },
    Scene(SceneFrame),
    /// Nothing to draw after teardown.
    Detached,
}

impl ViewerFrame {
    pub fn build<P: Platform>(viewer: &TourViewer<P>) -> Self {
        match viewer.mode() {
            ViewerMode::Unavailable => ViewerFrame::Placeholder {
                message: UNAVAILABLE_MESSAGE.to_string(),
            },
            ViewerMode::Destroyed => ViewerFrame::Detached,
            ViewerMode::Active => match build_scene_frame(viewer) {
                Some(frame) => ViewerFrame::Scene(frame),
                None => ViewerFrame::Placeholder {
                    message: UNAVAILABLE_MESSAGE.to_string(),
                },
            },
        }
    }

    pub fn scene(&self) -> Option<&SceneFrame> {
        match self {
            ViewerFrame::Scene(frame) => Some(frame),
            _ => None,
        }
    }

    /// One-line summary used for window titles and transcripts.
    pub fn describe(&self) -> String {
        match self {
            ViewerFrame::Placeholder { message } => message.clone(),
            ViewerFrame::Detached => "viewer detached".to_string(),
            ViewerFrame::Scene(frame) => {
                let status = if frame.loading {
                    LOADING_MESSAGE.to_string()
                } else if let Some(error) = &frame.error {
                    error.clone()
                } else {
                    format!(
                        "yaw {:.1} pitch {:.1}",
                        frame.rotation.yaw, frame.rotation.pitch
                    )
                };
                format!("{} ({}) - {}", frame.title, frame.counter, status)
            }
        }
    }
}

fn build_scene_frame<P: Platform>(viewer: &TourViewer<P>) -> Option<SceneFrame> {
    let index = viewer.current_scene()?;
    let tour = viewer.tour();
    let scene = tour.scene(index)?;
    let load_state = viewer.load_state()?;
    let focus = viewer.focused_hotspot();

    let markers = viewer
        .interactive_hotspots()
        .into_iter()
        .map(|(hotspot_index, hotspot)| HotspotMarker {
            index: hotspot_index,
            position: hotspot.position,
            icon: match hotspot.kind {
                HotspotKind::SceneLink { .. } => MarkerIcon::Arrow,
                HotspotKind::InfoNote { .. } => MarkerIcon::Info,
            },
            label: hotspot.accessible_label(tour.scenes()),
            focused: focus == Some(hotspot_index),
        })
        .collect();

    let tabs = if tour.len() > 1 {
        tour.scenes()
            .iter()
            .enumerate()
            .map(|(tab_index, tab_scene)| SceneTab {
                index: tab_index,
                title: tab_scene.title.clone(),
                selected: tab_index == index,
            })
            .collect()
    } else {
        Vec::new()
    };

    let config = viewer.config();
    Some(SceneFrame {
        title: scene.title.clone(),
        image: scene.image.clone(),
        counter: format!("{} of {}", index + 1, tour.len()),
        rotation: viewer.rotation(),
        loading: load_state.is_loading(),
        error: match load_state {
            LoadState::Error(message) => Some(message.clone()),
            _ => None,
        },
        markers,
        show_previous: config.show_controls && viewer.has_previous(),
        show_next: config.show_controls && viewer.has_next(),
        tabs,
        show_controls: config.show_controls,
        fullscreen: viewer.is_fullscreen(),
        auto_rotate: viewer.auto_rotate_enabled(),
        dragging: viewer.is_dragging(),
        display_height: config.display_height,
    })
}
