use tour_viewer::frame::SceneFrame;
use tour_viewer::ViewerKey;
use winit::{
    dpi::PhysicalSize,
    keyboard::{Key, NamedKey},
};

/// Marker hit radius in physical pixels.
const HIT_RADIUS: f32 = 24.0;

pub fn viewer_key(key: &Key, shift: bool) -> Option<ViewerKey> {
    match key {
        Key::Named(NamedKey::ArrowLeft) => Some(ViewerKey::ArrowLeft),
        Key::Named(NamedKey::ArrowRight) => Some(ViewerKey::ArrowRight),
        Key::Named(NamedKey::Escape) => Some(ViewerKey::Escape),
        Key::Named(NamedKey::Space) => Some(ViewerKey::Space),
        Key::Named(NamedKey::Tab) => Some(ViewerKey::Tab { shift }),
        Key::Named(NamedKey::Enter) => Some(ViewerKey::Enter),
        Key::Character(text) => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(' '), None) => Some(ViewerKey::Space),
                (Some(ch), None) => Some(ViewerKey::Char(ch)),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Index of the hotspot marker under the cursor, nearest first.
pub fn marker_at(frame: &SceneFrame, x: f64, y: f64, size: PhysicalSize<u32>) -> Option<usize> {
    let width = size.width.max(1) as f32;
    let height = size.height.max(1) as f32;
    frame
        .markers
        .iter()
        .map(|marker| {
            let (fx, fy) = marker.position.as_fraction();
            let dx = fx * width - x as f32;
            let dy = fy * height - y as f32;
            (marker.index, dx * dx + dy * dy)
        })
        .filter(|(_, distance_sq)| *distance_sq <= HIT_RADIUS * HIT_RADIUS)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use tour_model::HotspotPosition;
    use tour_viewer::frame::{HotspotMarker, MarkerIcon};
    use tour_viewer::rotation::Rotation;

    use super::*;

    fn marker(index: usize, x: f32, y: f32) -> HotspotMarker {
        HotspotMarker {
            index,
            position: HotspotPosition { x, y },
            icon: MarkerIcon::Info,
            label: format!("marker {index}"),
            focused: false,
        }
    }

    #[test]
    fn maps_named_and_character_keys() {
        assert_eq!(
            viewer_key(&Key::Named(NamedKey::Tab), true),
            Some(ViewerKey::Tab { shift: true })
        );
        assert_eq!(
            viewer_key(&Key::Character("h".into()), false),
            Some(ViewerKey::Char('h'))
        );
        assert_eq!(
            viewer_key(&Key::Character(" ".into()), false),
            Some(ViewerKey::Space)
        );
        assert_eq!(viewer_key(&Key::Named(NamedKey::F11), false), None);
    }

    #[test]
    fn hit_test_picks_nearest_marker_in_radius() {
        let frame = SceneFrame {
            title: "Bedroom".to_string(),
            image: "bedroom.jpg".to_string(),
            counter: "1 of 1".to_string(),
            rotation: Rotation::ORIGIN,
            loading: false,
            error: None,
            markers: vec![marker(0, 10.0, 10.0), marker(1, 12.0, 10.0)],
            show_previous: false,
            show_next: false,
            tabs: Vec::new(),
            show_controls: true,
            fullscreen: false,
            auto_rotate: false,
            dragging: false,
            display_height: None,
        };
        let size = PhysicalSize::new(1000, 500);
        assert_eq!(marker_at(&frame, 118.0, 50.0, size), Some(1));
        assert_eq!(marker_at(&frame, 102.0, 50.0, size), Some(0));
        assert_eq!(marker_at(&frame, 500.0, 250.0, size), None);
    }
}
