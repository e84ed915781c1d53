use tour_model::{Hotspot, HotspotKind, Scene};

/// What activating a hotspot asks the session to do.
#[derive(Debug, Clone, PartialEq)]
pub enum HotspotAction {
    Navigate { target: usize },
    ShowNote { description: String },
}

impl HotspotAction {
    pub fn for_hotspot(hotspot: &Hotspot) -> Self {
        match &hotspot.kind {
            HotspotKind::SceneLink { target } => HotspotAction::Navigate { target: *target },
            HotspotKind::InfoNote { description } => HotspotAction::ShowNote {
                description: description.clone(),
            },
        }
    }
}

/// Visibility flag plus the keyboard focus cursor over the current scene's
/// hotspot controls. Focus is an index into the scene's hotspot list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotspotDispatch {
    visible: bool,
    focus: Option<usize>,
}

impl HotspotDispatch {
    pub fn new(visible: bool) -> Self {
        Self {
            visible,
            focus: None,
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        if !visible {
            self.focus = None;
        }
    }

    pub fn toggle_visible(&mut self) -> bool {
        self.set_visible(!self.visible);
        self.visible
    }

    pub fn focus(&self) -> Option<usize> {
        self.focus
    }

    /// Drops focus when the active hotspot set is swapped out.
    pub fn reset_focus(&mut self) {
        self.focus = None;
    }

    pub fn focus_next(&mut self, count: usize) -> Option<usize> {
        if !self.visible || count == 0 {
            self.focus = None;
            return None;
        }
        let next = match self.focus {
            Some(idx) => (idx + 1) % count,
            None => 0,
        };
        self.focus = Some(next);
        self.focus
    }

    pub fn focus_previous(&mut self, count: usize) -> Option<usize> {
        if !self.visible || count == 0 {
            self.focus = None;
            return None;
        }
        let previous = match self.focus {
            Some(0) | None => count - 1,
            Some(idx) => idx - 1,
        };
        self.focus = Some(previous);
        self.focus
    }

    /// Hotspot at `index` in `scene` when it may currently be interacted
    /// with.
    pub fn eligible<'a>(&self, scene: &'a Scene, index: usize) -> Option<&'a Hotspot> {
        if !self.visible {
            return None;
        }
        scene.hotspots.get(index)
    }
}
