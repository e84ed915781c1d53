use crate::hotspot::HotspotAction;
use crate::platform::Platform;
use crate::rotation::{DragTracker, PointerSource};

use super::{TourViewer, ViewerNotification};

/// Keys the viewer reacts to while it has input focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerKey {
    ArrowLeft,
    ArrowRight,
    Escape,
    Space,
    Tab { shift: bool },
    Enter,
    Char(char),
}

impl ViewerKey {
    pub fn from_name(name: &str) -> Option<Self> {
        let key = match name {
            "ArrowLeft" | "left" => ViewerKey::ArrowLeft,
            "ArrowRight" | "right" => ViewerKey::ArrowRight,
            "Escape" | "escape" | "esc" => ViewerKey::Escape,
            " " | "Space" | "space" => ViewerKey::Space,
            "Tab" | "tab" => ViewerKey::Tab { shift: false },
            "ShiftTab" | "shift+tab" => ViewerKey::Tab { shift: true },
            "Enter" | "enter" => ViewerKey::Enter,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => ViewerKey::Char(ch),
                    _ => return None,
                }
            }
        };
        Some(key)
    }
}

impl<P: Platform> TourViewer<P> {
    /// Mouse-down or touch-start. Ignored unless the current scene has
    /// finished loading successfully.
    pub fn pointer_down(&mut self, x: f32, y: f32, source: PointerSource) -> bool {
        let Some(session) = self.live_mut() else {
            return false;
        };
        if !session.presentation.state().is_ready() || session.drag.is_some() {
            return false;
        }
        session.drag = Some(DragTracker::begin(x, y, source));
        self.sync_auto_rotate();
        true
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        let mapping = self.drag_mapping();
        let Some(session) = self.live_mut() else {
            return false;
        };
        if !session.presentation.state().is_ready() {
            return false;
        }
        let Some(drag) = session.drag.as_mut() else {
            return false;
        };
        let (dx, dy) = drag.advance(x, y);
        let source = drag.source();
        mapping.apply(&mut session.rotation, source, dx, dy);
        true
    }

    /// Mouse-up, touch-end, touch-cancel or pointer-leave. The view stays
    /// where the drag left it.
    pub fn pointer_up(&mut self) -> bool {
        let Some(session) = self.live_mut() else {
            return false;
        };
        if session.drag.take().is_none() {
            return false;
        }
        self.sync_auto_rotate();
        true
    }

    pub fn set_focus(&mut self, focused: bool) -> bool {
        let Some(session) = self.live_mut() else {
            return false;
        };
        if session.focused == focused {
            return false;
        }
        session.focused = focused;
        true
    }

    /// Keyboard shortcut dispatch. Returns `true` when the key was consumed
    /// and the host should suppress its default action (page scrolling).
    pub fn key(&mut self, key: ViewerKey) -> bool {
        let Some(session) = self.live() else {
            return false;
        };
        if !session.focused || session.key_listener.is_none() {
            return false;
        }
        match key {
            ViewerKey::ArrowLeft => {
                self.previous();
                true
            }
            ViewerKey::ArrowRight => {
                self.next();
                true
            }
            ViewerKey::Escape => {
                self.exit_fullscreen();
                true
            }
            ViewerKey::Space => {
                self.toggle_auto_rotate();
                true
            }
            ViewerKey::Tab { shift } => self.move_hotspot_focus(!shift),
            ViewerKey::Enter => self.activate_focused_hotspot(),
            ViewerKey::Char('h' | 'H') => {
                self.toggle_hotspots();
                true
            }
            ViewerKey::Char('f' | 'F') => {
                self.toggle_fullscreen();
                true
            }
            ViewerKey::Char(_) => false,
        }
    }

    /// Moves keyboard focus across the current scene's hotspot controls.
    pub fn move_hotspot_focus(&mut self, forward: bool) -> bool {
        let count = self.interactive_hotspots().len();
        let Some(session) = self.live_mut() else {
            return false;
        };
        let focus = if forward {
            session.hotspots.focus_next(count)
        } else {
            session.hotspots.focus_previous(count)
        };
        focus.is_some()
    }

    pub fn activate_focused_hotspot(&mut self) -> bool {
        match self.focused_hotspot() {
            Some(index) => self.activate_hotspot(index),
            None => false,
        }
    }

    /// Pointer or keyboard activation of hotspot `index` in the current
    /// scene. Info notes go to the host and leave scene and rotation alone.
    pub fn activate_hotspot(&mut self, index: usize) -> bool {
        let Some(session) = self.live() else {
            return false;
        };
        if session.presentation.state().is_loading() {
            return false;
        }
        let scene_index = session.navigator.current();
        let Some(scene) = self.tour.scene(scene_index) else {
            return false;
        };
        let Some(hotspot) = session.hotspots.eligible(scene, index) else {
            return false;
        };
        let hotspot = hotspot.clone();
        let action = HotspotAction::for_hotspot(&hotspot);
        self.notify(ViewerNotification::HotspotActivated {
            scene: scene_index,
            index,
            hotspot,
        });
        match action {
            HotspotAction::Navigate { target } => self.go_to(target),
            HotspotAction::ShowNote { description } => {
                self.notify(ViewerNotification::InfoNote { description });
                true
            }
        }
    }

    /// Shows or hides every hotspot at once.
    pub fn toggle_hotspots(&mut self) -> bool {
        let Some(session) = self.live_mut() else {
            return false;
        };
        let visible = session.hotspots.toggle_visible();
        log::debug!("hotspots {}", if visible { "shown" } else { "hidden" });
        true
    }
}
