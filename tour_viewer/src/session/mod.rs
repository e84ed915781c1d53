//! The viewer session: one instance per mounted tour. It owns the navigation
//! cursor, rotation, load state, drag tracking, hotspot focus, the auto-rotate
//! timer and the platform listener registrations, and releases all of them on
//! [`TourViewer::destroy`] (or drop). Submodules split the event handlers:
//! `input` routes pointer, keyboard and hotspot activation, `lifecycle` covers
//! scene selection, asset completions, fullscreen and the timer.

use std::sync::Arc;
use std::time::Instant;

use tour_model::{Hotspot, Scene, Tour};

use crate::autorotate::AutoRotateTask;
use crate::clock::Clock;
use crate::config::ViewerConfig;
use crate::hotspot::HotspotDispatch;
use crate::navigation::SceneNavigator;
use crate::platform::{Listener, ListenerId, Platform};
use crate::presentation::{LoadState, ScenePresentation, SceneTicket};
use crate::rotation::{DragMapping, DragTracker, PointerSource, Rotation};

mod input;
mod lifecycle;

pub use input::ViewerKey;

/// Outbound events for the host page. Drained with
/// [`TourViewer::take_notifications`].
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerNotification {
    /// The host should resolve `image` and report back with `ticket`.
    LoadRequested { ticket: SceneTicket, image: String },
    SceneChanged { index: usize, title: String },
    HotspotActivated {
        scene: usize,
        index: usize,
        hotspot: Hotspot,
    },
    InfoNote { description: String },
    LoadFailed { ticket: SceneTicket, message: String },
    FullscreenChanged { fullscreen: bool },
    AutoRotateChanged { enabled: bool },
}

/// Every event the session reacts to, for hosts that prefer a single entry
/// point over the individual methods.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerInput {
    PointerDown {
        x: f32,
        y: f32,
        source: PointerSource,
    },
    PointerMove {
        x: f32,
        y: f32,
    },
    PointerUp,
    PointerLeave,
    PointerCancel,
    Key(ViewerKey),
    Focus(bool),
    FullscreenChanged,
    AssetLoaded(SceneTicket),
    AssetFailed {
        ticket: SceneTicket,
        detail: String,
    },
    ActivateHotspot(usize),
    ToggleHotspots,
    ToggleAutoRotate,
    ToggleFullscreen,
    GoTo(usize),
    Next,
    Previous,
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerMode {
    /// No scenes; a placeholder is shown and nothing is wired up.
    Unavailable,
    Active,
    Destroyed,
}

#[derive(Debug)]
struct ActiveSession {
    navigator: SceneNavigator,
    presentation: ScenePresentation,
    rotation: Rotation,
    drag: Option<DragTracker>,
    hotspots: HotspotDispatch,
    auto_rotate_enabled: bool,
    auto_rotate: Option<AutoRotateTask>,
    is_fullscreen: bool,
    focused: bool,
    fullscreen_listener: Option<ListenerId>,
    key_listener: Option<ListenerId>,
}

pub struct TourViewer<P: Platform> {
    tour: Tour,
    config: ViewerConfig,
    platform: P,
    clock: Arc<dyn Clock>,
    session: Option<ActiveSession>,
    destroyed: bool,
    notifications: Vec<ViewerNotification>,
    /// Generation the next session's first ticket starts from.
    next_generation: u64,
}

impl<P: Platform> TourViewer<P> {
    pub fn new(tour: Tour, config: ViewerConfig, platform: P, clock: Arc<dyn Clock>) -> Self {
        let config = config.sanitized();
        let start = config.initial_scene_for(tour.len());
        let mut viewer = Self {
            tour,
            config,
            platform,
            clock,
            session: None,
            destroyed: false,
            notifications: Vec::new(),
            next_generation: 0,
        };
        viewer.start_session(start);
        viewer
    }

    pub fn mode(&self) -> ViewerMode {
        if self.destroyed {
            ViewerMode::Destroyed
        } else if self.session.is_some() {
            ViewerMode::Active
        } else {
            ViewerMode::Unavailable
        }
    }

    pub fn is_available(&self) -> bool {
        self.tour.is_available()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn tour(&self) -> &Tour {
        &self.tour
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn current_scene(&self) -> Option<usize> {
        self.session.as_ref().map(|session| session.navigator.current())
    }

    pub fn current_scene_data(&self) -> Option<&Scene> {
        self.current_scene().and_then(|index| self.tour.scene(index))
    }

    pub fn current_ticket(&self) -> Option<SceneTicket> {
        self.session
            .as_ref()
            .map(|session| session.presentation.ticket())
    }

    pub fn rotation(&self) -> Rotation {
        self.session
            .as_ref()
            .map(|session| session.rotation)
            .unwrap_or_default()
    }

    pub fn load_state(&self) -> Option<&LoadState> {
        self.session
            .as_ref()
            .map(|session| session.presentation.state())
    }

    pub fn is_fullscreen(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.is_fullscreen)
    }

    pub fn is_dragging(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.drag.is_some())
    }

    pub fn auto_rotate_enabled(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.auto_rotate_enabled)
    }

    /// True while the periodic timer is actually scheduled.
    pub fn auto_rotate_running(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.auto_rotate.is_some())
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.session
            .as_ref()
            .and_then(|session| session.auto_rotate.as_ref())
            .map(AutoRotateTask::next_due)
    }

    pub fn has_focus(&self) -> bool {
        self.session.as_ref().is_some_and(|session| session.focused)
    }

    pub fn hotspots_visible(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.hotspots.visible())
    }

    pub fn focused_hotspot(&self) -> Option<usize> {
        self.session
            .as_ref()
            .and_then(|session| session.hotspots.focus())
    }

    pub fn has_previous(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.navigator.has_previous())
    }

    pub fn has_next(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.navigator.has_next())
    }

    /// Hotspots of the current scene that are rendered and can be activated,
    /// with their index in the scene's list.
    pub fn interactive_hotspots(&self) -> Vec<(usize, &Hotspot)> {
        let Some(session) = self.live() else {
            return Vec::new();
        };
        if session.presentation.state().is_loading() || !session.hotspots.visible() {
            return Vec::new();
        }
        self.tour
            .scene(session.navigator.current())
            .map(|scene| scene.hotspots.iter().enumerate().collect())
            .unwrap_or_default()
    }

    pub fn take_notifications(&mut self) -> Vec<ViewerNotification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn handle(&mut self, input: ViewerInput) -> bool {
        match input {
            ViewerInput::PointerDown { x, y, source } => self.pointer_down(x, y, source),
            ViewerInput::PointerMove { x, y } => self.pointer_move(x, y),
            ViewerInput::PointerUp | ViewerInput::PointerLeave | ViewerInput::PointerCancel => {
                self.pointer_up()
            }
            ViewerInput::Key(key) => self.key(key),
            ViewerInput::Focus(focused) => self.set_focus(focused),
            ViewerInput::FullscreenChanged => self.fullscreen_changed(),
            ViewerInput::AssetLoaded(ticket) => self.asset_loaded(ticket),
            ViewerInput::AssetFailed { ticket, detail } => self.asset_failed(ticket, &detail),
            ViewerInput::ActivateHotspot(index) => self.activate_hotspot(index),
            ViewerInput::ToggleHotspots => self.toggle_hotspots(),
            ViewerInput::ToggleAutoRotate => self.toggle_auto_rotate(),
            ViewerInput::ToggleFullscreen => self.toggle_fullscreen(),
            ViewerInput::GoTo(index) => self.go_to(index),
            ViewerInput::Next => self.next(),
            ViewerInput::Previous => self.previous(),
            ViewerInput::Tick => self.poll_timers(),
        }
    }

    fn live(&self) -> Option<&ActiveSession> {
        if self.destroyed {
            return None;
        }
        self.session.as_ref()
    }

    fn live_mut(&mut self) -> Option<&mut ActiveSession> {
        if self.destroyed {
            return None;
        }
        self.session.as_mut()
    }

    fn notify(&mut self, notification: ViewerNotification) {
        log::trace!("viewer notification: {notification:?}");
        self.notifications.push(notification);
    }

    fn drag_mapping(&self) -> DragMapping {
        DragMapping {
            mouse_sensitivity: self.config.mouse_sensitivity,
            touch_sensitivity: self.config.touch_sensitivity,
            pitch_limit: self.config.pitch_limit,
            axes: self.config.axes,
        }
    }

    fn start_session(&mut self, start: usize) {
        if !self.tour.is_available() {
            log::info!("virtual tour unavailable; showing placeholder");
            return;
        }
        let fullscreen_listener = self.platform.subscribe(Listener::FullscreenChange);
        let key_listener = self.platform.subscribe(Listener::KeyDown);
        self.session = Some(ActiveSession {
            navigator: SceneNavigator::new(self.tour.len(), start, self.config.boundary),
            presentation: ScenePresentation::starting_at(start, self.next_generation),
            rotation: Rotation::ORIGIN,
            drag: None,
            hotspots: HotspotDispatch::new(self.config.show_hotspots),
            auto_rotate_enabled: self.config.auto_rotate,
            auto_rotate: None,
            is_fullscreen: self.platform.is_fullscreen(),
            focused: false,
            fullscreen_listener: Some(fullscreen_listener),
            key_listener: Some(key_listener),
        });
        self.request_current_image();
        log::info!(
            "tour viewer ready: {} scenes, starting at {}",
            self.tour.len(),
            start
        );
    }

    /// Releases the timer and listener registrations of the running session.
    fn teardown(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.auto_rotate = None;
            session.drag = None;
            for id in [session.fullscreen_listener.take(), session.key_listener.take()]
                .into_iter()
                .flatten()
            {
                self.platform.unsubscribe(id);
            }
        }
    }

    /// Swaps in a different tour. Nothing carries over from the previous one;
    /// the new tour starts at its first scene.
    pub fn replace_tour(&mut self, tour: Tour) {
        if self.destroyed {
            return;
        }
        self.teardown();
        if let Some(session) = self.session.take() {
            self.next_generation = session.presentation.ticket().generation + 1;
        }
        self.tour = tour;
        self.start_session(0);
    }

    /// Cancels the auto-rotate timer and detaches every platform listener.
    /// Inputs are ignored afterwards. Safe to call more than once.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.teardown();
        self.destroyed = true;
        log::debug!("tour viewer destroyed");
    }
}

impl<P: Platform> Drop for TourViewer<P> {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests;
