use std::{collections::BTreeMap, sync::Arc};

use tour_viewer::platform::{Listener, ListenerId, Platform, PlatformError};
use winit::window::{Fullscreen, Window};

/// Platform backed by a winit window. Fullscreen transitions complete
/// asynchronously on most window systems, so changes are detected by
/// re-reading the window after resize events.
pub struct WinitPlatform {
    window: Arc<Window>,
    next_listener: u64,
    listeners: BTreeMap<ListenerId, Listener>,
    reported_fullscreen: bool,
}

impl WinitPlatform {
    pub fn new(window: Arc<Window>) -> Self {
        let reported_fullscreen = window.fullscreen().is_some();
        Self {
            window,
            next_listener: 0,
            listeners: BTreeMap::new(),
            reported_fullscreen,
        }
    }

    /// True once per transition, and only while a fullscreen listener is
    /// attached.
    pub fn take_fullscreen_change(&mut self) -> bool {
        let current = self.window.fullscreen().is_some();
        if current == self.reported_fullscreen {
            return false;
        }
        self.reported_fullscreen = current;
        self.listeners
            .values()
            .any(|listener| *listener == Listener::FullscreenChange)
    }

    pub fn keys_attached(&self) -> bool {
        self.listeners
            .values()
            .any(|listener| *listener == Listener::KeyDown)
    }
}

impl Platform for WinitPlatform {
    fn request_fullscreen(&mut self) -> Result<(), PlatformError> {
        log::debug!("requesting borderless fullscreen");
        self.window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), PlatformError> {
        self.window.set_fullscreen(None);
        Ok(())
    }

    fn is_fullscreen(&self) -> bool {
        self.window.fullscreen().is_some()
    }

    fn subscribe(&mut self, listener: Listener) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.listeners.insert(id, listener);
        id
    }

    fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.remove(&id);
    }
}
