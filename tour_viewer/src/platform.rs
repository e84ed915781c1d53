//! Display-environment capabilities the viewer needs but does not own:
//! fullscreen control and the process-wide listener registry. The platform
//! stays authoritative for fullscreen; the session only mirrors what the
//! platform reports through its change notification.

use std::collections::{BTreeMap, VecDeque};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listener {
    FullscreenChange,
    KeyDown,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("fullscreen request denied: {0}")]
    Denied(String),
    #[error("fullscreen is not supported on this platform")]
    Unsupported,
}

pub trait Platform {
    fn request_fullscreen(&mut self) -> Result<(), PlatformError>;
    fn exit_fullscreen(&mut self) -> Result<(), PlatformError>;
    fn is_fullscreen(&self) -> bool;
    fn subscribe(&mut self, listener: Listener) -> ListenerId;
    fn unsubscribe(&mut self, id: ListenerId);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformRequest {
    EnterFullscreen,
    ExitFullscreen,
}

/// In-process platform used for headless runs and tests. Fullscreen changes
/// take effect immediately on the platform side but the change notification
/// is queued until the host delivers it, mimicking an asynchronous display
/// server.
#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    fullscreen: bool,
    deny_fullscreen: bool,
    next_listener: u64,
    listeners: BTreeMap<ListenerId, Listener>,
    pending_changes: VecDeque<bool>,
    requests: Vec<PlatformRequest>,
}

impl HeadlessPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every future fullscreen request.
    pub fn deny_fullscreen(&mut self, deny: bool) {
        self.deny_fullscreen = deny;
    }

    /// Fullscreen flipped by something other than the viewer (user gesture,
    /// window manager).
    pub fn set_fullscreen_externally(&mut self, fullscreen: bool) {
        if self.fullscreen != fullscreen {
            self.fullscreen = fullscreen;
            self.pending_changes.push_back(fullscreen);
        }
    }

    /// Pops the next queued change notification, if a fullscreen listener is
    /// attached to receive it.
    pub fn take_change_notification(&mut self) -> Option<bool> {
        let change = self.pending_changes.pop_front()?;
        if self.has_listener(Listener::FullscreenChange) {
            Some(change)
        } else {
            None
        }
    }

    pub fn has_listener(&self, listener: Listener) -> bool {
        self.listeners.values().any(|kind| *kind == listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn requests(&self) -> &[PlatformRequest] {
        &self.requests
    }
}

impl Platform for HeadlessPlatform {
    fn request_fullscreen(&mut self) -> Result<(), PlatformError> {
        self.requests.push(PlatformRequest::EnterFullscreen);
        if self.deny_fullscreen {
            return Err(PlatformError::Denied("headless platform policy".to_string()));
        }
        self.set_fullscreen_externally(true);
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), PlatformError> {
        self.requests.push(PlatformRequest::ExitFullscreen);
        self.set_fullscreen_externally(false);
        Ok(())
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
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
