use crate::autorotate::AutoRotateTask;
use crate::platform::Platform;
use crate::presentation::{SceneTicket, LOAD_FAILED_MESSAGE};
use crate::rotation::Rotation;

use super::{TourViewer, ViewerNotification};

impl<P: Platform> TourViewer<P> {
    /// Selects scene `index`. Rotation is reset and the scene enters
    /// `Loading` before this returns; the image itself resolves later.
    pub fn go_to(&mut self, index: usize) -> bool {
        let Some(session) = self.live_mut() else {
            return false;
        };
        if !session.navigator.go_to(index) {
            return false;
        }
        self.enter_current_scene();
        true
    }

    pub fn next(&mut self) -> bool {
        let Some(session) = self.live_mut() else {
            return false;
        };
        if !session.navigator.next() {
            return false;
        }
        self.enter_current_scene();
        true
    }

    pub fn previous(&mut self) -> bool {
        let Some(session) = self.live_mut() else {
            return false;
        };
        if !session.navigator.previous() {
            return false;
        }
        self.enter_current_scene();
        true
    }

    fn enter_current_scene(&mut self) {
        let Some(session) = self.live_mut() else {
            return;
        };
        let index = session.navigator.current();
        session.rotation = Rotation::ORIGIN;
        session.drag = None;
        session.hotspots.reset_focus();
        session.presentation.select(index);
        self.sync_auto_rotate();

        if let Some(scene) = self.tour.scene(index) {
            let title = scene.title.clone();
            log::info!("navigated to {title} (scene {index})");
            self.notify(ViewerNotification::SceneChanged { index, title });
        }
        self.request_current_image();
    }

    pub(super) fn request_current_image(&mut self) {
        let Some(session) = self.live() else {
            return;
        };
        let ticket = session.presentation.ticket();
        let Some(scene) = self.tour.scene(ticket.scene) else {
            return;
        };
        let image = scene.image.clone();
        self.notify(ViewerNotification::LoadRequested { ticket, image });
    }

    /// Completion of the image load for `ticket`. Returns `false` when the
    /// result belongs to a selection that is no longer current.
    pub fn asset_loaded(&mut self, ticket: SceneTicket) -> bool {
        let Some(session) = self.live_mut() else {
            return false;
        };
        if !session.presentation.resolve(ticket) {
            return false;
        }
        self.sync_auto_rotate();
        true
    }

    pub fn asset_failed(&mut self, ticket: SceneTicket, detail: &str) -> bool {
        let Some(session) = self.live_mut() else {
            return false;
        };
        if !session.presentation.fail(ticket, LOAD_FAILED_MESSAGE) {
            return false;
        }
        log::warn!("failed to load panorama for {ticket}: {detail}");
        self.sync_auto_rotate();
        self.notify(ViewerNotification::LoadFailed {
            ticket,
            message: LOAD_FAILED_MESSAGE.to_string(),
        });
        true
    }

    /// Asks the platform to enter or leave fullscreen. The session's flag is
    /// left alone; it follows the platform's change notification.
    pub fn toggle_fullscreen(&mut self) -> bool {
        if self.live().is_none() {
            return false;
        }
        let result = if self.platform.is_fullscreen() {
            self.platform.exit_fullscreen()
        } else {
            self.platform.request_fullscreen()
        };
        match result {
            Ok(()) => true,
            Err(err) => {
                log::warn!("fullscreen request failed: {err}");
                false
            }
        }
    }

    pub fn exit_fullscreen(&mut self) -> bool {
        if self.live().is_none() || !self.platform.is_fullscreen() {
            return false;
        }
        match self.platform.exit_fullscreen() {
            Ok(()) => true,
            Err(err) => {
                log::warn!("exiting fullscreen failed: {err}");
                false
            }
        }
    }

    /// Platform fullscreen-change notification. Re-reads the platform state.
    pub fn fullscreen_changed(&mut self) -> bool {
        let reported = self.platform.is_fullscreen();
        let Some(session) = self.live_mut() else {
            return false;
        };
        if session.fullscreen_listener.is_none() || session.is_fullscreen == reported {
            return false;
        }
        session.is_fullscreen = reported;
        self.notify(ViewerNotification::FullscreenChanged {
            fullscreen: reported,
        });
        true
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) -> bool {
        let Some(session) = self.live_mut() else {
            return false;
        };
        if session.auto_rotate_enabled == enabled {
            return false;
        }
        session.auto_rotate_enabled = enabled;
        self.sync_auto_rotate();
        self.notify(ViewerNotification::AutoRotateChanged { enabled });
        true
    }

    pub fn toggle_auto_rotate(&mut self) -> bool {
        let enabled = self.auto_rotate_enabled();
        self.set_auto_rotate(!enabled)
    }

    /// Applies any auto-rotate ticks that came due on the clock. Returns
    /// whether the rotation changed.
    pub fn poll_timers(&mut self) -> bool {
        let now = self.clock.now();
        let step = self.config.auto_rotate_step;
        let Some(session) = self.live_mut() else {
            return false;
        };
        let Some(task) = session.auto_rotate.as_mut() else {
            return false;
        };
        let ticks = task.poll(now);
        if ticks == 0 {
            return false;
        }
        session.rotation.rotate_yaw(step * ticks as f32);
        true
    }

    /// Creates or cancels the timer so it exists exactly while auto-rotate is
    /// enabled, no drag is active and the scene is ready.
    pub(super) fn sync_auto_rotate(&mut self) {
        let now = self.clock.now();
        let interval = self.config.auto_rotate_interval();
        let Some(session) = self.live_mut() else {
            return;
        };
        let wanted = session.auto_rotate_enabled
            && session.drag.is_none()
            && session.presentation.state().is_ready();
        match (wanted, session.auto_rotate.is_some()) {
            (true, false) => {
                session.auto_rotate = Some(AutoRotateTask::start(now, interval));
                log::debug!("auto-rotate timer started");
            }
            (false, true) => {
                session.auto_rotate = None;
                log::debug!("auto-rotate timer cancelled");
            }
            _ => {}
        }
    }
}
