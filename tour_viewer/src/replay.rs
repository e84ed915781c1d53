//! Headless host for the viewer: a manual clock, the in-process platform and
//! an optional file-backed image loader. Scripted steps are fed in one at a
//! time and every outbound notification becomes a transcript line.

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use tour_model::Tour;

use crate::clock::{Clock, ManualClock};
use crate::config::ViewerConfig;
use crate::frame::ViewerFrame;
use crate::loader::{AssetLoader, DecodedImage};
use crate::platform::HeadlessPlatform;
use crate::presentation::SceneTicket;
use crate::script::ScriptStep;
use crate::session::{TourViewer, ViewerKey, ViewerNotification};

/// How image load requests are answered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Requests stay pending until a `load_ok` / `load_fail` step.
    #[default]
    Scripted,
    /// Every request succeeds at once without touching the disk.
    Immediate,
    /// Images are decoded from this directory; each step waits for its
    /// requests to settle.
    Files(PathBuf),
}

pub struct HeadlessDriver {
    viewer: TourViewer<HeadlessPlatform>,
    clock: Arc<ManualClock>,
    mode: LoadMode,
    loader: Option<AssetLoader>,
    in_flight: usize,
    panorama: Option<(SceneTicket, Arc<DecodedImage>)>,
    transcript: Vec<String>,
}

impl HeadlessDriver {
    pub fn new(tour: Tour, config: ViewerConfig, mode: LoadMode) -> Result<Self> {
        let clock = Arc::new(ManualClock::new());
        let loader = match &mode {
            LoadMode::Files(dir) => Some(AssetLoader::new(dir.clone())?),
            _ => None,
        };
        let viewer_clock: Arc<dyn Clock> = clock.clone();
        let viewer = TourViewer::new(tour, config, HeadlessPlatform::new(), viewer_clock);
        let mut driver = Self {
            viewer,
            clock,
            mode,
            loader,
            in_flight: 0,
            panorama: None,
            transcript: Vec::new(),
        };
        driver.pump();
        Ok(driver)
    }

    pub fn viewer(&self) -> &TourViewer<HeadlessPlatform> {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut TourViewer<HeadlessPlatform> {
        &mut self.viewer
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    pub fn frame(&self) -> ViewerFrame {
        ViewerFrame::build(&self.viewer)
    }

    /// Decoded panorama of the current selection, when the file loader
    /// produced one.
    pub fn current_panorama(&self) -> Option<&DecodedImage> {
        let (ticket, image) = self.panorama.as_ref()?;
        (self.viewer.current_ticket() == Some(*ticket)).then_some(image.as_ref())
    }

    pub fn run(&mut self, steps: &[ScriptStep]) {
        for step in steps {
            self.apply(step);
        }
    }

    pub fn apply(&mut self, step: &ScriptStep) {
        log::debug!("replaying {step:?}");
        let viewer = &mut self.viewer;
        match step {
            ScriptStep::PointerDown { x, y, source } => {
                viewer.pointer_down(*x, *y, *source);
            }
            ScriptStep::PointerMove { x, y } => {
                viewer.pointer_move(*x, *y);
            }
            ScriptStep::PointerUp | ScriptStep::PointerLeave | ScriptStep::PointerCancel => {
                viewer.pointer_up();
            }
            ScriptStep::Key { key } => match ViewerKey::from_name(key) {
                Some(key) => {
                    viewer.key(key);
                }
                None => log::warn!("ignoring unknown key {key:?} in script"),
            },
            ScriptStep::Focus { focused } => {
                viewer.set_focus(*focused);
            }
            ScriptStep::Advance { ms } => {
                self.clock.advance_ms(*ms);
                if viewer.poll_timers() {
                    let rotation = viewer.rotation();
                    self.transcript.push(format!("auto-rotate: yaw {:.1}", rotation.yaw));
                }
            }
            ScriptStep::LoadOk { ticket } => {
                if let Some(ticket) = ticket.or_else(|| viewer.current_ticket()) {
                    if !viewer.asset_loaded(ticket) {
                        self.transcript.push(format!("ignored load result for {ticket}"));
                    }
                }
            }
            ScriptStep::LoadFail { ticket, detail } => {
                if let Some(ticket) = ticket.or_else(|| viewer.current_ticket()) {
                    let detail = detail.as_deref().unwrap_or("scripted failure");
                    if !viewer.asset_failed(ticket, detail) {
                        self.transcript.push(format!("ignored load result for {ticket}"));
                    }
                }
            }
            ScriptStep::ExternalFullscreen { fullscreen } => {
                viewer.platform_mut().set_fullscreen_externally(*fullscreen);
            }
            ScriptStep::DenyFullscreen { deny } => {
                viewer.platform_mut().deny_fullscreen(*deny);
            }
            ScriptStep::ActivateHotspot { index } => {
                viewer.activate_hotspot(*index);
            }
            ScriptStep::ToggleHotspots => {
                viewer.toggle_hotspots();
            }
            ScriptStep::ToggleAutoRotate => {
                viewer.toggle_auto_rotate();
            }
            ScriptStep::ToggleFullscreen => {
                viewer.toggle_fullscreen();
            }
            ScriptStep::GoTo { index } => {
                if !viewer.go_to(*index) {
                    self.transcript.push(format!("go_to {index} rejected"));
                }
            }
            ScriptStep::Next => {
                viewer.next();
            }
            ScriptStep::Previous => {
                viewer.previous();
            }
            ScriptStep::Destroy => {
                viewer.destroy();
                self.transcript.push("viewer destroyed".to_string());
            }
        }
        self.pump();
    }

    /// Delivers platform notifications and load completions until nothing
    /// is left to hand over.
    fn pump(&mut self) {
        loop {
            let mut progressed = false;

            while self.viewer.platform_mut().take_change_notification().is_some() {
                self.viewer.fullscreen_changed();
                progressed = true;
            }

            for notification in self.viewer.take_notifications() {
                progressed = true;
                self.record(&notification);
                if let ViewerNotification::LoadRequested { ticket, image } = notification {
                    self.dispatch_load(ticket, &image);
                }
            }

            if self.in_flight > 0 {
                if let Some(outcome) = self.loader.as_mut().and_then(AssetLoader::wait) {
                    self.in_flight -= 1;
                    progressed = true;
                    match outcome.result {
                        Ok(image) => {
                            if self.viewer.asset_loaded(outcome.ticket) {
                                self.panorama = Some((outcome.ticket, image));
                            }
                        }
                        Err(detail) => {
                            self.viewer.asset_failed(outcome.ticket, &detail);
                        }
                    }
                } else {
                    self.in_flight = 0;
                }
            }

            if !progressed {
                break;
            }
        }
    }

    fn dispatch_load(&mut self, ticket: SceneTicket, image: &str) {
        match &self.mode {
            LoadMode::Scripted => {}
            LoadMode::Immediate => {
                self.viewer.asset_loaded(ticket);
            }
            LoadMode::Files(_) => {
                if let Some(loader) = self.loader.as_mut() {
                    loader.request(ticket, image);
                    self.in_flight += 1;
                }
            }
        }
    }

    fn record(&mut self, notification: &ViewerNotification) {
        let line = describe_notification(notification);
        log::info!("{line}");
        self.transcript.push(line);
    }
}

pub fn describe_notification(notification: &ViewerNotification) -> String {
    match notification {
        ViewerNotification::LoadRequested { ticket, image } => {
            format!("load requested: {image} ({ticket})")
        }
        ViewerNotification::SceneChanged { index, title } => {
            format!("scene changed: {index} {title}")
        }
        ViewerNotification::HotspotActivated { scene, index, .. } => {
            format!("hotspot activated: scene {scene} hotspot {index}")
        }
        ViewerNotification::InfoNote { description } => format!("info: {description}"),
        ViewerNotification::LoadFailed { ticket, message } => {
            format!("load failed ({ticket}): {message}")
        }
        ViewerNotification::FullscreenChanged { fullscreen } => {
            format!("fullscreen: {}", on_off(*fullscreen))
        }
        ViewerNotification::AutoRotateChanged { enabled } => {
            format!("auto-rotate: {}", on_off(*enabled))
        }
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}
