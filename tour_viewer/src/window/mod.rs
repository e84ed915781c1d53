//! Windowed host: winit delivers pointer, touch, keyboard and focus events,
//! the asset loader decodes panoramas off-thread, and [`Renderer`] draws the
//! current [`ViewerFrame`].

mod input;
mod platform;
mod renderer;
mod shaders;

use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use pollster::FutureExt;
use tour_model::Tour;
use tour_viewer::clock::SystemClock;
use tour_viewer::frame::ViewerFrame;
use tour_viewer::loader::AssetLoader;
use tour_viewer::rotation::PointerSource;
use tour_viewer::{TourViewer, ViewerConfig, ViewerNotification};
use wgpu::SurfaceError;
use winit::{
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, Event, MouseButton, TouchPhase, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use self::input::{marker_at, viewer_key};
use self::platform::WinitPlatform;
use self::renderer::Renderer;

/// How often pending image loads are polled while the loop would otherwise
/// sleep.
const LOAD_POLL_INTERVAL: Duration = Duration::from_millis(16);

struct WindowHost {
    viewer: TourViewer<WinitPlatform>,
    renderer: Renderer,
    loader: AssetLoader,
    pending_loads: usize,
    cursor: PhysicalPosition<f64>,
    shift: bool,
    /// Touch id currently driving the drag.
    touch: Option<u64>,
    title: String,
    dirty: bool,
}

pub fn run(tour: Tour, config: ViewerConfig, asset_dir: PathBuf) -> Result<()> {
    let event_loop = EventLoop::new().context("creating winit event loop")?;
    let height = config.display_height.unwrap_or(720);
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Tour Viewer")
            .with_inner_size(PhysicalSize::new(height * 16 / 9, height))
            .build(&event_loop)
            .context("creating viewer window")?,
    );

    let renderer = Renderer::new(window.clone()).block_on()?;
    let viewer = TourViewer::new(
        tour,
        config,
        WinitPlatform::new(window),
        Arc::new(SystemClock),
    );
    let loader = AssetLoader::new(asset_dir)?;
    let mut host = WindowHost {
        viewer,
        renderer,
        loader,
        pending_loads: 0,
        cursor: PhysicalPosition::new(0.0, 0.0),
        shift: false,
        touch: None,
        title: String::new(),
        dirty: true,
    };
    host.viewer.set_focus(true);
    host.drain_notifications();

    event_loop
        .run(move |event, target| match event {
            Event::WindowEvent { window_id, event }
                if window_id == host.renderer.window().id() =>
            {
                if !matches!(event, WindowEvent::RedrawRequested) {
                    host.dirty = true;
                }
                match event {
                    WindowEvent::CloseRequested => {
                        host.viewer.destroy();
                        target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        host.renderer.resize(new_size);
                        if host.viewer.platform_mut().take_fullscreen_change() {
                            host.viewer.fullscreen_changed();
                        }
                        host.renderer.window().request_redraw();
                    }
                    WindowEvent::Focused(focused) => {
                        host.viewer.set_focus(focused);
                    }
                    WindowEvent::ModifiersChanged(modifiers) => {
                        host.shift = modifiers.state().shift_key();
                    }
                    WindowEvent::KeyboardInput { event, .. }
                        if event.state == ElementState::Pressed =>
                    {
                        if !host.viewer.platform().keys_attached() {
                            return;
                        }
                        if let Some(key) = viewer_key(&event.logical_key, host.shift) {
                            host.viewer.key(key);
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        host.cursor = position;
                        if host.touch.is_none() {
                            host.viewer.pointer_move(position.x as f32, position.y as f32);
                        }
                    }
                    WindowEvent::CursorLeft { .. } => {
                        if host.touch.is_none() {
                            host.viewer.pointer_up();
                        }
                    }
                    WindowEvent::MouseInput {
                        state,
                        button: MouseButton::Left,
                        ..
                    } => match state {
                        ElementState::Pressed => host.press(host.cursor, PointerSource::Mouse),
                        ElementState::Released => {
                            host.viewer.pointer_up();
                        }
                    },
                    WindowEvent::Touch(touch) => match touch.phase {
                        TouchPhase::Started if host.touch.is_none() => {
                            host.touch = Some(touch.id);
                            host.press(touch.location, PointerSource::Touch);
                        }
                        TouchPhase::Moved if host.touch == Some(touch.id) => {
                            host.viewer
                                .pointer_move(touch.location.x as f32, touch.location.y as f32);
                        }
                        TouchPhase::Ended | TouchPhase::Cancelled
                            if host.touch == Some(touch.id) =>
                        {
                            host.touch = None;
                            host.viewer.pointer_up();
                        }
                        _ => {}
                    },
                    WindowEvent::RedrawRequested => host.redraw(target),
                    _ => {}
                }
            }
            Event::AboutToWait => {
                let loaded = host.pump_loads();
                let rotated = host.viewer.poll_timers();
                let notified = host.drain_notifications();
                if host.dirty || loaded || rotated || notified {
                    host.dirty = false;
                    host.renderer.window().request_redraw();
                }
                target.set_control_flow(host.control_flow());
            }
            _ => {}
        })
        .context("running viewer application")?;
    Ok(())
}

impl WindowHost {
    /// Pointer press: hotspot markers take the click, anything else starts
    /// a drag.
    fn press(&mut self, position: PhysicalPosition<f64>, source: PointerSource) {
        let frame = ViewerFrame::build(&self.viewer);
        let hit = frame
            .scene()
            .and_then(|scene| marker_at(scene, position.x, position.y, self.renderer.size()));
        match hit {
            Some(index) => {
                self.viewer.activate_hotspot(index);
            }
            None => {
                self.viewer
                    .pointer_down(position.x as f32, position.y as f32, source);
            }
        }
    }

    fn pump_loads(&mut self) -> bool {
        let outcomes = self.loader.poll();
        let settled = !outcomes.is_empty();
        for outcome in outcomes {
            self.pending_loads = self.pending_loads.saturating_sub(1);
            match outcome.result {
                Ok(image) => {
                    if self.viewer.asset_loaded(outcome.ticket) {
                        self.renderer.set_panorama(&image);
                    }
                }
                Err(detail) => {
                    self.viewer.asset_failed(outcome.ticket, &detail);
                }
            }
        }
        settled
    }

    fn drain_notifications(&mut self) -> bool {
        let notifications = self.viewer.take_notifications();
        let any = !notifications.is_empty();
        for notification in notifications {
            match notification {
                ViewerNotification::LoadRequested { ticket, image } => {
                    self.renderer.clear_panorama();
                    self.loader.request(ticket, &image);
                    self.pending_loads += 1;
                }
                ViewerNotification::InfoNote { description } => {
                    println!("Info: {description}");
                }
                ViewerNotification::LoadFailed { ticket, message } => {
                    eprintln!("[tour_viewer] {message} ({ticket})");
                }
                other => log::info!("{other:?}"),
            }
        }
        any
    }

    fn redraw(&mut self, target: &winit::event_loop::EventLoopWindowTarget<()>) {
        let frame = ViewerFrame::build(&self.viewer);
        let title = format!("Tour Viewer - {}", frame.describe());
        if title != self.title {
            self.renderer.window().set_title(&title);
            self.title = title;
        }
        match self.renderer.render(&frame) {
            Ok(_) => {}
            Err(SurfaceError::Lost) => self.renderer.resize(self.renderer.size()),
            Err(SurfaceError::OutOfMemory) => target.exit(),
            Err(err) => eprintln!("[tour_viewer] render error: {err:?}"),
        }
    }

    /// Sleeps until the auto-rotate timer is due, or briefly while images
    /// are still decoding.
    fn control_flow(&self) -> ControlFlow {
        let load_deadline =
            (self.pending_loads > 0).then(|| Instant::now() + LOAD_POLL_INTERVAL);
        match (self.viewer.next_deadline(), load_deadline) {
            (Some(timer), Some(load)) => ControlFlow::WaitUntil(timer.min(load)),
            (Some(deadline), None) | (None, Some(deadline)) => ControlFlow::WaitUntil(deadline),
            (None, None) => ControlFlow::Wait,
        }
    }
}
