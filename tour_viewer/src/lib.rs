//! Interactive 360° tour viewer core.
//!
//! The session in [`session`] owns every piece of mutable viewer state and is
//! driven purely by discrete events (pointer, keyboard, timer polls, asset
//! completions, platform fullscreen notifications). Platform access and time
//! are injected through [`platform::Platform`] and [`clock::Clock`] so the
//! whole state machine runs headless under test. Rendering glue lives in
//! [`frame`] (what to paint) and [`snapshot`] / the binary's window module
//! (how to paint it).

pub mod autorotate;
pub mod clock;
pub mod config;
pub mod frame;
pub mod hotspot;
pub mod loader;
pub mod navigation;
pub mod platform;
pub mod presentation;
pub mod replay;
pub mod rotation;
pub mod script;
pub mod session;
pub mod snapshot;

pub use config::{BoundaryPolicy, RotationAxes, ViewerConfig};
pub use session::{TourViewer, ViewerInput, ViewerKey, ViewerNotification};
