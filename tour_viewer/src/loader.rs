//! Background panorama decoding. Requests are tagged with the scene ticket
//! that asked for them; the session decides whether a completion still
//! matters.

use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc},
    thread::{self, JoinHandle},
};

use anyhow::{bail, Context, Result};
use image::{imageops::FilterType, ImageBuffer, Rgba};

use crate::presentation::SceneTicket;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows.
    pub rgba: Vec<u8>,
}

impl DecodedImage {
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let rgba = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            rgba,
        }
    }

    /// Copy shrunk so neither side exceeds `max_dimension`, keeping the
    /// aspect ratio. `None` when the image already fits.
    pub fn fit_within(&self, max_dimension: u32) -> Option<DecodedImage> {
        let (width, height) = fitted_dimensions(self.width, self.height, max_dimension);
        if (width, height) == (self.width, self.height) {
            return None;
        }
        let source =
            ImageBuffer::<Rgba<u8>, &[u8]>::from_raw(self.width, self.height, &self.rgba[..])?;
        let resized = image::imageops::resize(&source, width, height, FilterType::Triangle);
        Some(DecodedImage {
            width,
            height,
            rgba: resized.into_raw(),
        })
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.rgba[offset],
            self.rgba[offset + 1],
            self.rgba[offset + 2],
            self.rgba[offset + 3],
        ]
    }
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub ticket: SceneTicket,
    pub result: Result<Arc<DecodedImage>, String>,
}

struct LoadJob {
    ticket: SceneTicket,
    path: PathBuf,
}

/// Largest size with the same aspect ratio whose sides stay within
/// `max_dimension`.
pub fn fitted_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let max_dimension = max_dimension.max(1);
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }
    let scale = f64::from(max_dimension) / f64::from(width.max(height));
    let shrink = |side: u32| ((f64::from(side) * scale).round() as u32).clamp(1, max_dimension);
    (shrink(width), shrink(height))
}

/// Resolves an image reference against the directory the tour came from.
/// Remote references are not fetched here.
pub fn resolve_image_path(base_dir: &Path, reference: &str) -> Result<PathBuf> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        bail!("scene has no image reference");
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        bail!("remote image {trimmed} cannot be loaded by the local loader");
    }
    let path = Path::new(trimmed.strip_prefix("file://").unwrap_or(trimmed));
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(base_dir.join(path))
    }
}

pub fn decode_image_file(path: &Path) -> Result<DecodedImage> {
    let image = image::open(path).with_context(|| format!("decoding {}", path.display()))?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(DecodedImage {
        width,
        height,
        rgba: rgba.into_raw(),
    })
}

pub struct AssetLoader {
    base_dir: PathBuf,
    jobs: Option<mpsc::Sender<LoadJob>>,
    results: mpsc::Receiver<LoadOutcome>,
    immediate: Vec<LoadOutcome>,
    worker: Option<JoinHandle<()>>,
}

impl AssetLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let (job_tx, job_rx) = mpsc::channel::<LoadJob>();
        let (result_tx, result_rx) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("tour-asset-loader".to_string())
            .spawn(move || {
                for job in job_rx {
                    let result = decode_image_file(&job.path)
                        .map(Arc::new)
                        .map_err(|err| format!("{err:#}"));
                    if result_tx
                        .send(LoadOutcome {
                            ticket: job.ticket,
                            result,
                        })
                        .is_err()
                    {
                        break;
                    }
                }
            })
            .context("spawning asset loader thread")?;
        Ok(Self {
            base_dir: base_dir.into(),
            jobs: Some(job_tx),
            results: result_rx,
            immediate: Vec::new(),
            worker: Some(worker),
        })
    }

    pub fn request(&mut self, ticket: SceneTicket, reference: &str) {
        let path = match resolve_image_path(&self.base_dir, reference) {
            Ok(path) => path,
            Err(err) => {
                self.immediate.push(LoadOutcome {
                    ticket,
                    result: Err(format!("{err:#}")),
                });
                return;
            }
        };
        log::debug!("loading {} for {ticket}", path.display());
        let sent = self
            .jobs
            .as_ref()
            .map(|jobs| jobs.send(LoadJob { ticket, path }).is_ok())
            .unwrap_or(false);
        if !sent {
            self.immediate.push(LoadOutcome {
                ticket,
                result: Err("asset loader is not running".to_string()),
            });
        }
    }

    /// Completions gathered since the last poll, without blocking.
    pub fn poll(&mut self) -> Vec<LoadOutcome> {
        let mut outcomes = std::mem::take(&mut self.immediate);
        outcomes.extend(self.results.try_iter());
        outcomes
    }

    /// Blocks until the next completion arrives.
    pub fn wait(&mut self) -> Option<LoadOutcome> {
        if !self.immediate.is_empty() {
            return Some(self.immediate.remove(0));
        }
        self.results.recv().ok()
    }
}

impl Drop for AssetLoader {
    fn drop(&mut self) {
        self.jobs = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("asset loader thread panicked");
            }
        }
    }
}
