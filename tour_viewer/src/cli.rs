use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tour_model::{load_tour_file, NormalizedTour, PropertyCatalog, Tour};
use tour_viewer::config::load_viewer_preset;
use tour_viewer::{BoundaryPolicy, RotationAxes, ViewerConfig};

#[derive(Parser, Debug)]
#[command(about = "Interactive 360° virtual tour viewer", version)]
pub struct Args {
    /// Tour JSON (scene list or flat images/hotspots form)
    #[arg(long, conflicts_with = "catalog")]
    pub tour: Option<PathBuf>,

    /// Property list JSON; the tour is taken from --property's virtualTour
    #[arg(long, requires = "property")]
    pub catalog: Option<PathBuf>,

    /// Property id to look up in --catalog
    #[arg(long)]
    pub property: Option<u64>,

    /// Optional viewer preset JSON; command-line flags override it
    #[arg(long)]
    pub preset: Option<PathBuf>,

    /// What previous/next do at the ends of the tour
    #[arg(long, value_enum)]
    pub boundary: Option<BoundaryPolicy>,

    /// Which axes a drag rotates
    #[arg(long, value_enum)]
    pub axes: Option<RotationAxes>,

    /// Start with auto-rotate enabled
    #[arg(long)]
    pub auto_rotate: bool,

    /// Scene shown first (clamped to the tour)
    #[arg(long)]
    pub initial_scene: Option<usize>,

    /// Directory panorama paths are resolved against (defaults to the tour file's directory)
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Replay scripted input (JSON array or NDJSON) and print a transcript
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Write the final headless view to disk (PNG)
    #[arg(long)]
    pub dump_frame: Option<PathBuf>,

    /// Size of the --dump-frame image
    #[arg(long, default_value_t = 640)]
    pub frame_width: u32,

    #[arg(long, default_value_t = 360)]
    pub frame_height: u32,

    /// Skip creating a winit window/event loop; useful for headless automation
    #[arg(long)]
    pub headless: bool,
}

impl Args {
    pub fn viewer_config(&self) -> Result<ViewerConfig> {
        let mut config = match self.preset.as_deref() {
            Some(path) => load_viewer_preset(path)?,
            None => ViewerConfig::default(),
        };
        if let Some(boundary) = self.boundary {
            config.boundary = boundary;
        }
        if let Some(axes) = self.axes {
            config.axes = axes;
        }
        if self.auto_rotate {
            config.auto_rotate = true;
        }
        if let Some(scene) = self.initial_scene {
            config.initial_scene = scene;
        }
        config.validate().context("validating viewer configuration")?;
        Ok(config)
    }

    /// Directory used to resolve relative panorama references.
    pub fn asset_dir(&self) -> PathBuf {
        if let Some(dir) = self.assets.as_ref() {
            return dir.clone();
        }
        self.tour
            .as_deref()
            .or(self.catalog.as_deref())
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Loads the tour named on the command line. Configuration problems inside
/// the tour are reported and the offending hotspots dropped; a property
/// without a usable tour yields the unavailable tour.
pub fn load_tour(args: &Args) -> Result<Tour> {
    let normalized = match (args.tour.as_deref(), args.catalog.as_deref()) {
        (Some(path), _) => {
            load_tour_file(path).with_context(|| format!("loading tour {}", path.display()))?
        }
        (None, Some(path)) => {
            let catalog = PropertyCatalog::from_json_file(path)
                .with_context(|| format!("loading property catalog {}", path.display()))?;
            let Some(id) = args.property else {
                bail!("--catalog requires --property");
            };
            match catalog.virtual_tour(id) {
                Some(data) => data.normalize(),
                None => {
                    if catalog.property(id).is_none() {
                        log::warn!("property {id} not found in {}", path.display());
                    }
                    println!("Property {id} has no virtual tour");
                    NormalizedTour {
                        tour: Tour::unavailable(),
                        issues: Vec::new(),
                    }
                }
            }
        }
        (None, None) => bail!("either --tour or --catalog/--property is required"),
    };

    for issue in &normalized.issues {
        eprintln!("[tour_viewer] tour configuration: {issue}");
    }
    Ok(normalized.tour)
}
