mod cli;
mod window;

use anyhow::{Context, Result};
use clap::Parser;
use tour_viewer::frame::ViewerFrame;
use tour_viewer::replay::{HeadlessDriver, LoadMode};
use tour_viewer::script::load_script_file;
use tour_viewer::snapshot::{export_rgba_to_png, render_view};

use crate::cli::{load_tour, Args};

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::init();

    let config = args.viewer_config()?;
    let tour = load_tour(&args)?;
    let asset_dir = args.asset_dir();
    println!(
        "Loaded tour with {} scene(s) (assets: {})",
        tour.len(),
        asset_dir.display()
    );

    if args.script.is_some() || args.dump_frame.is_some() || args.headless {
        // Snapshots need real pixels; scripted runs resolve loads themselves.
        let mode = if args.dump_frame.is_some() {
            LoadMode::Files(asset_dir.clone())
        } else {
            LoadMode::Scripted
        };
        let mut driver = HeadlessDriver::new(tour.clone(), config.clone(), mode)
            .context("starting headless viewer")?;
        if let Some(path) = args.script.as_deref() {
            let steps = load_script_file(path)?;
            println!("Replaying {} step(s) from {}", steps.len(), path.display());
            driver.run(&steps);
        }
        for line in driver.transcript() {
            println!("  {line}");
        }
        let frame = driver.frame();
        println!("Final view: {}", frame.describe());

        if let Some(output_path) = args.dump_frame.as_ref() {
            dump_frame(&driver, &frame, &args, output_path)?;
        }

        if args.headless {
            println!("Headless mode requested; viewer window bootstrap skipped.");
            return Ok(());
        }
    }

    window::run(tour, config, asset_dir)
}

fn dump_frame(
    driver: &HeadlessDriver,
    frame: &ViewerFrame,
    args: &Args,
    output_path: &std::path::Path,
) -> Result<()> {
    let Some(scene) = frame.scene() else {
        println!("Nothing to export for --dump-frame: {}", frame.describe());
        return Ok(());
    };
    let view = render_view(
        scene,
        driver.current_panorama(),
        args.frame_width,
        args.frame_height,
    );
    let stats = export_rgba_to_png(view.width, view.height, &view.rgba, output_path)
        .with_context(|| format!("writing PNG to {}", output_path.display()))?;
    println!(
        "View exported to {} ({}x{}, yaw {:.1}, pitch {:.1})",
        output_path.display(),
        view.width,
        view.height,
        scene.rotation.yaw,
        scene.rotation.pitch
    );
    println!(
        "  luminance avg {:.2}, min {}, max {}, opaque pixels {} / {}",
        stats.mean_luma, stats.min_luma, stats.max_luma, stats.opaque_pixels, stats.total_pixels
    );
    println!(
        "  quadrant luma means (TL, TR, BL, BR): {:.2}, {:.2}, {:.2}, {:.2}",
        stats.quadrant_means[0],
        stats.quadrant_means[1],
        stats.quadrant_means[2],
        stats.quadrant_means[3]
    );
    Ok(())
}
