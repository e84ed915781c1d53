//! CPU rendition of a [`SceneFrame`] for PNG export and headless checks.
//! The panorama is treated as equirectangular (360° wide, 180° tall); the
//! viewport shows a fixed horizontal field of view centred on the current
//! yaw/pitch. Hotspot markers sit in screen space, as in the window front
//! end.

use std::{fs::File, path::Path};

use anyhow::{ensure, Result};
use image::{codecs::png::PngEncoder, ColorType, ImageEncoder};

use crate::frame::{MarkerIcon, SceneFrame};
use crate::loader::DecodedImage;

pub const HORIZONTAL_FOV: f32 = 90.0;
const BACKGROUND: [u8; 4] = [17, 24, 39, 255];
const LINK_COLOR: [u8; 4] = [37, 99, 235, 255];
const INFO_COLOR: [u8; 4] = [245, 158, 11, 255];
const FOCUS_RING: [u8; 4] = [255, 255, 255, 255];

#[derive(Debug, Clone)]
pub struct RenderedView {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageStats {
    pub min_luma: u8,
    pub max_luma: u8,
    pub mean_luma: f32,
    pub opaque_pixels: u32,
    pub total_pixels: u32,
    pub quadrant_means: [f32; 4],
}

/// Paints the frame into a `width` x `height` RGBA buffer. Without a
/// panorama (still loading, or failed) only the background and markers are
/// drawn.
pub fn render_view(
    frame: &SceneFrame,
    panorama: Option<&DecodedImage>,
    width: u32,
    height: u32,
) -> RenderedView {
    let width = width.max(1);
    let height = height.max(1);
    let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);

    let vertical_fov = HORIZONTAL_FOV * height as f32 / width as f32;
    for py in 0..height {
        for px in 0..width {
            let pixel = match panorama {
                Some(pano) if !frame.loading && pano.width > 0 && pano.height > 0 => {
                    let lon = frame.rotation.yaw
                        + ((px as f32 + 0.5) / width as f32 - 0.5) * HORIZONTAL_FOV;
                    let lat = frame.rotation.pitch
                        + ((py as f32 + 0.5) / height as f32 - 0.5) * vertical_fov;
                    let u = (lon / 360.0).rem_euclid(1.0);
                    let v = (0.5 + lat / 180.0).clamp(0.0, 1.0);
                    let sx = ((u * pano.width as f32) as u32).min(pano.width - 1);
                    let sy = ((v * pano.height as f32) as u32).min(pano.height - 1);
                    pano.pixel(sx, sy)
                }
                _ => BACKGROUND,
            };
            rgba.extend_from_slice(&pixel);
        }
    }

    let mut view = RenderedView {
        width,
        height,
        rgba,
    };
    let radius = (width.min(height) as f32 * 0.03).max(2.0);
    for marker in &frame.markers {
        let (fx, fy) = marker.position.as_fraction();
        let cx = fx * width as f32;
        let cy = fy * height as f32;
        let color = match marker.icon {
            MarkerIcon::Arrow => LINK_COLOR,
            MarkerIcon::Info => INFO_COLOR,
        };
        if marker.focused {
            fill_disc(&mut view, cx, cy, radius * 1.5, FOCUS_RING);
        }
        fill_disc(&mut view, cx, cy, radius, color);
    }
    view
}

fn fill_disc(view: &mut RenderedView, cx: f32, cy: f32, radius: f32, color: [u8; 4]) {
    let min_x = (cx - radius).floor().max(0.0) as u32;
    let min_y = (cy - radius).floor().max(0.0) as u32;
    let max_x = ((cx + radius).ceil() as u32).min(view.width.saturating_sub(1));
    let max_y = ((cy + radius).ceil() as u32).min(view.height.saturating_sub(1));
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= radius * radius {
                let offset = (y as usize * view.width as usize + x as usize) * 4;
                view.rgba[offset..offset + 4].copy_from_slice(&color);
            }
        }
    }
}

pub fn export_rgba_to_png(
    width: u32,
    height: u32,
    data: &[u8],
    destination: &Path,
) -> Result<ImageStats> {
    let expected_len = width as usize * height as usize * 4;
    ensure!(
        data.len() == expected_len,
        "RGBA buffer size {} does not match dimensions {}x{}",
        data.len(),
        width,
        height
    );

    let file = File::create(destination)?;
    let encoder = PngEncoder::new(file);
    encoder.write_image(data, width, height, ColorType::Rgba8)?;

    Ok(compute_image_stats(width, height, data))
}

pub fn compute_image_stats(width: u32, height: u32, data: &[u8]) -> ImageStats {
    let mut min_luma = u8::MAX;
    let mut max_luma = u8::MIN;
    let mut sum_luma: u64 = 0;
    let mut total_pixels: u32 = 0;
    let mut opaque_pixels: u32 = 0;
    let mut quadrant_sums = [0u64; 4];
    let mut quadrant_counts = [0u32; 4];

    let half_h = height / 2;
    let half_w = width / 2;

    for (idx, chunk) in data.chunks_exact(4).enumerate() {
        let luma = ((chunk[0] as u16 + chunk[1] as u16 + chunk[2] as u16) / 3) as u8;
        min_luma = min_luma.min(luma);
        max_luma = max_luma.max(luma);
        sum_luma += luma as u64;
        total_pixels += 1;
        if chunk[3] > 0 {
            opaque_pixels += 1;
        }

        let px = idx as u32 % width.max(1);
        let py = idx as u32 / width.max(1);
        let quadrant = match (px < half_w, py < half_h) {
            (true, true) => 0,
            (false, true) => 1,
            (true, false) => 2,
            (false, false) => 3,
        };
        quadrant_sums[quadrant] += luma as u64;
        quadrant_counts[quadrant] += 1;
    }

    let mean_luma = if total_pixels > 0 {
        (sum_luma as f64 / total_pixels as f64) as f32
    } else {
        0.0
    };

    let mut quadrant_means = [0.0; 4];
    for (mean, (sum, count)) in quadrant_means
        .iter_mut()
        .zip(quadrant_sums.iter().zip(quadrant_counts.iter()))
    {
        if *count > 0 {
            *mean = (*sum as f64 / *count as f64) as f32;
        }
    }

    ImageStats {
        min_luma,
        max_luma,
        mean_luma,
        opaque_pixels,
        total_pixels,
        quadrant_means,
    }
}
