//! Writes a recorded run to an output directory.

use image::{ImageBuffer, Luma};
use rig_data::{DEPTH_IMAGE_ENCODING, DepthImage, WorldPoint};
use rig_depth::Recording;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Depth PNGs store millimetres.
const DEPTH_PNG_SCALE: f32 = 1000.0;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convert a float depth image to 16-bit millimetres, saturating at the range.
pub fn depth_to_millimetres(depth: &DepthImage) -> ImageBuffer<Luma<u16>, Vec<u16>> {
    ImageBuffer::from_fn(depth.width(), depth.height(), |x, y| {
        let z = depth.get_pixel(x, y).0[0] * DEPTH_PNG_SCALE;
        Luma([z.round().clamp(0.0, u16::MAX as f32) as u16])
    })
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), OutputError> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)?;
    Ok(())
}

/// Write every output of `recording` below `dir` and return the files written.
///
/// Clouds are stored as packed [`WorldPoint`] records next to a JSON header.
#[tracing::instrument(skip_all, fields(dir = %dir.display()))]
pub fn write_recording(dir: &Path, recording: &Recording) -> Result<Vec<PathBuf>, OutputError> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    for (i, (facet, cloud)) in recording.clouds.iter().enumerate() {
        let stem = format!("cloud_{}_{:04}", facet, i);
        let bin = dir.join(format!("{}.bin", stem));
        let mut file = BufWriter::new(File::create(&bin)?);
        file.write_all(cloud.as_bytes())?;
        file.flush()?;

        let header = dir.join(format!("{}.json", stem));
        write_json(
            &header,
            &serde_json::json!({
                "frame_id": cloud.frame_id,
                "timestamp": cloud.timestamp,
                "points": cloud.len(),
                "point_step": std::mem::size_of::<WorldPoint>(),
                "fields": ["x", "y", "z", "rgb", "u", "v"],
            }),
        )?;
        debug!("Wrote {} points to {}", cloud.len(), bin.display());
        written.extend([bin, header]);
    }

    for (i, (facet, depth, timestamp)) in recording.depth_images.iter().enumerate() {
        let png = dir.join(format!("depth_{}_{:04}.png", facet, i));
        depth_to_millimetres(depth).save(&png)?;
        let header = dir.join(format!("depth_{}_{:04}.json", facet, i));
        write_json(
            &header,
            &serde_json::json!({
                "timestamp": timestamp,
                "source_encoding": DEPTH_IMAGE_ENCODING,
                "scale": 1.0 / DEPTH_PNG_SCALE,
            }),
        )?;
        written.extend([png, header]);
    }

    for (i, (facet, export)) in recording.stereo.iter().enumerate() {
        let stem = format!("stereo_{}_{:04}", facet, i);
        let upper = dir.join(format!("{}_upper.png", stem));
        let lower = dir.join(format!("{}_lower.png", stem));
        export.upper_image.save(&upper)?;
        export.lower_image.save(&lower)?;
        let info = dir.join(format!("{}_info.json", stem));
        write_json(&info, &[&export.upper_info, &export.lower_info])?;
        written.extend([upper, lower, info]);
    }

    if !recording.poses.is_empty() {
        let poses = dir.join("camera_poses.json");
        write_json(&poses, &recording.poses)?;
        written.push(poses);
    }

    info!("Wrote {} files", written.len());
    Ok(written)
}
