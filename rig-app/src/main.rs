//! Rig Depth Runner
//!
//! Runs one depth tick of a stacked fisheye pair from images on disk.
//!
//! The stereo backend is replaced by a fronto-parallel plane, which makes the
//! runner useful for checking calibration files, facet orientation and the
//! world placement of clouds before wiring in a real solver.

mod output;
mod plane_solver;

use clap::Parser;
use glam::{DQuat, DVec3};
use plane_solver::PlaneDepthSolver;
use rig_capture::{FacetImage, HostImage, ReplaySource, RigFrame};
use rig_data::{Facet, RigPose};
use rig_depth::{DepthCamManager, DepthConfig, DepthSinks, RecordingSink, RigCalibration};
use std::error::Error;
use std::path::PathBuf;
use tracing::{info, warn};

/// Rig depth - stacked fisheye stereo to world point clouds
#[derive(Parser, Debug)]
#[command(name = "rig-depth")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Rig calibration JSON
    #[arg(short, long)]
    calibration: PathBuf,

    /// Undistorted facet image of the upper fisheye
    #[arg(long)]
    upper: PathBuf,

    /// Undistorted facet image of the lower fisheye
    #[arg(long)]
    lower: PathBuf,

    /// Facet the images belong to (left, front, right)
    #[arg(short, long, default_value = "front")]
    facet: Facet,

    /// Output directory
    #[arg(short, long, default_value = "depth_out")]
    output: PathBuf,

    /// Depth reported by the plane solver
    #[arg(long, default_value_t = 2.0)]
    plane_depth: f32,

    /// Rig position in the world frame
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = [0.0, 0.0, 0.0])]
    position: Vec<f64>,

    /// Rig heading about the world Z axis, in degrees
    #[arg(long, default_value_t = 0.0)]
    yaw: f64,

    /// Tick timestamp in seconds
    #[arg(long, default_value_t = 0.0)]
    timestamp: f64,

    /// Also export the prepared stereo pair and its camera info
    #[arg(long)]
    raw_stereo: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .init();
}

/// Enable exactly `facet`, keeping the rest of the calibration's settings.
fn single_facet_config(base: &DepthConfig, facet: Facet) -> Result<DepthConfig, Box<dyn Error>> {
    if facet == Facet::Rear {
        return Err("the rear facet has no stereo counterpart".into());
    }
    Ok(DepthConfig {
        estimate_front: facet == Facet::Front,
        estimate_left: facet == Facet::Left,
        estimate_right: facet == Facet::Right,
        ..base.clone()
    })
}

fn facet_slots(facet: Facet, image: HostImage) -> Vec<HostImage> {
    let mut slots = vec![HostImage::Gray(image::GrayImage::new(0, 0)); Facet::COUNT + 1];
    slots[facet.image_slot()] = image;
    slots
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut calibration = RigCalibration::load(&args.calibration)?;
    calibration.depth = single_facet_config(&calibration.depth, args.facet)?;
    calibration.depth.publish_raw_stereo |= args.raw_stereo;

    let upper = HostImage::open(&args.upper)?;
    let lower = HostImage::open(&args.lower)?;
    let expected = (calibration.side.width, calibration.side.height);
    for (name, image) in [("upper", &upper), ("lower", &lower)] {
        if image.dimensions() != expected {
            warn!(
                "{} image is {:?}, calibration expects {:?}",
                name,
                image.dimensions(),
                expected
            );
        }
    }

    let pose = RigPose::new(
        DQuat::from_rotation_z(args.yaw.to_radians()),
        DVec3::from_slice(&args.position),
        args.timestamp,
    );
    let frame = RigFrame::new(
        pose,
        facet_slots(args.facet, upper),
        facet_slots(args.facet, lower),
        0,
    );

    let sink = RecordingSink::new();
    let mut manager = DepthCamManager::from_calibration(
        &calibration,
        PlaneDepthSolver::new(args.plane_depth),
        DepthSinks::shared(sink.clone()),
    )?;
    let mut source = ReplaySource::new(vec![frame]);
    let summary = manager.run(&mut source, &calibration.upper, &calibration.lower)?;
    if summary.skipped > 0 {
        warn!("{} of {} ticks skipped", summary.skipped, summary.ticks);
    }

    let written = output::write_recording(&args.output, &sink.snapshot())?;
    info!(
        "{} points, {} files in {}",
        summary.points,
        written.len(),
        args.output.display()
    );
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(&args.log_level);

    if let Err(e) = run(args) {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_facet_config() {
        let base = DepthConfig {
            estimate_left: true,
            cloud_stride: 3,
            ..Default::default()
        };
        let config = single_facet_config(&base, Facet::Right).unwrap();
        assert_eq!(config.enabled_facets(), vec![Facet::Right]);
        assert_eq!(config.cloud_stride, 3);
        assert!(single_facet_config(&base, Facet::Rear).is_err());
    }

    #[test]
    fn test_facet_slots() {
        let slots = facet_slots(Facet::Left, HostImage::Gray(image::GrayImage::new(2, 2)));
        assert_eq!(slots.len(), Facet::COUNT + 1);
        assert!(!slots[1].is_empty());
        assert!(slots[2].is_empty());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "rig-depth",
            "-c",
            "rig.json",
            "--upper",
            "u.png",
            "--lower",
            "l.png",
            "--facet",
            "left",
            "--position",
            "1",
            "2",
            "3",
        ])
        .unwrap();
        assert_eq!(args.facet, Facet::Left);
        assert_eq!(args.position, vec![1.0, 2.0, 3.0]);
        assert_eq!(args.plane_depth, 2.0);
        assert!(!args.raw_stereo);
    }
}
