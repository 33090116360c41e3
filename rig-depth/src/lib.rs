//! Rig Depth Crate
//!
//! Per-frame depth pipeline of a multi-facet fisheye rig. Two stacked
//! fisheyes each see the surroundings through several undistorted side
//! facets; pairing the same facet of the upper and lower fisheye gives a
//! vertical-baseline stereo pair.
//!
//! ## Modules
//!
//! - [`mounting`]: fixed rotations from the rig geometry
//! - [`stereo`]: reoriented, downsampled stereo pairs and their relative pose
//! - [`solver`]: boundary to the external dense depth solver
//! - [`projector`]: depth field to colored world point cloud
//! - [`calibration`]: synthetic rectified-stereo camera info
//! - [`sink`]: output interfaces
//! - [`manager`]: the per-tick entry point tying it together
//! - [`config`]: runtime configuration and the rig calibration file

pub mod calibration;
pub mod config;
pub mod error;
pub mod manager;
pub mod mounting;
pub mod projector;
pub mod sink;
pub mod solver;
pub mod stereo;

pub use calibration::{SyntheticIntrinsics, build_stereo_camera_info};
pub use config::{DepthConfig, RigCalibration, SideIntrinsics};
pub use error::{DepthError, SinkError, SolverError};
pub use manager::{DepthCamManager, FacetReport, RunSummary};
pub use mounting::MountingRotationTable;
pub use projector::{CameraToWorld, project_to_world};
pub use sink::{DepthSinks, ImageSink, PointCloudSink, Recording, RecordingSink, StereoExport, TransformSink};
pub use solver::{DepthRequest, DepthSolver};
pub use stereo::{PreparedFacet, StereoFramePreparer, StereoGeometry, SyntheticStereoPair};
