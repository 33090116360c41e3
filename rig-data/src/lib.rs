//! Rig Data Crate
//!
//! Plain data types shared by the fisheye rig depth pipeline: body and camera
//! poses, the dense depth field returned by a stereo solver, the colored world
//! point cloud produced from it, and the synthetic camera-info records handed
//! to external stereo backends.
//!
//! This crate has no knowledge of image backends or transports.

pub mod camera_info;
pub mod cloud;
pub mod depth;
pub mod error;
pub mod types;

pub use camera_info::SyntheticCameraInfo;
pub use cloud::{WorldPoint, WorldPointCloud, pack_rgb, unpack_rgb};
pub use depth::{DEPTH_IMAGE_ENCODING, DepthField, DepthImage, MIN_VALID_DEPTH, is_valid_depth};
pub use error::DataError;
pub use types::{CameraExtrinsic, CameraPoseRecord, CameraSide, Facet, RigPose};
