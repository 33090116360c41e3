//! Rig Capture - Facet image buffers and frame sources
//!
//! This crate provides the image side of the fisheye rig pipeline:
//!
//! - [`FacetImage`]: the small set of image primitives the depth pipeline
//!   needs (resize, grayscale, transpose, vertical flip, download to host).
//!   Whether pixels live on a device or in host memory is up to the
//!   implementation.
//! - [`HostImage`]: host-memory implementation over the `image` crate.
//! - [`RigSource`]: per-tick bundles of upper/lower facet images plus the rig
//!   pose they were captured at.
//!
//! ## Example
//!
//! ```ignore
//! use rig_capture::{HostImage, ReplaySource, RigSource};
//!
//! let mut source = ReplaySource::new(frames);
//! while let Some(frame) = source.next_frame()? {
//!     // Hand the frame to the depth manager...
//! }
//! ```

mod buffer;
mod source;

pub use buffer::{FacetImage, HostImage, scaled_dimension};
pub use source::{CaptureError, ReplaySource, RigFrame, RigSource};
