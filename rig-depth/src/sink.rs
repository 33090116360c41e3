//! Output interfaces of the depth manager.
//!
//! The manager never talks to a transport directly; it publishes through
//! these traits. [`RecordingSink`] keeps everything in memory.

use crate::error::SinkError;
use image::GrayImage;
use rig_data::{CameraPoseRecord, DepthImage, Facet, SyntheticCameraInfo, WorldPointCloud};
use std::sync::{Arc, Mutex, MutexGuard};

/// Prepared pair and synthetic calibration for external stereo backends.
#[derive(Debug, Clone)]
pub struct StereoExport {
    pub upper_info: SyntheticCameraInfo,
    pub lower_info: SyntheticCameraInfo,
    pub upper_image: GrayImage,
    pub lower_image: GrayImage,
}

/// Receives world point clouds.
pub trait PointCloudSink {
    fn publish_cloud(&mut self, facet: Facet, cloud: &WorldPointCloud) -> Result<(), SinkError>;
}

/// Receives depth images and raw stereo exports.
pub trait ImageSink {
    /// `image` is tagged with [`rig_data::DEPTH_IMAGE_ENCODING`].
    fn publish_depth_image(&mut self, facet: Facet, image: &DepthImage, timestamp: f64) -> Result<(), SinkError>;

    fn publish_stereo(&mut self, facet: Facet, export: &StereoExport) -> Result<(), SinkError>;
}

/// Receives camera poses for visualization tooling.
pub trait TransformSink {
    fn publish_pose(&mut self, record: &CameraPoseRecord) -> Result<(), SinkError>;
}

/// The sinks a manager publishes to.
pub struct DepthSinks {
    pub cloud: Box<dyn PointCloudSink>,
    pub image: Box<dyn ImageSink>,
    pub transform: Box<dyn TransformSink>,
}

impl DepthSinks {
    pub fn new(
        cloud: impl PointCloudSink + 'static,
        image: impl ImageSink + 'static,
        transform: impl TransformSink + 'static,
    ) -> Self {
        Self {
            cloud: Box::new(cloud),
            image: Box::new(image),
            transform: Box::new(transform),
        }
    }

    /// Route every output to clones of one sink.
    pub fn shared<S>(sink: S) -> Self
    where
        S: PointCloudSink + ImageSink + TransformSink + Clone + 'static,
    {
        Self::new(sink.clone(), sink.clone(), sink)
    }
}

/// Everything published to a [`RecordingSink`].
#[derive(Debug, Default, Clone)]
pub struct Recording {
    pub clouds: Vec<(Facet, WorldPointCloud)>,
    pub depth_images: Vec<(Facet, DepthImage, f64)>,
    pub stereo: Vec<(Facet, StereoExport)>,
    pub poses: Vec<CameraPoseRecord>,
}

/// In-memory sink. Clones share the same recording.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    pub fn snapshot(&self) -> Recording {
        self.lock().clone()
    }

    pub fn clear(&self) {
        *self.lock() = Recording::default();
    }

    fn lock(&self) -> MutexGuard<'_, Recording> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PointCloudSink for RecordingSink {
    fn publish_cloud(&mut self, facet: Facet, cloud: &WorldPointCloud) -> Result<(), SinkError> {
        self.lock().clouds.push((facet, cloud.clone()));
        Ok(())
    }
}

impl ImageSink for RecordingSink {
    fn publish_depth_image(&mut self, facet: Facet, image: &DepthImage, timestamp: f64) -> Result<(), SinkError> {
        self.lock().depth_images.push((facet, image.clone(), timestamp));
        Ok(())
    }

    fn publish_stereo(&mut self, facet: Facet, export: &StereoExport) -> Result<(), SinkError> {
        self.lock().stereo.push((facet, export.clone()));
        Ok(())
    }
}

impl TransformSink for RecordingSink {
    fn publish_pose(&mut self, record: &CameraPoseRecord) -> Result<(), SinkError> {
        self.lock().poses.push(record.clone());
        Ok(())
    }
}
