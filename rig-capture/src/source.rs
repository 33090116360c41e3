//! Per-tick rig frames and the sources that produce them.

use crate::buffer::FacetImage;
use rig_data::{CameraSide, RigPose};
use std::collections::VecDeque;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during capture.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Image decoding error: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything the rig delivered for one tick.
///
/// `upper` and `lower` hold one undistorted image per facet slot of the
/// respective fisheye. A slot may be missing if the undistortion stage
/// dropped it.
#[derive(Debug, Clone)]
pub struct RigFrame<I> {
    /// Body pose at capture time. Its timestamp is the tick timestamp.
    pub pose: RigPose,
    pub upper: Vec<I>,
    pub lower: Vec<I>,
    /// Frame number.
    pub frame_number: u64,
}

impl<I: FacetImage> RigFrame<I> {
    pub fn new(pose: RigPose, upper: Vec<I>, lower: Vec<I>, frame_number: u64) -> Self {
        Self {
            pose,
            upper,
            lower,
            frame_number,
        }
    }

    pub fn timestamp(&self) -> f64 {
        self.pose.timestamp
    }

    /// Image at `slot` for one camera, if present and non-empty.
    pub fn facet_image(&self, side: CameraSide, slot: usize) -> Option<&I> {
        let images = match side {
            CameraSide::Upper => &self.upper,
            CameraSide::Lower => &self.lower,
        };
        images.get(slot).filter(|image| !image.is_empty())
    }
}

/// Trait for sources that deliver rig frames tick by tick.
pub trait RigSource {
    type Image: FacetImage;

    /// Get the next frame. Returns `None` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<RigFrame<Self::Image>>, CaptureError>;

    /// Get the frame rate, if known.
    fn frame_rate(&self) -> Option<f32>;

    /// Check if the source is still active.
    fn is_active(&self) -> bool;

    /// Stop delivering frames.
    fn stop(&mut self);
}

/// Replays a fixed list of frames, e.g. from a recorded sequence.
pub struct ReplaySource<I> {
    frames: VecDeque<RigFrame<I>>,
    frame_rate: Option<f32>,
    active: bool,
}

impl<I: FacetImage> ReplaySource<I> {
    pub fn new(frames: Vec<RigFrame<I>>) -> Self {
        Self {
            frames: frames.into(),
            frame_rate: None,
            active: true,
        }
    }

    /// Set the nominal frame rate.
    pub fn with_frame_rate(mut self, fps: f32) -> Self {
        self.frame_rate = Some(fps);
        self
    }

    /// Frames not yet delivered.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl<I: FacetImage> RigSource for ReplaySource<I> {
    type Image = I;

    fn next_frame(&mut self) -> Result<Option<RigFrame<I>>, CaptureError> {
        if !self.active {
            return Ok(None);
        }
        let frame = self.frames.pop_front();
        match &frame {
            Some(f) => debug!("Replaying frame {} at t={:.3}", f.frame_number, f.timestamp()),
            None => self.active = false,
        }
        Ok(frame)
    }

    fn frame_rate(&self) -> Option<f32> {
        self.frame_rate
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn stop(&mut self) {
        self.active = false;
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::HostImage;
    use image::GrayImage;

    fn frame(n: u64, slots: usize) -> RigFrame<HostImage> {
        let images: Vec<HostImage> = (0..slots)
            .map(|_| HostImage::Gray(GrayImage::new(4, 4)))
            .collect();
        RigFrame::new(RigPose::identity(n as f64 * 0.1), images.clone(), images, n)
    }

    #[test]
    fn test_facet_image_lookup() {
        let mut f = frame(0, 3);
        f.lower[1] = HostImage::Gray(GrayImage::new(0, 0));
        assert!(f.facet_image(CameraSide::Upper, 2).is_some());
        assert!(f.facet_image(CameraSide::Upper, 3).is_none());
        assert!(f.facet_image(CameraSide::Lower, 1).is_none());
    }

    #[test]
    fn test_replay_source_drains_in_order() {
        let mut source = ReplaySource::new(vec![frame(0, 1), frame(1, 1)]).with_frame_rate(20.0);
        assert_eq!(source.frame_rate(), Some(20.0));
        assert_eq!(source.next_frame().unwrap().unwrap().frame_number, 0);
        assert_eq!(source.next_frame().unwrap().unwrap().frame_number, 1);
        assert!(source.is_active());
        assert!(source.next_frame().unwrap().is_none());
        assert!(!source.is_active());
    }

    #[test]
    fn test_replay_source_stop() {
        let mut source = ReplaySource::new(vec![frame(0, 1)]);
        source.stop();
        assert_eq!(source.remaining(), 0);
        assert!(source.next_frame().unwrap().is_none());
    }
}
