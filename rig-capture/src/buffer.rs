//! Image buffer capability used by the stereo frame preparer.

use crate::source::CaptureError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageBuffer, Pixel, RgbImage};
use std::path::Path;
use tracing::debug;

/// Image operations the depth pipeline issues on facet images.
///
/// Operations return new buffers and may be lazily executed on a device;
/// [`FacetImage::download`] is the synchronization point that yields host
/// pixels.
pub trait FacetImage: Sized {
    /// (width, height) in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Number of color channels (1 or 3).
    fn channels(&self) -> u8;

    /// Scale both axes by `ratio`, see [`scaled_dimension`].
    fn resize(&self, ratio: f64) -> Self;

    /// Single-channel luminance copy. Single-channel inputs are copied as-is.
    fn to_gray(&self) -> Self;

    /// Swap rows and columns.
    fn transpose(&self) -> Self;

    /// Mirror top to bottom.
    fn flip_vertical(&self) -> Self;

    /// Block until pixels are available in host memory.
    fn download(&self) -> HostImage;

    fn is_empty(&self) -> bool {
        let (w, h) = self.dimensions();
        w == 0 || h == 0
    }
}

/// Size of one axis after scaling by `ratio`, rounded to nearest and never
/// collapsing a non-empty axis to zero.
pub fn scaled_dimension(dim: u32, ratio: f64) -> u32 {
    if dim == 0 {
        return 0;
    }
    ((dim as f64 * ratio).round() as u32).max(1)
}

/// Facet image held in host memory.
#[derive(Debug, Clone, PartialEq)]
pub enum HostImage {
    Gray(GrayImage),
    Rgb(RgbImage),
}

impl HostImage {
    /// Load from disk. Grayscale files stay single-channel, anything else is
    /// converted to 8-bit RGB.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        let decoded = image::open(path)?;
        let image = match decoded {
            DynamicImage::ImageLuma8(gray) => HostImage::Gray(gray),
            other => HostImage::Rgb(other.to_rgb8()),
        };
        debug!(
            "Loaded {} ({}x{}, {} channel)",
            path.display(),
            image.dimensions().0,
            image.dimensions().1,
            image.channels()
        );
        Ok(image)
    }

    /// RGB copy; grayscale pixels are replicated across channels.
    pub fn to_rgb(&self) -> RgbImage {
        match self {
            HostImage::Gray(gray) => DynamicImage::ImageLuma8(gray.clone()).to_rgb8(),
            HostImage::Rgb(rgb) => rgb.clone(),
        }
    }

    /// Luminance image, converting if needed.
    pub fn into_gray(self) -> GrayImage {
        match self {
            HostImage::Gray(gray) => gray,
            HostImage::Rgb(rgb) => imageops::grayscale(&rgb),
        }
    }
}

impl From<GrayImage> for HostImage {
    fn from(image: GrayImage) -> Self {
        HostImage::Gray(image)
    }
}

impl From<RgbImage> for HostImage {
    fn from(image: RgbImage) -> Self {
        HostImage::Rgb(image)
    }
}

impl FacetImage for HostImage {
    fn dimensions(&self) -> (u32, u32) {
        match self {
            HostImage::Gray(img) => img.dimensions(),
            HostImage::Rgb(img) => img.dimensions(),
        }
    }

    fn channels(&self) -> u8 {
        match self {
            HostImage::Gray(_) => 1,
            HostImage::Rgb(_) => 3,
        }
    }

    fn resize(&self, ratio: f64) -> Self {
        let (w, h) = self.dimensions();
        let (nw, nh) = (scaled_dimension(w, ratio), scaled_dimension(h, ratio));
        if (nw, nh) == (w, h) {
            return self.clone();
        }
        match self {
            HostImage::Gray(img) => HostImage::Gray(imageops::resize(img, nw, nh, FilterType::Triangle)),
            HostImage::Rgb(img) => HostImage::Rgb(imageops::resize(img, nw, nh, FilterType::Triangle)),
        }
    }

    fn to_gray(&self) -> Self {
        match self {
            HostImage::Gray(img) => HostImage::Gray(img.clone()),
            HostImage::Rgb(img) => HostImage::Gray(imageops::grayscale(img)),
        }
    }

    fn transpose(&self) -> Self {
        match self {
            HostImage::Gray(img) => HostImage::Gray(transpose_buffer(img)),
            HostImage::Rgb(img) => HostImage::Rgb(transpose_buffer(img)),
        }
    }

    fn flip_vertical(&self) -> Self {
        match self {
            HostImage::Gray(img) => HostImage::Gray(imageops::flip_vertical(img)),
            HostImage::Rgb(img) => HostImage::Rgb(imageops::flip_vertical(img)),
        }
    }

    fn download(&self) -> HostImage {
        self.clone()
    }
}

fn transpose_buffer<P: Pixel>(img: &ImageBuffer<P, Vec<P::Subpixel>>) -> ImageBuffer<P, Vec<P::Subpixel>> {
    let (w, h) = img.dimensions();
    ImageBuffer::from_fn(h, w, |x, y| *img.get_pixel(y, x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    fn ramp(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| Luma([(y * w + x) as u8]))
    }

    #[test]
    fn test_scaled_dimension_rounding() {
        assert_eq!(scaled_dimension(640, 0.5), 320);
        assert_eq!(scaled_dimension(5, 0.5), 3);
        assert_eq!(scaled_dimension(1, 0.1), 1);
        assert_eq!(scaled_dimension(0, 0.5), 0);
        assert_eq!(scaled_dimension(7, 1.0), 7);
    }

    #[test]
    fn test_resize_dimensions() {
        let img = HostImage::Gray(ramp(8, 6));
        assert_eq!(img.resize(0.5).dimensions(), (4, 3));
    }

    #[test]
    fn test_transpose_swaps_axes() {
        let img = HostImage::Gray(ramp(3, 2));
        let HostImage::Gray(t) = img.transpose() else {
            panic!("transpose changed channel count");
        };
        assert_eq!(t.dimensions(), (2, 3));
        // t(x, y) = src(y, x)
        assert_eq!(t.get_pixel(1, 2).0[0], 5);
        assert_eq!(t.get_pixel(0, 1).0[0], 1);
    }

    #[test]
    fn test_flip_vertical() {
        let img = HostImage::Gray(ramp(2, 3));
        let HostImage::Gray(f) = img.flip_vertical() else {
            panic!("flip changed channel count");
        };
        assert_eq!(f.get_pixel(0, 0).0[0], 4);
        assert_eq!(f.get_pixel(1, 2).0[0], 1);
    }

    #[test]
    fn test_to_gray_reduces_channels() {
        let rgb = RgbImage::from_pixel(4, 4, Rgb([200, 200, 200]));
        let gray = HostImage::Rgb(rgb).to_gray();
        assert_eq!(gray.channels(), 1);
        let HostImage::Gray(g) = gray else {
            panic!("expected gray output");
        };
        assert_eq!(g.get_pixel(2, 2).0[0], 200);
    }

    #[test]
    fn test_to_rgb_replicates_gray() {
        let img = HostImage::Gray(GrayImage::from_pixel(1, 1, Luma([42])));
        assert_eq!(img.to_rgb().get_pixel(0, 0).0, [42, 42, 42]);
    }

    #[test]
    fn test_empty_detection() {
        assert!(HostImage::Gray(GrayImage::new(0, 4)).is_empty());
        assert!(!HostImage::Gray(GrayImage::new(1, 1)).is_empty());
    }
}
