//! The segmentation source seam and an owned in-memory implementation.
//!
//! Parsing, metadata extraction, and pixel decoding live outside this crate;
//! the analysis only needs the narrow read-only view captured by
//! [`SegmentationSource`]. [`SegmentationBuffer`] is the crate's owned
//! implementation for callers that already hold decoded data, and doubles as
//! the fixture used throughout the crate's tests and examples.

use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::ImageOrientation;

/// Fixed pixel dimensions shared by every frame of a volume.
///
/// # Example
///
/// ```
/// use seg_overlap::FrameGeometry;
///
/// let geometry = FrameGeometry::new(8, 8);
/// assert_eq!(geometry.pixel_count(), 64);
/// assert!(geometry.is_byte_aligned());
/// assert!(!FrameGeometry::new(3, 3).is_byte_aligned());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameGeometry {
    /// Number of pixel rows per frame.
    pub rows: u16,
    /// Number of pixel columns per frame.
    pub columns: u16,
}

impl FrameGeometry {
    /// Creates a frame geometry from row and column counts.
    #[must_use]
    pub const fn new(rows: u16, columns: u16) -> Self {
        Self { rows, columns }
    }

    /// Total number of pixels per frame.
    #[must_use]
    pub const fn pixel_count(self) -> u32 {
        self.rows as u32 * self.columns as u32
    }

    /// Whether a packed one-bit mask of this geometry fills whole bytes.
    ///
    /// This is the predicate that selects between the byte-wise and the
    /// per-pixel comparison strategies.
    #[must_use]
    pub const fn is_byte_aligned(self) -> bool {
        self.pixel_count() % 8 == 0
    }

    /// Number of bytes a packed one-bit mask of this geometry occupies.
    #[must_use]
    pub const fn packed_len(self) -> usize {
        self.pixel_count().div_ceil(8) as usize
    }
}

/// Read-only view of a multi-frame labeled segmentation volume.
///
/// Frames are addressed by zero-based index; segments are numbered from 1 to
/// [`segment_count`](Self::segment_count), contiguously. Pixel buffers are
/// binary masks, one bit per pixel, row-major, LSB-first within each byte.
///
/// Accessors return `None` where the underlying container lacks the
/// corresponding metadata; the analysis maps each absence to the appropriate
/// error.
pub trait SegmentationSource {
    /// Number of segments declared by the volume.
    fn segment_count(&self) -> u32;

    /// Number of frames in the volume.
    fn frame_count(&self) -> usize;

    /// Shared image orientation, with a flag telling whether orientation is
    /// actually stored per frame (`true` means the frames may not be
    /// parallel).
    fn orientation_of(&self, frame: u32) -> Option<(ImageOrientation, bool)>;

    /// World-coordinate position of a frame's first pixel.
    fn position_of(&self, frame: u32) -> Option<Point3<f64>>;

    /// Slice thickness from the volume's pixel-geometry metadata.
    fn slice_thickness(&self) -> Option<f64>;

    /// The 1-based segment number a frame belongs to.
    fn referenced_segment_of(&self, frame: u32) -> Option<u32>;

    /// The packed binary mask of a frame.
    fn pixel_data_of(&self, frame: u32) -> Option<&[u8]>;

    /// Pixel dimensions shared by all frames.
    fn frame_geometry(&self) -> FrameGeometry;
}

/// One frame of a [`SegmentationBuffer`].
#[derive(Debug, Clone)]
struct BufferedFrame {
    position: Point3<f64>,
    segment: u32,
    mask: Vec<u8>,
}

/// An owned in-memory segmentation volume.
///
/// Useful when the container has already been parsed elsewhere and the
/// decoded frames just need to be analyzed, and as a test fixture.
///
/// # Example
///
/// ```
/// use nalgebra::Point3;
/// use seg_overlap::{ImageOrientation, FrameGeometry, SegmentationBuffer, SegmentationSource};
///
/// let axial = ImageOrientation::from_cosines([1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
/// let mut volume = SegmentationBuffer::new(2, FrameGeometry::new(8, 8), axial, 1.0);
/// volume.push_frame(Point3::new(0.0, 0.0, 0.0), 1, vec![0x01; 8]);
/// volume.push_frame(Point3::new(0.0, 0.0, 0.0), 2, vec![0x80; 8]);
///
/// assert_eq!(volume.frame_count(), 2);
/// assert_eq!(volume.referenced_segment_of(1), Some(2));
/// ```
#[derive(Debug, Clone)]
pub struct SegmentationBuffer {
    segment_count: u32,
    geometry: FrameGeometry,
    orientation: Option<ImageOrientation>,
    per_frame_orientation: bool,
    slice_thickness: Option<f64>,
    frames: Vec<BufferedFrame>,
}

impl SegmentationBuffer {
    /// Creates an empty volume with shared metadata.
    #[must_use]
    pub fn new(
        segment_count: u32,
        geometry: FrameGeometry,
        orientation: ImageOrientation,
        slice_thickness: f64,
    ) -> Self {
        Self {
            segment_count,
            geometry,
            orientation: Some(orientation),
            per_frame_orientation: false,
            slice_thickness: Some(slice_thickness),
            frames: Vec::new(),
        }
    }

    /// Appends a frame with its position, referenced segment, and packed mask.
    pub fn push_frame(&mut self, position: Point3<f64>, segment: u32, mask: Vec<u8>) {
        self.frames.push(BufferedFrame {
            position,
            segment,
            mask,
        });
    }

    /// Marks the orientation as stored per frame rather than shared.
    ///
    /// Analysis of such a volume fails with
    /// [`OverlapError::FramesNotParallel`](crate::OverlapError::FramesNotParallel).
    pub fn set_per_frame_orientation(&mut self, per_frame: bool) {
        self.per_frame_orientation = per_frame;
    }

    /// Removes the shared orientation metadata entirely.
    pub fn clear_orientation(&mut self) {
        self.orientation = None;
    }

    /// Removes the slice thickness metadata.
    pub fn clear_slice_thickness(&mut self) {
        self.slice_thickness = None;
    }
}

impl SegmentationSource for SegmentationBuffer {
    fn segment_count(&self) -> u32 {
        self.segment_count
    }

    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn orientation_of(&self, _frame: u32) -> Option<(ImageOrientation, bool)> {
        self.orientation
            .map(|orientation| (orientation, self.per_frame_orientation))
    }

    fn position_of(&self, frame: u32) -> Option<Point3<f64>> {
        self.frames.get(frame as usize).map(|f| f.position)
    }

    fn slice_thickness(&self) -> Option<f64> {
        self.slice_thickness
    }

    fn referenced_segment_of(&self, frame: u32) -> Option<u32> {
        self.frames.get(frame as usize).map(|f| f.segment)
    }

    fn pixel_data_of(&self, frame: u32) -> Option<&[u8]> {
        self.frames.get(frame as usize).map(|f| f.mask.as_slice())
    }

    fn frame_geometry(&self) -> FrameGeometry {
        self.geometry
    }
}
