//! Pairwise segment overlap analysis for multi-frame labeled segmentation
//! volumes.
//!
//! Given a volume whose frames are binary masks of named segments at known
//! 3D positions, this crate determines, for every pair of segments, whether
//! their pixel footprints ever coincide on the same physical slice. Clients
//! such as format converters use the answer to decide whether segments can
//! be merged into a single label map or must be split into overlap-free
//! groups.
//!
//! # Pipeline
//!
//! The analysis runs through a fixed, lazily evaluated chain, each stage
//! cached by [`OverlapAnalyzer`]:
//!
//! 1. Validate that all frames share one orientation (parallel slices).
//! 2. Pick the changing coordinate from the slice normal and group frames
//!    into logical positions with a tolerance of 1% of the slice thickness.
//! 3. Index which segments occupy each logical position.
//! 4. Compare co-located segments pixel-wise into a symmetric
//!    [`OverlapMatrix`].
//! 5. Greedily partition segments into non-overlapping groups.
//!
//! # Scope
//!
//! Container parsing, metadata extraction, and pixel decoding live outside
//! this crate, behind the [`SegmentationSource`] trait;
//! [`SegmentationBuffer`] is an owned in-memory implementation for already
//! decoded data. Computation is synchronous and single-threaded: the
//! analyzer takes `&mut self`, and long-running matrix builds belong on a
//! worker thread owned by the caller.
//!
//! # Example
//!
//! ```
//! use nalgebra::Point3;
//! use seg_overlap::{
//!     FrameGeometry, ImageOrientation, OverlapAnalyzer, SegmentationBuffer,
//! };
//!
//! let axial = ImageOrientation::from_cosines([1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
//! let mut volume = SegmentationBuffer::new(2, FrameGeometry::new(8, 8), axial, 1.0);
//!
//! // Segment 1 and 2 on the same slice with disjoint masks,
//! // segment 1 alone on the next slice.
//! volume.push_frame(Point3::new(0.0, 0.0, 0.0), 1, vec![0x0F; 8]);
//! volume.push_frame(Point3::new(0.0, 0.0, 0.0), 2, vec![0xF0; 8]);
//! volume.push_frame(Point3::new(0.0, 0.0, 1.0), 1, vec![0xFF; 8]);
//!
//! let mut analyzer = OverlapAnalyzer::new(&volume);
//! assert!(!analyzer.overlap_matrix().unwrap().overlaps(1, 2));
//! assert_eq!(analyzer.non_overlapping_groups().unwrap(), &[vec![1, 2]]);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them.
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod analyzer;
mod compare;
mod error;
mod geometry;
mod index;
mod matrix;
mod partition;
mod position;
mod source;

// Re-export core types
pub use analyzer::OverlapAnalyzer;
pub use compare::{packed_masks_overlap, unpack_bits, unpacked_masks_overlap};
pub use error::{OverlapError, OverlapErrorKind, OverlapResult};
pub use geometry::{changing_axis, ImageOrientation, SliceAxis};
pub use index::SegmentFrame;
pub use matrix::OverlapMatrix;
pub use source::{FrameGeometry, SegmentationBuffer, SegmentationSource};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
