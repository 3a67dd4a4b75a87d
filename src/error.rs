//! Error types for overlap analysis.

use thiserror::Error;

/// Result type for overlap analysis operations.
pub type OverlapResult<T> = Result<T, OverlapError>;

/// Broad classification of an [`OverlapError`].
///
/// Each variant corresponds to one failure family of the analysis pipeline;
/// callers that only need to decide between "fix the data" and "fix the call"
/// can match on the kind instead of individual errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlapErrorKind {
    /// Slice geometry cannot be established.
    Geometry,
    /// Required per-frame or shared metadata is missing.
    Metadata,
    /// Segment reference metadata is present but invalid.
    Validation,
    /// The volume exceeds the addressable frame range.
    Capacity,
    /// Pixel buffers are missing or inconsistent during comparison.
    Comparison,
}

/// Errors that can occur during overlap analysis.
#[derive(Debug, Error)]
pub enum OverlapError {
    /// Orientation varies per frame; only parallel-slice volumes are supported.
    #[error("frames are not parallel (orientation varies per frame)")]
    FramesNotParallel,

    /// No spatial axis strictly dominates the slice normal, so slice ordering
    /// cannot be determined.
    #[error("cannot determine slice ordering axis from orientation")]
    AmbiguousAxis,

    /// Orientation metadata is absent.
    #[error("image orientation not found")]
    OrientationMissing,

    /// A frame has no position metadata.
    #[error("position not found for frame {frame}")]
    PositionMissing {
        /// The frame lacking a position.
        frame: u32,
    },

    /// Slice thickness metadata is absent.
    #[error("slice thickness not found")]
    SliceThicknessMissing,

    /// A frame has no referenced-segment metadata.
    #[error("referenced segment not found for frame {frame}")]
    SegmentReferenceMissing {
        /// The frame lacking a segment reference.
        frame: u32,
    },

    /// A frame references segment number 0; numbering is 1-based.
    #[error("frame {frame} references segment number 0 (numbering is 1-based)")]
    SegmentNumberZero {
        /// The offending frame.
        frame: u32,
    },

    /// A referenced segment number exceeds the declared segment count.
    #[error("segment number {number} out of range (volume declares {segment_count} segments)")]
    SegmentNumberOutOfRange {
        /// The out-of-range segment number.
        number: u32,
        /// Number of segments declared by the volume.
        segment_count: u32,
    },

    /// The volume has more frames than the addressable range (2^32 - 1).
    #[error("frame count {count} exceeds the addressable range (2^32 - 1)")]
    FrameCountExceeded {
        /// The declared frame count.
        count: usize,
    },

    /// Two frame buffers differ in length and cannot be compared.
    #[error("frames {frame_a} and {frame_b} have different buffer lengths ({len_a} vs {len_b})")]
    BufferLengthMismatch {
        /// First frame of the comparison.
        frame_a: u32,
        /// Second frame of the comparison.
        frame_b: u32,
        /// Buffer length of the first frame.
        len_a: usize,
        /// Buffer length of the second frame.
        len_b: usize,
    },

    /// A frame's pixel buffer could not be obtained.
    #[error("pixel buffer unavailable for frame {frame}")]
    BufferUnavailable {
        /// The frame whose buffer is missing.
        frame: u32,
    },
}

impl OverlapError {
    /// Returns the failure family this error belongs to.
    #[must_use]
    pub const fn kind(&self) -> OverlapErrorKind {
        match self {
            Self::FramesNotParallel | Self::AmbiguousAxis => OverlapErrorKind::Geometry,
            Self::OrientationMissing
            | Self::PositionMissing { .. }
            | Self::SliceThicknessMissing
            | Self::SegmentReferenceMissing { .. } => OverlapErrorKind::Metadata,
            Self::SegmentNumberZero { .. } | Self::SegmentNumberOutOfRange { .. } => {
                OverlapErrorKind::Validation
            }
            Self::FrameCountExceeded { .. } => OverlapErrorKind::Capacity,
            Self::BufferLengthMismatch { .. } | Self::BufferUnavailable { .. } => {
                OverlapErrorKind::Comparison
            }
        }
    }
}
