//! Indexing which segments occupy each logical position.

use std::collections::BTreeSet;

use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{OverlapError, OverlapResult};
use crate::source::SegmentationSource;

/// A segment occurrence at a logical position: which segment, via which
/// physical frame.
///
/// Ordered by segment number first, frame number second, so position entry
/// sets iterate in a stable, meaningful order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SegmentFrame {
    /// 1-based segment number.
    pub segment: u32,
    /// Zero-based physical frame index.
    pub frame: u32,
}

impl SegmentFrame {
    /// Creates a segment/frame pair.
    #[must_use]
    pub const fn new(segment: u32, frame: u32) -> Self {
        Self { segment, frame }
    }
}

/// Builds, for each logical position, the ordered set of segments present
/// there, each tagged with the contributing frame.
///
/// Every frame's referenced segment number is validated: `0` is rejected
/// (numbering is 1-based), numbers above the declared segment count are
/// rejected (numbering must be contiguous), and a missing reference is a
/// metadata failure.
pub(crate) fn segments_by_position<S: SegmentationSource>(
    source: &S,
    logical_positions: &[Vec<u32>],
) -> OverlapResult<Vec<BTreeSet<SegmentFrame>>> {
    let segment_count = source.segment_count();
    let mut result: Vec<BTreeSet<SegmentFrame>> = Vec::with_capacity(logical_positions.len());

    for frames in logical_positions {
        let mut entries = BTreeSet::new();
        for &frame in frames {
            let segment = source
                .referenced_segment_of(frame)
                .ok_or(OverlapError::SegmentReferenceMissing { frame })?;
            if segment == 0 {
                return Err(OverlapError::SegmentNumberZero { frame });
            }
            if segment > segment_count {
                return Err(OverlapError::SegmentNumberOutOfRange {
                    number: segment,
                    segment_count,
                });
            }
            entries.insert(SegmentFrame::new(segment, frame));
        }
        result.push(entries);
    }

    debug!(
        positions = result.len(),
        "indexed segments by logical position"
    );
    Ok(result)
}
