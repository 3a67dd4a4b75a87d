//! The pairwise segment overlap matrix.

use std::collections::BTreeSet;
use std::fmt;

use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::compare::frames_overlap;
use crate::error::OverlapResult;
use crate::index::SegmentFrame;
use crate::source::SegmentationSource;

/// Cell value meaning "pair not compared yet".
const UNKNOWN: i8 = -1;

/// Symmetric N×N matrix recording which segment pairs overlap.
///
/// Rows and columns are indexed by 1-based segment number. During
/// construction cells hold `-1` (unknown), `0` (no overlap), or `1`
/// (overlap); a completed matrix holds only `0` and `1`, with a zero
/// diagonal. Pairs never co-located at any logical position end up `0`.
///
/// # Example
///
/// ```
/// use seg_overlap::OverlapMatrix;
///
/// let matrix = OverlapMatrix::new(3);
/// assert_eq!(matrix.segment_count(), 3);
/// assert!(!matrix.overlaps(1, 2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OverlapMatrix {
    segment_count: u32,
    cells: Vec<i8>,
}

impl OverlapMatrix {
    /// Creates a matrix with every off-diagonal pair unknown and the
    /// diagonal fixed at "no overlap".
    #[must_use]
    pub fn new(segment_count: u32) -> Self {
        let n = segment_count as usize;
        let mut cells = vec![UNKNOWN; n * n];
        for i in 0..n {
            cells[i * n + i] = 0;
        }
        Self {
            segment_count,
            cells,
        }
    }

    /// Number of segments the matrix covers.
    #[must_use]
    pub const fn segment_count(&self) -> u32 {
        self.segment_count
    }

    /// Whether two segments (1-based) were observed overlapping.
    ///
    /// Unknown cells count as "no overlap"; a completed matrix has none.
    ///
    /// # Panics
    ///
    /// Panics if either segment number is 0 or above the segment count.
    #[must_use]
    pub fn overlaps(&self, segment_a: u32, segment_b: u32) -> bool {
        self.get(segment_a, segment_b) == 1
    }

    /// Raw cell value for a segment pair (1-based).
    ///
    /// # Panics
    ///
    /// Panics if either segment number is 0 or above the segment count.
    #[must_use]
    pub fn get(&self, segment_a: u32, segment_b: u32) -> i8 {
        self.cells[self.cell_index(segment_a, segment_b)]
    }

    /// Records a comparison result symmetrically for a segment pair.
    fn set(&mut self, segment_a: u32, segment_b: u32, overlap: bool) {
        let value = i8::from(overlap);
        let ab = self.cell_index(segment_a, segment_b);
        let ba = self.cell_index(segment_b, segment_a);
        self.cells[ab] = value;
        self.cells[ba] = value;
    }

    /// Coerces every remaining unknown cell to "no overlap".
    ///
    /// Pairs never co-located at any logical position were never compared;
    /// no co-location means no observable overlap.
    fn resolve_unknown(&mut self) {
        for cell in &mut self.cells {
            if *cell == UNKNOWN {
                *cell = 0;
            }
        }
    }

    /// Builds a completed matrix directly from overlapping pairs.
    #[cfg(test)]
    pub(crate) fn from_pairs(segment_count: u32, pairs: &[(u32, u32)]) -> Self {
        let mut matrix = Self::new(segment_count);
        for &(a, b) in pairs {
            matrix.set(a, b, true);
        }
        matrix.resolve_unknown();
        matrix
    }

    fn cell_index(&self, segment_a: u32, segment_b: u32) -> usize {
        assert!(
            segment_a >= 1 && segment_a <= self.segment_count,
            "segment number {segment_a} out of range 1..={}",
            self.segment_count
        );
        assert!(
            segment_b >= 1 && segment_b <= self.segment_count,
            "segment number {segment_b} out of range 1..={}",
            self.segment_count
        );
        let n = self.segment_count as usize;
        (segment_a as usize - 1) * n + (segment_b as usize - 1)
    }
}

impl fmt::Display for OverlapMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for a in 1..=self.segment_count {
            for b in 1..=self.segment_count {
                if b > 1 {
                    write!(f, " ")?;
                }
                write!(f, "{}", self.get(a, b))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Builds the full overlap matrix from the per-position segment index.
///
/// For each logical position, every unordered pair of distinct entries with
/// differing segment numbers is visited exactly once (an explicit `i < j`
/// double loop over the materialized entry sequence). Pairs already recorded
/// as overlapping at an earlier position are not re-compared: overlap is
/// existential, one confirmed occurrence suffices.
pub(crate) fn build_overlap_matrix<S: SegmentationSource>(
    source: &S,
    segments_by_position: &[BTreeSet<SegmentFrame>],
) -> OverlapResult<OverlapMatrix> {
    let mut matrix = OverlapMatrix::new(source.segment_count());

    for (position, entry_set) in segments_by_position.iter().enumerate() {
        debug!(position, "comparing segments at logical position");
        let entries: Vec<SegmentFrame> = entry_set.iter().copied().collect();
        for i in 0..entries.len() {
            for j in (i + 1)..entries.len() {
                let a = entries[i];
                let b = entries[j];
                if a.segment == b.segment {
                    continue;
                }
                if matrix.get(a.segment, b.segment) == 1 {
                    debug!(
                        position,
                        segment_a = a.segment,
                        segment_b = b.segment,
                        "skipping comparison, pair already overlaps"
                    );
                    continue;
                }
                let overlap = frames_overlap(source, a.frame, b.frame)?;
                matrix.set(a.segment, b.segment, overlap);
            }
        }
    }

    matrix.resolve_unknown();
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ImageOrientation;
    use crate::source::{FrameGeometry, SegmentationBuffer};
    use nalgebra::Point3;

    fn axial() -> ImageOrientation {
        ImageOrientation::from_cosines([1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
    }

    fn entry_set(entries: &[(u32, u32)]) -> BTreeSet<SegmentFrame> {
        entries
            .iter()
            .map(|&(segment, frame)| SegmentFrame::new(segment, frame))
            .collect()
    }

    #[test]
    fn test_new_matrix_zero_diagonal_unknown_rest() {
        let matrix = OverlapMatrix::new(3);
        for i in 1..=3 {
            assert_eq!(matrix.get(i, i), 0);
        }
        assert_eq!(matrix.get(1, 2), UNKNOWN);
        assert_eq!(matrix.get(3, 1), UNKNOWN);
    }

    #[test]
    fn test_build_marks_overlapping_pair() {
        let mut volume = SegmentationBuffer::new(2, FrameGeometry::new(8, 8), axial(), 1.0);
        let mut shared = vec![0u8; 8];
        shared[3] = 0x10;
        volume.push_frame(Point3::origin(), 1, shared.clone());
        volume.push_frame(Point3::origin(), 2, shared);

        let index = vec![entry_set(&[(1, 0), (2, 1)])];
        let matrix = build_overlap_matrix(&volume, &index).unwrap();
        assert_eq!(matrix.get(1, 2), 1);
        assert_eq!(matrix.get(2, 1), 1);
        assert_eq!(matrix.get(1, 1), 0);
        assert_eq!(matrix.get(2, 2), 0);
    }

    #[test]
    fn test_build_never_colocated_pairs_resolve_to_zero() {
        let mut volume = SegmentationBuffer::new(3, FrameGeometry::new(8, 8), axial(), 1.0);
        volume.push_frame(Point3::origin(), 1, vec![0xFF; 8]);
        volume.push_frame(Point3::new(0.0, 0.0, 1.0), 2, vec![0xFF; 8]);

        // Segments 1 and 2 sit at different positions; segment 3 has no frames.
        let index = vec![entry_set(&[(1, 0)]), entry_set(&[(2, 1)])];
        let matrix = build_overlap_matrix(&volume, &index).unwrap();
        for a in 1..=3 {
            for b in 1..=3 {
                assert_eq!(matrix.get(a, b), 0, "cell ({a}, {b})");
            }
        }
    }

    #[test]
    fn test_build_overlap_found_once_is_kept() {
        // Position 0: masks overlap. Position 1: same pair, disjoint masks.
        // The earlier positive result must survive (and the pair is skipped).
        let mut volume = SegmentationBuffer::new(2, FrameGeometry::new(8, 8), axial(), 1.0);
        volume.push_frame(Point3::origin(), 1, vec![0x01; 8]);
        volume.push_frame(Point3::origin(), 2, vec![0x01; 8]);
        volume.push_frame(Point3::new(0.0, 0.0, 1.0), 1, vec![0x02; 8]);
        volume.push_frame(Point3::new(0.0, 0.0, 1.0), 2, vec![0x04; 8]);

        let index = vec![entry_set(&[(1, 0), (2, 1)]), entry_set(&[(1, 2), (2, 3)])];
        let matrix = build_overlap_matrix(&volume, &index).unwrap();
        assert_eq!(matrix.get(1, 2), 1);
    }

    #[test]
    fn test_build_no_overlap_can_be_upgraded_later() {
        // Position 0: disjoint masks. Position 1: same pair overlaps.
        let mut volume = SegmentationBuffer::new(2, FrameGeometry::new(8, 8), axial(), 1.0);
        volume.push_frame(Point3::origin(), 1, vec![0x02; 8]);
        volume.push_frame(Point3::origin(), 2, vec![0x04; 8]);
        volume.push_frame(Point3::new(0.0, 0.0, 1.0), 1, vec![0x01; 8]);
        volume.push_frame(Point3::new(0.0, 0.0, 1.0), 2, vec![0x01; 8]);

        let index = vec![entry_set(&[(1, 0), (2, 1)]), entry_set(&[(1, 2), (2, 3)])];
        let matrix = build_overlap_matrix(&volume, &index).unwrap();
        assert_eq!(matrix.get(1, 2), 1);
    }

    #[test]
    fn test_build_same_segment_entries_not_compared() {
        // Two frames of the same segment at one position with identical
        // masks: no pair with differing segment numbers exists, and a
        // segment never overlaps itself.
        let mut volume = SegmentationBuffer::new(1, FrameGeometry::new(8, 8), axial(), 1.0);
        volume.push_frame(Point3::origin(), 1, vec![0xFF; 8]);
        volume.push_frame(Point3::origin(), 1, vec![0xFF; 8]);

        let index = vec![entry_set(&[(1, 0), (1, 1)])];
        let matrix = build_overlap_matrix(&volume, &index).unwrap();
        assert_eq!(matrix.get(1, 1), 0);
    }

    #[test]
    fn test_display_renders_rows() {
        let mut volume = SegmentationBuffer::new(2, FrameGeometry::new(8, 8), axial(), 1.0);
        volume.push_frame(Point3::origin(), 1, vec![0x01; 8]);
        volume.push_frame(Point3::origin(), 2, vec![0x01; 8]);
        let index = vec![entry_set(&[(1, 0), (2, 1)])];
        let matrix = build_overlap_matrix(&volume, &index).unwrap();
        assert_eq!(format!("{matrix}"), "0 1\n1 0\n");
    }

    #[test]
    fn test_empty_index_matrix_all_zero() {
        let volume = SegmentationBuffer::new(2, FrameGeometry::new(8, 8), axial(), 1.0);
        let matrix = build_overlap_matrix(&volume, &[]).unwrap();
        assert_eq!(matrix.get(1, 2), 0);
        assert_eq!(matrix.get(2, 1), 0);
    }
}
