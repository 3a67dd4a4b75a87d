//! Grouping physical frames into logical slice positions.
//!
//! Frames are sorted along the changing coordinate (the axis the slice
//! normal points along) and then clustered sequentially: a frame joins the
//! current logical position when it sits strictly closer than 1% of the
//! slice thickness to its predecessor in sort order, otherwise it starts a
//! new one. Only adjacent-in-sort-order frames are compared, so two frames
//! farther apart than the tolerance never merge even if a frame between them
//! would bridge the gap.

use nalgebra::Point3;
use tracing::debug;

use crate::error::{OverlapError, OverlapResult};
use crate::geometry::SliceAxis;
use crate::source::SegmentationSource;

/// Fraction of the slice thickness within which two frames count as the same
/// physical slice.
const POSITION_TOLERANCE_FRACTION: f64 = 0.01;

/// A physical frame together with its world-coordinate position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FramePosition {
    /// Zero-based physical frame index.
    pub frame: u32,
    /// Position of the frame's first pixel.
    pub position: Point3<f64>,
}

/// Collects one position per frame, in physical frame order.
///
/// Fails with [`OverlapError::FrameCountExceeded`] when the volume has more
/// frames than the addressable range, and with
/// [`OverlapError::PositionMissing`] when any frame lacks a position.
pub(crate) fn collect_frame_positions<S: SegmentationSource>(
    source: &S,
) -> OverlapResult<Vec<FramePosition>> {
    let frame_count = checked_frame_count(source)?;
    let mut positions = Vec::with_capacity(frame_count as usize);
    for frame in 0..frame_count {
        let position = source
            .position_of(frame)
            .ok_or(OverlapError::PositionMissing { frame })?;
        positions.push(FramePosition { frame, position });
    }
    Ok(positions)
}

/// Returns the frame count as `u32`, enforcing the 2^32 - 1 cap.
pub(crate) fn checked_frame_count<S: SegmentationSource>(source: &S) -> OverlapResult<u32> {
    let count = source.frame_count();
    u32::try_from(count).map_err(|_| OverlapError::FrameCountExceeded { count })
}

/// Groups frames into logical positions along the changing axis.
///
/// Returns an ordered list of logical positions, each an ordered list of
/// physical frame indices, ascending along `axis`, covering every frame
/// exactly once. An empty input yields an empty list.
pub(crate) fn group_frames_by_position(
    frame_positions: &[FramePosition],
    axis: SliceAxis,
    slice_thickness: f64,
) -> Vec<Vec<u32>> {
    let mut sorted = frame_positions.to_vec();
    sorted.sort_by(|a, b| {
        axis.coordinate(&a.position)
            .total_cmp(&axis.coordinate(&b.position))
    });

    let tolerance = slice_thickness * POSITION_TOLERANCE_FRACTION;
    let mut logical: Vec<Vec<u32>> = Vec::new();

    if let Some(first) = sorted.first() {
        logical.push(vec![first.frame]);
        for pair in sorted.windows(2) {
            let diff =
                (axis.coordinate(&pair[1].position) - axis.coordinate(&pair[0].position)).abs();
            if diff < tolerance {
                // Same physical slice, within tolerance of its predecessor.
                if let Some(current) = logical.last_mut() {
                    current.push(pair[1].frame);
                }
            } else {
                logical.push(vec![pair[1].frame]);
            }
        }
    }

    debug!(
        frames = frame_positions.len(),
        positions = logical.len(),
        ?axis,
        "grouped frames by logical position"
    );
    logical
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions_along_z(coords: &[f64]) -> Vec<FramePosition> {
        coords
            .iter()
            .enumerate()
            .map(|(i, &z)| FramePosition {
                frame: u32::try_from(i).unwrap(),
                position: Point3::new(0.0, 0.0, z),
            })
            .collect()
    }

    #[test]
    fn test_groups_distinct_slices() {
        let frames = positions_along_z(&[0.0, 2.0, 4.0]);
        let logical = group_frames_by_position(&frames, SliceAxis::Z, 2.0);
        assert_eq!(logical, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_groups_coincident_frames() {
        let frames = positions_along_z(&[0.0, 2.0, 0.0, 2.0]);
        let logical = group_frames_by_position(&frames, SliceAxis::Z, 2.0);
        assert_eq!(logical, vec![vec![0, 2], vec![1, 3]]);
    }

    #[test]
    fn test_sorts_ascending_along_axis() {
        let frames = positions_along_z(&[4.0, 0.0, 2.0]);
        let logical = group_frames_by_position(&frames, SliceAxis::Z, 2.0);
        assert_eq!(logical, vec![vec![1], vec![2], vec![0]]);
    }

    #[test]
    fn test_tolerance_boundary_is_strict() {
        // Exactly 1% of slice thickness apart: must NOT merge.
        let frames = positions_along_z(&[0.0, 0.02]);
        let logical = group_frames_by_position(&frames, SliceAxis::Z, 2.0);
        assert_eq!(logical.len(), 2);

        // 0.99% apart: must merge.
        let frames = positions_along_z(&[0.0, 0.0198]);
        let logical = group_frames_by_position(&frames, SliceAxis::Z, 2.0);
        assert_eq!(logical, vec![vec![0, 1]]);
    }

    #[test]
    fn test_sequential_clustering_no_bridging() {
        // Each neighbor pair is within tolerance, so the chain merges even
        // though the ends are farther apart than the tolerance; clustering is
        // strictly adjacent-pair based.
        let frames = positions_along_z(&[0.0, 0.015, 0.03]);
        let logical = group_frames_by_position(&frames, SliceAxis::Z, 2.0);
        assert_eq!(logical, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_single_frame() {
        let frames = positions_along_z(&[1.5]);
        let logical = group_frames_by_position(&frames, SliceAxis::Z, 2.0);
        assert_eq!(logical, vec![vec![0]]);
    }

    #[test]
    fn test_empty_input() {
        let logical = group_frames_by_position(&[], SliceAxis::Z, 2.0);
        assert!(logical.is_empty());
    }

    #[test]
    fn test_groups_along_x_axis() {
        let frames: Vec<FramePosition> = [5.0, 1.0]
            .iter()
            .enumerate()
            .map(|(i, &x)| FramePosition {
                frame: u32::try_from(i).unwrap(),
                position: Point3::new(x, 7.0, 7.0),
            })
            .collect();
        let logical = group_frames_by_position(&frames, SliceAxis::X, 1.0);
        assert_eq!(logical, vec![vec![1], vec![0]]);
    }
}
