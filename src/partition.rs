//! Partitioning segments into overlap-free groups.

use tracing::debug;

use crate::matrix::OverlapMatrix;

/// Greedily partitions segments `1..=N` into groups that pairwise never
/// overlap.
///
/// Segments are visited in ascending numeric order; each goes into the first
/// existing group (in creation order) containing no segment it overlaps
/// with, or into a new group appended at the end. The result is an ordered
/// list of ordered groups covering every segment exactly once.
///
/// This is a first-fit heuristic, not a minimum-cardinality coloring: the
/// visitation order is part of the observable contract, and a different
/// order could produce a different (sometimes smaller) partition.
#[must_use]
pub(crate) fn non_overlapping_groups(matrix: &OverlapMatrix) -> Vec<Vec<u32>> {
    let mut groups: Vec<Vec<u32>> = vec![Vec::new()];

    for segment in 1..=matrix.segment_count() {
        let mut placed = false;
        for group in &mut groups {
            if group.iter().all(|&member| !matrix.overlaps(segment, member)) {
                group.push(segment);
                placed = true;
                break;
            }
        }
        if !placed {
            groups.push(vec![segment]);
        }
    }

    debug!(
        segments = matrix.segment_count(),
        groups = groups.len(),
        "partitioned segments into non-overlapping groups"
    );
    groups
}
