//! Lazy, cached orchestration of the analysis pipeline.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::error::{OverlapError, OverlapResult};
use crate::geometry::{changing_axis, ImageOrientation};
use crate::index::{segments_by_position, SegmentFrame};
use crate::matrix::{build_overlap_matrix, OverlapMatrix};
use crate::partition::non_overlapping_groups;
use crate::position::{
    checked_frame_count, collect_frame_positions, group_frames_by_position, FramePosition,
};
use crate::source::SegmentationSource;

/// Analyzes a segmentation volume for pairwise segment overlap.
///
/// Results flow through a fixed dependency chain — orientation, frame
/// positions, logical positions, per-position segment index, overlap matrix,
/// non-overlap partition — and every stage is computed at most once per
/// source and cached. [`reset`](Self::reset) drops all caches atomically;
/// there is no partial invalidation. A failing stage stores nothing, so it
/// is retried on the next access, while earlier successful stages stay
/// cached.
///
/// The analyzer is single-threaded state: accessors take `&mut self`, and an
/// instance must not be shared across threads without external
/// serialization.
///
/// # Example
///
/// ```
/// use nalgebra::Point3;
/// use seg_overlap::{
///     FrameGeometry, ImageOrientation, OverlapAnalyzer, SegmentationBuffer,
/// };
///
/// let axial = ImageOrientation::from_cosines([1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
/// let mut volume = SegmentationBuffer::new(2, FrameGeometry::new(8, 8), axial, 1.0);
/// // Two segments on the same slice, sharing a set pixel.
/// volume.push_frame(Point3::new(0.0, 0.0, 0.0), 1, vec![0x01; 8]);
/// volume.push_frame(Point3::new(0.0, 0.0, 0.0), 2, vec![0x01; 8]);
///
/// let mut analyzer = OverlapAnalyzer::new(&volume);
/// let matrix = analyzer.overlap_matrix().unwrap();
/// assert!(matrix.overlaps(1, 2));
///
/// let groups = analyzer.non_overlapping_groups().unwrap();
/// assert_eq!(groups, &[vec![1], vec![2]]);
/// ```
#[derive(Debug)]
pub struct OverlapAnalyzer<'a, S: SegmentationSource> {
    source: &'a S,
    caches: Caches,
}

/// Memoized pipeline artifacts. A `None` slot means "not computed yet";
/// legitimately empty results stay distinguishable from absent ones.
#[derive(Debug, Default)]
struct Caches {
    orientation: Option<ImageOrientation>,
    frame_positions: Option<Vec<FramePosition>>,
    logical_positions: Option<Vec<Vec<u32>>>,
    frames_for_segment: Option<Vec<Vec<u32>>>,
    segments_by_position: Option<Vec<BTreeSet<SegmentFrame>>>,
    overlap_matrix: Option<OverlapMatrix>,
    groups: Option<Vec<Vec<u32>>>,
}

impl<'a, S: SegmentationSource> OverlapAnalyzer<'a, S> {
    /// Creates an analyzer over a segmentation source.
    #[must_use]
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            caches: Caches::default(),
        }
    }

    /// Drops every cached artifact at once.
    ///
    /// Call this when the underlying source data has changed; the next
    /// accessor recomputes from scratch.
    pub fn reset(&mut self) {
        self.caches = Caches::default();
    }

    /// The shared image orientation of the volume, validated for parallel
    /// frames.
    ///
    /// # Errors
    ///
    /// [`OverlapError::FramesNotParallel`] if orientation is stored per
    /// frame, [`OverlapError::OrientationMissing`] if it is absent.
    pub fn orientation(&mut self) -> OverlapResult<ImageOrientation> {
        self.ensure_orientation()?;
        self.caches
            .orientation
            .ok_or(OverlapError::OrientationMissing)
    }

    /// Frames grouped into logical slice positions, ascending along the
    /// changing axis; every frame appears in exactly one group.
    ///
    /// # Errors
    ///
    /// Geometry and metadata errors from orientation validation, axis
    /// selection, position collection, or a missing slice thickness.
    pub fn logical_positions(&mut self) -> OverlapResult<&[Vec<u32>]> {
        self.ensure_logical_positions()?;
        Ok(self.caches.logical_positions.as_deref().unwrap_or(&[]))
    }

    /// Physical frames belonging to a segment, in frame order.
    ///
    /// Independent of the position pipeline: computed from a single scan of
    /// all frames' segment references.
    ///
    /// # Errors
    ///
    /// [`OverlapError::SegmentNumberOutOfRange`] for a `segment` argument of
    /// 0 or above the declared count, [`OverlapError::SegmentNumberZero`] /
    /// [`OverlapError::SegmentNumberOutOfRange`] for an invalid reference
    /// encountered during the scan, [`OverlapError::SegmentReferenceMissing`]
    /// for a frame without a reference, and
    /// [`OverlapError::FrameCountExceeded`] for oversized volumes.
    pub fn frames_of_segment(&mut self, segment: u32) -> OverlapResult<&[u32]> {
        let segment_count = self.source.segment_count();
        if segment == 0 || segment > segment_count {
            return Err(OverlapError::SegmentNumberOutOfRange {
                number: segment,
                segment_count,
            });
        }
        self.ensure_frames_for_segment()?;
        let per_segment = self.caches.frames_for_segment.as_deref().unwrap_or(&[]);
        Ok(per_segment
            .get(segment as usize - 1)
            .map_or(&[], Vec::as_slice))
    }

    /// Per logical position, the ordered set of (segment, frame) entries
    /// present there.
    ///
    /// # Errors
    ///
    /// Everything [`logical_positions`](Self::logical_positions) can fail
    /// with, plus validation errors for the per-frame segment references.
    pub fn segments_by_position(&mut self) -> OverlapResult<&[BTreeSet<SegmentFrame>]> {
        self.ensure_segments_by_position()?;
        Ok(self.caches.segments_by_position.as_deref().unwrap_or(&[]))
    }

    /// The completed symmetric overlap matrix over all segment pairs.
    ///
    /// # Errors
    ///
    /// Everything [`segments_by_position`](Self::segments_by_position) can
    /// fail with, plus comparison errors for missing or mismatched pixel
    /// buffers.
    pub fn overlap_matrix(&mut self) -> OverlapResult<&OverlapMatrix> {
        self.ensure_overlap_matrix()?;
        let segment_count = self.source.segment_count();
        // The slot is always filled once ensure succeeds.
        Ok(self
            .caches
            .overlap_matrix
            .get_or_insert_with(|| OverlapMatrix::new(segment_count)))
    }

    /// Segments partitioned into overlap-free groups by the first-fit scan.
    ///
    /// # Errors
    ///
    /// Everything [`overlap_matrix`](Self::overlap_matrix) can fail with.
    pub fn non_overlapping_groups(&mut self) -> OverlapResult<&[Vec<u32>]> {
        self.ensure_groups()?;
        Ok(self.caches.groups.as_deref().unwrap_or(&[]))
    }

    fn ensure_orientation(&mut self) -> OverlapResult<()> {
        if self.caches.orientation.is_some() {
            return Ok(());
        }
        let (orientation, per_frame) = self
            .source
            .orientation_of(0)
            .ok_or(OverlapError::OrientationMissing)?;
        if per_frame {
            return Err(OverlapError::FramesNotParallel);
        }
        debug!(
            row = ?orientation.row,
            column = ?orientation.column,
            "image orientation is shared, frames are parallel"
        );
        self.caches.orientation = Some(orientation);
        Ok(())
    }

    fn ensure_frame_positions(&mut self) -> OverlapResult<()> {
        if self.caches.frame_positions.is_some() {
            return Ok(());
        }
        let positions = collect_frame_positions(self.source)?;
        self.caches.frame_positions = Some(positions);
        Ok(())
    }

    fn ensure_logical_positions(&mut self) -> OverlapResult<()> {
        if self.caches.logical_positions.is_some() {
            return Ok(());
        }
        self.ensure_orientation()?;
        self.ensure_frame_positions()?;

        let orientation = self
            .caches
            .orientation
            .ok_or(OverlapError::OrientationMissing)?;
        let axis = changing_axis(&orientation)?;
        let thickness = self
            .source
            .slice_thickness()
            .ok_or(OverlapError::SliceThicknessMissing)?;
        debug!(?axis, thickness, "grouping frames along changing axis");

        let frame_positions = self.caches.frame_positions.as_deref().unwrap_or(&[]);
        let logical = group_frames_by_position(frame_positions, axis, thickness);
        self.caches.logical_positions = Some(logical);
        Ok(())
    }

    fn ensure_frames_for_segment(&mut self) -> OverlapResult<()> {
        if self.caches.frames_for_segment.is_some() {
            return Ok(());
        }
        let segment_count = self.source.segment_count();
        let frame_count = checked_frame_count(self.source)?;
        let mut per_segment: Vec<Vec<u32>> = vec![Vec::new(); segment_count as usize];
        for frame in 0..frame_count {
            let segment = self
                .source
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
            per_segment[segment as usize - 1].push(frame);
        }
        self.caches.frames_for_segment = Some(per_segment);
        Ok(())
    }

    fn ensure_segments_by_position(&mut self) -> OverlapResult<()> {
        if self.caches.segments_by_position.is_some() {
            return Ok(());
        }
        self.ensure_logical_positions()?;
        let logical = self.caches.logical_positions.as_deref().unwrap_or(&[]);
        let index = segments_by_position(self.source, logical)?;
        self.caches.segments_by_position = Some(index);
        Ok(())
    }

    fn ensure_overlap_matrix(&mut self) -> OverlapResult<()> {
        if self.caches.overlap_matrix.is_some() {
            return Ok(());
        }
        self.ensure_segments_by_position()?;
        let index = self.caches.segments_by_position.as_deref().unwrap_or(&[]);
        let matrix = build_overlap_matrix(self.source, index)?;
        info!(
            segments = matrix.segment_count(),
            positions = index.len(),
            "built segment overlap matrix"
        );
        debug!("overlap matrix:\n{matrix}");
        self.caches.overlap_matrix = Some(matrix);
        Ok(())
    }

    fn ensure_groups(&mut self) -> OverlapResult<()> {
        if self.caches.groups.is_some() {
            return Ok(());
        }
        self.ensure_overlap_matrix()?;
        let groups = self
            .caches
            .overlap_matrix
            .as_ref()
            .map(non_overlapping_groups)
            .unwrap_or_default();
        self.caches.groups = Some(groups);
        Ok(())
    }
}
