//! Caching behavior of the analyzer, observed through a counting source.

use std::cell::Cell;

use nalgebra::Point3;
use seg_overlap::{
    FrameGeometry, ImageOrientation, OverlapAnalyzer, SegmentationBuffer, SegmentationSource,
};

/// Wraps a volume and counts how often each accessor family is hit.
struct CountingSource {
    inner: SegmentationBuffer,
    pixel_reads: Cell<usize>,
    position_reads: Cell<usize>,
}

impl CountingSource {
    fn new(inner: SegmentationBuffer) -> Self {
        Self {
            inner,
            pixel_reads: Cell::new(0),
            position_reads: Cell::new(0),
        }
    }
}

impl SegmentationSource for CountingSource {
    fn segment_count(&self) -> u32 {
        self.inner.segment_count()
    }

    fn frame_count(&self) -> usize {
        self.inner.frame_count()
    }

    fn orientation_of(&self, frame: u32) -> Option<(ImageOrientation, bool)> {
        self.inner.orientation_of(frame)
    }

    fn position_of(&self, frame: u32) -> Option<Point3<f64>> {
        self.position_reads.set(self.position_reads.get() + 1);
        self.inner.position_of(frame)
    }

    fn slice_thickness(&self) -> Option<f64> {
        self.inner.slice_thickness()
    }

    fn referenced_segment_of(&self, frame: u32) -> Option<u32> {
        self.inner.referenced_segment_of(frame)
    }

    fn pixel_data_of(&self, frame: u32) -> Option<&[u8]> {
        self.pixel_reads.set(self.pixel_reads.get() + 1);
        self.inner.pixel_data_of(frame)
    }

    fn frame_geometry(&self) -> FrameGeometry {
        self.inner.frame_geometry()
    }
}

fn sample_volume() -> SegmentationBuffer {
    let axial = ImageOrientation::from_cosines([1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    let mut volume = SegmentationBuffer::new(2, FrameGeometry::new(8, 8), axial, 1.0);
    volume.push_frame(Point3::new(0.0, 0.0, 0.0), 1, vec![0x01; 8]);
    volume.push_frame(Point3::new(0.0, 0.0, 0.0), 2, vec![0x01; 8]);
    volume.push_frame(Point3::new(0.0, 0.0, 1.0), 1, vec![0xFF; 8]);
    volume
}

#[test]
fn second_matrix_call_reads_no_pixels() {
    let source = CountingSource::new(sample_volume());
    let mut analyzer = OverlapAnalyzer::new(&source);

    let first = analyzer.overlap_matrix().unwrap().clone();
    let reads_after_first = source.pixel_reads.get();
    assert!(reads_after_first > 0);

    let second = analyzer.overlap_matrix().unwrap().clone();
    assert_eq!(first, second);
    assert_eq!(
        source.pixel_reads.get(),
        reads_after_first,
        "cached call must not touch pixel buffers"
    );
}

#[test]
fn later_stages_reuse_earlier_caches() {
    let source = CountingSource::new(sample_volume());
    let mut analyzer = OverlapAnalyzer::new(&source);

    // Warm the position pipeline, then pull everything downstream of it.
    analyzer.logical_positions().unwrap();
    let reads_after_grouping = source.position_reads.get();

    analyzer.segments_by_position().unwrap();
    analyzer.overlap_matrix().unwrap();
    analyzer.non_overlapping_groups().unwrap();
    assert_eq!(
        source.position_reads.get(),
        reads_after_grouping,
        "downstream stages must not re-read frame positions"
    );
}

#[test]
fn reset_recomputes_from_the_source() {
    let source = CountingSource::new(sample_volume());
    let mut analyzer = OverlapAnalyzer::new(&source);

    analyzer.overlap_matrix().unwrap();
    let reads_after_first = source.pixel_reads.get();

    analyzer.reset();
    analyzer.overlap_matrix().unwrap();
    assert!(
        source.pixel_reads.get() > reads_after_first,
        "reset must force pixel buffers to be re-read"
    );
}

#[test]
fn failed_stage_leaves_earlier_stages_cached() {
    // Valid geometry but a bad segment reference: grouping succeeds, the
    // per-position index fails.
    let axial = ImageOrientation::from_cosines([1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    let mut volume = SegmentationBuffer::new(1, FrameGeometry::new(8, 8), axial, 1.0);
    volume.push_frame(Point3::new(0.0, 0.0, 0.0), 1, vec![0x01; 8]);
    volume.push_frame(Point3::new(0.0, 0.0, 1.0), 0, vec![0x01; 8]);

    let source = CountingSource::new(volume);
    let mut analyzer = OverlapAnalyzer::new(&source);

    assert!(analyzer.overlap_matrix().is_err());
    let reads_after_failure = source.position_reads.get();

    // Retrying fails again (the data is still bad) without re-reading
    // positions: the successful grouping stage stayed cached.
    assert!(analyzer.overlap_matrix().is_err());
    assert_eq!(source.position_reads.get(), reads_after_failure);
}
