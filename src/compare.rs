//! Pixel-level comparison of two binary frame masks.
//!
//! Two strategies implement the same question — do these masks share a set
//! pixel? — selected by a pure predicate on the frame geometry:
//!
//! - [`packed_masks_overlap`]: when the mask fills whole bytes
//!   ([`FrameGeometry::is_byte_aligned`]), a byte-wise bitwise AND over the
//!   packed buffers, eight pixels at a time.
//! - [`unpacked_masks_overlap`]: otherwise, both buffers are unpacked to one
//!   byte per pixel and compared position by position.
//!
//! Both short-circuit on the first shared pixel.

use tracing::debug;

use crate::error::{OverlapError, OverlapResult};
use crate::source::{FrameGeometry, SegmentationSource};

/// Checks whether two frames of a volume share any set pixel.
///
/// Comparing a frame with itself is "no overlap" by definition: a segment
/// never overlaps itself through reuse of the identical frame.
///
/// # Errors
///
/// - [`OverlapError::BufferUnavailable`] if either frame's pixel buffer
///   cannot be obtained.
/// - [`OverlapError::BufferLengthMismatch`] if the buffers disagree in
///   length (fast path) or are shorter than the declared geometry requires
///   (slow path).
pub(crate) fn frames_overlap<S: SegmentationSource>(
    source: &S,
    frame_a: u32,
    frame_b: u32,
) -> OverlapResult<bool> {
    if frame_a == frame_b {
        return Ok(false);
    }
    let geometry = source.frame_geometry();
    let data_a = source
        .pixel_data_of(frame_a)
        .ok_or(OverlapError::BufferUnavailable { frame: frame_a })?;
    let data_b = source
        .pixel_data_of(frame_b)
        .ok_or(OverlapError::BufferUnavailable { frame: frame_b })?;

    let overlap = if geometry.is_byte_aligned() {
        debug!(frame_a, frame_b, "comparing frames (packed byte mode)");
        if data_a.len() != data_b.len() {
            return Err(OverlapError::BufferLengthMismatch {
                frame_a,
                frame_b,
                len_a: data_a.len(),
                len_b: data_b.len(),
            });
        }
        packed_masks_overlap(data_a, data_b)
    } else {
        debug!(frame_a, frame_b, "comparing frames (unpacked pixel mode)");
        let required = geometry.packed_len();
        if data_a.len() < required || data_b.len() < required {
            return Err(OverlapError::BufferLengthMismatch {
                frame_a,
                frame_b,
                len_a: data_a.len(),
                len_b: data_b.len(),
            });
        }
        unpacked_masks_overlap(data_a, data_b, geometry)
    };
    Ok(overlap)
}

/// Byte-wise overlap test over two packed one-bit masks of equal length.
///
/// Any nonzero byte of `a & b` means the masks share a set pixel.
#[must_use]
pub fn packed_masks_overlap(a: &[u8], b: &[u8]) -> bool {
    a.iter().zip(b).any(|(&byte_a, &byte_b)| byte_a & byte_b != 0)
}

/// Per-pixel overlap test for masks whose geometry is not byte aligned.
///
/// Both buffers are unpacked to one byte per pixel; the masks overlap when
/// some pixel is simultaneously nonzero and equal in both.
#[must_use]
pub fn unpacked_masks_overlap(a: &[u8], b: &[u8], geometry: FrameGeometry) -> bool {
    let unpacked_a = unpack_bits(a, geometry.pixel_count());
    let unpacked_b = unpack_bits(b, geometry.pixel_count());
    unpacked_a
        .iter()
        .zip(&unpacked_b)
        .any(|(&pixel_a, &pixel_b)| pixel_a != 0 && pixel_a == pixel_b)
}

/// Unpacks a one-bit-per-pixel buffer to one byte per pixel.
///
/// Bits are row-major, LSB-first within each byte: bit `k` of byte `n` is
/// pixel `8n + k`.
#[must_use]
pub fn unpack_bits(packed: &[u8], pixel_count: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(pixel_count as usize);
    for index in 0..pixel_count as usize {
        let byte = packed.get(index / 8).copied().unwrap_or(0);
        pixels.push((byte >> (index % 8)) & 1);
    }
    pixels
}
