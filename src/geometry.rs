//! Slice geometry: image orientation and the changing-coordinate axis.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{OverlapError, OverlapResult};

/// Orientation of the image plane, as two in-plane direction-cosine vectors.
///
/// The row vector points along increasing columns, the column vector along
/// increasing rows. For a parallel-slice volume all frames share one
/// orientation.
///
/// # Example
///
/// ```
/// use seg_overlap::ImageOrientation;
///
/// // Axial orientation: rows along +X, columns along +Y
/// let orientation = ImageOrientation::from_cosines([1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
/// let normal = orientation.slice_normal();
/// assert!((normal.z - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImageOrientation {
    /// Direction cosines of the first row.
    pub row: Vector3<f64>,
    /// Direction cosines of the first column.
    pub column: Vector3<f64>,
}

impl ImageOrientation {
    /// Creates an orientation from the flat 6-value direction-cosine form
    /// (row x/y/z, then column x/y/z).
    #[must_use]
    pub fn from_cosines(cosines: [f64; 6]) -> Self {
        Self {
            row: Vector3::new(cosines[0], cosines[1], cosines[2]),
            column: Vector3::new(cosines[3], cosines[4], cosines[5]),
        }
    }

    /// Returns the slice normal (cross product of row and column vectors).
    #[must_use]
    pub fn slice_normal(&self) -> Vector3<f64> {
        self.row.cross(&self.column)
    }
}

/// A spatial axis along which slice position varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SliceAxis {
    /// The X axis.
    X,
    /// The Y axis.
    Y,
    /// The Z axis.
    Z,
}

impl SliceAxis {
    /// Returns the coordinate of `v` along this axis.
    #[must_use]
    pub fn coordinate(self, v: &nalgebra::Point3<f64>) -> f64 {
        match self {
            Self::X => v.x,
            Self::Y => v.y,
            Self::Z => v.z,
        }
    }
}

/// Identifies the axis along which slice position changes.
///
/// The slice normal is the cross product of the two in-plane orientation
/// vectors; the axis with the strictly largest absolute normal component is
/// the one slices advance along.
///
/// # Errors
///
/// Returns [`OverlapError::AmbiguousAxis`] if no single axis strictly
/// dominates (e.g. a degenerate or exactly diagonal normal), in which case
/// slice ordering cannot be determined.
///
/// # Example
///
/// ```
/// use seg_overlap::{changing_axis, ImageOrientation, SliceAxis};
///
/// let axial = ImageOrientation::from_cosines([1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
/// assert_eq!(changing_axis(&axial).unwrap(), SliceAxis::Z);
/// ```
pub fn changing_axis(orientation: &ImageOrientation) -> OverlapResult<SliceAxis> {
    let normal = orientation.slice_normal();
    let (ax, ay, az) = (normal.x.abs(), normal.y.abs(), normal.z.abs());

    if ax > ay && ax > az {
        Ok(SliceAxis::X)
    } else if ay > ax && ay > az {
        Ok(SliceAxis::Y)
    } else if az > ax && az > ay {
        Ok(SliceAxis::Z)
    } else {
        Err(OverlapError::AmbiguousAxis)
    }
}
