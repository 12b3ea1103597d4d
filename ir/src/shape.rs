//! Partially known tensor shapes.
//!
//! A [`PartialShape`] either has a dynamic rank, or a known rank whose
//! dimensions are individually static or dynamic. Broadcasting is explicit:
//! operations call [`broadcast_shapes`] from their `validate_and_infer` hook.

use std::fmt;

use smallvec::SmallVec;
use snafu::ensure;

use crate::error::*;

/// Concrete shape of a static tensor (constants, fully inferred outputs).
pub type Shape = SmallVec<[usize; 4]>;

/// One dimension of a partial shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Static(usize),
    Dynamic,
}

impl Dimension {
    pub const fn is_static(&self) -> bool {
        matches!(self, Self::Static(_))
    }

    pub const fn as_static(&self) -> Option<usize> {
        match self {
            Self::Static(d) => Some(*d),
            Self::Dynamic => None,
        }
    }
}

impl From<usize> for Dimension {
    fn from(value: usize) -> Self {
        Self::Static(value)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(d) => write!(f, "{d}"),
            Self::Dynamic => write!(f, "?"),
        }
    }
}

/// Shape whose rank and dimensions may be unknown at compile time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartialShape {
    dims: Option<SmallVec<[Dimension; 4]>>,
}

impl PartialShape {
    /// Shape with unknown rank.
    pub const fn dynamic() -> Self {
        Self { dims: None }
    }

    /// Rank-0 shape.
    pub fn scalar() -> Self {
        Self { dims: Some(SmallVec::new()) }
    }

    pub fn new(dims: impl IntoIterator<Item = Dimension>) -> Self {
        Self { dims: Some(dims.into_iter().collect()) }
    }

    pub fn from_static(dims: &[usize]) -> Self {
        Self::new(dims.iter().copied().map(Dimension::Static))
    }

    pub fn rank(&self) -> Option<usize> {
        self.dims.as_ref().map(|d| d.len())
    }

    pub fn is_rank_dynamic(&self) -> bool {
        self.dims.is_none()
    }

    pub fn dims(&self) -> Option<&[Dimension]> {
        self.dims.as_deref()
    }

    pub fn is_static(&self) -> bool {
        self.dims.as_ref().is_some_and(|d| d.iter().all(Dimension::is_static))
    }

    /// Concrete shape if every dimension is known.
    pub fn to_static(&self) -> Option<Shape> {
        self.dims.as_ref()?.iter().map(Dimension::as_static).collect()
    }
}

impl From<&[usize]> for PartialShape {
    fn from(dims: &[usize]) -> Self {
        Self::from_static(dims)
    }
}

impl fmt::Display for PartialShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.dims {
            None => write!(f, "[...]"),
            Some(dims) => {
                write!(f, "[")?;
                for (i, d) in dims.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{d}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Total number of elements of a static shape (1 for scalars).
pub fn shape_size(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Prepend 1s until `shape` has `rank` dimensions.
pub fn align_left(shape: &[usize], rank: usize) -> Shape {
    let mut aligned: Shape = std::iter::repeat_n(1, rank.saturating_sub(shape.len())).collect();
    aligned.extend_from_slice(shape);
    aligned
}

/// Numpy broadcast of two partial shapes.
///
/// Dynamic rank on either side yields dynamic rank. A dynamic dimension paired
/// with 1 stays dynamic; paired with a static `d > 1` it resolves to `d`.
pub fn broadcast_shapes(lhs: &PartialShape, rhs: &PartialShape) -> Result<PartialShape> {
    let (Some(l), Some(r)) = (lhs.dims(), rhs.dims()) else {
        return Ok(PartialShape::dynamic());
    };

    let rank = l.len().max(r.len());
    let pad = |dims: &[Dimension]| -> SmallVec<[Dimension; 4]> {
        let mut out: SmallVec<[Dimension; 4]> =
            std::iter::repeat_n(Dimension::Static(1), rank - dims.len()).collect();
        out.extend_from_slice(dims);
        out
    };
    let (l, r) = (pad(l), pad(r));

    let mut out = SmallVec::<[Dimension; 4]>::with_capacity(rank);
    for (a, b) in l.iter().zip(r.iter()) {
        let dim = match (*a, *b) {
            (Dimension::Static(x), Dimension::Static(y)) => {
                ensure!(
                    x == y || x == 1 || y == 1,
                    BroadcastShapeMismatchSnafu { lhs: Box::new(lhs.clone()), rhs: Box::new(rhs.clone()) }
                );
                Dimension::Static(x.max(y))
            }
            (Dimension::Static(1), other) | (other, Dimension::Static(1)) => other,
            (Dimension::Static(x), Dimension::Dynamic) | (Dimension::Dynamic, Dimension::Static(x)) => {
                Dimension::Static(x)
            }
            (Dimension::Dynamic, Dimension::Dynamic) => Dimension::Dynamic,
        };
        out.push(dim);
    }
    Ok(PartialShape { dims: Some(out) })
}

/// Numpy broadcast of two static shapes.
pub fn broadcast_static(lhs: &[usize], rhs: &[usize]) -> Result<Shape> {
    let shape = broadcast_shapes(&PartialShape::from_static(lhs), &PartialShape::from_static(rhs))?;
    // Static inputs always broadcast to a static shape.
    Ok(shape.to_static().unwrap_or_default())
}
