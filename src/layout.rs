//! Row-major addressing and conversion to and from column-major element
//! order.

use crate::tensor::TensorError;

/// Number of elements described by `shape`, or `None` on overflow.
pub(crate) fn size_checked(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

/// Row-major strides (in elements) for `shape`.
pub(crate) fn standard_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}

/// Converts a multi-index into an offset into a row-major buffer.
pub(crate) fn ravel(shape: &[usize], index: &[usize]) -> Result<usize, TensorError> {
    if index.len() != shape.len() {
        return Err(TensorError::WrongArity {
            expected: shape.len(),
            found: index.len(),
        });
    }
    if let Some((axis, (&i, &len))) =
        index.iter().zip(shape).enumerate().find(|&(_, (&i, &len))| i >= len)
    {
        return Err(TensorError::OutOfBounds { axis, index: i, len });
    }
    // Every dimension is non-zero here, so no partial product exceeds the
    // element count.
    Ok(index.iter().zip(shape).fold(0, |offset, (&i, &len)| offset * len + i))
}

/// Yields, in column-major traversal order, the row-major offset of each
/// element.
struct FortranOffsets<'a> {
    shape: &'a [usize],
    strides: Vec<usize>,
    index: Vec<usize>,
    offset: usize,
    remaining: usize,
}

impl<'a> FortranOffsets<'a> {
    fn new(shape: &'a [usize], len: usize) -> Self {
        Self {
            shape,
            strides: standard_strides(shape),
            index: vec![0; shape.len()],
            offset: 0,
            remaining: len,
        }
    }
}

impl Iterator for FortranOffsets<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.offset;
        // First axis varies fastest.
        for axis in 0..self.shape.len() {
            self.index[axis] += 1;
            self.offset += self.strides[axis];
            if self.index[axis] < self.shape[axis] {
                break;
            }
            self.offset -= self.strides[axis] * self.index[axis];
            self.index[axis] = 0;
        }
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Rearranges elements stored in column-major order into row-major order.
pub(crate) fn fortran_to_standard<T: Default + Clone>(data: Vec<T>, shape: &[usize]) -> Vec<T> {
    if data.is_empty() {
        return data;
    }
    let mut out = vec![T::default(); data.len()];
    let len = data.len();
    for (value, offset) in data.into_iter().zip(FortranOffsets::new(shape, len)) {
        out[offset] = value;
    }
    out
}

/// Copies row-major `data` into column-major order.
pub(crate) fn standard_to_fortran<T: Clone>(data: &[T], shape: &[usize]) -> Vec<T> {
    if data.is_empty() {
        return Vec::new();
    }
    FortranOffsets::new(shape, data.len())
        .map(|offset| data[offset].clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strides() {
        assert_eq!(standard_strides(&[]), Vec::<usize>::new());
        assert_eq!(standard_strides(&[4]), vec![1]);
        assert_eq!(standard_strides(&[3, 4, 5]), vec![20, 5, 1]);
    }

    #[test]
    fn ravel_checks_arity_then_bounds() {
        let shape = [5, 2, 5];
        assert_eq!(ravel(&shape, &[0, 0, 0]).unwrap(), 0);
        assert_eq!(ravel(&shape, &[4, 1, 4]).unwrap(), 49);
        assert_eq!(ravel(&shape, &[1, 1, 2]).unwrap(), 17);
        assert!(matches!(
            ravel(&shape, &[0, 0]),
            Err(TensorError::WrongArity { expected: 3, found: 2 })
        ));
        assert!(matches!(
            ravel(&shape, &[2, 3, 3]),
            Err(TensorError::OutOfBounds { axis: 1, index: 3, len: 2 })
        ));
        assert_eq!(ravel(&[], &[]).unwrap(), 0);
    }

    #[test]
    fn fortran_order_matches_column_major() {
        // 2x3 row-major: [[0, 1, 2], [3, 4, 5]]
        let standard: Vec<u8> = (0..6).collect();
        let fortran = standard_to_fortran(&standard, &[2, 3]);
        assert_eq!(fortran, vec![0, 3, 1, 4, 2, 5]);
        assert_eq!(fortran_to_standard(fortran, &[2, 3]), standard);
    }

    #[test]
    fn fortran_reordering_inverts_in_three_dimensions() {
        let shape = [3, 4, 5];
        let standard: Vec<u32> = (0..60).collect();
        let fortran = standard_to_fortran(&standard, &shape);
        // Element (i, j, k) lives at i + 3j + 12k in column-major order.
        assert_eq!(fortran[1 + 3 * 2 + 12 * 3], standard[20 + 2 * 5 + 3]);
        assert_eq!(fortran_to_standard(fortran, &shape), standard);
    }

    #[test]
    fn degenerate_shapes() {
        assert_eq!(standard_to_fortran(&[7], &[]), vec![7]);
        assert_eq!(standard_to_fortran::<u8>(&[], &[3, 0]), Vec::<u8>::new());
        assert_eq!(size_checked(&[]), Some(1));
        assert_eq!(size_checked(&[3, 0, 2]), Some(0));
        assert_eq!(size_checked(&[usize::MAX, 2]), None);
    }

    #[test]
    fn empty_shape_with_huge_dimensions() {
        let shape = [0, usize::MAX, usize::MAX];
        assert!(matches!(
            ravel(&shape, &[0, 0, 0]),
            Err(TensorError::OutOfBounds { axis: 0, index: 0, len: 0 })
        ));
        assert!(matches!(
            ravel(&[3, usize::MAX, 0], &[1, 5, 0]),
            Err(TensorError::OutOfBounds { axis: 2, index: 0, len: 0 })
        ));
        assert_eq!(standard_to_fortran::<u8>(&[], &shape), Vec::<u8>::new());
        assert_eq!(fortran_to_standard::<u8>(Vec::new(), &shape), Vec::<u8>::new());
    }
}
