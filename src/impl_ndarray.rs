use crate::{npy::Element, tensor::Tensor};
use ndarray::{prelude::*, Data, ShapeError};

impl<T: Element> Tensor<T> {
    /// Copies an `ndarray` array of any layout into a tensor.
    ///
    /// Arrays in column-major layout produce a tensor that is written to files
    /// in Fortran order.
    pub fn from_ndarray<S, D>(array: &ArrayBase<S, D>) -> Self
    where
        S: Data<Elem = T>,
        D: Dimension,
    {
        let fortran_order = !array.is_standard_layout()
            && array.ndim() > 1
            && array.view().reversed_axes().is_standard_layout();
        let values = match array.as_slice() {
            Some(slice) => slice.to_vec(),
            None => array.iter().cloned().collect(),
        };
        Self::from_parts(array.shape().into(), values, fortran_order)
    }

    /// Moves the elements into an owned `ndarray` array of dimensionality `D`.
    ///
    /// Fails if the rank does not match `D`; use [`IxDyn`] to accept any rank.
    pub fn into_ndarray<D: Dimension>(self) -> Result<Array<T, D>, ShapeError> {
        let shape = IxDyn(self.shape());
        ArrayD::from_shape_vec(shape, self.into_values())?.into_dimensionality()
    }
}

impl<T: Element, S: Data<Elem = T>, D: Dimension> From<&ArrayBase<S, D>> for Tensor<T> {
    fn from(array: &ArrayBase<S, D>) -> Self {
        Self::from_ndarray(array)
    }
}
