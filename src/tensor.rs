use crate::{
    dtype::{DataType, Endian},
    layout,
    npy::{self, Element, HeaderInfo, ReadNpyError, WriteNpyError},
    ErrorKind,
};
use std::{fmt, io, ops::Deref, path::Path};
use thiserror::Error;

/// Dimensions of a tensor. A shape of rank zero describes a scalar.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Creates a shape from its dimension sizes.
    pub fn new(dims: Vec<usize>) -> Self {
        Self(dims)
    }

    /// Dimension sizes, outermost first.
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// Number of dimensions.
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Number of elements, or `None` if it overflows `usize`.
    pub fn size(&self) -> Option<usize> {
        layout::size_checked(&self.0)
    }
}

impl Deref for Shape {
    type Target = [usize];

    fn deref(&self) -> &[usize] {
        &self.0
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self(dims.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Self(dims.to_vec())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// An error constructing, indexing or filling a tensor.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TensorError {
    /// The number of coordinates does not match the rank.
    #[error("wrong index arity: expected {expected} coordinates, found {found}")]
    WrongArity {
        /// Rank of the tensor.
        expected: usize,
        /// Number of coordinates supplied.
        found: usize,
    },
    /// A coordinate is not smaller than its dimension.
    #[error("index {index} is out of bounds for axis {axis} with size {len}")]
    OutOfBounds {
        /// Axis of the offending coordinate.
        axis: usize,
        /// The offending coordinate.
        index: usize,
        /// Size of that axis.
        len: usize,
    },
    /// A buffer does not hold the number of elements the tensor needs.
    #[error("expected {expected} elements, found {found}")]
    LengthMismatch {
        /// Number of elements required.
        expected: usize,
        /// Number of elements supplied.
        found: usize,
    },
    /// The number of elements described by the shape overflows `usize`.
    #[error("overflow computing length from shape")]
    LengthOverflow,
}

impl TensorError {
    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OutOfBounds { .. } => ErrorKind::OutOfBounds,
            _ => ErrorKind::Validation,
        }
    }
}

/// A dense, fixed-shape array of one element type.
///
/// Elements are addressed in row-major order regardless of
/// [`fortran_order`](Tensor::fortran_order), which only decides the order in
/// which elements are written to `.npy` files.
///
/// # Example
///
/// ```
/// use npy_archive::{Endian, Tensor};
///
/// let mut tensor = Tensor::<u8>::zeros([5, 2, 5]);
/// tensor.set(&[4, 1, 0], 7)?;
/// let bytes = tensor.to_npy_bytes(Endian::Little)?;
/// let back = Tensor::<u8>::read_npy(&bytes[..])?;
/// assert_eq!(back.get(&[4, 1, 0])?, &7);
/// assert_eq!(back, tensor);
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor<T> {
    shape: Shape,
    fortran_order: bool,
    values: Vec<T>,
}

impl<T: Element> Tensor<T> {
    /// Creates a row-major tensor filled with `T::default()` (zero, or the
    /// empty string).
    ///
    /// # Panics
    ///
    /// Panics if the number of elements overflows `usize`.
    pub fn zeros<S: Into<Shape>>(shape: S) -> Self {
        let shape = shape.into();
        let len = shape.size().expect("overflow computing number of elements");
        Self { shape, fortran_order: false, values: vec![T::default(); len] }
    }

    /// Creates a row-major tensor from `values` laid out in row-major order.
    pub fn from_vec<S: Into<Shape>>(shape: S, values: Vec<T>) -> Result<Self, TensorError> {
        let shape = shape.into();
        let expected = shape.size().ok_or(TensorError::LengthOverflow)?;
        if values.len() != expected {
            return Err(TensorError::LengthMismatch { expected, found: values.len() });
        }
        Ok(Self { shape, fortran_order: false, values })
    }

    pub(crate) fn from_parts(shape: Shape, values: Vec<T>, fortran_order: bool) -> Self {
        debug_assert_eq!(shape.size(), Some(values.len()));
        Self { shape, fortran_order, values }
    }

    /// Sets whether this tensor is written to files in column-major order.
    #[must_use]
    pub fn with_fortran_order(mut self, fortran_order: bool) -> Self {
        self.fortran_order = fortran_order;
        self
    }

    /// Reads the `.npy` file at `path`.
    ///
    /// Fails with [`ReadNpyError::WrongDataType`] if the file does not hold
    /// elements of type `T`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReadNpyError> {
        npy::load(path.as_ref())
    }

    /// Decodes a tensor from an `.npy` stream. The stream must end right
    /// after the data.
    pub fn read_npy<R: io::Read>(mut reader: R) -> Result<Self, ReadNpyError> {
        let header = npy::read_header(&mut reader)?;
        npy::read_body(header, reader)
    }

    /// Writes this tensor to an `.npy` file at `path` in the byte order
    /// `endian`.
    pub fn save<P: AsRef<Path>>(&self, path: P, endian: Endian) -> Result<(), WriteNpyError> {
        npy::write_npy(path, self, endian)
    }

    /// Encodes this tensor into `writer` in `.npy` format.
    ///
    /// Calls [`io::Write::flush`] on the writer before returning.
    pub fn write_npy<W: io::Write>(&self, writer: W, endian: Endian) -> Result<(), WriteNpyError> {
        npy::write_tensor(self, writer, endian)
    }

    /// Encodes this tensor in `.npy` format into a new buffer.
    pub fn to_npy_bytes(&self, endian: Endian) -> Result<Vec<u8>, WriteNpyError> {
        let mut out = Vec::new();
        self.write_npy(&mut out, endian)?;
        Ok(out)
    }

    /// The element at `index`.
    pub fn get(&self, index: &[usize]) -> Result<&T, TensorError> {
        let offset = layout::ravel(&self.shape, index)?;
        Ok(&self.values[offset])
    }

    /// Mutable access to the element at `index`.
    pub fn get_mut(&mut self, index: &[usize]) -> Result<&mut T, TensorError> {
        let offset = layout::ravel(&self.shape, index)?;
        Ok(&mut self.values[offset])
    }

    /// Replaces the element at `index`.
    pub fn set(&mut self, index: &[usize], value: T) -> Result<(), TensorError> {
        *self.get_mut(index)? = value;
        Ok(())
    }

    /// Copies `count` elements from `source` into this tensor, in row-major
    /// order.
    ///
    /// `count` must equal [`len`](Tensor::len) and `source` must hold at least
    /// `count` elements.
    pub fn copy_from(&mut self, source: &[T], count: usize) -> Result<(), TensorError> {
        if count != self.values.len() {
            return Err(TensorError::LengthMismatch { expected: self.values.len(), found: count });
        }
        let source = source
            .get(..count)
            .ok_or(TensorError::LengthMismatch { expected: count, found: source.len() })?;
        self.values.clone_from_slice(source);
        Ok(())
    }

    /// Replaces the buffer with `values`, which must have exactly
    /// [`len`](Tensor::len) elements.
    pub fn move_from(&mut self, values: Vec<T>) -> Result<(), TensorError> {
        if values.len() != self.values.len() {
            return Err(TensorError::LengthMismatch {
                expected: self.values.len(),
                found: values.len(),
            });
        }
        self.values = values;
        Ok(())
    }

    /// The element type tag.
    pub fn data_type(&self) -> DataType {
        T::DATA_TYPE
    }

    /// The header this tensor would be written with in the byte order
    /// `endian`.
    pub fn header_info(&self, endian: Endian) -> HeaderInfo {
        let descr = T::type_descriptor(&self.values, endian.resolve());
        HeaderInfo {
            data_type: T::DATA_TYPE,
            endian: descr.endian().resolve(),
            fortran_order: self.fortran_order,
            shape: self.shape.clone(),
        }
    }
}

impl<T> Tensor<T> {
    /// Dimension sizes.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the tensor has no elements.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether files are written in column-major order.
    pub fn fortran_order(&self) -> bool {
        self.fortran_order
    }

    /// The elements in row-major order.
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// The elements in row-major order.
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Consumes the tensor, returning its row-major elements.
    pub fn into_values(self) -> Vec<T> {
        self.values
    }
}

/// A tensor whose element type is known only at run time.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum DynTensor {
    /// `u8` elements.
    UInt8(Tensor<u8>),
    /// `i8` elements.
    Int8(Tensor<i8>),
    /// `u16` elements.
    UInt16(Tensor<u16>),
    /// `i16` elements.
    Int16(Tensor<i16>),
    /// `u32` elements.
    UInt32(Tensor<u32>),
    /// `i32` elements.
    Int32(Tensor<i32>),
    /// `u64` elements.
    UInt64(Tensor<u64>),
    /// `i64` elements.
    Int64(Tensor<i64>),
    /// `f32` elements.
    Float32(Tensor<f32>),
    /// `f64` elements.
    Float64(Tensor<f64>),
    /// String elements.
    UnicodeString(Tensor<String>),
}

macro_rules! dispatch {
    ($value:expr, $tensor:ident => $body:expr) => {
        match $value {
            DynTensor::UInt8($tensor) => $body,
            DynTensor::Int8($tensor) => $body,
            DynTensor::UInt16($tensor) => $body,
            DynTensor::Int16($tensor) => $body,
            DynTensor::UInt32($tensor) => $body,
            DynTensor::Int32($tensor) => $body,
            DynTensor::UInt64($tensor) => $body,
            DynTensor::Int64($tensor) => $body,
            DynTensor::Float32($tensor) => $body,
            DynTensor::Float64($tensor) => $body,
            DynTensor::UnicodeString($tensor) => $body,
        }
    };
}

impl DynTensor {
    /// Decodes an `.npy` stream, choosing the element type from its header.
    pub fn read_npy<R: io::Read>(mut reader: R) -> Result<Self, ReadNpyError> {
        let header = npy::read_header(&mut reader)?;
        Ok(match header.descr.data_type() {
            DataType::UInt8 => Self::UInt8(npy::read_body(header, reader)?),
            DataType::Int8 => Self::Int8(npy::read_body(header, reader)?),
            DataType::UInt16 => Self::UInt16(npy::read_body(header, reader)?),
            DataType::Int16 => Self::Int16(npy::read_body(header, reader)?),
            DataType::UInt32 => Self::UInt32(npy::read_body(header, reader)?),
            DataType::Int32 => Self::Int32(npy::read_body(header, reader)?),
            DataType::UInt64 => Self::UInt64(npy::read_body(header, reader)?),
            DataType::Int64 => Self::Int64(npy::read_body(header, reader)?),
            DataType::Float32 => Self::Float32(npy::read_body(header, reader)?),
            DataType::Float64 => Self::Float64(npy::read_body(header, reader)?),
            DataType::UnicodeString => Self::UnicodeString(npy::read_body(header, reader)?),
        })
    }

    /// Reads the `.npy` file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReadNpyError> {
        let file = crate::path::open_file(path.as_ref())?;
        Self::read_npy(io::BufReader::new(file))
    }

    /// Encodes the tensor into `writer` in `.npy` format.
    pub fn write_npy<W: io::Write>(&self, writer: W, endian: Endian) -> Result<(), WriteNpyError> {
        dispatch!(self, t => t.write_npy(writer, endian))
    }

    /// Writes the tensor to an `.npy` file at `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P, endian: Endian) -> Result<(), WriteNpyError> {
        dispatch!(self, t => t.save(path, endian))
    }

    /// The element type tag.
    pub fn data_type(&self) -> DataType {
        dispatch!(self, t => t.data_type())
    }

    /// Dimension sizes.
    pub fn shape(&self) -> &Shape {
        dispatch!(self, t => t.shape())
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        dispatch!(self, t => t.len())
    }

    /// Whether the tensor has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether files are written in column-major order.
    pub fn fortran_order(&self) -> bool {
        dispatch!(self, t => t.fortran_order())
    }
}

macro_rules! impl_dyn_conversions {
    ($($elem:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Tensor<$elem>> for DynTensor {
                fn from(tensor: Tensor<$elem>) -> Self {
                    Self::$variant(tensor)
                }
            }

            impl TryFrom<DynTensor> for Tensor<$elem> {
                type Error = DynTensor;

                /// Returns the original value if it holds a different element
                /// type.
                fn try_from(value: DynTensor) -> Result<Self, DynTensor> {
                    match value {
                        DynTensor::$variant(tensor) => Ok(tensor),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

impl_dyn_conversions! {
    u8 => UInt8,
    i8 => Int8,
    u16 => UInt16,
    i16 => Int16,
    u32 => UInt32,
    i32 => Int32,
    u64 => UInt64,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
    String => UnicodeString,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting(shape: &[usize]) -> Tensor<u8> {
        let len = layout::size_checked(shape).unwrap();
        Tensor::from_vec(shape, (0..len).map(|i| i as u8).collect()).unwrap()
    }

    #[test]
    fn zeros_allocates_product_of_shape() {
        let tensor = Tensor::<f32>::zeros([5, 2, 5]);
        assert_eq!(tensor.len(), 50);
        assert!(tensor.values().iter().all(|&v| v == 0.0));
        assert_eq!(tensor.data_type(), DataType::Float32);
        let scalar = Tensor::<i64>::zeros(Shape::default());
        assert_eq!(scalar.len(), 1);
        assert_eq!(scalar.get(&[]), Ok(&0));
        let strings = Tensor::<String>::zeros([2]);
        assert_eq!(strings.values(), &[String::new(), String::new()]);
    }

    #[test]
    fn from_vec_checks_length() {
        assert_eq!(
            Tensor::from_vec([2, 3], vec![0u8; 5]),
            Err(TensorError::LengthMismatch { expected: 6, found: 5 })
        );
    }

    #[test]
    fn indexing_is_row_major() {
        let mut tensor = counting(&[3, 4]);
        assert_eq!(tensor.get(&[1, 2]), Ok(&6));
        tensor.set(&[2, 3], 100).unwrap();
        assert_eq!(tensor.values()[11], 100);
        // Fortran order does not change addressing.
        let tensor = tensor.with_fortran_order(true);
        assert_eq!(tensor.get(&[1, 2]), Ok(&6));
    }

    #[test]
    fn index_arity_and_bounds_are_distinct() {
        let mut tensor = Tensor::<u8>::zeros([5, 2, 5]);
        let arity = tensor.get(&[0, 0]).unwrap_err();
        assert_eq!(arity, TensorError::WrongArity { expected: 3, found: 2 });
        assert_eq!(arity.kind(), ErrorKind::Validation);
        let bounds = tensor.set(&[2, 3, 3], 1).unwrap_err();
        assert_eq!(bounds, TensorError::OutOfBounds { axis: 1, index: 3, len: 2 });
        assert_eq!(bounds.kind(), ErrorKind::OutOfBounds);
    }

    #[test]
    fn empty_tensor_with_huge_dimensions() {
        let tensor = Tensor::<u8>::zeros([0, usize::MAX, usize::MAX]);
        assert!(tensor.is_empty());
        assert_eq!(
            tensor.get(&[0, 0, 0]),
            Err(TensorError::OutOfBounds { axis: 0, index: 0, len: 0 })
        );
        let tensor = tensor.with_fortran_order(true);
        let bytes = tensor.to_npy_bytes(Endian::Little).unwrap();
        let back = Tensor::<u8>::read_npy(&bytes[..]).unwrap();
        assert_eq!(back.shape().dims(), &[0, usize::MAX, usize::MAX]);
        assert!(back.fortran_order());
    }

    #[test]
    fn copy_from_requires_exact_count() {
        let mut tensor = Tensor::<u8>::zeros([5, 2, 5]);
        let buffer = [1u8; 10];
        let err = tensor.copy_from(&buffer, buffer.len()).unwrap_err();
        assert_eq!(err, TensorError::LengthMismatch { expected: 50, found: 10 });
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(
            tensor.copy_from(&buffer, 50),
            Err(TensorError::LengthMismatch { expected: 50, found: 10 })
        );
        let full: Vec<u8> = (0..60).collect();
        tensor.copy_from(&full, 50).unwrap();
        assert_eq!(tensor.values(), &full[..50]);
        assert!(tensor.copy_from(&[], 0).is_err());
    }

    #[test]
    fn move_from_requires_exact_length() {
        let mut tensor = Tensor::<i16>::zeros([2, 2]);
        assert!(tensor.move_from(vec![1, 2, 3]).is_err());
        tensor.move_from(vec![1, 2, 3, 4]).unwrap();
        assert_eq!(tensor.get(&[1, 0]), Ok(&3));
    }

    #[test]
    fn fortran_tensor_round_trips_through_npy() {
        let tensor = counting(&[3, 4, 5]).with_fortran_order(true);
        let bytes = tensor.to_npy_bytes(Endian::Native).unwrap();
        let back = Tensor::<u8>::read_npy(&bytes[..]).unwrap();
        assert!(back.fortran_order());
        assert_eq!(back, tensor);
    }

    #[test]
    fn dyn_tensor_dispatches_on_header() {
        let tensor = Tensor::from_vec([2], vec![1.5f64, -2.0]).unwrap();
        let bytes = tensor.to_npy_bytes(Endian::Big).unwrap();
        let any = DynTensor::read_npy(&bytes[..]).unwrap();
        assert_eq!(any.data_type(), DataType::Float64);
        assert_eq!(any.shape().dims(), &[2]);
        assert_eq!(Tensor::<f64>::try_from(any.clone()), Ok(tensor));
        assert!(Tensor::<f32>::try_from(any).is_err());
    }
}
