mod elements;
pub mod header;

pub use self::header::{FormatHeaderError, ParseHeaderError, TypeDescriptor};
use self::header::{Header, ReadHeaderError, WriteHeaderError};
use crate::{
    dtype::{DataType, Endian},
    path::{self, PathError},
    tensor::{Shape, Tensor},
    ErrorKind,
};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// The decoded header of an `.npy` file or `.npz` member.
///
/// `endian` is always a concrete byte order: descriptors stored as "native"
/// or "not applicable" are reported as the host's order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HeaderInfo {
    /// Element type.
    pub data_type: DataType,
    /// Byte order of the stored data.
    pub endian: Endian,
    /// Whether the data is stored in column-major order.
    pub fortran_order: bool,
    /// Dimensions of the array.
    pub shape: Shape,
}

/// Reads the header of an `.npy` stream without touching the data.
///
/// The reader is left positioned at the first data byte.
///
/// # Example
///
/// ```
/// use npy_archive::{peek, DataType, Endian, Tensor};
///
/// let bytes = Tensor::<f32>::zeros([2, 3]).to_npy_bytes(Endian::Big)?;
/// let info = peek(&bytes[..])?;
/// assert_eq!(info.data_type, DataType::Float32);
/// assert_eq!(info.endian, Endian::Big);
/// assert_eq!(info.shape.dims(), &[2, 3]);
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
pub fn peek<R: io::Read>(reader: R) -> Result<HeaderInfo, ReadNpyError> {
    Ok(Header::from_reader(reader)?.info())
}

/// Reads the header of the `.npy` file at `path`.
pub fn peek_npy<P: AsRef<Path>>(path: P) -> Result<HeaderInfo, ReadNpyError> {
    let file = path::open_file(path.as_ref())?;
    peek(io::BufReader::new(file))
}

/// Reads the `.npy` file at `path` into a tensor.
///
/// This is a convenience function for [`Tensor::load`].
pub fn read_npy<T, P>(path: P) -> Result<Tensor<T>, ReadNpyError>
where
    T: Element,
    P: AsRef<Path>,
{
    Tensor::load(path)
}

/// Writes `tensor` to an `.npy` file at `path` in the byte order `endian`.
///
/// The file is created if it does not exist and truncated if it does. The
/// parent directory must already exist; this is checked before anything is
/// created.
pub fn write_npy<T, P>(path: P, tensor: &Tensor<T>, endian: Endian) -> Result<(), WriteNpyError>
where
    T: Element,
    P: AsRef<Path>,
{
    let file = path::create_file(path.as_ref())?;
    tensor.write_npy(io::BufWriter::new(file), endian)
}

/// An element type that can be stored in a tensor and persisted to `.npy`
/// and `.npz` files.
///
/// Implemented for the integer types `u8` to `i64`, `f32`, `f64` and
/// `String`; each maps to exactly one [`DataType`].
pub trait Element: Clone + Default + Sized {
    /// The element type tag for `Self`.
    const DATA_TYPE: DataType;

    /// Returns the descriptor to write for `values` in the byte order
    /// `endian`.
    fn type_descriptor(values: &[Self], endian: Endian) -> TypeDescriptor;

    /// Writes `values` to `writer` in the layout described by `descr`.
    fn write_slice<W: io::Write>(
        values: &[Self],
        descr: &TypeDescriptor,
        writer: W,
    ) -> Result<(), WriteDataError>;

    /// Reads to the end of the `reader`, creating a `Vec` of length `len`.
    ///
    /// Returns `Err(_)` in at least the following cases:
    ///
    /// * if `descr` does not describe `Self`
    /// * if the `reader` has fewer elements than `len`
    /// * if the `reader` has extra bytes after reading `len` elements
    fn read_to_end_exact_vec<R: io::Read>(
        reader: R,
        descr: &TypeDescriptor,
        len: usize,
    ) -> Result<Vec<Self>, ReadDataError>;
}

/// An error writing array data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteDataError {
    /// An error caused by I/O.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A string has more code points than the descriptor allows.
    #[error("string of {length} code points exceeds declared width {width}")]
    StringTooLong {
        /// Code points in the offending string.
        length: usize,
        /// Declared width of the array.
        width: usize,
    },
}

/// An error writing a `.npy` file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteNpyError {
    /// An error caused by I/O.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The parent directory of the destination does not exist.
    #[error("invalid path: {}", .0.display())]
    InvalidPath(PathBuf),
    /// An error formatting the header.
    #[error("error formatting header: {0}")]
    FormatHeader(#[from] FormatHeaderError),
    /// A string has more code points than the descriptor allows.
    #[error("string of {length} code points exceeds declared width {width}")]
    StringTooLong {
        /// Code points in the offending string.
        length: usize,
        /// Declared width of the array.
        width: usize,
    },
}

impl WriteNpyError {
    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPath(_) => ErrorKind::Validation,
            Self::Io(_) | Self::FormatHeader(_) | Self::StringTooLong { .. } => ErrorKind::Format,
        }
    }
}

impl From<WriteHeaderError> for WriteNpyError {
    fn from(err: WriteHeaderError) -> Self {
        match err {
            WriteHeaderError::Io(err) => Self::Io(err),
            WriteHeaderError::Format(err) => Self::FormatHeader(err),
        }
    }
}

impl From<WriteDataError> for WriteNpyError {
    fn from(err: WriteDataError) -> Self {
        match err {
            WriteDataError::Io(err) => Self::Io(err),
            WriteDataError::StringTooLong { length, width } => {
                Self::StringTooLong { length, width }
            }
        }
    }
}

impl From<PathError> for WriteNpyError {
    fn from(err: PathError) -> Self {
        match err {
            PathError::Invalid(path) => Self::InvalidPath(path),
            PathError::Io(err) => Self::Io(err),
        }
    }
}

/// An error reading array data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReadDataError {
    /// An error caused by I/O.
    #[error("I/O error: {0}")]
    Io(io::Error),
    /// The descriptor does not describe the requested element type.
    #[error("stored element type {found} does not match requested {expected}")]
    WrongDataType {
        /// Element type requested by the caller.
        expected: DataType,
        /// Element type recorded in the header.
        found: DataType,
    },
    /// The file does not contain all the data described in the header.
    #[error("reached EOF before reading all data")]
    MissingData,
    /// Extra bytes are present between the end of the data and the end of the
    /// file.
    #[error("file had {0} extra bytes before EOF")]
    ExtraBytes(usize),
    /// A string element contains a value that is not a Unicode scalar value.
    #[error("invalid code point {0:#x} in string data")]
    InvalidCodePoint(u32),
}

impl From<io::Error> for ReadDataError {
    /// Performs the conversion.
    ///
    /// If the error kind is `UnexpectedEof`, the `MissingData` variant is
    /// returned. Otherwise, the `Io` variant is returned.
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Self::MissingData,
            _ => Self::Io(err),
        }
    }
}

/// An error reading a `.npy` file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReadNpyError {
    /// An error caused by I/O.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The path, or its parent directory, does not exist.
    #[error("invalid path: {}", .0.display())]
    InvalidPath(PathBuf),
    /// An error parsing the file header.
    #[error("error parsing header: {0}")]
    ParseHeader(#[from] ParseHeaderError),
    /// Overflow while computing the length of the array (in units of bytes or
    /// the number of elements) from the shape described in the file header.
    #[error("overflow computing length from shape")]
    LengthOverflow,
    /// The stored element type is not the requested one.
    #[error("stored element type {found} does not match requested {expected}")]
    WrongDataType {
        /// Element type requested by the caller.
        expected: DataType,
        /// Element type recorded in the header.
        found: DataType,
    },
    /// The file does not contain all the data described in the header.
    #[error("reached EOF before reading all data")]
    MissingData,
    /// Extra bytes are present between the end of the data and the end of the
    /// file.
    #[error("file had {0} extra bytes before EOF")]
    ExtraBytes(usize),
    /// A string element contains a value that is not a Unicode scalar value.
    #[error("invalid code point {0:#x} in string data")]
    InvalidCodePoint(u32),
}

impl ReadNpyError {
    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPath(_) | Self::WrongDataType { .. } => ErrorKind::Validation,
            _ => ErrorKind::Format,
        }
    }
}

impl From<ReadHeaderError> for ReadNpyError {
    fn from(err: ReadHeaderError) -> Self {
        match err {
            ReadHeaderError::Io(err) => Self::Io(err),
            ReadHeaderError::Parse(err) => Self::ParseHeader(err),
        }
    }
}

impl From<ReadDataError> for ReadNpyError {
    fn from(err: ReadDataError) -> Self {
        match err {
            ReadDataError::Io(err) => Self::Io(err),
            ReadDataError::WrongDataType { expected, found } => {
                Self::WrongDataType { expected, found }
            }
            ReadDataError::MissingData => Self::MissingData,
            ReadDataError::ExtraBytes(nbytes) => Self::ExtraBytes(nbytes),
            ReadDataError::InvalidCodePoint(unit) => Self::InvalidCodePoint(unit),
        }
    }
}

impl From<PathError> for ReadNpyError {
    fn from(err: PathError) -> Self {
        match err {
            PathError::Invalid(path) => Self::InvalidPath(path),
            PathError::Io(err) => Self::Io(err),
        }
    }
}

/// Opens `path` and decodes it as an `.npy` file with element type `T`.
pub(crate) fn load<T: Element>(path: &Path) -> Result<Tensor<T>, ReadNpyError> {
    let file: fs::File = path::open_file(path)?;
    Tensor::read_npy(io::BufReader::new(file))
}

/// Decodes the data following an already parsed header.
pub(crate) fn read_body<T, R>(header: Header, reader: R) -> Result<Tensor<T>, ReadNpyError>
where
    T: Element,
    R: io::Read,
{
    if header.descr.data_type() != T::DATA_TYPE {
        return Err(ReadNpyError::WrongDataType {
            expected: T::DATA_TYPE,
            found: header.descr.data_type(),
        });
    }
    let len = shape_length_checked(&header.shape, header.descr.item_size())
        .ok_or(ReadNpyError::LengthOverflow)?;
    let data = T::read_to_end_exact_vec(reader, &header.descr, len)?;
    let values = if header.fortran_order {
        crate::layout::fortran_to_standard(data, &header.shape)
    } else {
        data
    };
    Ok(Tensor::from_parts(header.shape.into(), values, header.fortran_order))
}

/// Encodes the header and data of `tensor` in the byte order `endian`.
pub(crate) fn write_tensor<T, W>(
    tensor: &Tensor<T>,
    mut writer: W,
    endian: Endian,
) -> Result<(), WriteNpyError>
where
    T: Element,
    W: io::Write,
{
    let endian = endian.resolve();
    let descr = T::type_descriptor(tensor.values(), endian);
    Header {
        descr,
        fortran_order: tensor.fortran_order(),
        shape: tensor.shape().to_vec(),
    }
    .write(&mut writer)?;
    if tensor.fortran_order() {
        let reordered = crate::layout::standard_to_fortran(tensor.values(), tensor.shape());
        T::write_slice(&reordered, &descr, &mut writer)?;
    } else {
        T::write_slice(tensor.values(), &descr, &mut writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Parses only the header from `reader`.
pub(crate) fn read_header<R: io::Read>(reader: R) -> Result<Header, ReadNpyError> {
    Ok(Header::from_reader(reader)?)
}

/// Computes the length associated with the shape (i.e. the product of the axis
/// lengths).
///
/// Returns `None` if the number of elements or the length in bytes would
/// overflow `isize`.
fn shape_length_checked(shape: &[usize], item_size: usize) -> Option<usize> {
    const MAX: usize = isize::MAX as usize;
    let len = crate::layout::size_checked(shape)?;
    (len.checked_mul(item_size)? < MAX).then_some(len)
}
