use crate::{
    dtype::Endian,
    npy::{self, Element, HeaderInfo, ReadNpyError, WriteNpyError},
    path::{self, PathError},
    tensor::{DynTensor, Tensor},
    ErrorKind,
};
use indexmap::IndexMap;
use std::{
    fmt,
    fs::File,
    io::{self, BufReader, BufWriter, Read, Seek, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, trace};
use zip::{result::ZipError, write::SimpleFileOptions, ZipArchive, ZipWriter};

/// How the members of an `.npz` archive are compressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CompressionMethod {
    /// Members are stored as-is.
    #[default]
    Stored = 0,
    /// Members are compressed with DEFLATE.
    ///
    /// Requires the `compressed-npz` feature.
    Deflated = 8,
}

impl CompressionMethod {
    /// The method code used in ZIP records.
    pub const fn code(self) -> u16 {
        self as u16
    }

    fn to_zip(self) -> Result<zip::CompressionMethod, WriteNpzError> {
        match self {
            Self::Stored => Ok(zip::CompressionMethod::Stored),
            #[cfg(feature = "compressed-npz")]
            Self::Deflated => Ok(zip::CompressionMethod::Deflated),
            #[cfg(not(feature = "compressed-npz"))]
            Self::Deflated => Err(WriteNpzError::UnsupportedCompression(self)),
        }
    }

    fn from_zip(method: zip::CompressionMethod) -> Option<Self> {
        match method {
            zip::CompressionMethod::Stored => Some(Self::Stored),
            #[cfg(feature = "compressed-npz")]
            zip::CompressionMethod::Deflated => Some(Self::Deflated),
            _ => None,
        }
    }
}

impl TryFrom<u16> for CompressionMethod {
    type Error = WriteNpzError;

    fn try_from(code: u16) -> Result<Self, WriteNpzError> {
        match code {
            0 => Ok(Self::Stored),
            8 => Ok(Self::Deflated),
            _ => Err(WriteNpzError::InvalidCompressionMethod(code)),
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Stored => f.write_str("stored"),
            Self::Deflated => f.write_str("deflated"),
        }
    }
}

/// Settings for an [`NpzWriter`].
///
/// The default stores members uncompressed in the host's byte order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NpzOptions {
    compression: CompressionMethod,
    endian: Endian,
}

impl NpzOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compression applied to every member.
    #[must_use]
    pub fn compression(mut self, compression: CompressionMethod) -> Self {
        self.compression = compression;
        self
    }

    /// Sets the byte order members are encoded in.
    #[must_use]
    pub fn endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }
}

/// Directory metadata of one archive member.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NpzEntry {
    name: String,
    index: usize,
    compression: Option<CompressionMethod>,
    method: String,
    crc32: u32,
    compressed_size: u64,
    size: u64,
    offset: u64,
}

impl NpzEntry {
    /// Member name, exactly as stored.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compression method, or `None` if the member uses a method this crate
    /// cannot decode.
    pub fn compression(&self) -> Option<CompressionMethod> {
        self.compression
    }

    /// CRC-32 of the uncompressed payload.
    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    /// Size of the payload as stored in the archive.
    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    /// Size of the decoded `.npy` stream.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Offset of the member's local header from the start of the archive.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

/// An error reading a `.npz` file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReadNpzError {
    /// An error caused by I/O.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// An error caused by the zip file.
    #[error("zip file error: {0}")]
    Zip(#[from] ZipError),
    /// The path does not exist.
    #[error("invalid path: {}", .0.display())]
    InvalidPath(PathBuf),
    /// No member has the requested name.
    #[error("no array named {0:?} in archive")]
    NotFound(String),
    /// The member was written with a compression method this crate cannot
    /// decode.
    #[error("array {name:?} uses unsupported compression method {method}")]
    UnsupportedCompression {
        /// Member name.
        name: String,
        /// Method recorded in the archive.
        method: String,
    },
    /// An error reading a `.npy` member.
    #[error("error reading npy file in npz archive: {0}")]
    Npy(#[from] ReadNpyError),
}

impl ReadNpzError {
    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Npy(err) => err.kind(),
            Self::InvalidPath(_) | Self::NotFound(_) | Self::UnsupportedCompression { .. } => {
                ErrorKind::Validation
            }
            Self::Io(_) | Self::Zip(_) => ErrorKind::Format,
        }
    }
}

impl From<PathError> for ReadNpzError {
    fn from(err: PathError) -> Self {
        match err {
            PathError::Invalid(path) => Self::InvalidPath(path),
            PathError::Io(err) => Self::Io(err),
        }
    }
}

/// An error writing a `.npz` file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteNpzError {
    /// An error caused by I/O.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// An error caused by the zip file.
    #[error("zip file error: {0}")]
    Zip(#[from] ZipError),
    /// The parent directory of the destination does not exist.
    #[error("invalid path: {}", .0.display())]
    InvalidPath(PathBuf),
    /// A compression code other than 0 (stored) or 8 (deflated).
    #[error("invalid compression method {0}")]
    InvalidCompressionMethod(u16),
    /// The compression method is disabled in this build.
    #[error("compression method {0} is not enabled")]
    UnsupportedCompression(CompressionMethod),
    /// The writer was used after [`NpzWriter::close`].
    #[error("npz writer is already closed")]
    Closed,
    /// An error writing a `.npy` member.
    #[error("error writing npy file to npz archive: {0}")]
    Npy(#[from] WriteNpyError),
}

impl WriteNpzError {
    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Npy(err) => err.kind(),
            Self::InvalidPath(_)
            | Self::InvalidCompressionMethod(_)
            | Self::UnsupportedCompression(_) => ErrorKind::Validation,
            Self::Io(_) | Self::Zip(_) | Self::Closed => ErrorKind::Format,
        }
    }
}

impl From<PathError> for WriteNpzError {
    fn from(err: PathError) -> Self {
        match err {
            PathError::Invalid(path) => Self::InvalidPath(path),
            PathError::Io(err) => Self::Io(err),
        }
    }
}

/// Reader for `.npz` files.
///
/// The directory is read once on open; member names are kept in archive
/// order and matched exactly.
///
/// # Example
///
/// ```no_run
/// use npy_archive::NpzReader;
///
/// let mut npz = NpzReader::open("arrays.npz")?;
/// let names: Vec<String> = npz.keys().map(String::from).collect();
/// for name in &names {
///     println!("{name}: {:?}", npz.peek(name)?);
/// }
/// let color = npz.read_u8("color.npy")?;
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
pub struct NpzReader<R: Read + Seek = BufReader<File>> {
    archive: ZipArchive<R>,
    entries: IndexMap<String, NpzEntry>,
}

impl NpzReader {
    /// Opens the `.npz` file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ReadNpzError> {
        let file = path::open_file(path.as_ref())?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> NpzReader<R> {
    /// Reads the directory of an archive held in `reader`.
    pub fn new(reader: R) -> Result<Self, ReadNpzError> {
        let mut archive = ZipArchive::new(reader)?;
        let mut entries = IndexMap::with_capacity(archive.len());
        for index in 0..archive.len() {
            let file = archive.by_index_raw(index)?;
            let entry = NpzEntry {
                name: file.name().to_string(),
                index,
                compression: CompressionMethod::from_zip(file.compression()),
                method: format!("{:?}", file.compression()),
                crc32: file.crc32(),
                compressed_size: file.compressed_size(),
                size: file.size(),
                offset: file.header_start(),
            };
            entries.insert(entry.name.clone(), entry);
        }
        debug!(entries = entries.len(), "opened npz archive");
        Ok(Self { archive, entries })
    }

    /// Names of the arrays, in archive order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Directory metadata of every member, in archive order.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = &NpzEntry> + '_ {
        self.entries.values()
    }

    /// Number of arrays in the archive.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive has no arrays.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an array named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Directory metadata of the member `name`.
    pub fn entry(&self, name: &str) -> Result<&NpzEntry, ReadNpzError> {
        self.entries.get(name).ok_or_else(|| ReadNpzError::NotFound(name.to_string()))
    }

    /// Decodes only the `.npy` header of the member `name`.
    pub fn peek(&mut self, name: &str) -> Result<HeaderInfo, ReadNpzError> {
        let index = self.readable_index(name)?;
        trace!(entry = name, "peeking npz entry");
        let file = self.archive.by_index(index)?;
        Ok(npy::peek(file)?)
    }

    /// Reads the array named `name` with element type `T`.
    ///
    /// The member's CRC-32 is verified.
    pub fn read<T: Element>(&mut self, name: &str) -> Result<Tensor<T>, ReadNpzError> {
        let index = self.readable_index(name)?;
        trace!(entry = name, data_type = %T::DATA_TYPE, "reading npz entry");
        let mut file = self.archive.by_index(index)?;
        let header = npy::read_header(&mut file)?;
        Ok(npy::read_body(header, file)?)
    }

    /// Reads the array named `name` with whatever element type it stores.
    pub fn read_dyn(&mut self, name: &str) -> Result<DynTensor, ReadNpzError> {
        let index = self.readable_index(name)?;
        trace!(entry = name, "reading npz entry");
        let file = self.archive.by_index(index)?;
        Ok(DynTensor::read_npy(file)?)
    }

    /// Releases the underlying reader.
    pub fn close(self) {
        debug!(entries = self.entries.len(), "closed npz archive");
    }

    fn readable_index(&self, name: &str) -> Result<usize, ReadNpzError> {
        let entry = self.entry(name)?;
        match entry.compression {
            Some(_) => Ok(entry.index),
            None => Err(ReadNpzError::UnsupportedCompression {
                name: entry.name.clone(),
                method: entry.method.clone(),
            }),
        }
    }
}

macro_rules! impl_typed_reads {
    ($($method:ident => $elem:ty),* $(,)?) => {
        impl<R: Read + Seek> NpzReader<R> {
            $(
                #[doc = concat!(
                    "Reads the array named `name` as `", stringify!($elem), "` elements."
                )]
                pub fn $method(&mut self, name: &str) -> Result<Tensor<$elem>, ReadNpzError> {
                    self.read(name)
                }
            )*
        }
    };
}

impl_typed_reads! {
    read_u8 => u8,
    read_i8 => i8,
    read_u16 => u16,
    read_i16 => i16,
    read_u32 => u32,
    read_i32 => i32,
    read_u64 => u64,
    read_i64 => i64,
    read_f32 => f32,
    read_f64 => f64,
    read_unicode => String,
}

/// Writer for `.npz` files.
///
/// Call [`close`](NpzWriter::close) to finish the archive and observe any
/// error. A writer dropped without closing is finished on a best-effort basis.
///
/// # Example
///
/// ```no_run
/// use npy_archive::{CompressionMethod, NpzWriter, Tensor};
///
/// let mut npz = NpzWriter::create("arrays.npz", CompressionMethod::Deflated)?;
/// npz.write("color.npy", &Tensor::<u8>::zeros([5, 5, 3]))?;
/// npz.write("depth.npy", &Tensor::<f32>::zeros([5, 5]))?;
/// npz.close()?;
/// # Ok::<_, Box<dyn std::error::Error>>(())
/// ```
pub struct NpzWriter<W: Write + Seek = BufWriter<File>> {
    zip: Option<ZipWriter<W>>,
    compression: zip::CompressionMethod,
    endian: Endian,
}

impl NpzWriter {
    /// Creates (or truncates) the `.npz` file at `path`.
    ///
    /// Members are written in the host's byte order. The parent directory
    /// must already exist.
    pub fn create<P: AsRef<Path>>(
        path: P,
        compression: CompressionMethod,
    ) -> Result<Self, WriteNpzError> {
        // Reject before touching the filesystem.
        compression.to_zip()?;
        let file = path::create_file(path.as_ref())?;
        Self::with_options(BufWriter::new(file), NpzOptions::new().compression(compression))
    }
}

impl<W: Write + Seek> NpzWriter<W> {
    /// Writes an uncompressed archive in the host's byte order to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            zip: Some(ZipWriter::new(writer)),
            compression: zip::CompressionMethod::Stored,
            endian: Endian::Native,
        }
    }

    /// Writes an archive to `writer` with the given settings.
    pub fn with_options(writer: W, options: NpzOptions) -> Result<Self, WriteNpzError> {
        Ok(Self {
            zip: Some(ZipWriter::new(writer)),
            compression: options.compression.to_zip()?,
            endian: options.endian,
        })
    }

    /// Appends `tensor` as a member named `name`.
    ///
    /// The name is stored exactly as given.
    pub fn write<T: Element>(
        &mut self,
        name: &str,
        tensor: &Tensor<T>,
    ) -> Result<(), WriteNpzError> {
        if self.zip.is_none() {
            return Err(WriteNpzError::Closed);
        }
        let bytes = tensor.to_npy_bytes(self.endian)?;
        self.write_member(name, &bytes)
    }

    /// Appends a tensor of any element type as a member named `name`.
    pub fn write_dyn(&mut self, name: &str, tensor: &DynTensor) -> Result<(), WriteNpzError> {
        if self.zip.is_none() {
            return Err(WriteNpzError::Closed);
        }
        let mut bytes = Vec::new();
        tensor.write_npy(&mut bytes, self.endian)?;
        self.write_member(name, &bytes)
    }

    fn write_member(&mut self, name: &str, bytes: &[u8]) -> Result<(), WriteNpzError> {
        let zip = self.zip.as_mut().ok_or(WriteNpzError::Closed)?;
        let options = SimpleFileOptions::default()
            .compression_method(self.compression)
            .large_file(bytes.len() as u64 >= u64::from(u32::MAX));
        zip.start_file(name, options)?;
        zip.write_all(bytes)?;
        debug!(entry = name, size = bytes.len(), "wrote npz entry");
        Ok(())
    }

    /// Writes the archive directory, flushes and returns the underlying
    /// writer.
    ///
    /// Fails with [`WriteNpzError::Closed`] if called again.
    pub fn close(&mut self) -> Result<W, WriteNpzError> {
        let zip = self.zip.take().ok_or(WriteNpzError::Closed)?;
        let mut writer = zip.finish()?;
        writer.flush()?;
        debug!("closed npz archive");
        Ok(writer)
    }
}

impl<W: Write + Seek> Drop for NpzWriter<W> {
    fn drop(&mut self) {
        if let Some(zip) = self.zip.take() {
            match zip.finish().map_err(WriteNpzError::from).and_then(|mut writer| {
                writer.flush()?;
                Ok(())
            }) {
                Ok(()) => debug!("finished npz archive on drop"),
                Err(err) => debug!(%err, "failed to finish npz archive on drop"),
            }
        }
    }
}
