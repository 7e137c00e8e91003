use crate::{
    dtype::{DataType, Endian},
    npy::HeaderInfo,
};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use num_traits::ToPrimitive;
use py_literal::{
    FormatError as PyValueFormatError, ParseError as PyValueParseError, Value as PyValue,
};
use std::{convert::TryFrom, error::Error, fmt, io, str::FromStr};

/// Magic string to indicate npy format.
const MAGIC_STRING: &[u8] = b"\x93NUMPY";

/// The total header length (including magic string, version number, header
/// length value, array format description, padding, and final newline) must be
/// evenly divisible by this value.
const HEADER_DIVISOR: usize = 64;

/// Width in bytes of one code unit of a `U` (UCS-4) string.
pub(crate) const UNICODE_UNIT: usize = 4;

/// An error parsing the header of a `.npy` file.
#[derive(Debug)]
#[non_exhaustive]
pub enum ParseHeaderError {
    /// The start of the file does not match the magic string.
    MagicString,
    /// The version number is not recognized.
    Version {
        /// Major version number.
        major: u8,
        /// Minor version number.
        minor: u8,
    },
    /// Indicates that the `HEADER_LEN` doesn't fit in `usize`.
    HeaderLengthOverflow(u32),
    /// Indicates that the array format string contains non-ASCII characters.
    /// This is an error for .npy format versions 1.0 and 2.0.
    NonAscii,
    /// Error parsing the array format string as UTF-8. This does not apply to
    /// .npy format versions 1.0 and 2.0, which require the array format string
    /// to be ASCII.
    Utf8Parse(std::str::Utf8Error),
    /// An unknown key was found in the metadata dictionary.
    UnknownKey(PyValue),
    /// A required key was missing from the metadata dictionary.
    MissingKey(&'static str),
    /// An illegal value was found for a key in the metadata dictionary.
    IllegalValue {
        /// The key for which the value was illegal.
        key: &'static str,
        /// The illegal value.
        value: PyValue,
    },
    /// The `descr` string names an element type this crate cannot represent.
    UnsupportedDescriptor(String),
    /// Error parsing the metadata dictionary.
    DictParse(PyValueParseError),
    /// The metadata is not a dictionary.
    MetaNotDict(PyValue),
    /// The header is missing a newline at the end.
    MissingNewline,
}

impl Error for ParseHeaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Utf8Parse(err) => Some(err),
            Self::DictParse(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for ParseHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MagicString => write!(f, "start does not match magic string"),
            Self::Version { major, minor } => write!(f, "unknown version number: {major}.{minor}"),
            Self::HeaderLengthOverflow(len) => {
                write!(f, "HEADER_LEN {len} does not fit in `usize`")
            }
            Self::NonAscii => write!(
                f,
                "non-ascii in array format string; \
                 this is not supported in .npy format versions 1.0 and 2.0"
            ),
            Self::Utf8Parse(err) => write!(f, "error parsing array format string as UTF-8: {err}"),
            Self::UnknownKey(key) => write!(f, "unknown key: {key}"),
            Self::MissingKey(key) => write!(f, "missing key: {key}"),
            Self::IllegalValue { key, value } => write!(f, "illegal value for key {key}: {value}"),
            Self::UnsupportedDescriptor(descr) => write!(f, "unsupported type descriptor: {descr}"),
            Self::DictParse(err) => write!(f, "error parsing metadata dict: {err}"),
            Self::MetaNotDict(value) => write!(f, "metadata is not a dict: {value}"),
            Self::MissingNewline => write!(f, "newline missing at end of header"),
        }
    }
}

impl From<std::str::Utf8Error> for ParseHeaderError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::Utf8Parse(err)
    }
}

impl From<PyValueParseError> for ParseHeaderError {
    fn from(err: PyValueParseError) -> Self {
        Self::DictParse(err)
    }
}

#[derive(Debug)]
pub enum ReadHeaderError {
    Io(io::Error),
    Parse(ParseHeaderError),
}

impl Error for ReadHeaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

impl fmt::Display for ReadHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Parse(err) => write!(f, "error parsing header: {err}"),
        }
    }
}

impl From<io::Error> for ReadHeaderError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<ParseHeaderError> for ReadHeaderError {
    fn from(err: ParseHeaderError) -> Self {
        Self::Parse(err)
    }
}

/// The `descr` entry of a header: element type, byte order and item width.
///
/// Single-byte types are written with the `|` ("not applicable") prefix and
/// report [`Endian::Native`], as do descriptors stored with the `=` prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    data_type: DataType,
    endian: Endian,
    item_size: usize,
}

impl TypeDescriptor {
    /// Descriptor for a fixed-width numeric type.
    ///
    /// Returns `None` for [`DataType::UnicodeString`], whose width depends on
    /// the data; use [`TypeDescriptor::unicode`] instead.
    pub fn numeric(data_type: DataType, endian: Endian) -> Option<Self> {
        let item_size = data_type.item_size()?;
        let endian = if item_size == 1 { Endian::Native } else { endian };
        Some(Self { data_type, endian, item_size })
    }

    /// Descriptor with an item width already known to suit `data_type`.
    pub(crate) const fn from_parts(data_type: DataType, endian: Endian, item_size: usize) -> Self {
        Self { data_type, endian, item_size }
    }

    /// Descriptor for strings of at most `width` code points.
    ///
    /// Returns `None` for a width of zero.
    pub fn unicode(endian: Endian, width: usize) -> Option<Self> {
        if width == 0 {
            return None;
        }
        Some(Self {
            data_type: DataType::UnicodeString,
            endian,
            item_size: width.checked_mul(UNICODE_UNIT)?,
        })
    }

    /// The element type.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// The byte order as recorded in the descriptor.
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Width of one element in bytes.
    pub fn item_size(&self) -> usize {
        self.item_size
    }

    /// Number of code points per element for string descriptors (zero for
    /// numeric descriptors).
    pub fn string_width(&self) -> usize {
        match self.data_type {
            DataType::UnicodeString => self.item_size / UNICODE_UNIT,
            _ => 0,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.data_type {
            DataType::UnicodeString => {
                write!(f, "{}U{}", self.endian.descr_char(), self.string_width())
            }
            _ if self.item_size == 1 => write!(f, "|{}1", self.data_type.kind()),
            _ => write!(
                f,
                "{}{}{}",
                self.endian.descr_char(),
                self.data_type.kind(),
                self.item_size
            ),
        }
    }
}

impl FromStr for TypeDescriptor {
    type Err = ParseHeaderError;

    fn from_str(descr: &str) -> Result<Self, Self::Err> {
        let unsupported = || ParseHeaderError::UnsupportedDescriptor(descr.to_string());
        let mut chars = descr.chars();
        let order = chars.next().ok_or_else(unsupported)?;
        let kind = chars.next().ok_or_else(unsupported)?;
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(unsupported());
        }
        let size: usize = digits.parse().map_err(|_| unsupported())?;
        let endian = match order {
            '<' => Endian::Little,
            '>' => Endian::Big,
            '=' => Endian::Native,
            // Only meaningful when byte order is irrelevant.
            '|' if kind != 'U' && size == 1 => Endian::Native,
            _ => return Err(unsupported()),
        };
        if kind == 'U' {
            return Self::unicode(endian, size).ok_or_else(unsupported);
        }
        let data_type = DataType::from_kind_and_size(kind, size).ok_or_else(unsupported)?;
        Ok(Self { data_type, endian, item_size: size })
    }
}

#[derive(Clone, Copy)]
#[allow(non_camel_case_types)]
#[non_exhaustive]
enum Version {
    V1_0,
    V2_0,
    V3_0,
}

impl Version {
    /// Number of bytes taken up by version number (1 byte for major version, 1
    /// byte for minor version).
    const VERSION_NUM_BYTES: usize = 2;

    fn from_array(bytes: [u8; Self::VERSION_NUM_BYTES]) -> Result<Self, ParseHeaderError> {
        match bytes {
            [0x01, 0x00] => Ok(Version::V1_0),
            [0x02, 0x00] => Ok(Version::V2_0),
            [0x03, 0x00] => Ok(Version::V3_0),
            [major, minor] => Err(ParseHeaderError::Version { major, minor }),
        }
    }

    const fn major_version(self) -> u8 {
        match self {
            Version::V1_0 => 1,
            Version::V2_0 => 2,
            Version::V3_0 => 3,
        }
    }

    const fn minor_version(self) -> u8 {
        0
    }

    /// Number of bytes in representation of header length.
    const fn header_len_num_bytes(self) -> usize {
        match self {
            Version::V1_0 => 2,
            Version::V2_0 | Version::V3_0 => 4,
        }
    }

    fn read_header_len<R: io::Read>(self, mut reader: R) -> Result<usize, ReadHeaderError> {
        match self {
            Version::V1_0 => Ok(usize::from(reader.read_u16::<LittleEndian>()?)),
            Version::V2_0 | Version::V3_0 => {
                let header_len: u32 = reader.read_u32::<LittleEndian>()?;
                Ok(usize::try_from(header_len)
                    .map_err(|_| ParseHeaderError::HeaderLengthOverflow(header_len))?)
            }
        }
    }

    /// Format header length as bytes for writing to file.
    ///
    /// Returns `None` if the value of `header_len` is too large for this .npy
    /// version.
    fn format_header_len(self, header_len: usize) -> Option<Vec<u8>> {
        let mut out = vec![0; self.header_len_num_bytes()];
        match self {
            Version::V1_0 => LittleEndian::write_u16(&mut out, u16::try_from(header_len).ok()?),
            Version::V2_0 | Version::V3_0 => {
                LittleEndian::write_u32(&mut out, u32::try_from(header_len).ok()?);
            }
        }
        Some(out)
    }

    /// Computes the total header length and the formatted `HEADER_LEN` value
    /// for an unpadded array format string.
    ///
    /// Returns `None` if the total header length overflows `usize` or if the
    /// value of `HEADER_LEN` is too large for this .npy version.
    fn compute_lengths(self, unpadded_arr_format: &[u8]) -> Option<HeaderLengthInfo> {
        const NEWLINE_LEN: usize = b"\n".len();

        let prefix_len =
            MAGIC_STRING.len() + Version::VERSION_NUM_BYTES + self.header_len_num_bytes();
        let unpadded_total_len = prefix_len
            .checked_add(unpadded_arr_format.len())?
            .checked_add(NEWLINE_LEN)?;
        let padding_len = HEADER_DIVISOR - unpadded_total_len % HEADER_DIVISOR;
        let total_len = unpadded_total_len.checked_add(padding_len)?;
        let formatted_header_len = self.format_header_len(total_len - prefix_len)?;
        Some(HeaderLengthInfo { total_len, formatted_header_len })
    }
}

struct HeaderLengthInfo {
    /// Total header length, a multiple of `HEADER_DIVISOR`.
    total_len: usize,
    /// Formatted `HEADER_LEN` value (array format description, padding, and
    /// final newline).
    formatted_header_len: Vec<u8>,
}

/// An error formatting a header.
#[derive(Debug)]
#[non_exhaustive]
pub enum FormatHeaderError {
    /// The header dictionary could not be rendered as a Python literal.
    PyValue(PyValueFormatError),
    /// The total header length overflows `usize`, or `HEADER_LEN` exceeds the
    /// maximum encodable value.
    HeaderTooLong,
}

impl Error for FormatHeaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::PyValue(err) => Some(err),
            Self::HeaderTooLong => None,
        }
    }
}

impl fmt::Display for FormatHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::PyValue(err) => write!(f, "error formatting Python value: {err}"),
            Self::HeaderTooLong => write!(f, "the header is too long"),
        }
    }
}

impl From<PyValueFormatError> for FormatHeaderError {
    fn from(err: PyValueFormatError) -> Self {
        Self::PyValue(err)
    }
}

#[derive(Debug)]
pub enum WriteHeaderError {
    Io(io::Error),
    Format(FormatHeaderError),
}

impl Error for WriteHeaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Format(err) => Some(err),
        }
    }
}

impl fmt::Display for WriteHeaderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Format(err) => write!(f, "error formatting header: {err}"),
        }
    }
}

impl From<io::Error> for WriteHeaderError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<FormatHeaderError> for WriteHeaderError {
    fn from(err: FormatHeaderError) -> Self {
        Self::Format(err)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Header {
    pub descr: TypeDescriptor,
    pub fortran_order: bool,
    pub shape: Vec<usize>,
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        self.to_py_value().fmt(f)
    }
}

impl Header {
    /// Public view of this header with the byte order resolved.
    pub(crate) fn info(&self) -> HeaderInfo {
        HeaderInfo {
            data_type: self.descr.data_type(),
            endian: self.descr.endian().resolve(),
            fortran_order: self.fortran_order,
            shape: self.shape.clone().into(),
        }
    }

    fn from_py_value(value: PyValue) -> Result<Self, ParseHeaderError> {
        let PyValue::Dict(dict) = value else {
            return Err(ParseHeaderError::MetaNotDict(value));
        };
        let mut descr = None;
        let mut fortran_order = None;
        let mut shape = None;
        for (key, value) in dict {
            match &key {
                PyValue::String(k) if k == "descr" => {
                    let PyValue::String(s) = &value else {
                        return Err(ParseHeaderError::IllegalValue { key: "descr", value });
                    };
                    descr = Some(s.parse::<TypeDescriptor>()?);
                }
                PyValue::String(k) if k == "fortran_order" => {
                    if let PyValue::Boolean(b) = value {
                        fortran_order = Some(b);
                    } else {
                        return Err(ParseHeaderError::IllegalValue { key: "fortran_order", value });
                    }
                }
                PyValue::String(k) if k == "shape" => {
                    fn parse_shape(value: &PyValue) -> Option<Vec<usize>> {
                        value
                            .as_tuple()?
                            .iter()
                            .map(|elem| elem.as_integer()?.to_usize())
                            .collect()
                    }
                    if let Some(s) = parse_shape(&value) {
                        shape = Some(s);
                    } else {
                        return Err(ParseHeaderError::IllegalValue { key: "shape", value });
                    }
                }
                _ => return Err(ParseHeaderError::UnknownKey(key)),
            }
        }
        let descr = descr.ok_or(ParseHeaderError::MissingKey("descr"))?;
        let fortran_order = fortran_order.ok_or(ParseHeaderError::MissingKey("fortran_order"))?;
        let shape = shape.ok_or(ParseHeaderError::MissingKey("shape"))?;
        Ok(Self { descr, fortran_order, shape })
    }

    /// Reads exactly the header bytes from `reader`, leaving it positioned at
    /// the first data byte.
    pub(crate) fn from_reader<R: io::Read>(mut reader: R) -> Result<Self, ReadHeaderError> {
        {
            let mut buf = [0; MAGIC_STRING.len()];
            reader.read_exact(&mut buf)?;
            if buf != MAGIC_STRING {
                Err(ParseHeaderError::MagicString)?;
            }
        }

        let mut buf = [0; Version::VERSION_NUM_BYTES];
        reader.read_exact(&mut buf)?;
        let version = Version::from_array(buf)?;

        let header_len = version.read_header_len(&mut reader)?;

        let mut buf = vec![0; header_len];
        reader.read_exact(&mut buf)?;
        let without_newline = match buf.split_last() {
            Some((&b'\n', rest)) => rest,
            Some(_) | None => Err(ParseHeaderError::MissingNewline)?,
        };
        let header_str = match version {
            Version::V1_0 | Version::V2_0 => {
                if without_newline.is_ascii() {
                    std::str::from_utf8(without_newline).map_err(ParseHeaderError::from)?
                } else {
                    Err(ParseHeaderError::NonAscii)?
                }
            }
            Version::V3_0 => {
                std::str::from_utf8(without_newline).map_err(ParseHeaderError::from)?
            }
        };
        let arr_format = header_str.parse().map_err(ParseHeaderError::from)?;
        Ok(Self::from_py_value(arr_format)?)
    }

    fn to_py_value(&self) -> PyValue {
        PyValue::Dict(vec![
            (
                PyValue::String("descr".to_string()),
                PyValue::String(self.descr.to_string()),
            ),
            (
                PyValue::String("fortran_order".to_string()),
                PyValue::Boolean(self.fortran_order),
            ),
            (
                PyValue::String("shape".to_string()),
                PyValue::Tuple(
                    self.shape
                        .iter()
                        .map(|&elem| PyValue::Integer(elem.into()))
                        .collect(),
                ),
            ),
        ])
    }

    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>, FormatHeaderError> {
        let mut arr_format = Vec::new();
        self.to_py_value().write_ascii(&mut arr_format)?;

        // The smallest version whose HEADER_LEN field can hold the length.
        let (version, length_info) = [Version::V1_0, Version::V2_0]
            .iter()
            .find_map(|&version| Some((version, version.compute_lengths(&arr_format)?)))
            .ok_or(FormatHeaderError::HeaderTooLong)?;

        let mut out = Vec::with_capacity(length_info.total_len);
        out.extend_from_slice(MAGIC_STRING);
        out.push(version.major_version());
        out.push(version.minor_version());
        out.extend_from_slice(&length_info.formatted_header_len);
        out.extend_from_slice(&arr_format);
        out.resize(length_info.total_len - 1, b' ');
        out.push(b'\n');

        debug_assert_eq!(out.len(), length_info.total_len);
        debug_assert_eq!(out.len() % HEADER_DIVISOR, 0);

        Ok(out)
    }

    pub(crate) fn write<W: io::Write>(&self, mut writer: W) -> Result<(), WriteHeaderError> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(descr: &str, fortran_order: bool, shape: &[usize]) -> Header {
        Header {
            descr: descr.parse().unwrap(),
            fortran_order,
            shape: shape.to_vec(),
        }
    }

    #[test]
    fn descriptor_codes() {
        let cases = [
            ("|u1", DataType::UInt8, Endian::Native, 1),
            ("|i1", DataType::Int8, Endian::Native, 1),
            ("<u1", DataType::UInt8, Endian::Little, 1),
            ("<u2", DataType::UInt16, Endian::Little, 2),
            (">i2", DataType::Int16, Endian::Big, 2),
            ("<u4", DataType::UInt32, Endian::Little, 4),
            (">i4", DataType::Int32, Endian::Big, 4),
            ("=u8", DataType::UInt64, Endian::Native, 8),
            ("<i8", DataType::Int64, Endian::Little, 8),
            ("<f4", DataType::Float32, Endian::Little, 4),
            (">f8", DataType::Float64, Endian::Big, 8),
            ("<U7", DataType::UnicodeString, Endian::Little, 28),
        ];
        for (code, data_type, endian, item_size) in cases {
            let descr: TypeDescriptor = code.parse().unwrap();
            assert_eq!(descr.data_type(), data_type, "{code}");
            assert_eq!(descr.endian(), endian, "{code}");
            assert_eq!(descr.item_size(), item_size, "{code}");
        }
        for code in ["", "<", "<c8", "|b1", "<f2", "|u4", "|U3", "<U", "<U0", "<u2x", "O8"] {
            assert!(code.parse::<TypeDescriptor>().is_err(), "{code}");
        }
    }

    #[test]
    fn descriptor_formatting() {
        let f4 = TypeDescriptor::numeric(DataType::Float32, Endian::Big).unwrap();
        assert_eq!(f4.to_string(), ">f4");
        let u1 = TypeDescriptor::numeric(DataType::UInt8, Endian::Big).unwrap();
        assert_eq!(u1.to_string(), "|u1");
        let u = TypeDescriptor::unicode(Endian::Little, 5).unwrap();
        assert_eq!(u.to_string(), "<U5");
        assert_eq!(u.string_width(), 5);
        assert!(TypeDescriptor::numeric(DataType::UnicodeString, Endian::Little).is_none());
    }

    #[test]
    fn header_is_padded_to_divisor() {
        let shapes: [&[usize]; 4] = [&[], &[3], &[32, 32, 3], &[1_000_000, 7, 7, 7, 7]];
        for shape in shapes {
            let bytes = header("<f8", false, shape).to_bytes().unwrap();
            assert_eq!(bytes.len() % HEADER_DIVISOR, 0);
            assert_eq!(&bytes[..MAGIC_STRING.len()], MAGIC_STRING);
            assert_eq!(bytes[6..8], [1, 0]);
            assert_eq!(bytes.last(), Some(&b'\n'));
        }
    }

    #[test]
    fn header_round_trip() {
        let original = header(">i4", true, &[5, 2, 5]);
        let bytes = original.to_bytes().unwrap();
        let parsed = Header::from_reader(&bytes[..]).unwrap();
        assert_eq!(parsed, original);
        let info = parsed.info();
        assert_eq!(info.data_type, DataType::Int32);
        assert_eq!(info.endian, Endian::Big);
        assert!(info.fortran_order);
        assert_eq!(info.shape.dims(), &[5, 2, 5]);
    }

    #[test]
    fn single_byte_reports_host_order() {
        let bytes = header("|u1", false, &[2]).to_bytes().unwrap();
        let info = Header::from_reader(&bytes[..]).unwrap().info();
        assert_eq!(info.endian, Endian::native());
    }

    #[test]
    fn long_header_uses_version_two() {
        let shape = vec![1; 20_000];
        let bytes = header("<u2", false, &shape).to_bytes().unwrap();
        assert_eq!(bytes[6..8], [2, 0]);
        assert_eq!(bytes.len() % HEADER_DIVISOR, 0);
        assert_eq!(Header::from_reader(&bytes[..]).unwrap().shape, shape);
    }

    #[test]
    fn parses_numpy_written_header() {
        let dict = b"{'descr': '<f8', 'fortran_order': False, 'shape': (2, 3), }";
        let mut bytes = MAGIC_STRING.to_vec();
        bytes.extend_from_slice(&[1, 0]);
        let padded = (dict.len() + 11).div_ceil(64) * 64 - 10;
        bytes.extend_from_slice(&(padded as u16).to_le_bytes());
        bytes.extend_from_slice(dict);
        bytes.resize(10 + padded - 1, b' ');
        bytes.push(b'\n');
        let parsed = Header::from_reader(&bytes[..]).unwrap();
        assert_eq!(parsed, header("<f8", false, &[2, 3]));
    }

    #[test]
    fn rejects_bad_magic() {
        let mut bytes = header("<f4", false, &[1]).to_bytes().unwrap();
        bytes[1] = b'X';
        assert!(matches!(
            Header::from_reader(&bytes[..]),
            Err(ReadHeaderError::Parse(ParseHeaderError::MagicString))
        ));
    }

    #[test]
    fn rejects_truncated_magic() {
        assert!(matches!(
            Header::from_reader(&b"\x93NUM"[..]),
            Err(ReadHeaderError::Io(_))
        ));
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = header("<f4", false, &[1]).to_bytes().unwrap();
        bytes[6] = 9;
        assert!(matches!(
            Header::from_reader(&bytes[..]),
            Err(ReadHeaderError::Parse(ParseHeaderError::Version { major: 9, minor: 0 }))
        ));
    }

    #[test]
    fn rejects_missing_newline() {
        let mut bytes = header("<f4", false, &[1]).to_bytes().unwrap();
        let last = bytes.len() - 1;
        bytes[last] = b' ';
        assert!(matches!(
            Header::from_reader(&bytes[..]),
            Err(ReadHeaderError::Parse(ParseHeaderError::MissingNewline))
        ));
    }
}
