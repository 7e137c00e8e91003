use std::fmt;

/// The kind of element stored in a tensor.
///
/// This is a closed set: every tensor and every `.npy` file handled by this
/// crate has exactly one of these element types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 8-bit unsigned integer (`u8`).
    UInt8,
    /// 8-bit signed integer (`i8`).
    Int8,
    /// 16-bit unsigned integer (`u16`).
    UInt16,
    /// 16-bit signed integer (`i16`).
    Int16,
    /// 32-bit unsigned integer (`u32`).
    UInt32,
    /// 32-bit signed integer (`i32`).
    Int32,
    /// 64-bit unsigned integer (`u64`).
    UInt64,
    /// 64-bit signed integer (`i64`).
    Int64,
    /// 32-bit floating point number (`f32`).
    Float32,
    /// 64-bit floating point number (`f64`).
    Float64,
    /// Fixed-width UCS-4 string (`String`).
    UnicodeString,
}

impl DataType {
    /// All supported element types.
    pub const ALL: [DataType; 11] = [
        DataType::UInt8,
        DataType::Int8,
        DataType::UInt16,
        DataType::Int16,
        DataType::UInt32,
        DataType::Int32,
        DataType::UInt64,
        DataType::Int64,
        DataType::Float32,
        DataType::Float64,
        DataType::UnicodeString,
    ];

    /// Width of one element in bytes, or `None` for strings, whose width is
    /// chosen per array.
    pub const fn item_size(self) -> Option<usize> {
        match self {
            DataType::UInt8 | DataType::Int8 => Some(1),
            DataType::UInt16 | DataType::Int16 => Some(2),
            DataType::UInt32 | DataType::Int32 | DataType::Float32 => Some(4),
            DataType::UInt64 | DataType::Int64 | DataType::Float64 => Some(8),
            DataType::UnicodeString => None,
        }
    }

    /// The NumPy kind character used in type descriptors.
    pub(crate) const fn kind(self) -> char {
        match self {
            DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => 'u',
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => 'i',
            DataType::Float32 | DataType::Float64 => 'f',
            DataType::UnicodeString => 'U',
        }
    }

    /// Looks up a numeric type from its kind character and width in bytes.
    pub(crate) fn from_kind_and_size(kind: char, size: usize) -> Option<Self> {
        let data_type = match (kind, size) {
            ('u', 1) => DataType::UInt8,
            ('i', 1) => DataType::Int8,
            ('u', 2) => DataType::UInt16,
            ('i', 2) => DataType::Int16,
            ('u', 4) => DataType::UInt32,
            ('i', 4) => DataType::Int32,
            ('u', 8) => DataType::UInt64,
            ('i', 8) => DataType::Int64,
            ('f', 4) => DataType::Float32,
            ('f', 8) => DataType::Float64,
            _ => return None,
        };
        Some(data_type)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DataType::UInt8 => "uint8",
            DataType::Int8 => "int8",
            DataType::UInt16 => "uint16",
            DataType::Int16 => "int16",
            DataType::UInt32 => "uint32",
            DataType::Int32 => "int32",
            DataType::UInt64 => "uint64",
            DataType::Int64 => "int64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::UnicodeString => "unicode",
        };
        f.write_str(name)
    }
}

/// Byte order of multi-byte elements.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Endian {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
    /// Whatever order the host uses. Resolved to [`Endian::Little`] or
    /// [`Endian::Big`] whenever bytes are actually written or reported.
    #[default]
    Native,
}

impl Endian {
    /// The byte order of the host.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endian::Big
        } else {
            Endian::Little
        }
    }

    /// Replaces [`Endian::Native`] with the host's concrete byte order.
    pub const fn resolve(self) -> Self {
        match self {
            Endian::Native => Self::native(),
            other => other,
        }
    }

    /// Whether data in this order must be byte swapped on this host.
    pub const fn is_swapped(self) -> bool {
        !matches!(
            (self.resolve(), Self::native()),
            (Endian::Little, Endian::Little) | (Endian::Big, Endian::Big)
        )
    }

    /// Prefix character used in type descriptors.
    pub(crate) const fn descr_char(self) -> char {
        match self.resolve() {
            Endian::Big => '>',
            _ => '<',
        }
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Endian::Little => f.write_str("little"),
            Endian::Big => f.write_str("big"),
            Endian::Native => f.write_str("native"),
        }
    }
}
