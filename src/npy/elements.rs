use super::{header::UNICODE_UNIT, Element, ReadDataError, TypeDescriptor, WriteDataError};
use crate::dtype::{DataType, Endian};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::io::{self, Read};

fn check_data_type(expected: DataType, descr: &TypeDescriptor) -> Result<(), ReadDataError> {
    if descr.data_type() == expected {
        Ok(())
    } else {
        Err(ReadDataError::WrongDataType { expected, found: descr.data_type() })
    }
}

/// Reads exactly `len` elements of `item_size` bytes each.
///
/// The buffer grows with the data actually present, so a header claiming more
/// elements than the stream holds fails with `MissingData` rather than
/// allocating up front.
fn read_data<R: io::Read>(
    reader: &mut R,
    len: usize,
    item_size: usize,
) -> Result<Vec<u8>, ReadDataError> {
    let nbytes = len.checked_mul(item_size).ok_or(ReadDataError::MissingData)?;
    let mut buf = Vec::new();
    reader.by_ref().take(nbytes as u64).read_to_end(&mut buf)?;
    if buf.len() == nbytes {
        Ok(buf)
    } else {
        Err(ReadDataError::MissingData)
    }
}

/// Returns an error if the reader has any bytes left.
fn check_for_extra_bytes<R: io::Read>(reader: &mut R) -> Result<(), ReadDataError> {
    let num_extra_bytes = reader.read_to_end(&mut Vec::new())?;
    if num_extra_bytes == 0 {
        Ok(())
    } else {
        Err(ReadDataError::ExtraBytes(num_extra_bytes))
    }
}

impl Element for u8 {
    const DATA_TYPE: DataType = DataType::UInt8;

    fn type_descriptor(_values: &[Self], _endian: Endian) -> TypeDescriptor {
        TypeDescriptor::from_parts(Self::DATA_TYPE, Endian::Native, 1)
    }

    fn write_slice<W: io::Write>(
        values: &[Self],
        _descr: &TypeDescriptor,
        mut writer: W,
    ) -> Result<(), WriteDataError> {
        writer.write_all(values)?;
        Ok(())
    }

    fn read_to_end_exact_vec<R: io::Read>(
        mut reader: R,
        descr: &TypeDescriptor,
        len: usize,
    ) -> Result<Vec<Self>, ReadDataError> {
        check_data_type(Self::DATA_TYPE, descr)?;
        let out = read_data(&mut reader, len, 1)?;
        check_for_extra_bytes(&mut reader)?;
        Ok(out)
    }
}

impl Element for i8 {
    const DATA_TYPE: DataType = DataType::Int8;

    fn type_descriptor(_values: &[Self], _endian: Endian) -> TypeDescriptor {
        TypeDescriptor::from_parts(Self::DATA_TYPE, Endian::Native, 1)
    }

    fn write_slice<W: io::Write>(
        values: &[Self],
        _descr: &TypeDescriptor,
        mut writer: W,
    ) -> Result<(), WriteDataError> {
        let bytes: Vec<u8> = values.iter().map(|&v| v as u8).collect();
        writer.write_all(&bytes)?;
        Ok(())
    }

    fn read_to_end_exact_vec<R: io::Read>(
        mut reader: R,
        descr: &TypeDescriptor,
        len: usize,
    ) -> Result<Vec<Self>, ReadDataError> {
        check_data_type(Self::DATA_TYPE, descr)?;
        let bytes = read_data(&mut reader, len, 1)?;
        check_for_extra_bytes(&mut reader)?;
        Ok(bytes.into_iter().map(|b| b as i8).collect())
    }
}

macro_rules! impl_multi_byte_element {
    ($elem:ty, $data_type:ident, $size:expr, $read_into:ident, $write_into:ident) => {
        impl Element for $elem {
            const DATA_TYPE: DataType = DataType::$data_type;

            fn type_descriptor(_values: &[Self], endian: Endian) -> TypeDescriptor {
                TypeDescriptor::from_parts(Self::DATA_TYPE, endian, $size)
            }

            fn write_slice<W: io::Write>(
                values: &[Self],
                descr: &TypeDescriptor,
                mut writer: W,
            ) -> Result<(), WriteDataError> {
                let mut buf = vec![0; values.len() * $size];
                match descr.endian().resolve() {
                    Endian::Big => BigEndian::$write_into(values, &mut buf),
                    _ => LittleEndian::$write_into(values, &mut buf),
                }
                writer.write_all(&buf)?;
                Ok(())
            }

            fn read_to_end_exact_vec<R: io::Read>(
                mut reader: R,
                descr: &TypeDescriptor,
                len: usize,
            ) -> Result<Vec<Self>, ReadDataError> {
                check_data_type(Self::DATA_TYPE, descr)?;
                let bytes = read_data(&mut reader, len, $size)?;
                check_for_extra_bytes(&mut reader)?;
                let mut out = vec![<$elem>::default(); len];
                match descr.endian().resolve() {
                    Endian::Big => BigEndian::$read_into(&bytes, &mut out),
                    _ => LittleEndian::$read_into(&bytes, &mut out),
                }
                Ok(out)
            }
        }
    };
}

impl_multi_byte_element!(u16, UInt16, 2, read_u16_into, write_u16_into);
impl_multi_byte_element!(i16, Int16, 2, read_i16_into, write_i16_into);
impl_multi_byte_element!(u32, UInt32, 4, read_u32_into, write_u32_into);
impl_multi_byte_element!(i32, Int32, 4, read_i32_into, write_i32_into);
impl_multi_byte_element!(u64, UInt64, 8, read_u64_into, write_u64_into);
impl_multi_byte_element!(i64, Int64, 8, read_i64_into, write_i64_into);
impl_multi_byte_element!(f32, Float32, 4, read_f32_into, write_f32_into);
impl_multi_byte_element!(f64, Float64, 8, read_f64_into, write_f64_into);

/// Strings are stored as fixed-width arrays of UCS-4 code units, padded with
/// NUL. The width is the longest string in the array, and never less than one.
impl Element for String {
    const DATA_TYPE: DataType = DataType::UnicodeString;

    fn type_descriptor(values: &[Self], endian: Endian) -> TypeDescriptor {
        let width = values
            .iter()
            .map(|value| value.chars().count())
            .max()
            .unwrap_or(0)
            .max(1);
        TypeDescriptor::from_parts(Self::DATA_TYPE, endian, width * UNICODE_UNIT)
    }

    fn write_slice<W: io::Write>(
        values: &[Self],
        descr: &TypeDescriptor,
        mut writer: W,
    ) -> Result<(), WriteDataError> {
        let width = descr.string_width();
        let mut units = vec![0u32; values.len() * width];
        for (i, value) in values.iter().enumerate() {
            let length = value.chars().count();
            if length > width {
                return Err(WriteDataError::StringTooLong { length, width });
            }
            let slot = &mut units[i * width..(i + 1) * width];
            for (unit, c) in slot.iter_mut().zip(value.chars()) {
                *unit = u32::from(c);
            }
        }
        let mut buf = vec![0; units.len() * UNICODE_UNIT];
        match descr.endian().resolve() {
            Endian::Big => BigEndian::write_u32_into(&units, &mut buf),
            _ => LittleEndian::write_u32_into(&units, &mut buf),
        }
        writer.write_all(&buf)?;
        Ok(())
    }

    fn read_to_end_exact_vec<R: io::Read>(
        mut reader: R,
        descr: &TypeDescriptor,
        len: usize,
    ) -> Result<Vec<Self>, ReadDataError> {
        check_data_type(Self::DATA_TYPE, descr)?;
        let width = descr.string_width();
        let bytes = read_data(&mut reader, len, descr.item_size())?;
        check_for_extra_bytes(&mut reader)?;
        if width == 0 {
            return Ok(vec![String::new(); len]);
        }
        let mut units = vec![0u32; bytes.len() / UNICODE_UNIT];
        match descr.endian().resolve() {
            Endian::Big => BigEndian::read_u32_into(&bytes, &mut units),
            _ => LittleEndian::read_u32_into(&bytes, &mut units),
        }
        units
            .chunks_exact(width)
            .map(|slot| {
                let end = slot.iter().rposition(|&unit| unit != 0).map_or(0, |last| last + 1);
                slot[..end]
                    .iter()
                    .map(|&unit| char::from_u32(unit).ok_or(ReadDataError::InvalidCodePoint(unit)))
                    .collect::<Result<String, _>>()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descr<T: Element>(values: &[T], endian: Endian) -> TypeDescriptor {
        T::type_descriptor(values, endian)
    }

    fn encode<T: Element>(values: &[T], endian: Endian) -> Vec<u8> {
        let mut out = Vec::new();
        T::write_slice(values, &descr(values, endian), &mut out).unwrap();
        out
    }

    #[test]
    fn multi_byte_byte_order() {
        assert_eq!(encode(&[0x0102u16], Endian::Big), [1, 2]);
        assert_eq!(encode(&[0x0102u16], Endian::Little), [2, 1]);
        assert_eq!(encode(&[-2i32], Endian::Big), [0xff, 0xff, 0xff, 0xfe]);
        assert_eq!(encode(&[1.0f64], Endian::Big), 1.0f64.to_be_bytes());
        assert_eq!(encode(&[1.5f32], Endian::Little), 1.5f32.to_le_bytes());
    }

    #[test]
    fn single_byte_descriptors_ignore_byte_order() {
        assert_eq!(descr(&[1u8], Endian::Big).to_string(), "|u1");
        assert_eq!(descr(&[-1i8], Endian::Little).to_string(), "|i1");
        assert_eq!(encode(&[-1i8, 2], Endian::Big), [0xff, 2]);
    }

    #[test]
    fn numeric_round_trip_both_orders() {
        let values = [i64::MIN, -1, 0, 1, i64::MAX];
        for endian in [Endian::Little, Endian::Big] {
            let bytes = encode(&values, endian);
            let d = descr(&values, endian);
            let back = i64::read_to_end_exact_vec(&bytes[..], &d, values.len()).unwrap();
            assert_eq!(back, values);
        }
    }

    #[test]
    fn wrong_data_type() {
        let d = descr(&[0u8], Endian::Native);
        assert!(matches!(
            f32::read_to_end_exact_vec(&[0u8; 4][..], &d, 1),
            Err(ReadDataError::WrongDataType {
                expected: DataType::Float32,
                found: DataType::UInt8,
            })
        ));
    }

    #[test]
    fn missing_and_extra_bytes() {
        let d = descr(&[0u16], Endian::Little);
        assert!(matches!(
            u16::read_to_end_exact_vec(&[0u8; 3][..], &d, 2),
            Err(ReadDataError::MissingData)
        ));
        assert!(matches!(
            u16::read_to_end_exact_vec(&[0u8; 7][..], &d, 2),
            Err(ReadDataError::ExtraBytes(3))
        ));
    }

    #[test]
    fn claimed_length_beyond_data_is_missing() {
        let d = descr(&[0f64], Endian::Little);
        assert!(matches!(
            f64::read_to_end_exact_vec(&[0u8; 16][..], &d, 1 << 45),
            Err(ReadDataError::MissingData)
        ));
        let d = TypeDescriptor::unicode(Endian::Big, 8).unwrap();
        assert!(matches!(
            String::read_to_end_exact_vec(&[][..], &d, usize::MAX / 2),
            Err(ReadDataError::MissingData)
        ));
    }

    #[test]
    fn string_width_and_padding() {
        let values = vec!["ab".to_string(), "".to_string(), "héllo".to_string()];
        let d = descr(&values, Endian::Little);
        assert_eq!(d.to_string(), "<U5");
        let bytes = encode(&values, Endian::Little);
        assert_eq!(bytes.len(), 3 * 5 * 4);
        assert_eq!(&bytes[..8], &[b'a', 0, 0, 0, b'b', 0, 0, 0]);
        assert!(bytes[20..40].iter().all(|&b| b == 0));
        let back = String::read_to_end_exact_vec(&bytes[..], &d, 3).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn empty_strings_use_width_one() {
        let values = vec![String::new(); 2];
        assert_eq!(descr(&values, Endian::Big).to_string(), ">U1");
        assert_eq!(encode(&values, Endian::Big), [0; 8]);
    }

    #[test]
    fn big_endian_strings() {
        let values = vec!["π".to_string()];
        let bytes = encode(&values, Endian::Big);
        assert_eq!(bytes, [0, 0, 0x03, 0xc0]);
        let d = descr(&values, Endian::Big);
        assert_eq!(String::read_to_end_exact_vec(&bytes[..], &d, 1).unwrap(), values);
    }

    #[test]
    fn string_longer_than_width_is_rejected() {
        let narrow = TypeDescriptor::unicode(Endian::Little, 2).unwrap();
        let mut out = Vec::new();
        assert!(matches!(
            String::write_slice(&["abc".to_string()], &narrow, &mut out),
            Err(WriteDataError::StringTooLong { length: 3, width: 2 })
        ));
    }

    #[test]
    fn invalid_code_point() {
        let d = TypeDescriptor::unicode(Endian::Little, 1).unwrap();
        let bytes = 0xD800u32.to_le_bytes();
        assert!(matches!(
            String::read_to_end_exact_vec(&bytes[..], &d, 1),
            Err(ReadDataError::InvalidCodePoint(0xD800))
        ));
    }
}
