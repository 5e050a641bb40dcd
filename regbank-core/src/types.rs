//! Register element types
//!
//! Every register holds one or more elements of a single primitive type.
//! Storage is packed little-endian, so an element's bytes are exactly what
//! the wire protocol carries.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Primitive type of a register's elements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RegisterType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    Float,
}

/// Flag bit set in the wire code of signed types
const SIGNED_FLAG: u8 = 0x80;
/// Flag bit set in the wire code of floating point types
const FLOAT_FLAG: u8 = 0x40;

impl RegisterType {
    /// Width of one element in bytes
    pub const fn width(self) -> usize {
        match self {
            RegisterType::U8 | RegisterType::I8 => 1,
            RegisterType::U16 | RegisterType::I16 => 2,
            RegisterType::U32 | RegisterType::I32 | RegisterType::Float => 4,
            RegisterType::U64 | RegisterType::I64 => 8,
        }
    }

    /// Type code carried on the wire
    ///
    /// The low bits hold the width, `0x80` marks signed and `0x40` marks
    /// floating point types.
    pub const fn code(self) -> u8 {
        let width = self.width() as u8;
        match self {
            RegisterType::U8 | RegisterType::U16 | RegisterType::U32 | RegisterType::U64 => width,
            RegisterType::I8 | RegisterType::I16 | RegisterType::I32 | RegisterType::I64 => {
                width | SIGNED_FLAG
            }
            RegisterType::Float => width | FLOAT_FLAG,
        }
    }

    /// Look up a type from its wire code
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(RegisterType::U8),
            0x02 => Some(RegisterType::U16),
            0x04 => Some(RegisterType::U32),
            0x08 => Some(RegisterType::U64),
            0x81 => Some(RegisterType::I8),
            0x82 => Some(RegisterType::I16),
            0x84 => Some(RegisterType::I32),
            0x88 => Some(RegisterType::I64),
            0x44 => Some(RegisterType::Float),
            _ => None,
        }
    }

    /// Check for a signed integer type
    pub const fn is_signed(self) -> bool {
        matches!(
            self,
            RegisterType::I8 | RegisterType::I16 | RegisterType::I32 | RegisterType::I64
        )
    }

    /// Check for an integer type
    pub const fn is_integer(self) -> bool {
        !matches!(self, RegisterType::Float)
    }

    /// Raw bits of the first element in `bytes`, zero extended
    ///
    /// Missing trailing bytes read as zero.
    pub fn bits(self, bytes: &[u8]) -> u64 {
        bytes
            .iter()
            .take(self.width())
            .enumerate()
            .fold(0u64, |acc, (i, &b)| acc | (u64::from(b) << (8 * i)))
    }

    /// Write the low `width` bytes of `value` into `out`
    pub fn encode_bits(self, value: u64, out: &mut [u8]) {
        for (i, byte) in out.iter_mut().take(self.width()).enumerate() {
            *byte = (value >> (8 * i)) as u8;
        }
    }

    /// Integer value of the first element, sign extended for signed types
    ///
    /// Returns `None` for floating point registers.
    pub fn integer(self, bytes: &[u8]) -> Option<i128> {
        if !self.is_integer() {
            return None;
        }
        let bits = self.bits(bytes);
        if self.is_signed() {
            let shift = 128 - 8 * self.width() as u32;
            Some(((bits as i128) << shift) >> shift)
        } else {
            Some(bits as i128)
        }
    }

    /// Floating point value of the first element
    ///
    /// Returns `None` for integer registers.
    pub fn float(self, bytes: &[u8]) -> Option<f32> {
        match self {
            RegisterType::Float => Some(f32::from_bits(self.bits(bytes) as u32)),
            _ => None,
        }
    }
}

/// Rust type that can be stored as a register element
pub trait Element: Copy {
    /// Matching register type
    const TYPE: RegisterType;

    /// Decode from little-endian bytes
    ///
    /// `bytes` must hold at least one element.
    fn read_le(bytes: &[u8]) -> Self;

    /// Encode into little-endian bytes
    ///
    /// `out` must hold at least one element.
    fn write_le(self, out: &mut [u8]);
}

macro_rules! impl_element {
    ($($ty:ty => $tag:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const TYPE: RegisterType = RegisterType::$tag;

                fn read_le(bytes: &[u8]) -> Self {
                    const WIDTH: usize = core::mem::size_of::<$ty>();
                    let mut raw = [0u8; WIDTH];
                    raw.copy_from_slice(&bytes[..WIDTH]);
                    <$ty>::from_le_bytes(raw)
                }

                fn write_le(self, out: &mut [u8]) {
                    let raw = self.to_le_bytes();
                    out[..raw.len()].copy_from_slice(&raw);
                }
            }
        )*
    };
}

impl_element! {
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => Float,
}

/// Decode element `index` of a register view
///
/// Returns `None` if the view is too short.
pub fn decode<T: Element>(view: &[u8], index: usize) -> Option<T> {
    let width = T::TYPE.width();
    view.get(index * width..(index + 1) * width).map(T::read_le)
}

/// Encode `values` back to back into `out`
///
/// Returns the number of bytes written, or `None` if `out` is too short.
pub fn encode<T: Element>(values: &[T], out: &mut [u8]) -> Option<usize> {
    let width = T::TYPE.width();
    let len = values.len() * width;
    let out = out.get_mut(..len)?;
    for (value, chunk) in values.iter().zip(out.chunks_exact_mut(width)) {
        value.write_le(chunk);
    }
    Some(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widths() {
        assert_eq!(RegisterType::U8.width(), 1);
        assert_eq!(RegisterType::I16.width(), 2);
        assert_eq!(RegisterType::Float.width(), 4);
        assert_eq!(RegisterType::I64.width(), 8);
    }

    #[test]
    fn test_wire_codes() {
        assert_eq!(RegisterType::U8.code(), 0x01);
        assert_eq!(RegisterType::I32.code(), 0x84);
        assert_eq!(RegisterType::Float.code(), 0x44);

        for ty in [
            RegisterType::U8,
            RegisterType::U16,
            RegisterType::U32,
            RegisterType::U64,
            RegisterType::I8,
            RegisterType::I16,
            RegisterType::I32,
            RegisterType::I64,
            RegisterType::Float,
        ] {
            assert_eq!(RegisterType::from_code(ty.code()), Some(ty));
        }
        assert_eq!(RegisterType::from_code(0x03), None);
    }

    #[test]
    fn test_integer_sign_extension() {
        assert_eq!(RegisterType::I8.integer(&[0xFF]), Some(-1));
        assert_eq!(RegisterType::U8.integer(&[0xFF]), Some(255));
        assert_eq!(RegisterType::I16.integer(&[0x00, 0x80]), Some(-32768));
        assert_eq!(RegisterType::U32.integer(&[1, 0, 0, 0]), Some(1));
        assert_eq!(RegisterType::Float.integer(&[0, 0, 0, 0]), None);
    }

    #[test]
    fn test_float_decode() {
        let bytes = 1.5f32.to_le_bytes();
        assert_eq!(RegisterType::Float.float(&bytes), Some(1.5));
        assert_eq!(RegisterType::U32.float(&bytes), None);
    }

    #[test]
    fn test_encode_bits_truncates() {
        let mut out = [0xAAu8; 4];
        RegisterType::U16.encode_bits(0x1234_5678, &mut out);
        assert_eq!(out, [0x78, 0x56, 0xAA, 0xAA]);
    }

    #[test]
    fn test_element_codec() {
        let mut buf = [0u8; 12];
        assert_eq!(encode(&[1u32, 2, 3], &mut buf), Some(12));
        assert_eq!(decode::<u32>(&buf, 2), Some(3));
        assert_eq!(decode::<u32>(&buf, 3), None);
        assert_eq!(encode(&[1u32, 2, 3, 4], &mut buf), None);
    }

    #[test]
    fn test_read_le_uses_leading_bytes() {
        let bytes = [0x34, 0x12, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
        assert_eq!(u16::read_le(&bytes), 0x1234);
        assert_eq!(i8::read_le(&bytes), 0x34);
        assert_eq!(u64::read_le(&bytes), 0xFFFF_FFFF_FFFF_1234);
        assert_eq!(i32::read_le(&[0xFF, 0xFF, 0xFF, 0xFF, 0x00]), -1);
    }
}
