/* Shared byte storage and byte-addressed typed views */

use crate::errors::{StructError, StructResult};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/* Byte order for typed reads and writes */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

/// A fixed-capacity, shareable byte region. Clones alias the same bytes.
#[derive(Clone, Default)]
pub struct ByteBuffer {
    bytes: Rc<RefCell<Vec<u8>>>,
}

impl ByteBuffer {
    /* Allocate a zeroed region */
    pub fn new(byte_length: usize) -> Self {
        Self::from_vec(vec![0u8; byte_length])
    }

    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Rc::new(RefCell::new(bytes)),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /* Copy of the full contents */
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.borrow().clone()
    }

    /* True when both handles refer to the same storage */
    pub fn ptr_eq(&self, other: &ByteBuffer) -> bool {
        Rc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("byte_length", &self.len())
            .finish()
    }
}

/// A window `[byte_offset, byte_offset + byte_length)` into a [`ByteBuffer`].
#[derive(Clone, Debug)]
pub struct BufferView {
    buffer: ByteBuffer,
    byte_offset: usize,
    byte_length: usize,
}

macro_rules! typed_accessors {
    ($($get:ident, $set:ident, $ty:ty, $n:literal;)*) => {
        $(
            pub fn $get(&self, offset: usize, endian: Endian) -> StructResult<$ty> {
                let bytes = self.read::<$n>(offset)?;
                Ok(match endian {
                    Endian::Little => <$ty>::from_le_bytes(bytes),
                    Endian::Big => <$ty>::from_be_bytes(bytes),
                })
            }

            pub fn $set(&self, offset: usize, value: $ty, endian: Endian) -> StructResult<()> {
                let bytes = match endian {
                    Endian::Little => value.to_le_bytes(),
                    Endian::Big => value.to_be_bytes(),
                };
                self.write(offset, &bytes)
            }
        )*
    };
}

impl BufferView {
    /// Creates a view, failing when the window does not fit in the buffer.
    pub fn new(buffer: &ByteBuffer, byte_offset: usize, byte_length: usize) -> StructResult<Self> {
        let available = buffer.len().saturating_sub(byte_offset);
        if byte_offset > buffer.len() || byte_length > available {
            return Err(StructError::InsufficientCapacity {
                required: byte_length,
                available,
            });
        }
        Ok(Self {
            buffer: buffer.clone(),
            byte_offset,
            byte_length,
        })
    }

    /* View spanning the whole buffer */
    pub fn whole(buffer: &ByteBuffer) -> Self {
        Self {
            buffer: buffer.clone(),
            byte_offset: 0,
            byte_length: buffer.len(),
        }
    }

    pub fn buffer(&self) -> &ByteBuffer {
        &self.buffer
    }

    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    pub fn byte_length(&self) -> usize {
        self.byte_length
    }

    /* Narrower window relative to this view; shares storage */
    pub fn subview(&self, offset: usize, byte_length: usize) -> StructResult<Self> {
        self.check(offset, byte_length)?;
        Ok(Self {
            buffer: self.buffer.clone(),
            byte_offset: self.byte_offset + offset,
            byte_length,
        })
    }

    /* Copy of the viewed bytes */
    pub fn to_vec(&self) -> Vec<u8> {
        let bytes = self.buffer.bytes.borrow();
        bytes[self.byte_offset..self.byte_offset + self.byte_length].to_vec()
    }

    pub fn read<const N: usize>(&self, offset: usize) -> StructResult<[u8; N]> {
        self.check(offset, N)?;
        let start = self.byte_offset + offset;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.buffer.bytes.borrow()[start..start + N]);
        Ok(out)
    }

    pub fn write(&self, offset: usize, data: &[u8]) -> StructResult<()> {
        self.check(offset, data.len())?;
        let start = self.byte_offset + offset;
        self.buffer.bytes.borrow_mut()[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }

    /* Overwrite this view's leading bytes with the contents of `source` */
    pub fn copy_from(&self, offset: usize, source: &BufferView) -> StructResult<()> {
        let data = source.to_vec();
        self.write(offset, &data)
    }

    pub fn get_bool(&self, offset: usize) -> StructResult<bool> {
        Ok(self.read::<1>(offset)?[0] != 0)
    }

    pub fn set_bool(&self, offset: usize, value: bool) -> StructResult<()> {
        self.write(offset, &[u8::from(value)])
    }

    typed_accessors! {
        get_int8, set_int8, i8, 1;
        get_int16, set_int16, i16, 2;
        get_int32, set_int32, i32, 4;
        get_int64, set_int64, i64, 8;
        get_uint8, set_uint8, u8, 1;
        get_uint16, set_uint16, u16, 2;
        get_uint32, set_uint32, u32, 4;
        get_uint64, set_uint64, u64, 8;
        get_float32, set_float32, f32, 4;
        get_float64, set_float64, f64, 8;
    }

    fn check(&self, offset: usize, size: usize) -> StructResult<()> {
        match offset.checked_add(size) {
            Some(end) if end <= self.byte_length => Ok(()),
            _ => Err(StructError::OutOfBounds {
                offset,
                size,
                byte_length: self.byte_length,
            }),
        }
    }
}
