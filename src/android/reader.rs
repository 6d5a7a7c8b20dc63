/// Bounds-checked little-endian reads over a borrowed buffer.
///
/// Every accessor takes an absolute offset and returns `None` instead of
/// panicking when the value would extend past the end of the data.
#[derive(Clone, Copy, Debug)]
pub struct ByteReader<'a> {
    data: &'a [u8],
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteReader { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Borrow `len` bytes at `offset`.
    pub fn bytes(&self, offset: usize, len: usize) -> Option<&'a [u8]> {
        let end = offset.checked_add(len)?;
        self.data.get(offset..end)
    }

    pub fn read_u8(&self, offset: usize) -> Option<u8> {
        self.data.get(offset).copied()
    }

    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        let raw = self.bytes(offset, 2)?;
        Some(u16::from_le_bytes([raw[0], raw[1]]))
    }

    pub fn read_u32(&self, offset: usize) -> Option<u32> {
        let raw = self.bytes(offset, 4)?;
        Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    pub fn read_i32(&self, offset: usize) -> Option<i32> {
        self.read_u32(offset).map(|value| value as i32)
    }

    /// Length prefix used by UTF-8 pool strings: one byte when the high bit
    /// is clear, otherwise two bytes carrying a 15-bit value.
    ///
    /// Returns the value and the number of bytes consumed.
    pub fn read_length8(&self, offset: usize) -> Option<(usize, usize)> {
        let first = self.read_u8(offset)?;
        if first & 0x80 == 0 {
            return Some((first as usize, 1));
        }
        let second = self.read_u8(offset.checked_add(1)?)?;
        Some(((((first & 0x7F) as usize) << 8) | second as usize, 2))
    }

    /// Length prefix used by UTF-16 pool strings: one unit when bit 15 is
    /// clear, otherwise two units with the first unit's low 15 bits on top.
    ///
    /// Returns the value (in 16-bit units) and the number of bytes consumed.
    pub fn read_length16(&self, offset: usize) -> Option<(usize, usize)> {
        let first = self.read_u16(offset)?;
        if first & 0x8000 == 0 {
            return Some((first as usize, 2));
        }
        let second = self.read_u16(offset.checked_add(2)?)?;
        Some(((((first & 0x7FFF) as usize) << 16) | second as usize, 4))
    }
}
