use crate::android::chunk::ChunkHeader;
use crate::android::error::{AxmlError, AxmlResult};
use crate::android::reader::ByteReader;
use bitflags::bitflags;
use log::trace;

/// Index value meaning "no string".
pub const NO_ENTRY_INDEX: u32 = 0xFFFF_FFFF;

bitflags! {
    /// Flags word of a `ResStringPool_header`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct StringPoolFlags: u32 {
        const SORTED = 0x0000_0001;
        const UTF8 = 0x0000_0100;
    }
}

/// Decoded pooled strings, addressed by index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringPool {
    strings: Vec<String>,
    flags: StringPoolFlags,
}

impl Default for StringPoolFlags {
    fn default() -> Self {
        StringPoolFlags::empty()
    }
}

impl StringPool {
    /// Decode the string pool chunk described by `header`.
    ///
    /// The pool header and offset table must fit inside the chunk; an
    /// individual string that cannot be decoded becomes `""` so later
    /// indices stay aligned.
    pub fn parse(reader: &ByteReader<'_>, header: &ChunkHeader) -> AxmlResult<Self> {
        let field = |relative: usize, what: &str| {
            reader
                .read_u32(header.at(relative))
                .filter(|_| header.at(relative) + 4 <= header.end())
                .ok_or_else(|| AxmlError::MalformedStringPool(format!("missing {what}")))
        };

        let string_count = field(8, "string count")? as usize;
        let _style_count = field(12, "style count")?;
        let flags = StringPoolFlags::from_bits_retain(field(16, "flags")?);
        let strings_start = field(20, "strings start")? as usize;
        let _styles_start = field(24, "styles start")?;

        let offsets_start = header.body_start();
        let offsets_len = string_count.checked_mul(4).ok_or_else(|| {
            AxmlError::MalformedStringPool(format!("string count {string_count} overflows"))
        })?;
        if offsets_start
            .checked_add(offsets_len)
            .map_or(true, |end| end > header.end())
        {
            return Err(AxmlError::MalformedStringPool(format!(
                "offset table for {string_count} strings does not fit in chunk"
            )));
        }

        let strings_base = header.at(strings_start);
        let limit = header.end();
        let utf8 = flags.contains(StringPoolFlags::UTF8);

        let mut strings = Vec::with_capacity(string_count);
        for index in 0..string_count {
            let decoded = reader
                .read_u32(offsets_start + index * 4)
                .and_then(|offset| strings_base.checked_add(offset as usize))
                .and_then(|absolute| {
                    if utf8 {
                        read_utf8_string(reader, absolute, limit)
                    } else {
                        read_utf16_string(reader, absolute, limit)
                    }
                });
            match decoded {
                Some(text) => strings.push(text),
                None => {
                    trace!("string pool entry {index} could not be decoded");
                    strings.push(String::new());
                }
            }
        }

        Ok(StringPool { strings, flags })
    }

    pub fn from_strings(strings: Vec<String>) -> Self {
        StringPool {
            strings,
            flags: StringPoolFlags::empty(),
        }
    }

    pub fn get(&self, idx: u32) -> Option<&str> {
        if idx == NO_ENTRY_INDEX {
            return None;
        }
        self.strings.get(idx as usize).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn is_utf8(&self) -> bool {
        self.flags.contains(StringPoolFlags::UTF8)
    }

    pub fn strings(&self) -> &[String] {
        &self.strings
    }
}

fn read_utf8_string(reader: &ByteReader<'_>, offset: usize, limit: usize) -> Option<String> {
    let (_char_len, char_len_size) = reader.read_length8(offset)?;
    let mut cursor = offset + char_len_size;
    let (byte_len, byte_len_size) = reader.read_length8(cursor)?;
    cursor += byte_len_size;
    let end = cursor.checked_add(byte_len)?;
    if end >= limit {
        return None;
    }
    let raw = reader.bytes(cursor, byte_len)?;
    if reader.read_u8(end)? != 0 {
        return None;
    }
    Some(String::from_utf8_lossy(raw).into_owned())
}

fn read_utf16_string(reader: &ByteReader<'_>, offset: usize, limit: usize) -> Option<String> {
    let (unit_count, header_bytes) = reader.read_length16(offset)?;
    let cursor = offset + header_bytes;
    let byte_len = unit_count.checked_mul(2)?;
    let end = cursor.checked_add(byte_len)?;
    if end.checked_add(2)? > limit {
        return None;
    }
    let raw = reader.bytes(cursor, byte_len)?;
    if reader.read_u16(end)? != 0 {
        return None;
    }
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    Some(String::from_utf16_lossy(&units))
}
