use crate::android::error::{AxmlError, AxmlResult};
use crate::android::reader::ByteReader;

pub const RES_STRING_POOL_TYPE: u16 = 0x0001;
pub const RES_XML_TYPE: u16 = 0x0003;
pub const RES_XML_START_NAMESPACE_TYPE: u16 = 0x0100;
pub const RES_XML_END_NAMESPACE_TYPE: u16 = 0x0101;
pub const RES_XML_START_ELEMENT_TYPE: u16 = 0x0102;
pub const RES_XML_END_ELEMENT_TYPE: u16 = 0x0103;
pub const RES_XML_CDATA_TYPE: u16 = 0x0104;
pub const RES_XML_RESOURCE_MAP_TYPE: u16 = 0x0180;

/// Size of the `(type, headerSize, chunkSize)` prefix every chunk carries.
pub const CHUNK_HEADER_SIZE: usize = 8;

/// The chunk kinds the manifest walker cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkType {
    StringPool,
    Xml,
    StartNamespace,
    EndNamespace,
    StartElement,
    EndElement,
    CData,
    ResourceMap,
    Other(u16),
}

impl From<u16> for ChunkType {
    fn from(value: u16) -> Self {
        match value {
            RES_STRING_POOL_TYPE => ChunkType::StringPool,
            RES_XML_TYPE => ChunkType::Xml,
            RES_XML_START_NAMESPACE_TYPE => ChunkType::StartNamespace,
            RES_XML_END_NAMESPACE_TYPE => ChunkType::EndNamespace,
            RES_XML_START_ELEMENT_TYPE => ChunkType::StartElement,
            RES_XML_END_ELEMENT_TYPE => ChunkType::EndElement,
            RES_XML_CDATA_TYPE => ChunkType::CData,
            RES_XML_RESOURCE_MAP_TYPE => ChunkType::ResourceMap,
            other => ChunkType::Other(other),
        }
    }
}

/// A validated chunk header. `start + chunk_size` never exceeds the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    pub chunk_type: ChunkType,
    pub header_size: usize,
    pub chunk_size: usize,
    pub start: usize,
}

impl ChunkHeader {
    pub fn end(&self) -> usize {
        self.start + self.chunk_size
    }

    /// First byte after the chunk's own header.
    pub fn body_start(&self) -> usize {
        self.start + self.header_size
    }

    /// Absolute offset of a field located `relative` bytes into the chunk.
    pub fn at(&self, relative: usize) -> usize {
        self.start + relative
    }
}

/// Read and validate the chunk header at `start`.
pub fn read_chunk_header(reader: &ByteReader<'_>, start: usize) -> AxmlResult<ChunkHeader> {
    let (Some(raw_type), Some(header_size), Some(chunk_size)) = (
        reader.read_u16(start),
        reader.read_u16(start.saturating_add(2)),
        reader.read_u32(start.saturating_add(4)),
    ) else {
        return Err(AxmlError::Truncated(format!(
            "chunk header at offset {start} runs past end of buffer"
        )));
    };

    let header_size = header_size as usize;
    let chunk_size = chunk_size as usize;
    if header_size < CHUNK_HEADER_SIZE {
        return Err(AxmlError::InvalidChunk(format!(
            "header size {header_size} at offset {start} is smaller than a chunk header"
        )));
    }
    if header_size > chunk_size {
        return Err(AxmlError::InvalidChunk(format!(
            "header size {header_size} exceeds chunk size {chunk_size} at offset {start}"
        )));
    }
    let end = start.checked_add(chunk_size).ok_or_else(|| {
        AxmlError::InvalidChunk(format!("chunk size overflow at offset {start}"))
    })?;
    if end > reader.len() {
        return Err(AxmlError::Truncated(format!(
            "chunk at offset {start} declares {chunk_size} bytes, only {} remain",
            reader.len() - start
        )));
    }

    Ok(ChunkHeader {
        chunk_type: ChunkType::from(raw_type),
        header_size,
        chunk_size,
        start,
    })
}
