//! DEX class descriptor extraction.

#[macro_use]
pub mod error;

pub mod descriptors;
pub(crate) mod leb;

use crate::dex::error::DexError;
use crate::dex::leb::decode_uleb128;

// Basic type reading
pub(crate) fn read_u1(bytes: &[u8], ix: &mut usize) -> Result<u8, DexError>
{
    let Some(&result) = bytes.get(*ix) else {
        fail!("Unexpected end of stream reading u1 at index {}", *ix);
    };
    *ix += 1;
    Ok(result)
}

pub(crate) fn read_u4(bytes: &[u8], ix: &mut usize) -> Result<u32, DexError>
{
    let Some(raw) = ix.checked_add(4).and_then(|end| bytes.get(*ix..end)) else {
        fail!("Unexpected end of stream reading u4 at index {}", *ix);
    };
    let result = ((raw[3] as u32) << 24) | ((raw[2] as u32) << 16) | ((raw[1] as u32) << 8) | (raw[0] as u32);
    *ix += 4;
    Ok(result)
}

pub(crate) fn read_uleb128(bytes: &[u8], ix: &mut usize) -> Result<u32, DexError>
{
    let Some((val, size)) = bytes.get(*ix..).and_then(decode_uleb128) else {
        fail!("Unexpected end of stream reading uleb128 at index {}", *ix);
    };
    *ix += size;
    Ok(val)
}

#[cfg(test)]
pub(crate) fn write_u4(buffer: &mut Vec<u8>, val: u32) -> usize
{
    buffer.extend_from_slice(&val.to_le_bytes());
    4
}

#[cfg(test)]
pub(crate) fn write_uleb128(buffer: &mut Vec<u8>, val: u32) -> usize
{
    let encoded = crate::dex::leb::encode_uleb128(val);
    let c = encoded.len();
    buffer.extend(encoded);
    c
}
