/* Class descriptors from the string_ids / type_ids tables of a dex file */

use crate::dex::error::DexError;
use crate::dex::{read_u1, read_u4, read_uleb128};
use log::{debug, trace};

pub const DEX_MAGIC_PREFIX: [u8; 4] = [0x64, 0x65, 0x78, 0x0a];
pub const HEADER_SIZE: usize = 0x70;

const STRING_IDS_SIZE_OFFSET: usize = 0x38;

/// The id-table locations from the dex header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdTables
{
    pub string_ids_size: u32,
    pub string_ids_off: u32,
    pub type_ids_size: u32,
    pub type_ids_off: u32,
}

impl IdTables
{
    pub fn read(bytes: &[u8]) -> Result<IdTables, DexError>
    {
        if bytes.len() < HEADER_SIZE {
            return Err(DexError::new("Not enough bytes for header"));
        }
        if bytes[..4] != DEX_MAGIC_PREFIX {
            return Err(DexError::new("Invalid magic value"));
        }

        let mut ix = STRING_IDS_SIZE_OFFSET;
        Ok(IdTables {
            string_ids_size: read_u4(bytes, &mut ix)?,
            string_ids_off: read_u4(bytes, &mut ix)?,
            type_ids_size: read_u4(bytes, &mut ix)?,
            type_ids_off: read_u4(bytes, &mut ix)?,
        })
    }

    /// Number of type ids that can actually be present in `len` bytes.
    fn readable_type_ids(&self, len: usize) -> usize
    {
        let available = len.saturating_sub(self.type_ids_off as usize) / 4;
        available.min(self.type_ids_size as usize)
    }
}

/// Read the `string_data_item` at `offset`: a uleb128 utf16 length, then
/// MUTF-8 bytes up to a NUL.
pub fn read_dex_string(bytes: &[u8], offset: usize) -> Result<String, DexError>
{
    let mut ix = offset;
    let _utf16_size = read_uleb128(bytes, &mut ix)?;
    let mut v = vec![];

    loop
    {
        let u = read_u1(bytes, &mut ix)?;
        if u != 0 { v.push(u); }
        else { break; }
    }

    match cesu8::from_java_cesu8(v.as_slice())
    {
        Ok(converted_str) => Ok(converted_str.into_owned()),
        Err(_) => Err(DexError::new("Invalid modified UTF-8 string")),
    }
}

/// `Lcom/acme/Foo;` becomes `com.acme.Foo`; array and primitive descriptors
/// give `None`.
pub fn descriptor_to_class_name(descriptor: &str) -> Option<String>
{
    let inner = descriptor.strip_prefix('L')?.strip_suffix(';')?;
    if inner.is_empty() {
        return None;
    }
    Some(inner.replace('/', "."))
}

/// The string behind type id `type_idx`.
pub fn type_descriptor(bytes: &[u8], ids: &IdTables, type_idx: usize) -> Result<String, DexError>
{
    let Some(mut ix) = type_idx.checked_mul(4).and_then(|rel| rel.checked_add(ids.type_ids_off as usize)) else {
        fail!(("type id offset overflows"), ("type id {}", type_idx));
    };
    let descriptor_idx = read_u4(bytes, &mut ix)?;
    if descriptor_idx >= ids.string_ids_size {
        fail!(("descriptor index {} out of range", descriptor_idx), ("type id {}", type_idx));
    }

    let Some(mut ix) = (descriptor_idx as usize).checked_mul(4).and_then(|rel| rel.checked_add(ids.string_ids_off as usize)) else {
        fail!(("string id offset overflows"), ("type id {}", type_idx));
    };
    let string_data_off = read_u4(bytes, &mut ix)
        .map_err(|e| DexError::with_context(e, format!("type id {}", type_idx)))?;
    read_dex_string(bytes, string_data_off as usize)
        .map_err(|e| DexError::with_context(e, format!("type id {}", type_idx)))
}

/// Dotted class names for every object type in the dex type table, in
/// type-id order. Entries that cannot be read are left out.
pub fn extract_class_descriptors(bytes: &[u8]) -> Vec<String>
{
    let ids = match IdTables::read(bytes) {
        Ok(ids) => ids,
        Err(err) => {
            debug!("not reading dex type table: {}", err);
            return vec![];
        }
    };

    let count = ids.readable_type_ids(bytes.len());
    if count < ids.type_ids_size as usize {
        debug!("dex declares {} type ids, only {} fit", ids.type_ids_size, count);
    }

    let mut classes = Vec::with_capacity(count);
    for type_idx in 0..count
    {
        match type_descriptor(bytes, &ids, type_idx) {
            Ok(descriptor) => match descriptor_to_class_name(&descriptor) {
                Some(name) => classes.push(name),
                None => trace!("type id {} is not a class: {:?}", type_idx, descriptor),
            },
            Err(err) => trace!("skipping {}", err),
        }
    }
    classes
}
