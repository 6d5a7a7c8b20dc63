//! Writers for synthetic AXML and DEX buffers.

use crate::android::binary_xml::ANDROID_NAMESPACE_URI;
use crate::android::chunk::{
    RES_STRING_POOL_TYPE, RES_XML_END_ELEMENT_TYPE, RES_XML_END_NAMESPACE_TYPE,
    RES_XML_RESOURCE_MAP_TYPE, RES_XML_START_ELEMENT_TYPE, RES_XML_START_NAMESPACE_TYPE,
    RES_XML_TYPE,
};
use crate::android::resource_map::framework_attribute_name;
use crate::android::string_pool::{StringPoolFlags, NO_ENTRY_INDEX};
use crate::android::typed_value::{
    TYPE_INT_BOOLEAN, TYPE_INT_DEC, TYPE_INT_HEX, TYPE_REFERENCE, TYPE_STRING,
};
use crate::dex::descriptors::HEADER_SIZE;
use crate::dex::{write_u4, write_uleb128};
use std::collections::BTreeMap;

pub(crate) fn write_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

pub(crate) fn write_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn write_u8(buf: &mut Vec<u8>, value: u8) {
    buf.push(value);
}

/// UTF-16 pool entry. Lengths of 0x7FFF and above use the two-unit form.
pub(crate) fn write_utf16_string(buf: &mut Vec<u8>, text: &str) {
    let units: Vec<u16> = text.encode_utf16().collect();
    write_utf16_length(buf, units.len());
    for unit in units {
        write_u16(buf, unit);
    }
    write_u16(buf, 0);
}

pub(crate) fn write_utf16_length(buf: &mut Vec<u8>, len: usize) {
    if len < 0x7FFF {
        write_u16(buf, len as u16);
    } else {
        let first = 0x8000 | ((len >> 16) as u16 & 0x7FFF);
        let second = (len & 0xFFFF) as u16;
        write_u16(buf, first);
        write_u16(buf, second);
    }
}

fn write_utf8_length(buf: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        write_u8(buf, len as u8);
    } else {
        write_u8(buf, 0x80 | ((len >> 8) as u8 & 0x7F));
        write_u8(buf, (len & 0xFF) as u8);
    }
}

fn write_utf8_string(buf: &mut Vec<u8>, text: &str) {
    write_utf8_length(buf, text.chars().count());
    write_utf8_length(buf, text.len());
    buf.extend_from_slice(text.as_bytes());
    write_u8(buf, 0);
}

fn align_to_four(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

pub(crate) fn begin_chunk(buf: &mut Vec<u8>, chunk_type: u16, header_size: u16) -> usize {
    let start = buf.len();
    write_u16(buf, chunk_type);
    write_u16(buf, header_size);
    write_u32(buf, 0); // placeholder for chunk size
    start
}

pub(crate) fn finalize_chunk(buf: &mut Vec<u8>, chunk_start: usize) {
    align_to_four(buf);
    let size = (buf.len() - chunk_start) as u32;
    buf[chunk_start + 4..chunk_start + 8].copy_from_slice(&size.to_le_bytes());
}

pub(crate) struct StringPoolBuilder {
    strings: Vec<String>,
    indices: BTreeMap<String, u32>,
    utf8: bool,
}

impl StringPoolBuilder {
    pub(crate) fn new() -> Self {
        StringPoolBuilder {
            strings: Vec::new(),
            indices: BTreeMap::new(),
            utf8: false,
        }
    }

    pub(crate) fn from_strings(strings: &[&str]) -> Self {
        let mut builder = StringPoolBuilder::new();
        for s in strings {
            builder.push(s);
        }
        builder
    }

    pub(crate) fn utf8(mut self) -> Self {
        self.utf8 = true;
        self
    }

    pub(crate) fn intern(&mut self, value: impl AsRef<str>) -> u32 {
        let value = value.as_ref();
        if let Some(&idx) = self.indices.get(value) {
            return idx;
        }
        self.push(value)
    }

    /// Append without de-duplication.
    pub(crate) fn push(&mut self, value: &str) -> u32 {
        let idx = self.strings.len() as u32;
        self.strings.push(value.to_string());
        self.indices.entry(value.to_string()).or_insert(idx);
        idx
    }

    pub(crate) fn index_of(&self, value: &str) -> Option<u32> {
        self.indices.get(value).copied()
    }

    /// Replace the text at `idx` with `""`, keeping every index stable.
    pub(crate) fn blank(&mut self, idx: u32) {
        if let Some(s) = self.strings.get_mut(idx as usize) {
            s.clear();
        }
    }

    pub(crate) fn to_chunk(&self) -> Vec<u8> {
        let string_count = self.strings.len() as u32;
        let header_size = 28u16;
        let strings_start = header_size as u32 + string_count * 4;
        let mut string_data = Vec::new();
        let mut offsets = Vec::with_capacity(self.strings.len());
        for s in &self.strings {
            offsets.push(string_data.len() as u32);
            if self.utf8 {
                write_utf8_string(&mut string_data, s);
            } else {
                write_utf16_string(&mut string_data, s);
            }
        }
        align_to_four(&mut string_data);

        let flags = if self.utf8 { StringPoolFlags::UTF8 } else { StringPoolFlags::empty() };
        let mut chunk = Vec::new();
        write_u16(&mut chunk, RES_STRING_POOL_TYPE);
        write_u16(&mut chunk, header_size);
        write_u32(&mut chunk, 0); // chunk size placeholder
        write_u32(&mut chunk, string_count);
        write_u32(&mut chunk, 0); // style count
        write_u32(&mut chunk, flags.bits());
        write_u32(&mut chunk, strings_start);
        write_u32(&mut chunk, 0); // stylesStart
        for offset in offsets {
            write_u32(&mut chunk, offset);
        }
        chunk.extend_from_slice(&string_data);
        align_to_four(&mut chunk);
        let chunk_size = chunk.len() as u32;
        chunk[4..8].copy_from_slice(&chunk_size.to_le_bytes());
        chunk
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Value {
    Str(String),
    Int(i32),
    Hex(u32),
    Bool(bool),
    Ref(u32),
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Attr {
    android: bool,
    name: String,
    value: Value,
}

/// An `android:`-namespaced attribute.
pub(crate) fn android(name: &str, value: impl Into<Value>) -> Attr {
    Attr {
        android: true,
        name: name.to_string(),
        value: value.into(),
    }
}

/// An attribute without namespace, like `package`.
pub(crate) fn plain(name: &str, value: impl Into<Value>) -> Attr {
    Attr {
        android: false,
        name: name.to_string(),
        value: value.into(),
    }
}

#[derive(Clone, Debug)]
enum Event {
    Start(String, Vec<Attr>),
    End(String),
}

/// Builds a complete binary XML document from start/end element events.
pub(crate) struct AxmlBuilder {
    events: Vec<Event>,
    utf8: bool,
    resource_map: bool,
    blank_attribute_names: bool,
    namespace_prefix: String,
    namespace_chunks: bool,
}

impl AxmlBuilder {
    pub(crate) fn new() -> Self {
        AxmlBuilder {
            events: vec![],
            utf8: false,
            resource_map: true,
            blank_attribute_names: false,
            namespace_prefix: "android".to_string(),
            namespace_chunks: true,
        }
    }

    pub(crate) fn utf8(mut self) -> Self {
        self.utf8 = true;
        self
    }

    pub(crate) fn without_resource_map(mut self) -> Self {
        self.resource_map = false;
        self
    }

    /// Blank the pool strings of attribute names that have a resource id,
    /// as obfuscators do.
    pub(crate) fn blank_attribute_names(mut self) -> Self {
        self.blank_attribute_names = true;
        self
    }

    /// Declare the android namespace under another prefix.
    pub(crate) fn namespace_prefix(mut self, prefix: &str) -> Self {
        self.namespace_prefix = prefix.to_string();
        self
    }

    /// Leave out the start/end namespace chunks; attributes still carry
    /// the namespace uri.
    pub(crate) fn without_namespace_chunks(mut self) -> Self {
        self.namespace_chunks = false;
        self
    }

    pub(crate) fn start(mut self, tag: &str, attrs: Vec<Attr>) -> Self {
        self.events.push(Event::Start(tag.to_string(), attrs));
        self
    }

    pub(crate) fn end(mut self, tag: &str) -> Self {
        self.events.push(Event::End(tag.to_string()));
        self
    }

    /// `<tag .../>`
    pub(crate) fn leaf(self, tag: &str, attrs: Vec<Attr>) -> Self {
        self.start(tag, attrs).end(tag)
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut pool = if self.utf8 {
            StringPoolBuilder::new().utf8()
        } else {
            StringPoolBuilder::new()
        };

        // Attribute names with resource ids go first, one id per entry.
        let mut resource_ids = vec![];
        if self.resource_map {
            for event in &self.events {
                if let Event::Start(_, attrs) = event {
                    for attr in attrs.iter().filter(|a| a.android) {
                        if pool.index_of(&attr.name).is_some() {
                            continue;
                        }
                        if let Some(id) = framework_id(&attr.name) {
                            pool.intern(&attr.name);
                            resource_ids.push(id);
                        }
                    }
                }
            }
        }

        let prefix_idx = pool.intern(&self.namespace_prefix);
        let uri_idx = pool.intern(ANDROID_NAMESPACE_URI);
        for event in &self.events {
            match event {
                Event::Start(tag, attrs) => {
                    pool.intern(tag);
                    for attr in attrs {
                        pool.intern(&attr.name);
                        if let Value::Str(text) = &attr.value {
                            pool.intern(text);
                        }
                    }
                }
                Event::End(tag) => {
                    pool.intern(tag);
                }
            }
        }

        let mut body = Vec::new();
        if self.namespace_chunks {
            write_namespace(&mut body, RES_XML_START_NAMESPACE_TYPE, prefix_idx, uri_idx);
        }
        for event in &self.events {
            match event {
                Event::Start(tag, attrs) => write_start_element(&mut body, &pool, tag, attrs, uri_idx),
                Event::End(tag) => write_end_element(&mut body, &pool, tag),
            }
        }
        if self.namespace_chunks {
            write_namespace(&mut body, RES_XML_END_NAMESPACE_TYPE, prefix_idx, uri_idx);
        }

        if self.blank_attribute_names {
            for idx in 0..resource_ids.len() {
                pool.blank(idx as u32);
            }
        }

        let mut document = Vec::new();
        let xml_start = begin_chunk(&mut document, RES_XML_TYPE, 8);
        document.extend_from_slice(&pool.to_chunk());
        if !resource_ids.is_empty() {
            let map_start = begin_chunk(&mut document, RES_XML_RESOURCE_MAP_TYPE, 8);
            for id in &resource_ids {
                write_u32(&mut document, *id);
            }
            finalize_chunk(&mut document, map_start);
        }
        document.extend_from_slice(&body);
        finalize_chunk(&mut document, xml_start);
        document
    }
}

fn framework_id(name: &str) -> Option<u32> {
    (0x0101_0000..0x0101_0300).find(|id| framework_attribute_name(*id) == Some(name))
}

fn write_namespace(buf: &mut Vec<u8>, chunk_type: u16, prefix_idx: u32, uri_idx: u32) {
    let chunk_start = begin_chunk(buf, chunk_type, 16);
    write_u32(buf, 1); // line number
    write_u32(buf, NO_ENTRY_INDEX);
    write_u32(buf, prefix_idx);
    write_u32(buf, uri_idx);
    finalize_chunk(buf, chunk_start);
}

fn write_start_element(
    buf: &mut Vec<u8>,
    pool: &StringPoolBuilder,
    tag: &str,
    attrs: &[Attr],
    uri_idx: u32,
) {
    let chunk_start = begin_chunk(buf, RES_XML_START_ELEMENT_TYPE, 16);
    write_u32(buf, 1); // line number
    write_u32(buf, NO_ENTRY_INDEX);
    write_u32(buf, NO_ENTRY_INDEX);
    write_u32(buf, pool.index_of(tag).unwrap_or(NO_ENTRY_INDEX));
    write_u16(buf, 20); // attributeStart
    write_u16(buf, 20); // attributeSize
    write_u16(buf, attrs.len() as u16);
    write_u16(buf, 0); // idIndex
    write_u16(buf, 0); // classIndex
    write_u16(buf, 0); // styleIndex
    for attr in attrs {
        let ns_idx = if attr.android { uri_idx } else { NO_ENTRY_INDEX };
        let name_idx = pool.index_of(&attr.name).unwrap_or(NO_ENTRY_INDEX);
        let (raw_idx, data_type, data) = match &attr.value {
            Value::Str(text) => {
                let idx = pool.index_of(text).unwrap_or(NO_ENTRY_INDEX);
                (idx, TYPE_STRING, idx)
            }
            Value::Int(v) => (NO_ENTRY_INDEX, TYPE_INT_DEC, *v as u32),
            Value::Hex(v) => (NO_ENTRY_INDEX, TYPE_INT_HEX, *v),
            Value::Bool(flag) => (NO_ENTRY_INDEX, TYPE_INT_BOOLEAN, if *flag { 0xFFFF_FFFF } else { 0 }),
            Value::Ref(id) => (NO_ENTRY_INDEX, TYPE_REFERENCE, *id),
        };
        write_u32(buf, ns_idx);
        write_u32(buf, name_idx);
        write_u32(buf, raw_idx);
        write_u16(buf, 8);
        write_u8(buf, 0);
        write_u8(buf, data_type);
        write_u32(buf, data);
    }
    finalize_chunk(buf, chunk_start);
}

fn write_end_element(buf: &mut Vec<u8>, pool: &StringPoolBuilder, tag: &str) {
    let chunk_start = begin_chunk(buf, RES_XML_END_ELEMENT_TYPE, 16);
    write_u32(buf, 1); // line number
    write_u32(buf, NO_ENTRY_INDEX);
    write_u32(buf, NO_ENTRY_INDEX);
    write_u32(buf, pool.index_of(tag).unwrap_or(NO_ENTRY_INDEX));
    finalize_chunk(buf, chunk_start);
}

/// A dex file holding only a header, string ids, type ids and string data.
pub(crate) struct DexBuilder {
    strings: Vec<Vec<u8>>,
    types: Vec<u32>,
}

impl DexBuilder {
    pub(crate) fn new() -> Self {
        DexBuilder { strings: vec![], types: vec![] }
    }

    /// Add a string and a type id pointing at it.
    pub(crate) fn class(self, descriptor: &str) -> Self {
        let encoded = cesu8::to_java_cesu8(descriptor).into_owned();
        self.raw_type(encoded)
    }

    /// Add a string without a type id.
    pub(crate) fn string(mut self, text: &str) -> Self {
        self.strings.push(cesu8::to_java_cesu8(text).into_owned());
        self
    }

    /// Add a type id whose string data is `bytes` verbatim.
    pub(crate) fn raw_type(mut self, bytes: Vec<u8>) -> Self {
        self.types.push(self.strings.len() as u32);
        self.strings.push(bytes);
        self
    }

    /// Add a type id with an arbitrary descriptor index.
    pub(crate) fn type_index(mut self, string_idx: u32) -> Self {
        self.types.push(string_idx);
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let string_ids_off = HEADER_SIZE as u32;
        let type_ids_off = string_ids_off + self.strings.len() as u32 * 4;
        let data_off = type_ids_off + self.types.len() as u32 * 4;

        let mut data = Vec::new();
        let mut string_offsets = vec![];
        for s in &self.strings {
            string_offsets.push(data_off + data.len() as u32);
            write_uleb128(&mut data, s.len() as u32);
            data.extend_from_slice(s);
            data.push(0);
        }

        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"dex\n035\0");
        bytes.resize(0x38, 0);
        write_u4(&mut bytes, self.strings.len() as u32);
        write_u4(&mut bytes, string_ids_off);
        write_u4(&mut bytes, self.types.len() as u32);
        write_u4(&mut bytes, type_ids_off);
        bytes.resize(HEADER_SIZE, 0);
        for off in string_offsets {
            write_u4(&mut bytes, off);
        }
        for t in &self.types {
            write_u4(&mut bytes, *t);
        }
        bytes.extend_from_slice(&data);
        bytes
    }
}
