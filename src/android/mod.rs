//! Android binary XML (AXML) manifest decoding.

pub mod badging;
pub mod binary_xml;
pub mod chunk;
pub mod components;
pub mod error;
pub mod fallback;
pub mod manifest;
pub mod reader;
pub mod resource_map;
pub mod string_pool;
pub mod typed_value;
