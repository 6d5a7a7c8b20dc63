use crate::android::string_pool::StringPool;

pub const TYPE_NULL: u8 = 0x00;
pub const TYPE_REFERENCE: u8 = 0x01;
pub const TYPE_ATTRIBUTE: u8 = 0x02;
pub const TYPE_STRING: u8 = 0x03;
pub const TYPE_FLOAT: u8 = 0x04;
pub const TYPE_DIMENSION: u8 = 0x05;
pub const TYPE_FRACTION: u8 = 0x06;
pub const TYPE_INT_DEC: u8 = 0x10;
pub const TYPE_INT_HEX: u8 = 0x11;
pub const TYPE_INT_BOOLEAN: u8 = 0x12;
pub const TYPE_INT_COLOR_ARGB8: u8 = 0x1c;
pub const TYPE_INT_COLOR_RGB8: u8 = 0x1d;
pub const TYPE_INT_COLOR_ARGB4: u8 = 0x1e;
pub const TYPE_INT_COLOR_RGB4: u8 = 0x1f;

/// A `Res_value` as stored after each attribute: a type tag and 32 bits of data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypedValue {
    pub type_tag: u8,
    pub raw: u32,
}

impl TypedValue {
    pub fn new(type_tag: u8, raw: u32) -> Self {
        TypedValue { type_tag, raw }
    }

    /// Render the value as text. Resource references are returned as
    /// `@0x…` tokens, never resolved.
    pub fn to_text(&self, pool: &StringPool) -> Option<String> {
        let raw = self.raw;
        match self.type_tag {
            TYPE_NULL => None,
            TYPE_STRING => pool.get(raw).map(str::to_string),
            TYPE_REFERENCE => Some(format!("@0x{raw:08x}")),
            TYPE_INT_DEC => Some((raw as i32).to_string()),
            TYPE_INT_HEX => Some(format!("0x{raw:x}")),
            TYPE_INT_BOOLEAN => Some(if raw != 0 { "true" } else { "false" }.to_string()),
            TYPE_INT_COLOR_ARGB8 | TYPE_INT_COLOR_RGB8 | TYPE_INT_COLOR_ARGB4
            | TYPE_INT_COLOR_RGB4 => Some(format!("#{raw:08x}")),
            TYPE_FLOAT => Some(f32::from_bits(raw).to_string()),
            other => Some(format!("typed(0x{other:02x}):0x{raw:08x}")),
        }
    }
}
