//! Wire constants shared by every frame type.

pub const HEADER_LEN: usize = 8;

pub const CONTROL_FLAG: u8 = 0x80;
pub const VERSION_MASK: u16 = 0x7fff;
pub const STREAM_ID_MASK: u32 = 0x7fff_ffff;
pub const LENGTH_MASK: u32 = 0x00ff_ffff;
pub const WINDOW_DELTA_MASK: u32 = 0x7fff_ffff;

pub const V2_PRIORITY_MASK: u8 = 0xc0;
pub const V2_PRIORITY_SHIFT: u32 = 6;
pub const V3_PRIORITY_MASK: u8 = 0xe0;
pub const V3_PRIORITY_SHIFT: u32 = 5;

// DATA flags
pub const DATA_FLAG_FIN: u8 = 0x01;
pub const DATA_FLAG_COMPRESSED: u8 = 0x02;
pub const DATA_FLAG_MASK: u8 = DATA_FLAG_FIN | DATA_FLAG_COMPRESSED;

// control flags
pub const CONTROL_FLAG_FIN: u8 = 0x01;
pub const CONTROL_FLAG_UNIDIRECTIONAL: u8 = 0x02;

pub const SETTINGS_FLAG_CLEAR: u8 = 0x01;

pub const SETTING_FLAG_PERSIST_VALUE: u8 = 0x01;
pub const SETTING_FLAG_PERSISTED: u8 = 0x02;
pub const SETTING_ID_MASK: u32 = 0x00ff_ffff;
