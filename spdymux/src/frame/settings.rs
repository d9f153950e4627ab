use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use super::bits::{
    SETTINGS_FLAG_CLEAR, SETTING_FLAG_PERSISTED, SETTING_FLAG_PERSIST_VALUE, SETTING_ID_MASK,
};
use super::{util, Control, Error, Malformed, Version};

const ENTRY_LEN: usize = 8;

#[derive(Clone, Default, Eq, PartialEq)]
pub struct Settings {
    flags: u8,
    entries: Vec<Setting>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Setting {
    id: SettingId,
    flags: u8,
    value: u32,
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SettingId(u32);

impl SettingId {
    pub const UPLOAD_BANDWIDTH: SettingId = SettingId(1);
    pub const DOWNLOAD_BANDWIDTH: SettingId = SettingId(2);
    pub const ROUND_TRIP_TIME: SettingId = SettingId(3);
    pub const MAX_CONCURRENT_STREAMS: SettingId = SettingId(4);
    pub const CURRENT_CWND: SettingId = SettingId(5);
    pub const DOWNLOAD_RETRANS_RATE: SettingId = SettingId(6);
    pub const INITIAL_WINDOW_SIZE: SettingId = SettingId(7);

    pub fn new(id: u32) -> SettingId {
        assert_eq!(id & !SETTING_ID_MASK, 0, "setting ids are 24 bits wide");
        SettingId(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

// ===== impl Settings =====

impl Settings {
    pub fn new() -> Settings {
        Settings::default()
    }

    pub fn is_clear_settings(&self) -> bool {
        self.flags & SETTINGS_FLAG_CLEAR == SETTINGS_FLAG_CLEAR
    }

    pub fn set_clear_settings(&mut self, val: bool) {
        super::syn_stream::set_flag(&mut self.flags, SETTINGS_FLAG_CLEAR, val);
    }

    pub fn entries(&self) -> &[Setting] {
        &self.entries
    }

    pub fn get(&self, id: SettingId) -> Option<u32> {
        self.entries.iter().find(|s| s.id == id).map(|s| s.value)
    }

    /// Sets `id`, keeping entries sorted by id as the wire format requires.
    pub fn set(&mut self, id: SettingId, value: u32) {
        self.set_with_flags(id, 0, value);
    }

    pub fn set_with_flags(&mut self, id: SettingId, flags: u8, value: u32) {
        let setting = Setting { id, flags, value };
        match self.entries.binary_search_by_key(&id, |s| s.id) {
            Ok(pos) => self.entries[pos] = setting,
            Err(pos) => self.entries.insert(pos, setting),
        }
    }

    pub fn max_concurrent_streams(&self) -> Option<u32> {
        self.get(SettingId::MAX_CONCURRENT_STREAMS)
    }

    pub fn set_max_concurrent_streams(&mut self, max: Option<u32>) {
        self.assign(SettingId::MAX_CONCURRENT_STREAMS, max);
    }

    pub fn initial_window_size(&self) -> Option<u32> {
        self.get(SettingId::INITIAL_WINDOW_SIZE)
    }

    pub fn set_initial_window_size(&mut self, size: Option<u32>) {
        self.assign(SettingId::INITIAL_WINDOW_SIZE, size);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn assign(&mut self, id: SettingId, value: Option<u32>) {
        match value {
            Some(value) => self.set(id, value),
            None => self.entries.retain(|s| s.id != id),
        }
    }

    pub(crate) fn flags(&self) -> u8 {
        self.flags
    }

    pub(crate) fn load(version: Version, flags: u8, payload: Bytes) -> Result<Settings, Error> {
        util::expect_min_len(&payload, 4)?;

        let count = unpack_octets_4!(payload, 0, u32) as usize;
        let body = &payload[4..];

        if body.len() / ENTRY_LEN != count || body.len() % ENTRY_LEN != 0 {
            return Err(Error::Malformed(Malformed::InvalidPayloadLength));
        }

        let mut entries = Vec::with_capacity(count);
        for raw in body.chunks(ENTRY_LEN) {
            let (id, entry_flags) = match version {
                Version::V2 => (u32::from_le_bytes([raw[0], raw[1], raw[2], 0]), raw[3]),
                Version::V3 => (u32::from_be_bytes([0, raw[1], raw[2], raw[3]]), raw[0]),
            };
            let value = unpack_octets_4!(raw, 4, u32);

            // Ids must be strictly ascending; this also rules out duplicates.
            if let Some(prev) = entries.last().map(|s: &Setting| s.id) {
                if SettingId(id) <= prev {
                    tracing::debug!(id, "SETTINGS ids out of order");
                    return Err(Error::Malformed(Malformed::InvalidSettings));
                }
            }

            entries.push(Setting {
                id: SettingId(id),
                flags: entry_flags,
                value,
            });
        }

        Ok(Settings { flags, entries })
    }

    pub(crate) fn encode_payload(&self, version: Version, dst: &mut BytesMut) {
        tracing::trace!("encoding SETTINGS; len={}", self.entries.len());
        dst.put_u32(self.entries.len() as u32);

        for setting in &self.entries {
            let id = setting.id.0.to_le_bytes();
            match version {
                Version::V2 => {
                    dst.put_slice(&id[..3]);
                    dst.put_u8(setting.flags);
                }
                Version::V3 => {
                    dst.put_u8(setting.flags);
                    dst.put_slice(&setting.id.0.to_be_bytes()[1..]);
                }
            }
            dst.put_u32(setting.value);
        }
    }
}

impl From<Settings> for Control {
    fn from(src: Settings) -> Control {
        Control::Settings(src)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let mut builder = fmt.debug_struct("Settings");
        if self.is_clear_settings() {
            builder.field("flags", &"CLEAR_SETTINGS");
        }
        for setting in &self.entries {
            match setting.id {
                SettingId::MAX_CONCURRENT_STREAMS => {
                    builder.field("max_concurrent_streams", &setting.value)
                }
                SettingId::INITIAL_WINDOW_SIZE => {
                    builder.field("initial_window_size", &setting.value)
                }
                _ => builder.field("other", setting),
            };
        }
        builder.finish()
    }
}

// ===== impl Setting =====

impl Setting {
    pub fn id(&self) -> SettingId {
        self.id
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn is_persist_value(&self) -> bool {
        self.flags & SETTING_FLAG_PERSIST_VALUE == SETTING_FLAG_PERSIST_VALUE
    }

    pub fn is_persisted(&self) -> bool {
        self.flags & SETTING_FLAG_PERSISTED == SETTING_FLAG_PERSISTED
    }
}

impl fmt::Debug for SettingId {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let name = match self.0 {
            1 => "UPLOAD_BANDWIDTH",
            2 => "DOWNLOAD_BANDWIDTH",
            3 => "ROUND_TRIP_TIME",
            4 => "MAX_CONCURRENT_STREAMS",
            5 => "CURRENT_CWND",
            6 => "DOWNLOAD_RETRANS_RATE",
            7 => "INITIAL_WINDOW_SIZE",
            other => return fmt.debug_tuple("SettingId").field(&other).finish(),
        };
        fmt.write_str(name)
    }
}
