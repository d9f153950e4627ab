use bytes::{Buf, BufMut, Bytes, BytesMut};
use fnv::FnvBuildHasher;
use indexmap::IndexMap;
use std::fmt;
use std::iter::FromIterator;

use super::bits::LENGTH_MASK;
use super::{Error, Malformed, Version};

/// Ordered name/value pairs carried by SYN_STREAM, SYN_REPLY and HEADERS.
///
/// Names are unique within a block. The block is carried uncompressed.
/// Integers are 16 bits wide in SPDY/2 and 32 bits wide in SPDY/3.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct HeaderBlock {
    fields: IndexMap<Bytes, Bytes, FnvBuildHasher>,
}

impl HeaderBlock {
    pub fn new() -> HeaderBlock {
        HeaderBlock::default()
    }

    /// Inserts a field, returning the previous value when the name was
    /// already present.
    pub fn insert<N, V>(&mut self, name: N, value: V) -> Option<Bytes>
    where
        N: Into<Bytes>,
        V: Into<Bytes>,
    {
        self.fields.insert(name.into(), value.into())
    }

    pub fn get<N: AsRef<[u8]>>(&self, name: N) -> Option<&Bytes> {
        self.fields.get(name.as_ref())
    }

    pub fn contains<N: AsRef<[u8]>>(&self, name: N) -> bool {
        self.fields.contains_key(name.as_ref())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Bytes, &Bytes)> {
        self.fields.iter()
    }

    pub(crate) fn load(version: Version, mut src: Bytes) -> Result<HeaderBlock, Error> {
        let width = version.header_block_width();
        let count = read_len(width, &mut src)?;

        // Every entry needs at least two length prefixes.
        let capacity = std::cmp::min(count, src.len() / (2 * width));
        let mut fields = IndexMap::with_capacity_and_hasher(capacity, FnvBuildHasher::default());

        for _ in 0..count {
            let name = read_string(width, &mut src)?;
            let value = read_string(width, &mut src)?;

            if name.is_empty() {
                tracing::debug!("header block carries an empty name");
                return Err(invalid());
            }

            if fields.insert(name, value).is_some() {
                tracing::debug!("header block carries a duplicate name");
                return Err(invalid());
            }
        }

        if src.has_remaining() {
            tracing::debug!(extra = src.remaining(), "bytes left after header block");
            return Err(invalid());
        }

        Ok(HeaderBlock { fields })
    }

    /// Encoded size of the block, or `None` when the field count or a name
    /// or value length does not fit the version's integer width.
    pub(crate) fn encoded_len(&self, version: Version) -> Option<usize> {
        let width = version.header_block_width();
        let max = match width {
            2 => u16::MAX as usize,
            _ => u32::MAX as usize,
        };

        if self.fields.len() > max {
            return None;
        }

        let mut len = width;
        for (name, value) in &self.fields {
            if name.len() > max || value.len() > max {
                return None;
            }
            len = len
                .checked_add(2 * width)?
                .checked_add(name.len())?
                .checked_add(value.len())?;
        }
        Some(len)
    }

    /// Whether a control frame carrying the block after `offset` fixed bytes
    /// can be encoded at all.
    pub(crate) fn fits_frame(&self, version: Version, offset: usize) -> bool {
        match self.encoded_len(version) {
            Some(len) => len.saturating_add(offset) <= LENGTH_MASK as usize,
            None => false,
        }
    }

    pub(crate) fn encode(&self, version: Version, dst: &mut BytesMut) {
        let width = version.header_block_width();
        put_len(width, self.fields.len(), dst);

        for (name, value) in &self.fields {
            put_len(width, name.len(), dst);
            dst.put_slice(name);
            put_len(width, value.len(), dst);
            dst.put_slice(value);
        }
    }
}

fn invalid() -> Error {
    Error::Malformed(Malformed::InvalidHeaderBlock)
}

fn read_len(width: usize, src: &mut Bytes) -> Result<usize, Error> {
    if src.remaining() < width {
        return Err(invalid());
    }

    Ok(match width {
        2 => src.get_u16() as usize,
        _ => src.get_u32() as usize,
    })
}

fn read_string(width: usize, src: &mut Bytes) -> Result<Bytes, Error> {
    let len = read_len(width, src)?;

    if src.remaining() < len {
        return Err(invalid());
    }

    Ok(src.split_to(len))
}

fn put_len(width: usize, len: usize, dst: &mut BytesMut) {
    match width {
        2 => {
            assert!(len <= u16::MAX as usize, "header block field too long for spdy/2");
            dst.put_u16(len as u16);
        }
        _ => dst.put_u32(len as u32),
    }
}

impl<N, V> FromIterator<(N, V)> for HeaderBlock
where
    N: Into<Bytes>,
    V: Into<Bytes>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> HeaderBlock {
        let mut block = HeaderBlock::new();
        for (name, value) in iter {
            block.insert(name, value);
        }
        block
    }
}

impl fmt::Debug for HeaderBlock {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_map()
            .entries(
                self.fields
                    .iter()
                    .map(|(k, v)| (String::from_utf8_lossy(k), String::from_utf8_lossy(v))),
            )
            .finish()
    }
}
