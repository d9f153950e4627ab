use bytes::{BufMut, Bytes};
use std::fmt;

use super::bits::{DATA_FLAG_COMPRESSED, DATA_FLAG_FIN, DATA_FLAG_MASK};
use super::{util, Error, Frame, Head, Malformed, StreamId};

#[derive(Clone, Eq, PartialEq)]
pub struct Data {
    stream_id: StreamId,
    data: Bytes,
    flags: DataFlags,
}

#[derive(Copy, Clone, Default, Eq, PartialEq)]
struct DataFlags(u8);

impl Data {
    pub fn new(stream_id: StreamId, payload: Bytes) -> Self {
        assert!(!stream_id.is_zero());

        Data {
            stream_id,
            data: payload,
            flags: DataFlags::default(),
        }
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    pub fn is_fin(&self) -> bool {
        self.flags.is_fin()
    }

    pub fn set_fin(&mut self, val: bool) {
        if val {
            self.flags.set_fin();
        } else {
            self.flags.unset_fin();
        }
    }

    /// The COMPRESSED flag is carried but never acted on.
    pub fn is_compressed(&self) -> bool {
        self.flags.is_compressed()
    }

    pub fn payload(&self) -> &Bytes {
        &self.data
    }

    pub fn into_payload(self) -> Bytes {
        self.data
    }

    pub(crate) fn load(stream_id: StreamId, flags: u8, payload: Bytes) -> Result<Self, Error> {
        if stream_id.is_zero() {
            return Err(Error::Malformed(Malformed::InvalidStreamId));
        }

        Ok(Data {
            stream_id,
            data: payload,
            flags: DataFlags::load(flags),
        })
    }

    pub(crate) fn encode<T: BufMut>(&self, dst: &mut T) {
        Head::encode_data(self.stream_id, self.flags.into(), self.data.len(), dst);
        dst.put_slice(&self.data);
    }
}

impl From<Data> for Frame {
    fn from(src: Data) -> Self {
        Frame::Data(src)
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let mut f = fmt.debug_struct("Data");
        f.field("stream_id", &self.stream_id);
        f.field("len", &self.data.len());
        if !self.flags.is_empty() {
            f.field("flags", &self.flags);
        }
        f.finish()
    }
}

impl DataFlags {
    fn load(bits: u8) -> DataFlags {
        DataFlags(bits & DATA_FLAG_MASK)
    }

    fn is_empty(&self) -> bool {
        self.0 == 0
    }

    fn is_fin(&self) -> bool {
        self.0 & DATA_FLAG_FIN == DATA_FLAG_FIN
    }

    fn set_fin(&mut self) {
        self.0 |= DATA_FLAG_FIN
    }

    fn unset_fin(&mut self) {
        self.0 &= !DATA_FLAG_FIN
    }

    fn is_compressed(&self) -> bool {
        self.0 & DATA_FLAG_COMPRESSED == DATA_FLAG_COMPRESSED
    }
}

impl From<DataFlags> for u8 {
    fn from(src: DataFlags) -> u8 {
        src.0
    }
}

impl fmt::Debug for DataFlags {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        util::debug_flags(fmt, self.0)
            .flag_if(self.is_fin(), "FIN")
            .flag_if(self.is_compressed(), "COMPRESSED")
            .finish()
    }
}
