//! Buffered frame reading and writing on top of [`crate::frame`].

mod error;
mod framed_read;
mod framed_write;

pub use self::error::UserError;
pub(crate) use self::error::RecvError;
pub use self::framed_read::FramedRead;
pub use self::framed_write::FramedWrite;

pub use crate::frame::decode;
