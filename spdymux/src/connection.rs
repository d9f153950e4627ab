use bytes::{Buf, Bytes};
use futures_core::Stream;
use futures_util::io::{AsyncRead, AsyncWrite};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::Error;
use crate::event::Event;
use crate::session::Session;

const READ_BUF_SIZE: usize = 8 * 1_024;

/// Drives a [`Session`] over an async transport.
///
/// Polling the connection writes whatever the session has to send, reads
/// from the transport and yields the session's events. The stream ends
/// after [`Event::Closed`] once the final GOAWAY has been flushed.
#[must_use = "streams do nothing unless polled"]
pub struct Connection<T> {
    io: T,
    session: Session,
    read_buf: Box<[u8]>,
    pending_write: Option<Bytes>,
    done: bool,
}

impl<T> Connection<T> {
    pub fn new(io: T, session: Session) -> Connection<T> {
        Connection {
            io,
            session,
            read_buf: vec![0; READ_BUF_SIZE].into_boxed_slice(),
            pending_write: None,
            done: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Access for opening streams and sending data. Bytes queued this way go
    /// out on the next poll.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn get_ref(&self) -> &T {
        &self.io
    }

    pub fn into_inner(self) -> (T, Session) {
        (self.io, self.session)
    }
}

impl<T> Connection<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Writes everything the session has queued and flushes the transport.
    pub fn poll_flush(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Error>> {
        loop {
            if self.pending_write.is_none() {
                self.pending_write = self.session.poll_transmit();
            }

            let buf = match self.pending_write {
                Some(ref mut buf) => buf,
                None => break,
            };

            let n = ready!(Pin::new(&mut self.io).poll_write(cx, &buf[..]))?;
            if n == 0 {
                return Poll::Ready(Err(io::Error::from(io::ErrorKind::WriteZero).into()));
            }
            tracing::trace!(n, "wrote to transport");

            buf.advance(n);
            if buf.is_empty() {
                self.pending_write = None;
            }
        }

        ready!(Pin::new(&mut self.io).poll_flush(cx))?;
        Poll::Ready(Ok(()))
    }

    /// Next session event, reading from the transport as needed.
    pub fn poll_event(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<Event, Error>>> {
        loop {
            if let Some(event) = self.session.poll_event() {
                return Poll::Ready(Some(Ok(event)));
            }

            if self.done {
                return Poll::Ready(None);
            }

            let flushed = match self.poll_flush(cx) {
                Poll::Ready(Ok(())) => true,
                Poll::Ready(Err(err)) => {
                    tracing::debug!(%err, "transport write failed");
                    self.session.on_eof();
                    self.done = true;
                    return Poll::Ready(Some(Err(err)));
                }
                Poll::Pending => false,
            };

            if self.session.is_closed() {
                if flushed {
                    self.done = true;
                    continue;
                }
                return Poll::Pending;
            }

            let n = match Pin::new(&mut self.io).poll_read(cx, &mut self.read_buf[..]) {
                Poll::Ready(Ok(n)) => n,
                Poll::Ready(Err(err)) => {
                    tracing::debug!(%err, "transport read failed");
                    self.session.on_eof();
                    self.done = true;
                    return Poll::Ready(Some(Err(err.into())));
                }
                Poll::Pending => return Poll::Pending,
            };

            if n == 0 {
                self.session.on_eof();
                continue;
            }

            // a fatal error also closes the session and shows up as
            // `Event::Closed`
            if let Err(err) = self.session.on_bytes(&self.read_buf[..n]) {
                tracing::debug!(%err, "session failed");
            }
        }
    }

    /// Flushes what is left and closes the transport.
    pub fn poll_close(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Error>> {
        ready!(self.poll_flush(cx))?;
        ready!(Pin::new(&mut self.io).poll_close(cx))?;
        Poll::Ready(Ok(()))
    }
}

impl<T> Stream for Connection<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    type Item = Result<Event, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().poll_event(cx)
    }
}

impl<T> std::fmt::Debug for Connection<T> {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.debug_struct("Connection")
            .field("session", &self.session)
            .field("pending_write", &self.pending_write.as_ref().map(|b| b.len()))
            .finish()
    }
}
