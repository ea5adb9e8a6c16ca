/*
 * vHook SMTP to webhook relay
 * Copyright (C) 2022 viridIT SAS
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or any later version.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT
 * ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * this program. If not, see https://www.gnu.org/licenses/.
 *
*/

use crate::{command::Command, Error, UnparsedArgs, Verb};
use tokio::io::AsyncReadExt;
use vhook_common::Reply;

fn find(bytes: &[u8], search: &[u8]) -> Option<usize> {
    bytes
        .windows(search.len())
        .position(|window| window == search)
}

/// Stream for reading commands from the client.
///
/// The bytes read ahead of the current line are kept between two streams,
/// so a pipelining client does not lose its commands.
pub struct Reader<R: tokio::io::AsyncRead + Unpin + Send> {
    inner: R,
    buffer: bytes::BytesMut,
    additional_reserve: usize,
    command_line_max: usize,
}

impl<R: tokio::io::AsyncRead + Unpin + Send> Reader<R> {
    /// Create a new stream.
    #[must_use]
    #[inline]
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: bytes::BytesMut::with_capacity(80),
            additional_reserve: 100,
            // https://datatracker.ietf.org/doc/html/rfc5321#section-4.5.3.1.4
            command_line_max: 512,
        }
    }

    /// Produce a stream of "\r\n" terminated lines of at most `line_max` bytes.
    ///
    /// A longer line is not buffered: its bytes are dropped as they arrive and the
    /// stream yields [`Error::BufferTooLong`] once its line ending is read, then goes on
    /// with the next line. Bytes left without a line ending when the peer closes the
    /// connection are dropped.
    fn as_line_stream(
        &mut self,
        line_max: usize,
    ) -> impl tokio_stream::Stream<Item = Result<Vec<u8>, Error>> + '_ {
        use bytes::Buf;

        async_stream::stream! {
            // bytes of the buffer already searched for a line ending
            let mut scanned: usize = 0;
            // length of the line being dropped
            let mut dropped = None;

            loop {
                let from = scanned.saturating_sub(1);
                if let Some(pos) = find(&self.buffer[from..], b"\r\n") {
                    let out = self.buffer.split_to(from + pos + 2);
                    scanned = 0;
                    let got = dropped.take().unwrap_or(0) + out.len();
                    if got > line_max {
                        yield Err(Error::BufferTooLong { expected: line_max, got });
                    } else {
                        yield Ok(Vec::<u8>::from(out));
                    }
                    continue;
                }

                if self.buffer.len() > line_max {
                    // the last byte may be the '\r' of the line ending
                    let drop = self.buffer.len() - 1;
                    self.buffer.advance(drop);
                    *dropped.get_or_insert(0) += drop;
                }
                scanned = self.buffer.len();

                self.buffer.reserve(self.additional_reserve);
                match self.inner.read_buf(&mut self.buffer).await {
                    Ok(0) => {
                        if !self.buffer.is_empty() || dropped.is_some() {
                            tracing::debug!(
                                "Connection closed with {} unterminated bytes",
                                self.buffer.len() + dropped.unwrap_or(0)
                            );
                            self.buffer.clear();
                        }
                        return;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        yield Err(Error::Io(e));
                        return;
                    }
                }
            }
        }
    }

    /// Produce a stream of lines to generate IMF compliant messages.
    ///
    /// Dot-stuffing is removed. If the message is bigger than `size_limit`, the data
    /// is still consumed up to the final `.<CRLF>` and the stream ends with
    /// [`Error::BufferTooLong`]. No more than one line of `size_limit` bytes is held
    /// in memory.
    #[inline]
    pub fn as_message_stream(
        &mut self,
        size_limit: usize,
    ) -> impl tokio_stream::Stream<Item = Result<Vec<u8>, Error>> + '_ {
        async_stream::stream! {
            let mut size = 0;
            let mut too_long = false;

            for await line in self.as_line_stream(size_limit.saturating_add(2)) {
                let mut line = match line {
                    Ok(line) => line,
                    Err(Error::BufferTooLong { got, .. }) => {
                        size += got;
                        too_long = true;
                        continue;
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };
                tracing::trace!("<< {:?}", std::str::from_utf8(&line));

                if line == b".\r\n" {
                    if too_long {
                        yield Err(Error::BufferTooLong { expected: size_limit, got: size });
                    }
                    return;
                }

                if line.first() == Some(&b'.') {
                    line.remove(0);
                }

                size += line.len();
                if size > size_limit {
                    too_long = true;
                }

                if !too_long {
                    yield Ok(line);
                }
            }

            yield Err(Error::Io(std::io::ErrorKind::UnexpectedEof.into()));
        }
    }

    /// Produce a stream of ESMTP commands.
    ///
    /// A line longer than the command limit yields [`Error::BufferTooLong`].
    #[inline]
    pub fn as_command_stream(
        &mut self,
    ) -> impl tokio_stream::Stream<Item = Result<Command<Verb, UnparsedArgs>, Error>> + '_ {
        let command_line_max = self.command_line_max;

        async_stream::stream! {
            for await line in self.as_line_stream(command_line_max) {
                match line {
                    Ok(line) => yield Ok(Verb::parse_line(line)),
                    Err(e @ Error::BufferTooLong { .. }) => yield Err(e),
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        }
    }

    /// Produce a stream of SMTP replies.
    #[inline]
    pub fn as_reply_stream(
        &mut self,
    ) -> impl tokio_stream::Stream<Item = Result<Reply, Error>> + '_ {
        use tokio_stream::StreamExt;
        // https://datatracker.ietf.org/doc/html/rfc5321#section-4.5.3.1.5
        let reply_line_max = 512;

        async_stream::stream! {
            let line_stream = self.as_line_stream(reply_line_max);
            tokio::pin!(line_stream);

            loop {
                let mut next_reply = Vec::with_capacity(512);

                loop {
                    let new_line = match line_stream.next().await {
                        Some(Ok(new_line)) => new_line,
                        Some(Err(e)) => {
                            yield Err(e);
                            return;
                        }
                        None => return,
                    };

                    next_reply.extend_from_slice(&new_line);
                    if new_line.get(3) != Some(&b'-') {
                        break;
                    }
                }

                tracing::trace!("<< {:?}", std::str::from_utf8(&next_reply));
                yield std::str::from_utf8(&next_reply)
                    .map_err(|e| Error::InvalidReply(e.to_string()))
                    .and_then(|reply| {
                        reply
                            .parse::<Reply>()
                            .map_err(|e| Error::InvalidReply(e.to_string()))
                    });
            }
        }
    }
}
