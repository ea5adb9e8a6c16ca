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

/// Failure of a stream produced by the [`Reader`](crate::Reader).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A line or a message is bigger than its limit. The oversized bytes have
    /// been consumed, not buffered.
    #[error("{got} bytes received while the limit is {expected}")]
    BufferTooLong {
        /// The limit.
        expected: usize,
        /// Bytes received.
        got: usize,
    },
    /// The connection failed, or was closed in the middle of a message.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The peer sent a reply which is not UTF-8 or does not follow RFC 5321.
    #[error("invalid reply: {0}")]
    InvalidReply(String),
}
