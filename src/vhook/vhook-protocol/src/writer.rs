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

use crate::{ReceiverContext, ReceiverHandler};
use tokio::io::AsyncWriteExt;
use vhook_common::Reply;

/// Threshold reached by the [`ErrorCounter`].
#[derive(Debug, PartialEq, Eq)]
enum Threshold {
    Below,
    Soft,
    Hard,
}

/// Count the replies considered as errors sent to the client.
pub struct ErrorCounter {
    /// Number of errors sent so far.
    pub error_count: i64,
    /// Threshold after which [`ReceiverHandler::on_soft_error`] is called, `-1` to disable.
    pub threshold_soft_error: i64,
    /// Threshold after which [`ReceiverHandler::on_hard_error`] is called, `-1` to disable.
    pub threshold_hard_error: i64,
}

impl ErrorCounter {
    fn count(&mut self, reply: &Reply) -> Threshold {
        if !reply.code().is_error() {
            return Threshold::Below;
        }
        self.error_count += 1;

        let reached = |threshold: i64| threshold != -1 && self.error_count >= threshold;
        if reached(self.threshold_hard_error) {
            Threshold::Hard
        } else if reached(self.threshold_soft_error) {
            Threshold::Soft
        } else {
            Threshold::Below
        }
    }
}

/// Sink of the lines sent to the peer.
pub struct Writer<W: tokio::io::AsyncWrite + Unpin + Send> {
    inner: W,
}

impl<W: tokio::io::AsyncWrite + Unpin + Send> Writer<W> {
    ///
    #[inline]
    #[must_use]
    pub const fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Send `lines` to the peer and flush them.
    ///
    /// # Errors
    ///
    /// * [`std::io::Error`] produced by the underlying writer
    #[inline]
    pub async fn send(&mut self, lines: &str) -> std::io::Result<()> {
        tracing::trace!(">> {:?}", lines);
        self.inner.write_all(lines.as_bytes()).await?;
        self.inner.flush().await
    }

    /// Send a reply to the client. An error reply reaching a threshold of the
    /// [`ErrorCounter`] goes through [`ReceiverHandler::on_hard_error`] or
    /// [`ReceiverHandler::on_soft_error`] first.
    ///
    /// # Errors
    ///
    /// * [`std::io::Error`] produced by the underlying writer
    #[inline]
    pub async fn send_reply<T: ReceiverHandler + Send>(
        &mut self,
        ctx: &mut ReceiverContext,
        error_counter: &mut ErrorCounter,
        handler: &mut T,
        reply: Reply,
    ) -> std::io::Result<()> {
        let reply = match error_counter.count(&reply) {
            Threshold::Below => reply,
            Threshold::Soft => handler.on_soft_error(ctx, reply).await,
            Threshold::Hard => handler.on_hard_error(ctx, reply).await,
        };

        self.send(reply.as_ref()).await
    }
}
