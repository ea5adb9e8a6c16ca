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

use crate::{
    AcceptArgs, EhloArgs, Error, ErrorCounter, HeloArgs, MailFromArgs, ParseArgsError, RcptToArgs,
    Reader, ReceiverHandler, Verb, Writer,
};
use tokio_stream::StreamExt;
use vhook_common::Stage;

enum HandshakeOutcome {
    Message,
    Quit,
}

/// An handle to send event from the [`ReceiverHandler`] to the [`Receiver`].
#[allow(clippy::module_name_repetitions)]
#[derive(Default)]
pub struct ReceiverContext {
    outcome: Option<HandshakeOutcome>,
}

impl ReceiverContext {
    /// Make the [`Receiver`] quit the connection early, and close cleanly.
    #[inline]
    pub fn deny(&mut self) {
        self.outcome = Some(HandshakeOutcome::Quit);
    }
}

/// A SMTP receiver.
pub struct Receiver<
    T: ReceiverHandler + Send,
    W: tokio::io::AsyncWrite + Unpin + Send,
    R: tokio::io::AsyncRead + Unpin + Send,
> {
    pub(crate) handler: T,
    pub(crate) writer: Writer<W>,
    pub(crate) reader: Reader<R>,
    error_counter: ErrorCounter,
    context: ReceiverContext,
    message_size_max: usize,
    command_timeout: std::time::Duration,
}

impl<T: ReceiverHandler + Send>
    Receiver<T, tokio::net::tcp::OwnedWriteHalf, tokio::net::tcp::OwnedReadHalf>
{
    /// Create a new [`Receiver`] from a TCP/IP stream.
    #[inline]
    pub fn new(
        tcp_stream: tokio::net::TcpStream,
        handler: T,
        threshold_soft_error: i64,
        threshold_hard_error: i64,
        message_size_max: usize,
        command_timeout: std::time::Duration,
    ) -> Self {
        let (read, write) = tcp_stream.into_split();
        Self::with_io(
            read,
            write,
            handler,
            threshold_soft_error,
            threshold_hard_error,
            message_size_max,
            command_timeout,
        )
    }
}

impl<
        T: ReceiverHandler + Send,
        W: tokio::io::AsyncWrite + Unpin + Send,
        R: tokio::io::AsyncRead + Unpin + Send,
    > Receiver<T, W, R>
{
    /// Create a new [`Receiver`] from any pair of reader/writer.
    #[inline]
    pub fn with_io(
        read: R,
        write: W,
        handler: T,
        threshold_soft_error: i64,
        threshold_hard_error: i64,
        message_size_max: usize,
        command_timeout: std::time::Duration,
    ) -> Self {
        Self {
            handler,
            writer: Writer::new(write),
            reader: Reader::new(read),
            error_counter: ErrorCounter {
                error_count: 0,
                threshold_soft_error,
                threshold_hard_error,
            },
            context: ReceiverContext { outcome: None },
            message_size_max,
            command_timeout,
        }
    }

    /// Handle the inner stream to produce a [`tokio_stream::Stream`], each item
    /// being a message received.
    ///
    /// [`ReceiverHandler::on_logout`] is called once the session is over, either
    /// because of a `QUIT`, the connection being closed or failing, or denied
    /// by the handler. An I/O error is produced after the logout.
    #[inline]
    pub fn into_stream(
        mut self,
        client_addr: std::net::SocketAddr,
        server_addr: std::net::SocketAddr,
        timestamp: time::OffsetDateTime,
        uuid: uuid::Uuid,
    ) -> impl tokio_stream::Stream<Item = std::io::Result<()>> {
        let accept_args = AcceptArgs {
            client_addr,
            server_addr,
            timestamp,
            uuid,
        };

        async_stream::stream! {
            let outcome = match self.accept(accept_args).await {
                Ok(true) => loop {
                    match self.next_message().await {
                        Ok(Some(last)) => {
                            yield Ok(());
                            if last {
                                break Ok(());
                            }
                        }
                        Ok(None) => break Ok(()),
                        Err(e) => break Err(e),
                    }
                },
                Ok(false) => Ok(()),
                Err(e) => Err(e),
            };

            self.handler.on_logout().await;

            if let Err(e) = outcome {
                yield Err(e);
            }
        }
    }

    /// Greet the client, `false` if the handler denied the connection.
    async fn accept(&mut self, args: AcceptArgs) -> std::io::Result<bool> {
        let reply = self.handler.on_accept(&mut self.context, args).await;
        self.writer
            .send_reply(
                &mut self.context,
                &mut self.error_counter,
                &mut self.handler,
                reply,
            )
            .await?;

        let produced_context = std::mem::take(&mut self.context);
        Ok(!matches!(
            produced_context.outcome,
            Some(HandshakeOutcome::Quit)
        ))
    }

    /// Run the session up to the reply to the next message.
    ///
    /// `None` if the session ended without a message, otherwise whether this
    /// message is the last one of the session.
    async fn next_message(&mut self) -> std::io::Result<Option<bool>> {
        if matches!(self.smtp_handshake().await?, HandshakeOutcome::Quit) {
            return Ok(None);
        }

        let reply = {
            let message_stream = self
                .reader
                .as_message_stream(self.message_size_max)
                .fuse();
            tokio::pin!(message_stream);

            self.handler
                .on_message(&mut self.context, message_stream)
                .await
        };
        self.writer
            .send_reply(
                &mut self.context,
                &mut self.error_counter,
                &mut self.handler,
                reply,
            )
            .await?;

        let produced_context = std::mem::take(&mut self.context);
        Ok(Some(matches!(
            produced_context.outcome,
            Some(HandshakeOutcome::Quit)
        )))
    }

    /// SMTP handshake (generate the envelope and metadata).
    async fn smtp_handshake(&mut self) -> std::io::Result<HandshakeOutcome> {
        macro_rules! handle_args {
            ($args_output:ty, $args:expr, $on_event:tt) => {
                match <$args_output>::try_from($args) {
                    Ok(args) => self.handler.$on_event(&mut self.context, args).await,
                    Err(e) => self.handler.on_args_error(e).await,
                }
            };
        }

        let command_stream = self
            .reader
            .as_command_stream()
            .timeout(self.command_timeout);
        tokio::pin!(command_stream);

        loop {
            let command = match command_stream.try_next().await {
                Ok(Some(command)) => command,
                Ok(None) => return Ok(HandshakeOutcome::Quit),
                Err(e) => {
                    tracing::warn!("Closing after {} without receiving a command", e);
                    let reply = self.handler.on_timeout().await;
                    self.writer
                        .send_reply(
                            &mut self.context,
                            &mut self.error_counter,
                            &mut self.handler,
                            reply,
                        )
                        .await?;

                    return Ok(HandshakeOutcome::Quit);
                }
            };

            let (verb, args) = match command {
                Ok(command) => command,
                Err(Error::BufferTooLong { expected, got }) => {
                    let reply = self
                        .handler
                        .on_args_error(ParseArgsError::BufferTooLong { expected, got })
                        .await;
                    self.writer
                        .send_reply(
                            &mut self.context,
                            &mut self.error_counter,
                            &mut self.handler,
                            reply,
                        )
                        .await?;

                    if std::mem::take(&mut self.context).outcome.is_some() {
                        return Ok(HandshakeOutcome::Quit);
                    }
                    continue;
                }
                Err(Error::Io(io)) => return Err(io),
                Err(otherwise) => {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        otherwise,
                    ))
                }
            };
            tracing::trace!("<< {:?} ; {:?}", verb, std::str::from_utf8(&args.0));

            let stage = self.handler.get_stage();
            let reply = match (verb, stage) {
                (Verb::Helo, _) => handle_args!(HeloArgs, args, on_helo),
                (Verb::Ehlo, _) => handle_args!(EhloArgs, args, on_ehlo),
                (Verb::Noop, _) => self.handler.on_noop().await,
                (Verb::Rset, _) => self.handler.on_rset().await,
                (Verb::MailFrom, Stage::Helo) => handle_args!(MailFromArgs, args, on_mail_from),
                (Verb::RcptTo, Stage::MailFrom | Stage::RcptTo) => {
                    handle_args!(RcptToArgs, args, on_rcpt_to)
                }
                (Verb::Data, Stage::RcptTo) => {
                    self.context.outcome = Some(HandshakeOutcome::Message);
                    self.handler.on_data().await
                }
                (Verb::Quit, _) => {
                    self.context.outcome = Some(HandshakeOutcome::Quit);
                    self.handler.on_quit().await
                }
                (Verb::Help, _) => self.handler.on_help(args).await,
                (Verb::Unknown, _) => self.handler.on_unknown(args.0).await,
                otherwise => self.handler.on_bad_sequence(otherwise).await,
            };

            self.writer
                .send_reply(
                    &mut self.context,
                    &mut self.error_counter,
                    &mut self.handler,
                    reply,
                )
                .await?;

            let produced_context = std::mem::take(&mut self.context);
            if let Some(done) = produced_context.outcome {
                return Ok(done);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UnparsedArgs;
    use tokio_stream::StreamExt;
    use vhook_common::{Reply, ReplyCode};

    fn ok() -> Reply {
        Reply::new(ReplyCode::Code { code: 250 }, "Ok")
    }

    /// Count the logouts of the session.
    struct Logouts {
        stage: Stage,
        count: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl ReceiverHandler for Logouts {
        fn get_stage(&self) -> Stage {
            self.stage
        }

        async fn on_accept(&mut self, _: &mut ReceiverContext, _: AcceptArgs) -> Reply {
            Reply::new(ReplyCode::Code { code: 220 }, "Service ready")
        }

        async fn on_helo(&mut self, _: &mut ReceiverContext, _: HeloArgs) -> Reply {
            self.stage = Stage::Helo;
            ok()
        }

        async fn on_ehlo(&mut self, _: &mut ReceiverContext, _: EhloArgs) -> Reply {
            self.stage = Stage::Helo;
            ok()
        }

        async fn on_mail_from(&mut self, _: &mut ReceiverContext, _: MailFromArgs) -> Reply {
            self.stage = Stage::MailFrom;
            ok()
        }

        async fn on_rcpt_to(&mut self, _: &mut ReceiverContext, _: RcptToArgs) -> Reply {
            self.stage = Stage::RcptTo;
            ok()
        }

        async fn on_message(
            &mut self,
            _: &mut ReceiverContext,
            stream: impl tokio_stream::Stream<Item = Result<Vec<u8>, Error>> + Send + Unpin,
        ) -> Reply {
            let _message = stream.collect::<Vec<_>>().await;
            self.stage = Stage::Helo;
            ok()
        }

        async fn on_hard_error(&mut self, _: &mut ReceiverContext, reply: Reply) -> Reply {
            reply
        }

        async fn on_soft_error(&mut self, _: &mut ReceiverContext, reply: Reply) -> Reply {
            reply
        }

        async fn on_rset(&mut self) -> Reply {
            ok()
        }

        async fn on_help(&mut self, _: UnparsedArgs) -> Reply {
            ok()
        }

        async fn on_logout(&mut self) {
            self.count.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    /// A peer which reset the connection.
    struct Reset;

    impl tokio::io::AsyncRead for Reset {
        fn poll_read(
            self: std::pin::Pin<&mut Self>,
            _: &mut std::task::Context<'_>,
            _: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Err(std::io::ErrorKind::ConnectionReset.into()))
        }
    }

    impl tokio::io::AsyncWrite for Reset {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _: &mut std::task::Context<'_>,
            _: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Err(std::io::ErrorKind::ConnectionReset.into()))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    async fn run<
        W: tokio::io::AsyncWrite + Unpin + Send,
        R: tokio::io::AsyncRead + Unpin + Send,
    >(
        read: R,
        write: W,
    ) -> (Vec<std::io::Result<()>>, usize) {
        let logouts = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let receiver = Receiver::with_io(
            read,
            write,
            Logouts {
                stage: Stage::Connect,
                count: logouts.clone(),
            },
            -1,
            -1,
            1000,
            std::time::Duration::from_secs(5),
        );

        let items = receiver
            .into_stream(
                "127.0.0.1:53844".parse().unwrap(),
                "127.0.0.1:25".parse().unwrap(),
                time::OffsetDateTime::now_utc(),
                uuid::Uuid::new_v4(),
            )
            .collect::<Vec<_>>()
            .await;

        (items, logouts.load(std::sync::atomic::Ordering::SeqCst))
    }

    #[tokio::test]
    async fn logout_after_quit() {
        let (items, logouts) = run(
            b"HELO foo\r\nMAIL FROM:<a@b>\r\nRCPT TO:<c@d>\r\nDATA\r\nhi\r\n.\r\nQUIT\r\n" as &[u8],
            tokio::io::sink(),
        )
        .await;

        assert!(matches!(items.as_slice(), [Ok(())]));
        pretty_assertions::assert_eq!(logouts, 1);
    }

    #[tokio::test]
    async fn logout_after_read_error() {
        let (items, logouts) = run(
            tokio::io::AsyncReadExt::chain(b"HELO foo\r\n" as &[u8], Reset),
            tokio::io::sink(),
        )
        .await;

        assert!(matches!(
            items.as_slice(),
            [Err(e)] if e.kind() == std::io::ErrorKind::ConnectionReset
        ));
        pretty_assertions::assert_eq!(logouts, 1);
    }

    #[tokio::test]
    async fn logout_after_write_error() {
        let (items, logouts) = run(b"HELO foo\r\n" as &[u8], Reset).await;

        assert!(matches!(
            items.as_slice(),
            [Err(e)] if e.kind() == std::io::ErrorKind::ConnectionReset
        ));
        pretty_assertions::assert_eq!(logouts, 1);
    }
}
