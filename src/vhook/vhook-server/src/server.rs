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

use crate::{Handler, WebhookRegistry};
use anyhow::Context;
use tracing::Instrument;
use vhook_common::CodeID;
use vhook_config::Config;
use vhook_delivery::transport::Transport;

/// TCP/IP server
pub struct Server {
    config: std::sync::Arc<Config>,
    registry: std::sync::Arc<WebhookRegistry>,
    transport: std::sync::Arc<dyn Transport>,
}

/// Create a `TCPListener` ready to be listened to
///
/// # Errors
///
/// * failed to bind to the socket address
/// * failed to set the listener to non blocking
pub fn socket_bind_anyhow<A: std::net::ToSocketAddrs + std::fmt::Debug>(
    addr: A,
) -> anyhow::Result<std::net::TcpListener> {
    let socket = std::net::TcpListener::bind(&addr)
        .with_context(|| format!("Failed to bind socket on addr: '{addr:?}'"))?;

    socket
        .set_nonblocking(true)
        .with_context(|| format!("Failed to set non-blocking socket on addr: '{addr:?}'"))?;

    Ok(socket)
}

type ListenerStreamItem = std::io::Result<(tokio::net::TcpStream, std::net::SocketAddr)>;

fn listener_to_stream(
    listener: &tokio::net::TcpListener,
) -> impl tokio_stream::Stream<Item = ListenerStreamItem> + '_ {
    async_stream::try_stream! {
        loop {
            let client = listener.accept().await?;
            yield client;
        }
    }
}

impl Server {
    /// Create a server sharing the registry and the transport between the connections.
    #[must_use]
    pub fn new(
        config: std::sync::Arc<Config>,
        registry: std::sync::Arc<WebhookRegistry>,
        transport: std::sync::Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            registry,
            transport,
        }
    }

    #[tracing::instrument(name = "handle-client", skip_all, fields(client = %client_addr, server = %server_addr))]
    async fn handle_client(
        &self,
        client_counter: std::sync::Arc<std::sync::atomic::AtomicI64>,
        mut stream: tokio::net::TcpStream,
        client_addr: std::net::SocketAddr,
        server_addr: std::net::SocketAddr,
    ) {
        if self.config.server.client_count_max != -1
            && client_counter.load(std::sync::atomic::Ordering::SeqCst)
                >= self.config.server.client_count_max
        {
            tracing::warn!(
                max = self.config.server.client_count_max,
                "Connection count max reached, rejecting connection.",
            );

            let reply = self.config.reply(CodeID::ConnectionMaxReached);
            if let Err(error) =
                tokio::io::AsyncWriteExt::write_all(&mut stream, reply.as_ref().as_bytes()).await
            {
                tracing::error!(%error, "Code delivery failure.");
            }

            if let Err(error) = tokio::io::AsyncWriteExt::shutdown(&mut stream).await {
                tracing::error!(%error, "Closing connection failure.");
            }
            return;
        }

        client_counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let uuid = uuid::Uuid::new_v4();
        let session = Self::run_session(
            stream,
            Handler::new(
                self.config.clone(),
                self.registry.clone(),
                self.transport.clone(),
            ),
            self.config.clone(),
            client_addr,
            server_addr,
            uuid,
        );

        tokio::spawn(
            async move {
                if let Err(error) = session.await {
                    tracing::warn!(%error, "Connection closing failure.");
                } else {
                    tracing::info!("Connection closed cleanly.");
                }

                client_counter.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
            }
            .instrument(tracing::info_span!("session", %uuid, client = %client_addr)),
        );
    }

    /// Main loop of `vHook`'s server
    ///
    /// # Errors
    ///
    /// * failed to convert sockets to `[tokio::net::TcpListener]`
    #[tracing::instrument(name = "serve", skip_all)]
    pub async fn listen_and_serve(self, sockets: Vec<std::net::TcpListener>) -> anyhow::Result<()> {
        let client_counter = std::sync::Arc::new(std::sync::atomic::AtomicI64::new(0));

        let listeners = sockets
            .into_iter()
            .map(tokio::net::TcpListener::from_std)
            .collect::<std::io::Result<Vec<tokio::net::TcpListener>>>()?;

        let mut map = tokio_stream::StreamMap::new();
        for listener in &listeners {
            map.insert(listener.local_addr()?, Box::pin(listener_to_stream(listener)));
        }

        tracing::info!(
            interfaces = ?map.keys().collect::<Vec<_>>(),
            "Listening for clients.",
        );

        while let Some((server_addr, client)) = tokio_stream::StreamExt::next(&mut map).await {
            let (stream, client_addr) = match client {
                Ok(client) => client,
                Err(error) => {
                    tracing::warn!(%server_addr, %error, "Accept failure.");
                    continue;
                }
            };

            self.handle_client(client_counter.clone(), stream, client_addr, server_addr)
                .await;
        }
        Ok(())
    }

    /// Drive a [`vhook_protocol::Receiver`] over the connection until the client leaves.
    ///
    /// # Errors
    ///
    /// * the connection failed
    pub async fn run_session(
        stream: tokio::net::TcpStream,
        handler: Handler,
        config: std::sync::Arc<Config>,
        client_addr: std::net::SocketAddr,
        server_addr: std::net::SocketAddr,
        uuid: uuid::Uuid,
    ) -> anyhow::Result<()> {
        let receiver = vhook_protocol::Receiver::new(
            stream,
            handler,
            config.server.smtp.error.soft_count,
            config.server.smtp.error.hard_count,
            config.server.message_size_limit,
            config.server.smtp.timeout_client,
        );
        let smtp_stream = receiver.into_stream(
            client_addr,
            server_addr,
            time::OffsetDateTime::now_utc(),
            uuid,
        );
        tokio::pin!(smtp_stream);

        while let Some(message) = tokio_stream::StreamExt::next(&mut smtp_stream).await {
            message.context("connection failure")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{socket_bind_anyhow, Server, WebhookRegistry};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt};
    use vhook_test::{config, transport::Recorder};

    async fn serve(client_count_max: i64) -> (std::net::SocketAddr, tokio::task::JoinHandle<()>) {
        let mut config = config::local_test();
        config.server.client_count_max = client_count_max;

        let socket = socket_bind_anyhow("127.0.0.1:0").unwrap();
        let addr = socket.local_addr().unwrap();

        let server = Server::new(
            std::sync::Arc::new(config),
            std::sync::Arc::new(WebhookRegistry::new("sec123")),
            std::sync::Arc::new(Recorder::default()),
        );
        let handle = tokio::spawn(async move {
            server.listen_and_serve(vec![socket]).await.unwrap();
        });
        (addr, handle)
    }

    async fn read_line(
        stream: &mut tokio::io::BufReader<tokio::net::TcpStream>,
    ) -> String {
        let mut line = String::new();
        stream.read_line(&mut line).await.unwrap();
        line
    }

    #[tokio::test]
    async fn greetings_and_quit() {
        let (addr, handle) = serve(-1).await;

        let mut client =
            tokio::io::BufReader::new(tokio::net::TcpStream::connect(addr).await.unwrap());
        pretty_assertions::assert_eq!(
            read_line(&mut client).await,
            "220 testserver.com Service ready\r\n"
        );

        client.get_mut().write_all(b"QUIT\r\n").await.unwrap();
        pretty_assertions::assert_eq!(
            read_line(&mut client).await,
            "221 Service closing transmission channel\r\n"
        );

        handle.abort();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn client_count_max() {
        let (addr, handle) = serve(1).await;

        let mut first =
            tokio::io::BufReader::new(tokio::net::TcpStream::connect(addr).await.unwrap());
        pretty_assertions::assert_eq!(
            read_line(&mut first).await,
            "220 testserver.com Service ready\r\n"
        );

        let mut second =
            tokio::io::BufReader::new(tokio::net::TcpStream::connect(addr).await.unwrap());
        pretty_assertions::assert_eq!(
            read_line(&mut second).await,
            "554 Cannot process connection, closing\r\n"
        );

        first.get_mut().write_all(b"QUIT\r\n").await.unwrap();
        read_line(&mut first).await;

        handle.abort();
    }
}
