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

use vhook_config::Config;
use vhook_delivery::transport::Transport;
use vhook_server::{Handler, WebhookRegistry};

/// A type implementing Write+Read to emulate sockets
#[derive(Debug)]
pub struct Mock<'a, T: AsRef<[u8]> + Unpin> {
    read_cursor: std::io::Cursor<T>,
    write_cursor: std::io::Cursor<&'a mut Vec<u8>>,
}

impl<'a, T: AsRef<[u8]> + Unpin> Mock<'a, T> {
    /// Create an new instance
    pub fn new(read: T, write: &'a mut Vec<u8>) -> Self {
        Self {
            read_cursor: std::io::Cursor::new(read),
            write_cursor: std::io::Cursor::new(write),
        }
    }
}

impl<T: AsRef<[u8]> + Unpin> tokio::io::AsyncRead for Mock<'_, T> {
    fn poll_read(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::result::Result<(), std::io::Error>> {
        tokio::io::AsyncRead::poll_read(std::pin::Pin::new(&mut self.read_cursor), cx, buf)
    }
}

impl<T: AsRef<[u8]> + Unpin> tokio::io::AsyncWrite for Mock<'_, T> {
    fn poll_write(
        mut self: std::pin::Pin<&mut Self>,
        _: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<Result<usize, std::io::Error>> {
        std::task::Poll::Ready(std::io::Write::write(&mut self.write_cursor, buf))
    }

    fn poll_flush(
        mut self: std::pin::Pin<&mut Self>,
        _: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), std::io::Error>> {
        std::task::Poll::Ready(std::io::Write::flush(&mut self.write_cursor))
    }

    fn poll_shutdown(
        self: std::pin::Pin<&mut Self>,
        _: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), std::io::Error>> {
        std::task::Poll::Ready(Ok(()))
    }
}

/// run a connection and assert output produced by `vHook` and `expected_output`
///
/// # Errors
///
/// * the connection failed
///
/// # Panics
///
/// * the output is not the one expected
pub async fn test_receiver_inner(
    smtp_input: &[u8],
    expected_output: &[u8],
    config: std::sync::Arc<Config>,
    registry: std::sync::Arc<WebhookRegistry>,
    transport: std::sync::Arc<dyn Transport>,
) -> anyhow::Result<()> {
    let mut written_data = Vec::new();

    let result = {
        let (read, write) = tokio::io::split(Mock::new(smtp_input.to_vec(), &mut written_data));

        let receiver = vhook_protocol::Receiver::with_io(
            read,
            write,
            Handler::new(config.clone(), registry, transport),
            config.server.smtp.error.soft_count,
            config.server.smtp.error.hard_count,
            config.server.message_size_limit,
            config.server.smtp.timeout_client,
        );
        let stream = receiver.into_stream(
            "127.0.0.1:53844".parse().unwrap(),
            "127.0.0.1:53845".parse().unwrap(),
            time::OffsetDateTime::now_utc(),
            uuid::Uuid::new_v4(),
        );
        tokio::pin!(stream);

        let mut result = Ok(());
        while let Some(message) = tokio_stream::StreamExt::next(&mut stream).await {
            if let Err(error) = message {
                result = Err(anyhow::Error::new(error));
                break;
            }
        }
        result
    };

    pretty_assertions::assert_eq!(
        std::str::from_utf8(expected_output),
        std::str::from_utf8(&written_data),
    );

    result
}

/// Call `test_receiver_inner`
#[allow(clippy::module_name_repetitions)]
#[macro_export]
macro_rules! test_receiver {
    ($input:expr, $output:expr) => {
        test_receiver! {
            with_transport => $crate::transport::Recorder::default(),
            with_config => $crate::config::local_test(),
            $input,
            $output
        }
    };
    (with_config => $config:expr, $input:expr, $output:expr) => {
        test_receiver! {
            with_transport => $crate::transport::Recorder::default(),
            with_config => $config,
            $input,
            $output
        }
    };
    (with_transport => $transport:expr, $input:expr, $output:expr) => {
        test_receiver! {
            with_transport => $transport,
            with_config => $crate::config::local_test(),
            $input,
            $output
        }
    };
    (with_transport => $transport:expr, with_config => $config:expr, $input:expr, $output:expr) => {
        $crate::receiver::test_receiver_inner(
            $input.as_bytes(),
            $output.as_bytes(),
            std::sync::Arc::new($config),
            std::sync::Arc::new($crate::config::local_registry()),
            std::sync::Arc::new($transport),
        )
        .await
    };
}
