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

use anyhow::Context;
use tokio_stream::StreamExt;
use vhook_common::Reply;
use vhook_protocol::{Reader, Writer};

/// Address to probe to check the listener `addr`, the loopback when bound on
/// every interface.
#[must_use]
pub fn healthcheck_target(addr: std::net::SocketAddr) -> std::net::SocketAddr {
    match addr.ip() {
        std::net::IpAddr::V4(ip) if ip.is_unspecified() => {
            (std::net::Ipv4Addr::LOCALHOST, addr.port()).into()
        }
        std::net::IpAddr::V6(ip) if ip.is_unspecified() => {
            (std::net::Ipv6Addr::LOCALHOST, addr.port()).into()
        }
        _ => addr,
    }
}

/// Open a session on a running server: expect the greetings, say `EHLO`,
/// and leave with `QUIT`.
///
/// # Errors
///
/// * the server is not reachable in time
/// * a reply is not the one expected
pub async fn healthcheck(
    addr: std::net::SocketAddr,
    timeout: std::time::Duration,
) -> anyhow::Result<()> {
    tokio::time::timeout(timeout, healthcheck_inner(addr))
        .await
        .with_context(|| format!("no answer from '{addr}' after {timeout:?}"))?
}

async fn expect(
    replies: &mut (impl tokio_stream::Stream<Item = Result<Reply, vhook_protocol::Error>> + Unpin),
    code: u16,
    step: &str,
) -> anyhow::Result<()> {
    let reply = replies
        .next()
        .await
        .with_context(|| format!("connection closed at {step}"))??;

    anyhow::ensure!(
        reply.code().value() == code,
        "unexpected reply at {step}: {reply:?}"
    );
    Ok(())
}

async fn healthcheck_inner(addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let stream = tokio::net::TcpStream::connect(addr)
        .await
        .with_context(|| format!("failed to connect to '{addr}'"))?;
    let (read, write) = stream.into_split();
    let (mut reader, mut writer) = (Reader::new(read), Writer::new(write));

    let replies = reader.as_reply_stream();
    tokio::pin!(replies);

    expect(&mut replies, 220, "greetings").await?;
    writer.send("EHLO healthcheck\r\n").await?;
    expect(&mut replies, 250, "EHLO").await?;
    writer.send("QUIT\r\n").await?;
    expect(&mut replies, 221, "QUIT").await?;

    Ok(())
}
