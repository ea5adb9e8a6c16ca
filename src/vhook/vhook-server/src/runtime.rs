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

use crate::{Server, WebhookRegistry};
use anyhow::Context;
use vhook_config::Config;
use vhook_delivery::transport::{HttpTransport, Transport};

fn init_runtime<F>(
    sender: tokio::sync::mpsc::Sender<()>,
    name: impl Into<String>,
    future: F,
    timeout: Option<std::time::Duration>,
) -> anyhow::Result<std::thread::JoinHandle<anyhow::Result<()>>>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let name = name.into();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name(format!("{name}-child"))
        .build()?;

    std::thread::Builder::new()
        .name(format!("{name}-main"))
        .spawn(move || {
            let name_rt = name.clone();
            runtime.block_on(async move {
                tracing::info!(name = %name_rt, "Runtime started successfully.");

                match timeout {
                    Some(duration) => {
                        if tokio::time::timeout(duration, future).await.is_ok() {
                            tracing::warn!(name = %name_rt, "Runtime stopped before the timeout.");
                        }
                    }
                    None => future.await,
                }
            });

            sender.blocking_send(())?;
            Ok(())
        })
        .map_err(anyhow::Error::new)
}

/// Start the `vHook` server's runtime, and block until the server stops
/// or a termination signal is received.
///
/// # Errors
///
/// * the http client cannot be built
/// * the runtime cannot be started
/// * the signal handlers cannot be registered
#[allow(clippy::module_name_repetitions)]
pub fn start_runtime(
    config: Config,
    registry: WebhookRegistry,
    sockets: Vec<std::net::TcpListener>,
    timeout: Option<std::time::Duration>,
) -> anyhow::Result<()> {
    let config = std::sync::Arc::new(config);
    let registry = std::sync::Arc::new(registry);
    let transport: std::sync::Arc<dyn Transport> =
        std::sync::Arc::new(HttpTransport::new().context("could not initialize delivery")?);

    if registry.is_empty() {
        tracing::warn!("No webhook registered, every recipient will be rejected.");
    }

    let mut error_handler = tokio::sync::mpsc::channel::<()>(3);

    let _tasks_receiver = init_runtime(
        error_handler.0.clone(),
        "receiver",
        async move {
            let server = Server::new(config, registry, transport);
            if let Err(error) = server.listen_and_serve(sockets).await {
                tracing::error!(%error, "Receiver failure.");
            }
        },
        timeout,
    )?;

    let error_handler_sig = error_handler.0.clone();
    let mut signals = signal_hook::iterator::Signals::new([
        // Send by `docker stop` (and then sending `SIGKILL`)
        signal_hook::consts::SIGTERM,
        // Ctrl+C on a terminal
        signal_hook::consts::SIGINT,
    ])?;
    let _signal_handler = std::thread::spawn(move || {
        for sig in signals.forever() {
            tracing::warn!(signal = sig, "Stopping vHook server.");
            if error_handler_sig.blocking_send(()).is_err() {
                break;
            }
        }
    });

    error_handler.1.blocking_recv();

    Ok(())
}
