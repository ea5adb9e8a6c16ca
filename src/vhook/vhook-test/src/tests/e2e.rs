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

use crate::config;
use lettre::{
    transport::smtp::extension::ClientId, AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use vhook_delivery::transport::HttpTransport;
use vhook_server::{socket_bind_anyhow, Server, WebhookRegistry};

/// Serve on an ephemeral port, relaying `sec123+orders@` to `<webhook>/hook`.
fn serve(webhook: &str) -> (u16, tokio::task::JoinHandle<()>) {
    let config = config::local_test();

    let mut registry = WebhookRegistry::new(config.app.code.clone());
    registry.register(&config.server.domain, "Orders", format!("{webhook}/hook"));

    let socket = socket_bind_anyhow("127.0.0.1:0").unwrap();
    let port = socket.local_addr().unwrap().port();

    let server = Server::new(
        std::sync::Arc::new(config),
        std::sync::Arc::new(registry),
        std::sync::Arc::new(HttpTransport::new().unwrap()),
    );

    (
        port,
        tokio::spawn(async move {
            server.listen_and_serve(vec![socket]).await.unwrap();
        }),
    )
}

fn sender(port: u16) -> AsyncSmtpTransport<Tokio1Executor> {
    AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous("127.0.0.1")
        .port(port)
        .hello_name(ClientId::Domain("client.example".to_string()))
        .timeout(Some(std::time::Duration::from_secs(5)))
        .build()
}

fn order(recipient: &str) -> lettre::Message {
    lettre::Message::builder()
        .from("John Doe <john@doe.example>".parse().unwrap())
        .to(recipient.parse().unwrap())
        .subject("Order 42")
        .body(String::from("Your order is ready."))
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn forwarded_to_webhook() {
    let mut webhook = mockito::Server::new_async().await;
    let mock = webhook
        .mock("POST", "/hook")
        .match_header("content-type", "application/json")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "subject": "Order 42",
            "from": { "name": "John Doe", "address": "john@doe.example" },
            "to": [{ "address": "sec123+orders@mail.example" }],
        })))
        .with_status(200)
        .create_async()
        .await;

    let (port, handle) = serve(&webhook.url());

    let response = sender(port)
        .send(order("sec123+orders@mail.example"))
        .await
        .unwrap();
    assert!(response.is_positive());

    mock.assert_async().await;
    handle.abort();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn webhook_failure_is_transient() {
    let mut webhook = mockito::Server::new_async().await;
    let mock = webhook
        .mock("POST", "/hook")
        .with_status(503)
        .create_async()
        .await;

    let (port, handle) = serve(&webhook.url());

    let error = sender(port)
        .send(order("sec123+orders@mail.example"))
        .await
        .unwrap_err();
    assert!(error.is_transient(), "{error}");

    mock.assert_async().await;
    handle.abort();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_recipient_is_permanent() {
    let mut webhook = mockito::Server::new_async().await;
    let mock = webhook
        .mock("POST", "/hook")
        .expect(0)
        .create_async()
        .await;

    let (port, handle) = serve(&webhook.url());

    let error = sender(port)
        .send(order("sec123+billing@mail.example"))
        .await
        .unwrap_err();
    assert!(error.is_permanent(), "{error}");

    mock.assert_async().await;
    handle.abort();
}
