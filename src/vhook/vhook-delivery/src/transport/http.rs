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

use super::Transport;
use crate::{DeliveryError, DeliveryOutcome};
use anyhow::Context;

/// Post the messages with a single [`reqwest::Client`], shared by every connection.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build the HTTP client, with rustls and the native roots.
    ///
    /// # Errors
    ///
    /// * the TLS backend cannot be initialized
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent(concat!("vhook/", env!("CARGO_PKG_VERSION")))
                .build()
                .context("failed to build the http client")?,
        })
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    #[tracing::instrument(name = "http", skip(self, payload), fields(size = payload.len()))]
    async fn deliver(&self, url: &str, content_type: &str, payload: Vec<u8>) -> DeliveryOutcome {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(payload)
            .send()
            .await;

        match response {
            Ok(response) => {
                let outcome = DeliveryOutcome::from_status(response.status().as_u16());
                if outcome.is_delivered() {
                    tracing::debug!(%outcome, "Webhook answered.");
                } else {
                    tracing::warn!(%outcome, "Webhook rejected the message.");
                }
                outcome
            }
            Err(error) => {
                tracing::warn!(%error, "Webhook unreachable.");
                DeliveryOutcome::Failed(DeliveryError::Transport(error.to_string()))
            }
        }
    }
}
