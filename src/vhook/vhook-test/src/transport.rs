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

use vhook_delivery::{transport::Transport, DeliveryError, DeliveryOutcome};

/// A request the [`Recorder`] received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Destination of the request.
    pub url: String,
    /// `Content-Type` of the request.
    pub content_type: String,
    /// Body of the request.
    pub payload: Vec<u8>,
}

/// Record the deliveries instead of sending them, and answer with a fixed status.
#[derive(Debug, Clone)]
pub struct Recorder {
    status: Option<u16>,
    deliveries: std::sync::Arc<std::sync::Mutex<Vec<Delivery>>>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::answering(200)
    }
}

impl Recorder {
    /// Every webhook answers with `status`.
    #[must_use]
    pub fn answering(status: u16) -> Self {
        Self {
            status: Some(status),
            deliveries: std::sync::Arc::default(),
        }
    }

    /// Every webhook is unreachable.
    #[must_use]
    pub fn unreachable() -> Self {
        Self {
            status: None,
            deliveries: std::sync::Arc::default(),
        }
    }

    /// The deliveries attempted so far.
    #[must_use]
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Transport for Recorder {
    async fn deliver(&self, url: &str, content_type: &str, payload: Vec<u8>) -> DeliveryOutcome {
        self.deliveries.lock().unwrap().push(Delivery {
            url: url.to_string(),
            content_type: content_type.to_string(),
            payload,
        });

        self.status.map_or_else(
            || DeliveryOutcome::Failed(DeliveryError::Transport("connection refused".to_string())),
            DeliveryOutcome::from_status,
        )
    }
}
