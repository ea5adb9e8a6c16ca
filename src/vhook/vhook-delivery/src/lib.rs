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

//! vHook delivery system
//!
//! Post the messages to the webhooks, and classify the result.

#![doc(html_no_source)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]
//
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]

/// a few helpers to create systems that will deliver messages.
pub mod transport {
    ///
    #[async_trait::async_trait]
    pub trait Transport: Send + Sync {
        /// Post the `payload` to the `url`, and classify the response.
        ///
        /// Never retry, the sender is asked to try again later on failure.
        async fn deliver(&self, url: &str, content_type: &str, payload: Vec<u8>)
            -> crate::DeliveryOutcome;
    }

    mod http;

    pub use http::HttpTransport;
}

/// The request could not complete with a successful status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[allow(clippy::module_name_repetitions)]
pub enum DeliveryError {
    /// The webhook answered with a non-2xx status.
    #[error("the webhook answered with status {0}")]
    Status(u16),
    /// No response was received.
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Result of a single delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::module_name_repetitions)]
pub enum DeliveryOutcome {
    /// The webhook accepted the message.
    Delivered {
        /// Status of the response, in `200..=299`.
        status: u16,
    },
    /// see [`DeliveryError`]
    Failed(DeliveryError),
}

impl DeliveryOutcome {
    /// Classify the status of an HTTP response.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            200..=299 => Self::Delivered { status },
            _ => Self::Failed(DeliveryError::Status(status)),
        }
    }

    ///
    #[must_use]
    pub const fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

impl std::fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delivered { status } => write!(f, "delivered ({status})"),
            Self::Failed(error) => write!(f, "failed: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DeliveryError, DeliveryOutcome};

    #[rstest::rstest]
    #[case(100, DeliveryOutcome::Failed(DeliveryError::Status(100)))]
    #[case(199, DeliveryOutcome::Failed(DeliveryError::Status(199)))]
    #[case(200, DeliveryOutcome::Delivered { status: 200 })]
    #[case(202, DeliveryOutcome::Delivered { status: 202 })]
    #[case(299, DeliveryOutcome::Delivered { status: 299 })]
    #[case(300, DeliveryOutcome::Failed(DeliveryError::Status(300)))]
    #[case(404, DeliveryOutcome::Failed(DeliveryError::Status(404)))]
    #[case(503, DeliveryOutcome::Failed(DeliveryError::Status(503)))]
    fn from_status(#[case] status: u16, #[case] expected: DeliveryOutcome) {
        let outcome = DeliveryOutcome::from_status(status);
        pretty_assertions::assert_eq!(outcome.is_delivered(), (200..300).contains(&status));
        pretty_assertions::assert_eq!(outcome, expected);
    }

    #[test]
    fn display() {
        pretty_assertions::assert_eq!(
            DeliveryOutcome::Delivered { status: 200 }.to_string(),
            "delivered (200)"
        );
        pretty_assertions::assert_eq!(
            DeliveryOutcome::Failed(DeliveryError::Status(503)).to_string(),
            "failed: the webhook answered with status 503"
        );
    }
}
