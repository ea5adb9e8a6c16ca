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

use vhook_common::{CodeID, Reply};

/// The configuration of the relay.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// SMTP side of the relay.
    #[serde(default)]
    pub server: field::FieldServer,
    /// Webhook side of the relay.
    #[serde(default)]
    pub app: field::FieldApp,
}

/// The inner field of the `vHook` configuration.
#[allow(clippy::module_name_repetitions)]
pub mod field {
    use super::{CodeID, Reply};

    /// This configuration defines the SMTP listener.
    #[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct FieldServer {
        /// Name of the server, presented in the banner and the reply to `HELO`/`EHLO`.
        ///
        /// default: `localhost`
        #[serde(default = "FieldServer::default_domain")]
        pub domain: String,
        /// Maximum number of clients served at the same time.
        /// The client will be rejected if the server is full.
        ///
        /// If this value is `-1`, then the server will accept any number of clients.
        #[serde(default = "FieldServer::default_client_count_max")]
        pub client_count_max: i64,
        /// Maximum size in bytes of the message.
        #[serde(default = "FieldServer::default_message_size_limit")]
        pub message_size_limit: usize,
        /// see [`FieldServerInterfaces`]
        #[serde(default)]
        pub interfaces: FieldServerInterfaces,
        /// see [`FieldServerLogs`]
        #[serde(default)]
        pub logs: FieldServerLogs,
        /// see [`FieldServerSMTP`]
        #[serde(default)]
        pub smtp: FieldServerSMTP,
    }

    /// Address served by the server.
    #[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct FieldServerInterfaces {
        /// List of address for plain SMTP.
        #[serde(default = "FieldServerInterfaces::default_addr")]
        #[serde(deserialize_with = "crate::parser::socket_addr::deserialize")]
        pub addr: Vec<std::net::SocketAddr>,
    }

    /// The configuration of the `tracing` output.
    #[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct FieldServerLogs {
        /// Customize the log level of the different part of the program.
        ///
        /// See <https://docs.rs/tracing-subscriber/0.3.15/tracing_subscriber/filter/struct.EnvFilter.html>
        #[serde(
            default = "FieldServerLogs::default_level",
            serialize_with = "crate::parser::tracing_directive::serialize",
            deserialize_with = "crate::parser::tracing_directive::deserialize"
        )]
        pub level: Vec<tracing_subscriber::filter::Directive>,
    }

    /// Configuration of the client's error handling.
    #[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct FieldServerSMTPError {
        /// The maximum number of errors before the client is delay between each response.
        ///
        /// `-1` to disable
        pub soft_count: i64,
        /// The maximum number of errors before the client is disconnected.
        ///
        /// `-1` to disable
        pub hard_count: i64,
        /// The delay used between each response, after `soft_count` errors.
        /// Unused if `soft_count` is `-1`.
        #[serde(with = "humantime_serde")]
        pub delay: std::time::Duration,
    }

    /// Configuration of the SMTP session.
    #[serde_with::serde_as]
    #[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct FieldServerSMTP {
        /// SMTP's error policy.
        #[serde(default)]
        pub error: FieldServerSMTPError,
        /// Delay the server waits for the next command before closing the connection.
        #[serde(with = "humantime_serde")]
        #[serde(default = "FieldServerSMTP::default_timeout_client")]
        pub timeout_client: std::time::Duration,
        /// Dictionary of the reply sent by the server during the SMTP transaction.
        ///
        /// `{domain}` is replaced by [`FieldServer::domain`].
        #[serde(default)]
        #[serde_as(as = "std::collections::BTreeMap<serde_with::DisplayFromStr, _>")]
        pub codes: std::collections::BTreeMap<CodeID, Reply>,
    }

    /// Format of the payload posted to the webhooks.
    #[derive(
        Debug,
        Copy,
        Clone,
        Default,
        PartialEq,
        Eq,
        strum::Display,
        strum::EnumString,
        serde_with::DeserializeFromStr,
        serde_with::SerializeDisplay,
    )]
    #[strum(serialize_all = "lowercase")]
    pub enum DeliveryMode {
        /// The message is parsed and posted as a JSON document, `application/json`.
        #[default]
        Json,
        /// The message is posted as received, `message/rfc822`.
        Raw,
    }

    impl DeliveryMode {
        /// Value of the `Content-Type` header of the request.
        #[must_use]
        pub const fn content_type(self) -> &'static str {
            match self {
                Self::Json => "application/json",
                Self::Raw => "message/rfc822",
            }
        }
    }

    /// This configuration defines the webhooks of the relay.
    #[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct FieldApp {
        /// Secret shared with the senders, part of every recipient address: `<code>+<id>@`.
        #[serde(default)]
        pub code: String,
        /// see [`DeliveryMode`]
        #[serde(default)]
        pub mode: DeliveryMode,
        /// Destination url of each webhook, by identifier.
        #[serde(default)]
        pub webhooks: std::collections::BTreeMap<String, String>,
    }
}
