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
    config::field::{
        FieldServer, FieldServerInterfaces, FieldServerLogs, FieldServerSMTP,
        FieldServerSMTPError,
    },
    Config,
};
use vhook_common::{collection, CodeID, Reply, ReplyCode};

impl Default for Config {
    fn default() -> Self {
        Self {
            server: FieldServer::default(),
            app: crate::field::FieldApp::default(),
        }
    }
}

impl Default for FieldServer {
    fn default() -> Self {
        Self {
            domain: Self::default_domain(),
            client_count_max: Self::default_client_count_max(),
            message_size_limit: Self::default_message_size_limit(),
            interfaces: FieldServerInterfaces::default(),
            logs: FieldServerLogs::default(),
            smtp: FieldServerSMTP::default(),
        }
    }
}

impl FieldServer {
    pub(crate) fn default_domain() -> String {
        "localhost".to_string()
    }

    pub(crate) const fn default_client_count_max() -> i64 {
        -1
    }

    pub(crate) const fn default_message_size_limit() -> usize {
        10 * 1024 * 1024
    }
}

impl Default for FieldServerInterfaces {
    fn default() -> Self {
        Self {
            addr: Self::default_addr(),
        }
    }
}

impl FieldServerInterfaces {
    pub(crate) fn default_addr() -> Vec<std::net::SocketAddr> {
        vec![std::net::SocketAddr::new(
            std::net::IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED),
            vhook_common::SMTP_PORT,
        )]
    }
}

impl Default for FieldServerLogs {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

impl FieldServerLogs {
    pub(crate) fn default_level() -> Vec<tracing_subscriber::filter::Directive> {
        vec![tracing_subscriber::filter::LevelFilter::INFO.into()]
    }
}

impl Default for FieldServerSMTPError {
    fn default() -> Self {
        Self {
            soft_count: 10,
            hard_count: 20,
            delay: std::time::Duration::from_millis(5000),
        }
    }
}

impl Default for FieldServerSMTP {
    fn default() -> Self {
        Self {
            error: FieldServerSMTPError::default(),
            timeout_client: Self::default_timeout_client(),
            codes: std::collections::BTreeMap::new(),
        }
    }
}

impl FieldServerSMTP {
    pub(crate) const fn default_timeout_client() -> std::time::Duration {
        std::time::Duration::from_secs(30)
    }

    /// The reply of each [`CodeID`], except [`CodeID::EhloPain`] which is generated
    /// by [`Config::ensure`].
    #[must_use]
    pub fn default_smtp_codes() -> std::collections::BTreeMap<CodeID, Reply> {
        collection! {
            CodeID::Greetings => Reply::new(
                ReplyCode::Code{ code: 220 }, "{domain} Service ready"
            ),
            CodeID::Help => Reply::new(
                ReplyCode::Code{ code: 214 }, "See https://datatracker.ietf.org/doc/html/rfc5321"
            ),
            CodeID::Closing => Reply::new(
                ReplyCode::Code{ code: 221 }, "Service closing transmission channel"
            ),
            CodeID::Helo => Reply::new(
                ReplyCode::Code{ code: 250 }, "{domain}"
            ),
            CodeID::DataStart => Reply::new(
                ReplyCode::Code{ code: 354 }, "Start mail input; end with <CRLF>.<CRLF>"
            ),
            CodeID::Ok => Reply::new(
                ReplyCode::Enhanced{ code: 250, enhanced: "2.0.0".to_string() }, "Ok"
            ),
            CodeID::Failure => Reply::new(
                ReplyCode::Code{ code: 451 }, "Requested action aborted: local error in processing"
            ),
            CodeID::UnrecognizedCommand => Reply::new(
                ReplyCode::Code{ code: 500 }, "Syntax error command unrecognized"
            ),
            CodeID::SyntaxErrorParams => Reply::new(
                ReplyCode::Code{ code: 501 }, "Syntax error in parameters or arguments"
            ),
            CodeID::Unimplemented => Reply::new(
                ReplyCode::Code{ code: 502 }, "Command not implemented"
            ),
            CodeID::BadSequence => Reply::new(
                ReplyCode::Code{ code: 503 }, "Bad sequence of commands"
            ),
            CodeID::MessageSizeExceeded => Reply::new(
                ReplyCode::Enhanced{ code: 552, enhanced: "5.3.4".to_string() }, "Message size exceeds fixed maximum message size"
            ),
            CodeID::BadMailbox => Reply::new(
                ReplyCode::Enhanced{ code: 501, enhanced: "5.1.3".to_string() }, "Bad recipient address syntax"
            ),
            CodeID::NoMailbox => Reply::new(
                ReplyCode::Enhanced{ code: 550, enhanced: "5.5.0".to_string() }, "No mailbox"
            ),
            CodeID::RelayFailed => Reply::new(
                ReplyCode::Enhanced{ code: 450, enhanced: "4.5.0".to_string() }, "Failed to relay message"
            ),
            CodeID::ConnectionMaxReached => Reply::new(
                ReplyCode::Code{ code: 554 }, "Cannot process connection, closing"
            ),
            CodeID::TooManyError => Reply::new(
                ReplyCode::Code{ code: 451 }, "Too many errors from the client"
            ),
            CodeID::Timeout => Reply::new(
                ReplyCode::Code{ code: 451 }, "Timeout - closing connection"
            ),
        }
    }
}
