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

use crate::WebhookRegistry;
use vhook_common::Address;

/// Mailboxes accepted for troubleshooting, whose messages are only logged.
pub const DIAGNOSTIC_MAILBOXES: [&str; 2] = ["postmaster@", "abuse@"];

/// What to do with the messages of a recipient.
#[derive(Debug)]
pub enum Resolution {
    /// The recipient is not a valid address.
    Malformed(anyhow::Error),
    /// The recipient is a diagnostic mailbox.
    Diagnostic,
    /// The messages are posted to this url.
    Forward(String),
    /// No webhook for this recipient.
    Unknown,
}

/// `<foo@bar>`, `Foo <foo@bar>` => `foo@bar`
fn unwrap_path(recipient: &str) -> &str {
    let recipient = recipient.trim();
    match (recipient.rfind('<'), recipient.strip_suffix('>')) {
        (Some(open), Some(inner)) => &inner[open + 1..],
        _ => recipient,
    }
}

impl WebhookRegistry {
    /// Find the destination of a recipient.
    ///
    /// The comparison with the prefixes is case-sensitive, and the first
    /// prefix matching wins, in no particular order.
    #[must_use]
    pub fn resolve(&self, recipient: &str) -> Resolution {
        let address = match unwrap_path(recipient).parse::<Address>() {
            Ok(address) => address,
            Err(error) => return Resolution::Malformed(error),
        };

        if DIAGNOSTIC_MAILBOXES
            .iter()
            .any(|mailbox| address.full().starts_with(mailbox))
        {
            return Resolution::Diagnostic;
        }

        self.webhooks
            .iter()
            .find(|(prefix, _)| address.full().starts_with(prefix.as_str()))
            .map_or(Resolution::Unknown, |(_, url)| {
                Resolution::Forward(url.clone())
            })
    }
}
