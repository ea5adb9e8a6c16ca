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

use crate::{Resolution, WebhookRegistry};
use vhook_common::{CodeID, Stage};

/// Progress of the transaction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum SessionState {
    /// Waiting for `MAIL FROM`.
    #[default]
    Idle,
    /// `MAIL FROM` received.
    HasSender,
    /// At least one recipient accepted.
    HasRecipient,
    /// The message has been received, the delivery is in progress.
    Complete,
    /// The connection is over.
    LoggedOut,
}

/// State of a connection, owned by its handler.
#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    client_name: Option<String>,
    sender: String,
    options: Vec<String>,
    recipient: Option<String>,
    destination: Option<String>,
    debug: bool,
}

impl Session {
    ///
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Stage of the SMTP transaction, used to order the commands.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match (&self.client_name, self.state) {
            (None, _) | (_, SessionState::LoggedOut) => Stage::Connect,
            (Some(_), SessionState::Idle | SessionState::Complete) => Stage::Helo,
            (Some(_), SessionState::HasSender) => Stage::MailFrom,
            (Some(_), SessionState::HasRecipient) => Stage::RcptTo,
        }
    }

    /// Sender of the transaction, empty for the null reverse path.
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// ESMTP parameters of `MAIL FROM`.
    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Last recipient accepted.
    #[must_use]
    pub fn recipient(&self) -> Option<&str> {
        self.recipient.as_deref()
    }

    /// Webhook of the last recipient accepted.
    #[must_use]
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    /// A diagnostic mailbox has been accepted.
    #[must_use]
    pub const fn is_debug(&self) -> bool {
        self.debug
    }

    /// `HELO`/`EHLO` received, any transaction in progress is aborted.
    pub fn on_helo(&mut self, client_name: String) {
        self.on_reset();
        self.client_name = Some(client_name);
    }

    /// Record the sender, always succeeds.
    pub fn on_mail(&mut self, sender: Option<String>, options: Vec<String>) {
        self.sender = sender.unwrap_or_default();
        self.options = options;
        self.state = SessionState::HasSender;

        tracing::info!(sender = %self.sender, options = ?self.options, "Sender received.");
    }

    /// Resolve the recipient, each accepted recipient replacing the destination
    /// of the previous one.
    ///
    /// # Errors
    ///
    /// * [`CodeID::BadMailbox`] if the recipient is not a valid address
    /// * [`CodeID::NoMailbox`] if no webhook is registered for the recipient
    pub fn on_rcpt(&mut self, registry: &WebhookRegistry, recipient: &str) -> Result<(), CodeID> {
        match registry.resolve(recipient) {
            Resolution::Malformed(error) => {
                tracing::warn!(
                    sender = %self.sender,
                    recipient,
                    code = 501,
                    %error,
                    "Invalid recipient."
                );
                return Err(CodeID::BadMailbox);
            }
            Resolution::Unknown => {
                tracing::warn!(sender = %self.sender, recipient, code = 550, "No mailbox.");
                return Err(CodeID::NoMailbox);
            }
            Resolution::Diagnostic => {
                tracing::info!(sender = %self.sender, recipient, "Diagnostic mailbox.");
                self.debug = true;
                self.destination = None;
            }
            Resolution::Forward(url) => {
                tracing::info!(sender = %self.sender, recipient, %url, "Recipient accepted.");
                self.destination = Some(url);
            }
        }

        self.recipient = Some(recipient.to_string());
        self.state = SessionState::HasRecipient;
        Ok(())
    }

    /// The message has been received.
    pub fn on_complete(&mut self) {
        self.state = SessionState::Complete;
    }

    /// Clear the transaction, the client name is kept.
    pub fn on_reset(&mut self) {
        self.state = SessionState::Idle;
        self.sender.clear();
        self.options.clear();
        self.recipient = None;
        self.destination = None;
        self.debug = false;
    }

    /// The connection is over.
    pub fn on_logout(&mut self) {
        self.on_reset();
        self.state = SessionState::LoggedOut;
    }
}
