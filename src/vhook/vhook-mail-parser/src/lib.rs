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

//! vHook mail parser
//!
//! Convert a raw message (RFC 5322, MIME) into a [`Mail`] serialized as JSON
//! before being posted to a webhook.

#![doc(html_no_source)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]
//
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]

mod error;

mod implementation {
    pub mod mail_mime_parser;
}

mod message {
    pub mod mail;
}

pub use error::{ParserError, ParserResult};
pub use implementation::mail_mime_parser::MailMimeParser;
pub use message::mail::{Mail, MailAddress, MailPart};

/// An abstract mail parser
pub trait MailParser: Default {
    /// Produce a [`Mail`] from the raw bytes of a message.
    ///
    /// # Errors
    ///
    /// * the input is not a valid message
    fn parse_sync(&mut self, raw: &[u8]) -> ParserResult<Mail>;
}

#[cfg(test)]
mod tests;
