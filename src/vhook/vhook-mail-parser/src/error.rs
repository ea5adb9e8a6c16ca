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

/// Error produced while converting a message.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    /// The MIME structure of the message cannot be decoded.
    #[error("parsing email failed: {0}")]
    InvalidMail(#[from] mailparse::MailParseError),
    /// The message cannot be written as JSON.
    #[error("cannot serialize the message: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result of the conversion of a message.
#[allow(clippy::module_name_repetitions)]
pub type ParserResult<T> = Result<T, ParserError>;
