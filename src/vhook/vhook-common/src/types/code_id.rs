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

/// Key of a reply of the relay in the `server.smtp.codes` table.
///
/// Every key must have a reply once the configuration is ensured, the
/// defaults fill the ones left out by the user.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Deserialize,
    serde::Serialize,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
)]
#[serde(rename_all = "PascalCase")]
#[must_use]
pub enum CodeID {
    /// 220, banner sent on connection.
    Greetings,
    /// 214, answer to `HELP`.
    Help,
    /// 221, answer to `QUIT`.
    Closing,
    /// 250, answer to `HELO`.
    Helo,
    /// 250, answer to `EHLO`. Built from the domain and the message size limit,
    /// it cannot be configured.
    EhloPain,
    /// 354, answer to `DATA`.
    DataStart,
    /// 250, the command or the message is accepted.
    Ok,
    /// 451, the message could not be received.
    Failure,

    /// 500, the command is not known.
    UnrecognizedCommand,
    /// 501, the arguments of the command are invalid.
    SyntaxErrorParams,
    /// 502, the command is known but not served by the relay.
    Unimplemented,
    /// 503, the command is not allowed at this stage of the transaction.
    BadSequence,
    /// 552, the message is bigger than `server.message_size_limit`.
    MessageSizeExceeded,

    /// 501, the recipient is not a valid mailbox.
    BadMailbox,
    /// 550, the recipient matches no webhook.
    NoMailbox,
    /// 450, the webhook did not accept the message, the client should retry later.
    RelayFailed,

    /// 554, `server.client_count_max` connections are already served.
    ConnectionMaxReached,
    /// 451, appended to the reply once `server.smtp.error.hard_count` errors are reached.
    TooManyError,
    /// 451, the client sent no command in `server.smtp.timeout_client`.
    Timeout,
}
