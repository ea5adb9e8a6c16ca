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

//! vHook protocol implementation
//!
//! Implement the server side of a plain ESMTP session, without TLS nor SASL.

#![doc(html_no_source)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]
//
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
//
#![allow(clippy::missing_const_for_fn)] // see https://github.com/rust-lang/rust-clippy/issues/9271
#![allow(clippy::indexing_slicing)] // issue with async_stream

mod command;
mod error;
mod reader;
mod receiver;
mod receiver_handler;
mod writer;

pub use command::{
    AcceptArgs, ClientName, EhloArgs, HeloArgs, MailFromArgs, ParseArgsError, RcptToArgs,
    UnparsedArgs, Verb,
};
pub use error::Error;
pub use reader::Reader;
pub use receiver::{Receiver, ReceiverContext};
pub use receiver_handler::ReceiverHandler;
pub use writer::{ErrorCounter, Writer};
