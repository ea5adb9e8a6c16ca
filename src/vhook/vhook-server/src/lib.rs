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

//! vHook server
//!
//! Accept the SMTP connections, find the webhook of each recipient and post
//! the messages to it.

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
#![allow(clippy::multiple_crate_versions)]

mod healthcheck;
mod registry;
mod resolver;
mod runtime;
mod server;
mod session;

mod receiver {
    pub mod handler;
}

pub use healthcheck::{healthcheck, healthcheck_target};
pub use receiver::handler::Handler;
pub use registry::{WebhookRegistry, ENV_PREFIX, ENV_PREFIX_LEGACY};
pub use resolver::{Resolution, DIAGNOSTIC_MAILBOXES};
pub use runtime::start_runtime;
pub use server::{socket_bind_anyhow, Server};
pub use session::{Session, SessionState};
