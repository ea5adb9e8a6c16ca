//! vHook configuration
//!
//! # Configuration
//!
//! The type [`Config`] is read from a TOML file with [`Config::from_toml`], or
//! created with [`Config::default`]. In both cases, the command line and the
//! environment are applied on top of it, then [`Config::ensure`] must be called
//! to fill the reply codes and validate the values.

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
#![allow(clippy::use_self)] // false positive

#[cfg(test)]
mod tests;

mod parser {
    pub mod socket_addr;
    pub mod tracing_directive;
}

mod config;
mod default;
mod ensure;

pub use config::{field, Config};

impl Config {
    /// Parse a [`Config`] with [TOML] format
    ///
    /// The returned value still has to go through [`Config::ensure`].
    ///
    /// # Errors
    ///
    /// * data is not a valid [TOML]
    /// * one field is unknown
    ///
    /// [TOML]: https://github.com/toml-lang/toml
    pub fn from_toml(input: &str) -> anyhow::Result<Self> {
        toml::from_str::<Self>(input).map_err(anyhow::Error::new)
    }

    /// Get the reply associated to the `code`.
    ///
    /// Fallback on a generic local error if the table has not been filled
    /// by [`Config::ensure`].
    #[must_use]
    pub fn reply(&self, code: vhook_common::CodeID) -> vhook_common::Reply {
        self.server.smtp.codes.get(&code).cloned().unwrap_or_else(|| {
            tracing::error!(%code, "Reply code missing in the configuration");
            vhook_common::Reply::new(
                vhook_common::ReplyCode::Code { code: 451 },
                "Requested action aborted: local error in processing",
            )
        })
    }
}
