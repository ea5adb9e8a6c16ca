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

//! vHook executable
//!
//! Receive mail over SMTP and forward each message to the webhook its recipient
//! address designates.

#![doc(html_no_source)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]
//
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Initialization of the logging system.
pub mod tracing_subscriber;

use anyhow::Context;
use vhook_config::{field::DeliveryMode, Config};

/// A duration given on the command line, in the [`humantime`] format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeout(pub std::time::Duration);

impl std::str::FromStr for Timeout {
    type Err = humantime::DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        humantime::parse_duration(s).map(Timeout)
    }
}

/// A webhook given on the command line: `<identifier>=<url>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Webhook {
    /// Identifier of the webhook, part of the recipient address.
    pub identifier: String,
    /// Destination of the messages.
    pub url: String,
}

impl std::str::FromStr for Webhook {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (identifier, url) = s
            .split_once('=')
            .with_context(|| format!("expected '<identifier>=<url>', got '{s}'"))?;

        anyhow::ensure!(!identifier.is_empty(), "the identifier of '{s}' is empty");
        anyhow::ensure!(!url.is_empty(), "the url of '{s}' is empty");

        Ok(Self {
            identifier: identifier.to_string(),
            url: url.to_string(),
        })
    }
}

/// Command line of `vhook`, every option can also be set in the environment.
#[derive(Debug, clap::Parser, PartialEq, Eq)]
#[command(name = "vhook", about, author, version = concat!("v", env!("CARGO_PKG_VERSION")))]
pub struct Args {
    /// Path of the configuration file (toml format)
    #[arg(short, long)]
    pub config: Option<String>,

    #[command(subcommand)]
    #[allow(missing_docs)]
    pub command: Option<Commands>,

    /// Domain presented in the banner and the reply to HELO/EHLO
    #[arg(long, env = "DOMAIN")]
    pub domain: Option<String>,

    /// Secret part of every recipient address: <code>+<identifier>@
    #[arg(long, env = "CODE")]
    pub code: Option<String>,

    /// Format of the payload posted to the webhooks
    #[arg(long, env = "MODE", value_name = "json|raw")]
    pub mode: Option<DeliveryMode>,

    /// Addresses to listen on, separated by ','
    #[arg(long, env = "LISTEN", value_delimiter = ',')]
    pub listen: Vec<std::net::SocketAddr>,

    /// Forward the mails of <code>+<identifier>@ to <url>
    #[arg(long = "webhook", value_name = "ID=URL")]
    pub webhooks: Vec<Webhook>,

    /// Check that a server is answering on the configured address, and exit
    #[arg(long)]
    pub healthcheck: bool,

    /// Make the server stop after a delay (human readable format)
    #[arg(short, long)]
    pub timeout: Option<Timeout>,
}

///
#[derive(Debug, clap::Subcommand, PartialEq, Eq)]
pub enum Commands {
    /// Show the loaded config (as serialized json format)
    ConfigShow,
    /// Show the difference between the loaded config and the default one
    ConfigDiff,
}

impl Args {
    /// Build the configuration: the file if any, then the options of the
    /// command line and the environment.
    ///
    /// # Errors
    ///
    /// * the file cannot be read or is not a valid configuration
    /// * the resulting configuration is invalid, see [`Config::ensure`]
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read file '{path}'"))
                .and_then(|content| Config::from_toml(&content))
                .with_context(|| format!("Cannot load the configuration at '{path}'"))?,
            None => Config::default(),
        };

        if let Some(domain) = &self.domain {
            config.server.domain.clone_from(domain);
        }
        if let Some(code) = &self.code {
            config.app.code.clone_from(code);
        }
        if let Some(mode) = self.mode {
            config.app.mode = mode;
        }
        if !self.listen.is_empty() {
            config.server.interfaces.addr.clone_from(&self.listen);
        }
        for Webhook { identifier, url } in &self.webhooks {
            config.app.webhooks.insert(identifier.clone(), url.clone());
        }

        config.ensure()
    }
}
