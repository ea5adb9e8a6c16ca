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

use anyhow::Context;
use vhook_config::Config;

#[cfg(debug_assertions)]
macro_rules! get_fmt {
    () => {
        tracing_subscriber::fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_target(true)
    };
}

#[cfg(not(debug_assertions))]
macro_rules! get_fmt {
    () => {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_thread_ids(false)
            .with_target(false)
    };
}

/// Build the filter of the events: `RUST_LOG` if set, otherwise the
/// directives of the configuration.
///
/// # Errors
///
/// * `RUST_LOG` is set but invalid
pub fn env_filter(config: &Config) -> anyhow::Result<tracing_subscriber::EnvFilter> {
    use tracing_subscriber::EnvFilter;

    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return EnvFilter::try_from_default_env()
            .with_context(|| format!("invalid directives in '{}'", EnvFilter::DEFAULT_ENV));
    }

    Ok(config
        .server
        .logs
        .level
        .iter()
        .cloned()
        .fold(EnvFilter::default(), EnvFilter::add_directive))
}

/// Initialize the tracing subsystem, the events are written on the standard output.
///
/// # Errors
///
/// * the filter cannot be built, see [`env_filter`]
/// * a global subscriber is already installed
pub fn initialize(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(env_filter(config)?)
        .with(get_fmt!().with_writer(std::io::stdout).with_ansi(true))
        .try_init()
        .map_err(|e| anyhow::anyhow!("{e}"))
}
