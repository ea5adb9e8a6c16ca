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

use vhook::{tracing_subscriber, Args, Commands};
use vhook_config::Config;
use vhook_server::{
    healthcheck, healthcheck_target, socket_bind_anyhow, start_runtime, WebhookRegistry,
};

const HEALTHCHECK_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

fn main() {
    if let Err(err) = try_main() {
        eprintln!("ERROR: {err}");
        tracing::error!("ERROR: {err}");
        err.chain().skip(1).for_each(|cause| {
            eprintln!("because: {cause}");
            tracing::error!("because: {cause}");
        });
        std::process::exit(1);
    }
}

fn show_diff(config: &Config) -> anyhow::Result<()> {
    let loaded = serde_json::to_string_pretty(config)?;
    let default = serde_json::to_string_pretty(&Config::default().ensure()?)?;

    for diff in diff::lines(&default, &loaded) {
        match diff {
            diff::Result::Left(left) => println!("-\x1b[0;31m{left}\x1b[0m"),
            diff::Result::Both(same, _) => println!(" {same}"),
            diff::Result::Right(right) => println!("+\x1b[0;32m{right}\x1b[0m"),
        }
    }
    Ok(())
}

fn probe(config: &Config) -> anyhow::Result<()> {
    let addr = config
        .server
        .interfaces
        .addr
        .first()
        .copied()
        .map(healthcheck_target)
        .ok_or_else(|| anyhow::anyhow!("no interface to check"))?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(healthcheck(addr, HEALTHCHECK_TIMEOUT))?;

    println!("vHook is answering on '{addr}'");
    Ok(())
}

// variables which are not valid unicode cannot define a webhook
fn environment() -> impl Iterator<Item = (String, String)> {
    std::env::vars_os()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}

fn try_main() -> anyhow::Result<()> {
    // the .env file is optional
    dotenv::dotenv().ok();

    let args = <Args as clap::Parser>::parse();
    let config = args.load_config()?;

    match args.command {
        Some(Commands::ConfigShow) => {
            let stringified = serde_json::to_string_pretty(&config)?;
            println!("Loaded configuration: {stringified}");
            return Ok(());
        }
        Some(Commands::ConfigDiff) => return show_diff(&config),
        None => {}
    }

    if args.healthcheck {
        return probe(&config);
    }

    tracing_subscriber::initialize(&config)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        git = env!("GIT_HASH"),
        domain = %config.server.domain,
        mode = %config.app.mode,
        "Starting vHook."
    );

    let registry = WebhookRegistry::build(&config, environment());

    let sockets = config
        .server
        .interfaces
        .addr
        .iter()
        .map(socket_bind_anyhow)
        .collect::<anyhow::Result<Vec<_>>>()?;

    start_runtime(config, registry, sockets, args.timeout.map(|t| t.0))
}
