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

use crate::{field::DeliveryMode, Config};
use vhook_common::{CodeID, Reply, ReplyCode};

#[test]
fn empty_is_default() {
    pretty_assertions::assert_eq!(Config::from_toml("").unwrap(), Config::default());
}

#[test]
fn parse_full() {
    let toml = r#"
[server]
domain = "mail.example"
client_count_max = 16
message_size_limit = 1000

[server.interfaces]
addr = ["0.0.0.0:2525", "[::1]:2525"]

[server.logs]
level = ["warn", "vhook_server=debug"]

[server.smtp]
timeout_client = "10s"

[server.smtp.error]
soft_count = 2
hard_count = 4
delay = "100ms"

[server.smtp.codes]
Greetings = "220 {domain} vHook ready"

[app]
code = "sec123"
mode = "raw"

[app.webhooks]
orders = "https://example.com/hook"
"#;

    let config = Config::from_toml(toml).unwrap().ensure().unwrap();

    pretty_assertions::assert_eq!(config.server.domain, "mail.example");
    pretty_assertions::assert_eq!(config.server.client_count_max, 16);
    pretty_assertions::assert_eq!(
        config.server.interfaces.addr,
        vec![
            "0.0.0.0:2525".parse().unwrap(),
            "[::1]:2525".parse().unwrap()
        ]
    );
    pretty_assertions::assert_eq!(
        config.server.smtp.timeout_client,
        std::time::Duration::from_secs(10)
    );
    pretty_assertions::assert_eq!(
        config.server.smtp.error.delay,
        std::time::Duration::from_millis(100)
    );
    pretty_assertions::assert_eq!(config.app.code, "sec123");
    pretty_assertions::assert_eq!(config.app.mode, DeliveryMode::Raw);
    pretty_assertions::assert_eq!(
        config.app.webhooks.get("orders").map(String::as_str),
        Some("https://example.com/hook")
    );
    pretty_assertions::assert_eq!(
        config.reply(CodeID::Greetings).to_string(),
        "220 mail.example vHook ready\r\n"
    );
}

#[test]
fn unknown_field() {
    assert!(Config::from_toml("[server]\nport = 25\n").is_err());
    assert!(Config::from_toml("[app]\nmode = \"xml\"\n").is_err());
}

#[test]
fn ensure_fill_codes() {
    let mut config = Config::default();
    config.server.domain = "relay.example".to_string();
    let config = config.ensure().unwrap();

    for code in <CodeID as strum::IntoEnumIterator>::iter() {
        assert!(config.server.smtp.codes.contains_key(&code), "{code}");
    }

    pretty_assertions::assert_eq!(
        config.reply(CodeID::EhloPain).to_string(),
        concat!(
            "250-relay.example\r\n",
            "250-ENHANCEDSTATUSCODES\r\n",
            "250 SIZE 10485760\r\n"
        )
    );
    pretty_assertions::assert_eq!(
        config.reply(CodeID::NoMailbox),
        Reply::new(
            ReplyCode::Enhanced {
                code: 550,
                enhanced: "5.5.0".to_string()
            },
            "No mailbox"
        )
    );
    pretty_assertions::assert_eq!(
        config.reply(CodeID::RelayFailed).to_string(),
        "450 4.5.0 Failed to relay message\r\n"
    );
}

#[test]
fn ensure_reject() {
    let mut config = Config::default();
    config.server.interfaces.addr.clear();
    assert!(config.ensure().is_err());

    let mut config = Config::default();
    config.app.webhooks.insert("orders".to_string(), String::new());
    assert!(config.ensure().is_err());
}

#[test]
fn reply_without_ensure() {
    pretty_assertions::assert_eq!(
        Config::default().reply(CodeID::Ok).code().value(),
        451
    );
}

#[test]
fn serialize_round_trip() {
    let config = Config::default().ensure().unwrap();
    let json = serde_json::to_string(&config).unwrap();
    pretty_assertions::assert_eq!(serde_json::from_str::<Config>(&json).unwrap(), config);
}

#[rstest::rstest]
#[case("json", "application/json")]
#[case("raw", "message/rfc822")]
fn delivery_mode(#[case] input: &str, #[case] content_type: &str) {
    let mode = input.parse::<DeliveryMode>().unwrap();
    pretty_assertions::assert_eq!(mode.content_type(), content_type);
    pretty_assertions::assert_eq!(mode.to_string(), input);
}
