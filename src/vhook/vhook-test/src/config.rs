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

use vhook_config::Config;
use vhook_server::WebhookRegistry;

/// Destination of the webhook `orders` of [`local_registry`].
pub const ORDERS_URL: &str = "https://example.com/hook";
/// Destination of the webhook `billing` of [`local_registry`].
pub const BILLING_URL: &str = "https://example.com/billing";

/// Get a config for local test
///
/// # Panics
///
/// * config cannot be built
#[must_use]
pub fn local_test() -> Config {
    let mut config = Config::default();
    config.server.domain = "testserver.com".to_string();
    config.server.interfaces.addr = vec!["127.0.0.1:10025".parse().unwrap()];
    config.server.smtp.error.soft_count = 5;
    config.server.smtp.error.hard_count = 10;
    config.server.smtp.error.delay = std::time::Duration::from_millis(10);
    config.app.code = "sec123".to_string();

    config.ensure().unwrap()
}

/// Same as [`local_test`], the messages being posted as received.
#[must_use]
pub fn local_test_raw() -> Config {
    let mut config = local_test();
    config.app.mode = vhook_config::field::DeliveryMode::Raw;
    config
}

/// Registry of [`local_test`]: `sec123+orders@` and `sec123+billing@`.
#[must_use]
pub fn local_registry() -> WebhookRegistry {
    WebhookRegistry::build(
        &local_test(),
        [
            ("WEBHOOK_URL_ORDERS".to_string(), ORDERS_URL.to_string()),
            ("WEBHOOK_BILLING".to_string(), BILLING_URL.to_string()),
        ],
    )
}
