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

/// Environment variable defining a webhook, `WEBHOOK_URL_<IDENTIFIER>=<url>`.
pub const ENV_PREFIX: &str = "WEBHOOK_URL_";
/// Shorter form of [`ENV_PREFIX`], `WEBHOOK_<IDENTIFIER>=<url>`.
pub const ENV_PREFIX_LEGACY: &str = "WEBHOOK_";

/// Destination of the messages, by recipient prefix `<code>+<identifier>@`.
///
/// Built once at startup and shared read-only by every connection.
#[derive(Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct WebhookRegistry {
    code: String,
    pub(crate) webhooks: std::collections::HashMap<String, String>,
}

impl WebhookRegistry {
    /// Create an empty registry for the secret `code`.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            webhooks: std::collections::HashMap::new(),
        }
    }

    /// Build the registry from the webhooks of the configuration and the
    /// variables of the environment, the latter having the precedence.
    ///
    /// `WEBHOOK_URL_<IDENTIFIER>` is preferred over `WEBHOOK_<IDENTIFIER>`
    /// when both define the same identifier.
    #[must_use]
    pub fn build(config: &Config, env: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut registry = Self::new(config.app.code.clone());

        for (identifier, url) in &config.app.webhooks {
            registry.register(&config.server.domain, identifier, url.clone());
        }

        let (full, legacy): (Vec<_>, Vec<_>) = env
            .into_iter()
            .filter_map(|(key, value)| {
                if let Some(identifier) = key.strip_prefix(ENV_PREFIX) {
                    Some((true, identifier.to_string(), value))
                } else {
                    key.strip_prefix(ENV_PREFIX_LEGACY)
                        .map(|identifier| (false, identifier.to_string(), value))
                }
            })
            .partition(|(is_full, _, _)| *is_full);

        for (_, identifier, url) in legacy.into_iter().chain(full) {
            registry.register(&config.server.domain, &identifier, url);
        }

        registry
    }

    /// Associate the prefix `<code>+<lowercase identifier>@` to the `url`.
    ///
    /// Returns `false` if the mapping has been ignored.
    pub fn register(&mut self, domain: &str, identifier: &str, url: String) -> bool {
        if identifier.is_empty() || url.is_empty() {
            tracing::warn!(identifier, %url, "Ignoring incomplete webhook definition.");
            return false;
        }

        let prefix = self.prefix(identifier);
        tracing::info!("Forwarding {prefix}{domain} to {url}");

        if let Some(previous) = self.webhooks.insert(prefix.clone(), url) {
            tracing::warn!(%prefix, %previous, "Webhook overridden.");
        }
        true
    }

    /// Recipient prefix of a webhook.
    #[must_use]
    pub fn prefix(&self, identifier: &str) -> String {
        format!("{}+{}@", self.code, identifier.to_lowercase())
    }

    /// Number of webhooks registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.webhooks.len()
    }

    ///
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.webhooks.is_empty()
    }

    /// Destination url registered for the exact `prefix`.
    #[must_use]
    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.webhooks.get(prefix).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::WebhookRegistry;
    use vhook_config::Config;

    fn config(code: &str) -> Config {
        let mut config = Config::default();
        config.app.code = code.to_string();
        config
    }

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn from_env() {
        let registry = WebhookRegistry::build(
            &config("sec123"),
            env(&[
                ("WEBHOOK_URL_ORDERS", "https://example.com/hook"),
                ("WEBHOOK_Alerts", "https://example.com/alerts"),
                ("HOME", "/root"),
                ("MY_WEBHOOK_URL_X", "https://example.com/x"),
            ]),
        );

        pretty_assertions::assert_eq!(registry.len(), 2);
        pretty_assertions::assert_eq!(
            registry.get("sec123+orders@"),
            Some("https://example.com/hook")
        );
        pretty_assertions::assert_eq!(
            registry.get("sec123+alerts@"),
            Some("https://example.com/alerts")
        );
    }

    #[rstest::rstest]
    #[case::full_first(&[
        ("WEBHOOK_URL_ORDERS", "https://example.com/new"),
        ("WEBHOOK_ORDERS", "https://example.com/old"),
    ])]
    #[case::legacy_first(&[
        ("WEBHOOK_ORDERS", "https://example.com/old"),
        ("WEBHOOK_URL_ORDERS", "https://example.com/new"),
    ])]
    fn full_form_wins(#[case] pairs: &[(&str, &str)]) {
        let registry = WebhookRegistry::build(&config("sec123"), env(pairs));

        pretty_assertions::assert_eq!(registry.len(), 1);
        pretty_assertions::assert_eq!(
            registry.get("sec123+orders@"),
            Some("https://example.com/new")
        );
    }

    #[test]
    fn env_overrides_config() {
        let mut config = config("sec123");
        config.app.webhooks = vhook_common::collection! {
            "orders".to_string() => "https://example.com/file".to_string(),
            "billing".to_string() => "https://example.com/billing".to_string(),
        };

        let registry = WebhookRegistry::build(
            &config,
            env(&[("WEBHOOK_URL_ORDERS", "https://example.com/env")]),
        );

        pretty_assertions::assert_eq!(registry.len(), 2);
        pretty_assertions::assert_eq!(
            registry.get("sec123+orders@"),
            Some("https://example.com/env")
        );
        pretty_assertions::assert_eq!(
            registry.get("sec123+billing@"),
            Some("https://example.com/billing")
        );
    }

    #[test]
    fn incomplete_definitions_are_ignored() {
        let registry = WebhookRegistry::build(
            &config("sec123"),
            env(&[("WEBHOOK_URL_", "https://example.com/"), ("WEBHOOK_EMPTY", "")]),
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn register() {
        let mut registry = WebhookRegistry::new("code");

        assert!(registry.register("localhost", "MiXeD", "http://a".to_string()));
        pretty_assertions::assert_eq!(registry.prefix("MiXeD"), "code+mixed@");
        pretty_assertions::assert_eq!(registry.get("code+mixed@"), Some("http://a"));

        assert!(registry.register("localhost", "mixed", "http://b".to_string()));
        pretty_assertions::assert_eq!(registry.len(), 1);
        pretty_assertions::assert_eq!(registry.get("code+mixed@"), Some("http://b"));
    }
}
