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

use crate::{config::field::FieldServerSMTP, Config};
use vhook_common::{CodeID, Reply, ReplyCode};

impl Config {
    /// Validate the configuration, generate the reply to `EHLO`, fill the missing
    /// reply codes with their default values and replace `{domain}` in all of them.
    ///
    /// # Errors
    ///
    /// * no interface to listen on
    /// * `message_size_limit` is 0
    /// * a webhook url is empty
    pub fn ensure(mut self) -> anyhow::Result<Self> {
        anyhow::ensure!(
            !self.server.interfaces.addr.is_empty(),
            "The server must listen on at least one interface"
        );
        anyhow::ensure!(
            self.server.message_size_limit != 0,
            "The message size limit cannot be 0"
        );
        if let Some((id, _)) = self.app.webhooks.iter().find(|(_, url)| url.is_empty()) {
            anyhow::bail!("The url of the webhook '{id}' is empty");
        }
        if self.app.code.is_empty() && !self.app.webhooks.is_empty() {
            tracing::warn!("No secret code configured, recipient addresses are easy to guess");
        }

        self.server.smtp.codes.insert(
            CodeID::EhloPain,
            Reply::new(
                ReplyCode::Code { code: 250 },
                format!(
                    "{}\r\nENHANCEDSTATUSCODES\r\nSIZE {}",
                    self.server.domain, self.server.message_size_limit
                ),
            ),
        );

        let default_values = FieldServerSMTP::default_smtp_codes();
        let domain = self.server.domain.clone();
        let reply_codes = &mut self.server.smtp.codes;

        for key in <CodeID as strum::IntoEnumIterator>::iter() {
            let Some(reply) = reply_codes
                .get(&key)
                .or_else(|| default_values.get(&key))
            else {
                anyhow::bail!("No reply for the code '{key}'");
            };

            let reply = reply
                .to_string()
                .replace("{domain}", &domain)
                .parse::<Reply>()?;
            reply_codes.insert(key, reply);
        }

        Ok(self)
    }
}
