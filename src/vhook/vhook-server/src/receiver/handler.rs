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

use crate::{Session, WebhookRegistry};
use tokio_stream::StreamExt;
use vhook_common::{CodeID, Reply, Stage};
use vhook_config::Config;
use vhook_delivery::{transport::Transport, DeliveryError, DeliveryOutcome};
use vhook_mail_parser::{MailMimeParser, MailParser};
use vhook_protocol::{
    AcceptArgs, EhloArgs, Error, HeloArgs, MailFromArgs, ParseArgsError, RcptToArgs,
    ReceiverContext, UnparsedArgs, Verb,
};

/// Handle the SMTP commands of a connection, and relay its messages to the webhooks.
pub struct Handler {
    pub(crate) session: Session,
    config: std::sync::Arc<Config>,
    registry: std::sync::Arc<WebhookRegistry>,
    transport: std::sync::Arc<dyn Transport>,
}

impl Handler {
    ///
    #[must_use]
    pub fn new(
        config: std::sync::Arc<Config>,
        registry: std::sync::Arc<WebhookRegistry>,
        transport: std::sync::Arc<dyn Transport>,
    ) -> Self {
        Self {
            session: Session::default(),
            config,
            registry,
            transport,
        }
    }

    /// State of the connection.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    fn reply_in_config(&self, code: CodeID) -> Reply {
        self.config.reply(code)
    }

    async fn read_message(
        mut stream: impl tokio_stream::Stream<Item = Result<Vec<u8>, Error>> + Send + Unpin,
    ) -> Result<Vec<u8>, Error> {
        let mut message = Vec::new();
        while let Some(line) = stream.next().await {
            message.extend_from_slice(&line?);
        }
        Ok(message)
    }

    /// Build the payload posted to the webhook, as configured by `app.mode`.
    fn payload(&self, message: Vec<u8>) -> vhook_mail_parser::ParserResult<Vec<u8>> {
        match self.config.app.mode {
            vhook_config::field::DeliveryMode::Raw => Ok(message),
            vhook_config::field::DeliveryMode::Json => {
                MailMimeParser::default().parse_sync(&message)?.to_json()
            }
        }
    }

    /// Post the message to the destination of the transaction, if any.
    async fn relay(&self, message: Vec<u8>) -> Reply {
        let (sender, recipient) = (
            self.session.sender(),
            self.session.recipient().unwrap_or_default(),
        );

        if self.session.is_debug() {
            tracing::info!(
                sender,
                recipient,
                message = %String::from_utf8_lossy(&message),
                "Message received for a diagnostic mailbox."
            );
        }

        let Some(url) = self.session.destination().map(str::to_string) else {
            tracing::info!(sender, recipient, "No webhook, message discarded.");
            return self.reply_in_config(CodeID::Ok);
        };

        let payload = match self.payload(message) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(sender, recipient, code = 450, %error, "Message conversion failure.");
                return self.reply_in_config(CodeID::RelayFailed);
            }
        };

        // the request completes and is logged even if the client leaves in the meantime
        let outcome = tokio::spawn(deliver(
            self.transport.clone(),
            url,
            self.config.app.mode.content_type(),
            payload,
            sender.to_string(),
            recipient.to_string(),
        ))
        .await
        .unwrap_or_else(|error| {
            tracing::warn!(sender, recipient, code = 450, %error, "Message relay failure.");
            DeliveryOutcome::Failed(DeliveryError::Transport(error.to_string()))
        });

        if outcome.is_delivered() {
            self.reply_in_config(CodeID::Ok)
        } else {
            self.reply_in_config(CodeID::RelayFailed)
        }
    }
}

async fn deliver(
    transport: std::sync::Arc<dyn Transport>,
    url: String,
    content_type: &'static str,
    payload: Vec<u8>,
    sender: String,
    recipient: String,
) -> DeliveryOutcome {
    let outcome = transport.deliver(&url, content_type, payload).await;
    match &outcome {
        DeliveryOutcome::Delivered { status } => {
            tracing::info!(%sender, %recipient, %url, status, "Message relayed.");
        }
        DeliveryOutcome::Failed(error) => {
            tracing::warn!(%sender, %recipient, %url, code = 450, %error, "Message relay failure.");
        }
    }
    outcome
}

#[async_trait::async_trait]
impl vhook_protocol::ReceiverHandler for Handler {
    fn get_stage(&self) -> Stage {
        self.session.stage()
    }

    async fn on_accept(&mut self, _: &mut ReceiverContext, args: AcceptArgs) -> Reply {
        tracing::info!(
            client = %args.client_addr,
            server = %args.server_addr,
            uuid = %args.uuid,
            "Connection accepted."
        );
        self.reply_in_config(CodeID::Greetings)
    }

    async fn on_helo(&mut self, _: &mut ReceiverContext, args: HeloArgs) -> Reply {
        self.session.on_helo(args.client_name);
        self.reply_in_config(CodeID::Helo)
    }

    async fn on_ehlo(&mut self, _: &mut ReceiverContext, args: EhloArgs) -> Reply {
        self.session.on_helo(args.client_name.to_string());
        self.reply_in_config(CodeID::EhloPain)
    }

    async fn on_mail_from(&mut self, _: &mut ReceiverContext, args: MailFromArgs) -> Reply {
        self.session.on_mail(args.reverse_path, args.parameters);
        self.reply_in_config(CodeID::Ok)
    }

    async fn on_rcpt_to(&mut self, _: &mut ReceiverContext, args: RcptToArgs) -> Reply {
        match self.session.on_rcpt(&self.registry, &args.forward_path) {
            Ok(()) => self.reply_in_config(CodeID::Ok),
            Err(code) => self.reply_in_config(code),
        }
    }

    async fn on_message(
        &mut self,
        ctx: &mut ReceiverContext,
        stream: impl tokio_stream::Stream<Item = Result<Vec<u8>, Error>> + Send + Unpin,
    ) -> Reply {
        let reply = match Self::read_message(stream).await {
            Ok(message) => {
                self.session.on_complete();
                tracing::debug!(size = message.len(), "Message received.");
                self.relay(message).await
            }
            Err(Error::BufferTooLong { expected, got }) => {
                tracing::warn!(
                    sender = self.session.sender(),
                    max = expected,
                    size = got,
                    code = 552,
                    "Message too long."
                );
                self.reply_in_config(CodeID::MessageSizeExceeded)
            }
            Err(error) => {
                tracing::warn!(%error, "Message reception failure.");
                ctx.deny();
                self.reply_in_config(CodeID::Failure)
            }
        };

        self.session.on_reset();
        reply
    }

    async fn on_hard_error(&mut self, ctx: &mut ReceiverContext, reply: Reply) -> Reply {
        ctx.deny();
        reply.extended(&self.reply_in_config(CodeID::TooManyError))
    }

    async fn on_soft_error(&mut self, _: &mut ReceiverContext, reply: Reply) -> Reply {
        tokio::time::sleep(self.config.server.smtp.error.delay).await;
        reply
    }

    async fn on_rset(&mut self) -> Reply {
        self.session.on_reset();
        self.reply_in_config(CodeID::Ok)
    }

    async fn on_logout(&mut self) {
        self.session.on_logout();
        tracing::info!("Session over.");
    }

    async fn on_data(&mut self) -> Reply {
        self.reply_in_config(CodeID::DataStart)
    }

    async fn on_quit(&mut self) -> Reply {
        self.reply_in_config(CodeID::Closing)
    }

    async fn on_noop(&mut self) -> Reply {
        self.reply_in_config(CodeID::Ok)
    }

    async fn on_help(&mut self, _: UnparsedArgs) -> Reply {
        self.reply_in_config(CodeID::Help)
    }

    async fn on_timeout(&mut self) -> Reply {
        self.reply_in_config(CodeID::Timeout)
    }

    async fn on_unknown(&mut self, buffer: Vec<u8>) -> Reply {
        if Verb::is_unimplemented(&buffer) {
            self.reply_in_config(CodeID::Unimplemented)
        } else {
            self.reply_in_config(CodeID::UnrecognizedCommand)
        }
    }

    async fn on_bad_sequence(&mut self, (verb, stage): (Verb, Stage)) -> Reply {
        tracing::debug!(?verb, %stage, "Command out of sequence.");
        self.reply_in_config(CodeID::BadSequence)
    }

    async fn on_args_error(&mut self, error: ParseArgsError) -> Reply {
        tracing::debug!(?error, "Invalid arguments.");
        self.reply_in_config(CodeID::SyntaxErrorParams)
    }
}

#[cfg(test)]
mod tests {
    use super::Handler;
    use crate::WebhookRegistry;
    use vhook_delivery::{transport::Transport, DeliveryOutcome};

    /// A webhook answering 503 once released.
    struct Gated(std::sync::Arc<tokio::sync::Semaphore>);

    #[async_trait::async_trait]
    impl Transport for Gated {
        async fn deliver(&self, _: &str, _: &str, _: Vec<u8>) -> DeliveryOutcome {
            let _permit = self.0.acquire().await.unwrap();
            DeliveryOutcome::from_status(503)
        }
    }

    #[derive(Clone, Default)]
    struct Logs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl Logs {
        fn contains(&self, pattern: &str) -> bool {
            String::from_utf8_lossy(&self.0.lock().unwrap()).contains(pattern)
        }
    }

    impl std::io::Write for Logs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn relay_failure_logged_after_client_left() {
        let logs = Logs::default();
        let writer = logs.clone();
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::fmt()
                .with_writer(move || writer.clone())
                .finish(),
        );

        let mut registry = WebhookRegistry::new("sec123");
        registry.register("mail.example", "orders", "https://example.com/hook".to_string());
        let registry = std::sync::Arc::new(registry);
        let gate = std::sync::Arc::new(tokio::sync::Semaphore::new(0));

        let mut handler = Handler::new(
            std::sync::Arc::new(vhook_test::config::local_test_raw()),
            registry.clone(),
            std::sync::Arc::new(Gated(gate.clone())),
        );
        handler.session.on_helo("client.example".to_string());
        handler
            .session
            .on_mail(Some("john@doe.example".to_string()), vec![]);
        handler
            .session
            .on_rcpt(&registry, "sec123+orders@mail.example")
            .unwrap();

        // the client leaves while the webhook is pending
        let relay = handler.relay(b"Subject: hi\r\n\r\nbody\r\n".to_vec());
        assert!(
            tokio::time::timeout(std::time::Duration::from_millis(50), relay)
                .await
                .is_err()
        );
        assert!(!logs.contains("Message relay failure."));

        gate.add_permits(1);
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while !logs.contains("Message relay failure.") {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert!(logs.contains("sec123+orders@mail.example"));
        assert!(logs.contains("https://example.com/hook"));
    }
}
