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

use crate::{
    receiver::ReceiverContext, AcceptArgs, EhloArgs, Error, HeloArgs, MailFromArgs,
    ParseArgsError, RcptToArgs, UnparsedArgs, Verb,
};
use vhook_common::{Reply, ReplyCode, Stage};

fn reply(code: u16, text: &str) -> Reply {
    Reply::new(ReplyCode::Code { code }, text)
}

/// Trait to implement to handle the SMTP commands in pair with the [`Receiver`](crate::Receiver).
#[async_trait::async_trait]
pub trait ReceiverHandler {
    /// The [`Receiver`](crate::Receiver) does not store the context.
    /// This function is called after each command to get the context stage.
    fn get_stage(&self) -> Stage;

    /// Called when the client connects to the server.
    async fn on_accept(&mut self, ctx: &mut ReceiverContext, args: AcceptArgs) -> Reply;

    /// Called after receiving a [`Verb::Helo`] command.
    async fn on_helo(&mut self, ctx: &mut ReceiverContext, args: HeloArgs) -> Reply;

    /// Called after receiving a [`Verb::Ehlo`] command.
    async fn on_ehlo(&mut self, ctx: &mut ReceiverContext, args: EhloArgs) -> Reply;

    /// Called after receiving a [`Verb::MailFrom`] command.
    async fn on_mail_from(&mut self, ctx: &mut ReceiverContext, args: MailFromArgs) -> Reply;

    /// Called after receiving a [`Verb::RcptTo`] command.
    async fn on_rcpt_to(&mut self, ctx: &mut ReceiverContext, args: RcptToArgs) -> Reply;

    /// Called after receiving a [`Verb::Data`] command.
    /// The stream is the body of the message, with dot-stuffing handled.
    /// The stream return `None` when the message is finished (`.<CRLF>`).
    async fn on_message(
        &mut self,
        ctx: &mut ReceiverContext,
        stream: impl tokio_stream::Stream<Item = Result<Vec<u8>, Error>> + Send + Unpin,
    ) -> Reply;

    /// Called when the number of reply considered as error reached a threshold (hard).
    async fn on_hard_error(&mut self, ctx: &mut ReceiverContext, reply: Reply) -> Reply;

    /// Called when the number of reply considered as error reached a threshold (soft).
    async fn on_soft_error(&mut self, ctx: &mut ReceiverContext, reply: Reply) -> Reply;

    /// Called after receiving a [`Verb::Rset`] command.
    async fn on_rset(&mut self) -> Reply;

    /// Called once the session is over, after a [`Verb::Quit`] or when the
    /// connection is closed.
    async fn on_logout(&mut self);

    /// Called after receiving a [`Verb::Data`] command.
    async fn on_data(&mut self) -> Reply {
        reply(354, "Start mail input; end with <CRLF>.<CRLF>")
    }

    /// Called after receiving a [`Verb::Quit`] command.
    async fn on_quit(&mut self) -> Reply {
        reply(221, "Service closing transmission channel")
    }

    /// Called after receiving a [`Verb::Noop`] command.
    async fn on_noop(&mut self) -> Reply {
        reply(250, "Ok")
    }

    /// Called after receiving a [`Verb::Help`] command.
    async fn on_help(&mut self, _: UnparsedArgs) -> Reply {
        reply(214, "See https://datatracker.ietf.org/doc/html/rfc5321")
    }

    /// Called when the client did not send a command in time.
    async fn on_timeout(&mut self) -> Reply {
        reply(451, "Timeout - closing connection")
    }

    /// Called after receiving an unknown command (unrecognized or unimplemented).
    async fn on_unknown(&mut self, buffer: Vec<u8>) -> Reply {
        if Verb::is_unimplemented(&buffer) {
            reply(502, "Command not implemented")
        } else {
            reply(500, "Syntax error command unrecognized")
        }
    }

    /// Called when the stage of the transaction (obtained with [`get_stage`](Self::get_stage))
    /// and the command are not compatible.
    async fn on_bad_sequence(&mut self, _: (Verb, Stage)) -> Reply {
        reply(503, "Bad sequence of commands")
    }

    /// Called when an argument of a command is invalid.
    async fn on_args_error(&mut self, _: ParseArgsError) -> Reply {
        reply(501, "Syntax error in parameters or arguments")
    }
}
