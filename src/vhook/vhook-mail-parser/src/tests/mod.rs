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

use crate::{MailAddress, MailMimeParser, MailParser, MailPart};

#[test]
fn simple() {
    let mail = MailMimeParser::default()
        .parse_sync(include_bytes!("mail/simple.eml"))
        .unwrap();

    pretty_assertions::assert_eq!(
        mail.from,
        Some(MailAddress::with_name("John Doe", "jdoe@machine.example"))
    );
    pretty_assertions::assert_eq!(
        mail.to,
        vec![MailAddress::with_name("Mary Smith", "mary@example.net")]
    );
    assert!(mail.cc.is_empty());
    pretty_assertions::assert_eq!(mail.subject.as_deref(), Some("Saying Hello"));
    pretty_assertions::assert_eq!(
        mail.date.as_deref(),
        Some("Fri, 21 Nov 1997 09:55:06 -0600")
    );
    pretty_assertions::assert_eq!(
        mail.headers.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["Date", "From", "Message-Id", "Subject", "To"]
    );
    pretty_assertions::assert_eq!(
        mail.body_text.as_deref().map(str::trim_end),
        Some("This is a message just to say hello.\r\nSo, \"Hello\".")
    );
    assert!(mail.body_html.is_none());
    assert!(mail.attachments.is_empty());
    assert!(mail.inlines.is_empty());

    let json = serde_json::from_slice::<serde_json::Value>(&mail.to_json().unwrap()).unwrap();
    let mut keys = json
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect::<Vec<_>>();
    keys.sort_unstable();
    pretty_assertions::assert_eq!(
        keys,
        vec!["bodyText", "date", "from", "headers", "subject", "to"]
    );
}

#[test]
fn multipart() {
    let mail = MailMimeParser::default()
        .parse_sync(include_bytes!("mail/multipart.eml"))
        .unwrap();

    pretty_assertions::assert_eq!(mail.from, Some(MailAddress::new("orders@shop.example")));
    pretty_assertions::assert_eq!(
        mail.to,
        vec![
            MailAddress::with_name("Sec Orders", "sec123+orders@mail.example"),
            MailAddress::new("alice@mail.example"),
            MailAddress::new("bob@mail.example"),
        ]
    );
    pretty_assertions::assert_eq!(mail.cc, vec![MailAddress::new("carol@mail.example")]);
    pretty_assertions::assert_eq!(mail.bcc, vec![MailAddress::new("dave@mail.example")]);
    pretty_assertions::assert_eq!(mail.subject.as_deref(), Some("Commande n°1"));
    pretty_assertions::assert_eq!(
        mail.headers.get("X-Trace").map(String::as_str),
        Some("second")
    );
    pretty_assertions::assert_eq!(
        mail.headers.get("Mime-Version").map(String::as_str),
        Some("1.0")
    );

    pretty_assertions::assert_eq!(
        mail.body_text.as_deref().map(str::trim_end),
        Some("Your order is ready.")
    );
    pretty_assertions::assert_eq!(
        mail.body_html.as_deref().map(str::trim_end),
        Some("<p>Your order is ready.</p>")
    );

    pretty_assertions::assert_eq!(
        mail.inlines,
        vec![MailPart {
            content_type: "image/png".to_string(),
            filename: None,
            content: "iVBORw0KGgo=".to_string(),
            content_encoding: Some("base64".to_string()),
        }]
    );
    pretty_assertions::assert_eq!(
        mail.attachments,
        vec![
            MailPart {
                content_type: "text/plain".to_string(),
                filename: Some("invoice.txt".to_string()),
                content: "Hello".to_string(),
                content_encoding: None,
            },
            MailPart {
                content_type: "application/octet-stream".to_string(),
                filename: None,
                content: "iVBORw0KGgo=".to_string(),
                content_encoding: Some("base64".to_string()),
            },
        ]
    );
}

#[rstest::rstest]
#[case::folded_first_line(b" ping\r\n\r\nbody\r\n")]
#[case::lone_carriage_return(b"Subject: hello\r\n\rbody\r\n")]
fn not_a_message(#[case] input: &[u8]) {
    assert!(matches!(
        MailMimeParser::default().parse_sync(input),
        Err(crate::ParserError::InvalidMail(_))
    ));
}

#[test]
fn without_from() {
    let mail = MailMimeParser::default()
        .parse_sync(b"To: mary@example.net\r\nSubject: hi\r\n\r\nbody\r\n")
        .unwrap();

    assert!(mail.from.is_none());
    pretty_assertions::assert_eq!(
        mail.to,
        vec![MailAddress::new("mary@example.net")]
    );

    let json = serde_json::from_slice::<serde_json::Value>(&mail.to_json().unwrap()).unwrap();
    assert!(json.get("from").is_none());
    pretty_assertions::assert_eq!(json["subject"], "hi");
}

#[rstest::rstest]
#[case::unterminated_cc(
    "From: john@doe.example\r\nTo: mary@example.net\r\nCc: <unterminated\r\n\r\nbody\r\n",
    true
)]
#[case::unterminated_to(
    "From: john@doe.example\r\nTo: \"Mary <mary@example.net\r\n\r\nbody\r\n",
    false
)]
fn invalid_address_list_is_skipped(#[case] input: &str, #[case] has_to: bool) {
    let mail = MailMimeParser::default().parse_sync(input.as_bytes()).unwrap();

    pretty_assertions::assert_eq!(
        mail.from,
        Some(MailAddress::new("john@doe.example"))
    );
    assert!(mail.cc.is_empty());
    pretty_assertions::assert_eq!(!mail.to.is_empty(), has_to);
    pretty_assertions::assert_eq!(
        mail.body_text.as_deref().map(str::trim_end),
        Some("body")
    );
    assert!(mail.to_json().is_ok());
}
