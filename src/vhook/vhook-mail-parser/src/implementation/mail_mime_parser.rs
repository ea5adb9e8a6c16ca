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

use crate::{Mail, MailAddress, MailParser, MailPart, ParserResult};
use mailparse::{DispositionType, MailHeaderMap};

/// Parse a message with the [`mailparse`] crate.
#[derive(Default)]
#[allow(clippy::module_name_repetitions)]
pub struct MailMimeParser;

/// `content-type` => `Content-Type`
fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
            })
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Addresses of every `name` header, a header which cannot be parsed is skipped.
fn addresses(headers: &[mailparse::MailHeader<'_>], name: &str) -> Vec<MailAddress> {
    let mut out = vec![];

    for header in headers.get_all_headers(name) {
        let list = match mailparse::addrparse_header(header) {
            Ok(list) => list,
            Err(error) => {
                tracing::debug!(
                    header = name,
                    value = %header.get_value(),
                    %error,
                    "Invalid address list ignored."
                );
                continue;
            }
        };

        for addr in list.iter() {
            match addr {
                mailparse::MailAddr::Single(single) => out.push(MailAddress {
                    name: single.display_name.clone(),
                    address: single.addr.clone(),
                }),
                mailparse::MailAddr::Group(group) => {
                    out.extend(group.addrs.iter().map(|single| MailAddress {
                        name: single.display_name.clone(),
                        address: single.addr.clone(),
                    }));
                }
            }
        }
    }

    out
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl MailMimeParser {
    /// Dispatch the leaf parts of the MIME tree in the body, the attachments and the inlines.
    fn walk(part: &mailparse::ParsedMail<'_>, mail: &mut Mail) -> ParserResult<()> {
        if !part.subparts.is_empty() {
            for sub in &part.subparts {
                Self::walk(sub, mail)?;
            }
            return Ok(());
        }

        let disposition = part.get_content_disposition();
        let explicit_disposition = part.headers.get_first_header("Content-Disposition").is_some();
        let filename = disposition
            .params
            .get("filename")
            .or_else(|| part.ctype.params.get("name"))
            .cloned();
        let content_type = part.ctype.mimetype.to_ascii_lowercase();

        match disposition.disposition {
            DispositionType::Attachment if explicit_disposition => {
                mail.attachments
                    .push(MailPart::new(content_type, filename, part.get_body_raw()?));
            }
            _ if filename.is_none() && content_type == "text/plain" && mail.body_text.is_none() => {
                mail.body_text = Some(part.get_body()?);
            }
            _ if filename.is_none() && content_type == "text/html" && mail.body_html.is_none() => {
                mail.body_html = Some(part.get_body()?);
            }
            DispositionType::Inline
                if explicit_disposition
                    || part.headers.get_first_header("Content-ID").is_some() =>
            {
                mail.inlines
                    .push(MailPart::new(content_type, filename, part.get_body_raw()?));
            }
            _ => {
                mail.attachments
                    .push(MailPart::new(content_type, filename, part.get_body_raw()?));
            }
        }

        Ok(())
    }
}

impl MailParser for MailMimeParser {
    #[tracing::instrument(name = "parse", skip_all, fields(size = raw.len()))]
    fn parse_sync(&mut self, raw: &[u8]) -> ParserResult<Mail> {
        let parsed = mailparse::parse_mail(raw)?;

        let mut mail = Mail {
            from: addresses(&parsed.headers, "From").into_iter().next(),
            to: addresses(&parsed.headers, "To"),
            cc: addresses(&parsed.headers, "Cc"),
            bcc: addresses(&parsed.headers, "Bcc"),
            date: non_empty(parsed.headers.get_first_value("Date")),
            subject: non_empty(parsed.headers.get_first_value("Subject")),
            headers: parsed
                .headers
                .iter()
                .map(|h| (canonical_header_name(&h.get_key()), h.get_value()))
                .collect(),
            ..Mail::default()
        };

        Self::walk(&parsed, &mut mail)?;

        mail.body_text = non_empty(mail.body_text);
        mail.body_html = non_empty(mail.body_html);

        tracing::debug!(
            attachments = mail.attachments.len(),
            inlines = mail.inlines.len(),
            "Message parsed."
        );

        Ok(mail)
    }
}

#[cfg(test)]
mod tests {
    use super::canonical_header_name;

    #[rstest::rstest]
    #[case("content-type", "Content-Type")]
    #[case("MESSAGE-ID", "Message-Id")]
    #[case("Subject", "Subject")]
    #[case("x-custom--header", "X-Custom--Header")]
    fn canonical(#[case] input: &str, #[case] expected: &str) {
        pretty_assertions::assert_eq!(canonical_header_name(input), expected);
    }
}
