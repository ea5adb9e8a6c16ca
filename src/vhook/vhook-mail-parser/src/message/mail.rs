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

use crate::ParserResult;

/// An address of the header section of a message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MailAddress {
    /// Display name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The address itself, `local-part@domain`.
    pub address: String,
}

impl MailAddress {
    /// Create an address without display name.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            name: None,
            address: address.into(),
        }
    }

    /// Create an address with a display name.
    #[must_use]
    pub fn with_name(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            address: address.into(),
        }
    }
}

/// An attachment or an inline part of a message, decoded.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MailPart {
    /// Mime type of the part, such as `image/png`.
    pub content_type: String,
    /// Name of the file, from the `Content-Disposition` or the `Content-Type`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Content of the part, as text if the decoded bytes are valid UTF-8,
    /// base64 otherwise.
    pub content: String,
    /// `base64` when [`MailPart::content`] is not the decoded text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_encoding: Option<String>,
}

impl MailPart {
    /// Build a part from its decoded content.
    #[must_use]
    pub fn new(content_type: String, filename: Option<String>, content: Vec<u8>) -> Self {
        match String::from_utf8(content) {
            Ok(content) => Self {
                content_type,
                filename,
                content,
                content_encoding: None,
            },
            Err(e) => Self {
                content_type,
                filename,
                content: base64::Engine::encode(
                    &base64::engine::general_purpose::STANDARD,
                    e.into_bytes(),
                ),
                content_encoding: Some("base64".to_string()),
            },
        }
    }
}

/// Message parsed, as posted to the webhooks.
///
/// Empty fields are not serialized.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Mail {
    /// First address of the `From` header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<MailAddress>,
    /// Addresses of the `To` headers.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<MailAddress>,
    /// Addresses of the `Cc` headers.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<MailAddress>,
    /// Addresses of the `Bcc` headers.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<MailAddress>,
    /// `Date` header, as written in the message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// `Subject` header, decoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Every header of the top level, with the value of its last occurrence.
    #[serde(skip_serializing_if = "std::collections::BTreeMap::is_empty")]
    pub headers: std::collections::BTreeMap<String, String>,
    /// First `text/plain` part which is not an attachment.
    #[serde(rename = "bodyText", skip_serializing_if = "Option::is_none")]
    pub body_text: Option<String>,
    /// First `text/html` part which is not an attachment.
    #[serde(rename = "bodyHTML", skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    /// Parts to be downloaded, in the order of the message.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<MailPart>,
    /// Parts displayed within the body (`Content-Disposition: inline` or `Content-ID`).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inlines: Vec<MailPart>,
}

impl Mail {
    /// Serialize the message as a JSON document.
    ///
    /// # Errors
    ///
    /// * see [`serde_json::to_vec`]
    pub fn to_json(&self) -> ParserResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
