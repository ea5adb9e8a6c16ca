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

use crate::ReplyCode;

/// SMTP message send by the server to the client as defined in RFC5321#4.2
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    code: ReplyCode,
    text: Vec<String>,
    folded: String,
}

impl serde::Serialize for Reply {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.folded)
    }
}

impl<'de> serde::Deserialize<'de> for Reply {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ReplyVisitor;

        impl<'de> serde::de::Visitor<'de> for ReplyVisitor {
            type Value = Reply;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("a reply as a string, or a map with `code`, `enhanced` and `text`")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                <Reply as std::str::FromStr>::from_str(v).map_err(serde::de::Error::custom)
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                #[derive(serde::Deserialize)]
                #[serde(field_identifier, rename_all = "lowercase")]
                enum Field {
                    Code,
                    Enhanced,
                    Text,
                }

                let mut text: Option<String> = None;
                let mut code = None;
                let mut enhanced = None;

                while let Some(key) = map.next_key()? {
                    match key {
                        Field::Code => {
                            if code.is_some() {
                                return Err(serde::de::Error::duplicate_field("code"));
                            }
                            code = Some(map.next_value()?);
                        }
                        Field::Text => {
                            if text.is_some() {
                                return Err(serde::de::Error::duplicate_field("text"));
                            }
                            text = Some(map.next_value()?);
                        }
                        Field::Enhanced => {
                            if enhanced.is_some() {
                                return Err(serde::de::Error::duplicate_field("enhanced"));
                            }
                            enhanced = Some(map.next_value()?);
                        }
                    }
                }
                let code = code.ok_or_else(|| serde::de::Error::missing_field("code"))?;

                Ok(Reply::new(
                    enhanced.map_or(ReplyCode::Code { code }, |enhanced| {
                        ReplyCode::Enhanced { code, enhanced }
                    }),
                    text.ok_or_else(|| serde::de::Error::missing_field("text"))?,
                ))
            }
        }

        deserializer.deserialize_any(ReplyVisitor)
    }
}

impl Reply {
    /// Create a new reply, each `\r\n` of the text produces a new line.
    pub fn new(code: ReplyCode, text: impl Into<String>) -> Self {
        let text = text.into();
        let reply = Self {
            code,
            text: text
                .trim_end_matches("\r\n")
                .split("\r\n")
                .map(str::to_string)
                .collect(),
            folded: String::new(),
        };
        Self {
            folded: reply.fold(),
            ..reply
        }
    }

    ///
    pub const fn code(&self) -> &ReplyCode {
        &self.code
    }

    /// Lines of text of the reply, without the codes.
    #[must_use]
    pub fn text(&self) -> &[String] {
        &self.text
    }

    fn fold(&self) -> String {
        let prefix = self.code.to_string();
        let len = self.text.len();

        self.text
            .iter()
            .enumerate()
            .map(|(idx, line)| {
                let separator = if idx + 1 == len { ' ' } else { '-' };
                let mut line = format!("{prefix} {line}\r\n");
                line.replace_range(3..4, &separator.to_string());
                line
            })
            .collect::<String>()
    }

    /// Create a new reply with:
    /// * `text` = `self.text` + `other.text`
    /// * `code` = `other.code`
    /// ```
    /// # use vhook_common::Reply;
    /// let first = "450 4.5.0 Failed to relay message".parse::<Reply>().unwrap();
    /// let second = "451 Too many errors from the client".parse::<Reply>().unwrap();
    ///
    /// assert_eq!(
    ///   first.extended(&second).to_string(),
    ///   [
    ///     "451-Failed to relay message\r\n",
    ///     "451 Too many errors from the client\r\n"
    ///   ].concat()
    /// );
    /// ```
    pub fn extended(mut self, other: &Self) -> Self {
        self.text.extend(other.text.iter().cloned());
        let reply = Self {
            code: other.code.clone(),
            text: self.text,
            folded: String::new(),
        };
        Self {
            folded: reply.fold(),
            ..reply
        }
    }
}

impl std::str::FromStr for Reply {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines = s
            .split("\r\n")
            .filter(|s| !s.is_empty())
            .map(ReplyCode::from_str);

        let mut first_code = None;
        let mut text = vec![];

        for line in lines {
            let (new_code, mut line) = line?;

            match (&first_code, new_code) {
                (Some(first), new) if *first == new => {}
                (Some(_), _) => anyhow::bail!("Reply codes are not consistent"),
                (None, anything) => first_code = Some(anything),
            }

            if !line.is_empty() {
                let separator = line.remove(0);
                anyhow::ensure!(
                    " -".contains(separator),
                    "invalid separator {separator:?} after the reply code"
                );
            }
            text.push(line);
        }

        let Some(code) = first_code else {
            anyhow::bail!("empty reply")
        };

        let reply = Self {
            code,
            text,
            folded: String::new(),
        };
        Ok(Self {
            folded: reply.fold(),
            ..reply
        })
    }
}

impl std::fmt::Display for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.folded)
    }
}

impl AsRef<str> for Reply {
    fn as_ref(&self) -> &str {
        &self.folded
    }
}
