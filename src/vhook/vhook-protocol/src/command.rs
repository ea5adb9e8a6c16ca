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

/// Buffer received from the client.
pub struct UnparsedArgs(pub Vec<u8>);
pub type Command<Verb, Args> = (Verb, Args);

/// Information received from the client at the connection TCP/IP.
pub struct AcceptArgs {
    /// Peer address of the connection.
    pub client_addr: std::net::SocketAddr,
    /// Address of the server which accepted the connection.
    pub server_addr: std::net::SocketAddr,
    /// Instant when the connection was accepted.
    pub timestamp: time::OffsetDateTime,
    /// Unique id of the connection.
    pub uuid: uuid::Uuid,
}

/// Information received from the client at the HELO command.
pub struct HeloArgs {
    /// Name of the client.
    pub client_name: String,
}

/// Name given by the client in the EHLO command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientName {
    /// FQDN of the client.
    Domain(String),
    /// IPv4 address literal, `[127.0.0.1]`.
    Ip4(std::net::Ipv4Addr),
    /// IPv6 address literal, `[IPv6:::1]`.
    Ip6(std::net::Ipv6Addr),
}

impl std::fmt::Display for ClientName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Domain(domain) => f.write_str(domain),
            Self::Ip4(ip) => write!(f, "[{ip}]"),
            Self::Ip6(ip) => write!(f, "[IPv6:{ip}]"),
        }
    }
}

impl std::str::FromStr for ClientName {
    type Err = ParseArgsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let literal = s.strip_prefix('[').and_then(|s| s.strip_suffix(']'));

        match literal {
            Some(ip) => match ip.get(..5) {
                Some(tag) if tag.eq_ignore_ascii_case("IPv6:") => ip[5..]
                    .parse()
                    .map(Self::Ip6)
                    .map_err(ParseArgsError::BadTypeAddr),
                _ => ip
                    .parse()
                    .map(Self::Ip4)
                    .map_err(ParseArgsError::BadTypeAddr),
            },
            None => addr::parse_domain_name(s)
                .map(|domain| Self::Domain(domain.to_string()))
                .map_err(|_| ParseArgsError::InvalidArgs),
        }
    }
}

/// Information received from the client at the EHLO command.
pub struct EhloArgs {
    /// Name of the client.
    pub client_name: ClientName,
}

/// Information received from the client at the MAIL FROM command.
pub struct MailFromArgs {
    /// Sender address, `None` for the null reverse path `<>`.
    pub reverse_path: Option<String>,
    /// ESMTP parameters following the path, such as `SIZE=1000`.
    pub parameters: Vec<String>,
}

/// Information received from the client at the RCPT TO command.
pub struct RcptToArgs {
    /// Recipient address, as written by the client, without the angle brackets.
    pub forward_path: String,
    /// ESMTP parameters following the path.
    pub parameters: Vec<String>,
}

/// Error while parsing the arguments of a command.
#[derive(Debug)]
pub enum ParseArgsError {
    /// Non-UTF8 buffer.
    InvalidUtf8(std::str::Utf8Error),
    /// Invalid IP address.
    BadTypeAddr(std::net::AddrParseError),
    /// The command line is longer than expected.
    BufferTooLong {
        /// Maximum size expected.
        expected: usize,
        /// Actual size.
        got: usize,
    },
    /// Other
    InvalidArgs,
}

fn args_as_str(value: &UnparsedArgs) -> Result<&str, ParseArgsError> {
    std::str::from_utf8(
        value
            .0
            .strip_suffix(b"\r\n")
            .ok_or(ParseArgsError::InvalidArgs)?,
    )
    .map_err(ParseArgsError::InvalidUtf8)
}

/// Split `<path> param1 param2` (or `path param1`) into the path and its parameters.
fn split_path(value: &str) -> Result<(&str, Vec<String>), ParseArgsError> {
    let value = value.trim_start();
    if value.is_empty() {
        return Err(ParseArgsError::InvalidArgs);
    }

    let (path, rest) = if let Some(bracketed) = value.strip_prefix('<') {
        let end = bracketed.find('>').ok_or(ParseArgsError::InvalidArgs)?;
        (&bracketed[..end], &bracketed[end + 1..])
    } else {
        value.split_once(char::is_whitespace).unwrap_or((value, ""))
    };

    Ok((
        path,
        rest.split_whitespace().map(str::to_string).collect(),
    ))
}

impl TryFrom<UnparsedArgs> for HeloArgs {
    type Error = ParseArgsError;

    fn try_from(value: UnparsedArgs) -> Result<Self, Self::Error> {
        let client_name = args_as_str(&value)?.trim();
        if client_name.is_empty() {
            return Err(ParseArgsError::InvalidArgs);
        }

        Ok(Self {
            client_name: client_name.to_string(),
        })
    }
}

impl TryFrom<UnparsedArgs> for EhloArgs {
    type Error = ParseArgsError;

    fn try_from(value: UnparsedArgs) -> Result<Self, Self::Error> {
        let value = args_as_str(&value)?.trim();

        let client_name = value.parse()?;

        Ok(Self { client_name })
    }
}

impl TryFrom<UnparsedArgs> for MailFromArgs {
    type Error = ParseArgsError;

    fn try_from(value: UnparsedArgs) -> Result<Self, Self::Error> {
        let (path, parameters) = split_path(args_as_str(&value)?)?;

        Ok(Self {
            reverse_path: if path.is_empty() {
                None
            } else {
                Some(path.to_string())
            },
            parameters,
        })
    }
}

impl TryFrom<UnparsedArgs> for RcptToArgs {
    type Error = ParseArgsError;

    fn try_from(value: UnparsedArgs) -> Result<Self, Self::Error> {
        let (path, parameters) = split_path(args_as_str(&value)?)?;
        if path.is_empty() {
            return Err(ParseArgsError::InvalidArgs);
        }

        Ok(Self {
            forward_path: path.to_string(),
            parameters,
        })
    }
}

/// SMTP Command.
#[derive(Debug, PartialEq, Eq, strum::AsRefStr, strum::EnumString, strum::EnumVariantNames)]
pub enum Verb {
    /// Used to identify the SMTP client to the SMTP server. (historical)
    #[strum(serialize = "HELO ")]
    Helo,
    /// Used to identify the SMTP client to the SMTP server and request smtp extensions.
    #[strum(serialize = "EHLO ")]
    Ehlo,
    /// This command is used to initiate a mail transaction in which the mail
    /// data is delivered to an SMTP server.
    #[strum(serialize = "MAIL FROM:")]
    MailFrom,
    /// This command is used to identify an individual recipient of the mail
    /// data; multiple recipients are specified by multiple uses of this
    /// command.
    #[strum(serialize = "RCPT TO:")]
    RcptTo,
    /// This command causes the mail data to be appended to the mail data
    /// buffer.
    #[strum(serialize = "DATA\r\n")]
    Data,
    /// This command specifies that the receiver MUST send a "221 OK" reply,
    /// and then close the transmission channel.
    #[strum(serialize = "QUIT\r\n")]
    Quit,
    /// This command specifies that the current mail transaction will be
    /// aborted. Any stored sender, recipients, and mail data MUST be
    /// discarded, and all buffers and state tables cleared.
    #[strum(serialize = "RSET\r\n")]
    Rset,
    /// This command causes the server to send helpful information to the
    /// client.
    #[strum(serialize = "HELP")]
    Help,
    /// This command does not affect any parameters or previously entered
    /// commands.
    #[strum(serialize = "NOOP\r\n")]
    Noop,
    /// Any other buffer received while expecting a command is considered an
    /// unknown.
    Unknown,
}

impl Verb {
    /// Whether an [`Verb::Unknown`] line is a command of RFC 5321 or one of its
    /// common extensions which the relay does not serve.
    #[must_use]
    pub fn is_unimplemented(line: &[u8]) -> bool {
        const UNIMPLEMENTED: [&[u8]; 5] = [b"VRFY", b"EXPN", b"TURN", b"STARTTLS", b"AUTH"];

        UNIMPLEMENTED
            .iter()
            .any(|c| line.len() >= c.len() && line[..c.len()].eq_ignore_ascii_case(c))
    }

    /// Split a command line into its verb and its arguments.
    #[must_use]
    pub fn parse_line(line: Vec<u8>) -> Command<Self, UnparsedArgs> {
        <Self as strum::VariantNames>::VARIANTS
            .iter()
            .find_map(|i| {
                if line.len() >= i.len() && line[..i.len()].eq_ignore_ascii_case(i.as_bytes()) {
                    i.parse::<Self>()
                        .ok()
                        .map(|verb| (verb, UnparsedArgs(line[i.len()..].to_vec())))
                } else {
                    None
                }
            })
            .unwrap_or_else(|| (Self::Unknown, UnparsedArgs(line)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> UnparsedArgs {
        UnparsedArgs(s.as_bytes().to_vec())
    }

    #[rstest::rstest]
    #[case("HELO foo\r\n", Verb::Helo, "foo\r\n")]
    #[case("ehlo foo\r\n", Verb::Ehlo, "foo\r\n")]
    #[case("Mail From:<a@b>\r\n", Verb::MailFrom, "<a@b>\r\n")]
    #[case("RCPT TO: <a@b>\r\n", Verb::RcptTo, " <a@b>\r\n")]
    #[case("DATA\r\n", Verb::Data, "")]
    #[case("HELP me\r\n", Verb::Help, " me\r\n")]
    #[case("VRFY a@b\r\n", Verb::Unknown, "VRFY a@b\r\n")]
    #[case("DATAX\r\n", Verb::Unknown, "DATAX\r\n")]
    fn parse_line(#[case] line: &str, #[case] verb: Verb, #[case] rest: &str) {
        let (parsed, args) = Verb::parse_line(line.as_bytes().to_vec());
        pretty_assertions::assert_eq!(parsed, verb);
        pretty_assertions::assert_eq!(std::str::from_utf8(&args.0).unwrap(), rest);
    }

    #[rstest::rstest]
    #[case("VRFY john\r\n", true)]
    #[case("starttls\r\n", true)]
    #[case("AUTH PLAIN dGVzdA==\r\n", true)]
    #[case("FOO\r\n", false)]
    #[case("AUT\r\n", false)]
    fn unimplemented(#[case] line: &str, #[case] expected: bool) {
        pretty_assertions::assert_eq!(Verb::is_unimplemented(line.as_bytes()), expected);
    }

    #[rstest::rstest]
    #[case("<a@b>\r\n", Some("a@b"), &[])]
    #[case("<>\r\n", None, &[])]
    #[case(" <a@b> SIZE=1000 BODY=7BIT\r\n", Some("a@b"), &["SIZE=1000", "BODY=7BIT"])]
    #[case("a@b\r\n", Some("a@b"), &[])]
    fn mail_from(
        #[case] input: &str,
        #[case] reverse_path: Option<&str>,
        #[case] parameters: &[&str],
    ) {
        let parsed = MailFromArgs::try_from(args(input)).unwrap();
        pretty_assertions::assert_eq!(parsed.reverse_path.as_deref(), reverse_path);
        pretty_assertions::assert_eq!(parsed.parameters, parameters);
    }

    #[rstest::rstest]
    #[case("\r\n")]
    #[case("<a@b\r\n")]
    #[case("<a@b>")]
    fn mail_from_invalid(#[case] input: &str) {
        assert!(MailFromArgs::try_from(args(input)).is_err());
    }

    #[rstest::rstest]
    #[case("<sec123+orders@mail.example>\r\n", "sec123+orders@mail.example")]
    #[case("postmaster@mail.example\r\n", "postmaster@mail.example")]
    #[case("<not an address>\r\n", "not an address")]
    fn rcpt_to(#[case] input: &str, #[case] forward_path: &str) {
        let parsed = RcptToArgs::try_from(args(input)).unwrap();
        pretty_assertions::assert_eq!(parsed.forward_path, forward_path);
    }

    #[test]
    fn rcpt_to_null_path() {
        assert!(RcptToArgs::try_from(args("<>\r\n")).is_err());
    }

    #[rstest::rstest]
    #[case("mail.example.com\r\n", ClientName::Domain("mail.example.com".to_string()))]
    #[case("[127.0.0.1]\r\n", ClientName::Ip4("127.0.0.1".parse().unwrap()))]
    #[case("[IPv6:::1]\r\n", ClientName::Ip6("::1".parse().unwrap()))]
    fn ehlo(#[case] input: &str, #[case] expected: ClientName) {
        pretty_assertions::assert_eq!(
            EhloArgs::try_from(args(input)).unwrap().client_name,
            expected
        );
    }

    #[rstest::rstest]
    #[case("[IPv6:::1]", "[IPv6:::1]")]
    #[case("[ipv6:2001:db8::1]", "[IPv6:2001:db8::1]")]
    #[case("[192.0.2.1]", "[192.0.2.1]")]
    #[case("client.example", "client.example")]
    fn client_name_display(#[case] input: &str, #[case] expected: &str) {
        pretty_assertions::assert_eq!(
            input.parse::<ClientName>().unwrap().to_string(),
            expected
        );
    }

    #[rstest::rstest]
    #[case("[300.0.0.1]\r\n")]
    #[case("[IPv6:not-an-ip]\r\n")]
    #[case("[éé]\r\n")]
    #[case("[]\r\n")]
    fn ehlo_invalid_literal(#[case] input: &str) {
        assert!(matches!(
            EhloArgs::try_from(args(input)),
            Err(ParseArgsError::BadTypeAddr(_))
        ));
    }

    #[test]
    fn helo_empty() {
        assert!(HeloArgs::try_from(args(" \r\n")).is_err());
    }
}
