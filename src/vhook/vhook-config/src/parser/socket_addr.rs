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

/// A listening address in the configuration, `"127.0.0.1:2525"`, `"[::1]:2525"`
/// or a port alone, listening on every interface.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum Listen {
    Port(u16),
    Addr(String),
}

impl TryFrom<Listen> for std::net::SocketAddr {
    type Error = String;

    fn try_from(value: Listen) -> Result<Self, Self::Error> {
        match value {
            Listen::Port(port) => Ok(Self::new(
                std::net::IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED),
                port,
            )),
            Listen::Addr(addr) => match addr.parse::<u16>() {
                Ok(port) => Self::try_from(Listen::Port(port)),
                Err(_) => addr
                    .parse()
                    .map_err(|e| format!("invalid listening address '{addr}': {e}")),
            },
        }
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<std::net::SocketAddr>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    <Vec<Listen> as serde::Deserialize>::deserialize(deserializer)?
        .into_iter()
        .map(std::net::SocketAddr::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    #[derive(Debug, serde::Deserialize)]
    struct Interfaces {
        #[serde(deserialize_with = "crate::parser::socket_addr::deserialize")]
        addr: Vec<std::net::SocketAddr>,
    }

    fn parse(input: &str) -> Result<Vec<std::net::SocketAddr>, toml::de::Error> {
        toml::from_str::<Interfaces>(input).map(|i| i.addr)
    }

    #[rstest::rstest]
    #[case(r#"addr = ["0.0.0.0:25"]"#, "0.0.0.0:25")]
    #[case(r#"addr = ["[::1]:2525"]"#, "[::1]:2525")]
    #[case(r#"addr = [2525]"#, "[::]:2525")]
    #[case(r#"addr = ["2525"]"#, "[::]:2525")]
    fn listen(#[case] input: &str, #[case] expected: &str) {
        pretty_assertions::assert_eq!(parse(input).unwrap(), vec![expected.parse().unwrap()]);
    }

    #[rstest::rstest]
    #[case(r#"addr = ["mail.example:25"]"#)]
    #[case(r#"addr = [70000]"#)]
    #[case(r#"addr = ["127.0.0.1"]"#)]
    fn invalid(#[case] input: &str) {
        assert!(parse(input).is_err());
    }
}
