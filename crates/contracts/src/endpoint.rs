//! Endpoint - parsed destination URL
//!
//! The scheme picks exactly one connection strategy; it is resolved once here
//! and never re-examined after construction.

use percent_encoding::percent_decode_str;
use std::fmt;
use std::net::SocketAddr;
use url::{Host, Url};

use crate::ContractError;

#[cfg(unix)]
const SUPPORTED_SCHEMES: &str = "file, tcp, tcp4, tcp6, tls, ssl, udp, udp4, udp6, unix, unixgram";
#[cfg(not(unix))]
const SUPPORTED_SCHEMES: &str = "file, tcp, tcp4, tcp6, tls, ssl, udp, udp4, udp6";

/// Transport selected by the URL scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// Append-only local file (`file`)
    File,
    /// Plain TCP stream (`tcp`, `tcp4`, `tcp6`)
    Tcp,
    /// TCP upgraded to TLS (`tls`, `ssl`)
    Tls,
    /// Connected UDP socket (`udp`, `udp4`, `udp6`)
    Udp,
    /// Unix domain stream socket (`unix`)
    Unix,
    /// Unix domain datagram socket (`unixgram`)
    UnixDatagram,
}

impl EndpointKind {
    /// Map a URL scheme to its transport
    ///
    /// Unix socket schemes are only known on Unix platforms.
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "file" => Some(Self::File),
            "tcp" | "tcp4" | "tcp6" => Some(Self::Tcp),
            "tls" | "ssl" => Some(Self::Tls),
            "udp" | "udp4" | "udp6" => Some(Self::Udp),
            "unix" if cfg!(unix) => Some(Self::Unix),
            "unixgram" if cfg!(unix) => Some(Self::UnixDatagram),
            _ => None,
        }
    }

    /// Host:port addressed transports
    pub fn is_network(self) -> bool {
        matches!(self, Self::Tcp | Self::Tls | Self::Udp)
    }
}

/// IP family a network endpoint is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressFamily {
    #[default]
    Any,
    V4,
    V6,
}

impl AddressFamily {
    /// Family pinned by a `4`/`6` scheme suffix
    pub fn from_scheme(scheme: &str) -> Self {
        match scheme.to_ascii_lowercase().as_str() {
            "tcp4" | "udp4" => Self::V4,
            "tcp6" | "udp6" => Self::V6,
            _ => Self::Any,
        }
    }

    pub fn admits(self, addr: &SocketAddr) -> bool {
        match self {
            Self::Any => true,
            Self::V4 => addr.is_ipv4(),
            Self::V6 => addr.is_ipv6(),
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AddressFamily::Any => "any",
            AddressFamily::V4 => "ipv4",
            AddressFamily::V6 => "ipv6",
        })
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EndpointKind::File => "file",
            EndpointKind::Tcp => "tcp",
            EndpointKind::Tls => "tls",
            EndpointKind::Udp => "udp",
            EndpointKind::Unix => "unix",
            EndpointKind::UnixDatagram => "unixgram",
        };
        f.write_str(s)
    }
}

/// Parsed destination target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Transport kind
    pub kind: EndpointKind,
    /// Resolution restriction for network kinds
    pub family: AddressFamily,
    /// Scheme as written in the configuration
    pub scheme: String,
    /// `host:port` for network kinds, filesystem path otherwise
    pub address: String,
    /// Bare host name (TLS server name); empty for path kinds without host
    pub host: String,
}

impl Endpoint {
    /// Parse a destination URL
    ///
    /// # Errors
    /// `ConfigValidation` when the URL does not parse, the scheme is not
    /// supported, a network URL lacks a port, or the address is empty.
    pub fn parse(uri: &str) -> Result<Self, ContractError> {
        let url = Url::parse(uri).map_err(|e| {
            ContractError::config_validation("url", format!("invalid url '{uri}': {e}"))
        })?;

        let kind = EndpointKind::from_scheme(url.scheme()).ok_or_else(|| {
            ContractError::config_validation(
                "url",
                format!(
                    "unsupported scheme '{}' in '{uri}' (supported: {SUPPORTED_SCHEMES})",
                    url.scheme()
                ),
            )
        })?;

        let host = match url.host() {
            Some(Host::Ipv6(addr)) => addr.to_string(),
            Some(other) => other.to_string(),
            None => String::new(),
        };

        let address = if kind.is_network() {
            network_address(&url, uri)?
        } else {
            path_address(&url)
        };

        if address.is_empty() {
            return Err(ContractError::config_validation(
                "url",
                format!("missing address in '{uri}'"),
            ));
        }

        Ok(Self {
            kind,
            family: AddressFamily::from_scheme(url.scheme()),
            scheme: url.scheme().to_string(),
            address,
            host,
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.address)
    }
}

fn network_address(url: &Url, uri: &str) -> Result<String, ContractError> {
    let host = url.host_str().unwrap_or_default();
    if host.is_empty() {
        return Err(ContractError::config_validation(
            "url",
            format!("missing host in '{uri}'"),
        ));
    }
    let port = url.port().ok_or_else(|| {
        ContractError::config_validation("url", format!("missing port in '{uri}'"))
    })?;
    // host_str keeps the brackets around IPv6 literals
    Ok(format!("{host}:{port}"))
}

fn path_address(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    let path = percent_decode_str(url.path()).decode_utf8_lossy();

    // `file://out.log` parses as host "out.log" with the root path
    if !host.is_empty() && path == "/" {
        return host.to_string();
    }
    format!("{host}{path}")
}
