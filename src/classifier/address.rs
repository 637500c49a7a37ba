// src/classifier/address.rs
//! Destination addresses handed over by the interception point
//!
//! IPv4 values are held in host order. Header fields arrive in network
//! order and must go through [`Destination::from_v4_network`] (or one of the
//! `std::net` conversions) before classification.

use std::fmt;
use std::net::{AddrParseError, IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Address family of a destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4,
    V6,
}

/// Destination address, tagged by family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// IPv4 address as a host-order 32-bit value
    V4(u32),

    /// IPv6 address as a 128-bit value
    V6(u128),
}

impl Destination {
    /// Build from the raw network-order bytes of an IPv4 header field
    pub fn from_v4_network(raw: [u8; 4]) -> Self {
        Destination::V4(u32::from_be_bytes(raw))
    }

    /// Build from the raw network-order bytes of an IPv6 header field
    pub fn from_v6_network(raw: [u8; 16]) -> Self {
        Destination::V6(u128::from_be_bytes(raw))
    }

    pub fn family(&self) -> AddressFamily {
        match self {
            Destination::V4(_) => AddressFamily::V4,
            Destination::V6(_) => AddressFamily::V6,
        }
    }

    /// Most significant octet (bits 31-24) of an IPv4 address
    #[inline]
    pub fn first_octet(&self) -> Option<u8> {
        match *self {
            Destination::V4(host) => Some((host >> 24) as u8),
            Destination::V6(_) => None,
        }
    }

    pub fn to_ip_addr(&self) -> IpAddr {
        match *self {
            Destination::V4(host) => IpAddr::V4(Ipv4Addr::from(host)),
            Destination::V6(value) => IpAddr::V6(Ipv6Addr::from(value)),
        }
    }
}

impl From<Ipv4Addr> for Destination {
    fn from(addr: Ipv4Addr) -> Self {
        Destination::V4(u32::from(addr))
    }
}

impl From<Ipv6Addr> for Destination {
    fn from(addr: Ipv6Addr) -> Self {
        Destination::V6(u128::from(addr))
    }
}

impl From<IpAddr> for Destination {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(v4) => v4.into(),
            IpAddr::V6(v6) => v6.into(),
        }
    }
}

impl FromStr for Destination {
    type Err = AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<IpAddr>().map(Destination::from)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_ip_addr(), f)
    }
}
