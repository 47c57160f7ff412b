//! IPv4 network (CIDR block) value type.

use super::class::IpClass;
use super::ipv4::{
    broadcast_addr, cut_addr, ip_after_subnet, parse_cidr, prefix_to_mask, MAX_LENGTH,
};
use crate::error::SubnetError;
use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::net::Ipv4Addr;

/// An IPv4 network: an address with every host bit cleared, plus a prefix length.
///
/// Ordering is by address, then prefix.
#[derive(Eq, PartialEq, Ord, PartialOrd, Debug, Copy, Clone, Hash)]
pub struct Network {
    addr: Ipv4Addr,
    prefix: u8,
}

impl Serialize for Network {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Network {
    fn deserialize<D>(deserializer: D) -> Result<Network, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Network::new(&s).map_err(|e| de::Error::custom(e.to_string()))
    }
}

impl Network {
    /// Create a [`Network`] from a CIDR string (e.g. "10.0.0.0/24").
    ///
    /// Fails with [`SubnetError::NotNetworkAddress`] if host bits are set.
    pub fn new(addr_cidr: &str) -> Result<Network, SubnetError> {
        let (addr, prefix) = parse_cidr(addr_cidr)?;
        Network::from_parts(addr, prefix)
    }

    /// Build from an address that must already be the network address.
    pub fn from_parts(addr: Ipv4Addr, prefix: u8) -> Result<Network, SubnetError> {
        let network = Network::containing(addr, prefix)?;
        if network.addr != addr {
            return Err(SubnetError::NotNetworkAddress {
                requested: addr,
                prefix,
                corrected: network,
            });
        }
        Ok(network)
    }

    /// The network of the given size that contains `addr`.
    pub fn containing(addr: Ipv4Addr, prefix: u8) -> Result<Network, SubnetError> {
        let addr = cut_addr(addr, prefix)?;
        Ok(Network { addr, prefix })
    }

    /// Network address.
    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }

    /// Prefix length (0-32).
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Subnet mask bits.
    pub fn mask(&self) -> u32 {
        prefix_to_mask(self.prefix)
            .unwrap_or_else(|e| panic!("Error calculating mask for {}: {}", self, e))
    }

    /// Subnet mask as a dotted quad.
    pub fn netmask(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.mask())
    }

    /// Wildcard (inverse) mask.
    pub fn wildcard(&self) -> Ipv4Addr {
        Ipv4Addr::from(!self.mask())
    }

    /// Get the lowest (network) address in the subnet.
    pub fn lo(&self) -> Ipv4Addr {
        self.addr
    }

    /// Get the highest (broadcast) address in the subnet.
    pub fn hi(&self) -> Ipv4Addr {
        broadcast_addr(self.addr, self.prefix)
            .unwrap_or_else(|e| panic!("Error calculating broadcast address for {}: {}", self, e))
    }

    /// Alias for [`Network::hi`].
    pub fn broadcast(&self) -> Ipv4Addr {
        self.hi()
    }

    /// `2^(32 - prefix)` addresses.
    pub fn block_size(&self) -> u64 {
        1u64 << (MAX_LENGTH - self.prefix)
    }

    /// `block_size - 2`, floored at zero.
    pub fn usable_hosts(&self) -> u64 {
        self.block_size().saturating_sub(2)
    }

    /// First host address; absent for /31 and /32.
    pub fn first_usable(&self) -> Option<Ipv4Addr> {
        if self.prefix >= MAX_LENGTH - 1 {
            None
        } else {
            Some(Ipv4Addr::from(u32::from(self.addr) + 1))
        }
    }

    /// Last host address; absent for /31 and /32.
    pub fn last_usable(&self) -> Option<Ipv4Addr> {
        if self.prefix >= MAX_LENGTH - 1 {
            None
        } else {
            Some(Ipv4Addr::from(u32::from(self.hi()) - 1))
        }
    }

    /// True when `ip` falls inside this block.
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        u32::from(ip) & self.mask() == u32::from(self.addr)
    }

    /// True when `other` lies entirely inside this block.
    pub fn contains_network(&self, other: &Network) -> bool {
        self.prefix <= other.prefix && self.contains(other.addr)
    }

    /// True when the two blocks share at least one address.
    pub fn overlaps(&self, other: &Network) -> bool {
        self.contains(other.addr) || other.contains(self.addr)
    }

    /// Next network of the same size.
    pub fn next(&self) -> Result<Network, SubnetError> {
        let addr = ip_after_subnet(self.addr, self.prefix)?;
        Ok(Network {
            addr,
            prefix: self.prefix,
        })
    }

    /// Legacy class of the network address.
    pub fn class(&self) -> IpClass {
        IpClass::of(self.addr)
    }

    /// All derived values in one serializable row.
    pub fn details(&self) -> NetworkDetails {
        NetworkDetails {
            cidr: self.to_string(),
            network: self.addr,
            prefix: self.prefix,
            mask: self.netmask(),
            wildcard: self.wildcard(),
            broadcast: self.hi(),
            first_usable: self.first_usable(),
            last_usable: self.last_usable(),
            block_size: self.block_size(),
            usable_hosts: self.usable_hosts(),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

/// Derived values of a [`Network`], ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkDetails {
    pub cidr: String,
    pub network: Ipv4Addr,
    pub prefix: u8,
    pub mask: Ipv4Addr,
    pub wildcard: Ipv4Addr,
    pub broadcast: Ipv4Addr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_usable: Option<Ipv4Addr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_usable: Option<Ipv4Addr>,
    pub block_size: u64,
    pub usable_hosts: u64,
}
