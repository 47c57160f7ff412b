//! Error types shared by the subnetting engine.
//!
//! Every message follows the same shape: what was requested, why it cannot
//! be satisfied, and what would satisfy it.

use crate::models::{IpClass, Network};
use serde::Serialize;
use std::net::Ipv4Addr;

/// Errors produced by address arithmetic and the allocators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubnetError {
    /// Malformed address, CIDR or requirement value.
    #[error("'{input}' is not a valid {expected}")]
    InvalidFormat { input: String, expected: String },

    /// Mask bits are not a run of leading ones.
    #[error("mask {mask} is not contiguous; a subnet mask must be leading ones followed by zeros")]
    NotContiguousMask { mask: Ipv4Addr },

    /// Class D/E address used where a default mask is required.
    #[error("{address} is a class {class} address; only class A, B and C networks have a default mask")]
    UnsupportedClass { address: Ipv4Addr, class: IpClass },

    /// Host bits set under the implied prefix.
    #[error("{requested}/{prefix} is not a network address (host bits are set); use {corrected} instead")]
    NotNetworkAddress {
        requested: Ipv4Addr,
        prefix: u8,
        corrected: Network,
    },

    /// Requirement cannot be met within the available bits.
    #[error("{requested} cannot be satisfied: {reason}; {suggestion}")]
    InsufficientSpace {
        requested: String,
        reason: String,
        suggestion: String,
    },

    /// Block would run past the end of its parent network.
    #[error("block {block} does not fit inside {parent}: insufficient contiguous space left in the parent network")]
    BlockExceedsParent { block: Network, parent: Network },
}

impl SubnetError {
    pub(crate) fn invalid_format(input: &str, expected: &str) -> Self {
        SubnetError::InvalidFormat {
            input: input.to_string(),
            expected: expected.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_network_address_message_names_correction() {
        let err = SubnetError::NotNetworkAddress {
            requested: Ipv4Addr::new(192, 168, 1, 5),
            prefix: 24,
            corrected: Network::new("192.168.1.0/24").unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "192.168.1.5/24 is not a network address (host bits are set); use 192.168.1.0/24 instead"
        );
    }

    #[test]
    fn test_error_serializes_with_kind_tag() {
        let err = SubnetError::invalid_format("1.2.3", "IPv4 address");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "invalid_format");
        assert_eq!(json["input"], "1.2.3");
    }
}
