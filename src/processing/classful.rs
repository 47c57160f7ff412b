//! Classful subnetting: divide an A/B/C network into equal blocks.
//!
//! Under the legacy convention both the all-zeros and the all-ones subnet are
//! computed but flagged as not usable, so a subnet count `n` needs
//! `ceil(log2(n + 2))` borrowed bits.

use crate::config::DEFAULT_MAX_LISTED_SUBNETS;
use crate::error::SubnetError;
use crate::models::{ceil_log2, IpClass, Network, NetworkDetails, MAX_LENGTH};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Fewest host bits a subnet may keep (network + broadcast + 2 hosts).
pub const MIN_HOST_BITS: u8 = 2;

/// What the subnetting requirement counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    Subnets,
    Hosts,
}

/// "At least `value` subnets" or "at least `value` hosts per subnet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassfulRequirement {
    pub kind: RequirementKind,
    pub value: u32,
}

impl ClassfulRequirement {
    pub fn subnets(value: u32) -> Self {
        ClassfulRequirement {
            kind: RequirementKind::Subnets,
            value,
        }
    }

    pub fn hosts(value: u32) -> Self {
        ClassfulRequirement {
            kind: RequirementKind::Hosts,
            value,
        }
    }
}

impl fmt::Display for ClassfulRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RequirementKind::Subnets => write!(f, "{} subnets", self.value),
            RequirementKind::Hosts => write!(f, "{} hosts per subnet", self.value),
        }
    }
}

/// Subnetting conventions applied by the allocators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetPolicy {
    /// Treat the zero and all-ones subnets as unusable.
    pub legacy_reserved_subnets: bool,
    /// Cap on listed classful blocks; totals are always exact.
    pub max_listed_subnets: usize,
}

impl SubnetPolicy {
    pub fn legacy() -> Self {
        SubnetPolicy {
            legacy_reserved_subnets: true,
            max_listed_subnets: DEFAULT_MAX_LISTED_SUBNETS,
        }
    }

    pub fn modern() -> Self {
        SubnetPolicy {
            legacy_reserved_subnets: false,
            max_listed_subnets: DEFAULT_MAX_LISTED_SUBNETS,
        }
    }

    pub fn with_max_listed(mut self, max_listed_subnets: usize) -> Self {
        self.max_listed_subnets = max_listed_subnets;
        self
    }

    /// Subnets lost to the convention (0 or 2).
    fn reserved_count(&self) -> u64 {
        if self.legacy_reserved_subnets {
            2
        } else {
            0
        }
    }

    /// Fewest subnet bits that still leave at least two usable subnets.
    fn min_subnet_bits(&self) -> u8 {
        if self.legacy_reserved_subnets {
            2
        } else {
            1
        }
    }
}

impl Default for SubnetPolicy {
    fn default() -> Self {
        SubnetPolicy::legacy()
    }
}

/// Historical tag on the first and last generated block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reservation {
    None,
    ZeroSubnet,
    AllOnesSubnet,
}

/// One generated block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassfulSubnet {
    pub index: u64,
    #[serde(skip)]
    pub network: Network,
    pub reserved: Reservation,
    pub usable: bool,
    #[serde(flatten)]
    pub details: NetworkDetails,
}

/// Aggregate figures of a classful division.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassfulSummary {
    pub base: Network,
    pub class: IpClass,
    pub requirement: ClassfulRequirement,
    pub default_prefix: u8,
    pub new_prefix: u8,
    pub new_mask: Ipv4Addr,
    pub bits_borrowed: u8,
    pub host_bits: u8,
    pub total_subnets: u64,
    pub usable_subnets: u64,
    pub block_size: u64,
    pub usable_hosts_per_subnet: u64,
    pub legacy_reserved_subnets: bool,
}

/// Result of [`calculate_classful`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassfulResult {
    pub summary: ClassfulSummary,
    /// Blocks in address order; see [`ClassfulResult::truncated`].
    pub subnets: Vec<ClassfulSubnet>,
    /// When set, `subnets` holds the leading blocks plus the final block only.
    pub truncated: bool,
}

impl ClassfulResult {
    /// Block `index` (0-based), computed on demand.
    pub fn subnet(&self, index: u64) -> Option<ClassfulSubnet> {
        let summary = &self.summary;
        if index >= summary.total_subnets {
            return None;
        }
        let addr = u32::from(summary.base.addr()) as u64 + index * summary.block_size;
        let network = Network::from_parts(Ipv4Addr::from(addr as u32), summary.new_prefix)
            .unwrap_or_else(|e| panic!("misaligned classful block should never happen: {e}"));
        let reserved = if !summary.legacy_reserved_subnets {
            Reservation::None
        } else if index == 0 {
            Reservation::ZeroSubnet
        } else if index == summary.total_subnets - 1 {
            Reservation::AllOnesSubnet
        } else {
            Reservation::None
        };
        Some(ClassfulSubnet {
            index,
            network,
            reserved,
            usable: reserved == Reservation::None,
            details: network.details(),
        })
    }

    /// First block that is usable under the active convention.
    pub fn first_usable_subnet(&self) -> Option<ClassfulSubnet> {
        let index = if self.summary.legacy_reserved_subnets { 1 } else { 0 };
        self.subnet(index)
    }

    /// Last block that is usable under the active convention.
    pub fn last_usable_subnet(&self) -> Option<ClassfulSubnet> {
        let total = self.summary.total_subnets;
        let index = if self.summary.legacy_reserved_subnets {
            total.checked_sub(2)?
        } else {
            total.checked_sub(1)?
        };
        self.subnet(index)
    }
}

/// Divide the classful network `base_ip` into equal subnets.
///
/// `base_ip` must be the network address under its class default mask.
pub fn calculate_classful(
    base_ip: Ipv4Addr,
    requirement: ClassfulRequirement,
    policy: &SubnetPolicy,
) -> Result<ClassfulResult, SubnetError> {
    let class = IpClass::of(base_ip);
    let default_prefix = class.default_prefix().ok_or(SubnetError::UnsupportedClass {
        address: base_ip,
        class,
    })?;
    let base = Network::from_parts(base_ip, default_prefix)?;

    if requirement.value == 0 {
        return Err(SubnetError::invalid_format(
            &requirement.value.to_string(),
            "positive subnet or host count",
        ));
    }

    let bits_borrowed = bits_to_borrow(&base, requirement, policy)?;
    let new_prefix = default_prefix + bits_borrowed;
    let total_subnets = 1u64 << bits_borrowed;
    let block_size = 1u64 << (MAX_LENGTH - new_prefix);

    log::debug!(
        "calculate_classful: {base} class {class} {requirement} => borrow {bits_borrowed} bits, /{new_prefix}, {total_subnets} blocks"
    );

    let summary = ClassfulSummary {
        base,
        class,
        requirement,
        default_prefix,
        new_prefix,
        new_mask: Network::containing(base_ip, new_prefix)?.netmask(),
        bits_borrowed,
        host_bits: MAX_LENGTH - new_prefix,
        total_subnets,
        usable_subnets: total_subnets - policy.reserved_count(),
        block_size,
        usable_hosts_per_subnet: block_size - 2,
        legacy_reserved_subnets: policy.legacy_reserved_subnets,
    };

    let mut result = ClassfulResult {
        summary,
        subnets: Vec::new(),
        truncated: false,
    };

    let limit = policy.max_listed_subnets.max(2) as u64;
    let listed: Vec<u64> = if total_subnets <= limit {
        (0..total_subnets).collect()
    } else {
        result.truncated = true;
        (0..limit - 1).chain(std::iter::once(total_subnets - 1)).collect()
    };
    let subnets: Vec<ClassfulSubnet> = listed.into_iter().filter_map(|i| result.subnet(i)).collect();
    result.subnets = subnets;

    Ok(result)
}

/// Subnet bits needed for `requirement`, checked against the room in `base`.
fn bits_to_borrow(
    base: &Network,
    requirement: ClassfulRequirement,
    policy: &SubnetPolicy,
) -> Result<u8, SubnetError> {
    let default_host_bits = MAX_LENGTH - base.prefix();
    let max_subnet_bits = default_host_bits - MIN_HOST_BITS;
    let min_subnet_bits = policy.min_subnet_bits();
    let value = requirement.value as u64;

    let max_subnets = (1u64 << max_subnet_bits) - policy.reserved_count();
    let max_hosts = (1u64 << (default_host_bits - min_subnet_bits)) - 2;

    let insufficient = |reason: String, suggestion: String| SubnetError::InsufficientSpace {
        requested: format!("{requirement} in {base}"),
        reason,
        suggestion,
    };

    let bits_needed = match requirement.kind {
        RequirementKind::Subnets => ceil_log2(value + policy.reserved_count()),
        RequirementKind::Hosts => {
            let host_bits_needed = ceil_log2(value + 2);
            if host_bits_needed + min_subnet_bits > default_host_bits {
                return Err(insufficient(
                    format!(
                        "{value} hosts need {host_bits_needed} host bits, leaving fewer than {min_subnet_bits} of the {default_host_bits} available bits to borrow"
                    ),
                    format!("request at most {max_hosts} hosts per subnet or use a larger network"),
                ));
            }
            default_host_bits - host_bits_needed
        }
    };

    if bits_needed < min_subnet_bits {
        return Err(insufficient(
            format!("it borrows {bits_needed} bits but at least {min_subnet_bits} are needed"),
            format!(
                "request at least {} subnets",
                (1u64 << min_subnet_bits) - policy.reserved_count()
            ),
        ));
    }
    if bits_needed > max_subnet_bits {
        return Err(insufficient(
            format!(
                "it needs {bits_needed} subnet bits but only {max_subnet_bits} can be borrowed while keeping {MIN_HOST_BITS} host bits"
            ),
            format!("request at most {max_subnets} subnets or use a larger network"),
        ));
    }
    Ok(bits_needed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    #[test]
    fn test_class_c_two_subnets() {
        let result = calculate_classful(
            ip("192.168.1.0"),
            ClassfulRequirement::subnets(2),
            &SubnetPolicy::legacy(),
        )
        .unwrap();
        let summary = &result.summary;
        assert_eq!(summary.bits_borrowed, 2);
        assert_eq!(summary.new_prefix, 26);
        assert_eq!(summary.new_mask, ip("255.255.255.192"));
        assert_eq!(summary.total_subnets, 4);
        assert_eq!(summary.usable_subnets, 2);
        assert_eq!(summary.usable_hosts_per_subnet, 62);
        assert_eq!(result.subnets.len(), 4);
        assert!(!result.truncated);

        let first = &result.subnets[0];
        assert_eq!(first.network, Network::new("192.168.1.0/26").unwrap());
        assert_eq!(first.reserved, Reservation::ZeroSubnet);
        assert!(!first.usable);

        let last = &result.subnets[3];
        assert_eq!(last.network, Network::new("192.168.1.192/26").unwrap());
        assert_eq!(last.reserved, Reservation::AllOnesSubnet);
        assert_eq!(last.details.broadcast, ip("192.168.1.255"));

        assert_eq!(result.subnets[1].reserved, Reservation::None);
        assert!(result.subnets[1].usable);
        assert_eq!(
            result.subnets[1].details.first_usable,
            Some(ip("192.168.1.65"))
        );
    }

    #[test]
    fn test_hosts_requirement() {
        let result = calculate_classful(
            ip("172.16.0.0"),
            ClassfulRequirement::hosts(500),
            &SubnetPolicy::legacy(),
        )
        .unwrap();
        // 502 -> 9 host bits, 16 - 9 = 7 borrowed
        assert_eq!(result.summary.bits_borrowed, 7);
        assert_eq!(result.summary.new_prefix, 23);
        assert_eq!(result.summary.total_subnets, 128);
        assert_eq!(result.summary.usable_subnets, 126);
        assert_eq!(result.summary.usable_hosts_per_subnet, 510);
    }

    #[test]
    fn test_blocks_are_contiguous_and_aligned() {
        let result = calculate_classful(
            ip("10.0.0.0"),
            ClassfulRequirement::subnets(14),
            &SubnetPolicy::legacy(),
        )
        .unwrap();
        assert_eq!(result.summary.new_prefix, 12);
        let mut expected = result.summary.base.addr();
        for s in &result.subnets {
            assert_eq!(s.network.addr(), expected);
            assert_eq!(u32::from(s.network.addr()) as u64 % s.network.block_size(), 0);
            expected = s.network.next().map(|n| n.addr()).unwrap_or(expected);
        }
    }

    #[test]
    fn test_not_network_address_reports_correction() {
        let err = calculate_classful(
            ip("192.168.1.77"),
            ClassfulRequirement::subnets(2),
            &SubnetPolicy::legacy(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            SubnetError::NotNetworkAddress {
                requested: ip("192.168.1.77"),
                prefix: 24,
                corrected: Network::new("192.168.1.0/24").unwrap(),
            }
        );
    }

    #[test]
    fn test_unsupported_class() {
        let err = calculate_classful(
            ip("224.0.0.0"),
            ClassfulRequirement::subnets(2),
            &SubnetPolicy::legacy(),
        )
        .unwrap_err();
        assert!(matches!(err, SubnetError::UnsupportedClass { class: IpClass::D, .. }));
    }

    #[test]
    fn test_insufficient_space() {
        let policy = SubnetPolicy::legacy();
        // 63 + 2 = 65 -> 7 bits, class C allows 6
        let err = calculate_classful(ip("192.168.1.0"), ClassfulRequirement::subnets(63), &policy)
            .unwrap_err();
        assert!(matches!(err, SubnetError::InsufficientSpace { .. }));
        assert!(err.to_string().contains("at most 62 subnets"));

        // 62 hosts fit exactly with 2 borrowed bits
        assert!(
            calculate_classful(ip("192.168.1.0"), ClassfulRequirement::hosts(62), &policy).is_ok()
        );
        // 63 hosts need 7 host bits, leaving 1
        let err = calculate_classful(ip("192.168.1.0"), ClassfulRequirement::hosts(63), &policy)
            .unwrap_err();
        assert!(err.to_string().contains("at most 62 hosts"));

        assert!(
            calculate_classful(ip("192.168.1.0"), ClassfulRequirement::subnets(0), &policy)
                .is_err()
        );
    }

    #[test]
    fn test_modern_policy() {
        let policy = SubnetPolicy::modern();
        let result =
            calculate_classful(ip("192.168.1.0"), ClassfulRequirement::subnets(2), &policy).unwrap();
        assert_eq!(result.summary.bits_borrowed, 1);
        assert_eq!(result.summary.new_prefix, 25);
        assert_eq!(result.summary.usable_subnets, 2);
        assert!(result.subnets.iter().all(|s| s.reserved == Reservation::None));

        let result =
            calculate_classful(ip("192.168.1.0"), ClassfulRequirement::subnets(64), &policy).unwrap();
        assert_eq!(result.summary.new_prefix, 30);

        assert!(
            calculate_classful(ip("192.168.1.0"), ClassfulRequirement::subnets(1), &policy).is_err()
        );
    }

    #[test]
    fn test_listing_is_capped_but_totals_exact() {
        let policy = SubnetPolicy::legacy().with_max_listed(16);
        let result =
            calculate_classful(ip("10.0.0.0"), ClassfulRequirement::hosts(2), &policy).unwrap();
        assert_eq!(result.summary.bits_borrowed, 22);
        assert_eq!(result.summary.total_subnets, 1 << 22);
        assert!(result.truncated);
        assert_eq!(result.subnets.len(), 16);
        let last = result.subnets.last().unwrap();
        assert_eq!(last.index, (1 << 22) - 1);
        assert_eq!(last.reserved, Reservation::AllOnesSubnet);
        assert_eq!(last.network, Network::new("10.255.255.252/30").unwrap());
        assert_eq!(
            result.last_usable_subnet().unwrap().network,
            Network::new("10.255.255.248/30").unwrap()
        );
    }

    #[test]
    fn test_idempotent() {
        let policy = SubnetPolicy::legacy();
        let a = calculate_classful(ip("172.20.0.0"), ClassfulRequirement::subnets(30), &policy);
        let b = calculate_classful(ip("172.20.0.0"), ClassfulRequirement::subnets(30), &policy);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a.unwrap()).unwrap(),
            serde_json::to_string(&b.unwrap()).unwrap()
        );
    }
}
