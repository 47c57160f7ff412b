//! Variable-Length Subnet Masking.
//!
//! Requirements are placed largest first, back to back from the start of the
//! parent. Every block placed so far is at least as large as the next one, so
//! the cursor is always a multiple of the next block size and no realignment
//! is needed. The alignment is asserted after every placement.

use super::free_space::free_blocks;
use crate::error::SubnetError;
use crate::models::{ceil_log2, Network, NetworkDetails, MAX_LENGTH};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::net::Ipv4Addr;

/// Longest prefix handed out: a /30 still has two usable hosts.
pub const MAX_ASSIGNABLE_PREFIX: u8 = 30;

/// A named host-count request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlsmRequirement {
    pub name: String,
    pub hosts_needed: u32,
}

impl VlsmRequirement {
    pub fn new(name: &str, hosts_needed: u32) -> Self {
        VlsmRequirement {
            name: name.to_string(),
            hosts_needed,
        }
    }
}

/// Outcome of one requirement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VlsmStatus {
    Assigned {
        #[serde(flatten)]
        details: NetworkDetails,
        #[serde(skip)]
        network: Network,
        /// hosts needed over usable hosts, in percent
        efficiency: f64,
    },
    Error {
        reason: SubnetError,
    },
}

/// One row of the allocation, in allocation order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VlsmEntry {
    /// Position of the requirement in the caller's list.
    pub input_index: usize,
    pub requirement: VlsmRequirement,
    pub host_bits: u8,
    pub block_size: u64,
    #[serde(flatten)]
    pub status: VlsmStatus,
}

impl VlsmEntry {
    /// The assigned block, if any.
    pub fn network(&self) -> Option<Network> {
        match &self.status {
            VlsmStatus::Assigned { network, .. } => Some(*network),
            VlsmStatus::Error { .. } => None,
        }
    }
}

/// Addresses left after the last placed block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemainingRange {
    pub first: Ipv4Addr,
    pub last: Ipv4Addr,
    pub size: u64,
    /// The range as maximal aligned CIDR blocks.
    pub blocks: Vec<Network>,
}

/// Totals over a [`VlsmResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VlsmSummary {
    pub base: Network,
    pub requested_hosts: u64,
    pub total_allocated: u64,
    pub total_available: u64,
    pub utilization_percent: f64,
    pub host_efficiency_percent: f64,
    pub assigned: usize,
    pub failed: usize,
    pub remaining: Option<RemainingRange>,
}

/// Result of [`calculate_vlsm`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VlsmResult {
    pub entries: Vec<VlsmEntry>,
    pub summary: VlsmSummary,
}

impl VlsmResult {
    /// True when no requirement failed.
    pub fn all_assigned(&self) -> bool {
        self.summary.failed == 0
    }

    /// Assigned blocks in allocation order.
    pub fn networks(&self) -> Vec<Network> {
        self.entries.iter().filter_map(VlsmEntry::network).collect()
    }
}

/// Host bits for a request: network + broadcast + hosts, never below a /30.
pub fn host_bits_for(hosts_needed: u32) -> u8 {
    ceil_log2(hosts_needed as u64 + 2).max(MAX_LENGTH - MAX_ASSIGNABLE_PREFIX)
}

/// Allocate `requirements` inside `base`, largest first.
///
/// Failing requirements become error rows and do not move the cursor.
pub fn calculate_vlsm(base: &Network, requirements: &[VlsmRequirement]) -> VlsmResult {
    let mut order: Vec<usize> = (0..requirements.len()).collect();
    order.sort_by_key(|&i| Reverse(requirements[i].hosts_needed));

    let base_start = u32::from(base.lo()) as u64;
    let base_broadcast = u32::from(base.hi()) as u64;
    let mut cursor = base_start;
    let mut entries = Vec::with_capacity(requirements.len());

    for input_index in order {
        let requirement = &requirements[input_index];
        let host_bits = host_bits_for(requirement.hosts_needed);
        let block_size = 1u64 << host_bits;

        let status = match place_block(base, cursor, base_broadcast, requirement, host_bits) {
            Ok(network) => {
                cursor += block_size;
                let efficiency =
                    requirement.hosts_needed as f64 / network.usable_hosts() as f64 * 100.0;
                log::debug!(
                    "calculate_vlsm: {} ({} hosts) => {network}",
                    requirement.name,
                    requirement.hosts_needed
                );
                VlsmStatus::Assigned {
                    details: network.details(),
                    network,
                    efficiency,
                }
            }
            Err(reason) => {
                log::debug!("calculate_vlsm: {} failed: {reason}", requirement.name);
                VlsmStatus::Error { reason }
            }
        };

        entries.push(VlsmEntry {
            input_index,
            requirement: requirement.clone(),
            host_bits,
            block_size,
            status,
        });
    }

    let summary = summarize(base, &entries, cursor, base_broadcast);
    VlsmResult { entries, summary }
}

/// Place one block at `cursor`, or explain why it does not fit.
fn place_block(
    base: &Network,
    cursor: u64,
    base_broadcast: u64,
    requirement: &VlsmRequirement,
    host_bits: u8,
) -> Result<Network, SubnetError> {
    let block_size = 1u64 << host_bits;
    let requested = format!("{} ({} hosts)", requirement.name, requirement.hosts_needed);

    if host_bits > MAX_LENGTH - base.prefix() {
        let reason = if base.prefix() > MAX_ASSIGNABLE_PREFIX {
            format!(
                "the smallest assignable block is a /{MAX_ASSIGNABLE_PREFIX} but {base} is smaller"
            )
        } else {
            format!(
                "it needs {block_size} addresses but {base} holds only {}",
                base.block_size()
            )
        };
        return Err(SubnetError::InsufficientSpace {
            requested,
            reason,
            suggestion: format!(
                "use a parent of /{} or shorter",
                MAX_LENGTH.saturating_sub(host_bits)
            ),
        });
    }

    // Only reachable when the parent ends at 255.255.255.255 and is full.
    if cursor > u32::MAX as u64 {
        return Err(SubnetError::InsufficientSpace {
            requested,
            reason: format!("no addresses are left in {base}"),
            suggestion: "use a larger parent network or fewer requirements".to_string(),
        });
    }

    assert_eq!(
        cursor % block_size,
        0,
        "cursor {} not aligned to /{} should never happen",
        Ipv4Addr::from(cursor as u32),
        MAX_LENGTH - host_bits
    );

    let block = Network::from_parts(Ipv4Addr::from(cursor as u32), MAX_LENGTH - host_bits)?;
    if cursor + block_size - 1 > base_broadcast {
        return Err(SubnetError::BlockExceedsParent {
            block,
            parent: *base,
        });
    }
    Ok(block)
}

fn summarize(base: &Network, entries: &[VlsmEntry], cursor: u64, base_broadcast: u64) -> VlsmSummary {
    let mut requested_hosts = 0u64;
    let mut total_allocated = 0u64;
    let mut usable_allocated = 0u64;
    let mut assigned = 0usize;

    for entry in entries {
        if let Some(network) = entry.network() {
            requested_hosts += entry.requirement.hosts_needed as u64;
            total_allocated += network.block_size();
            usable_allocated += network.usable_hosts();
            assigned += 1;
        }
    }

    let total_available = base.block_size();
    let host_efficiency_percent = if usable_allocated == 0 {
        0.0
    } else {
        requested_hosts as f64 / usable_allocated as f64 * 100.0
    };

    let remaining = (cursor <= base_broadcast).then(|| {
        let first = Ipv4Addr::from(cursor as u32);
        let last = Ipv4Addr::from(base_broadcast as u32);
        RemainingRange {
            first,
            last,
            size: base_broadcast - cursor + 1,
            blocks: free_blocks(first, last),
        }
    });

    VlsmSummary {
        base: *base,
        requested_hosts,
        total_allocated,
        total_available,
        utilization_percent: total_allocated as f64 / total_available as f64 * 100.0,
        host_efficiency_percent,
        assigned,
        failed: entries.len() - assigned,
        remaining,
    }
}
