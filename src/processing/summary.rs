//! Route summarization (CIDR aggregation).
//!
//! The covering block of a set is decided by its two extremes: every bit
//! position where `min` and `max` differ must be a host bit of the summary.

use crate::models::{bit_length, Network, MAX_LENGTH};
use itertools::{Itertools, MinMaxResult};
use serde::Serialize;
use std::net::Ipv4Addr;

/// Efficiency bucket for an aggregated route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EfficiencyRating {
    /// 65% or more of the summary is in use.
    Efficient,
    /// 50% or more.
    Acceptable,
    /// Below 50%.
    Inefficient,
}

impl EfficiencyRating {
    pub fn from_percent(percent: f64) -> EfficiencyRating {
        if percent >= 65.0 {
            EfficiencyRating::Efficient
        } else if percent >= 50.0 {
            EfficiencyRating::Acceptable
        } else {
            EfficiencyRating::Inefficient
        }
    }
}

/// How much of a summary block the member networks actually use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationEfficiency {
    pub used_addresses: u64,
    pub summary_block_size: u64,
    pub percent: f64,
    pub rating: EfficiencyRating,
}

/// Smallest CIDR block covering every address; `None` for an empty set.
///
/// # Examples
/// ```
/// use subnet_trainer::processing::find_summary;
/// use std::net::Ipv4Addr;
/// let ips = [Ipv4Addr::new(192, 168, 0, 0), Ipv4Addr::new(192, 168, 3, 0)];
/// assert_eq!(find_summary(&ips).unwrap().to_string(), "192.168.0.0/22");
/// ```
pub fn find_summary(addresses: &[Ipv4Addr]) -> Option<Network> {
    let (min, max) = match addresses.iter().minmax() {
        MinMaxResult::NoElements => return None,
        MinMaxResult::OneElement(only) => (*only, *only),
        MinMaxResult::MinMax(min, max) => (*min, *max),
    };
    let diff = u32::from(min) ^ u32::from(max);
    let prefix = MAX_LENGTH - bit_length(diff);
    log::debug!("find_summary: min={min} max={max} diff={diff:#034b} prefix=/{prefix}");
    Network::containing(min, prefix).ok()
}

/// Smallest CIDR block covering every member network in full.
pub fn find_summary_for_networks(networks: &[Network]) -> Option<Network> {
    let endpoints: Vec<Ipv4Addr> = networks.iter().flat_map(|n| [n.lo(), n.hi()]).collect();
    find_summary(&endpoints)
}

/// Members in address order with repeats and nested blocks removed.
pub fn distinct_blocks(networks: &[Network]) -> Vec<Network> {
    let mut kept: Vec<Network> = Vec::new();
    for net in networks.iter().sorted().dedup() {
        match kept.last() {
            Some(last) if last.contains_network(net) => continue,
            _ => kept.push(*net),
        }
    }
    kept
}

/// Used addresses over summary size, with nested or repeated members counted once.
pub fn aggregation_efficiency(networks: &[Network], summary: &Network) -> AggregationEfficiency {
    let used_addresses: u64 = distinct_blocks(networks).iter().map(Network::block_size).sum();
    let summary_block_size = summary.block_size();
    let percent = used_addresses as f64 / summary_block_size as f64 * 100.0;
    AggregationEfficiency {
        used_addresses,
        summary_block_size,
        percent,
        rating: EfficiencyRating::from_percent(percent),
    }
}
