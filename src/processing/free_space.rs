//! Unallocated address ranges expressed as CIDR blocks.
//!
//! Identifies the maximal aligned blocks that exactly cover a free range.

use crate::models::{lo_mask, Network, MAX_LENGTH};
use std::net::Ipv4Addr;

/// Cover `first..=last` with the fewest aligned CIDR blocks, lowest first.
pub fn free_blocks(first: Ipv4Addr, last: Ipv4Addr) -> Vec<Network> {
    let mut blocks = Vec::new();
    let end = u32::from(last) as u64;
    let mut next_ip = u32::from(first) as u64;

    while next_ip <= end {
        let start_ip = Ipv4Addr::from(next_ip as u32);
        let next_mask = find_biggest_subnet(start_ip, last);
        let block = Network::containing(start_ip, next_mask)
            .unwrap_or_else(|e| panic!("mask /{next_mask} out of range should never happen: {e}"));
        log::trace!("free_blocks: {block}");
        next_ip += block.block_size();
        blocks.push(block);
    }
    blocks
}

/// Find the biggest subnet starting at `start_ip` that ends at or before `last_ip`.
///
/// The returned mask is constrained by:
/// 1. The IP alignment - `start_ip` must be a valid network address for the mask
/// 2. The subnet must not run past `last_ip`
fn find_biggest_subnet(start_ip: Ipv4Addr, last_ip: Ipv4Addr) -> u8 {
    assert!(
        start_ip <= last_ip,
        "start_ip[{start_ip}] > last_ip[{last_ip}] should never happen."
    );

    let mut next_mask = lo_mask(start_ip);

    loop {
        let block_last = u32::from(start_ip) as u64 + (1u64 << (MAX_LENGTH - next_mask)) - 1;
        if block_last > u32::from(last_ip) as u64 {
            next_mask += 1;
        } else {
            break;
        }
    }

    assert!(
        next_mask <= MAX_LENGTH,
        "next_mask[{next_mask}] > 32 should never happen."
    );
    next_mask
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nets(blocks: &[Network]) -> Vec<String> {
        blocks.iter().map(|b| b.to_string()).collect()
    }

    #[test]
    fn test_find_biggest_subnet_alignment() {
        // 10.6.2.80 ends in 0101_0000, so it can only start a /28 or smaller
        let start_ip = Ipv4Addr::new(10, 6, 2, 80);
        let last_ip = Ipv4Addr::new(10, 6, 7, 255);
        assert_eq!(28, find_biggest_subnet(start_ip, last_ip));

        let start_ip = Ipv4Addr::new(10, 11, 12, 0);
        let last_ip = Ipv4Addr::new(10, 11, 15, 255);
        assert_eq!(22, find_biggest_subnet(start_ip, last_ip));
    }

    #[test]
    fn test_free_blocks_tail_of_class_c() {
        let blocks = free_blocks(
            Ipv4Addr::new(192, 168, 1, 208),
            Ipv4Addr::new(192, 168, 1, 255),
        );
        assert_eq!(nets(&blocks), vec!["192.168.1.208/28", "192.168.1.224/27"]);
    }

    #[test]
    fn test_free_blocks_unaligned_both_ends() {
        let blocks = free_blocks(Ipv4Addr::new(10, 0, 0, 4), Ipv4Addr::new(10, 0, 0, 18));
        assert_eq!(
            nets(&blocks),
            vec!["10.0.0.4/30", "10.0.0.8/29", "10.0.0.16/31", "10.0.0.18/32"]
        );
    }

    #[test]
    fn test_free_blocks_whole_space() {
        let blocks = free_blocks(Ipv4Addr::UNSPECIFIED, Ipv4Addr::new(255, 255, 255, 255));
        assert_eq!(nets(&blocks), vec!["0.0.0.0/0"]);
    }

    #[test]
    fn test_free_blocks_top_of_space() {
        let blocks = free_blocks(
            Ipv4Addr::new(255, 255, 255, 252),
            Ipv4Addr::new(255, 255, 255, 255),
        );
        assert_eq!(nets(&blocks), vec!["255.255.255.252/30"]);
    }
}
