//! Sampling helpers shared by the exercise strategies.

use super::Difficulty;
use crate::models::{IpClass, Network};
use rand::Rng;
use std::net::Ipv4Addr;

/// Class C for easy, B for medium, A for hard.
pub(crate) fn class_for(difficulty: Difficulty) -> IpClass {
    match difficulty {
        Difficulty::Easy => IpClass::C,
        Difficulty::Medium => IpClass::B,
        Difficulty::Hard => IpClass::A,
    }
}

/// Random unicast address of `class`; class A skips 0 and 127.
pub(crate) fn class_address<R: Rng + ?Sized>(class: IpClass, rng: &mut R) -> Ipv4Addr {
    let (lo, hi) = match class {
        IpClass::A => (1, 126),
        other => other.first_octet_range(),
    };
    Ipv4Addr::new(
        rng.gen_range(lo..=hi),
        rng.gen(),
        rng.gen(),
        rng.gen(),
    )
}

/// Random classful network (host part zeroed) of `class`.
pub(crate) fn classful_network<R: Rng + ?Sized>(class: IpClass, rng: &mut R) -> Network {
    let addr = class_address(class, rng);
    let prefix = class.default_prefix().unwrap_or(24);
    Network::containing(addr, prefix)
        .unwrap_or_else(|e| panic!("classful prefix /{prefix} should never be invalid: {e}"))
}

/// Integer drawn from `(2^(bits-1) - 2, 2^bits - 2]`, i.e. one that needs
/// exactly `bits` bits once the two reserved values are added.
pub(crate) fn value_needing_bits<R: Rng + ?Sized>(bits: u8, rng: &mut R) -> u32 {
    let hi = (1u64 << bits) - 2;
    let lo = ((1u64 << (bits - 1)) - 1).max(1);
    rng.gen_range(lo..=hi) as u32
}
