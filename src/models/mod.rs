//! Domain models for the subnetting engine.
//!
//! This module contains the core data structures used throughout the crate:
//! - [`ipv4`] free functions - 32-bit address and mask arithmetic
//! - [`Network`] - IPv4 network with CIDR notation support
//! - [`IpClass`] - legacy address classes

mod class;
mod ipv4;
mod network;

// Re-export public types
pub use class::{class_of, default_mask, IpClass};
pub use ipv4::{
    bit_length, block_size, broadcast_addr, ceil_log2, cut_addr, format_address, ip_after_subnet,
    lo_mask, mask_to_prefix, parse_address, parse_cidr, prefix_to_mask, MAX_LENGTH,
};
pub use network::{Network, NetworkDetails};
