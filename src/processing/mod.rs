//! Subnet allocation and aggregation logic.
//!
//! This module contains the allocators and the summary route finder:
//! - [`summary`] - Smallest covering CIDR block and aggregation efficiency
//! - [`classful`] - Equal-size division of an A/B/C network
//! - [`vlsm`] - Largest-first variable-length allocation
//! - [`free_space`] - Unallocated ranges as aligned CIDR blocks

mod classful;
mod free_space;
mod summary;
mod vlsm;

// Re-export public functions
pub use classful::{
    calculate_classful, ClassfulRequirement, ClassfulResult, ClassfulSubnet, ClassfulSummary,
    RequirementKind, Reservation, SubnetPolicy, MIN_HOST_BITS,
};
pub use free_space::free_blocks;
pub use summary::{
    aggregation_efficiency, distinct_blocks, find_summary, find_summary_for_networks, AggregationEfficiency,
    EfficiencyRating,
};
pub use vlsm::{
    calculate_vlsm, host_bits_for, RemainingRange, VlsmEntry, VlsmRequirement, VlsmResult,
    VlsmStatus, VlsmSummary, MAX_ASSIGNABLE_PREFIX,
};
